//! Backend over the libraries linked into the extension binary.

use crate::error::BridgeError;

use super::{NativeArg, NativeBackend, NativeFunction, NativeLibrary, NativeValue};

/// Product name at the start of every greeting.
pub const PRODUCT_NAME: &str = "DuckdbRdkit";

/// Identity marker closing the plain greeting.
pub const GREETING_MARKER: &str = "🐥";

/// Production backend: OpenSSL always, RDKit with the `rdkit` feature.
///
/// Every function is reentrant. RDKit initialises its descriptor parameter
/// tables under `std::call_once`, and construction computes a full
/// descriptor set once so those tables exist before any worker calls in.
#[derive(Debug, Clone)]
pub struct LinkedLibraries {
    openssl_version: Option<&'static str>,
}

impl LinkedLibraries {
    /// Initialise OpenSSL, capture its version string and warm up RDKit.
    pub fn new() -> Self {
        openssl::init();
        #[cfg(feature = "rdkit")]
        super::rdkit::warm_up();
        let version = openssl::version::version();
        Self {
            openssl_version: (!version.is_empty()).then_some(version),
        }
    }

    /// Version string reported by the linked OpenSSL, e.g. `OpenSSL 3.0.13 30 Jan 2024`.
    pub fn openssl_version(&self) -> Option<&'static str> {
        self.openssl_version
    }
}

impl Default for LinkedLibraries {
    fn default() -> Self {
        Self::new()
    }
}

impl NativeBackend for LinkedLibraries {
    fn is_available(&self, library: NativeLibrary) -> bool {
        match library {
            NativeLibrary::OpenSsl => self.openssl_version.is_some(),
            NativeLibrary::RdKit => cfg!(feature = "rdkit"),
        }
    }

    fn call(
        &self,
        function: NativeFunction,
        args: &[NativeArg<'_>],
    ) -> Result<NativeValue, BridgeError> {
        match function {
            NativeFunction::Greeting => {
                let name = text_arg(function, args, 0)?;
                Ok(NativeValue::Text(greeting(name)))
            }
            NativeFunction::OpenSslVersion => {
                let name = text_arg(function, args, 0)?;
                let version = self
                    .openssl_version
                    .ok_or(BridgeError::LibraryUnavailable {
                        library: NativeLibrary::OpenSsl,
                    })?;
                Ok(NativeValue::Text(openssl_greeting(name, version)))
            }
            #[cfg(feature = "rdkit")]
            _ => super::rdkit::call(function, args),
            #[cfg(not(feature = "rdkit"))]
            _ => Err(BridgeError::LibraryUnavailable {
                library: NativeLibrary::RdKit,
            }),
        }
    }
}

/// `DuckdbRdkit <name> 🐥`
pub fn greeting(name: &str) -> String {
    format!("{} {} {}", PRODUCT_NAME, name, GREETING_MARKER)
}

/// `DuckdbRdkit <name>, my linked OpenSSL version is <version>`
///
/// Everything up to and including `is ` is a stable prefix; only the version
/// string varies between builds.
pub fn openssl_greeting(name: &str, version: &str) -> String {
    format!(
        "{} {}, my linked OpenSSL version is {}",
        PRODUCT_NAME, name, version
    )
}

/// Fetch the text argument at `index`.
pub(super) fn text_arg<'a>(
    function: NativeFunction,
    args: &[NativeArg<'a>],
    index: usize,
) -> Result<&'a str, BridgeError> {
    match args.get(index) {
        Some(NativeArg::Text(value)) => Ok(value),
        Some(other) => Err(BridgeError::native(format!(
            "{}: argument {} must be text, got {:?}",
            function, index, other
        ))),
        None => Err(BridgeError::native(format!(
            "{}: missing argument {}",
            function, index
        ))),
    }
}
