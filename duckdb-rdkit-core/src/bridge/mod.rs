//! Bridge to the native libraries behind the SQL functions.
//!
//! The bridge is the only place native code is entered. Every call goes
//! through [`NativeLibraryBridge::invoke`], which:
//!
//! 1. Rejects functions whose library was not available when the bridge was
//!    built (`LibraryUnavailable`).
//! 2. Serializes functions the backend reports as not safe for concurrent
//!    invocation, each behind its own lock. The backend is asked once, at
//!    construction.
//! 3. Runs the backend under `catch_unwind`, so a fault inside the backend
//!    becomes `NativeCallFailed` instead of unwinding into the host.
//!
//! Backends implement [`NativeBackend`]. The production backend is
//! [`LinkedLibraries`]; tests substitute stubs.

mod linked;
#[cfg(feature = "rdkit")]
mod rdkit;

pub use linked::{greeting, openssl_greeting, LinkedLibraries, GREETING_MARKER, PRODUCT_NAME};

use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::BridgeError;
use crate::types::TypeTag;

/// External libraries the extension links against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeLibrary {
    /// Cheminformatics toolkit
    RdKit,
    /// Cryptographic library
    OpenSsl,
}

impl NativeLibrary {
    /// Every library the bridge knows about.
    pub const ALL: [NativeLibrary; 2] = [NativeLibrary::RdKit, NativeLibrary::OpenSsl];

    /// Display name.
    pub fn name(&self) -> &'static str {
        match self {
            NativeLibrary::RdKit => "RDKit",
            NativeLibrary::OpenSsl => "OpenSSL",
        }
    }
}

impl fmt::Display for NativeLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Identifies one native computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeFunction {
    /// Fixed-format greeting carrying the extension's identity marker
    Greeting,
    /// Greeting that embeds the linked OpenSSL version string
    OpenSslVersion,
    /// Canonical SMILES of a molecule
    CanonicalSmiles,
    /// Canonical SMILES, or NULL if the input does not parse
    MolFromSmiles,
    /// Average molecular weight
    AverageMolWeight,
    /// Exact (monoisotopic) molecular weight
    ExactMolWeight,
    /// Topological polar surface area
    Tpsa,
    /// Crippen logP
    CrippenLogP,
    /// Hydrogen bond donor count
    HbdCount,
    /// Hydrogen bond acceptor count
    HbaCount,
    /// Rotatable bond count
    RotatableBondCount,
    /// Whether two molecules are the same structure
    ExactMatch,
}

impl NativeFunction {
    /// Every native computation.
    pub const ALL: [NativeFunction; 12] = [
        NativeFunction::Greeting,
        NativeFunction::OpenSslVersion,
        NativeFunction::CanonicalSmiles,
        NativeFunction::MolFromSmiles,
        NativeFunction::AverageMolWeight,
        NativeFunction::ExactMolWeight,
        NativeFunction::Tpsa,
        NativeFunction::CrippenLogP,
        NativeFunction::HbdCount,
        NativeFunction::HbaCount,
        NativeFunction::RotatableBondCount,
        NativeFunction::ExactMatch,
    ];

    /// Identifier used in logs and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            NativeFunction::Greeting => "greeting",
            NativeFunction::OpenSslVersion => "openssl_version",
            NativeFunction::CanonicalSmiles => "canonical_smiles",
            NativeFunction::MolFromSmiles => "mol_from_smiles",
            NativeFunction::AverageMolWeight => "average_mol_weight",
            NativeFunction::ExactMolWeight => "exact_mol_weight",
            NativeFunction::Tpsa => "tpsa",
            NativeFunction::CrippenLogP => "crippen_logp",
            NativeFunction::HbdCount => "hbd_count",
            NativeFunction::HbaCount => "hba_count",
            NativeFunction::RotatableBondCount => "rotatable_bond_count",
            NativeFunction::ExactMatch => "exact_match",
        }
    }

    /// Library that must be linked for this function to run.
    ///
    /// The greeting is produced by the extension itself and needs none.
    pub fn library(&self) -> Option<NativeLibrary> {
        match self {
            NativeFunction::Greeting => None,
            NativeFunction::OpenSslVersion => Some(NativeLibrary::OpenSsl),
            _ => Some(NativeLibrary::RdKit),
        }
    }
}

impl fmt::Display for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One argument of a native call.
///
/// Text borrows from the input chunk for the duration of the call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NativeArg<'a> {
    /// The row's value is NULL; native code must never see this
    Absent,
    Text(&'a str),
    Integer(i32),
    Double(f64),
    Boolean(bool),
}

impl<'a> NativeArg<'a> {
    /// Check if this is the absent marker.
    pub fn is_absent(&self) -> bool {
        matches!(self, NativeArg::Absent)
    }

    /// Try to get as string slice.
    pub fn as_text(&self) -> Option<&'a str> {
        match self {
            NativeArg::Text(v) => Some(v),
            _ => None,
        }
    }
}

/// Owned result of a native call.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeValue {
    /// The computation produced no value
    Null,
    Text(String),
    Integer(i32),
    Double(f64),
    Boolean(bool),
}

impl NativeValue {
    /// SQL type of the value (`Null` for [`NativeValue::Null`]).
    pub fn type_tag(&self) -> TypeTag {
        match self {
            NativeValue::Null => TypeTag::Null,
            NativeValue::Text(_) => TypeTag::Text,
            NativeValue::Integer(_) => TypeTag::Integer,
            NativeValue::Double(_) => TypeTag::Double,
            NativeValue::Boolean(_) => TypeTag::Boolean,
        }
    }
}

/// Raw entry points into the native libraries.
///
/// Implementations report library faults as [`BridgeError`]. They may also
/// panic; the bridge converts panics into `NativeCallFailed`.
pub trait NativeBackend: Send + Sync {
    /// Whether `library` is linked and initialised.
    fn is_available(&self, library: NativeLibrary) -> bool;

    /// Whether `function` may run on several threads at once.
    ///
    /// Functions that answer `false` get a dedicated lock in the bridge.
    fn is_reentrant(&self, _function: NativeFunction) -> bool {
        true
    }

    /// Run one computation. `args` never contains [`NativeArg::Absent`].
    fn call(&self, function: NativeFunction, args: &[NativeArg<'_>])
        -> Result<NativeValue, BridgeError>;
}

/// Fault-isolating wrapper around a [`NativeBackend`].
pub struct NativeLibraryBridge {
    backend: Box<dyn NativeBackend>,
    available: HashSet<NativeLibrary>,
    call_locks: HashMap<NativeFunction, Mutex<()>>,
}

impl NativeLibraryBridge {
    /// Wrap a backend, probing library availability once.
    pub fn new<B: NativeBackend + 'static>(backend: B) -> Self {
        let available: HashSet<_> = NativeLibrary::ALL
            .into_iter()
            .filter(|library| backend.is_available(*library))
            .collect();

        for library in NativeLibrary::ALL {
            tracing::debug!(
                library = library.name(),
                available = available.contains(&library),
                "Probed native library"
            );
        }

        let call_locks: HashMap<_, _> = NativeFunction::ALL
            .into_iter()
            .filter(|function| !backend.is_reentrant(*function))
            .map(|function| (function, Mutex::new(())))
            .collect();

        for function in call_locks.keys() {
            tracing::debug!(function = function.name(), "Serializing native function");
        }

        Self {
            backend: Box::new(backend),
            available,
            call_locks,
        }
    }

    /// Bridge over the libraries linked into this binary.
    pub fn linked() -> Self {
        Self::new(LinkedLibraries::new())
    }

    /// Whether `library` was available at construction.
    pub fn is_available(&self, library: NativeLibrary) -> bool {
        self.available.contains(&library)
    }

    /// Fail with `LibraryUnavailable` for the first function whose library is
    /// missing.
    pub fn check_functions<I>(&self, functions: I) -> Result<(), BridgeError>
    where
        I: IntoIterator<Item = NativeFunction>,
    {
        for function in functions {
            if let Some(library) = function.library() {
                if !self.is_available(library) {
                    return Err(BridgeError::LibraryUnavailable { library });
                }
            }
        }
        Ok(())
    }

    /// Run one native computation with fault isolation.
    pub fn invoke(
        &self,
        function: NativeFunction,
        args: &[NativeArg<'_>],
    ) -> Result<NativeValue, BridgeError> {
        if let Some(library) = function.library() {
            if !self.is_available(library) {
                return Err(BridgeError::LibraryUnavailable { library });
            }
        }

        if args.iter().any(NativeArg::is_absent) {
            return Err(BridgeError::native(format!(
                "{} called with an absent argument",
                function
            )));
        }

        let _guard = self.call_locks.get(&function).map(|lock| lock.lock());

        match panic::catch_unwind(AssertUnwindSafe(|| self.backend.call(function, args))) {
            Ok(result) => result,
            Err(payload) => Err(BridgeError::native(format!(
                "{} panicked: {}",
                function,
                panic_message(payload.as_ref())
            ))),
        }
    }
}

impl fmt::Debug for NativeLibraryBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeLibraryBridge")
            .field("available", &self.available)
            .field("serialized", &self.call_locks.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// The computation a registered function runs.
///
/// Pairs a [`NativeFunction`] with the bridge that executes it. Cloning is
/// cheap; the bridge is shared.
#[derive(Clone)]
pub struct NativeHandler {
    function: NativeFunction,
    bridge: Arc<NativeLibraryBridge>,
}

impl NativeHandler {
    /// Create a handler for `function` on `bridge`.
    pub fn new(function: NativeFunction, bridge: Arc<NativeLibraryBridge>) -> Self {
        Self { function, bridge }
    }

    /// The native computation.
    pub fn function(&self) -> NativeFunction {
        self.function
    }

    /// The bridge the computation runs on.
    pub fn bridge(&self) -> &Arc<NativeLibraryBridge> {
        &self.bridge
    }

    /// Invoke the computation.
    #[inline]
    pub fn call(&self, args: &[NativeArg<'_>]) -> Result<NativeValue, BridgeError> {
        self.bridge.invoke(self.function, args)
    }
}

impl fmt::Debug for NativeHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NativeHandler").field(&self.function).finish()
    }
}

/// Extract a readable message from a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
