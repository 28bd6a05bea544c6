//! Shared fixtures for dispatch tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use duckdb_rdkit_core::bridge::{NativeArg, NativeBackend, NativeValue};
use duckdb_rdkit_core::{BridgeError, NativeFunction, NativeLibrary};

/// Backend that echoes its input and counts every call.
///
/// - `"bad"` fails with `NativeCallFailed`
/// - `"boom"` panics
/// - `"none"` returns a NULL result
/// - INTEGER and DOUBLE arguments are doubled
/// - anything else is upper-cased
///
/// `CrippenLogP` is declared non-reentrant. The backend records how many of
/// its calls overlap, and sleeps briefly inside each so overlaps show up.
pub struct ProbeBackend {
    pub rdkit: bool,
    pub calls: Arc<AtomicUsize>,
    pub overlap: Arc<Overlap>,
}

/// Peak number of calls in flight at once.
#[derive(Default)]
pub struct Overlap {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl Overlap {
    fn enter(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn exit(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

/// Function the stub backend asks the bridge to serialize.
pub const SERIALIZED: NativeFunction = NativeFunction::CrippenLogP;

impl ProbeBackend {
    pub fn new() -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                rdkit: true,
                calls: Arc::clone(&calls),
                overlap: Arc::default(),
            },
            calls,
        )
    }

    pub fn without_rdkit() -> (Self, Arc<AtomicUsize>) {
        let (mut backend, calls) = Self::new();
        backend.rdkit = false;
        (backend, calls)
    }
}

impl NativeBackend for ProbeBackend {
    fn is_available(&self, library: NativeLibrary) -> bool {
        match library {
            NativeLibrary::RdKit => self.rdkit,
            NativeLibrary::OpenSsl => true,
        }
    }

    fn is_reentrant(&self, function: NativeFunction) -> bool {
        function != SERIALIZED
    }

    fn call(
        &self,
        function: NativeFunction,
        args: &[NativeArg<'_>],
    ) -> Result<NativeValue, BridgeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if function == SERIALIZED {
            self.overlap.enter();
            thread::sleep(Duration::from_micros(50));
            self.overlap.exit();
        }
        match args.first() {
            Some(NativeArg::Text("bad")) => Err(BridgeError::native("malformed input")),
            Some(NativeArg::Text("boom")) => panic!("probe exploded"),
            Some(NativeArg::Text("none")) => Ok(NativeValue::Null),
            Some(NativeArg::Text(s)) => Ok(NativeValue::Text(s.to_uppercase())),
            Some(NativeArg::Integer(v)) => Ok(NativeValue::Integer(v * 2)),
            Some(NativeArg::Double(v)) => Ok(NativeValue::Double(v * 2.0)),
            Some(NativeArg::Boolean(v)) => Ok(NativeValue::Boolean(!v)),
            Some(NativeArg::Absent) | None => Ok(NativeValue::Null),
        }
    }
}

pub fn calls(counter: &AtomicUsize) -> usize {
    counter.load(Ordering::SeqCst)
}
