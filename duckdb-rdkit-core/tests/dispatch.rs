//! End-to-end dispatch tests: registry, binding, executor and bridge together.

mod common;

use std::sync::Arc;

use common::{calls, ProbeBackend};
use duckdb_rdkit_core::bridge::{NativeHandler, GREETING_MARKER};
use duckdb_rdkit_core::catalog::{builtin_descriptors, GREETING_FUNCTION, OPENSSL_VERSION_FUNCTION};
use duckdb_rdkit_core::prelude::*;
use duckdb_rdkit_core::{BindError, BridgeError, RegistryError, STANDARD_VECTOR_SIZE};

// ============================================================================
// Helpers
// ============================================================================

fn probe_descriptor(
    name: &str,
    params: &[TypeTag],
    return_type: TypeTag,
    function: NativeFunction,
    bridge: &Arc<NativeLibraryBridge>,
) -> Arc<FunctionDescriptor> {
    Arc::new(FunctionDescriptor::new(
        name,
        params.iter().copied(),
        return_type,
        NativeHandler::new(function, Arc::clone(bridge)),
    ))
}

fn text_chunk(values: &[Option<&str>]) -> RowChunk {
    RowChunk::from_columns(vec![Column::text(values.iter().copied())]).unwrap()
}

fn linked_registry() -> FunctionRegistry {
    let bridge = Arc::new(NativeLibraryBridge::linked());
    let registry = FunctionRegistry::default();
    registry.install(builtin_descriptors(&bridge).unwrap()).unwrap();
    registry
}

// ============================================================================
// Binding
// ============================================================================

#[test]
fn test_wrong_argument_count_fails_to_bind() {
    let registry = linked_registry();
    let desc = registry.lookup(GREETING_FUNCTION).unwrap();

    for types in [&[][..], &[TypeTag::Text, TypeTag::Text][..]] {
        assert!(matches!(
            desc.bind(types),
            Err(BindError::ArityMismatch { expected: 1, .. })
        ));
    }
}

#[test]
fn test_unconvertible_types_fail_to_bind() {
    let registry = linked_registry();
    let desc = registry.lookup(GREETING_FUNCTION).unwrap();

    for tag in [TypeTag::Integer, TypeTag::Double, TypeTag::Boolean] {
        assert_eq!(
            desc.bind(&[tag]).unwrap_err(),
            BindError::TypeMismatch {
                function: GREETING_FUNCTION.to_string(),
                position: 0,
                expected: TypeTag::Text,
                actual: tag,
            }
        );
    }
    assert!(desc.bind(&[TypeTag::Null]).is_ok());
}

// ============================================================================
// Null propagation and row failures
// ============================================================================

#[test]
fn test_null_rows_skip_native_call() {
    let (backend, counter) = ProbeBackend::new();
    let bridge = Arc::new(NativeLibraryBridge::new(backend));
    let desc = probe_descriptor(
        "pair",
        &[TypeTag::Text, TypeTag::Text],
        TypeTag::Text,
        NativeFunction::ExactMatch,
        &bridge,
    );
    let bound = desc.bind(&[TypeTag::Text, TypeTag::Text]).unwrap();

    let input = RowChunk::from_columns(vec![
        Column::text([Some("a"), None, Some("c"), None]),
        Column::text([Some("x"), Some("y"), None, None]),
    ])
    .unwrap();

    let output = execute(&bound, &input).unwrap();
    assert!(output.is_clean());
    assert_eq!(output.column().get(0), Some(ValueRef::Text("A")));
    for row in 1..4 {
        assert_eq!(output.column().get(row), None);
    }
    assert_eq!(calls(&counter), 1);
}

#[test]
fn test_all_null_column_never_calls_native() {
    let (backend, counter) = ProbeBackend::new();
    let bridge = Arc::new(NativeLibraryBridge::new(backend));
    let desc = probe_descriptor(
        "f",
        &[TypeTag::Text],
        TypeTag::Text,
        NativeFunction::Greeting,
        &bridge,
    );
    let bound = desc.bind(&[TypeTag::Null]).unwrap();
    let input = RowChunk::from_columns(vec![Column::nulls(TypeTag::Null, 5)]).unwrap();

    let output = execute(&bound, &input).unwrap();
    assert_eq!(output.chunk.len(), 5);
    assert_eq!(output.column().validity().count_valid(), 0);
    assert_eq!(calls(&counter), 0);
}

#[test]
fn test_one_malformed_row_does_not_abort_chunk() {
    let (backend, counter) = ProbeBackend::new();
    let bridge = Arc::new(NativeLibraryBridge::new(backend));
    let desc = probe_descriptor(
        "f",
        &[TypeTag::Text],
        TypeTag::Text,
        NativeFunction::CanonicalSmiles,
        &bridge,
    );
    let bound = desc.bind(&[TypeTag::Text]).unwrap();

    let n = 100;
    let k = 37;
    let values: Vec<Option<&str>> = (0..n)
        .map(|row| if row == k { Some("bad") } else { Some("ok") })
        .collect();

    let output = execute(&bound, &text_chunk(&values)).unwrap();
    assert_eq!(output.chunk.len(), n);
    assert_eq!(output.errors.len(), 1);
    assert_eq!(output.errors[0].row_index, k);
    assert!(output.errors[0].message.contains("malformed input"));
    for row in 0..n {
        if row == k {
            assert_eq!(output.column().get(row), None);
        } else {
            assert_eq!(output.column().get(row), Some(ValueRef::Text("OK")));
        }
    }
    assert_eq!(calls(&counter), n);
}

#[test]
fn test_panicking_row_is_isolated() {
    let (backend, _) = ProbeBackend::new();
    let bridge = Arc::new(NativeLibraryBridge::new(backend));
    let desc = probe_descriptor(
        "f",
        &[TypeTag::Text],
        TypeTag::Text,
        NativeFunction::Tpsa,
        &bridge,
    );
    let bound = desc.bind(&[TypeTag::Text]).unwrap();

    let output = execute(&bound, &text_chunk(&[Some("a"), Some("boom"), Some("c")])).unwrap();
    assert_eq!(output.errors.len(), 1);
    assert_eq!(output.errors[0].row_index, 1);
    assert!(output.errors[0].message.contains("panicked"));
    assert_eq!(output.column().get(0), Some(ValueRef::Text("A")));
    assert_eq!(output.column().get(1), None);
    assert_eq!(output.column().get(2), Some(ValueRef::Text("C")));
}

#[test]
fn test_null_native_result_is_not_an_error() {
    let (backend, _) = ProbeBackend::new();
    let bridge = Arc::new(NativeLibraryBridge::new(backend));
    let desc = probe_descriptor(
        "f",
        &[TypeTag::Text],
        TypeTag::Text,
        NativeFunction::Greeting,
        &bridge,
    );
    let bound = desc.bind(&[TypeTag::Text]).unwrap();

    let output = execute(&bound, &text_chunk(&[Some("none")])).unwrap();
    assert!(output.is_clean());
    assert_eq!(output.column().get(0), None);
}

#[test]
fn test_result_of_wrong_kind_is_a_row_error() {
    let (backend, _) = ProbeBackend::new();
    let bridge = Arc::new(NativeLibraryBridge::new(backend));
    // Backend returns TEXT but the function declares BOOLEAN
    let desc = probe_descriptor(
        "f",
        &[TypeTag::Text],
        TypeTag::Boolean,
        NativeFunction::ExactMatch,
        &bridge,
    );
    let bound = desc.bind(&[TypeTag::Text]).unwrap();

    let output = execute(&bound, &text_chunk(&[Some("a"), None])).unwrap();
    assert_eq!(output.errors.len(), 1);
    assert_eq!(output.errors[0].row_index, 0);
    assert_eq!(output.column().type_tag(), TypeTag::Boolean);
    assert_eq!(output.column().get(0), None);
}

#[test]
fn test_integer_arguments_widen_to_double() {
    let (backend, _) = ProbeBackend::new();
    let bridge = Arc::new(NativeLibraryBridge::new(backend));
    let desc = probe_descriptor(
        "f",
        &[TypeTag::Double],
        TypeTag::Double,
        NativeFunction::AverageMolWeight,
        &bridge,
    );
    let bound = desc.bind(&[TypeTag::Integer]).unwrap();
    let input = RowChunk::from_columns(vec![Column::integer([Some(2), None, Some(-4)])]).unwrap();

    let output = execute(&bound, &input).unwrap();
    assert_eq!(output.column().get(0), Some(ValueRef::Double(4.0)));
    assert_eq!(output.column().get(1), None);
    assert_eq!(output.column().get(2), Some(ValueRef::Double(-8.0)));
}

#[test]
fn test_missing_library_fails_the_statement() {
    let (backend, counter) = ProbeBackend::without_rdkit();
    let bridge = Arc::new(NativeLibraryBridge::new(backend));
    let desc = probe_descriptor(
        "f",
        &[TypeTag::Text],
        TypeTag::Text,
        NativeFunction::CanonicalSmiles,
        &bridge,
    );
    let bound = desc.bind(&[TypeTag::Text]).unwrap();

    let err = execute(&bound, &text_chunk(&[Some("CCO")])).unwrap_err();
    assert!(matches!(
        err,
        Error::Bridge(BridgeError::LibraryUnavailable {
            library: NativeLibrary::RdKit
        })
    ));
    assert_eq!(calls(&counter), 0);
}

// ============================================================================
// Registry lifecycle
// ============================================================================

#[test]
fn test_unregister_all_twice() {
    let registry = linked_registry();
    assert!(!registry.is_empty());
    registry.unregister_all();
    registry.unregister_all();
    assert!(registry.is_empty());
    assert!(matches!(
        registry.lookup(GREETING_FUNCTION),
        Err(RegistryError::UnknownFunction { .. })
    ));
}

#[test]
fn test_reregistration_last_write_wins() {
    let (backend, _) = ProbeBackend::new();
    let bridge = Arc::new(NativeLibraryBridge::new(backend));
    let registry = FunctionRegistry::default();

    let first = probe_descriptor(
        "f",
        &[TypeTag::Text],
        TypeTag::Text,
        NativeFunction::Greeting,
        &bridge,
    );
    let second = probe_descriptor(
        "f",
        &[TypeTag::Integer],
        TypeTag::Integer,
        NativeFunction::HbdCount,
        &bridge,
    );
    registry.register((*first).clone()).unwrap();
    registry.register((*second).clone()).unwrap();

    assert_eq!(registry.len(), 1);
    let found = registry.lookup("f").unwrap();
    assert_eq!(found.parameter_types(), &[TypeTag::Integer]);
    assert_eq!(found.handler().function(), NativeFunction::HbdCount);
}

#[test]
fn test_reject_policy_surfaces_conflict() {
    let bridge = Arc::new(NativeLibraryBridge::linked());
    let registry = FunctionRegistry::new(ReplacePolicy::Reject);
    registry.install(builtin_descriptors(&bridge).unwrap()).unwrap();

    let err = registry
        .install(builtin_descriptors(&bridge).unwrap())
        .unwrap_err();
    assert_eq!(
        err,
        RegistryError::DuplicateNameConflict {
            name: GREETING_FUNCTION.to_string()
        }
    );
}

#[test]
fn test_load_preflight_reports_missing_library() {
    let (backend, _) = ProbeBackend::without_rdkit();
    let bridge = Arc::new(NativeLibraryBridge::new(backend));
    let result = builtin_descriptors(&bridge);
    if cfg!(feature = "rdkit") {
        assert_eq!(
            result.unwrap_err(),
            BridgeError::LibraryUnavailable {
                library: NativeLibrary::RdKit
            }
        );
    } else {
        assert_eq!(result.unwrap().len(), 2);
    }
}

// ============================================================================
// End-to-end scenarios
// ============================================================================

#[test]
fn test_greeting_scenario() {
    let registry = linked_registry();
    let bound = registry
        .lookup(GREETING_FUNCTION)
        .unwrap()
        .bind(&[TypeTag::Text])
        .unwrap();

    let output = execute(&bound, &text_chunk(&[Some("Sam")])).unwrap();
    assert_eq!(output.column().get(0), Some(ValueRef::Text("DuckdbRdkit Sam 🐥")));
    assert!(GREETING_MARKER.chars().count() == 1);
}

#[test]
fn test_openssl_version_scenario() {
    let registry = linked_registry();
    let bound = registry
        .lookup(OPENSSL_VERSION_FUNCTION)
        .unwrap()
        .bind(&[TypeTag::Text])
        .unwrap();

    let output = execute(&bound, &text_chunk(&[Some("Michael")])).unwrap();
    let Some(ValueRef::Text(s)) = output.column().get(0) else {
        panic!("expected a text result");
    };
    let prefix = "DuckdbRdkit Michael, my linked OpenSSL version is OpenSSL";
    assert!(s.starts_with(prefix), "unexpected output: {s}");
    assert_eq!(&s[..51], &prefix[..51]);
}

#[test]
fn test_full_vector_size_chunk() {
    let registry = linked_registry();
    let bound = registry
        .lookup(GREETING_FUNCTION)
        .unwrap()
        .bind(&[TypeTag::Text])
        .unwrap();

    let names: Vec<String> = (0..STANDARD_VECTOR_SIZE).map(|i| format!("n{i}")).collect();
    let input = RowChunk::from_columns(vec![Column::text(names.iter().enumerate().map(
        |(i, name)| (i % 3 != 0).then_some(name.as_str()),
    ))])
    .unwrap();

    let output = execute(&bound, &input).unwrap();
    assert_eq!(output.chunk.len(), STANDARD_VECTOR_SIZE);
    assert_eq!(output.column().get(0), None);
    assert_eq!(output.column().get(1), Some(ValueRef::Text("DuckdbRdkit n1 🐥")));
}
