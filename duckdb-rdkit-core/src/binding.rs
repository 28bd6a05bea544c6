//! Function signatures and call-site binding.

use std::sync::Arc;

use compact_str::CompactString;
use smallvec::SmallVec;

use crate::bridge::NativeHandler;
use crate::error::BindError;
use crate::types::TypeTag;

/// One SQL scalar function: its signature and the computation it runs.
///
/// Immutable once built; the registry hands out `Arc<FunctionDescriptor>`.
#[derive(Debug, Clone)]
pub struct FunctionDescriptor {
    name: CompactString,
    parameter_types: SmallVec<[TypeTag; 4]>,
    return_type: TypeTag,
    handler: NativeHandler,
}

impl FunctionDescriptor {
    /// Describe a function.
    pub fn new(
        name: impl Into<CompactString>,
        parameter_types: impl IntoIterator<Item = TypeTag>,
        return_type: TypeTag,
        handler: NativeHandler,
    ) -> Self {
        Self {
            name: name.into(),
            parameter_types: parameter_types.into_iter().collect(),
            return_type,
            handler,
        }
    }

    /// SQL name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared parameter types, in order.
    pub fn parameter_types(&self) -> &[TypeTag] {
        &self.parameter_types
    }

    /// Declared return type.
    pub fn return_type(&self) -> TypeTag {
        self.return_type
    }

    /// Native computation.
    pub fn handler(&self) -> &NativeHandler {
        &self.handler
    }

    /// Number of parameters.
    pub fn arity(&self) -> usize {
        self.parameter_types.len()
    }

    /// Validate call-site argument types against this signature.
    ///
    /// Fails with `ArityMismatch` when the counts differ, or `TypeMismatch`
    /// naming the first argument that does not convert to its parameter.
    pub fn bind(self: &Arc<Self>, call_site_types: &[TypeTag]) -> Result<BoundCall, BindError> {
        if call_site_types.len() != self.arity() {
            return Err(BindError::ArityMismatch {
                function: self.name.to_string(),
                expected: self.arity(),
                actual: call_site_types.len(),
            });
        }

        for (position, (&actual, &expected)) in call_site_types
            .iter()
            .zip(self.parameter_types.iter())
            .enumerate()
        {
            if !actual.is_convertible_to(expected) {
                return Err(BindError::TypeMismatch {
                    function: self.name.to_string(),
                    position,
                    expected,
                    actual,
                });
            }
        }

        Ok(BoundCall {
            descriptor: Arc::clone(self),
            call_site_types: call_site_types.iter().copied().collect(),
        })
    }
}

/// A descriptor bound to one call site's argument types.
///
/// Immutable; share it freely across threads executing the same statement.
#[derive(Debug, Clone)]
pub struct BoundCall {
    descriptor: Arc<FunctionDescriptor>,
    call_site_types: SmallVec<[TypeTag; 4]>,
}

impl BoundCall {
    /// The bound function.
    pub fn descriptor(&self) -> &Arc<FunctionDescriptor> {
        &self.descriptor
    }

    /// Argument types as seen at the call site.
    pub fn call_site_types(&self) -> &[TypeTag] {
        &self.call_site_types
    }

    /// Types the arguments are coerced to before the native call.
    pub fn parameter_types(&self) -> &[TypeTag] {
        self.descriptor.parameter_types()
    }

    /// Result type.
    pub fn return_type(&self) -> TypeTag {
        self.descriptor.return_type()
    }

    /// SQL name of the bound function.
    pub fn name(&self) -> &str {
        self.descriptor.name()
    }
}
