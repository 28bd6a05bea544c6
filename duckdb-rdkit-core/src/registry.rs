//! Name-to-descriptor table for registered SQL functions.
//!
//! The table is written while the extension loads and unloads and read on
//! every chunk. A lookup holds the read lock only long enough to clone an
//! `Arc`, so row processing never runs under the lock.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, OnceLock};

use compact_str::CompactString;
use parking_lot::RwLock;

use crate::binding::FunctionDescriptor;
use crate::error::RegistryError;

/// What [`FunctionRegistry::register`] does with a name that is taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplacePolicy {
    /// Last write wins
    #[default]
    Replace,
    /// Fail with `DuplicateNameConflict`
    Reject,
}

/// Registry of scalar functions keyed by SQL name.
///
/// SQL names are case-insensitive; keys are stored lowercased.
#[derive(Debug)]
pub struct FunctionRegistry {
    functions: RwLock<HashMap<CompactString, Arc<FunctionDescriptor>>>,
    policy: RwLock<ReplacePolicy>,
}

impl FunctionRegistry {
    /// Create an empty registry with the given replacement policy.
    pub fn new(policy: ReplacePolicy) -> Self {
        Self {
            functions: RwLock::new(HashMap::new()),
            policy: RwLock::new(policy),
        }
    }

    /// Current replacement policy.
    pub fn policy(&self) -> ReplacePolicy {
        *self.policy.read()
    }

    /// Change the replacement policy for later registrations.
    pub fn set_policy(&self, policy: ReplacePolicy) {
        *self.policy.write() = policy;
    }

    /// Insert a descriptor, replacing any previous one of the same name unless
    /// the policy is [`ReplacePolicy::Reject`].
    pub fn register(&self, descriptor: FunctionDescriptor) -> Result<(), RegistryError> {
        let policy = self.policy();
        let key = normalize(descriptor.name());
        let mut functions = self.functions.write();

        if policy == ReplacePolicy::Reject && functions.contains_key(&key) {
            return Err(RegistryError::DuplicateNameConflict {
                name: descriptor.name().to_string(),
            });
        }

        tracing::debug!(
            function = descriptor.name(),
            arity = descriptor.arity(),
            return_type = %descriptor.return_type(),
            "Registered function"
        );
        functions.insert(key, Arc::new(descriptor));
        Ok(())
    }

    /// Register a batch of descriptors, returning how many distinct names were
    /// installed. Within a batch the last descriptor for a name wins.
    ///
    /// Under [`ReplacePolicy::Reject`] the whole batch is checked first, so a
    /// conflict leaves the registry unchanged.
    pub fn install<I>(&self, descriptors: I) -> Result<usize, RegistryError>
    where
        I: IntoIterator<Item = FunctionDescriptor>,
    {
        let descriptors: Vec<_> = descriptors.into_iter().collect();
        let policy = self.policy();
        let mut functions = self.functions.write();

        if policy == ReplacePolicy::Reject {
            let mut seen = HashSet::new();
            for descriptor in &descriptors {
                let key = normalize(descriptor.name());
                if functions.contains_key(&key) || !seen.insert(key) {
                    return Err(RegistryError::DuplicateNameConflict {
                        name: descriptor.name().to_string(),
                    });
                }
            }
        }

        let mut installed = HashSet::new();
        for descriptor in descriptors {
            tracing::debug!(function = descriptor.name(), "Registered function");
            let key = normalize(descriptor.name());
            functions.insert(key.clone(), Arc::new(descriptor));
            installed.insert(key);
        }
        Ok(installed.len())
    }

    /// Fetch a descriptor by name.
    #[inline]
    pub fn lookup(&self, name: &str) -> Result<Arc<FunctionDescriptor>, RegistryError> {
        self.functions
            .read()
            .get(normalize(name).as_str())
            .cloned()
            .ok_or_else(|| RegistryError::UnknownFunction {
                name: name.to_string(),
            })
    }

    /// Check if a function is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.functions.read().contains_key(normalize(name).as_str())
    }

    /// Remove every function. Safe to call on an empty registry.
    ///
    /// Returns how many were removed.
    pub fn unregister_all(&self) -> usize {
        let mut functions = self.functions.write();
        let removed = functions.len();
        functions.clear();
        removed
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .functions
            .read()
            .values()
            .map(|d| d.name().to_string())
            .collect();
        names.sort();
        names
    }

    /// Get the number of registered functions.
    pub fn len(&self) -> usize {
        self.functions.read().len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.functions.read().is_empty()
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new(ReplacePolicy::default())
    }
}

fn normalize(name: &str) -> CompactString {
    CompactString::from(name.to_ascii_lowercase())
}

/// The process-wide registry the extension installs into.
pub fn global_registry() -> &'static FunctionRegistry {
    static REGISTRY: OnceLock<FunctionRegistry> = OnceLock::new();
    REGISTRY.get_or_init(FunctionRegistry::default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::{NativeFunction, NativeHandler, NativeLibraryBridge};
    use crate::types::TypeTag;

    fn descriptor(name: &str, return_type: TypeTag) -> FunctionDescriptor {
        let bridge = Arc::new(NativeLibraryBridge::linked());
        FunctionDescriptor::new(
            name,
            [TypeTag::Text],
            return_type,
            NativeHandler::new(NativeFunction::Greeting, bridge),
        )
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = FunctionRegistry::default();
        registry.register(descriptor("duckdb_rdkit", TypeTag::Text)).unwrap();

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.lookup("duckdb_rdkit").unwrap().name(), "duckdb_rdkit");
        assert!(registry.contains("DUCKDB_RDKIT"));
        assert_eq!(
            registry.lookup("missing").unwrap_err(),
            RegistryError::UnknownFunction {
                name: "missing".to_string()
            }
        );
    }

    #[test]
    fn test_last_write_wins() {
        let registry = FunctionRegistry::default();
        registry.register(descriptor("f", TypeTag::Text)).unwrap();
        registry.register(descriptor("f", TypeTag::Integer)).unwrap();

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.lookup("f").unwrap().return_type(), TypeTag::Integer);
    }

    #[test]
    fn test_reject_policy() {
        let registry = FunctionRegistry::new(ReplacePolicy::Reject);
        registry.register(descriptor("f", TypeTag::Text)).unwrap();
        assert_eq!(
            registry.register(descriptor("F", TypeTag::Integer)).unwrap_err(),
            RegistryError::DuplicateNameConflict {
                name: "F".to_string()
            }
        );
        assert_eq!(registry.lookup("f").unwrap().return_type(), TypeTag::Text);
    }

    #[test]
    fn test_install_is_all_or_nothing_under_reject() {
        let registry = FunctionRegistry::new(ReplacePolicy::Reject);
        let err = registry
            .install([descriptor("a", TypeTag::Text), descriptor("a", TypeTag::Text)])
            .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateNameConflict { .. }));
        assert!(registry.is_empty());

        assert_eq!(
            registry
                .install([descriptor("b", TypeTag::Text), descriptor("a", TypeTag::Text)])
                .unwrap(),
            2
        );
        assert_eq!(registry.names(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_install_counts_distinct_names() {
        let registry = FunctionRegistry::default();
        let installed = registry
            .install([descriptor("a", TypeTag::Text), descriptor("A", TypeTag::Integer)])
            .unwrap();
        assert_eq!(installed, 1);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.lookup("a").unwrap().return_type(), TypeTag::Integer);
    }

    #[test]
    fn test_unregister_all_idempotent() {
        let registry = FunctionRegistry::default();
        registry.register(descriptor("f", TypeTag::Text)).unwrap();
        assert_eq!(registry.unregister_all(), 1);
        assert_eq!(registry.unregister_all(), 0);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_lookup_outlives_unregister() {
        let registry = FunctionRegistry::default();
        registry.register(descriptor("f", TypeTag::Text)).unwrap();
        let held = registry.lookup("f").unwrap();
        registry.unregister_all();
        assert_eq!(held.name(), "f");
    }
}
