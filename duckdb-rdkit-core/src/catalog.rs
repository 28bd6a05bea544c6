//! The SQL functions this extension provides.
//!
//! [`FunctionInfo`] carries both the signature used to build a
//! [`FunctionDescriptor`] and the metadata used for introspection.

use std::sync::Arc;

use crate::binding::FunctionDescriptor;
use crate::bridge::{NativeFunction, NativeHandler, NativeLibraryBridge};
use crate::error::BridgeError;
use crate::types::TypeTag;

/// SQL name of the greeting function.
pub const GREETING_FUNCTION: &str = "duckdb_rdkit";

/// SQL name of the OpenSSL version function.
pub const OPENSSL_VERSION_FUNCTION: &str = "duckdb_rdkit_openssl_version";

/// Information about one SQL function.
#[derive(Debug, Clone)]
pub struct FunctionInfo {
    /// Function name as used in SQL.
    pub name: &'static str,
    /// Brief description of what the function does.
    pub description: &'static str,
    /// Declared parameter types.
    pub parameter_types: &'static [TypeTag],
    /// Declared return type.
    pub return_type: TypeTag,
    /// Example usage.
    pub example: &'static str,
    /// Native computation invoked per row.
    pub native: NativeFunction,
    /// Category for grouping in output.
    pub category: FunctionCategory,
}

impl FunctionInfo {
    /// Signature as written in SQL, e.g. `mol_amw(VARCHAR) -> DOUBLE`.
    pub fn signature(&self) -> String {
        let params: Vec<_> = self.parameter_types.iter().map(|t| sql_type(*t)).collect();
        format!(
            "{}({}) -> {}",
            self.name,
            params.join(", "),
            sql_type(self.return_type)
        )
    }

    /// Build the descriptor that runs on `bridge`.
    pub fn descriptor(&self, bridge: &Arc<NativeLibraryBridge>) -> FunctionDescriptor {
        FunctionDescriptor::new(
            self.name,
            self.parameter_types.iter().copied(),
            self.return_type,
            NativeHandler::new(self.native, Arc::clone(bridge)),
        )
    }
}

/// Function categories for grouping in documentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionCategory {
    /// Extension identity and linked library versions.
    Extension,
    /// Molecule descriptors and comparisons.
    Molecule,
}

impl FunctionCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            FunctionCategory::Extension => "Extension Functions",
            FunctionCategory::Molecule => "Molecule Functions",
        }
    }
}

/// DuckDB spelling of a type in signatures.
fn sql_type(tag: TypeTag) -> &'static str {
    match tag {
        TypeTag::Text => "VARCHAR",
        other => other.type_name(),
    }
}

const TEXT: &[TypeTag] = &[TypeTag::Text];
const TEXT_TEXT: &[TypeTag] = &[TypeTag::Text, TypeTag::Text];

/// Functions that need no optional library.
pub fn extension_functions() -> Vec<FunctionInfo> {
    vec![
        FunctionInfo {
            name: GREETING_FUNCTION,
            description: "Greeting carrying the extension's identity marker",
            parameter_types: TEXT,
            return_type: TypeTag::Text,
            example: "duckdb_rdkit('Sam') -> 'DuckdbRdkit Sam 🐥'",
            native: NativeFunction::Greeting,
            category: FunctionCategory::Extension,
        },
        FunctionInfo {
            name: OPENSSL_VERSION_FUNCTION,
            description: "Greeting that embeds the linked OpenSSL version",
            parameter_types: TEXT,
            return_type: TypeTag::Text,
            example: "duckdb_rdkit_openssl_version('Michael')",
            native: NativeFunction::OpenSslVersion,
            category: FunctionCategory::Extension,
        },
    ]
}

/// Functions computed by RDKit. Molecules are passed as SMILES.
pub fn molecule_functions() -> Vec<FunctionInfo> {
    let molecule = |name: &'static str,
                    description: &'static str,
                    return_type: TypeTag,
                    example: &'static str,
                    native: NativeFunction| FunctionInfo {
        name,
        description,
        parameter_types: TEXT,
        return_type,
        example,
        native,
        category: FunctionCategory::Molecule,
    };

    vec![
        molecule(
            "mol_to_smiles",
            "Canonical SMILES",
            TypeTag::Text,
            "mol_to_smiles('OCC') -> 'CCO'",
            NativeFunction::CanonicalSmiles,
        ),
        molecule(
            "mol_from_smiles",
            "Canonical SMILES, or NULL if the input does not parse",
            TypeTag::Text,
            "mol_from_smiles('C1CC') -> NULL",
            NativeFunction::MolFromSmiles,
        ),
        molecule(
            "mol_amw",
            "Average molecular weight",
            TypeTag::Double,
            "mol_amw('CCO')",
            NativeFunction::AverageMolWeight,
        ),
        molecule(
            "mol_exactmw",
            "Exact (monoisotopic) molecular weight",
            TypeTag::Double,
            "mol_exactmw('CCO')",
            NativeFunction::ExactMolWeight,
        ),
        molecule(
            "mol_tpsa",
            "Topological polar surface area",
            TypeTag::Double,
            "mol_tpsa('CCO')",
            NativeFunction::Tpsa,
        ),
        molecule(
            "mol_logp",
            "Crippen logP",
            TypeTag::Double,
            "mol_logp('CCO')",
            NativeFunction::CrippenLogP,
        ),
        molecule(
            "mol_hbd",
            "Hydrogen bond donor count",
            TypeTag::Integer,
            "mol_hbd('CCO') -> 1",
            NativeFunction::HbdCount,
        ),
        molecule(
            "mol_hba",
            "Hydrogen bond acceptor count",
            TypeTag::Integer,
            "mol_hba('CCO') -> 1",
            NativeFunction::HbaCount,
        ),
        molecule(
            "mol_num_rotatable_bonds",
            "Rotatable bond count",
            TypeTag::Integer,
            "mol_num_rotatable_bonds('CCCC')",
            NativeFunction::RotatableBondCount,
        ),
        FunctionInfo {
            name: "is_exact_match",
            description: "Whether two SMILES describe the same molecule",
            parameter_types: TEXT_TEXT,
            return_type: TypeTag::Boolean,
            example: "is_exact_match('OCC', 'CCO') -> true",
            native: NativeFunction::ExactMatch,
            category: FunctionCategory::Molecule,
        },
    ]
}

/// Every function this build registers.
pub fn builtin_functions() -> Vec<FunctionInfo> {
    let mut functions = extension_functions();
    if cfg!(feature = "rdkit") {
        functions.extend(molecule_functions());
    }
    functions
}

/// Descriptors for every builtin function on `bridge`.
///
/// Fails with `LibraryUnavailable` if any function's library is missing, so a
/// broken install is reported at load rather than on first use.
pub fn builtin_descriptors(
    bridge: &Arc<NativeLibraryBridge>,
) -> Result<Vec<FunctionDescriptor>, BridgeError> {
    let functions = builtin_functions();
    bridge.check_functions(functions.iter().map(|f| f.native))?;
    Ok(functions.iter().map(|f| f.descriptor(bridge)).collect())
}
