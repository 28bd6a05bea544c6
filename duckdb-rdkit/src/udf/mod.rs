//! Scalar functions registered with DuckDB.
//!
//! ## Extension Functions
//!
//! - `duckdb_rdkit(name)` - Greeting with the extension's identity marker
//! - `duckdb_rdkit_openssl_version(name)` - Greeting with the linked OpenSSL version
//!
//! ## Molecule Functions (feature `rdkit`)
//!
//! - `mol_to_smiles(smiles)` - Canonical SMILES
//! - `mol_from_smiles(smiles)` - Canonical SMILES, NULL if unparsable
//! - `mol_amw(smiles)`, `mol_exactmw(smiles)` - Molecular weights
//! - `mol_tpsa(smiles)`, `mol_logp(smiles)` - Polar surface area, Crippen logP
//! - `mol_hbd(smiles)`, `mol_hba(smiles)`, `mol_num_rotatable_bonds(smiles)` - Counts
//! - `is_exact_match(smiles, smiles)` - Same molecule
//!
//! ## Example Usage
//!
//! ```sql
//! SELECT duckdb_rdkit('Sam');  -- 'DuckdbRdkit Sam 🐥'
//! SELECT duckdb_rdkit_openssl_version('Michael');
//!
//! SELECT smiles, mol_amw(smiles) AS amw, mol_tpsa(smiles) AS tpsa
//! FROM molecules
//! WHERE is_exact_match(smiles, 'CCO');
//! ```

mod dispatch;

pub use dispatch::{CatalogName, RegistryScalar};

use duckdb::Connection;
use duckdb_rdkit_core::catalog::{GREETING_FUNCTION, OPENSSL_VERSION_FUNCTION};
use duckdb_rdkit_core::FunctionRegistry;

use crate::error::DuckDbError;

macro_rules! catalog_names {
    ($($marker:ident => $name:expr),* $(,)?) => {
        $(
            pub struct $marker;

            impl CatalogName for $marker {
                const NAME: &'static str = $name;
            }
        )*

        /// Every SQL name that has a marker type.
        pub const MARKED_NAMES: &[&str] = &[$($name),*];

        fn register_markers(
            con: &Connection,
            registry: &FunctionRegistry,
        ) -> Result<usize, DuckDbError> {
            let mut registered = 0;
            $(
                if register::<$marker>(con, registry)? {
                    registered += 1;
                }
            )*
            Ok(registered)
        }
    };
}

catalog_names! {
    Greeting => GREETING_FUNCTION,
    OpenSslVersion => OPENSSL_VERSION_FUNCTION,
    MolToSmiles => "mol_to_smiles",
    MolFromSmiles => "mol_from_smiles",
    MolAmw => "mol_amw",
    MolExactMw => "mol_exactmw",
    MolTpsa => "mol_tpsa",
    MolLogP => "mol_logp",
    MolHbd => "mol_hbd",
    MolHba => "mol_hba",
    MolNumRotatableBonds => "mol_num_rotatable_bonds",
    IsExactMatch => "is_exact_match",
}

fn register<F: CatalogName>(
    con: &Connection,
    registry: &FunctionRegistry,
) -> Result<bool, DuckDbError> {
    if !registry.contains(F::NAME) {
        return Ok(false);
    }
    con.register_scalar_function::<RegistryScalar<F>>(F::NAME)?;
    tracing::debug!(function = F::NAME, "Registered scalar function with DuckDB");
    Ok(true)
}

/// Register every function present in `registry` with DuckDB.
///
/// Returns the number registered.
pub fn register_all(con: &Connection, registry: &FunctionRegistry) -> Result<usize, DuckDbError> {
    register_markers(con, registry)
}
