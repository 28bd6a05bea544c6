//! RDKit-backed molecule computations.
//!
//! Molecules arrive as SMILES text and are parsed per call. RDKit reports a
//! parse failure as an exception, which the `rdkit` crate surfaces as an
//! `Err`; both that and a missing descriptor become `NativeCallFailed`.
//! `mol_from_smiles` is the exception: an unparsable input yields NULL.

use std::collections::HashMap;

use rdkit::{Properties, ROMol};

use crate::error::BridgeError;

use super::linked::text_arg;
use super::{NativeArg, NativeFunction, NativeValue};

/// Descriptor keys in the map returned by `Properties::compute_properties`.
mod keys {
    pub const AMW: &str = "amw";
    pub const EXACT_MW: &str = "exactmw";
    pub const TPSA: &str = "tpsa";
    pub const LOGP: &str = "CrippenClogP";
    pub const HBD: &str = "NumHBD";
    pub const HBA: &str = "NumHBA";
    pub const ROTATABLE_BONDS: &str = "NumRotatableBonds";
    pub const ATOMS: &str = "NumAtoms";
    pub const HEAVY_ATOMS: &str = "NumHeavyAtoms";
    pub const RINGS: &str = "NumRings";
}

pub(super) fn call(
    function: NativeFunction,
    args: &[NativeArg<'_>],
) -> Result<NativeValue, BridgeError> {
    if function == NativeFunction::MolFromSmiles {
        let smiles = text_arg(function, args, 0)?;
        return Ok(ROMol::from_smiles(smiles)
            .map(|mol| NativeValue::Text(mol.as_smiles()))
            .unwrap_or(NativeValue::Null));
    }

    let mol = parse(text_arg(function, args, 0)?)?;

    match function {
        NativeFunction::CanonicalSmiles => Ok(NativeValue::Text(mol.as_smiles())),
        NativeFunction::AverageMolWeight => descriptor(&mol, keys::AMW).map(NativeValue::Double),
        NativeFunction::ExactMolWeight => {
            descriptor(&mol, keys::EXACT_MW).map(NativeValue::Double)
        }
        NativeFunction::Tpsa => descriptor(&mol, keys::TPSA).map(NativeValue::Double),
        NativeFunction::CrippenLogP => descriptor(&mol, keys::LOGP).map(NativeValue::Double),
        NativeFunction::HbdCount => count(&mol, keys::HBD).map(NativeValue::Integer),
        NativeFunction::HbaCount => count(&mol, keys::HBA).map(NativeValue::Integer),
        NativeFunction::RotatableBondCount => {
            count(&mol, keys::ROTATABLE_BONDS).map(NativeValue::Integer)
        }
        NativeFunction::ExactMatch => {
            let left = text_arg(function, args, 0)?;
            let right = text_arg(function, args, 1)?;
            let other = parse(right)?;
            is_exact_match((left, &mol), (right, &other)).map(NativeValue::Boolean)
        }
        NativeFunction::Greeting
        | NativeFunction::OpenSslVersion
        | NativeFunction::MolFromSmiles => Err(BridgeError::native(
            format!("{} is not an RDKit computation", function),
        )),
    }
}

fn parse(smiles: &str) -> Result<ROMol, BridgeError> {
    ROMol::from_smiles(smiles)
        .map_err(|e| BridgeError::native(format!("could not parse SMILES '{}': {}", smiles, e)))
}

/// Build the descriptor parameter tables before any concurrent use.
pub(super) fn warm_up() {
    if let Ok(mol) = ROMol::from_smiles("CCO") {
        let computed = properties(&mol).len();
        tracing::debug!(descriptors = computed, "Initialised RDKit descriptor tables");
    }
}

fn properties(mol: &ROMol) -> HashMap<String, f64> {
    Properties::new().compute_properties(mol)
}

fn descriptor(mol: &ROMol, key: &str) -> Result<f64, BridgeError> {
    lookup(&properties(mol), key)
}

fn count(mol: &ROMol, key: &str) -> Result<i32, BridgeError> {
    descriptor(mol, key).map(|v| v.round() as i32)
}

fn lookup(props: &HashMap<String, f64>, key: &str) -> Result<f64, BridgeError> {
    props
        .get(key)
        .copied()
        .ok_or_else(|| BridgeError::native(format!("descriptor '{}' not computed", key)))
}

/// Same constitution, ignoring stereochemistry and isotopes.
///
/// Atom count, heavy atom count, ring count and rounded average weight must
/// agree before the canonical SMILES of both stripped inputs are compared.
/// The `rdkit` crate exposes no bond count, so heavy atoms stand in for it.
fn is_exact_match(
    (left_smiles, left): (&str, &ROMol),
    (right_smiles, right): (&str, &ROMol),
) -> Result<bool, BridgeError> {
    let (lp, rp) = (properties(left), properties(right));
    for key in [keys::ATOMS, keys::HEAVY_ATOMS, keys::RINGS] {
        if lookup(&lp, key)? != lookup(&rp, key)? {
            return Ok(false);
        }
    }
    if (lookup(&lp, keys::AMW)? - lookup(&rp, keys::AMW)?).round() != 0.0 {
        return Ok(false);
    }

    Ok(non_isomeric_smiles(left_smiles)? == non_isomeric_smiles(right_smiles)?)
}

/// Canonical SMILES with chirality, bond directions and isotopes removed.
fn non_isomeric_smiles(smiles: &str) -> Result<String, BridgeError> {
    Ok(parse(&strip_isomeric(smiles))?.as_smiles())
}

/// Chirality classes that may follow `@` in a bracket atom.
const CHIRAL_CLASSES: [&str; 5] = ["TH", "AL", "SP", "TB", "OH"];

/// Drop the isomeric parts of a SMILES string.
///
/// Removes `/` and `\` bond directions, and inside bracket atoms the
/// isotope prefix and any `@`, `@@` or `@XXn` chirality mark.
fn strip_isomeric(smiles: &str) -> String {
    let mut out = String::with_capacity(smiles.len());
    let mut chars = smiles.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '/' | '\\' => {}
            '[' => {
                out.push('[');
                while chars.next_if(char::is_ascii_digit).is_some() {}
                while let Some(inner) = chars.next() {
                    if inner == '@' {
                        while chars.next_if_eq(&'@').is_some() {}
                        let rest: String = chars.clone().take(2).collect();
                        if CHIRAL_CLASSES.contains(&rest.as_str()) {
                            let _ = chars.nth(1);
                            while chars.next_if(char::is_ascii_digit).is_some() {}
                        }
                        continue;
                    }
                    out.push(inner);
                    if inner == ']' {
                        break;
                    }
                }
            }
            other => out.push(other),
        }
    }
    out
}
