//! Chain construction and validation.
//!
//! The chain order is exactly the order units are supplied in. Validation
//! only checks that it is self-consistent; it never reorders anything.

use crate::{ChainError, Transformer, VersionTag};
use std::collections::{HashMap, HashSet};

/// Ordered version tags plus the lookup table from tag to unit.
pub(crate) struct Chain<M> {
    pub(crate) order: Vec<VersionTag>,
    pub(crate) transformers: HashMap<VersionTag, Transformer<M>>,
}

impl<M> Chain<M> {
    /// Build the chain. With `validate` off, a duplicated version keeps every
    /// position in the order while the last unit supplied wins the lookup.
    pub(crate) fn build(units: Vec<Transformer<M>>, validate: bool) -> Result<Self, ChainError> {
        if validate {
            validate_units(&units)?;
        }

        let mut order = Vec::with_capacity(units.len());
        let mut transformers = HashMap::with_capacity(units.len());
        for unit in units {
            let version = unit.version().to_string();
            order.push(version.clone());
            transformers.insert(version, unit);
        }

        Ok(Self {
            order,
            transformers,
        })
    }

    pub(crate) fn position_of(&self, version: &str) -> Option<usize> {
        self.order.iter().position(|v| v == version)
    }
}

/// Check for duplicate versions and for declared neighbours that disagree
/// with the supplied order.
pub fn validate_units<M>(units: &[Transformer<M>]) -> Result<(), ChainError> {
    let mut seen = HashSet::with_capacity(units.len());
    for unit in units {
        if !seen.insert(unit.version()) {
            return Err(ChainError::DuplicateVersion {
                version: unit.version().to_string(),
            });
        }
    }

    for (i, unit) in units.iter().enumerate() {
        if let Some(declared) = unit.declared_previous() {
            let actual = i.checked_sub(1).map(|p| units[p].version());
            if actual != Some(declared) {
                return Err(ChainError::PreviousMismatch {
                    version: unit.version().to_string(),
                    declared: declared.to_string(),
                    actual: actual.map(str::to_string),
                });
            }
        }

        if let Some(declared) = unit.declared_next() {
            let actual = units.get(i + 1).map(|n| n.version());
            if actual != Some(declared) {
                return Err(ChainError::NextMismatch {
                    version: unit.version().to_string(),
                    declared: declared.to_string(),
                    actual: actual.map(str::to_string),
                });
            }
        }
    }

    Ok(())
}
