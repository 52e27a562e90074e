//! Chemical registry shared by every stream of a flowsheet.

use std::collections::HashMap;

use rf_core::{ChemicalId, Real};

use crate::error::{StreamError, StreamResult};

/// A registered chemical.
#[derive(Debug, Clone, PartialEq)]
pub struct Chemical {
    pub id: ChemicalId,
    pub name: String,
    /// Molar mass [kg/kmol].
    pub molar_mass: Real,
}

/// Ordered set of chemicals; the order defines the layout of every stream's flow vector.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Chemicals {
    items: Vec<Chemical>,
    by_name: HashMap<String, ChemicalId>,
}

impl Chemicals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from `(name, molar_mass)` pairs.
    pub fn from_pairs(pairs: &[(&str, Real)]) -> StreamResult<Self> {
        let mut chems = Self::new();
        for (name, mw) in pairs {
            chems.add(*name, *mw)?;
        }
        Ok(chems)
    }

    /// Register a chemical and return its ID.
    pub fn add(&mut self, name: impl Into<String>, molar_mass: Real) -> StreamResult<ChemicalId> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(StreamError::InvalidArg {
                what: "chemical name must not be empty",
            });
        }
        if !molar_mass.is_finite() || molar_mass <= 0.0 {
            return Err(StreamError::NonPhysical {
                what: "molar mass must be positive and finite",
            });
        }
        if self.by_name.contains_key(&name) {
            return Err(StreamError::DuplicateChemical { name });
        }
        let id = ChemicalId::from_usize(self.items.len());
        self.by_name.insert(name.clone(), id);
        self.items.push(Chemical {
            id,
            name,
            molar_mass,
        });
        Ok(id)
    }

    pub fn id(&self, name: &str) -> Option<ChemicalId> {
        self.by_name.get(name).copied()
    }

    /// Look up a chemical, failing with `UnknownChemical`.
    pub fn require(&self, name: &str) -> StreamResult<ChemicalId> {
        self.id(name).ok_or_else(|| StreamError::UnknownChemical {
            name: name.to_string(),
        })
    }

    pub fn get(&self, id: ChemicalId) -> Option<&Chemical> {
        self.items.get(id.slot())
    }

    pub fn name(&self, id: ChemicalId) -> &str {
        self.get(id).map_or("?", |c| c.name.as_str())
    }

    pub fn molar_mass(&self, id: ChemicalId) -> Real {
        self.get(id).map_or(0.0, |c| c.molar_mass)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Chemical> + '_ {
        self.items.iter()
    }
}
