//! System hierarchy: ordered paths, recycle edges and the facility overlay.

use rf_core::{SystemId, UnitId};

use crate::options::ConvergenceOptions;

/// One step of a system path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Element {
    Unit(UnitId),
    /// A nested system, converged to completion when reached.
    System(SystemId),
}

/// A recycle connection, identified by the ports it joins.
///
/// The stream leaving `producer` through outlet `outlet` is the stream entering
/// `consumer` through inlet `inlet`. The consumer runs no later than the
/// producer in path order, so its inlet holds a guess until the loop converges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecycleEdge {
    pub producer: UnitId,
    pub outlet: usize,
    pub consumer: UnitId,
    pub inlet: usize,
}

/// A validated, immutable system.
#[derive(Debug, Clone, PartialEq)]
pub struct System {
    pub id: SystemId,
    pub name: String,
    pub path: Vec<Element>,
    pub recycles: Vec<RecycleEdge>,
    /// Utility elements run after the main path has converged.
    pub facilities: Vec<Element>,
    /// Closes a loop through the facilities (e.g. recovered process water).
    pub facility_recycle: Option<RecycleEdge>,
    /// Per-system override of the solve-wide convergence options.
    pub convergence: Option<ConvergenceOptions>,
}

impl System {
    pub fn has_recycle(&self) -> bool {
        !self.recycles.is_empty()
    }

    /// True when running the system may require more than one pass.
    pub fn is_looping(&self) -> bool {
        self.has_recycle() || self.facility_recycle.is_some()
    }

    /// Path followed by facilities, in evaluation order.
    pub fn elements(&self) -> impl Iterator<Item = &Element> + '_ {
        self.path.iter().chain(self.facilities.iter())
    }
}

/// Builder input describing a system.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SystemDef {
    pub name: String,
    pub path: Vec<Element>,
    pub recycles: Vec<RecycleEdge>,
    pub facilities: Vec<Element>,
    pub facility_recycle: Option<RecycleEdge>,
    pub convergence: Option<ConvergenceOptions>,
}

impl SystemDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_path(mut self, path: Vec<Element>) -> Self {
        self.path = path;
        self
    }

    pub fn with_recycle(mut self, edge: RecycleEdge) -> Self {
        self.recycles.push(edge);
        self
    }

    pub fn with_facilities(mut self, facilities: Vec<Element>) -> Self {
        self.facilities = facilities;
        self
    }

    pub fn with_facility_recycle(mut self, edge: RecycleEdge) -> Self {
        self.facility_recycle = Some(edge);
        self
    }

    pub fn with_convergence(mut self, options: ConvergenceOptions) -> Self {
        self.convergence = Some(options);
        self
    }

    pub(crate) fn into_system(self, id: SystemId) -> System {
        System {
            id,
            name: self.name,
            path: self.path,
            recycles: self.recycles,
            facilities: self.facilities,
            facility_recycle: self.facility_recycle,
            convergence: self.convergence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn looping_flags() {
        let u = UnitId::from_index(0);
        let edge = RecycleEdge {
            producer: u,
            outlet: 0,
            consumer: u,
            inlet: 0,
        };
        let plain = SystemDef::new("a")
            .with_path(vec![Element::Unit(u)])
            .into_system(SystemId::from_index(0));
        assert!(!plain.is_looping());

        let fac = SystemDef::new("b")
            .with_facilities(vec![Element::Unit(u)])
            .with_facility_recycle(edge)
            .into_system(SystemId::from_index(1));
        assert!(fac.is_looping());
        assert!(!fac.has_recycle());
        assert_eq!(fac.elements().count(), 1);
    }
}
