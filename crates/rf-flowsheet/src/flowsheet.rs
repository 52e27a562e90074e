//! The flowsheet context: every entity one simulation works on.

use std::collections::HashMap;

use rf_core::{GroupId, Id, Real, StreamId, SystemId, UnitId};
use rf_stream::{Chemicals, Stream};
use rf_units::UnitModel;

use crate::error::{FlowsheetError, FlowsheetResult};
use crate::spec::Specification;
use crate::system::{RecycleEdge, System};

/// A unit port: `index` into the unit's inlet or outlet list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Port {
    pub unit: UnitId,
    pub index: usize,
}

/// A named stream with its current value and wiring.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamEntry {
    pub id: StreamId,
    pub name: String,
    pub value: Stream,
    pub producer: Option<Port>,
    pub consumer: Option<Port>,
}

impl StreamEntry {
    /// Feeds have no producing unit; their values are set by the user.
    pub fn is_feed(&self) -> bool {
        self.producer.is_none()
    }
}

/// A unit operation placed in the flowsheet.
#[derive(Debug)]
pub struct Unit {
    pub id: UnitId,
    pub name: String,
    pub ins: Vec<StreamId>,
    pub outs: Vec<StreamId>,
    pub model: Box<dyn UnitModel>,
    /// Runs before the model on every evaluation.
    pub specification: Specification,
    pub tags: Vec<String>,
}

impl Unit {
    pub fn kind(&self) -> &'static str {
        self.model.kind()
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// Named reporting group. Membership never affects evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitGroup {
    pub id: GroupId,
    pub name: String,
    pub units: Vec<UnitId>,
}

/// Flowsheet context owning chemicals, streams, units and systems.
///
/// Built by [`crate::FlowsheetBuilder`]; several flowsheets may coexist, each
/// simulated independently.
#[derive(Debug)]
pub struct Flowsheet {
    pub(crate) name: String,
    pub(crate) chemicals: Chemicals,
    pub(crate) streams: Vec<StreamEntry>,
    pub(crate) units: Vec<Unit>,
    pub(crate) systems: Vec<System>,
    pub(crate) groups: Vec<UnitGroup>,
    pub(crate) stream_names: HashMap<String, StreamId>,
    pub(crate) unit_names: HashMap<String, UnitId>,
    pub(crate) system_names: HashMap<String, SystemId>,
    pub(crate) group_names: HashMap<String, GroupId>,
}

fn lookup<'a, T>(items: &'a [T], id: Id, what: &'static str) -> FlowsheetResult<&'a T> {
    items
        .get(id.slot())
        .ok_or(FlowsheetError::UnknownId { what, id })
}

fn by_name(map: &HashMap<String, Id>, name: &str, what: &'static str) -> FlowsheetResult<Id> {
    map.get(name)
        .copied()
        .ok_or_else(|| FlowsheetError::UnknownName {
            what,
            name: name.to_string(),
        })
}

impl Flowsheet {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn chemicals(&self) -> &Chemicals {
        &self.chemicals
    }

    pub fn streams(&self) -> &[StreamEntry] {
        &self.streams
    }

    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    pub fn systems(&self) -> &[System] {
        &self.systems
    }

    pub fn groups(&self) -> &[UnitGroup] {
        &self.groups
    }

    pub fn stream_entry(&self, id: StreamId) -> FlowsheetResult<&StreamEntry> {
        lookup(&self.streams, id, "stream")
    }

    pub fn stream(&self, id: StreamId) -> FlowsheetResult<&Stream> {
        Ok(&self.stream_entry(id)?.value)
    }

    pub fn stream_mut(&mut self, id: StreamId) -> FlowsheetResult<&mut Stream> {
        self.streams
            .get_mut(id.slot())
            .map(|e| &mut e.value)
            .ok_or(FlowsheetError::UnknownId { what: "stream", id })
    }

    pub fn unit(&self, id: UnitId) -> FlowsheetResult<&Unit> {
        lookup(&self.units, id, "unit")
    }

    fn unit_mut(&mut self, id: UnitId) -> FlowsheetResult<&mut Unit> {
        self.units
            .get_mut(id.slot())
            .ok_or(FlowsheetError::UnknownId { what: "unit", id })
    }

    pub fn system(&self, id: SystemId) -> FlowsheetResult<&System> {
        lookup(&self.systems, id, "system")
    }

    pub fn group(&self, id: GroupId) -> FlowsheetResult<&UnitGroup> {
        lookup(&self.groups, id, "group")
    }

    pub fn stream_id(&self, name: &str) -> FlowsheetResult<StreamId> {
        by_name(&self.stream_names, name, "stream")
    }

    pub fn unit_id(&self, name: &str) -> FlowsheetResult<UnitId> {
        by_name(&self.unit_names, name, "unit")
    }

    pub fn system_id(&self, name: &str) -> FlowsheetResult<SystemId> {
        by_name(&self.system_names, name, "system")
    }

    pub fn group_id(&self, name: &str) -> FlowsheetResult<GroupId> {
        by_name(&self.group_names, name, "group")
    }

    pub fn stream_name(&self, id: StreamId) -> &str {
        self.streams.get(id.slot()).map_or("?", |e| e.name.as_str())
    }

    pub fn unit_name(&self, id: UnitId) -> &str {
        self.units.get(id.slot()).map_or("?", |u| u.name.as_str())
    }

    pub fn system_name(&self, id: SystemId) -> &str {
        self.systems.get(id.slot()).map_or("?", |s| s.name.as_str())
    }

    /// Stream carried by a recycle edge.
    pub fn recycle_stream(&self, edge: &RecycleEdge) -> FlowsheetResult<StreamId> {
        let unit = self.unit(edge.producer)?;
        unit.outs
            .get(edge.outlet)
            .copied()
            .ok_or_else(|| FlowsheetError::UnknownName {
                what: "outlet",
                name: format!("{}[{}]", unit.name, edge.outlet),
            })
    }

    /// Ids of all streams without a producing unit.
    pub fn feeds(&self) -> impl Iterator<Item = StreamId> + '_ {
        self.streams.iter().filter(|e| e.is_feed()).map(|e| e.id)
    }

    pub fn units_with_tag<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = UnitId> + 'a {
        self.units.iter().filter(move |u| u.has_tag(tag)).map(|u| u.id)
    }

    /// Evaluate one unit's model from its current inlets into its outlets.
    ///
    /// Does not run the unit's specification.
    pub fn run_unit(&mut self, id: UnitId) -> FlowsheetResult<()> {
        let unit = lookup(&self.units, id, "unit")?;
        let ins: Vec<Stream> = unit
            .ins
            .iter()
            .map(|s| self.streams[s.slot()].value.clone())
            .collect();
        let mut outs: Vec<Stream> = unit
            .outs
            .iter()
            .map(|s| self.streams[s.slot()].value.clone())
            .collect();

        unit.model
            .run(&self.chemicals, &ins, &mut outs)
            .map_err(|source| FlowsheetError::Evaluation {
                unit: unit.name.clone(),
                source,
            })?;

        let out_ids = unit.outs.clone();
        for (sid, value) in out_ids.iter().zip(&outs) {
            self.streams[sid.slot()].value.assign(value)?;
        }
        Ok(())
    }

    pub fn parameter(&self, unit: UnitId, name: &str) -> FlowsheetResult<Real> {
        let u = self.unit(unit)?;
        u.model
            .parameter(name)
            .map_err(|source| FlowsheetError::Parameter {
                unit: u.name.clone(),
                source,
            })
    }

    pub fn set_parameter(&mut self, unit: UnitId, name: &str, value: Real) -> FlowsheetResult<()> {
        let u = self.unit_mut(unit)?;
        u.model
            .set_parameter(name, value)
            .map_err(|source| FlowsheetError::Parameter {
                unit: u.name.clone(),
                source,
            })
    }

    /// Replace a unit's specification at runtime.
    pub fn set_specification(&mut self, unit: UnitId, spec: Specification) -> FlowsheetResult<()> {
        self.unit_mut(unit)?.specification = spec;
        Ok(())
    }

    /// Toggle a unit's search specification on or off.
    pub fn set_specification_enabled(
        &mut self,
        unit: UnitId,
        enabled: bool,
    ) -> FlowsheetResult<()> {
        let u = self.unit_mut(unit)?;
        match &mut u.specification {
            Specification::Search(search) => {
                search.enabled = enabled;
                Ok(())
            }
            _ => Err(FlowsheetError::InvalidSpecification {
                unit: u.name.clone(),
                reason: "unit has no search specification to toggle".into(),
            }),
        }
    }

    /// Reset every non-feed stream to an empty stream at standard conditions.
    ///
    /// The next simulation then starts cold instead of from the last solution.
    pub fn reset_streams(&mut self) -> FlowsheetResult<()> {
        let empty = Stream::new(self.chemicals.len());
        for entry in self.streams.iter_mut().filter(|e| !e.is_feed()) {
            entry.value.assign(&empty)?;
        }
        Ok(())
    }
}
