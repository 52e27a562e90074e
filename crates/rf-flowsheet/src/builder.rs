//! Incremental flowsheet builder.

use std::collections::HashMap;

use rf_core::{ChemicalId, GroupId, Id, Real, StreamId, SystemId, UnitId};
use rf_stream::{Chemicals, Stream, StreamError};
use rf_units::UnitModel;

use crate::error::{FlowsheetError, FlowsheetResult};
use crate::flowsheet::{Flowsheet, Port, StreamEntry, Unit, UnitGroup};
use crate::spec::Specification;
use crate::system::{RecycleEdge, SystemDef};
use crate::validate;

#[derive(Debug)]
struct PendingUnit {
    name: String,
    model: Box<dyn UnitModel>,
    ins: Vec<StreamId>,
    outs: Vec<StreamId>,
    specification: Specification,
    tags: Vec<String>,
}

/// Builder for constructing a flowsheet incrementally.
///
/// Entities are referenced by the ids the `add_*` methods return. `build()`
/// validates the whole assembly and freezes the structure into a `Flowsheet`;
/// stream values, unit parameters and specifications stay mutable afterwards.
#[derive(Debug, Default)]
pub struct FlowsheetBuilder {
    name: String,
    chemicals: Chemicals,
    streams: Vec<(String, Option<Stream>)>,
    units: Vec<PendingUnit>,
    systems: Vec<SystemDef>,
    groups: Vec<(String, Vec<UnitId>)>,
}

impl FlowsheetBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn add_chemical(
        &mut self,
        name: impl Into<String>,
        molar_mass: Real,
    ) -> FlowsheetResult<ChemicalId> {
        Ok(self.chemicals.add(name, molar_mass)?)
    }

    pub fn add_chemicals(&mut self, pairs: &[(&str, Real)]) -> FlowsheetResult<Vec<ChemicalId>> {
        pairs
            .iter()
            .map(|(name, mw)| self.add_chemical(*name, *mw))
            .collect()
    }

    pub fn chemicals(&self) -> &Chemicals {
        &self.chemicals
    }

    /// Add an intermediate or product stream, empty until its producer runs.
    pub fn add_stream(&mut self, name: impl Into<String>) -> StreamId {
        let id = StreamId::from_usize(self.streams.len());
        self.streams.push((name.into(), None));
        id
    }

    /// Add a stream with an initial value. Streams nobody produces are feeds.
    pub fn add_feed(&mut self, name: impl Into<String>, value: Stream) -> StreamId {
        let id = StreamId::from_usize(self.streams.len());
        self.streams.push((name.into(), Some(value)));
        id
    }

    pub fn add_unit(
        &mut self,
        name: impl Into<String>,
        model: impl UnitModel + 'static,
        ins: &[StreamId],
        outs: &[StreamId],
    ) -> UnitId {
        self.add_boxed_unit(name, Box::new(model), ins, outs)
    }

    pub fn add_boxed_unit(
        &mut self,
        name: impl Into<String>,
        model: Box<dyn UnitModel>,
        ins: &[StreamId],
        outs: &[StreamId],
    ) -> UnitId {
        let id = UnitId::from_usize(self.units.len());
        self.units.push(PendingUnit {
            name: name.into(),
            model,
            ins: ins.to_vec(),
            outs: outs.to_vec(),
            specification: Specification::None,
            tags: Vec::new(),
        });
        id
    }

    fn pending_unit(&mut self, unit: UnitId) -> FlowsheetResult<&mut PendingUnit> {
        self.units
            .get_mut(unit.slot())
            .ok_or(FlowsheetError::UnknownId { what: "unit", id: unit })
    }

    pub fn set_specification(&mut self, unit: UnitId, spec: Specification) -> FlowsheetResult<()> {
        self.pending_unit(unit)?.specification = spec;
        Ok(())
    }

    pub fn tag_unit(&mut self, unit: UnitId, tag: impl Into<String>) -> FlowsheetResult<()> {
        self.pending_unit(unit)?.tags.push(tag.into());
        Ok(())
    }

    /// Recycle edge carried by `stream`, from its producer's outlet to its
    /// consumer's inlet. Call after both units are added.
    pub fn recycle(&self, stream: StreamId) -> FlowsheetResult<RecycleEdge> {
        let stream_name = || {
            self.streams
                .get(stream.slot())
                .map_or_else(|| stream.to_string(), |(n, _)| n.clone())
        };
        let producer = find_port(&self.units, stream, |u| &u.outs).ok_or_else(|| {
            FlowsheetError::UnknownName {
                what: "producer of stream",
                name: stream_name(),
            }
        })?;
        let consumer = find_port(&self.units, stream, |u| &u.ins).ok_or_else(|| {
            FlowsheetError::UnknownName {
                what: "consumer of stream",
                name: stream_name(),
            }
        })?;
        Ok(RecycleEdge {
            producer: producer.unit,
            outlet: producer.index,
            consumer: consumer.unit,
            inlet: consumer.index,
        })
    }

    pub fn add_system(&mut self, def: SystemDef) -> SystemId {
        let id = SystemId::from_usize(self.systems.len());
        self.systems.push(def);
        id
    }

    pub fn add_group(&mut self, name: impl Into<String>, units: &[UnitId]) -> GroupId {
        let id = GroupId::from_usize(self.groups.len());
        self.groups.push((name.into(), units.to_vec()));
        id
    }

    /// Validate the assembly and produce the flowsheet.
    pub fn build(self) -> FlowsheetResult<Flowsheet> {
        let n = self.chemicals.len();

        let stream_names = name_map(self.streams.iter().map(|(n, _)| n.as_str()), "stream")?;
        let unit_names = name_map(self.units.iter().map(|u| u.name.as_str()), "unit")?;
        let system_names = name_map(self.systems.iter().map(|s| s.name.as_str()), "system")?;
        let group_names = name_map(self.groups.iter().map(|(n, _)| n.as_str()), "group")?;

        let mut streams = Vec::with_capacity(self.streams.len());
        for (i, (name, value)) in self.streams.into_iter().enumerate() {
            let value = match value {
                Some(v) => {
                    if v.len() != n {
                        return Err(StreamError::LengthMismatch {
                            expected: n,
                            actual: v.len(),
                        }
                        .into());
                    }
                    v.validate()?;
                    v
                }
                None => Stream::new(n),
            };
            streams.push(StreamEntry {
                id: StreamId::from_usize(i),
                name,
                value,
                producer: None,
                consumer: None,
            });
        }

        let mut units = Vec::with_capacity(self.units.len());
        for (i, pending) in self.units.into_iter().enumerate() {
            let id = UnitId::from_usize(i);
            connect(&mut streams, id, &pending)?;
            units.push(Unit {
                id,
                name: pending.name,
                ins: pending.ins,
                outs: pending.outs,
                model: pending.model,
                specification: pending.specification,
                tags: pending.tags,
            });
        }

        let systems = self
            .systems
            .into_iter()
            .enumerate()
            .map(|(i, def)| def.into_system(SystemId::from_usize(i)))
            .collect();

        let groups = self
            .groups
            .into_iter()
            .enumerate()
            .map(|(i, (name, units))| UnitGroup {
                id: GroupId::from_usize(i),
                name,
                units,
            })
            .collect();

        let fs = Flowsheet {
            name: self.name,
            chemicals: self.chemicals,
            streams,
            units,
            systems,
            groups,
            stream_names,
            unit_names,
            system_names,
            group_names,
        };
        validate::validate_flowsheet(&fs)?;
        Ok(fs)
    }
}

fn find_port(
    units: &[PendingUnit],
    stream: StreamId,
    side: impl Fn(&PendingUnit) -> &Vec<StreamId>,
) -> Option<Port> {
    units.iter().enumerate().find_map(|(i, u)| {
        side(u).iter().position(|s| *s == stream).map(|index| Port {
            unit: UnitId::from_usize(i),
            index,
        })
    })
}

fn name_map<'a>(
    names: impl Iterator<Item = &'a str>,
    what: &'static str,
) -> FlowsheetResult<HashMap<String, Id>> {
    let mut map = HashMap::new();
    for (i, name) in names.enumerate() {
        if map.insert(name.to_string(), Id::from_usize(i)).is_some() {
            return Err(FlowsheetError::DuplicateName {
                what,
                name: name.to_string(),
            });
        }
    }
    Ok(map)
}

/// Record `unit` as producer/consumer of its streams, checking arity and the
/// one-producer/one-consumer rule.
fn connect(
    streams: &mut [StreamEntry],
    unit: UnitId,
    pending: &PendingUnit,
) -> FlowsheetResult<()> {
    rf_units::common::check_arity(
        pending.model.kind(),
        pending.model.arity(),
        pending.ins.len(),
        pending.outs.len(),
    )
    .map_err(|source| FlowsheetError::Arity {
        unit: pending.name.clone(),
        source,
    })?;

    for (index, sid) in pending.ins.iter().enumerate() {
        let entry = streams
            .get_mut(sid.slot())
            .ok_or(FlowsheetError::UnknownId { what: "stream", id: *sid })?;
        if entry.consumer.is_some() {
            return Err(FlowsheetError::MultipleConsumers {
                stream: entry.name.clone(),
            });
        }
        entry.consumer = Some(Port { unit, index });
    }
    for (index, sid) in pending.outs.iter().enumerate() {
        let entry = streams
            .get_mut(sid.slot())
            .ok_or(FlowsheetError::UnknownId { what: "stream", id: *sid })?;
        if entry.producer.is_some() {
            return Err(FlowsheetError::MultipleProducers {
                stream: entry.name.clone(),
            });
        }
        entry.producer = Some(Port { unit, index });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rf_units::{Mixer, Splitter};

    fn water() -> Stream {
        Stream::from_flows(vec![10.0]).unwrap()
    }

    #[test]
    fn builds_wiring() {
        let mut b = FlowsheetBuilder::new("t");
        b.add_chemical("Water", 18.015).unwrap();
        let feed = b.add_feed("feed", water());
        let out = b.add_stream("out");
        let m = b.add_unit("M1", Mixer::new(), &[feed], &[out]);
        let fs = b.build().unwrap();

        let entry = fs.stream_entry(out).unwrap();
        assert_eq!(entry.producer, Some(Port { unit: m, index: 0 }));
        assert!(entry.consumer.is_none());
        assert!(fs.stream_entry(feed).unwrap().is_feed());
        assert_eq!(fs.unit_id("M1").unwrap(), m);
        assert_eq!(fs.feeds().collect::<Vec<_>>(), vec![feed]);
    }

    #[test]
    fn rejects_duplicate_names() {
        let mut b = FlowsheetBuilder::new("t");
        b.add_stream("s");
        b.add_stream("s");
        assert!(matches!(
            b.build(),
            Err(FlowsheetError::DuplicateName { what: "stream", .. })
        ));
    }

    #[test]
    fn rejects_two_consumers() {
        let mut b = FlowsheetBuilder::new("t");
        b.add_chemical("Water", 18.015).unwrap();
        let feed = b.add_feed("feed", water());
        let a = b.add_stream("a");
        let c = b.add_stream("c");
        b.add_unit("M1", Mixer::new(), &[feed], &[a]);
        b.add_unit("M2", Mixer::new(), &[feed], &[c]);
        assert!(matches!(
            b.build(),
            Err(FlowsheetError::MultipleConsumers { .. })
        ));
    }

    #[test]
    fn rejects_wrong_arity() {
        let mut b = FlowsheetBuilder::new("t");
        b.add_chemical("Water", 18.015).unwrap();
        let feed = b.add_feed("feed", water());
        let a = b.add_stream("a");
        b.add_unit("S1", Splitter::uniform(0.5).unwrap(), &[feed], &[a]);
        assert!(matches!(b.build(), Err(FlowsheetError::Arity { .. })));
    }

    #[test]
    fn rejects_feed_of_wrong_length() {
        let mut b = FlowsheetBuilder::new("t");
        b.add_chemicals(&[("Water", 18.015), ("Ethanol", 46.07)]).unwrap();
        b.add_feed("feed", water());
        assert!(matches!(b.build(), Err(FlowsheetError::Stream(_))));
    }

    #[test]
    fn recycle_edge_from_stream() {
        let mut b = FlowsheetBuilder::new("t");
        b.add_chemical("Water", 18.015).unwrap();
        let feed = b.add_feed("feed", water());
        let mixed = b.add_stream("mixed");
        let product = b.add_stream("product");
        let recycle = b.add_stream("recycle");
        let m = b.add_unit("M1", Mixer::new(), &[feed, recycle], &[mixed]);
        let s = b.add_unit("S1", Splitter::uniform(0.5).unwrap(), &[mixed], &[product, recycle]);
        let edge = b.recycle(recycle).unwrap();
        assert_eq!(
            edge,
            RecycleEdge {
                producer: s,
                outlet: 1,
                consumer: m,
                inlet: 1
            }
        );
        assert!(b.recycle(product).is_err());
    }
}
