//! Accounting views over a system for cost and revenue consumers.
//!
//! An `Accounting` view starts from every unit a system runs (nested systems
//! and facilities included) plus the streams crossing its boundary, and can
//! then drop units or whole subsystems, e.g. a combined heat and power island
//! whose own feeds and products are accounted separately.
//!
//! Dropping units also drops the boundary feeds they consume and the boundary
//! products they make. Streams between a kept and a dropped unit stay internal.

use std::collections::BTreeSet;

use rf_core::{Real, StreamId, SystemId, UnitId};

use crate::error::FlowsheetResult;
use crate::flowsheet::Flowsheet;
use crate::ordering;

/// All units run by `system`, nested systems and facilities included.
pub fn system_units(fs: &Flowsheet, system: SystemId) -> FlowsheetResult<Vec<UnitId>> {
    ordering::flatten(fs, system)
}

/// Streams entering the system: consumed inside, not produced inside.
pub fn system_feeds(fs: &Flowsheet, system: SystemId) -> FlowsheetResult<Vec<StreamId>> {
    let units: BTreeSet<UnitId> = system_units(fs, system)?.into_iter().collect();
    Ok(boundary(fs, &units).0)
}

/// Streams leaving the system: produced inside, not consumed inside.
pub fn system_products(fs: &Flowsheet, system: SystemId) -> FlowsheetResult<Vec<StreamId>> {
    let units: BTreeSet<UnitId> = system_units(fs, system)?.into_iter().collect();
    Ok(boundary(fs, &units).1)
}

fn boundary(fs: &Flowsheet, units: &BTreeSet<UnitId>) -> (Vec<StreamId>, Vec<StreamId>) {
    let inside = |unit: Option<UnitId>| unit.is_some_and(|u| units.contains(&u));
    let mut feeds = Vec::new();
    let mut products = Vec::new();
    for entry in fs.streams() {
        let produced = inside(entry.producer.map(|p| p.unit));
        let consumed = inside(entry.consumer.map(|c| c.unit));
        if consumed && !produced {
            feeds.push(entry.id);
        }
        if produced && !consumed {
            products.push(entry.id);
        }
    }
    (feeds, products)
}

/// Units, feeds and products counted for one system.
#[derive(Debug, Clone)]
pub struct Accounting<'a> {
    fs: &'a Flowsheet,
    units: BTreeSet<UnitId>,
    feeds: Vec<StreamId>,
    products: Vec<StreamId>,
}

impl<'a> Accounting<'a> {
    pub fn new(fs: &'a Flowsheet, system: SystemId) -> FlowsheetResult<Self> {
        let units: BTreeSet<UnitId> = system_units(fs, system)?.into_iter().collect();
        let (feeds, products) = boundary(fs, &units);
        Ok(Self {
            fs,
            units,
            feeds,
            products,
        })
    }

    /// Drop units together with their feeds and products.
    pub fn excluding_units(mut self, units: &[UnitId]) -> Self {
        self.remove(&units.iter().copied().collect());
        self
    }

    /// Drop every unit of `other` together with its feeds and products.
    pub fn excluding_system(mut self, other: SystemId) -> FlowsheetResult<Self> {
        let other_units: BTreeSet<UnitId> = system_units(self.fs, other)?.into_iter().collect();
        self.remove(&other_units);
        Ok(self)
    }

    /// Drop units carrying `tag` together with their feeds and products.
    pub fn excluding_tag(mut self, tag: &str) -> Self {
        let tagged: BTreeSet<UnitId> = self.fs.units_with_tag(tag).collect();
        self.remove(&tagged);
        self
    }

    fn remove(&mut self, removed: &BTreeSet<UnitId>) {
        let (feeds, products) = boundary(self.fs, removed);
        self.units.retain(|u| !removed.contains(u));
        self.feeds.retain(|s| !feeds.contains(s));
        self.products.retain(|s| !products.contains(s));
    }

    pub fn units(&self) -> impl Iterator<Item = UnitId> + '_ {
        self.units.iter().copied()
    }

    pub fn feeds(&self) -> &[StreamId] {
        &self.feeds
    }

    pub fn products(&self) -> &[StreamId] {
        &self.products
    }

    /// Purchase cost of priced feeds [USD/h].
    pub fn feed_cost_rate(&self) -> Real {
        self.cash_flow(&self.feeds)
    }

    /// Sales revenue of priced products [USD/h].
    pub fn product_revenue_rate(&self) -> Real {
        self.cash_flow(&self.products)
    }

    fn cash_flow(&self, streams: &[StreamId]) -> Real {
        let chems = self.fs.chemicals();
        streams
            .iter()
            .filter_map(|s| self.fs.stream(*s).ok())
            .map(|s| s.cost_rate(chems))
            .sum()
    }
}
