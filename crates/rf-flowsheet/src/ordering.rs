//! Path-order analysis.
//!
//! Systems run their elements in declared order. A stream whose consumer runs
//! no later than its producer is a back edge: its consumer sees last pass's
//! value. Back edges are legitimate only inside a looping system, which
//! re-runs the path until the value settles.

use std::collections::{HashMap, HashSet};

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};

use rf_core::{StreamId, SystemId, UnitId};

use crate::error::{FlowsheetError, FlowsheetResult};
use crate::flowsheet::Flowsheet;
use crate::system::Element;

/// A stream that runs against path order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackEdge {
    pub stream: StreamId,
    pub producer: UnitId,
    pub consumer: UnitId,
}

/// Flattened evaluation order of a system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathOrder {
    pub units: Vec<UnitId>,
    pub back_edges: Vec<BackEdge>,
}

/// Units of a system's main path in evaluation order, nested systems expanded.
pub fn flatten_path(fs: &Flowsheet, system: SystemId) -> FlowsheetResult<Vec<UnitId>> {
    let sys = fs.system(system)?;
    let mut out = Vec::new();
    let mut stack = vec![system];
    flatten_into(fs, &sys.path, &mut out, &mut stack)?;
    Ok(out)
}

/// Units of a system including its facilities, in evaluation order.
pub fn flatten(fs: &Flowsheet, system: SystemId) -> FlowsheetResult<Vec<UnitId>> {
    let mut out = Vec::new();
    let mut stack = Vec::new();
    flatten_into(fs, &[Element::System(system)], &mut out, &mut stack)?;
    Ok(out)
}

fn flatten_into(
    fs: &Flowsheet,
    elements: &[Element],
    out: &mut Vec<UnitId>,
    stack: &mut Vec<SystemId>,
) -> FlowsheetResult<()> {
    for element in elements {
        match *element {
            Element::Unit(u) => {
                fs.unit(u)?;
                out.push(u);
            }
            Element::System(s) => {
                let sys = fs.system(s)?;
                if stack.contains(&s) {
                    return Err(FlowsheetError::NestingCycle {
                        system: sys.name.clone(),
                    });
                }
                stack.push(s);
                flatten_into(fs, &sys.path, out, stack)?;
                flatten_into(fs, &sys.facilities, out, stack)?;
                stack.pop();
            }
        }
    }
    Ok(())
}

/// Streams flowing between units of `units`, as a directed graph.
pub fn unit_graph(fs: &Flowsheet, units: &[UnitId]) -> DiGraph<UnitId, StreamId> {
    let mut graph = DiGraph::new();
    let nodes: HashMap<UnitId, NodeIndex> =
        units.iter().map(|u| (*u, graph.add_node(*u))).collect();
    for entry in fs.streams() {
        if let (Some(p), Some(c)) = (entry.producer, entry.consumer) {
            if let (Some(&a), Some(&b)) = (nodes.get(&p.unit), nodes.get(&c.unit)) {
                graph.add_edge(a, b, entry.id);
            }
        }
    }
    graph
}

/// Flattened order of `system` and the streams running against it.
pub fn analyze(fs: &Flowsheet, system: SystemId) -> FlowsheetResult<PathOrder> {
    let units = flatten(fs, system)?;
    let position: HashMap<UnitId, usize> =
        units.iter().enumerate().map(|(i, u)| (*u, i)).collect();
    let mut back_edges = Vec::new();
    for entry in fs.streams() {
        let (Some(p), Some(c)) = (entry.producer, entry.consumer) else {
            continue;
        };
        if let (Some(pp), Some(pc)) = (position.get(&p.unit), position.get(&c.unit)) {
            if pc <= pp {
                back_edges.push(BackEdge {
                    stream: entry.id,
                    producer: p.unit,
                    consumer: c.unit,
                });
            }
        }
    }
    Ok(PathOrder { units, back_edges })
}

/// An order in which every unit runs after its upstream units.
///
/// Fails with `CyclicPath` when the units contain a loop; such paths need a
/// recycle edge instead.
pub fn topological_order(fs: &Flowsheet, units: &[UnitId]) -> FlowsheetResult<Vec<UnitId>> {
    let graph = unit_graph(fs, units);
    toposort(&graph, None)
        .map(|order| order.into_iter().map(|n| graph[n]).collect())
        .map_err(|cycle| FlowsheetError::CyclicPath {
            unit: fs.unit_name(graph[cycle.node_id()]).to_string(),
        })
}

/// Every back edge of every system must lie inside some looping system.
pub fn check_back_edges(fs: &Flowsheet) -> FlowsheetResult<()> {
    let mut loops: Vec<HashSet<UnitId>> = Vec::new();
    for sys in fs.systems().iter().filter(|s| s.is_looping()) {
        loops.push(flatten(fs, sys.id)?.into_iter().collect());
    }

    for sys in fs.systems() {
        for edge in analyze(fs, sys.id)?.back_edges {
            let closed = loops
                .iter()
                .any(|l| l.contains(&edge.producer) && l.contains(&edge.consumer));
            if !closed {
                return Err(FlowsheetError::UnclosedBackEdge {
                    stream: fs.stream_name(edge.stream).to_string(),
                    producer: fs.unit_name(edge.producer).to_string(),
                    consumer: fs.unit_name(edge.consumer).to_string(),
                });
            }
        }
    }
    Ok(())
}
