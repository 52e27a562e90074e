//! Assembly validation run by `FlowsheetBuilder::build`.

use std::collections::{HashMap, HashSet};

use petgraph::algo::toposort;
use petgraph::graph::DiGraph;

use rf_core::{ChemicalId, Real, StreamId, UnitId};

use crate::error::{FlowsheetError, FlowsheetResult};
use crate::flowsheet::{Flowsheet, Unit};
use crate::ordering;
use crate::spec::{ControlVariable, Measurement, SearchMethod, SecantSeed, Specification};
use crate::system::{Element, RecycleEdge, System};

pub(crate) fn validate_flowsheet(fs: &Flowsheet) -> FlowsheetResult<()> {
    validate_elements(fs)?;
    validate_nesting(fs)?;
    for sys in fs.systems() {
        validate_system(fs, sys)?;
    }
    for unit in fs.units() {
        validate_specification(fs, unit)?;
    }
    for group in fs.groups() {
        for u in &group.units {
            fs.unit(*u)?;
        }
    }
    ordering::check_back_edges(fs)
}

fn validate_elements(fs: &Flowsheet) -> FlowsheetResult<()> {
    for sys in fs.systems() {
        for element in sys.elements() {
            match *element {
                Element::Unit(u) => {
                    fs.unit(u)?;
                }
                Element::System(s) => {
                    fs.system(s)?;
                }
            }
        }
    }
    Ok(())
}

fn validate_nesting(fs: &Flowsheet) -> FlowsheetResult<()> {
    let mut graph = DiGraph::<usize, ()>::new();
    let nodes: Vec<_> = (0..fs.systems().len()).map(|i| graph.add_node(i)).collect();
    for sys in fs.systems() {
        for element in sys.elements() {
            if let Element::System(child) = element {
                graph.add_edge(nodes[sys.id.slot()], nodes[child.slot()], ());
            }
        }
    }
    toposort(&graph, None).map(|_| ()).map_err(|cycle| {
        FlowsheetError::NestingCycle {
            system: fs.systems()[graph[cycle.node_id()]].name.clone(),
        }
    })
}

fn validate_system(fs: &Flowsheet, sys: &System) -> FlowsheetResult<()> {
    if let Some(options) = &sys.convergence {
        if let Some(reason) = options.check() {
            return Err(FlowsheetError::InvalidOptions {
                system: sys.name.clone(),
                reason,
            });
        }
    }

    let full = ordering::flatten(fs, sys.id)?;
    let mut seen = HashSet::new();
    for u in &full {
        if !seen.insert(*u) {
            return Err(FlowsheetError::DuplicateUnitInPath {
                system: sys.name.clone(),
                unit: fs.unit_name(*u).to_string(),
            });
        }
    }

    let path = ordering::flatten_path(fs, sys.id)?;
    for edge in &sys.recycles {
        check_recycle(fs, sys, edge, &path)?;
    }
    if let Some(edge) = &sys.facility_recycle {
        check_recycle(fs, sys, edge, &full)?;
    }
    Ok(())
}

fn check_recycle(
    fs: &Flowsheet,
    sys: &System,
    edge: &RecycleEdge,
    order: &[UnitId],
) -> FlowsheetResult<()> {
    let invalid = |reason: String| FlowsheetError::InvalidRecycle {
        system: sys.name.clone(),
        reason,
    };

    let producer = fs.unit(edge.producer)?;
    let consumer = fs.unit(edge.consumer)?;
    let out = producer.outs.get(edge.outlet).ok_or_else(|| {
        invalid(format!("'{}' has no outlet {}", producer.name, edge.outlet))
    })?;
    let inp = consumer.ins.get(edge.inlet).ok_or_else(|| {
        invalid(format!("'{}' has no inlet {}", consumer.name, edge.inlet))
    })?;
    if out != inp {
        return Err(invalid(format!(
            "outlet {} of '{}' and inlet {} of '{}' are different streams",
            edge.outlet, producer.name, edge.inlet, consumer.name
        )));
    }

    let position: HashMap<UnitId, usize> =
        order.iter().enumerate().map(|(i, u)| (*u, i)).collect();
    let (Some(pp), Some(pc)) = (position.get(&edge.producer), position.get(&edge.consumer))
    else {
        return Err(invalid(format!(
            "stream '{}' connects units outside the system",
            fs.stream_name(*out)
        )));
    };
    if pc > pp {
        return Err(invalid(format!(
            "consumer '{}' runs after producer '{}'",
            consumer.name, producer.name
        )));
    }
    Ok(())
}

fn validate_specification(fs: &Flowsheet, unit: &Unit) -> FlowsheetResult<()> {
    let invalid = |reason: String| FlowsheetError::InvalidSpecification {
        unit: unit.name.clone(),
        reason,
    };
    let finite = |v: Real, what: &str| {
        if v.is_finite() {
            Ok(())
        } else {
            Err(invalid(format!("{what} must be finite")))
        }
    };

    if let Some(variable) = unit.specification.variable() {
        check_variable(fs, variable).map_err(invalid)?;
    }
    if let Some(measurement) = unit.specification.measurement() {
        check_measurement(fs, measurement).map_err(invalid)?;
    }

    match &unit.specification {
        Specification::None => {}
        Specification::Fixed { value, .. } => finite(*value, "value")?,
        Specification::Proportional { factor, .. } => finite(*factor, "factor")?,
        Specification::Search(search) => {
            finite(search.target, "target")?;
            let tols_ok = search.xtol.is_finite()
                && search.ytol.is_finite()
                && search.xtol >= 0.0
                && search.ytol >= 0.0;
            if !tols_ok {
                return Err(invalid("tolerances must be finite and non-negative".into()));
            }
            if search.max_iterations == 0 {
                return Err(invalid("max_iterations must be at least 1".into()));
            }
            if let Some(v) = search.disabled_value {
                finite(v, "disabled value")?;
            }
            match search.method {
                SearchMethod::Secant { x0, x1 } => {
                    finite(x0, "x0")?;
                    finite(x1, "x1")?;
                    if x0 == x1 {
                        return Err(invalid("secant starting points must differ".into()));
                    }
                }
                SearchMethod::SeededSecant { seed, step } => {
                    finite(step, "step")?;
                    if step == 0.0 {
                        return Err(invalid("secant step must be non-zero".into()));
                    }
                    if let SecantSeed::Measured(m) = seed {
                        check_measurement(fs, &m).map_err(invalid)?;
                    }
                }
                SearchMethod::Bracketed { lower, upper, .. } => {
                    finite(lower, "lower bound")?;
                    finite(upper, "upper bound")?;
                    if lower >= upper {
                        return Err(invalid("lower bound must be below upper bound".into()));
                    }
                }
            }
            if let Some(subsystem) = search.subsystem {
                let members = ordering::flatten(fs, subsystem)?;
                if members.contains(&unit.id) {
                    return Err(invalid(format!(
                        "subsystem '{}' contains the unit itself",
                        fs.system_name(subsystem)
                    )));
                }
            }
        }
    }
    Ok(())
}

fn check_variable(fs: &Flowsheet, variable: &ControlVariable) -> Result<(), String> {
    match variable {
        ControlVariable::UnitParameter { unit, parameter } => {
            let target = fs.unit(*unit).map_err(|e| e.to_string())?;
            if !target.model.has_parameter(parameter) {
                return Err(format!(
                    "{} '{}' has no parameter '{}'",
                    target.kind(),
                    target.name,
                    parameter
                ));
            }
        }
        ControlVariable::FeedFlow { stream, chemical } => {
            let entry = fs.stream_entry(*stream).map_err(|e| e.to_string())?;
            if !entry.is_feed() {
                return Err(format!("stream '{}' is not a feed", entry.name));
            }
            if let Some(c) = chemical {
                check_chemical(fs, *c)?;
            }
        }
    }
    Ok(())
}

fn check_measurement(fs: &Flowsheet, measurement: &Measurement) -> Result<(), String> {
    for s in measurement.streams() {
        check_stream(fs, s)?;
    }
    if let Some(c) = measurement.chemical() {
        check_chemical(fs, c)?;
    }
    Ok(())
}

fn check_stream(fs: &Flowsheet, stream: StreamId) -> Result<(), String> {
    fs.stream(stream).map(|_| ()).map_err(|e| e.to_string())
}

fn check_chemical(fs: &Flowsheet, chemical: ChemicalId) -> Result<(), String> {
    if chemical.slot() < fs.chemicals().len() {
        Ok(())
    } else {
        Err(format!("chemical index {} outside registry", chemical.slot()))
    }
}
