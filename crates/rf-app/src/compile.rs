//! Compilation of a project into an executable flowsheet.

use std::collections::HashMap;

use rf_core::{ChemicalId, StreamId, SystemId, UnitId};
use rf_flowsheet::{
    ControlVariable, ConvergenceMethod, ConvergenceOptions, Element, FailurePolicy, Flowsheet,
    FlowsheetBuilder, Measurement, SearchMethod, SearchSpec, SecantSeed, Specification, SystemDef,
};
use rf_project::schema::{
    ConvergenceDef, ElementDef, FailurePolicyDef, FeedDef, MeasurementDef, MethodDef, PhaseDef,
    Project, SearchMethodDef, SpecificationDef, SystemDef as ProjectSystemDef, UnitKindDef,
    VariableDef,
};
use rf_solver::SolveSettings;
use rf_stream::{Phase, Stream};
use rf_units::{Conversion, Flash, Heater, Mixer, PassThrough, Splitter, UnitModel};
use tracing::debug;

use crate::error::{AppError, AppResult};

/// A flowsheet ready to simulate, with the project's solve settings.
pub struct CompiledFlowsheet {
    pub flowsheet: Flowsheet,
    pub settings: SolveSettings,
}

impl CompiledFlowsheet {
    pub fn system_id(&self, id: &str) -> AppResult<SystemId> {
        self.flowsheet
            .system_id(id)
            .map_err(|_| AppError::SystemNotFound(id.to_string()))
    }

    pub fn unit_id(&self, id: &str) -> AppResult<UnitId> {
        self.flowsheet
            .unit_id(id)
            .map_err(|_| AppError::InvalidInput(format!("Unit not found: {id}")))
    }
}

/// Project ids resolved to flowsheet ids.
#[derive(Default)]
struct Ids {
    chemicals: HashMap<String, ChemicalId>,
    streams: HashMap<String, StreamId>,
    units: HashMap<String, UnitId>,
    systems: HashMap<String, SystemId>,
}

fn lookup<T: Copy>(map: &HashMap<String, T>, id: &str, what: &str) -> AppResult<T> {
    map.get(id)
        .copied()
        .ok_or_else(|| AppError::Compile(format!("unknown {what} '{id}'")))
}

impl Ids {
    fn chemical(&self, id: &str) -> AppResult<ChemicalId> {
        lookup(&self.chemicals, id, "chemical")
    }

    fn stream(&self, id: &str) -> AppResult<StreamId> {
        lookup(&self.streams, id, "stream")
    }

    fn streams(&self, ids: &[String]) -> AppResult<Vec<StreamId>> {
        ids.iter().map(|s| self.stream(s)).collect()
    }

    fn unit(&self, id: &str) -> AppResult<UnitId> {
        lookup(&self.units, id, "unit")
    }

    fn system(&self, id: &str) -> AppResult<SystemId> {
        lookup(&self.systems, id, "system")
    }

    /// Dense per-chemical vector from sparse `(chemical, value)` pairs.
    fn per_chemical(&self, pairs: &[(String, f64)]) -> AppResult<Vec<f64>> {
        let mut values = vec![0.0; self.chemicals.len()];
        for (chem, v) in pairs {
            values[self.chemical(chem)?.slot()] += v;
        }
        Ok(values)
    }
}

/// Validate `project` and assemble its flowsheet.
pub fn compile_project(project: &Project) -> AppResult<CompiledFlowsheet> {
    rf_project::validate_project(project).map_err(|e| AppError::Validation(e.to_string()))?;

    let mut b = FlowsheetBuilder::new(project.name.clone());
    let mut ids = Ids::default();

    for chem in &project.chemicals {
        let id = b.add_chemical(chem.id.clone(), chem.molar_mass)?;
        ids.chemicals.insert(chem.id.clone(), id);
    }

    let mut priced = Vec::new();
    for def in &project.streams {
        let id = match &def.feed {
            Some(feed) => {
                let value = feed_stream(feed, def.price, &ids)
                    .map_err(|e| AppError::Compile(format!("feed '{}': {e}", def.id)))?;
                b.add_feed(def.id.clone(), value)
            }
            None => {
                let id = b.add_stream(def.id.clone());
                if let Some(price) = def.price {
                    priced.push((id, price));
                }
                id
            }
        };
        ids.streams.insert(def.id.clone(), id);
    }

    for def in &project.units {
        let ins = ids.streams(&def.ins)?;
        let outs = ids.streams(&def.outs)?;
        let model = unit_model(&def.kind, &ids)
            .map_err(|e| AppError::Compile(format!("unit '{}': {e}", def.id)))?;
        let id = b.add_boxed_unit(def.id.clone(), model, &ins, &outs);
        for tag in &def.tags {
            b.tag_unit(id, tag.clone())?;
        }
        ids.units.insert(def.id.clone(), id);
    }

    // Systems may refer to systems declared later; the builder numbers them in
    // declaration order.
    for (i, def) in project.systems.iter().enumerate() {
        ids.systems.insert(def.id.clone(), SystemId::from_usize(i));
    }
    for def in &project.systems {
        let system = system_def(def, &b, &ids)?;
        b.add_system(system);
    }

    for def in &project.units {
        if let Some(spec) = &def.specification {
            b.set_specification(ids.unit(&def.id)?, specification(spec, &ids)?)?;
        }
    }

    for group in &project.groups {
        let units = group
            .units
            .iter()
            .map(|u| ids.unit(u))
            .collect::<AppResult<Vec<_>>>()?;
        b.add_group(group.id.clone(), &units);
    }

    let mut flowsheet = b.build()?;
    for (id, price) in priced {
        flowsheet.stream_mut(id)?.set_price(Some(price));
    }

    let settings = SolveSettings {
        convergence: convergence_options(&project.settings.convergence),
        root_failure: failure_policy(project.settings.root_failure),
        max_depth: project.settings.max_depth,
    };
    debug!(
        project = %project.name,
        streams = flowsheet.streams().len(),
        units = flowsheet.units().len(),
        systems = flowsheet.systems().len(),
        "compiled project"
    );
    Ok(CompiledFlowsheet {
        flowsheet,
        settings,
    })
}

fn phase(def: PhaseDef) -> Phase {
    match def {
        PhaseDef::Liquid => Phase::Liquid,
        PhaseDef::Vapor => Phase::Vapor,
        PhaseDef::Solid => Phase::Solid,
        PhaseDef::Mixed => Phase::Mixed,
    }
}

fn feed_stream(feed: &FeedDef, price: Option<f64>, ids: &Ids) -> AppResult<Stream> {
    let flows = ids.per_chemical(&feed.flows)?;
    let stream = Stream::from_flows(flows)
        .and_then(|s| s.with_temperature_k(feed.temperature_k))
        .and_then(|s| s.with_pressure_pa(feed.pressure_pa))
        .map_err(|e| AppError::Compile(e.to_string()))?
        .with_phase(phase(feed.phase));
    Ok(match price {
        Some(p) => stream.with_price(p),
        None => stream,
    })
}

fn unit_model(kind: &UnitKindDef, ids: &Ids) -> AppResult<Box<dyn UnitModel>> {
    let unit_err = |e: rf_units::UnitError| AppError::Compile(e.to_string());
    let model: Box<dyn UnitModel> = match kind {
        UnitKindDef::Mixer => Box::new(Mixer::new()),
        UnitKindDef::Splitter { split } => Box::new(Splitter::uniform(*split).map_err(unit_err)?),
        UnitKindDef::ComponentSplitter { splits } => Box::new(
            Splitter::per_chemical(ids.per_chemical(splits)?).map_err(unit_err)?,
        ),
        UnitKindDef::Heater {
            temperature_k,
            phase: heater_phase,
        } => {
            let heater = Heater::new(*temperature_k).map_err(unit_err)?;
            Box::new(match heater_phase {
                Some(p) => heater.with_phase(phase(*p)),
                None => heater,
            })
        }
        UnitKindDef::Conversion {
            reactant,
            stoichiometry,
            conversion,
        } => {
            let stoichiometry = stoichiometry
                .iter()
                .map(|(chem, nu)| Ok((ids.chemical(chem)?, *nu)))
                .collect::<AppResult<Vec<_>>>()?;
            Box::new(
                Conversion::new(ids.chemical(reactant)?, stoichiometry, *conversion)
                    .map_err(unit_err)?,
            )
        }
        UnitKindDef::Flash {
            volatility,
            vapor_fraction,
        } => Box::new(
            Flash::new(ids.per_chemical(volatility)?, *vapor_fraction).map_err(unit_err)?,
        ),
        UnitKindDef::PassThrough => Box::new(PassThrough),
    };
    Ok(model)
}

fn element(def: &ElementDef, ids: &Ids) -> AppResult<Element> {
    Ok(match def {
        ElementDef::Unit(id) => Element::Unit(ids.unit(id)?),
        ElementDef::System(id) => Element::System(ids.system(id)?),
    })
}

fn system_def(def: &ProjectSystemDef, b: &FlowsheetBuilder, ids: &Ids) -> AppResult<SystemDef> {
    let elements = |defs: &[ElementDef]| {
        defs.iter()
            .map(|e| element(e, ids))
            .collect::<AppResult<Vec<_>>>()
    };

    let mut system = SystemDef::new(def.id.clone())
        .with_path(elements(&def.path)?)
        .with_facilities(elements(&def.facilities)?);
    for stream in &def.recycles {
        system = system.with_recycle(b.recycle(ids.stream(stream)?)?);
    }
    if let Some(stream) = &def.facility_recycle {
        system = system.with_facility_recycle(b.recycle(ids.stream(stream)?)?);
    }
    if let Some(conv) = &def.convergence {
        system = system.with_convergence(convergence_options(conv));
    }
    Ok(system)
}

fn convergence_options(def: &ConvergenceDef) -> ConvergenceOptions {
    let method = match def.method {
        MethodDef::FixedPoint => ConvergenceMethod::FixedPoint,
        MethodDef::Aitken => ConvergenceMethod::Aitken,
        MethodDef::Wegstein => ConvergenceMethod::Wegstein,
    };
    ConvergenceOptions::default()
        .with_max_iterations(def.max_iterations)
        .with_molar_tolerance(def.molar_tolerance)
        .with_relative_tolerance(def.relative_tolerance)
        .with_temperature_tolerance(def.temperature_tolerance)
        .with_method(method)
        .with_acceleration_delay(def.acceleration_delay)
}

fn failure_policy(def: FailurePolicyDef) -> FailurePolicy {
    match def {
        FailurePolicyDef::Fallback => FailurePolicy::Fallback,
        FailurePolicyDef::Escalate => FailurePolicy::Escalate,
    }
}

fn variable(def: &VariableDef, ids: &Ids) -> AppResult<ControlVariable> {
    Ok(match def {
        VariableDef::UnitParameter { unit, parameter } => ControlVariable::UnitParameter {
            unit: ids.unit(unit)?,
            parameter: parameter.clone(),
        },
        VariableDef::FeedFlow { stream, chemical } => ControlVariable::FeedFlow {
            stream: ids.stream(stream)?,
            chemical: chemical.as_deref().map(|c| ids.chemical(c)).transpose()?,
        },
    })
}

fn measurement(def: &MeasurementDef, ids: &Ids) -> AppResult<Measurement> {
    Ok(match def {
        MeasurementDef::TotalFlow { stream } => Measurement::TotalFlow {
            stream: ids.stream(stream)?,
        },
        MeasurementDef::ChemicalFlow { stream, chemical } => Measurement::ChemicalFlow {
            stream: ids.stream(stream)?,
            chemical: ids.chemical(chemical)?,
        },
        MeasurementDef::MassFlow { stream } => Measurement::MassFlow {
            stream: ids.stream(stream)?,
        },
        MeasurementDef::MoleFraction { stream, chemical } => Measurement::MoleFraction {
            stream: ids.stream(stream)?,
            chemical: ids.chemical(chemical)?,
        },
        MeasurementDef::MassFraction { stream, chemical } => Measurement::MassFraction {
            stream: ids.stream(stream)?,
            chemical: ids.chemical(chemical)?,
        },
        MeasurementDef::Temperature { stream } => Measurement::Temperature {
            stream: ids.stream(stream)?,
        },
        MeasurementDef::MassRatio {
            numerator,
            denominator,
            chemical,
        } => Measurement::MassRatio {
            numerator: ids.stream(numerator)?,
            denominator: ids.stream(denominator)?,
            chemical: chemical.as_deref().map(|c| ids.chemical(c)).transpose()?,
        },
    })
}

fn specification(def: &SpecificationDef, ids: &Ids) -> AppResult<Specification> {
    Ok(match def {
        SpecificationDef::Fixed { variable: v, value } => Specification::Fixed {
            variable: variable(v, ids)?,
            value: *value,
        },
        SpecificationDef::Proportional {
            variable: v,
            measurement: m,
            factor,
        } => Specification::Proportional {
            variable: variable(v, ids)?,
            measurement: measurement(m, ids)?,
            factor: *factor,
        },
        SpecificationDef::Search(search) => {
            let method = match &search.method {
                SearchMethodDef::Secant { x0, x1 } => SearchMethod::Secant { x0: *x0, x1: *x1 },
                SearchMethodDef::SeededSecant { seed, step } => SearchMethod::SeededSecant {
                    seed: match seed {
                        Some(m) => SecantSeed::Measured(measurement(m, ids)?),
                        None => SecantSeed::Current,
                    },
                    step: *step,
                },
                SearchMethodDef::Bracketed {
                    lower,
                    upper,
                    check_bounds,
                } => SearchMethod::Bracketed {
                    lower: *lower,
                    upper: *upper,
                    check_bounds: *check_bounds,
                },
            };
            let mut spec = SearchSpec::new(
                variable(&search.variable, ids)?,
                measurement(&search.measurement, ids)?,
                search.target,
                method,
            )
            .with_tolerances(search.xtol, search.ytol)
            .with_max_iterations(search.max_iterations);
            if let Some(sub) = &search.subsystem {
                spec = spec.with_subsystem(ids.system(sub)?);
            }
            if let Some(policy) = search.on_failure {
                spec = spec.with_failure_policy(failure_policy(policy));
            }
            if !search.enabled {
                spec = spec.disabled(search.disabled_value);
            }
            Specification::Search(spec)
        }
    })
}
