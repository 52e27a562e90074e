//! Process specifications: per-unit rules applied before the unit runs.
//!
//! Specifications reference flowsheet entities explicitly (ids, not closures),
//! so they can be validated at assembly and loaded from project files. The
//! solver executes them; this module only defines what they read and write.

use rf_core::{ChemicalId, Real, StreamId, SystemId, UnitId};
use rf_stream::StreamError;

use crate::error::{FlowsheetError, FlowsheetResult};
use crate::flowsheet::Flowsheet;

/// A scalar a specification can set.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlVariable {
    /// A named parameter of a unit model (e.g. a splitter's `split`).
    UnitParameter { unit: UnitId, parameter: String },
    /// A feed stream's flow: one chemical, or the total at fixed composition.
    FeedFlow {
        stream: StreamId,
        chemical: Option<ChemicalId>,
    },
}

impl ControlVariable {
    pub fn get(&self, fs: &Flowsheet) -> FlowsheetResult<Real> {
        match self {
            ControlVariable::UnitParameter { unit, parameter } => fs.parameter(*unit, parameter),
            ControlVariable::FeedFlow { stream, chemical } => {
                let s = fs.stream(*stream)?;
                Ok(match chemical {
                    Some(c) => s.flow(*c),
                    None => s.total_flow(),
                })
            }
        }
    }

    pub fn set(&self, fs: &mut Flowsheet, value: Real) -> FlowsheetResult<()> {
        match self {
            ControlVariable::UnitParameter { unit, parameter } => {
                fs.set_parameter(*unit, parameter, value)
            }
            ControlVariable::FeedFlow { stream, chemical } => {
                let s = fs.stream_mut(*stream)?;
                match chemical {
                    Some(c) => s.set_flow(*c, value)?,
                    None => {
                        let total = s.total_flow();
                        if total > 0.0 {
                            s.scale(value / total)?;
                        } else if value != 0.0 {
                            return Err(FlowsheetError::Stream(StreamError::InvalidArg {
                                what: "cannot set the total flow of an empty feed",
                            }));
                        }
                    }
                }
                Ok(())
            }
        }
    }

    pub fn describe(&self, fs: &Flowsheet) -> String {
        match self {
            ControlVariable::UnitParameter { unit, parameter } => {
                format!("{}.{}", fs.unit_name(*unit), parameter)
            }
            ControlVariable::FeedFlow { stream, chemical } => match chemical {
                Some(c) => format!(
                    "{}[{}]",
                    fs.stream_name(*stream),
                    fs.chemicals().name(*c)
                ),
                None => format!("{}.total_flow", fs.stream_name(*stream)),
            },
        }
    }
}

/// A scalar read from the flowsheet after a simulation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Measurement {
    /// Total molar flow [kmol/h].
    TotalFlow { stream: StreamId },
    /// Molar flow of one chemical [kmol/h].
    ChemicalFlow {
        stream: StreamId,
        chemical: ChemicalId,
    },
    /// Total mass flow [kg/h].
    MassFlow { stream: StreamId },
    MoleFraction {
        stream: StreamId,
        chemical: ChemicalId,
    },
    MassFraction {
        stream: StreamId,
        chemical: ChemicalId,
    },
    /// Temperature [K].
    Temperature { stream: StreamId },
    /// Mass flow of `numerator` (one chemical, or total) over total mass flow of
    /// `denominator`. Zero when the denominator is empty.
    MassRatio {
        numerator: StreamId,
        denominator: StreamId,
        chemical: Option<ChemicalId>,
    },
}

impl Measurement {
    pub fn measure(&self, fs: &Flowsheet) -> FlowsheetResult<Real> {
        let chems = fs.chemicals();
        Ok(match *self {
            Measurement::TotalFlow { stream } => fs.stream(stream)?.total_flow(),
            Measurement::ChemicalFlow { stream, chemical } => fs.stream(stream)?.flow(chemical),
            Measurement::MassFlow { stream } => fs.stream(stream)?.mass_flow(chems),
            Measurement::MoleFraction { stream, chemical } => {
                fs.stream(stream)?.mole_fraction(chemical)
            }
            Measurement::MassFraction { stream, chemical } => {
                fs.stream(stream)?.mass_fraction(chems, chemical)
            }
            Measurement::Temperature { stream } => fs.stream(stream)?.temperature_k(),
            Measurement::MassRatio {
                numerator,
                denominator,
                chemical,
            } => {
                let num = fs.stream(numerator)?;
                let num = match chemical {
                    Some(c) => num.chemical_mass_flow(chems, c),
                    None => num.mass_flow(chems),
                };
                let den = fs.stream(denominator)?.mass_flow(chems);
                if den > 0.0 { num / den } else { 0.0 }
            }
        })
    }

    /// Streams this measurement reads.
    pub fn streams(&self) -> Vec<StreamId> {
        match *self {
            Measurement::TotalFlow { stream }
            | Measurement::ChemicalFlow { stream, .. }
            | Measurement::MassFlow { stream }
            | Measurement::MoleFraction { stream, .. }
            | Measurement::MassFraction { stream, .. }
            | Measurement::Temperature { stream } => vec![stream],
            Measurement::MassRatio {
                numerator,
                denominator,
                ..
            } => vec![numerator, denominator],
        }
    }

    /// Chemical this measurement reads, if any.
    pub fn chemical(&self) -> Option<ChemicalId> {
        match *self {
            Measurement::ChemicalFlow { chemical, .. }
            | Measurement::MoleFraction { chemical, .. }
            | Measurement::MassFraction { chemical, .. } => Some(chemical),
            Measurement::MassRatio { chemical, .. } => chemical,
            _ => None,
        }
    }
}

/// What to do when a search exhausts its iterations without a root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Keep the last attempted value, record the failure and carry on.
    #[default]
    Fallback,
    /// Abort the simulation with a root-finding error.
    Escalate,
}

/// Where a seeded secant search takes its first point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SecantSeed {
    /// The variable's current value, so a search resumes from its last solution.
    Current,
    /// A value measured just before the search, e.g. an inlet mole fraction.
    Measured(Measurement),
}

/// Scalar root-finding method.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SearchMethod {
    /// Unbracketed secant from two starting points, Aitken-accelerated.
    Secant { x0: Real, x1: Real },
    /// Secant from `x0` read at search time and `x1 = x0 + step`.
    SeededSecant { seed: SecantSeed, step: Real },
    /// Bracketed inverse-quadratic interpolation with bisection safeguard.
    ///
    /// With `check_bounds` false, a bracket whose ends share a sign falls back
    /// to a secant search started from the endpoints.
    Bracketed {
        lower: Real,
        upper: Real,
        check_bounds: bool,
    },
}

/// Drive `variable` until `measurement` equals `target`.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchSpec {
    pub variable: ControlVariable,
    pub measurement: Measurement,
    pub target: Real,
    /// Converged for every trial value; `None` runs only the owning unit.
    pub subsystem: Option<SystemId>,
    pub method: SearchMethod,
    pub xtol: Real,
    pub ytol: Real,
    pub max_iterations: usize,
    pub enabled: bool,
    /// Value applied instead of searching while disabled.
    pub disabled_value: Option<Real>,
    /// Overrides the solve-wide failure policy.
    pub on_failure: Option<FailurePolicy>,
}

impl SearchSpec {
    pub fn new(
        variable: ControlVariable,
        measurement: Measurement,
        target: Real,
        method: SearchMethod,
    ) -> Self {
        Self {
            variable,
            measurement,
            target,
            subsystem: None,
            method,
            xtol: 1e-6,
            ytol: 1e-6,
            max_iterations: 50,
            enabled: true,
            disabled_value: None,
            on_failure: None,
        }
    }

    pub fn with_subsystem(mut self, system: SystemId) -> Self {
        self.subsystem = Some(system);
        self
    }

    pub fn with_tolerances(mut self, xtol: Real, ytol: Real) -> Self {
        self.xtol = xtol;
        self.ytol = ytol;
        self
    }

    pub fn with_max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n;
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.on_failure = Some(policy);
        self
    }

    pub fn disabled(mut self, value: Option<Real>) -> Self {
        self.enabled = false;
        self.disabled_value = value;
        self
    }
}

/// Per-unit specification.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Specification {
    #[default]
    None,
    /// Set a variable to a constant before every run.
    Fixed { variable: ControlVariable, value: Real },
    /// Set a variable to `factor` times a measured value before every run.
    Proportional {
        variable: ControlVariable,
        measurement: Measurement,
        factor: Real,
    },
    /// Root search on a variable.
    Search(SearchSpec),
}

impl Specification {
    pub fn is_none(&self) -> bool {
        matches!(self, Specification::None)
    }

    pub fn variable(&self) -> Option<&ControlVariable> {
        match self {
            Specification::None => None,
            Specification::Fixed { variable, .. }
            | Specification::Proportional { variable, .. } => Some(variable),
            Specification::Search(s) => Some(&s.variable),
        }
    }

    pub fn measurement(&self) -> Option<&Measurement> {
        match self {
            Specification::Proportional { measurement, .. } => Some(measurement),
            Specification::Search(s) => Some(&s.measurement),
            _ => None,
        }
    }
}
