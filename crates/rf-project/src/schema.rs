//! Project schema definitions.
//!
//! Every entity is referred to by its `id`, which doubles as its name in the
//! compiled flowsheet. Flows are kmol/h, temperatures K, pressures Pa and
//! prices USD/kg.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub version: u32,
    pub name: String,
    #[serde(default)]
    pub settings: SettingsDef,
    #[serde(default)]
    pub chemicals: Vec<ChemicalDef>,
    #[serde(default)]
    pub streams: Vec<StreamDef>,
    #[serde(default)]
    pub units: Vec<UnitDef>,
    #[serde(default)]
    pub systems: Vec<SystemDef>,
    #[serde(default)]
    pub groups: Vec<GroupDef>,
}

impl Project {
    pub fn system(&self, id: &str) -> Option<&SystemDef> {
        self.systems.iter().find(|s| s.id == id)
    }

    pub fn unit(&self, id: &str) -> Option<&UnitDef> {
        self.units.iter().find(|u| u.id == id)
    }

    pub fn unit_mut(&mut self, id: &str) -> Option<&mut UnitDef> {
        self.units.iter_mut().find(|u| u.id == id)
    }

    pub fn stream(&self, id: &str) -> Option<&StreamDef> {
        self.streams.iter().find(|s| s.id == id)
    }
}

/// Solve-wide settings; systems may override `convergence`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SettingsDef {
    #[serde(default)]
    pub convergence: ConvergenceDef,
    #[serde(default)]
    pub root_failure: FailurePolicyDef,
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl Default for SettingsDef {
    fn default() -> Self {
        Self {
            convergence: ConvergenceDef::default(),
            root_failure: FailurePolicyDef::default(),
            max_depth: default_max_depth(),
        }
    }
}

fn default_max_depth() -> usize {
    64
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConvergenceDef {
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    #[serde(default = "default_molar_tolerance")]
    pub molar_tolerance: f64,
    #[serde(default = "default_relative_tolerance")]
    pub relative_tolerance: f64,
    #[serde(default = "default_temperature_tolerance")]
    pub temperature_tolerance: f64,
    #[serde(default)]
    pub method: MethodDef,
    #[serde(default = "default_acceleration_delay")]
    pub acceleration_delay: usize,
}

impl Default for ConvergenceDef {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            molar_tolerance: default_molar_tolerance(),
            relative_tolerance: default_relative_tolerance(),
            temperature_tolerance: default_temperature_tolerance(),
            method: MethodDef::default(),
            acceleration_delay: default_acceleration_delay(),
        }
    }
}

fn default_max_iterations() -> usize {
    200
}

fn default_molar_tolerance() -> f64 {
    1.0
}

fn default_relative_tolerance() -> f64 {
    0.01
}

fn default_temperature_tolerance() -> f64 {
    0.10
}

fn default_acceleration_delay() -> usize {
    3
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum MethodDef {
    #[default]
    FixedPoint,
    Aitken,
    Wegstein,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum FailurePolicyDef {
    #[default]
    Fallback,
    Escalate,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum PhaseDef {
    #[default]
    Liquid,
    Vapor,
    Solid,
    Mixed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChemicalDef {
    pub id: String,
    /// kg/kmol
    pub molar_mass: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StreamDef {
    pub id: String,
    /// Present for feeds; other streams start empty and are computed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feed: Option<FeedDef>,
    /// Price of a computed stream, e.g. a product.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeedDef {
    /// (chemical id, kmol/h); chemicals not listed are zero.
    pub flows: Vec<(String, f64)>,
    #[serde(default = "default_temperature_k")]
    pub temperature_k: f64,
    #[serde(default = "default_pressure_pa")]
    pub pressure_pa: f64,
    #[serde(default)]
    pub phase: PhaseDef,
}

fn default_temperature_k() -> f64 {
    298.15
}

fn default_pressure_pa() -> f64 {
    101_325.0
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UnitDef {
    pub id: String,
    pub kind: UnitKindDef,
    #[serde(default)]
    pub ins: Vec<String>,
    #[serde(default)]
    pub outs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specification: Option<SpecificationDef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum UnitKindDef {
    Mixer,
    /// Fraction `split` of every chemical leaves through the first outlet.
    Splitter {
        split: f64,
    },
    /// Per-chemical split to the first outlet; unlisted chemicals go to the second.
    ComponentSplitter {
        splits: Vec<(String, f64)>,
    },
    Heater {
        temperature_k: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        phase: Option<PhaseDef>,
    },
    Conversion {
        reactant: String,
        stoichiometry: Vec<(String, f64)>,
        conversion: f64,
    },
    /// Relative volatilities per chemical; unlisted chemicals stay liquid.
    Flash {
        volatility: Vec<(String, f64)>,
        vapor_fraction: f64,
    },
    PassThrough,
}

impl UnitKindDef {
    pub fn name(&self) -> &'static str {
        match self {
            UnitKindDef::Mixer => "Mixer",
            UnitKindDef::Splitter { .. } => "Splitter",
            UnitKindDef::ComponentSplitter { .. } => "ComponentSplitter",
            UnitKindDef::Heater { .. } => "Heater",
            UnitKindDef::Conversion { .. } => "Conversion",
            UnitKindDef::Flash { .. } => "Flash",
            UnitKindDef::PassThrough => "PassThrough",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum SpecificationDef {
    Fixed {
        variable: VariableDef,
        value: f64,
    },
    Proportional {
        variable: VariableDef,
        measurement: MeasurementDef,
        factor: f64,
    },
    Search(SearchDef),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchDef {
    pub variable: VariableDef,
    pub measurement: MeasurementDef,
    pub target: f64,
    /// System simulated for every trial value; absent runs only the owning unit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subsystem: Option<String>,
    pub method: SearchMethodDef,
    #[serde(default = "default_search_tolerance")]
    pub xtol: f64,
    #[serde(default = "default_search_tolerance")]
    pub ytol: f64,
    #[serde(default = "default_search_iterations")]
    pub max_iterations: usize,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_failure: Option<FailurePolicyDef>,
}

fn default_search_tolerance() -> f64 {
    1e-6
}

fn default_search_iterations() -> usize {
    50
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum SearchMethodDef {
    Secant {
        x0: f64,
        x1: f64,
    },
    /// Secant from a value read at search time: the measurement when given,
    /// otherwise the variable's current value. `x1 = x0 + step`.
    SeededSecant {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        seed: Option<MeasurementDef>,
        step: f64,
    },
    Bracketed {
        lower: f64,
        upper: f64,
        #[serde(default = "default_true")]
        check_bounds: bool,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum VariableDef {
    UnitParameter {
        unit: String,
        parameter: String,
    },
    /// Scales one chemical of a feed, or the whole feed when `chemical` is absent.
    FeedFlow {
        stream: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        chemical: Option<String>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum MeasurementDef {
    TotalFlow {
        stream: String,
    },
    ChemicalFlow {
        stream: String,
        chemical: String,
    },
    MassFlow {
        stream: String,
    },
    MoleFraction {
        stream: String,
        chemical: String,
    },
    MassFraction {
        stream: String,
        chemical: String,
    },
    Temperature {
        stream: String,
    },
    MassRatio {
        numerator: String,
        denominator: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        chemical: Option<String>,
    },
}

impl MeasurementDef {
    /// Stream ids read by the measurement.
    pub fn streams(&self) -> Vec<&str> {
        match self {
            MeasurementDef::TotalFlow { stream }
            | MeasurementDef::ChemicalFlow { stream, .. }
            | MeasurementDef::MassFlow { stream }
            | MeasurementDef::MoleFraction { stream, .. }
            | MeasurementDef::MassFraction { stream, .. }
            | MeasurementDef::Temperature { stream } => vec![stream.as_str()],
            MeasurementDef::MassRatio {
                numerator,
                denominator,
                ..
            } => vec![numerator.as_str(), denominator.as_str()],
        }
    }

    pub fn chemical(&self) -> Option<&str> {
        match self {
            MeasurementDef::ChemicalFlow { chemical, .. }
            | MeasurementDef::MoleFraction { chemical, .. }
            | MeasurementDef::MassFraction { chemical, .. } => Some(chemical.as_str()),
            MeasurementDef::MassRatio { chemical, .. } => chemical.as_deref(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SystemDef {
    pub id: String,
    #[serde(default)]
    pub path: Vec<ElementDef>,
    /// Stream ids closed by this system's loop.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recycles: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub facilities: Vec<ElementDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facility_recycle: Option<String>,
    /// Overrides the project-wide convergence settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub convergence: Option<ConvergenceDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "id")]
pub enum ElementDef {
    Unit(String),
    System(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GroupDef {
    pub id: String,
    pub units: Vec<String>,
}
