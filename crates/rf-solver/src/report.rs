//! Per-run simulation report.

use std::collections::BTreeMap;

use rf_core::Real;

/// Convergence history of one loop.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SystemRecord {
    /// Times the loop ran to completion.
    pub runs: usize,
    pub total_iterations: usize,
    pub last_iterations: usize,
    /// Largest relative tear change at the last check.
    pub last_deviation: Real,
    /// Largest tear temperature change at the last check [K].
    pub last_temperature_change: Real,
}

/// Latest result of a unit's specification.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecificationOutcome {
    /// Controlled variable, e.g. `S1.split`.
    pub variable: String,
    pub value: Real,
    pub residual: Real,
    pub converged: bool,
    pub evaluations: usize,
    /// Why the last search failed, when it fell back.
    pub failure: Option<String>,
}

/// What happened during one `simulate` call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimulationReport {
    pub system: String,
    /// Keyed by loop name; facility loops are suffixed with `/facilities`.
    pub systems: BTreeMap<String, SystemRecord>,
    /// Keyed by unit name.
    pub specifications: BTreeMap<String, SpecificationOutcome>,
    pub unit_evaluations: usize,
    /// Searches that fell back to their last value.
    pub fallbacks: usize,
}

impl SimulationReport {
    pub fn new(system: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            ..Self::default()
        }
    }

    pub(crate) fn record_loop(
        &mut self,
        name: &str,
        iterations: usize,
        deviation: Real,
        temperature: Real,
    ) {
        let rec = self.systems.entry(name.to_string()).or_default();
        rec.runs += 1;
        rec.total_iterations += iterations;
        rec.last_iterations = iterations;
        rec.last_deviation = deviation;
        rec.last_temperature_change = temperature;
    }

    pub fn record(&self, name: &str) -> Option<&SystemRecord> {
        self.systems.get(name)
    }

    /// Iterations of the top-level system's last run.
    pub fn iterations(&self) -> usize {
        self.systems
            .get(&self.system)
            .map_or(0, |r| r.last_iterations)
    }

    pub fn all_specifications_converged(&self) -> bool {
        self.specifications.values().all(|o| o.converged)
    }
}
