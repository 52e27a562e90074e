//! Convergence driver.
//!
//! `simulate` runs a system depth-first. An acyclic path runs once in declared
//! order. A path with recycle edges repeats until every recycle stream changes
//! by less than the loop's tolerance between two passes; the streams then hold
//! the values computed by the last pass. Nested systems are converged to
//! completion each time the outer path reaches them. A facility recycle wraps
//! (main convergence + facilities) in an outer loop driven the same way.
//!
//! Every call starts from the current stream values, so repeating a converged
//! simulation costs one pass per loop. Nothing is rolled back on failure.

use tracing::{debug, info, info_span, warn};

use rf_core::{Real, StreamId, SystemId, UnitId};
use rf_flowsheet::{
    ConvergenceMethod, ConvergenceOptions, Element, FailurePolicy, Flowsheet, FlowsheetResult,
    System,
};
use rf_stream::{Stream, difference};

use crate::accelerate::{Accelerator, pack, unpack};
use crate::error::{SolverError, SolverResult};
use crate::report::SimulationReport;

/// Default limit on system nesting, counting subsystems entered by searches.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Solve-wide settings. Systems may override `convergence`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolveSettings {
    pub convergence: ConvergenceOptions,
    /// Policy for searches that do not set their own.
    pub root_failure: FailurePolicy,
    pub max_depth: usize,
}

impl Default for SolveSettings {
    fn default() -> Self {
        Self {
            convergence: ConvergenceOptions::default(),
            root_failure: FailurePolicy::Fallback,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl SolveSettings {
    pub fn with_convergence(mut self, options: ConvergenceOptions) -> Self {
        self.convergence = options;
        self
    }

    pub fn with_root_failure(mut self, policy: FailurePolicy) -> Self {
        self.root_failure = policy;
        self
    }
}

/// Converge `system` in place and report what happened.
pub fn simulate(
    fs: &mut Flowsheet,
    system: SystemId,
    settings: &SolveSettings,
) -> SolverResult<SimulationReport> {
    let name = fs.system(system)?.name.clone();
    let span = info_span!("simulate", system = %name);
    let _enter = span.enter();

    let mut sim = Simulation {
        fs,
        settings,
        report: SimulationReport::new(name),
    };
    sim.run_system(system, 0)?;
    info!(
        unit_evaluations = sim.report.unit_evaluations,
        fallbacks = sim.report.fallbacks,
        "simulation complete"
    );
    Ok(sim.report)
}

/// What one iteration of a loop re-runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Body {
    /// The main path.
    Path,
    /// The converged main path, then the facilities.
    PathAndFacilities,
}

pub(crate) struct Simulation<'a> {
    pub(crate) fs: &'a mut Flowsheet,
    pub(crate) settings: &'a SolveSettings,
    pub(crate) report: SimulationReport,
}

impl Simulation<'_> {
    pub(crate) fn run_system(&mut self, id: SystemId, depth: usize) -> SolverResult<()> {
        let sys = self.fs.system(id)?.clone();
        if depth > self.settings.max_depth {
            return Err(SolverError::Setup {
                what: format!(
                    "system '{}' nested deeper than {} levels",
                    sys.name, self.settings.max_depth
                ),
            });
        }
        let options = sys.convergence.unwrap_or(self.settings.convergence);

        match sys.facility_recycle {
            Some(edge) => {
                let tear = [self.fs.recycle_stream(&edge)?];
                let label = format!("{}/facilities", sys.name);
                self.converge(&sys, &label, &tear, &options, Body::PathAndFacilities, depth)
            }
            None => self.run_body(&sys, Body::PathAndFacilities, &options, depth),
        }
    }

    fn run_body(
        &mut self,
        sys: &System,
        body: Body,
        options: &ConvergenceOptions,
        depth: usize,
    ) -> SolverResult<()> {
        if sys.has_recycle() {
            let tears = sys
                .recycles
                .iter()
                .map(|edge| self.fs.recycle_stream(edge))
                .collect::<FlowsheetResult<Vec<StreamId>>>()?;
            self.converge(sys, &sys.name, &tears, options, Body::Path, depth)?;
        } else {
            self.run_elements(&sys.path, depth)?;
            self.report.record_loop(&sys.name, 1, 0.0, 0.0);
        }
        if body == Body::PathAndFacilities {
            self.run_elements(&sys.facilities, depth)?;
        }
        Ok(())
    }

    fn run_elements(&mut self, elements: &[Element], depth: usize) -> SolverResult<()> {
        for element in elements {
            match *element {
                Element::Unit(u) => self.evaluate_unit(u, depth)?,
                Element::System(s) => self.run_system(s, depth + 1)?,
            }
        }
        Ok(())
    }

    /// Specification first, then the model.
    pub(crate) fn evaluate_unit(&mut self, unit: UnitId, depth: usize) -> SolverResult<()> {
        self.apply_specification(unit, depth)?;
        self.run_model(unit)
    }

    pub(crate) fn run_model(&mut self, unit: UnitId) -> SolverResult<()> {
        self.report.unit_evaluations += 1;
        self.fs.run_unit(unit)?;
        Ok(())
    }

    fn tear_values(&self, tears: &[StreamId]) -> SolverResult<Vec<Stream>> {
        Ok(tears
            .iter()
            .map(|s| self.fs.stream(*s).cloned())
            .collect::<FlowsheetResult<Vec<Stream>>>()?)
    }

    fn converge(
        &mut self,
        sys: &System,
        label: &str,
        tears: &[StreamId],
        options: &ConvergenceOptions,
        body: Body,
        depth: usize,
    ) -> SolverResult<()> {
        let tol = options.stream_tolerance();
        let mut accelerator = Accelerator::new(options.method, options.acceleration_delay);
        let mut deviation: Real = 0.0;
        let mut temperature: Real = 0.0;

        for iteration in 1..=options.max_iterations {
            let guess = self.tear_values(tears)?;
            match body {
                Body::Path => self.run_elements(&sys.path, depth)?,
                Body::PathAndFacilities => {
                    self.run_body(sys, Body::PathAndFacilities, options, depth)?
                }
            }
            let computed = self.tear_values(tears)?;

            let mut converged = true;
            deviation = 0.0;
            temperature = 0.0;
            for (g, c) in guess.iter().zip(&computed) {
                let d = difference(g, c);
                converged &= d.within(&tol);
                deviation = deviation.max(d.deviation(&tol));
                temperature = temperature.max(d.temperature);
            }
            debug!(system = %label, iteration, deviation, temperature, "recycle iteration");

            if converged {
                self.report
                    .record_loop(label, iteration, deviation, temperature);
                info!(system = %label, iterations = iteration, "converged");
                return Ok(());
            }

            if options.method != ConvergenceMethod::FixedPoint {
                let next = accelerator.next_guess(&pack(&guess), &pack(&computed));
                let mut proposed = computed;
                unpack(&next, &mut proposed)?;
                for (sid, value) in tears.iter().zip(&proposed) {
                    self.fs.stream_mut(*sid)?.assign(value)?;
                }
            }
        }

        self.report
            .record_loop(label, options.max_iterations, deviation, temperature);
        warn!(
            system = %label,
            iterations = options.max_iterations,
            deviation,
            temperature,
            "recycle did not converge"
        );
        Err(SolverError::ConvergenceFailure {
            system: label.to_string(),
            iterations: options.max_iterations,
            deviation,
            temperature,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings() {
        let s = SolveSettings::default();
        assert_eq!(s.root_failure, FailurePolicy::Fallback);
        assert_eq!(s.convergence.max_iterations, 200);
        assert_eq!(s.max_depth, DEFAULT_MAX_DEPTH);
    }
}
