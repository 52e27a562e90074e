//! Execution of process specifications.

use tracing::{debug, warn};

use rf_core::{Real, UnitId};
use rf_flowsheet::{FailurePolicy, SearchMethod, SearchSpec, SecantSeed, Specification};

use crate::driver::Simulation;
use crate::error::{SolverError, SolverResult};
use crate::report::SpecificationOutcome;
use crate::root::{self, RootOptions};

impl Simulation<'_> {
    /// Run `unit`'s specification, leaving its control variable set.
    pub(crate) fn apply_specification(&mut self, unit: UnitId, depth: usize) -> SolverResult<()> {
        let spec = self.fs.unit(unit)?.specification.clone();
        match spec {
            Specification::None => {}
            Specification::Fixed { variable, value } => variable.set(self.fs, value)?,
            Specification::Proportional {
                variable,
                measurement,
                factor,
            } => {
                let measured = measurement.measure(self.fs)?;
                variable.set(self.fs, factor * measured)?;
            }
            Specification::Search(search) => self.run_search(unit, &search, depth)?,
        }
        Ok(())
    }

    fn run_search(&mut self, unit: UnitId, search: &SearchSpec, depth: usize) -> SolverResult<()> {
        if !search.enabled {
            if let Some(v) = search.disabled_value {
                search.variable.set(self.fs, v)?;
            }
            return Ok(());
        }

        let opts = RootOptions {
            xtol: search.xtol,
            ytol: search.ytol,
            max_iterations: search.max_iterations,
        };
        let initial = search.variable.get(self.fs)?;
        let seed = match search.method {
            SearchMethod::SeededSecant {
                seed: SecantSeed::Measured(m),
                ..
            } => m.measure(self.fs)?,
            _ => initial,
        };
        let objective = |x: Real| self.objective(unit, search, x, depth);
        let solution = match search.method {
            SearchMethod::Secant { x0, x1 } => root::secant(objective, x0, x1, &opts)?,
            SearchMethod::SeededSecant { step, .. } => {
                root::secant(objective, seed, seed + step, &opts)?
            }
            SearchMethod::Bracketed {
                lower,
                upper,
                check_bounds,
            } => root::bracketed(objective, lower, upper, check_bounds, &opts)?,
        };

        let unit_name = self.fs.unit_name(unit).to_string();
        let variable = search.variable.describe(self.fs);
        let policy = search.on_failure.unwrap_or(self.settings.root_failure);

        let outcome = match solution.into_result() {
            Ok(sol) => {
                self.settle(search, sol.x, sol.last_x, depth)?;
                debug!(
                    unit = %unit_name,
                    %variable,
                    value = sol.x,
                    evaluations = sol.evaluations,
                    "specification met"
                );
                SpecificationOutcome {
                    variable,
                    value: sol.x,
                    residual: sol.fx,
                    converged: true,
                    evaluations: sol.evaluations,
                    failure: None,
                }
            }
            Err(err) => {
                if policy == FailurePolicy::Escalate {
                    return Err(SolverError::RootFinding {
                        unit: unit_name,
                        source: err,
                    });
                }
                warn!(
                    unit = %unit_name,
                    %variable,
                    error = %err,
                    "specification not met, keeping last attempted value"
                );
                // No accepted trial: restore the value the search started from
                let value = if err.last_x.is_finite() {
                    err.last_x
                } else {
                    initial
                };
                self.settle(search, value, err.last_x, depth)?;
                self.report.fallbacks += 1;
                SpecificationOutcome {
                    variable,
                    value,
                    residual: err.residual,
                    converged: false,
                    evaluations: err.evaluations,
                    failure: Some(err.to_string()),
                }
            }
        };
        self.report.specifications.insert(unit_name, outcome);
        Ok(())
    }

    /// Measured minus target after setting the variable to `x` and simulating.
    ///
    /// A value the variable refuses yields NaN, which ends the search.
    fn objective(
        &mut self,
        unit: UnitId,
        search: &SearchSpec,
        x: Real,
        depth: usize,
    ) -> SolverResult<Real> {
        if let Err(e) = search.variable.set(self.fs, x) {
            if e.rejects_value() {
                debug!(value = x, error = %e, "trial value rejected");
                return Ok(Real::NAN);
            }
            return Err(e.into());
        }
        match search.subsystem {
            Some(sub) => self.run_system(sub, depth + 1)?,
            None => self.run_model(unit)?,
        }
        Ok(search.measurement.measure(self.fs)? - search.target)
    }

    /// Leave the variable at `x` with the subsystem simulated there.
    fn settle(
        &mut self,
        search: &SearchSpec,
        x: Real,
        last_x: Real,
        depth: usize,
    ) -> SolverResult<()> {
        search.variable.set(self.fs, x)?;
        if x != last_x {
            if let Some(sub) = search.subsystem {
                self.run_system(sub, depth + 1)?;
            }
        }
        Ok(())
    }
}
