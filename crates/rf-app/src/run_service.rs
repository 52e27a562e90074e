//! Simulation execution and parametric sweeps.

use std::collections::BTreeSet;
use std::time::Instant;

use rayon::prelude::*;
use rf_core::{StreamId, SystemId, UnitId};
use rf_flowsheet::accounting::system_units;
use rf_flowsheet::{Accounting, Flowsheet};
use rf_project::schema::Project;
use rf_solver::{SimulationReport, simulate};
use tracing::{info, info_span, warn};

use crate::compile::{CompiledFlowsheet, compile_project};
use crate::error::{AppError, AppResult};

/// Options for running a system.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunOptions {
    /// Number of consecutive simulations; later runs start from the previous result.
    pub repeat: usize,
    /// Empty all computed streams before every run.
    pub cold_start: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            repeat: 1,
            cold_start: false,
        }
    }
}

/// Computed state of one stream.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamSummary {
    pub id: String,
    /// kmol/h
    pub total_flow: f64,
    /// kg/h
    pub mass_flow: f64,
    pub temperature_k: f64,
    /// Nonzero flows by chemical [kmol/h].
    pub flows: Vec<(String, f64)>,
}

impl StreamSummary {
    fn of(fs: &Flowsheet, id: StreamId) -> AppResult<Self> {
        let stream = fs.stream(id)?;
        let chems = fs.chemicals();
        let flows = chems
            .iter()
            .zip(stream.flows())
            .filter(|(_, f)| **f != 0.0)
            .map(|(c, f)| (c.name.clone(), *f))
            .collect();
        Ok(Self {
            id: fs.stream_name(id).to_string(),
            total_flow: stream.total_flow(),
            mass_flow: stream.mass_flow(chems),
            temperature_k: stream.temperature_k(),
            flows,
        })
    }
}

fn summarize(
    fs: &Flowsheet,
    ids: impl IntoIterator<Item = StreamId>,
) -> AppResult<Vec<StreamSummary>> {
    ids.into_iter().map(|id| StreamSummary::of(fs, id)).collect()
}

/// Response from running a system.
#[derive(Debug, Clone)]
pub struct RunResponse {
    pub system: String,
    /// One report per run, in order.
    pub reports: Vec<SimulationReport>,
    pub recycles: Vec<StreamSummary>,
    pub products: Vec<StreamSummary>,
    /// USD/h
    pub feed_cost_rate: f64,
    /// USD/h
    pub product_revenue_rate: f64,
    pub elapsed_s: f64,
}

impl RunResponse {
    pub fn last_report(&self) -> Option<&SimulationReport> {
        self.reports.last()
    }
}

/// Recycle streams of `system` and of every loop running inside it.
fn recycle_streams(fs: &Flowsheet, system: SystemId) -> AppResult<Vec<StreamId>> {
    let units: BTreeSet<UnitId> = system_units(fs, system)?.into_iter().collect();
    let mut out = BTreeSet::new();
    for sys in fs.systems() {
        for edge in sys.recycles.iter().chain(&sys.facility_recycle) {
            if units.contains(&edge.producer) {
                out.insert(fs.recycle_stream(edge)?);
            }
        }
    }
    Ok(out.into_iter().collect())
}

/// Simulate `system_id` `options.repeat` times.
pub fn run_system(
    compiled: &mut CompiledFlowsheet,
    system_id: &str,
    options: &RunOptions,
) -> AppResult<RunResponse> {
    if options.repeat == 0 {
        return Err(AppError::InvalidInput("repeat must be at least 1".to_string()));
    }
    let system = compiled.system_id(system_id)?;
    let started = Instant::now();

    let mut reports = Vec::with_capacity(options.repeat);
    for run in 1..=options.repeat {
        if options.cold_start {
            compiled.flowsheet.reset_streams()?;
        }
        let report = simulate(&mut compiled.flowsheet, system, &compiled.settings)?;
        info!(
            system = system_id,
            run,
            iterations = report.iterations(),
            "run complete"
        );
        reports.push(report);
    }

    let fs = &compiled.flowsheet;
    let accounting = Accounting::new(fs, system)?;
    Ok(RunResponse {
        system: system_id.to_string(),
        reports,
        recycles: summarize(fs, recycle_streams(fs, system)?)?,
        products: summarize(fs, accounting.products().iter().copied())?,
        feed_cost_rate: accounting.feed_cost_rate(),
        product_revenue_rate: accounting.product_revenue_rate(),
        elapsed_s: started.elapsed().as_secs_f64(),
    })
}

/// Parametric sweep of one unit parameter.
#[derive(Debug, Clone, Copy)]
pub struct SweepRequest<'a> {
    pub system: &'a str,
    pub unit: &'a str,
    pub parameter: &'a str,
    pub values: &'a [f64],
    /// Evaluate points concurrently, each on its own compiled flowsheet.
    pub parallel: bool,
}

/// Result at one sweep value.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepPoint {
    pub value: f64,
    pub iterations: usize,
    pub products: Vec<StreamSummary>,
    /// Solver failure at this value; products are then the last computed state.
    pub error: Option<String>,
}

impl SweepPoint {
    pub fn converged(&self) -> bool {
        self.error.is_none()
    }
}

/// Run `request.system` once per value.
///
/// Sequential sweeps reuse one flowsheet, so each point starts from the
/// previous converged state. A solver failure is recorded on its point and the
/// computed streams are reset before the next one.
pub fn sweep(project: &Project, request: &SweepRequest<'_>) -> AppResult<Vec<SweepPoint>> {
    if request.values.is_empty() {
        return Err(AppError::InvalidInput("sweep needs at least one value".to_string()));
    }
    let span = info_span!(
        "sweep",
        system = request.system,
        unit = request.unit,
        parameter = request.parameter
    );
    let _enter = span.enter();

    if request.parallel {
        request
            .values
            .par_iter()
            .map(|&value| {
                let mut compiled = compile_project(project)?;
                sweep_point(&mut compiled, request, value)
            })
            .collect()
    } else {
        let mut compiled = compile_project(project)?;
        request
            .values
            .iter()
            .map(|&value| sweep_point(&mut compiled, request, value))
            .collect()
    }
}

fn sweep_point(
    compiled: &mut CompiledFlowsheet,
    request: &SweepRequest<'_>,
    value: f64,
) -> AppResult<SweepPoint> {
    let system = compiled.system_id(request.system)?;
    let unit = compiled.unit_id(request.unit)?;
    compiled
        .flowsheet
        .set_parameter(unit, request.parameter, value)?;

    let (iterations, error) = match simulate(&mut compiled.flowsheet, system, &compiled.settings) {
        Ok(report) => (report.iterations(), None),
        Err(err) => {
            warn!(value, error = %err, "sweep point failed");
            (0, Some(err.to_string()))
        }
    };

    let fs = &compiled.flowsheet;
    let products = Accounting::new(fs, system)?.products().to_vec();
    let point = SweepPoint {
        value,
        iterations,
        products: summarize(fs, products)?,
        error,
    };
    if !point.converged() {
        compiled.flowsheet.reset_streams()?;
    }
    Ok(point)
}
