use clap::{Parser, Subcommand};
use rf_app::{
    AppError, AppResult, RunOptions, RunResponse, StreamSummary, SweepRequest, project_service,
    run_service,
};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Parser)]
#[command(name = "rf-cli")]
#[command(
    about = "RecycleFlow CLI - process flowsheet simulation with recycle convergence",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate project file syntax, references and topology
    Validate {
        /// Path to the project file (YAML, or JSON by extension)
        project_path: PathBuf,
    },
    /// List systems in a project
    Systems {
        /// Path to the project file
        project_path: PathBuf,
    },
    /// Converge a system and print its recycles and products
    Run {
        /// Path to the project file
        project_path: PathBuf,
        /// System ID to simulate
        system_id: String,
        /// Number of consecutive runs, each starting from the previous result
        #[arg(long, default_value_t = 1)]
        repeat: usize,
        /// Empty computed streams before every run
        #[arg(long)]
        cold: bool,
    },
    /// Run a system once per value of a unit parameter
    Sweep {
        /// Path to the project file
        project_path: PathBuf,
        /// System ID to simulate
        system_id: String,
        /// Unit whose parameter is swept
        #[arg(long)]
        unit: String,
        /// Parameter name (e.g., split, conversion, vapor_fraction)
        #[arg(long)]
        parameter: String,
        /// Comma-separated parameter values
        #[arg(long, value_delimiter = ',', required = true)]
        values: Vec<f64>,
        /// Evaluate values concurrently
        #[arg(long)]
        parallel: bool,
    },
}

fn main() -> AppResult<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { project_path } => cmd_validate(&project_path),
        Commands::Systems { project_path } => cmd_systems(&project_path),
        Commands::Run {
            project_path,
            system_id,
            repeat,
            cold,
        } => cmd_run(
            &project_path,
            &system_id,
            RunOptions {
                repeat,
                cold_start: cold,
            },
        ),
        Commands::Sweep {
            project_path,
            system_id,
            unit,
            parameter,
            values,
            parallel,
        } => cmd_sweep(
            &project_path,
            &SweepRequest {
                system: &system_id,
                unit: &unit,
                parameter: &parameter,
                values: &values,
                parallel,
            },
        ),
    }
}

fn cmd_validate(project_path: &Path) -> AppResult<()> {
    println!("Validating project: {}", project_path.display());
    let project = project_service::load_project(project_path)?;
    project_service::validate_project(&project)?;
    println!("✓ Project is valid");
    Ok(())
}

fn cmd_systems(project_path: &Path) -> AppResult<()> {
    let project = project_service::load_project(project_path)?;
    let compiled = rf_app::compile_project(&project)?;
    let systems = project_service::list_systems(&compiled.flowsheet)?;

    if systems.is_empty() {
        println!("No systems found in project");
    } else {
        println!("Systems in project:");
        for sys in systems {
            let recycles = if sys.recycles.is_empty() {
                "no recycle".to_string()
            } else {
                format!("recycles: {}", sys.recycles.join(", "))
            };
            println!(
                "  {} ({} units, {} facilities; {})",
                sys.id, sys.unit_count, sys.facility_count, recycles
            );
            if !sys.subsystems.is_empty() {
                println!("    nested: {}", sys.subsystems.join(", "));
            }
        }
    }
    Ok(())
}

fn cmd_run(project_path: &Path, system_id: &str, options: RunOptions) -> AppResult<()> {
    println!("Running system: {}", system_id);
    let project = project_service::load_project(project_path)?;
    let mut compiled = rf_app::compile_project(&project)?;
    let response = run_service::run_system(&mut compiled, system_id, &options)?;
    print_run(&response)
}

fn print_run(response: &RunResponse) -> AppResult<()> {
    let report = response
        .last_report()
        .ok_or_else(|| AppError::InvalidInput("no runs executed".to_string()))?;
    println!(
        "✓ Simulation completed in {:.3} s ({} run(s), {} unit evaluations in the last)",
        response.elapsed_s,
        response.reports.len(),
        report.unit_evaluations
    );

    for (name, record) in &report.systems {
        println!(
            "  Loop {}: {} iteration(s), deviation {:.3e}, dT {:.3e} K",
            name, record.last_iterations, record.last_deviation, record.last_temperature_change
        );
    }
    for (unit, outcome) in &report.specifications {
        let status = if outcome.converged { "met" } else { "NOT met" };
        println!(
            "  Specification {} ({}): {} = {:.6} after {} evaluations",
            unit, status, outcome.variable, outcome.value, outcome.evaluations
        );
        if let Some(failure) = &outcome.failure {
            println!("    {}", failure);
        }
    }

    print_streams("Recycles", &response.recycles);
    print_streams("Products", &response.products);
    println!(
        "  Feed cost: {:.2} USD/h, product revenue: {:.2} USD/h",
        response.feed_cost_rate, response.product_revenue_rate
    );
    Ok(())
}

fn print_streams(title: &str, streams: &[StreamSummary]) {
    if streams.is_empty() {
        return;
    }
    println!("  {}:", title);
    for s in streams {
        println!(
            "    {:<16} {:>12.4} kmol/h {:>12.2} kg/h {:>8.2} K",
            s.id, s.total_flow, s.mass_flow, s.temperature_k
        );
    }
}

fn cmd_sweep(project_path: &Path, request: &SweepRequest<'_>) -> AppResult<()> {
    println!(
        "Sweeping {}.{} over {} value(s) for system: {}",
        request.unit,
        request.parameter,
        request.values.len(),
        request.system
    );
    let project = project_service::load_project(project_path)?;
    let points = run_service::sweep(&project, request)?;
    debug!(points = points.len(), parallel = request.parallel, "sweep finished");

    for point in &points {
        match &point.error {
            None => {
                let total: f64 = point.products.iter().map(|p| p.total_flow).sum();
                println!(
                    "  {:>12.6}  ✓ {:>4} iteration(s), products {:.4} kmol/h",
                    point.value, point.iterations, total
                );
            }
            Some(err) => println!("  {:>12.6}  ✗ {}", point.value, err),
        }
    }
    Ok(())
}
