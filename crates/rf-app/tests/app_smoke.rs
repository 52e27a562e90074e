//! Smoke test for the rf-app service layer on the demo project.

use std::path::PathBuf;

use rf_app::{RunOptions, compile_project, list_systems, load_project, run_system, validate_project};

fn demo_path() -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.pop(); // go to crates
    path.pop(); // go to repo root
    path.push("demos");
    path.push("recycle_demo.yaml");
    path
}

#[test]
fn demo_project_lists_systems() {
    let project = load_project(&demo_path()).expect("Failed to load project");
    validate_project(&project).expect("Validation should succeed");

    let compiled = compile_project(&project).unwrap();
    let systems = list_systems(&compiled.flowsheet).unwrap();
    assert_eq!(systems.len(), 2);

    let fermentation = &systems[0];
    assert_eq!(fermentation.id, "fermentation");
    assert_eq!(fermentation.unit_count, 5);
    assert_eq!(fermentation.recycles, vec!["recycle".to_string()]);
    assert!(fermentation.is_looping());

    let plant = &systems[1];
    assert_eq!(plant.unit_count, 6);
    assert_eq!(plant.subsystems, vec!["fermentation".to_string()]);
    assert!(!plant.is_looping());
}

#[test]
fn demo_plant_runs_to_specification() {
    let project = load_project(&demo_path()).unwrap();
    let mut compiled = compile_project(&project).unwrap();

    let response = run_system(&mut compiled, "plant", &RunOptions::default()).unwrap();
    let report = response.last_report().unwrap();
    assert_eq!(report.fallbacks, 0);
    assert!(report.specifications["F1"].converged);
    assert!(report.record("fermentation").unwrap().last_iterations >= 2);

    assert_eq!(response.recycles.len(), 1);
    assert_eq!(response.recycles[0].id, "recycle");

    let product_ids: Vec<&str> = response.products.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(product_ids, vec!["bottoms", "purge"]);

    // Ethanol specification on the flash bottoms
    let bottoms = &response.products[0];
    let ethanol = bottoms
        .flows
        .iter()
        .find(|(c, _)| c == "Ethanol")
        .map_or(0.0, |(_, f)| *f);
    let x = ethanol / bottoms.total_flow;
    assert!((x - 0.001).abs() < 1e-4, "ethanol fraction {x}");

    // Only the fresh feed carries a price: 0.05 USD/kg
    let feed_mass = 1000.0 * 18.015 + 50.0 * 180.156;
    assert!((response.feed_cost_rate - 0.05 * feed_mass).abs() < 1e-6);
    assert_eq!(response.product_revenue_rate, 0.0);
}

#[test]
fn repeated_runs_start_warm() {
    let project = load_project(&demo_path()).unwrap();
    let mut compiled = compile_project(&project).unwrap();

    let options = RunOptions {
        repeat: 2,
        cold_start: false,
    };
    let response = run_system(&mut compiled, "fermentation", &options).unwrap();
    let first = response.reports[0].record("fermentation").unwrap().last_iterations;
    let second = response.reports[1].record("fermentation").unwrap().last_iterations;
    assert!(second < first, "warm {second} vs cold {first}");
}

#[test]
fn unknown_system_is_reported() {
    let project = load_project(&demo_path()).unwrap();
    let mut compiled = compile_project(&project).unwrap();
    let err = run_system(&mut compiled, "nope", &RunOptions::default()).unwrap_err();
    assert!(matches!(err, rf_app::AppError::SystemNotFound(ref id) if id == "nope"));
}
