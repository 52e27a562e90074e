//! Integration tests for rf-stream.

use rf_stream::{Chemicals, Phase, Stream, StreamTolerance, difference};

#[test]
fn assign_then_compare_converges() {
    let chems = Chemicals::from_pairs(&[("Water", 18.015), ("LacticAcid", 90.08)]).unwrap();
    let lactic = chems.require("LacticAcid").unwrap();

    let mut recycle = Stream::new(chems.len());
    let computed = Stream::from_flows(vec![500.0, 12.0])
        .unwrap()
        .with_temperature_k(330.0)
        .unwrap()
        .with_phase(Phase::Liquid);

    assert!(!difference(&recycle, &computed).within(&StreamTolerance::default()));

    recycle.assign(&computed).unwrap();
    assert!(difference(&recycle, &computed).within(&StreamTolerance::default()));
    assert!(recycle.mass_fraction(&chems, lactic) > 0.1);
}

#[test]
fn validate_catches_non_physical_state() {
    let s = Stream::from_flows(vec![1.0, 2.0]).unwrap();
    assert!(s.validate().is_ok());
    assert!(s.clone().with_temperature_k(-5.0).is_err());
    assert!(s.with_pressure_pa(0.0).is_err());
}
