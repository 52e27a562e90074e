//! Heater/cooler setting the outlet temperature.

use rf_core::Real;
use rf_stream::{Chemicals, Phase, Stream};

use crate::common::{check_arity, check_finite, mix_inlets};
use crate::error::{UnitError, UnitResult};
use crate::traits::{Arity, PortCount, UnitModel};

/// Brings the mixed inlet to a fixed temperature.
#[derive(Debug, Clone, PartialEq)]
pub struct Heater {
    temperature_k: Real,
    phase: Option<Phase>,
}

impl Heater {
    pub fn new(temperature_k: Real) -> UnitResult<Self> {
        check_temperature(temperature_k)?;
        Ok(Self {
            temperature_k,
            phase: None,
        })
    }

    /// Force the outlet phase (e.g. a total condenser).
    pub fn with_phase(mut self, phase: Phase) -> Self {
        self.phase = Some(phase);
        self
    }

    pub fn temperature_k(&self) -> Real {
        self.temperature_k
    }
}

fn check_temperature(t: Real) -> UnitResult<()> {
    check_finite(t, "temperature")?;
    if t <= 0.0 {
        return Err(UnitError::NonPhysical {
            what: "temperature",
        });
    }
    Ok(())
}

impl UnitModel for Heater {
    fn kind(&self) -> &'static str {
        "Heater"
    }

    fn arity(&self) -> Arity {
        Arity::new(PortCount::AtLeast(1), PortCount::Exactly(1))
    }

    fn run(&self, _chems: &Chemicals, ins: &[Stream], outs: &mut [Stream]) -> UnitResult<()> {
        check_arity(self.kind(), self.arity(), ins.len(), outs.len())?;
        let out = &mut outs[0];
        mix_inlets(ins, out)?;
        out.set_temperature_k(self.temperature_k)?;
        if let Some(phase) = self.phase {
            out.set_phase(phase);
        }
        Ok(())
    }

    fn parameters(&self) -> &'static [&'static str] {
        &["temperature"]
    }

    fn parameter(&self, name: &str) -> UnitResult<Real> {
        match name {
            "temperature" => Ok(self.temperature_k),
            _ => Err(UnitError::UnknownParameter {
                kind: self.kind(),
                name: name.to_string(),
            }),
        }
    }

    fn set_parameter(&mut self, name: &str, value: Real) -> UnitResult<()> {
        match name {
            "temperature" => {
                check_temperature(value)?;
                self.temperature_k = value;
                Ok(())
            }
            _ => Err(UnitError::UnknownParameter {
                kind: self.kind(),
                name: name.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sets_outlet_temperature() {
        let chems = Chemicals::from_pairs(&[("Water", 18.015)]).unwrap();
        let feed = Stream::from_flows(vec![5.0]).unwrap();
        let mut outs = vec![Stream::new(1)];
        Heater::new(350.0)
            .unwrap()
            .with_phase(Phase::Vapor)
            .run(&chems, &[feed], &mut outs)
            .unwrap();
        assert_eq!(outs[0].temperature_k(), 350.0);
        assert_eq!(outs[0].phase(), Phase::Vapor);
        assert_eq!(outs[0].flows(), &[5.0]);
    }

    #[test]
    fn rejects_non_positive_temperature() {
        assert!(Heater::new(0.0).is_err());
        let mut h = Heater::new(300.0).unwrap();
        assert!(h.set_parameter("temperature", f64::NAN).is_err());
        assert_eq!(h.parameter("temperature").unwrap(), 300.0);
    }
}
