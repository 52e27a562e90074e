//! Volatility-based two-outlet flash.

use rf_core::Real;
use rf_stream::{Chemicals, Phase, Stream};

use crate::common::{check_arity, check_finite, check_fraction, mix_inlets};
use crate::error::{UnitError, UnitResult};
use crate::traits::{Arity, PortCount, UnitModel};

/// Separates the mixed inlet into vapor (outlet 0) and liquid (outlet 1).
///
/// Chemical `i` sends `min(1, V * volatility_i)` of its flow overhead, where
/// `V` is the `vapor_fraction` parameter. Not a thermodynamic flash: the split
/// is monotone in `V`, which is what design specifications need.
#[derive(Debug, Clone, PartialEq)]
pub struct Flash {
    volatility: Vec<Real>,
    vapor_fraction: Real,
}

impl Flash {
    pub fn new(volatility: Vec<Real>, vapor_fraction: Real) -> UnitResult<Self> {
        if volatility.is_empty() {
            return Err(UnitError::InvalidConfig {
                what: "flash needs one volatility per chemical".into(),
            });
        }
        for v in &volatility {
            check_finite(*v, "volatility")?;
            if *v < 0.0 {
                return Err(UnitError::NonPhysical { what: "volatility" });
            }
        }
        check_fraction(vapor_fraction, "vapor fraction")?;
        Ok(Self {
            volatility,
            vapor_fraction,
        })
    }

    pub fn volatility(&self) -> &[Real] {
        &self.volatility
    }

    pub fn vapor_fraction(&self) -> Real {
        self.vapor_fraction
    }
}

impl UnitModel for Flash {
    fn kind(&self) -> &'static str {
        "Flash"
    }

    fn arity(&self) -> Arity {
        Arity::new(PortCount::AtLeast(1), PortCount::Exactly(2))
    }

    fn run(&self, chems: &Chemicals, ins: &[Stream], outs: &mut [Stream]) -> UnitResult<()> {
        check_arity(self.kind(), self.arity(), ins.len(), outs.len())?;
        if self.volatility.len() != chems.len() {
            return Err(UnitError::InvalidConfig {
                what: format!(
                    "flash has {} volatilities for {} chemicals",
                    self.volatility.len(),
                    chems.len()
                ),
            });
        }

        let mut feed = Stream::new(chems.len());
        mix_inlets(ins, &mut feed)?;

        let (vapor, liquid) = outs.split_at_mut(1);
        let (vapor, liquid) = (&mut vapor[0], &mut liquid[0]);
        vapor.assign(&feed)?;
        liquid.assign(&feed)?;
        for (i, (total, alpha)) in feed.flows().iter().zip(&self.volatility).enumerate() {
            let up = (self.vapor_fraction * alpha).min(1.0);
            vapor.flows_mut()[i] = up * total;
            liquid.flows_mut()[i] = (1.0 - up) * total;
        }
        vapor.set_phase(Phase::Vapor);
        liquid.set_phase(Phase::Liquid);
        Ok(())
    }

    fn parameters(&self) -> &'static [&'static str] {
        &["vapor_fraction"]
    }

    fn parameter(&self, name: &str) -> UnitResult<Real> {
        match name {
            "vapor_fraction" => Ok(self.vapor_fraction),
            _ => Err(UnitError::UnknownParameter {
                kind: self.kind(),
                name: name.to_string(),
            }),
        }
    }

    fn set_parameter(&mut self, name: &str, value: Real) -> UnitResult<()> {
        match name {
            "vapor_fraction" => {
                check_fraction(value, "vapor fraction")?;
                self.vapor_fraction = value;
                Ok(())
            }
            _ => Err(UnitError::UnknownParameter {
                kind: self.kind(),
                name: name.to_string(),
            }),
        }
    }
}
