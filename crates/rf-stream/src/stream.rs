//! Material stream value.

use rf_core::units::{
    Pressure, STANDARD_PRESSURE_PA, STANDARD_TEMPERATURE_K, Temperature, k, pa, to_k, to_pa,
};
use rf_core::{ChemicalId, Real};

use crate::chemicals::Chemicals;
use crate::error::{StreamError, StreamResult};

/// Phase tag carried by a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Phase {
    #[default]
    Liquid,
    Vapor,
    Solid,
    Mixed,
}

/// A material stream: molar flows per chemical plus thermal state.
///
/// Streams are mutated in place every time their producing unit runs. The flow
/// vector layout follows the flowsheet's [`Chemicals`] registry; flows are in kmol/h.
#[derive(Debug, Clone, PartialEq)]
pub struct Stream {
    flows: Vec<Real>,
    t: Temperature,
    p: Pressure,
    phase: Phase,
    /// Unit price [USD/kg], used only by accounting consumers.
    price: Option<Real>,
}

impl Stream {
    /// Empty stream at standard conditions.
    pub fn new(n_chemicals: usize) -> Self {
        Self {
            flows: vec![0.0; n_chemicals],
            t: k(STANDARD_TEMPERATURE_K),
            p: pa(STANDARD_PRESSURE_PA),
            phase: Phase::default(),
            price: None,
        }
    }

    /// Stream with the given molar flows at standard conditions.
    pub fn from_flows(flows: Vec<Real>) -> StreamResult<Self> {
        validate_flows(&flows)?;
        Ok(Self {
            flows,
            ..Self::new(0)
        })
    }

    pub fn with_temperature_k(mut self, t: Real) -> StreamResult<Self> {
        self.set_temperature_k(t)?;
        Ok(self)
    }

    pub fn with_pressure_pa(mut self, p: Real) -> StreamResult<Self> {
        self.set_pressure_pa(p)?;
        Ok(self)
    }

    pub fn with_phase(mut self, phase: Phase) -> Self {
        self.phase = phase;
        self
    }

    pub fn with_price(mut self, price: Real) -> Self {
        self.price = Some(price);
        self
    }

    /// A zero-flow stream with the same layout and thermal state.
    pub fn empty_like(&self) -> Self {
        Self {
            flows: vec![0.0; self.flows.len()],
            t: self.t,
            p: self.p,
            phase: self.phase,
            price: None,
        }
    }

    pub fn len(&self) -> usize {
        self.flows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flows.iter().all(|f| *f == 0.0)
    }

    pub fn flows(&self) -> &[Real] {
        &self.flows
    }

    pub fn flow(&self, chemical: ChemicalId) -> Real {
        self.flows.get(chemical.slot()).copied().unwrap_or(0.0)
    }

    pub fn set_flow(&mut self, chemical: ChemicalId, value: Real) -> StreamResult<()> {
        check_flow(value)?;
        let len = self.flows.len();
        let slot = self
            .flows
            .get_mut(chemical.slot())
            .ok_or(StreamError::LengthMismatch {
                expected: chemical.slot() + 1,
                actual: len,
            })?;
        *slot = value;
        Ok(())
    }

    /// Overwrite the whole flow vector (length must match).
    pub fn set_flows(&mut self, flows: &[Real]) -> StreamResult<()> {
        if flows.len() != self.flows.len() {
            return Err(StreamError::LengthMismatch {
                expected: self.flows.len(),
                actual: flows.len(),
            });
        }
        validate_flows(flows)?;
        self.flows.copy_from_slice(flows);
        Ok(())
    }

    /// Mutable flow access for unit models; callers must keep flows non-negative.
    pub fn flows_mut(&mut self) -> &mut [Real] {
        &mut self.flows
    }

    /// Total molar flow [kmol/h].
    pub fn total_flow(&self) -> Real {
        self.flows.iter().sum()
    }

    /// Mass flow of one chemical [kg/h].
    pub fn chemical_mass_flow(&self, chems: &Chemicals, chemical: ChemicalId) -> Real {
        self.flow(chemical) * chems.molar_mass(chemical)
    }

    /// Total mass flow [kg/h].
    pub fn mass_flow(&self, chems: &Chemicals) -> Real {
        chems
            .iter()
            .map(|c| self.flow(c.id) * c.molar_mass)
            .sum()
    }

    pub fn mole_fraction(&self, chemical: ChemicalId) -> Real {
        let total = self.total_flow();
        if total > 0.0 {
            self.flow(chemical) / total
        } else {
            0.0
        }
    }

    pub fn mass_fraction(&self, chems: &Chemicals, chemical: ChemicalId) -> Real {
        let total = self.mass_flow(chems);
        if total > 0.0 {
            self.chemical_mass_flow(chems, chemical) / total
        } else {
            0.0
        }
    }

    pub fn temperature(&self) -> Temperature {
        self.t
    }

    pub fn temperature_k(&self) -> Real {
        to_k(self.t)
    }

    pub fn set_temperature_k(&mut self, t: Real) -> StreamResult<()> {
        if !t.is_finite() || t <= 0.0 {
            return Err(StreamError::NonPhysical {
                what: "temperature must be positive and finite",
            });
        }
        self.t = k(t);
        Ok(())
    }

    pub fn pressure(&self) -> Pressure {
        self.p
    }

    pub fn pressure_pa(&self) -> Real {
        to_pa(self.p)
    }

    pub fn set_pressure_pa(&mut self, p: Real) -> StreamResult<()> {
        if !p.is_finite() || p <= 0.0 {
            return Err(StreamError::NonPhysical {
                what: "pressure must be positive and finite",
            });
        }
        self.p = pa(p);
        Ok(())
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    pub fn price(&self) -> Option<Real> {
        self.price
    }

    pub fn set_price(&mut self, price: Option<Real>) {
        self.price = price;
    }

    /// Cash flow of this stream [USD/h]; zero when unpriced.
    pub fn cost_rate(&self, chems: &Chemicals) -> Real {
        self.price.map_or(0.0, |p| p * self.mass_flow(chems))
    }

    /// In-place update from another stream's state. The price is a property of
    /// the stream itself and is kept.
    pub fn assign(&mut self, other: &Stream) -> StreamResult<()> {
        if other.flows.len() != self.flows.len() {
            return Err(StreamError::LengthMismatch {
                expected: self.flows.len(),
                actual: other.flows.len(),
            });
        }
        self.flows.copy_from_slice(&other.flows);
        self.t = other.t;
        self.p = other.p;
        self.phase = other.phase;
        Ok(())
    }

    /// Set all flows to zero, keeping thermal state.
    pub fn clear(&mut self) {
        self.flows.iter_mut().for_each(|f| *f = 0.0);
    }

    /// Multiply all flows by a non-negative factor.
    pub fn scale(&mut self, factor: Real) -> StreamResult<()> {
        if !factor.is_finite() || factor < 0.0 {
            return Err(StreamError::InvalidArg {
                what: "scale factor must be non-negative and finite",
            });
        }
        self.flows.iter_mut().for_each(|f| *f *= factor);
        Ok(())
    }

    /// Overwrite this stream with the sum of `sources`.
    ///
    /// Temperature is the molar-flow weighted mean (last source's temperature if
    /// all flows are zero), pressure the lowest inlet pressure, phase `Mixed`
    /// when the sources disagree.
    pub fn mix_from(&mut self, sources: &[&Stream]) -> StreamResult<()> {
        self.clear();
        if sources.is_empty() {
            return Ok(());
        }

        let mut weighted_t = 0.0;
        let mut total = 0.0;
        let mut p_min = Real::INFINITY;
        let first_phase = sources[0].phase;
        let mut same_phase = true;

        for s in sources {
            if s.flows.len() != self.flows.len() {
                return Err(StreamError::LengthMismatch {
                    expected: self.flows.len(),
                    actual: s.flows.len(),
                });
            }
            for (acc, f) in self.flows.iter_mut().zip(&s.flows) {
                *acc += f;
            }
            let n = s.total_flow();
            weighted_t += n * s.temperature_k();
            total += n;
            p_min = p_min.min(s.pressure_pa());
            same_phase &= s.phase == first_phase;
        }

        let t = if total > 0.0 {
            weighted_t / total
        } else {
            sources[sources.len() - 1].temperature_k()
        };
        self.set_temperature_k(t)?;
        self.set_pressure_pa(p_min)?;
        self.phase = if same_phase { first_phase } else { Phase::Mixed };
        Ok(())
    }

    /// Check that the stream describes a physical state.
    pub fn validate(&self) -> StreamResult<()> {
        validate_flows(&self.flows)?;
        let t = self.temperature_k();
        if !t.is_finite() || t <= 0.0 {
            return Err(StreamError::NonPhysical {
                what: "temperature must be positive and finite",
            });
        }
        let p = self.pressure_pa();
        if !p.is_finite() || p <= 0.0 {
            return Err(StreamError::NonPhysical {
                what: "pressure must be positive and finite",
            });
        }
        Ok(())
    }
}

fn check_flow(value: Real) -> StreamResult<()> {
    if !value.is_finite() {
        return Err(StreamError::NonPhysical {
            what: "non-finite molar flow",
        });
    }
    if value < 0.0 {
        return Err(StreamError::NonPhysical {
            what: "negative molar flow",
        });
    }
    Ok(())
}

fn validate_flows(flows: &[Real]) -> StreamResult<()> {
    flows.iter().try_for_each(|f| check_flow(*f))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chems() -> Chemicals {
        Chemicals::from_pairs(&[("Water", 18.0), ("Ethanol", 46.0)]).unwrap()
    }

    #[test]
    fn new_stream_is_empty_at_standard_state() {
        let s = Stream::new(2);
        assert!(s.is_empty());
        assert_eq!(s.len(), 2);
        assert!((s.temperature_k() - STANDARD_TEMPERATURE_K).abs() < 1e-9);
        assert!((s.pressure_pa() - STANDARD_PRESSURE_PA).abs() < 1e-6);
    }

    #[test]
    fn negative_flow_rejected() {
        assert!(Stream::from_flows(vec![1.0, -1.0]).is_err());
        let mut s = Stream::new(2);
        assert!(s.set_flow(ChemicalId::from_index(0), -3.0).is_err());
        assert!(s.set_flow(ChemicalId::from_index(5), 3.0).is_err());
    }

    #[test]
    fn mass_and_fractions() {
        let c = chems();
        let s = Stream::from_flows(vec![2.0, 1.0]).unwrap();
        assert!((s.mass_flow(&c) - 82.0).abs() < 1e-12);
        let water = c.require("Water").unwrap();
        assert!((s.mole_fraction(water) - 2.0 / 3.0).abs() < 1e-12);
        assert!((s.mass_fraction(&c, water) - 36.0 / 82.0).abs() < 1e-12);
        assert_eq!(Stream::new(2).mass_fraction(&c, water), 0.0);
    }

    #[test]
    fn mixing_weights_temperature_by_flow() {
        let a = Stream::from_flows(vec![1.0, 0.0])
            .unwrap()
            .with_temperature_k(300.0)
            .unwrap();
        let b = Stream::from_flows(vec![0.0, 3.0])
            .unwrap()
            .with_temperature_k(400.0)
            .unwrap()
            .with_pressure_pa(2e5)
            .unwrap()
            .with_phase(Phase::Vapor);
        let mut out = Stream::new(2);
        out.mix_from(&[&a, &b]).unwrap();
        assert_eq!(out.flows(), &[1.0, 3.0]);
        assert!((out.temperature_k() - 375.0).abs() < 1e-9);
        assert!((out.pressure_pa() - STANDARD_PRESSURE_PA).abs() < 1e-6);
        assert_eq!(out.phase(), Phase::Mixed);
    }

    #[test]
    fn assign_keeps_price() {
        let mut target = Stream::new(2).with_price(0.5);
        let source = Stream::from_flows(vec![4.0, 1.0])
            .unwrap()
            .with_price(9.0);
        target.assign(&source).unwrap();
        assert_eq!(target.flows(), &[4.0, 1.0]);
        assert_eq!(target.price(), Some(0.5));
        assert!(target.assign(&Stream::new(3)).is_err());
    }

    #[test]
    fn cost_rate_uses_mass_flow() {
        let c = chems();
        let s = Stream::from_flows(vec![1.0, 1.0]).unwrap().with_price(2.0);
        assert!((s.cost_rate(&c) - 128.0).abs() < 1e-12);
        assert_eq!(Stream::from_flows(vec![1.0, 1.0]).unwrap().cost_rate(&c), 0.0);
    }

    #[test]
    fn scale_rejects_negative() {
        let mut s = Stream::from_flows(vec![2.0, 4.0]).unwrap();
        s.scale(0.5).unwrap();
        assert_eq!(s.flows(), &[1.0, 2.0]);
        assert!(s.scale(-1.0).is_err());
    }
}
