//! Stream splitter.

use rf_core::Real;
use rf_stream::{Chemicals, Stream};

use crate::common::{check_arity, check_fraction, mix_inlets};
use crate::error::{UnitError, UnitResult};
use crate::traits::{Arity, PortCount, UnitModel};

/// How inlet flow is divided between the two outlets.
#[derive(Debug, Clone, PartialEq)]
pub enum SplitSpec {
    /// The same fraction of every chemical goes to the first outlet.
    Uniform(Real),
    /// One fraction per registered chemical.
    PerChemical(Vec<Real>),
}

/// Splits the mixed inlet into two outlets with identical thermal state.
///
/// Outlet 0 receives `split` of each chemical, outlet 1 the remainder.
#[derive(Debug, Clone, PartialEq)]
pub struct Splitter {
    spec: SplitSpec,
}

impl Splitter {
    pub fn uniform(split: Real) -> UnitResult<Self> {
        check_fraction(split, "split fraction")?;
        Ok(Self {
            spec: SplitSpec::Uniform(split),
        })
    }

    pub fn per_chemical(splits: Vec<Real>) -> UnitResult<Self> {
        if splits.is_empty() {
            return Err(UnitError::InvalidConfig {
                what: "per-chemical split needs at least one fraction".into(),
            });
        }
        for s in &splits {
            check_fraction(*s, "split fraction")?;
        }
        Ok(Self {
            spec: SplitSpec::PerChemical(splits),
        })
    }

    pub fn spec(&self) -> &SplitSpec {
        &self.spec
    }

    fn fraction(&self, i: usize) -> Real {
        match &self.spec {
            SplitSpec::Uniform(s) => *s,
            SplitSpec::PerChemical(v) => v[i],
        }
    }
}

impl UnitModel for Splitter {
    fn kind(&self) -> &'static str {
        "Splitter"
    }

    fn arity(&self) -> Arity {
        Arity::new(PortCount::AtLeast(1), PortCount::Exactly(2))
    }

    fn run(&self, chems: &Chemicals, ins: &[Stream], outs: &mut [Stream]) -> UnitResult<()> {
        check_arity(self.kind(), self.arity(), ins.len(), outs.len())?;
        if let SplitSpec::PerChemical(v) = &self.spec {
            if v.len() != chems.len() {
                return Err(UnitError::InvalidConfig {
                    what: format!(
                        "split has {} fractions for {} chemicals",
                        v.len(),
                        chems.len()
                    ),
                });
            }
        }

        let mut mixed = Stream::new(chems.len());
        mix_inlets(ins, &mut mixed)?;

        let (top, bottom) = outs.split_at_mut(1);
        top[0].assign(&mixed)?;
        bottom[0].assign(&mixed)?;
        for (i, total) in mixed.flows().iter().enumerate() {
            let s = self.fraction(i);
            top[0].flows_mut()[i] = s * total;
            bottom[0].flows_mut()[i] = (1.0 - s) * total;
        }
        Ok(())
    }

    fn parameters(&self) -> &'static [&'static str] {
        match self.spec {
            SplitSpec::Uniform(_) => &["split"],
            SplitSpec::PerChemical(_) => &[],
        }
    }

    fn parameter(&self, name: &str) -> UnitResult<Real> {
        match (&self.spec, name) {
            (SplitSpec::Uniform(s), "split") => Ok(*s),
            _ => Err(UnitError::UnknownParameter {
                kind: self.kind(),
                name: name.to_string(),
            }),
        }
    }

    fn set_parameter(&mut self, name: &str, value: Real) -> UnitResult<()> {
        match (&mut self.spec, name) {
            (SplitSpec::Uniform(s), "split") => {
                check_fraction(value, "split fraction")?;
                *s = value;
                Ok(())
            }
            _ => Err(UnitError::UnknownParameter {
                kind: "Splitter",
                name: name.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chems() -> Chemicals {
        Chemicals::from_pairs(&[("Water", 18.015), ("Glucose", 180.16)]).unwrap()
    }

    #[test]
    fn uniform_split_conserves_mass() {
        let feed = Stream::from_flows(vec![80.0, 20.0]).unwrap();
        let mut outs = vec![Stream::new(2), Stream::new(2)];
        Splitter::uniform(0.1)
            .unwrap()
            .run(&chems(), &[feed], &mut outs)
            .unwrap();
        assert!((outs[0].flow(rf_core::ChemicalId::from_index(0)) - 8.0).abs() < 1e-12);
        assert!((outs[0].total_flow() + outs[1].total_flow() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn per_chemical_split() {
        let feed = Stream::from_flows(vec![80.0, 20.0]).unwrap();
        let mut outs = vec![Stream::new(2), Stream::new(2)];
        Splitter::per_chemical(vec![1.0, 0.0])
            .unwrap()
            .run(&chems(), &[feed], &mut outs)
            .unwrap();
        assert_eq!(outs[0].flows(), &[80.0, 0.0]);
        assert_eq!(outs[1].flows(), &[0.0, 20.0]);
    }

    #[test]
    fn per_chemical_length_must_match() {
        let feed = Stream::from_flows(vec![1.0, 1.0]).unwrap();
        let mut outs = vec![Stream::new(2), Stream::new(2)];
        let sp = Splitter::per_chemical(vec![0.5]).unwrap();
        assert!(matches!(
            sp.run(&chems(), &[feed], &mut outs),
            Err(UnitError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn split_parameter_is_validated() {
        let mut sp = Splitter::uniform(0.5).unwrap();
        assert!(sp.has_parameter("split"));
        sp.set_parameter("split", 0.75).unwrap();
        assert_eq!(sp.parameter("split").unwrap(), 0.75);
        assert!(sp.set_parameter("split", 1.5).is_err());
        assert!(sp.set_parameter("ratio", 0.5).is_err());
        assert!(Splitter::uniform(-0.1).is_err());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn outlets_add_up_to_inlet(
            flows in prop::collection::vec(0.0_f64..1e4, 3),
            splits in prop::collection::vec(0.0_f64..=1.0, 3),
        ) {
            let chems = Chemicals::from_pairs(&[("A", 10.0), ("B", 20.0), ("C", 30.0)]).unwrap();
            let feed = Stream::from_flows(flows.clone()).unwrap();
            let mut outs = vec![Stream::new(3), Stream::new(3)];

            Splitter::per_chemical(splits.clone())
                .unwrap()
                .run(&chems, &[feed], &mut outs)
                .unwrap();

            for i in 0..3 {
                let (top, bottom) = (outs[0].flows()[i], outs[1].flows()[i]);
                prop_assert!(top >= 0.0 && bottom >= 0.0);
                prop_assert!((top + bottom - flows[i]).abs() <= 1e-9 * flows[i].max(1.0));
                prop_assert!((top - splits[i] * flows[i]).abs() <= 1e-9 * flows[i].max(1.0));
            }
        }
    }
}
