//! Fractional-conversion reactor.

use rf_core::{ChemicalId, Real};
use rf_stream::{Chemicals, Stream};

use crate::common::{check_arity, check_finite, check_fraction, mix_inlets};
use crate::error::{UnitError, UnitResult};
use crate::traits::{Arity, PortCount, UnitModel};

/// Converts a fraction of a limiting reactant according to a fixed stoichiometry.
///
/// The extent is `conversion * reactant_in / |nu_reactant|`; each chemical's
/// outlet flow changes by `nu_i * extent`. A reaction that would consume more
/// of a co-reactant than is present fails with `NonPhysical`.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    reactant: ChemicalId,
    stoichiometry: Vec<(ChemicalId, Real)>,
    conversion: Real,
}

impl Conversion {
    /// `stoichiometry` must contain the reactant with a negative coefficient.
    pub fn new(
        reactant: ChemicalId,
        stoichiometry: Vec<(ChemicalId, Real)>,
        conversion: Real,
    ) -> UnitResult<Self> {
        check_fraction(conversion, "conversion")?;
        for (_, nu) in &stoichiometry {
            check_finite(*nu, "stoichiometric coefficient")?;
        }
        let nu_reactant = stoichiometry
            .iter()
            .find(|(c, _)| *c == reactant)
            .map(|(_, nu)| *nu);
        match nu_reactant {
            Some(nu) if nu < 0.0 => {}
            _ => {
                return Err(UnitError::InvalidConfig {
                    what: "reactant must appear with a negative coefficient".into(),
                });
            }
        }
        Ok(Self {
            reactant,
            stoichiometry,
            conversion,
        })
    }

    pub fn reactant(&self) -> ChemicalId {
        self.reactant
    }

    pub fn conversion(&self) -> Real {
        self.conversion
    }

    fn reactant_coefficient(&self) -> Real {
        self.stoichiometry
            .iter()
            .find(|(c, _)| *c == self.reactant)
            .map_or(-1.0, |(_, nu)| *nu)
    }
}

impl UnitModel for Conversion {
    fn kind(&self) -> &'static str {
        "Conversion"
    }

    fn arity(&self) -> Arity {
        Arity::new(PortCount::AtLeast(1), PortCount::Exactly(1))
    }

    fn run(&self, chems: &Chemicals, ins: &[Stream], outs: &mut [Stream]) -> UnitResult<()> {
        check_arity(self.kind(), self.arity(), ins.len(), outs.len())?;
        for (c, _) in &self.stoichiometry {
            if c.slot() >= chems.len() {
                return Err(UnitError::InvalidConfig {
                    what: format!("chemical index {} outside registry", c.slot()),
                });
            }
        }

        let out = &mut outs[0];
        mix_inlets(ins, out)?;

        let extent = self.conversion * out.flow(self.reactant) / -self.reactant_coefficient();
        let flows = out.flows_mut();
        for (c, nu) in &self.stoichiometry {
            let f = &mut flows[c.slot()];
            *f += nu * extent;
            // Round-off on full conversion
            if *f < 0.0 && *f > -1e-9 {
                *f = 0.0;
            }
            if *f < 0.0 {
                return Err(UnitError::NonPhysical {
                    what: "reaction consumes more than the available flow",
                });
            }
        }
        Ok(())
    }

    fn parameters(&self) -> &'static [&'static str] {
        &["conversion"]
    }

    fn parameter(&self, name: &str) -> UnitResult<Real> {
        match name {
            "conversion" => Ok(self.conversion),
            _ => Err(UnitError::UnknownParameter {
                kind: self.kind(),
                name: name.to_string(),
            }),
        }
    }

    fn set_parameter(&mut self, name: &str, value: Real) -> UnitResult<()> {
        match name {
            "conversion" => {
                check_fraction(value, "conversion")?;
                self.conversion = value;
                Ok(())
            }
            _ => Err(UnitError::UnknownParameter {
                kind: self.kind(),
                name: name.to_string(),
            }),
        }
    }
}
