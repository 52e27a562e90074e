//! Stream mixer.

use rf_stream::{Chemicals, Stream};

use crate::common::{check_arity, mix_inlets};
use crate::error::UnitResult;
use crate::traits::{Arity, PortCount, UnitModel};

/// Adds all inlets into a single outlet.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mixer;

impl Mixer {
    pub fn new() -> Self {
        Self
    }
}

impl UnitModel for Mixer {
    fn kind(&self) -> &'static str {
        "Mixer"
    }

    fn arity(&self) -> Arity {
        Arity::new(PortCount::AtLeast(1), PortCount::Exactly(1))
    }

    fn run(&self, _chems: &Chemicals, ins: &[Stream], outs: &mut [Stream]) -> UnitResult<()> {
        check_arity(self.kind(), self.arity(), ins.len(), outs.len())?;
        mix_inlets(ins, &mut outs[0])
    }
}
