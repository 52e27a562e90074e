//! Stand-alone process specification host.

use rf_stream::{Chemicals, Stream};

use crate::common::{check_arity, mix_inlets};
use crate::error::UnitResult;
use crate::traits::{Arity, PortCount, UnitModel};

/// Copies its inlet to its outlet unchanged.
///
/// Used to place a specification at a point in a path where no physical
/// operation happens, e.g. adjusting an upstream feed before the stream moves on.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThrough;

impl UnitModel for PassThrough {
    fn kind(&self) -> &'static str {
        "PassThrough"
    }

    fn arity(&self) -> Arity {
        Arity::new(PortCount::Exactly(1), PortCount::Exactly(1))
    }

    fn run(&self, _chems: &Chemicals, ins: &[Stream], outs: &mut [Stream]) -> UnitResult<()> {
        check_arity(self.kind(), self.arity(), ins.len(), outs.len())?;
        mix_inlets(ins, &mut outs[0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copies_inlet() {
        let chems = Chemicals::from_pairs(&[("A", 1.0), ("B", 2.0)]).unwrap();
        let feed = Stream::from_flows(vec![3.0, 4.0])
            .unwrap()
            .with_temperature_k(310.0)
            .unwrap();
        let mut outs = vec![Stream::new(2)];
        PassThrough.run(&chems, &[feed.clone()], &mut outs).unwrap();
        assert_eq!(outs[0], feed);
    }
}
