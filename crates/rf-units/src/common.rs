//! Common utilities for unit calculations.

use rf_core::numeric::ensure_finite;
use rf_core::Real;
use rf_stream::Stream;

use crate::error::{UnitError, UnitResult};
use crate::traits::Arity;

/// Ensure a value is finite, returning UnitError if not.
pub fn check_finite(value: Real, what: &'static str) -> UnitResult<()> {
    ensure_finite(value, what).map_err(|_| UnitError::NonPhysical { what })?;
    Ok(())
}

/// Ensure a fraction lies in [0, 1].
pub fn check_fraction(value: Real, what: &'static str) -> UnitResult<()> {
    check_finite(value, what)?;
    if !(0.0..=1.0).contains(&value) {
        return Err(UnitError::NonPhysical { what });
    }
    Ok(())
}

/// Check inlet/outlet counts against a model's arity.
pub fn check_arity(kind: &'static str, arity: Arity, ins: usize, outs: usize) -> UnitResult<()> {
    if !arity.ins.accepts(ins) {
        return Err(UnitError::Arity {
            kind,
            side: "inlet",
            expected: arity.ins.to_string(),
            actual: ins,
        });
    }
    if !arity.outs.accepts(outs) {
        return Err(UnitError::Arity {
            kind,
            side: "outlet",
            expected: arity.outs.to_string(),
            actual: outs,
        });
    }
    Ok(())
}

/// Validate every inlet and mix them into `target`.
pub fn mix_inlets(ins: &[Stream], target: &mut Stream) -> UnitResult<()> {
    for s in ins {
        s.validate()?;
    }
    let refs: Vec<&Stream> = ins.iter().collect();
    target.mix_from(&refs)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::PortCount;

    #[test]
    fn test_check_fraction() {
        assert!(check_fraction(0.0, "f").is_ok());
        assert!(check_fraction(1.0, "f").is_ok());
        assert!(check_fraction(1.01, "f").is_err());
        assert!(check_fraction(f64::NAN, "f").is_err());
    }

    #[test]
    fn test_check_arity() {
        let arity = Arity::new(PortCount::AtLeast(1), PortCount::Exactly(2));
        assert!(check_arity("Flash", arity, 1, 2).is_ok());
        assert!(matches!(
            check_arity("Flash", arity, 0, 2),
            Err(UnitError::Arity { side: "inlet", .. })
        ));
        assert!(matches!(
            check_arity("Flash", arity, 1, 1),
            Err(UnitError::Arity { side: "outlet", .. })
        ));
    }
}
