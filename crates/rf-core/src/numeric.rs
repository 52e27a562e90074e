use crate::RfError;

/// Floating point type used throughout the engine
pub type Real = f64;

/// Absolute + relative tolerance pair
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

/// True when `a` and `b` agree within `tol.abs` OR within `tol.rel` of the
/// larger magnitude.
pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    diff <= tol.abs || diff <= tol.rel * a.abs().max(b.abs())
}

/// Relative change between two values, 0 when both are zero.
pub fn relative_change(old: Real, new: Real) -> Real {
    let scale = old.abs().max(new.abs());
    if scale == 0.0 {
        0.0
    } else {
        (new - old).abs() / scale
    }
}

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, RfError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(RfError::NonFinite { what, value: v })
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn relative_change_is_bounded(a in -1e6_f64..1e6, b in -1e6_f64..1e6) {
            let r = relative_change(a, b);
            prop_assert!(r >= 0.0);
            prop_assert!(r <= 2.0 + 1e-12);
            prop_assert!((r - relative_change(b, a)).abs() < 1e-12);
        }

        #[test]
        fn nearly_equal_is_symmetric(
            a in -1e4_f64..1e4,
            b in -1e4_f64..1e4,
            abs in 0.0_f64..10.0,
            rel in 0.0_f64..1.0,
        ) {
            let tol = Tolerances { abs, rel };
            prop_assert_eq!(nearly_equal(a, b, tol), nearly_equal(b, a, tol));
            prop_assert!(nearly_equal(a, a, tol));
        }
    }
}
