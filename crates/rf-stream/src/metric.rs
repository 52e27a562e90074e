//! Stream difference metric used for recycle convergence checks.
//!
//! A chemical's flow is considered unchanged when its absolute change is within
//! `molar` OR its relative change is within `relative`; the absolute test keeps
//! trace chemicals from blocking convergence. Temperature is compared in kelvin.

use rf_core::numeric::{Tolerances, nearly_equal, relative_change};
use rf_core::Real;

use crate::stream::Stream;

/// Allowed change of a stream between successive iterations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamTolerance {
    /// Absolute molar flow change [kmol/h].
    pub molar: Real,
    /// Relative molar flow change [-].
    pub relative: Real,
    /// Absolute temperature change [K].
    pub temperature: Real,
}

impl StreamTolerance {
    /// The per-chemical flow test.
    pub fn flow(&self) -> Tolerances {
        Tolerances {
            abs: self.molar,
            rel: self.relative,
        }
    }
}

impl Default for StreamTolerance {
    fn default() -> Self {
        Self {
            molar: 1.0,
            relative: 0.01,
            temperature: 0.10,
        }
    }
}

/// Change of one chemical's flow.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowChange {
    pub before: Real,
    pub after: Real,
}

impl FlowChange {
    pub fn absolute(&self) -> Real {
        (self.after - self.before).abs()
    }

    pub fn relative(&self) -> Real {
        relative_change(self.before, self.after)
    }

    fn within(&self, tol: &StreamTolerance) -> bool {
        nearly_equal(self.before, self.after, tol.flow())
    }
}

/// Per-chemical and thermal change between two stream values.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamDifference {
    pub flows: Vec<FlowChange>,
    pub temperature: Real,
}

impl StreamDifference {
    pub fn within(&self, tol: &StreamTolerance) -> bool {
        self.temperature <= tol.temperature && self.flows.iter().all(|c| c.within(tol))
    }

    pub fn max_absolute(&self) -> Real {
        self.flows.iter().map(FlowChange::absolute).fold(0.0, Real::max)
    }

    pub fn max_relative(&self) -> Real {
        self.flows.iter().map(FlowChange::relative).fold(0.0, Real::max)
    }

    /// Largest relative change among chemicals that fail the absolute test.
    ///
    /// This is the number reported when a loop does not converge; the
    /// temperature change is reported beside it.
    pub fn deviation(&self, tol: &StreamTolerance) -> Real {
        self.flows
            .iter()
            .filter(|c| c.absolute() > tol.molar)
            .map(FlowChange::relative)
            .fold(0.0, Real::max)
    }
}

/// Compare two stream values. Missing entries (layout mismatch) count as zero flow.
pub fn difference(a: &Stream, b: &Stream) -> StreamDifference {
    let n = a.len().max(b.len());
    let flows = (0..n)
        .map(|i| {
            FlowChange {
                before: a.flows().get(i).copied().unwrap_or(0.0),
                after: b.flows().get(i).copied().unwrap_or(0.0),
            }
        })
        .collect();
    StreamDifference {
        flows,
        temperature: (a.temperature_k() - b.temperature_k()).abs(),
    }
}

/// Non-negative scalar distance: the largest absolute molar flow change.
pub fn distance(a: &Stream, b: &Stream) -> Real {
    difference(a, b).max_absolute()
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn distance_is_symmetric_and_nonnegative(
            a in prop::collection::vec(0.0_f64..1e4, 1..6),
            b in prop::collection::vec(0.0_f64..1e4, 1..6),
        ) {
            let sa = Stream::from_flows(a).unwrap();
            let sb = Stream::from_flows(b).unwrap();
            let d1 = distance(&sa, &sb);
            let d2 = distance(&sb, &sa);
            prop_assert!(d1 >= 0.0);
            prop_assert!((d1 - d2).abs() < 1e-12);
        }
    }
}
