//! Core traits for unit models.

use std::fmt;

use rf_core::Real;
use rf_stream::{Chemicals, Stream};

use crate::error::{UnitError, UnitResult};

/// Number of streams a unit accepts on one side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortCount {
    Exactly(usize),
    AtLeast(usize),
}

impl PortCount {
    pub fn accepts(self, n: usize) -> bool {
        match self {
            PortCount::Exactly(k) => n == k,
            PortCount::AtLeast(k) => n >= k,
        }
    }
}

impl fmt::Display for PortCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortCount::Exactly(k) => write!(f, "exactly {k}"),
            PortCount::AtLeast(k) => write!(f, "at least {k}"),
        }
    }
}

/// Inlet/outlet stream counts accepted by a unit model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arity {
    pub ins: PortCount,
    pub outs: PortCount,
}

impl Arity {
    pub const fn new(ins: PortCount, outs: PortCount) -> Self {
        Self { ins, outs }
    }
}

/// A unit operation: a deterministic map from inlet streams to outlet streams.
///
/// `run` must depend only on the inlet values and the model's parameters; the
/// convergence driver calls it any number of times and relies on that for
/// fixed-point iteration to be well defined.
pub trait UnitModel: Send + Sync + fmt::Debug {
    /// Model kind for diagnostics (e.g. "Mixer").
    fn kind(&self) -> &'static str;

    /// Accepted inlet/outlet counts, checked at flowsheet assembly.
    fn arity(&self) -> Arity;

    /// Compute outlet streams in place from inlet streams.
    ///
    /// Outlets hold their previous values on entry; models overwrite every
    /// field they are responsible for.
    fn run(&self, chems: &Chemicals, ins: &[Stream], outs: &mut [Stream]) -> UnitResult<()>;

    /// Names of scalar parameters that specifications may drive.
    fn parameters(&self) -> &'static [&'static str] {
        &[]
    }

    /// Read a scalar parameter.
    fn parameter(&self, name: &str) -> UnitResult<Real> {
        Err(UnitError::UnknownParameter {
            kind: self.kind(),
            name: name.to_string(),
        })
    }

    /// Write a scalar parameter; implementations validate the value.
    fn set_parameter(&mut self, name: &str, _value: Real) -> UnitResult<()> {
        Err(UnitError::UnknownParameter {
            kind: self.kind(),
            name: name.to_string(),
        })
    }

    /// Whether `name` is one of `parameters()`.
    fn has_parameter(&self, name: &str) -> bool {
        self.parameters().contains(&name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_count_accepts() {
        assert!(PortCount::Exactly(2).accepts(2));
        assert!(!PortCount::Exactly(2).accepts(3));
        assert!(PortCount::AtLeast(1).accepts(4));
        assert!(!PortCount::AtLeast(1).accepts(0));
        assert_eq!(PortCount::AtLeast(1).to_string(), "at least 1");
    }
}
