//! Convergence options attached to systems.

use rf_core::Real;
use rf_stream::StreamTolerance;

/// Tear-stream update rule between iterations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConvergenceMethod {
    /// Plain successive substitution.
    #[default]
    FixedPoint,
    /// Component-wise Aitken delta-squared extrapolation.
    Aitken,
    /// Bounded Wegstein acceleration.
    Wegstein,
}

impl ConvergenceMethod {
    pub fn name(self) -> &'static str {
        match self {
            ConvergenceMethod::FixedPoint => "fixed-point",
            ConvergenceMethod::Aitken => "aitken",
            ConvergenceMethod::Wegstein => "wegstein",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "fixed-point" | "fixed_point" | "FixedPoint" => Some(ConvergenceMethod::FixedPoint),
            "aitken" | "Aitken" => Some(ConvergenceMethod::Aitken),
            "wegstein" | "Wegstein" => Some(ConvergenceMethod::Wegstein),
            _ => None,
        }
    }
}

/// Options for converging one System's recycle loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConvergenceOptions {
    pub max_iterations: usize,
    /// Absolute molar flow tolerance [kmol/h].
    pub molar_tolerance: Real,
    /// Relative molar flow tolerance [-].
    pub relative_tolerance: Real,
    /// Temperature tolerance [K].
    pub temperature_tolerance: Real,
    pub method: ConvergenceMethod,
    /// Plain substitutions before acceleration kicks in.
    pub acceleration_delay: usize,
}

impl Default for ConvergenceOptions {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            molar_tolerance: 1.0,
            relative_tolerance: 0.01,
            temperature_tolerance: 0.10,
            method: ConvergenceMethod::FixedPoint,
            acceleration_delay: 3,
        }
    }
}

impl ConvergenceOptions {
    pub fn with_max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n;
        self
    }

    pub fn with_method(mut self, method: ConvergenceMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_molar_tolerance(mut self, tol: Real) -> Self {
        self.molar_tolerance = tol;
        self
    }

    pub fn with_relative_tolerance(mut self, tol: Real) -> Self {
        self.relative_tolerance = tol;
        self
    }

    pub fn with_temperature_tolerance(mut self, tol: Real) -> Self {
        self.temperature_tolerance = tol;
        self
    }

    pub fn with_acceleration_delay(mut self, n: usize) -> Self {
        self.acceleration_delay = n;
        self
    }

    pub fn stream_tolerance(&self) -> StreamTolerance {
        StreamTolerance {
            molar: self.molar_tolerance,
            relative: self.relative_tolerance,
            temperature: self.temperature_tolerance,
        }
    }

    /// Reason the options are unusable, if any.
    pub fn check(&self) -> Option<&'static str> {
        if self.max_iterations == 0 {
            return Some("max_iterations must be at least 1");
        }
        let tols = [
            self.molar_tolerance,
            self.relative_tolerance,
            self.temperature_tolerance,
        ];
        if tols.iter().any(|t| !t.is_finite() || *t < 0.0) {
            return Some("tolerances must be finite and non-negative");
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let o = ConvergenceOptions::default();
        assert_eq!(o.max_iterations, 200);
        assert_eq!(o.method, ConvergenceMethod::FixedPoint);
        assert_eq!(o.stream_tolerance(), StreamTolerance::default());
        assert!(o.check().is_none());
    }

    #[test]
    fn rejects_bad_values() {
        assert!(ConvergenceOptions::default().with_max_iterations(0).check().is_some());
        assert!(
            ConvergenceOptions::default()
                .with_molar_tolerance(-1.0)
                .check()
                .is_some()
        );
    }

    #[test]
    fn method_names_round_trip() {
        for m in [
            ConvergenceMethod::FixedPoint,
            ConvergenceMethod::Aitken,
            ConvergenceMethod::Wegstein,
        ] {
            assert_eq!(ConvergenceMethod::from_name(m.name()), Some(m));
        }
        assert_eq!(ConvergenceMethod::from_name("newton"), None);
    }
}
