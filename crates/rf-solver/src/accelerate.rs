//! Tear-stream acceleration.
//!
//! A tear vector holds every recycle stream's molar flows followed by its
//! temperature. Given the guess `x` fed into a pass and the value `g(x)` the pass
//! computed, an accelerator proposes the next guess. Plain substitution returns
//! `g(x)`; Aitken and Wegstein extrapolate component-wise from the previous pair.

use nalgebra::DVector;

use rf_core::Real;
use rf_flowsheet::ConvergenceMethod;
use rf_stream::{Stream, StreamResult};

/// Bounds on the Wegstein factor `q`; negative values accelerate, zero is plain
/// substitution.
const WEGSTEIN_Q_MIN: Real = -5.0;
const WEGSTEIN_Q_MAX: Real = 0.0;

/// Stateful tear-vector accelerator for one convergence loop.
#[derive(Debug, Clone)]
pub struct Accelerator {
    method: ConvergenceMethod,
    delay: usize,
    steps: usize,
    previous: Option<(DVector<Real>, DVector<Real>)>,
}

impl Accelerator {
    pub fn new(method: ConvergenceMethod, delay: usize) -> Self {
        Self {
            method,
            delay,
            steps: 0,
            previous: None,
        }
    }

    /// Next guess from guess `x` and computed value `gx`.
    ///
    /// The first `delay` calls (and every call for fixed-point) return `gx`.
    pub fn next_guess(&mut self, x: &DVector<Real>, gx: &DVector<Real>) -> DVector<Real> {
        self.steps += 1;
        let accelerate = self.method != ConvergenceMethod::FixedPoint && self.steps > self.delay;
        let next = match &self.previous {
            Some((px, pgx)) if accelerate && px.len() == x.len() => match self.method {
                ConvergenceMethod::Aitken => aitken(px, pgx, x, gx),
                ConvergenceMethod::Wegstein => wegstein(px, pgx, x, gx),
                ConvergenceMethod::FixedPoint => gx.clone(),
            },
            _ => gx.clone(),
        };
        self.previous = Some((x.clone(), gx.clone()));
        next
    }
}

/// Secant on the residual `g(x) - x` per component (Aitken's delta-squared
/// applied to the substitution sequence).
fn aitken(
    px: &DVector<Real>,
    pgx: &DVector<Real>,
    x: &DVector<Real>,
    gx: &DVector<Real>,
) -> DVector<Real> {
    DVector::from_fn(x.len(), |i, _| {
        let r = gx[i] - x[i];
        let pr = pgx[i] - px[i];
        let denom = r - pr;
        if denom.abs() <= Real::EPSILON * (x[i].abs() + gx[i].abs()).max(1e-30) {
            return gx[i];
        }
        let next = x[i] - r * (x[i] - px[i]) / denom;
        if next.is_finite() { next } else { gx[i] }
    })
}

/// Wegstein: slope `s` of `g` per component, `q = s / (s - 1)` bounded,
/// next = `q x + (1 - q) g(x)`.
fn wegstein(
    px: &DVector<Real>,
    pgx: &DVector<Real>,
    x: &DVector<Real>,
    gx: &DVector<Real>,
) -> DVector<Real> {
    DVector::from_fn(x.len(), |i, _| {
        let dx = x[i] - px[i];
        if dx.abs() <= Real::EPSILON * x[i].abs().max(1e-30) {
            return gx[i];
        }
        let s = (gx[i] - pgx[i]) / dx;
        let q = if (s - 1.0).abs() > 1e-12 {
            (s / (s - 1.0)).clamp(WEGSTEIN_Q_MIN, WEGSTEIN_Q_MAX)
        } else {
            0.0
        };
        q * x[i] + (1.0 - q) * gx[i]
    })
}

/// Tear vector of `streams`: flows then temperature, per stream.
pub fn pack(streams: &[Stream]) -> DVector<Real> {
    let n: usize = streams.iter().map(|s| s.len() + 1).sum();
    DVector::from_iterator(
        n,
        streams.iter().flat_map(|s| {
            s.flows()
                .iter()
                .copied()
                .chain(std::iter::once(s.temperature_k()))
        }),
    )
}

/// Write a tear vector back into streams.
///
/// Flows are clamped at zero; a non-positive temperature keeps the computed one.
pub fn unpack(values: &DVector<Real>, streams: &mut [Stream]) -> StreamResult<()> {
    let mut offset = 0;
    for s in streams.iter_mut() {
        let n = s.len();
        for (i, f) in s.flows_mut().iter_mut().enumerate() {
            *f = values[offset + i].max(0.0);
        }
        let t = values[offset + n];
        if t.is_finite() && t > 0.0 {
            s.set_temperature_k(t)?;
        }
        offset += n + 1;
    }
    Ok(())
}
