//! Bounded scalar root finding for process specifications.
//!
//! Both solvers count objective evaluations, stop after `max_iterations`
//! iterations and never fail on their own: a search that does not meet its
//! tolerances returns a [`RootSolution`] whose status says why. Errors from the
//! objective itself are passed through unchanged.
//!
//! A non-finite objective value marks its trial point as outside the
//! variable's domain. The search stops there with [`RootStatus::OutOfDomain`]
//! and reports the last point that had a finite value.

use std::fmt;

use rf_core::Real;
use thiserror::Error;

/// How a search ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootStatus {
    Converged,
    MaxIterations,
    /// Bracket ends have the same sign and bounds are checked.
    NoSignChange,
    /// Secant slope vanished.
    Stalled,
    /// A trial point was rejected (non-finite objective).
    OutOfDomain,
}

impl fmt::Display for RootStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RootStatus::Converged => "converged",
            RootStatus::MaxIterations => "iteration limit reached",
            RootStatus::NoSignChange => "bracket does not change sign",
            RootStatus::Stalled => "secant slope vanished",
            RootStatus::OutOfDomain => "trial value outside the variable's domain",
        };
        f.write_str(s)
    }
}

/// Tolerances and limits shared by both solvers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RootOptions {
    pub xtol: Real,
    pub ytol: Real,
    pub max_iterations: usize,
}

/// Result of a search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RootSolution {
    /// Best estimate of the root.
    pub x: Real,
    /// Objective at `x`.
    pub fx: Real,
    /// Last value the objective was evaluated at with a finite result.
    /// NaN when no trial was accepted.
    pub last_x: Real,
    pub iterations: usize,
    pub evaluations: usize,
    pub status: RootStatus,
}

impl RootSolution {
    pub fn converged(&self) -> bool {
        self.status == RootStatus::Converged
    }

    pub fn into_result(self) -> Result<RootSolution, RootFindingError> {
        if self.converged() {
            Ok(self)
        } else {
            Err(RootFindingError {
                status: self.status,
                last_x: self.last_x,
                residual: self.fx,
                evaluations: self.evaluations,
            })
        }
    }
}

/// A search that ended without meeting its tolerances.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{status} after {evaluations} evaluations (last x = {last_x}, residual = {residual})")]
pub struct RootFindingError {
    pub status: RootStatus,
    pub last_x: Real,
    pub residual: Real,
    pub evaluations: usize,
}

/// Counts evaluations and remembers the last accepted point.
struct Counted<F> {
    f: F,
    evaluations: usize,
    last_x: Real,
}

impl<F, E> Counted<F>
where
    F: FnMut(Real) -> Result<Real, E>,
{
    fn new(f: F) -> Self {
        Self {
            f,
            evaluations: 0,
            last_x: Real::NAN,
        }
    }

    fn eval(&mut self, x: Real) -> Result<Real, E> {
        self.evaluations += 1;
        let fx = (self.f)(x)?;
        if fx.is_finite() {
            self.last_x = x;
        }
        Ok(fx)
    }

    /// Stop at the last accepted point after a rejected trial.
    fn rejected(&self, best: (Real, Real), iterations: usize) -> RootSolution {
        self.finish(best.0, best.1, iterations, RootStatus::OutOfDomain)
    }

    fn finish(&self, x: Real, fx: Real, iterations: usize, status: RootStatus) -> RootSolution {
        RootSolution {
            x,
            fx,
            last_x: self.last_x,
            iterations,
            evaluations: self.evaluations,
            status,
        }
    }
}

/// Secant search from `x0`, `x1`, with Aitken extrapolation over successive
/// iterates whenever it improves the residual.
pub fn secant<F, E>(f: F, x0: Real, x1: Real, opts: &RootOptions) -> Result<RootSolution, E>
where
    F: FnMut(Real) -> Result<Real, E>,
{
    let mut f = Counted::new(f);
    let f0 = f.eval(x0)?;
    if !f0.is_finite() {
        return Ok(f.rejected((Real::NAN, Real::NAN), 0));
    }
    if f0.abs() <= opts.ytol {
        return Ok(f.finish(x0, f0, 0, RootStatus::Converged));
    }
    let f1 = f.eval(x1)?;
    if !f1.is_finite() {
        return Ok(f.rejected((x0, f0), 0));
    }
    secant_from(&mut f, (x0, f0), (x1, f1), opts)
}

fn secant_from<F, E>(
    f: &mut Counted<F>,
    (mut x0, mut f0): (Real, Real),
    (mut x1, mut f1): (Real, Real),
    opts: &RootOptions,
) -> Result<RootSolution, E>
where
    F: FnMut(Real) -> Result<Real, E>,
{
    if f1.abs() <= opts.ytol {
        return Ok(f.finish(x1, f1, 0, RootStatus::Converged));
    }
    if f0.abs() < f1.abs() {
        std::mem::swap(&mut x0, &mut x1);
        std::mem::swap(&mut f0, &mut f1);
    }

    for iteration in 1..=opts.max_iterations {
        if f1 == f0 {
            return Ok(f.finish(x1, f1, iteration, RootStatus::Stalled));
        }
        let mut x2 = x1 - f1 * (x1 - x0) / (f1 - f0);
        if !x2.is_finite() {
            return Ok(f.finish(x1, f1, iteration, RootStatus::Stalled));
        }
        let mut f2 = f.eval(x2)?;
        if !f2.is_finite() {
            return Ok(f.rejected((x1, f1), iteration));
        }

        // Aitken delta-squared over x0, x1, x2
        let denom = x2 - 2.0 * x1 + x0;
        if f2.abs() > opts.ytol && denom.abs() > Real::EPSILON * x2.abs().max(1.0) {
            let xa = x2 - (x2 - x1).powi(2) / denom;
            if xa.is_finite() && (xa - x2).abs() > opts.xtol {
                let fa = f.eval(xa)?;
                if fa.is_finite() && fa.abs() < f2.abs() {
                    x2 = xa;
                    f2 = fa;
                }
            }
        }

        let step = (x2 - x1).abs();
        x0 = x1;
        f0 = f1;
        x1 = x2;
        f1 = f2;
        if f1.abs() <= opts.ytol || step <= opts.xtol {
            return Ok(f.finish(x1, f1, iteration, RootStatus::Converged));
        }
    }
    Ok(f.finish(x1, f1, opts.max_iterations, RootStatus::MaxIterations))
}

/// Bracketed search on `[lower, upper]`: inverse quadratic interpolation with
/// secant and bisection fallbacks (Brent's method).
///
/// When the ends do not bracket a sign change, `check_bounds` decides between
/// reporting `NoSignChange` and continuing with a secant search from the ends.
pub fn bracketed<F, E>(
    f: F,
    lower: Real,
    upper: Real,
    check_bounds: bool,
    opts: &RootOptions,
) -> Result<RootSolution, E>
where
    F: FnMut(Real) -> Result<Real, E>,
{
    let mut f = Counted::new(f);
    let (mut a, mut b) = (lower, upper);
    let mut fa = f.eval(a)?;
    if !fa.is_finite() {
        return Ok(f.rejected((Real::NAN, Real::NAN), 0));
    }
    if fa.abs() <= opts.ytol {
        return Ok(f.finish(a, fa, 0, RootStatus::Converged));
    }
    let mut fb = f.eval(b)?;
    if !fb.is_finite() {
        return Ok(f.rejected((a, fa), 0));
    }
    if fb.abs() <= opts.ytol {
        return Ok(f.finish(b, fb, 0, RootStatus::Converged));
    }

    if fa.signum() == fb.signum() {
        if check_bounds {
            let (x, fx) = if fa.abs() < fb.abs() { (a, fa) } else { (b, fb) };
            return Ok(f.finish(x, fx, 0, RootStatus::NoSignChange));
        }
        return secant_from(&mut f, (a, fa), (b, fb), opts);
    }

    if fa.abs() < fb.abs() {
        std::mem::swap(&mut a, &mut b);
        std::mem::swap(&mut fa, &mut fb);
    }
    let (mut c, mut fc) = (a, fa);
    let mut d = c;
    let mut bisected = true;

    for iteration in 1..=opts.max_iterations {
        if fb.abs() <= opts.ytol || (b - a).abs() <= opts.xtol {
            return Ok(f.finish(b, fb, iteration - 1, RootStatus::Converged));
        }

        let mut s = if fa != fc && fb != fc {
            a * fb * fc / ((fa - fb) * (fa - fc))
                + b * fa * fc / ((fb - fa) * (fb - fc))
                + c * fa * fb / ((fc - fa) * (fc - fb))
        } else {
            b - fb * (b - a) / (fb - fa)
        };

        let lo = (3.0 * a + b) / 4.0;
        let outside = !((s > lo.min(b)) && (s < lo.max(b)));
        let slow = if bisected {
            (s - b).abs() >= (b - c).abs() / 2.0 || (b - c).abs() < opts.xtol
        } else {
            (s - b).abs() >= (c - d).abs() / 2.0 || (c - d).abs() < opts.xtol
        };
        if outside || slow || !s.is_finite() {
            s = (a + b) / 2.0;
            bisected = true;
        } else {
            bisected = false;
        }

        let fs = f.eval(s)?;
        if !fs.is_finite() {
            return Ok(f.rejected((b, fb), iteration));
        }
        d = c;
        c = b;
        fc = fb;
        if fa * fs < 0.0 {
            b = s;
            fb = fs;
        } else {
            a = s;
            fa = fs;
        }
        if fa.abs() < fb.abs() {
            std::mem::swap(&mut a, &mut b);
            std::mem::swap(&mut fa, &mut fb);
        }
    }

    let status = if fb.abs() <= opts.ytol || (b - a).abs() <= opts.xtol {
        RootStatus::Converged
    } else {
        RootStatus::MaxIterations
    };
    Ok(f.finish(b, fb, opts.max_iterations, status))
}
