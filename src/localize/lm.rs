//! Levenberg-Marquardt solver for the 4-parameter Gaussian-plus-offset model.
//!
//! Parameter vector order: `[amplitude, center, width, offset]`.

use nalgebra::{Matrix4, Vector4};

const LAMBDA_MIN: f64 = 1e-15;
const LAMBDA_MAX: f64 = 1e16;

/// State at the end of the iteration.
pub(crate) struct LmOutcome {
    pub params: Vector4<f64>,
    /// `JᵀWJ` evaluated at `params`.
    pub normal: Matrix4<f64>,
    pub chi2: f64,
    pub iterations: usize,
    pub converged: bool,
}

#[inline]
pub(crate) fn gaussian(x: f64, p: &Vector4<f64>) -> f64 {
    let d = x - p[1];
    p[0] * (-d * d / (2.0 * p[2] * p[2])).exp() + p[3]
}

#[inline]
fn value_and_gradient(x: f64, p: &Vector4<f64>) -> (f64, Vector4<f64>) {
    let (a, mu, s) = (p[0], p[1], p[2]);
    let d = x - mu;
    let e = (-d * d / (2.0 * s * s)).exp();
    let grad = Vector4::new(e, a * e * d / (s * s), a * e * d * d / (s * s * s), 1.0);
    (a * e + p[3], grad)
}

fn chi2(xs: &[f64], ys: &[f64], w: &impl Fn(usize) -> f64, p: &Vector4<f64>) -> f64 {
    (0..xs.len())
        .map(|i| {
            let r = ys[i] - gaussian(xs[i], p);
            w(i) * r * r
        })
        .sum()
}

fn normal_equations(
    xs: &[f64],
    ys: &[f64],
    w: &impl Fn(usize) -> f64,
    p: &Vector4<f64>,
) -> (Matrix4<f64>, Vector4<f64>) {
    let mut jtj = Matrix4::zeros();
    let mut jtr = Vector4::zeros();
    for i in 0..xs.len() {
        let (f, g) = value_and_gradient(xs[i], p);
        let wi = w(i);
        jtj += wi * g * g.transpose();
        jtr += wi * (ys[i] - f) * g;
    }
    (jtj, jtr)
}

/// Minimise `Σ w_i (y_i - f(x_i; p))²` starting at `p0`.
///
/// Every trial step, accepted or not, counts towards `max_iterations`.
/// When the damping saturates without improvement the current point is
/// reported as converged: no representable step lowers χ² any further.
pub(crate) fn levenberg_marquardt(
    xs: &[f64],
    ys: &[f64],
    weights: Option<&[f64]>,
    p0: Vector4<f64>,
    max_iterations: usize,
    tolerance: f64,
    initial_lambda: f64,
) -> LmOutcome {
    let w = |i: usize| weights.map_or(1.0, |w| w[i]);
    let mut p = p0;
    let mut lambda = initial_lambda;
    let mut current = chi2(xs, ys, &w, &p);
    let (mut jtj, mut jtr) = normal_equations(xs, ys, &w, &p);
    let mut converged = false;
    let mut iterations = 0usize;

    while iterations < max_iterations {
        iterations += 1;

        let mut damped = jtj;
        for k in 0..4 {
            let d = jtj[(k, k)];
            damped[(k, k)] = d + lambda * (if d > 0.0 { d } else { 1.0 });
        }
        let step = damped.cholesky().map(|c| c.solve(&jtr));
        let trial = step.map(|delta| (delta, p + delta));
        let accepted = match trial {
            Some((delta, candidate)) if candidate.iter().all(|v| v.is_finite()) => {
                let next = chi2(xs, ys, &w, &candidate);
                if next.is_finite() && next <= current {
                    Some((delta, candidate, next))
                } else {
                    None
                }
            }
            _ => None,
        };

        match accepted {
            Some((delta, candidate, next)) => {
                let small_step = (0..4).all(|k| delta[k].abs() <= tolerance * (p[k].abs() + tolerance));
                // χ² stalls are only trusted close to the Gauss-Newton regime.
                let small_gain = lambda < 1.0 && current - next <= tolerance * current;
                p = candidate;
                current = next;
                lambda = (lambda / 10.0).max(LAMBDA_MIN);
                (jtj, jtr) = normal_equations(xs, ys, &w, &p);
                if small_step || small_gain {
                    converged = true;
                    break;
                }
            }
            None => {
                lambda *= 10.0;
                if lambda > LAMBDA_MAX {
                    converged = true;
                    break;
                }
            }
        }
    }

    LmOutcome {
        params: p,
        normal: jtj,
        chi2: current,
        iterations,
        converged,
    }
}
