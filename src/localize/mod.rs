//! Gaussian localizer.
//!
//! Fits `A·exp(-(x-μ)²/2σ²) + B` to the raw signal to find roughly where the
//! feature is and how wide it is. The fit is advisory: the pipeline only
//! turns `(center, width)` into an integration window, it never integrates
//! the model curve.
//!
//! Stages:
//! 1. [`guess::initial_guess`] picks the extremal baseline-subtracted sample
//!    and reads the width off the half-maximum crossings.
//! 2. A pre-fit significance check rejects signals whose extremum does not
//!    stand out of the noise.
//! 3. [`lm::levenberg_marquardt`] refines all four parameters.
//! 4. The solution is checked for convergence, a usable width and a
//!    significant amplitude.

mod guess;
mod lm;
mod options;

pub use guess::InitialGuess;
pub use options::{LocalizerOptions, Polarity};

use crate::background::BackgroundModel;
use crate::error::{EstimateError, EstimateResultOf};
use crate::signal::Signal;
use log::debug;
use nalgebra::{Matrix4, Vector4};
use serde::Serialize;

/// Converged Gaussian-plus-offset fit with its parameter covariance.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GaussianFit {
    pub amplitude: f64,
    pub center: f64,
    /// Standard deviation σ of the Gaussian, always > 0.
    pub width: f64,
    pub offset: f64,
    /// Covariance in `[amplitude, center, width, offset]` order.
    pub covariance: Matrix4<f64>,
    pub chi2: f64,
    pub dof: usize,
    pub iterations: usize,
    pub initial: InitialGuess,
}

impl GaussianFit {
    /// Model value at `x`.
    pub fn evaluate(&self, x: f64) -> f64 {
        lm::gaussian(x, &self.params())
    }

    pub fn params(&self) -> Vector4<f64> {
        Vector4::new(self.amplitude, self.center, self.width, self.offset)
    }

    /// 1σ uncertainties of the four parameters.
    pub fn std_errors(&self) -> [f64; 4] {
        let mut out = [0.0; 4];
        for (k, v) in out.iter_mut().enumerate() {
            let var = self.covariance[(k, k)];
            *v = if var.is_nan() { f64::NAN } else { var.max(0.0).sqrt() };
        }
        out
    }

    pub fn reduced_chi2(&self) -> f64 {
        if self.dof == 0 {
            f64::NAN
        } else {
            self.chi2 / self.dof as f64
        }
    }
}

/// Reference per-sample noise σ: RMS of the known σ_i, otherwise the robust
/// scatter of the preliminary background.
pub fn reference_noise(signal: &Signal, bg: &BackgroundModel) -> f64 {
    if signal.has_known_noise() {
        let n = signal.len();
        let ss: f64 = (0..n).filter_map(|i| signal.sigma_at(i)).map(|s| s * s).sum();
        (ss / n as f64).sqrt()
    } else {
        bg.noise_sigma
    }
}

/// Locate the feature; `bg` is usually [`crate::background::preliminary`].
pub fn localize(
    signal: &Signal,
    bg: &BackgroundModel,
    opts: &LocalizerOptions,
) -> EstimateResultOf<GaussianFit> {
    let guess = guess::apply_hints(
        guess::initial_guess(signal, bg, opts.polarity),
        signal,
        bg,
        opts,
    );
    let noise = reference_noise(signal, bg);
    if !(guess.amplitude.abs() > opts.significance * noise) {
        debug!(
            "localize: extremum {:.3e} within {:.1} sigma of noise {:.3e}",
            guess.amplitude, opts.significance, noise
        );
        return Err(EstimateError::NoSignificantFeature {
            amplitude: guess.amplitude,
            noise_sigma: noise,
            threshold: opts.significance,
        });
    }
    debug!(
        "localize: guess amp={:.4e} center={:.6} width={:.6} offset={:.4e}",
        guess.amplitude, guess.center, guess.width, guess.offset
    );

    // Absolute weights only when every σ_i is known and positive; otherwise
    // the covariance is rescaled by the reduced χ².
    let weights: Option<Vec<f64>> = (0..signal.len())
        .map(|i| signal.sigma_at(i).filter(|&s| s > 0.0).map(|s| 1.0 / (s * s)))
        .collect();

    // Without absolute weights the amplitude error comes from the residual
    // scatter, which needs more samples than parameters.
    if weights.is_none() && signal.len() <= 4 {
        debug!("localize: {} unweighted samples cannot bound the amplitude", signal.len());
        return Err(EstimateError::NoSignificantFeature {
            amplitude: guess.amplitude,
            noise_sigma: f64::NAN,
            threshold: opts.significance,
        });
    }

    let p0 = Vector4::new(guess.amplitude, guess.center, guess.width, guess.offset);
    let outcome = lm::levenberg_marquardt(
        signal.positions(),
        signal.values(),
        weights.as_deref(),
        p0,
        opts.max_iterations,
        opts.tolerance,
        opts.initial_lambda,
    );
    let p = outcome.params;
    let attempted = [p[0], p[1], p[2], p[3]];

    if !outcome.converged || !p.iter().all(|v| v.is_finite()) || !outcome.chi2.is_finite() {
        return Err(EstimateError::FitDidNotConverge {
            iterations: outcome.iterations,
            params: attempted,
            chi2: outcome.chi2,
        });
    }

    let span = signal.span();
    if !(p[2] > 0.0) || p[2] > span {
        return Err(EstimateError::DegenerateWidth { width: p[2], span });
    }

    let dof = signal.len().saturating_sub(4);
    let inverse = outcome
        .normal
        .try_inverse()
        .ok_or_else(|| EstimateError::FitDidNotConverge {
            iterations: outcome.iterations,
            params: attempted,
            chi2: outcome.chi2,
        })?;
    let covariance = if weights.is_some() {
        inverse
    } else if dof > 0 {
        inverse * (outcome.chi2 / dof as f64)
    } else {
        inverse * f64::INFINITY
    };

    let var_amp = covariance[(0, 0)];
    if !amplitude_is_significant(p[0], var_amp, opts.significance) {
        return Err(EstimateError::NoSignificantFeature {
            amplitude: p[0],
            noise_sigma: var_amp.max(0.0).sqrt(),
            threshold: opts.significance,
        });
    }

    debug!(
        "localize: fit amp={:.4e} center={:.6} width={:.6} offset={:.4e} chi2={:.3e} iters={}",
        p[0], p[1], p[2], p[3], outcome.chi2, outcome.iterations
    );
    Ok(GaussianFit {
        amplitude: p[0],
        center: p[1],
        width: p[2],
        offset: p[3],
        covariance,
        chi2: outcome.chi2,
        dof,
        iterations: outcome.iterations,
        initial: guess,
    })
}

/// `|A| / σ_A >= threshold`. An undefined variance is never significant;
/// a zero variance (noise-free data) accepts any non-zero amplitude.
fn amplitude_is_significant(amplitude: f64, variance: f64, threshold: f64) -> bool {
    if !variance.is_finite() {
        return false;
    }
    let sigma = variance.max(0.0).sqrt();
    if sigma > 0.0 {
        amplitude.abs() / sigma >= threshold
    } else {
        amplitude != 0.0
    }
}
