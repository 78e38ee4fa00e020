//! Background (offset) estimation.
//!
//! Two entry points:
//! - [`preliminary`] summarises the whole signal with a median level and a
//!   MAD-based noise scale, measured around a robust line when the baseline
//!   is linear. It only seeds the localizer and its significance check, so a
//!   pulse inside the data barely moves it.
//! - [`estimate`] builds the final [`BackgroundModel`] from the samples
//!   outside an excluded interval (normally the integration window) and
//!   reports the covariance of the level/slope estimate. That covariance is
//!   what the propagator turns into the correlated background term.

mod options;
pub(crate) mod stats;

pub use options::{BackgroundOptions, BaselineShape, LevelStatistic};

use crate::error::{EstimateError, EstimateResultOf};
use crate::signal::Signal;
use log::debug;
use nalgebra::{Matrix2, Vector2};
use serde::Serialize;
use std::f64::consts::FRAC_PI_2;

/// Baseline `level + slope * (x - reference)` with its estimation covariance.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackgroundModel {
    pub level: f64,
    pub slope: f64,
    /// Position at which `level` is quoted.
    pub reference: f64,
    /// Covariance of `(level, slope)`.
    pub covariance: Matrix2<f64>,
    /// Residual scatter of the background samples around the model.
    pub noise_sigma: f64,
    /// Number of samples the model was built from.
    pub samples: usize,
    /// Interval whose samples were left out, if any.
    pub excluded: Option<(f64, f64)>,
}

impl BackgroundModel {
    /// Baseline value at position `x`.
    #[inline]
    pub fn at(&self, x: f64) -> f64 {
        self.level + self.slope * (x - self.reference)
    }

    pub fn level_sigma(&self) -> f64 {
        self.covariance[(0, 0)].max(0.0).sqrt()
    }

    /// Variance of `Σ w_i b(x_i)` given `sum_w = Σ w_i` and
    /// `sum_w_dx = Σ w_i (x_i - reference)`.
    ///
    /// Every sample shares the same fitted coefficients, so the errors add
    /// coherently: a constant baseline contributes `sum_w² · var(level)`.
    pub fn integral_variance(&self, sum_w: f64, sum_w_dx: f64) -> f64 {
        let g = Vector2::new(sum_w, sum_w_dx);
        (g.transpose() * self.covariance * g)[(0, 0)].max(0.0)
    }
}

/// Robust whole-signal summary: median level and MAD noise, around a
/// pairwise-median line when `opts.shape` is [`BaselineShape::Linear`].
pub fn preliminary(signal: &Signal, opts: &BackgroundOptions) -> BackgroundModel {
    let xs = signal.positions();
    let values = signal.values();
    let n = values.len();
    let (lo, hi) = signal.domain();
    let reference = 0.5 * (lo + hi);

    let slope = match opts.shape {
        BaselineShape::Constant => 0.0,
        BaselineShape::Linear => robust_slope(xs, values),
    };
    let detrended: Vec<f64> = xs
        .iter()
        .zip(values)
        .map(|(&x, &y)| y - slope * (x - reference))
        .collect();
    let level = stats::median(&detrended);
    let noise_sigma = stats::mad(&detrended, level) * stats::MAD_TO_SIGMA;

    let level_var = FRAC_PI_2 * noise_sigma * noise_sigma / n as f64;
    let sxx: f64 = xs.iter().map(|x| (x - reference) * (x - reference)).sum();
    let slope_var = match opts.shape {
        BaselineShape::Constant => 0.0,
        BaselineShape::Linear => FRAC_PI_2 * noise_sigma * noise_sigma / sxx,
    };
    BackgroundModel {
        level,
        slope,
        reference,
        covariance: Matrix2::new(level_var, 0.0, 0.0, slope_var),
        noise_sigma,
        samples: n,
        excluded: None,
    }
}

/// Median of the slopes between samples half a record apart. A pulse
/// covering less than a quarter of the record cannot move it.
fn robust_slope(xs: &[f64], ys: &[f64]) -> f64 {
    let half = xs.len() / 2;
    let slopes: Vec<f64> = (0..xs.len() - half)
        .map(|i| (ys[i + half] - ys[i]) / (xs[i + half] - xs[i]))
        .collect();
    stats::median(&slopes)
}

/// Fit the baseline to samples outside `exclude` (inclusive bounds).
pub fn estimate(
    signal: &Signal,
    exclude: Option<(f64, f64)>,
    opts: &BackgroundOptions,
) -> EstimateResultOf<BackgroundModel> {
    let idx: Vec<usize> = match exclude {
        Some((lo, hi)) => (0..signal.len())
            .filter(|&i| {
                let x = signal.positions()[i];
                x < lo || x > hi
            })
            .collect(),
        None => (0..signal.len()).collect(),
    };
    let required = opts.required_samples();
    if idx.len() < required {
        let (dlo, dhi) = signal.domain();
        let (excluded_lo, excluded_hi) = exclude.unwrap_or((dlo, dhi));
        return Err(EstimateError::InsufficientBackgroundData {
            available: idx.len(),
            required,
            excluded_lo,
            excluded_hi,
        });
    }

    let xs: Vec<f64> = idx.iter().map(|&i| signal.positions()[i]).collect();
    let ys: Vec<f64> = idx.iter().map(|&i| signal.values()[i]).collect();
    let sigmas: Option<Vec<f64>> = idx.iter().map(|&i| signal.sigma_at(i)).collect();

    let model = match opts.shape {
        BaselineShape::Constant => {
            constant_model(&xs, &ys, sigmas.as_deref(), opts.statistic, exclude)
        }
        BaselineShape::Linear => linear_model(&xs, &ys, sigmas.as_deref(), exclude)?,
    };
    debug!(
        "background: level={:.6e} slope={:.3e} sigma_level={:.3e} noise={:.3e} n={}",
        model.level,
        model.slope,
        model.level_sigma(),
        model.noise_sigma,
        model.samples
    );
    Ok(model)
}

fn constant_model(
    xs: &[f64],
    ys: &[f64],
    sigmas: Option<&[f64]>,
    statistic: LevelStatistic,
    exclude: Option<(f64, f64)>,
) -> BackgroundModel {
    let n = ys.len() as f64;
    let sample_mean = stats::mean(ys);
    // Variance of the plain mean: propagated from known σ_i, else s²/n.
    let mean_var = |center: f64| match sigmas {
        Some(s) => s.iter().map(|v| v * v).sum::<f64>() / (n * n),
        None => stats::variance_about(ys, center, 1) / n,
    };
    let (level, var) = match statistic {
        LevelStatistic::Mean => (sample_mean, mean_var(sample_mean)),
        LevelStatistic::Median => {
            let med = stats::median(ys);
            (med, FRAC_PI_2 * mean_var(sample_mean))
        }
        LevelStatistic::TrimmedMean { fraction } => stats::trimmed_mean(ys, fraction),
    };
    BackgroundModel {
        level,
        slope: 0.0,
        reference: stats::mean(xs),
        covariance: Matrix2::new(var, 0.0, 0.0, 0.0),
        noise_sigma: stats::variance_about(ys, level, 1).sqrt(),
        samples: ys.len(),
        excluded: exclude,
    }
}

fn linear_model(
    xs: &[f64],
    ys: &[f64],
    sigmas: Option<&[f64]>,
    exclude: Option<(f64, f64)>,
) -> EstimateResultOf<BackgroundModel> {
    // Weighted least squares when every σ_i is positive, otherwise ordinary
    // least squares with a sandwich (known noise) or s²-scaled covariance.
    let weights: Option<Vec<f64>> = sigmas
        .filter(|s| s.iter().all(|&v| v > 0.0))
        .map(|s| s.iter().map(|v| 1.0 / (v * v)).collect());
    let w = |i: usize| weights.as_ref().map_or(1.0, |w| w[i]);

    let sum_w: f64 = (0..xs.len()).map(w).sum();
    let reference = (0..xs.len()).map(|i| w(i) * xs[i]).sum::<f64>() / sum_w;

    let mut normal = Matrix2::zeros();
    let mut rhs = Vector2::zeros();
    for i in 0..xs.len() {
        let a = Vector2::new(1.0, xs[i] - reference);
        normal += w(i) * a * a.transpose();
        rhs += w(i) * ys[i] * a;
    }
    let inv = normal
        .try_inverse()
        .ok_or_else(|| EstimateError::InsufficientBackgroundData {
            available: xs.len(),
            required: 3,
            excluded_lo: exclude.map_or(f64::NAN, |e| e.0),
            excluded_hi: exclude.map_or(f64::NAN, |e| e.1),
        })?;
    let coeffs = inv * rhs;

    let residuals: Vec<f64> = (0..xs.len())
        .map(|i| ys[i] - coeffs[0] - coeffs[1] * (xs[i] - reference))
        .collect();
    let s2 = stats::variance_about(&residuals, 0.0, 2);

    let covariance = match (sigmas, &weights) {
        (Some(_), Some(_)) => inv,
        (Some(s), None) => {
            let mut meat = Matrix2::zeros();
            for i in 0..xs.len() {
                let a = Vector2::new(1.0, xs[i] - reference);
                meat += s[i] * s[i] * a * a.transpose();
            }
            inv * meat * inv
        }
        (None, _) => inv * s2,
    };

    Ok(BackgroundModel {
        level: coeffs[0],
        slope: coeffs[1],
        reference,
        covariance,
        noise_sigma: s2.sqrt(),
        samples: xs.len(),
        excluded: exclude,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::NoiseModel;

    fn ramp_signal(noise: NoiseModel) -> Signal {
        let values = (0..100).map(|i| 2.0 + 0.01 * i as f64).collect();
        Signal::uniform(0.0, 1.0, values, noise).unwrap()
    }

    #[test]
    fn constant_mean_with_known_noise() {
        let signal = Signal::uniform(0.0, 1.0, vec![3.0; 50], NoiseModel::Constant(0.5)).unwrap();
        let bg = estimate(&signal, Some((10.0, 19.0)), &BackgroundOptions::default()).unwrap();
        assert_eq!(bg.samples, 40);
        assert!((bg.level - 3.0).abs() < 1e-12);
        let expected = 0.25 / 40.0;
        assert!((bg.covariance[(0, 0)] - expected).abs() < 1e-15);
        assert_eq!(bg.excluded, Some((10.0, 19.0)));
    }

    #[test]
    fn linear_model_recovers_drift() {
        let signal = ramp_signal(NoiseModel::Constant(0.1));
        let opts = BackgroundOptions {
            shape: BaselineShape::Linear,
            ..Default::default()
        };
        let bg = estimate(&signal, Some((40.0, 60.0)), &opts).unwrap();
        assert!((bg.slope - 0.01).abs() < 1e-10);
        assert!((bg.at(50.0) - 2.5).abs() < 1e-10);
        assert!(bg.covariance[(1, 1)] > 0.0);
    }

    #[test]
    fn too_few_samples_outside_exclusion() {
        let signal = ramp_signal(NoiseModel::Estimated);
        let err = estimate(&signal, Some((2.0, 97.0)), &BackgroundOptions::default())
            .expect_err("only 4 samples left");
        assert!(matches!(
            err,
            EstimateError::InsufficientBackgroundData {
                available: 4,
                required: 8,
                ..
            }
        ));
    }

    #[test]
    fn correlated_integral_variance_scales_with_square() {
        let bg = BackgroundModel {
            level: 0.0,
            slope: 0.0,
            reference: 0.0,
            covariance: Matrix2::new(0.01, 0.0, 0.0, 0.0),
            noise_sigma: 0.0,
            samples: 10,
            excluded: None,
        };
        assert!((bg.integral_variance(20.0, 0.0) - 4.0).abs() < 1e-12);
    }

    #[test]
    fn preliminary_is_robust_to_a_spike() {
        let mut values = vec![1.0; 99];
        values[50] = 1000.0;
        values.push(1.0);
        let signal = Signal::uniform(0.0, 1.0, values, NoiseModel::Estimated).unwrap();
        let bg = preliminary(&signal, &BackgroundOptions::default());
        assert_eq!(bg.level, 1.0);
        assert_eq!(bg.noise_sigma, 0.0);
    }

    #[test]
    fn linear_preliminary_follows_drift_under_a_pulse() {
        let values = (0..200)
            .map(|i| {
                let x = i as f64;
                0.5 + 0.03 * x + if (95..105).contains(&i) { 40.0 } else { 0.0 }
            })
            .collect();
        let signal = Signal::uniform(0.0, 1.0, values, NoiseModel::Estimated).unwrap();
        let opts = BackgroundOptions {
            shape: BaselineShape::Linear,
            ..Default::default()
        };
        let bg = preliminary(&signal, &opts);
        assert!((bg.slope - 0.03).abs() < 1e-12, "slope={}", bg.slope);
        assert!((bg.at(10.0) - 0.8).abs() < 1e-9);
        assert!(bg.noise_sigma < 1e-9);
        assert!(bg.covariance[(1, 1)] >= 0.0);
    }

    #[test]
    fn median_level_variance_is_pi_over_two_of_the_mean() {
        let n = 50;
        let signal = Signal::uniform(0.0, 1.0, vec![2.0; n], NoiseModel::Constant(0.4)).unwrap();
        let opts = BackgroundOptions {
            statistic: LevelStatistic::Median,
            ..Default::default()
        };
        let bg = estimate(&signal, None, &opts).unwrap();
        let expected = FRAC_PI_2 * 0.4 * 0.4 / n as f64;
        assert!((bg.covariance[(0, 0)] - expected).abs() < 1e-15);

        // Estimated noise: π/2 · s² / n around the sample mean.
        let values: Vec<f64> = (0..n).map(|i| (i % 5) as f64).collect();
        let signal = Signal::uniform(0.0, 1.0, values.clone(), NoiseModel::Estimated).unwrap();
        let bg = estimate(&signal, None, &opts).unwrap();
        assert_eq!(bg.level, 2.0);
        let mean = values.iter().sum::<f64>() / n as f64;
        let s2 = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
        let expected = FRAC_PI_2 * s2 / n as f64;
        assert!((bg.covariance[(0, 0)] - expected).abs() < 1e-12);
    }

    #[test]
    fn trimmed_mean_variance_uses_winsorized_spread() {
        // 0..19 trimmed by 10 %: two samples cut from each tail.
        let values: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let signal = Signal::uniform(0.0, 1.0, values, NoiseModel::Estimated).unwrap();
        let opts = BackgroundOptions {
            statistic: LevelStatistic::TrimmedMean { fraction: 0.1 },
            ..Default::default()
        };
        let bg = estimate(&signal, None, &opts).unwrap();
        assert!((bg.level - 9.5).abs() < 1e-12);

        let winsorized: Vec<f64> = (0..20).map(|i| (i as f64).clamp(2.0, 17.0)).collect();
        let wmean = winsorized.iter().sum::<f64>() / 20.0;
        let wvar = winsorized.iter().map(|v| (v - wmean).powi(2)).sum::<f64>() / 19.0;
        let expected = wvar / (0.8 * 0.8 * 20.0);
        assert!(
            (bg.covariance[(0, 0)] - expected).abs() < 1e-12,
            "{} vs {expected}",
            bg.covariance[(0, 0)]
        );
        assert!(expected > 0.0);
    }
}
