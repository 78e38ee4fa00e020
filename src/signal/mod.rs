//! Input signal container and its noise model.
//!
//! A [`Signal`] is an ordered, validated series of `(position, amplitude)`
//! samples. Positions must be finite and strictly increasing; spacing may be
//! non-uniform. The [`NoiseModel`] states how the per-sample standard
//! deviation is known: as a constant, per sample, or estimated from the
//! background scatter by the pipeline itself.

pub mod io;

use crate::error::{EstimateError, EstimateResultOf};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// How the per-sample noise σ is known.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NoiseModel {
    /// Same σ for every sample.
    Constant(f64),
    /// One σ per sample, aligned with the amplitudes.
    PerSample(Vec<f64>),
    /// Unknown; taken from the residual scatter of the background region.
    #[default]
    Estimated,
}

/// Immutable, validated 1-D signal.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Signal {
    positions: Vec<f64>,
    values: Vec<f64>,
    noise: NoiseModel,
}

impl Signal {
    /// Build a signal, rejecting inconsistent or non-finite input.
    pub fn new(positions: Vec<f64>, values: Vec<f64>, noise: NoiseModel) -> EstimateResultOf<Self> {
        if positions.len() != values.len() {
            return Err(EstimateError::InvalidSignal(format!(
                "{} positions but {} amplitudes",
                positions.len(),
                values.len()
            )));
        }
        if positions.len() < 2 {
            return Err(EstimateError::InvalidSignal(format!(
                "need at least 2 samples, got {}",
                positions.len()
            )));
        }
        if let Some(i) = positions.iter().position(|x| !x.is_finite()) {
            return Err(EstimateError::InvalidSignal(format!(
                "non-finite position at index {i}"
            )));
        }
        if let Some(i) = values.iter().position(|y| !y.is_finite()) {
            return Err(EstimateError::InvalidSignal(format!(
                "non-finite amplitude at index {i}"
            )));
        }
        if let Some(i) = positions.windows(2).position(|w| w[1] <= w[0]) {
            return Err(EstimateError::InvalidSignal(format!(
                "positions must be strictly increasing (index {})",
                i + 1
            )));
        }
        match &noise {
            NoiseModel::Constant(sigma) => {
                if !sigma.is_finite() || *sigma < 0.0 {
                    return Err(EstimateError::InvalidSignal(format!(
                        "noise sigma must be finite and >= 0, got {sigma}"
                    )));
                }
            }
            NoiseModel::PerSample(sigmas) => {
                if sigmas.len() != values.len() {
                    return Err(EstimateError::InvalidSignal(format!(
                        "{} noise entries for {} samples",
                        sigmas.len(),
                        values.len()
                    )));
                }
                if let Some(i) = sigmas.iter().position(|s| !s.is_finite() || *s < 0.0) {
                    return Err(EstimateError::InvalidSignal(format!(
                        "noise sigma at index {i} must be finite and >= 0"
                    )));
                }
            }
            NoiseModel::Estimated => {}
        }
        Ok(Self {
            positions,
            values,
            noise,
        })
    }

    /// Like [`Signal::new`], but first drops samples whose position or
    /// amplitude is NaN (acquisition gaps).
    pub fn from_raw(positions: &[f64], values: &[f64], noise: NoiseModel) -> EstimateResultOf<Self> {
        if positions.len() != values.len() {
            return Err(EstimateError::InvalidSignal(format!(
                "{} positions but {} amplitudes",
                positions.len(),
                values.len()
            )));
        }
        let keep: Vec<usize> = (0..positions.len())
            .filter(|&i| !positions[i].is_nan() && !values[i].is_nan())
            .collect();
        let xs = keep.iter().map(|&i| positions[i]).collect();
        let ys = keep.iter().map(|&i| values[i]).collect();
        let noise = match noise {
            NoiseModel::PerSample(sigmas) if sigmas.len() == positions.len() => {
                NoiseModel::PerSample(keep.iter().map(|&i| sigmas[i]).collect())
            }
            other => other,
        };
        Self::new(xs, ys, noise)
    }

    /// Convenience constructor for uniformly sampled data starting at `x0`.
    pub fn uniform(x0: f64, dx: f64, values: Vec<f64>, noise: NoiseModel) -> EstimateResultOf<Self> {
        let positions = (0..values.len()).map(|i| x0 + dx * i as f64).collect();
        Self::new(positions, values, noise)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    pub fn positions(&self) -> &[f64] {
        &self.positions
    }

    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    #[inline]
    pub fn noise(&self) -> &NoiseModel {
        &self.noise
    }

    /// First and last sample position.
    pub fn domain(&self) -> (f64, f64) {
        (self.positions[0], self.positions[self.positions.len() - 1])
    }

    pub fn span(&self) -> f64 {
        let (lo, hi) = self.domain();
        hi - lo
    }

    pub fn mean_spacing(&self) -> f64 {
        self.span() / (self.len() - 1) as f64
    }

    /// Known σ of sample `i`, or `None` when the noise must be estimated.
    #[inline]
    pub fn sigma_at(&self, i: usize) -> Option<f64> {
        match &self.noise {
            NoiseModel::Constant(sigma) => Some(*sigma),
            NoiseModel::PerSample(sigmas) => Some(sigmas[i]),
            NoiseModel::Estimated => None,
        }
    }

    /// Whether the noise model states σ for every sample.
    #[inline]
    pub fn has_known_noise(&self) -> bool {
        !matches!(self.noise, NoiseModel::Estimated)
    }

    /// Index range of samples with `lo <= x <= hi`.
    pub fn index_range(&self, lo: f64, hi: f64) -> Range<usize> {
        let start = self.positions.partition_point(|&x| x < lo);
        let end = self.positions.partition_point(|&x| x <= hi);
        start..end.max(start)
    }
}
