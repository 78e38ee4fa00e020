//! Failure conditions surfaced by the estimation pipeline.
//!
//! Every variant is recoverable by the caller: the signal is rejected with
//! enough detail to decide whether to retry with different parameters or to
//! pre-trim the input.

use serde::Serialize;
use thiserror::Error;

/// Result alias used throughout the pipeline stages.
pub type EstimateResultOf<T> = Result<T, EstimateError>;

#[derive(Clone, Debug, PartialEq, Error, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EstimateError {
    /// Signal arrays are inconsistent (length mismatch, non-finite values,
    /// non-increasing positions, negative noise).
    #[error("invalid signal: {0}")]
    InvalidSignal(String),

    /// Parameter combination that cannot produce a meaningful estimate.
    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    /// Not enough samples outside the excluded region to model the offset.
    #[error(
        "insufficient background data: {available} samples outside [{excluded_lo:.6}, {excluded_hi:.6}], need {required}"
    )]
    InsufficientBackgroundData {
        available: usize,
        required: usize,
        excluded_lo: f64,
        excluded_hi: f64,
    },

    /// Levenberg-Marquardt stopped without meeting the tolerance.
    #[error(
        "gaussian fit did not converge after {iterations} iterations (chi2={chi2:.6e}, params={params:?})"
    )]
    FitDidNotConverge {
        iterations: usize,
        /// Last attempted `[amplitude, center, width, offset]`.
        params: [f64; 4],
        chi2: f64,
    },

    /// The feature cannot be distinguished from noise.
    #[error(
        "no significant feature: amplitude {amplitude:.6e} vs noise {noise_sigma:.6e} (threshold {threshold:.2} sigma)"
    )]
    NoSignificantFeature {
        amplitude: f64,
        noise_sigma: f64,
        threshold: f64,
    },

    /// Fitted width is non-positive or exceeds the signal span.
    #[error("degenerate width {width:.6e} for signal span {span:.6e}")]
    DegenerateWidth { width: f64, span: f64 },

    /// Window does not overlap the sampled domain.
    #[error(
        "window [{lower:.6}, {upper:.6}] lies outside signal domain [{domain_min:.6}, {domain_max:.6}]"
    )]
    WindowOutOfDomain {
        lower: f64,
        upper: f64,
        domain_min: f64,
        domain_max: f64,
    },

    /// Window holds too few samples to integrate.
    #[error("window [{lower:.6}, {upper:.6}] contains {samples} samples, need {required}")]
    WindowTooNarrow {
        lower: f64,
        upper: f64,
        samples: usize,
        required: usize,
    },
}
