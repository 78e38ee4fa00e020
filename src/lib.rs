//! Model-independent pulse area estimation.
//!
//! Given a noisy, baseline-offset 1-D signal holding one pulse-like feature,
//! the crate returns the background-subtracted area of the feature and a
//! calibrated 1σ uncertainty, without any caller-supplied guess.
//!
//! The feature is *located* with a Gaussian fit but *measured* by integrating
//! the raw samples over a window derived from that fit, so the area does not
//! depend on the pulse actually being Gaussian.

// Public modules (stable-ish surface)
pub mod diagnostics;
pub mod error;
pub mod pipeline;
pub mod signal;
pub mod types;

// Stage modules, public so each step can be run and tested on its own.
pub mod background;
pub mod config;
pub mod integrate;
pub mod localize;
pub mod uncertainty;

// --- High-level re-exports -------------------------------------------------

pub use crate::error::EstimateError;
pub use crate::pipeline::{IntegratorParams, PulseIntegrator};
pub use crate::signal::{NoiseModel, Signal};
pub use crate::types::{EstimateFlag, EstimateResult};

pub use crate::diagnostics::{EstimationReport, PipelineTrace};

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```no_run
/// use pulse_integrator::prelude::*;
///
/// # fn main() {
/// let values: Vec<f64> = (0..200)
///     .map(|i| {
///         let x = i as f64 * 0.1;
///         0.5 + 2.0 * (-(x - 10.0).powi(2) / 0.5).exp()
///     })
///     .collect();
/// let signal = Signal::uniform(0.0, 0.1, values, NoiseModel::Constant(0.01)).unwrap();
/// let res = PulseIntegrator::default().estimate(&signal).unwrap();
/// println!("area = {:.4} ± {:.4}", res.integral, res.uncertainty);
/// # }
/// ```
pub mod prelude {
    pub use crate::{EstimateResult, IntegratorParams, NoiseModel, PulseIntegrator, Signal};
}

// --- Stage-level API (for tools & advanced users) ---------------------------

pub mod stages {
    pub use crate::background::{estimate as estimate_background, preliminary, BackgroundModel};
    pub use crate::integrate::{build_window, integrate, window_for_fit, IntegrationWindow};
    pub use crate::localize::{localize, GaussianFit};
    pub use crate::uncertainty::{propagate, UncertaintyBreakdown};
}
