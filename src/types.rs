use crate::background::BackgroundModel;
use crate::integrate::IntegrationWindow;
use crate::localize::GaussianFit;
use crate::uncertainty::UncertaintyBreakdown;
use serde::Serialize;

/// Conditions that do not invalidate the estimate but may bias it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EstimateFlag {
    /// Window clipped by the first sample.
    TruncatedLow,
    /// Window clipped by the last sample.
    TruncatedHigh,
}

/// Pulse area with its 1σ uncertainty and the intermediate products used.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateResult {
    /// Background-subtracted integral of the raw samples in the window.
    pub integral: f64,
    /// Combined 1σ uncertainty of `integral`.
    pub uncertainty: f64,
    pub breakdown: UncertaintyBreakdown,
    pub window: IntegrationWindow,
    pub background: BackgroundModel,
    /// Localization fit, for diagnostics only.
    pub fit: GaussianFit,
    pub flags: Vec<EstimateFlag>,
}

impl EstimateResult {
    pub fn is_truncated(&self) -> bool {
        self.window.is_truncated()
    }

    /// `(integral - truth) / uncertainty`; handy for coverage studies.
    pub fn pull(&self, truth: f64) -> f64 {
        (self.integral - truth) / self.uncertainty
    }

    /// Whether `truth` lies within `n` reported σ of the estimate.
    pub fn covers(&self, truth: f64, n: f64) -> bool {
        (self.integral - truth).abs() <= n * self.uncertainty
    }
}
