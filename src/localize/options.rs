use serde::{Deserialize, Serialize};

/// Expected sign of the excursion relative to the baseline.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Polarity {
    Positive,
    /// PMT/MCP style pulses going below the baseline.
    Negative,
    /// Whichever extremum is further from the baseline.
    #[default]
    Auto,
}

/// Parameters of the Gaussian localizer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalizerOptions {
    pub polarity: Polarity,
    /// Upper bound on trial steps of the Levenberg-Marquardt loop.
    pub max_iterations: usize,
    /// Relative tolerance on parameter steps and χ² reduction.
    pub tolerance: f64,
    /// Significance threshold in units of σ for accepting a feature.
    pub significance: f64,
    /// Starting damping factor.
    pub initial_lambda: f64,
    /// Optional caller knowledge of the feature position; replaces the
    /// extremum-derived center of the initial guess.
    pub center_hint: Option<f64>,
    /// Optional starting width (σ, not FWHM).
    pub width_hint: Option<f64>,
    /// Optional starting baseline level.
    pub offset_hint: Option<f64>,
}

impl Default for LocalizerOptions {
    fn default() -> Self {
        Self {
            polarity: Polarity::Auto,
            max_iterations: 200,
            tolerance: 1e-10,
            significance: 5.0,
            initial_lambda: 1e-3,
            center_hint: None,
            width_hint: None,
            offset_hint: None,
        }
    }
}
