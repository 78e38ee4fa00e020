use serde::{Deserialize, Serialize};

/// Quadrature rule applied to the raw samples inside the window.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IntegrationRule {
    /// Trapezoid rule, exact for any spacing.
    #[default]
    Trapezoid,
    /// Composite Simpson rule on interval pairs, non-uniform aware.
    Simpson,
    /// Plain sum, each sample weighted by the mean spacing of the signal.
    Sum,
}

/// Parameters of the window integrator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowOptions {
    /// Half-width of the window in fitted widths (k).
    pub multiplier: f64,
    /// Minimum number of samples inside the window.
    pub min_samples: usize,
    pub rule: IntegrationRule,
}

impl Default for WindowOptions {
    fn default() -> Self {
        Self {
            // ±3.5σ keeps 99.95% of a Gaussian.
            multiplier: 3.5,
            min_samples: 5,
            rule: IntegrationRule::Trapezoid,
        }
    }
}
