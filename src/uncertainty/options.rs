use serde::{Deserialize, Serialize};

/// Parameters of the uncertainty propagator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UncertaintyOptions {
    /// Add the window-boundary spread to the total in quadrature.
    pub include_boundary_term: bool,
    /// Swept window multipliers as fractions of the configured one; the
    /// default spans 3.2 to 4.5 around k = 3.5.
    pub boundary_ratios: (f64, f64),
    pub boundary_steps: usize,
}

impl Default for UncertaintyOptions {
    fn default() -> Self {
        Self {
            include_boundary_term: false,
            boundary_ratios: (3.2 / 3.5, 4.5 / 3.5),
            boundary_steps: 100,
        }
    }
}
