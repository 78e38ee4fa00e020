use serde::{Deserialize, Serialize};

/// Functional form of the baseline.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BaselineShape {
    /// Flat DC offset.
    #[default]
    Constant,
    /// Offset plus a linear drift, fitted by least squares.
    Linear,
}

/// Central estimator used for a constant baseline.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LevelStatistic {
    #[default]
    Mean,
    Median,
    /// Symmetric trimmed mean dropping `fraction` of the samples on each side.
    TrimmedMean { fraction: f64 },
}

/// Parameters of the background estimator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackgroundOptions {
    pub shape: BaselineShape,
    /// Ignored for [`BaselineShape::Linear`].
    pub statistic: LevelStatistic,
    /// Minimum number of samples outside the excluded region.
    pub min_samples: usize,
    /// Excluded half-width as a multiple of the integration half-width (>= 1).
    pub exclusion_margin: f64,
}

impl Default for BackgroundOptions {
    fn default() -> Self {
        Self {
            shape: BaselineShape::Constant,
            statistic: LevelStatistic::Mean,
            min_samples: 8,
            exclusion_margin: 1.0,
        }
    }
}

impl BackgroundOptions {
    /// Smallest sample count the chosen model can work with.
    pub fn required_samples(&self) -> usize {
        let floor = match self.shape {
            BaselineShape::Constant => 2,
            BaselineShape::Linear => 3,
        };
        self.min_samples.max(floor)
    }
}
