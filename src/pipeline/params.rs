//! Parameter types configuring the estimation stages.
//!
//! Defaults: constant mean background from at least 8 samples, a 5σ
//! significance gate on the localizer, a ±3.5 width trapezoid window and no
//! boundary term in the total uncertainty. Every field can be omitted from a
//! JSON config.

use crate::background::{BackgroundOptions, LevelStatistic};
use crate::error::{EstimateError, EstimateResultOf};
use crate::integrate::WindowOptions;
use crate::localize::LocalizerOptions;
use crate::uncertainty::UncertaintyOptions;
use serde::{Deserialize, Serialize};

/// Pipeline-wide parameters.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegratorParams {
    pub background: BackgroundOptions,
    pub localizer: LocalizerOptions,
    pub window: WindowOptions,
    pub uncertainty: UncertaintyOptions,
}

impl IntegratorParams {
    /// Reject values no signal could satisfy.
    pub fn validate(&self) -> EstimateResultOf<()> {
        let bad = |msg: String| Err(EstimateError::InvalidParams(msg));

        let k = self.window.multiplier;
        if !k.is_finite() || k <= 0.0 {
            return bad(format!("window multiplier must be > 0, got {k}"));
        }
        if self.window.min_samples < 2 {
            return bad(format!(
                "window min_samples must be >= 2, got {}",
                self.window.min_samples
            ));
        }

        let margin = self.background.exclusion_margin;
        if !margin.is_finite() || margin < 1.0 {
            return bad(format!("exclusion margin must be >= 1, got {margin}"));
        }
        if let LevelStatistic::TrimmedMean { fraction } = self.background.statistic {
            if !(0.0..0.5).contains(&fraction) {
                return bad(format!("trim fraction must be in [0, 0.5), got {fraction}"));
            }
        }

        let loc = &self.localizer;
        if loc.max_iterations == 0 {
            return bad("localizer max_iterations must be >= 1".to_string());
        }
        if !loc.tolerance.is_finite() || loc.tolerance <= 0.0 {
            return bad(format!("localizer tolerance must be > 0, got {}", loc.tolerance));
        }
        if !loc.significance.is_finite() || loc.significance < 0.0 {
            return bad(format!(
                "significance threshold must be >= 0, got {}",
                loc.significance
            ));
        }
        if !loc.initial_lambda.is_finite() || loc.initial_lambda <= 0.0 {
            return bad(format!(
                "initial lambda must be > 0, got {}",
                loc.initial_lambda
            ));
        }

        if let Some(c) = loc.center_hint {
            if !c.is_finite() {
                return bad(format!("center hint must be finite, got {c}"));
            }
        }
        if let Some(w) = loc.width_hint {
            if !w.is_finite() || w <= 0.0 {
                return bad(format!("width hint must be > 0, got {w}"));
            }
        }
        if let Some(b) = loc.offset_hint {
            if !b.is_finite() {
                return bad(format!("offset hint must be finite, got {b}"));
            }
        }

        let (lo, hi) = self.uncertainty.boundary_ratios;
        if !(lo.is_finite() && hi.is_finite() && lo > 0.0 && lo <= hi) {
            return bad(format!("boundary ratios must satisfy 0 < lo <= hi, got ({lo}, {hi})"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        IntegratorParams::default().validate().unwrap();
    }

    #[test]
    fn partial_json_fills_defaults() {
        let params: IntegratorParams =
            serde_json::from_str(r#"{ "window": { "multiplier": 5.0, "rule": "simpson" } }"#)
                .unwrap();
        assert_eq!(params.window.multiplier, 5.0);
        assert_eq!(params.window.min_samples, 5);
        assert_eq!(params.localizer, LocalizerOptions::default());
    }

    #[test]
    fn rejects_zero_multiplier() {
        let mut params = IntegratorParams::default();
        params.window.multiplier = 0.0;
        assert!(matches!(
            params.validate(),
            Err(EstimateError::InvalidParams(_))
        ));
    }

    #[test]
    fn hints_parse_and_are_checked() {
        let params: IntegratorParams =
            serde_json::from_str(r#"{ "localizer": { "center_hint": 12.5, "width_hint": 0.8 } }"#)
                .unwrap();
        assert_eq!(params.localizer.center_hint, Some(12.5));
        assert_eq!(params.localizer.offset_hint, None);
        params.validate().unwrap();

        let mut params = IntegratorParams::default();
        params.localizer.width_hint = Some(-1.0);
        assert!(matches!(
            params.validate(),
            Err(EstimateError::InvalidParams(_))
        ));
    }
}
