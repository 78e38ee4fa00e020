use crate::error::{EstimateError, EstimateResultOf};
use crate::signal::Signal;
use serde::Serialize;
use std::ops::Range;

/// Contiguous integration interval `center ± k·width`, clipped to the domain.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationWindow {
    pub center: f64,
    /// Localizer width the window was sized from.
    pub width: f64,
    pub half_width: f64,
    /// Bounds before clipping.
    pub requested: (f64, f64),
    pub lower: f64,
    pub upper: f64,
    /// Sample indices `start..end` inside `[lower, upper]`.
    pub start: usize,
    pub end: usize,
    pub truncated_low: bool,
    pub truncated_high: bool,
}

impl IntegrationWindow {
    #[inline]
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    #[inline]
    pub fn samples(&self) -> usize {
        self.end - self.start
    }

    /// Whether the signal boundary cut the requested window.
    #[inline]
    pub fn is_truncated(&self) -> bool {
        self.truncated_low || self.truncated_high
    }
}

/// Build the window `center ± multiplier·width` over `signal`.
pub fn build_window(
    signal: &Signal,
    center: f64,
    width: f64,
    multiplier: f64,
    min_samples: usize,
) -> EstimateResultOf<IntegrationWindow> {
    let half_width = multiplier * width;
    let (req_lo, req_hi) = (center - half_width, center + half_width);
    let (domain_min, domain_max) = signal.domain();

    let outside = !(center >= domain_min && center <= domain_max)
        || req_hi < domain_min
        || req_lo > domain_max;
    if outside {
        return Err(EstimateError::WindowOutOfDomain {
            lower: req_lo,
            upper: req_hi,
            domain_min,
            domain_max,
        });
    }

    let truncated_low = req_lo < domain_min;
    let truncated_high = req_hi > domain_max;
    let lower = req_lo.max(domain_min);
    let upper = req_hi.min(domain_max);
    let range = signal.index_range(lower, upper);
    let required = min_samples.max(2);
    if !(upper > lower) || range.len() < required {
        return Err(EstimateError::WindowTooNarrow {
            lower,
            upper,
            samples: range.len(),
            required,
        });
    }

    Ok(IntegrationWindow {
        center,
        width,
        half_width,
        requested: (req_lo, req_hi),
        lower,
        upper,
        start: range.start,
        end: range.end,
        truncated_low,
        truncated_high,
    })
}
