//! Window integrator.
//!
//! Integrates the *raw* background-subtracted samples over a window sized by
//! the localizer. The fitted curve never enters the sum, so the result holds
//! for any pulse shape as long as the window contains it.

mod options;
mod rule;
mod window;

pub use options::{IntegrationRule, WindowOptions};
pub use rule::quadrature_weights;
pub use window::{build_window, IntegrationWindow};

use crate::background::BackgroundModel;
use crate::error::EstimateResultOf;
use crate::localize::GaussianFit;
use crate::signal::Signal;
use log::{debug, warn};
use std::ops::Range;

/// Window `fit.center ± k·fit.width` for the configured `k`.
pub fn window_for_fit(
    signal: &Signal,
    fit: &GaussianFit,
    opts: &WindowOptions,
) -> EstimateResultOf<IntegrationWindow> {
    let window = build_window(
        signal,
        fit.center,
        fit.width,
        opts.multiplier,
        opts.min_samples,
    )?;
    if window.is_truncated() {
        warn!(
            "window [{:.6}, {:.6}] clipped to [{:.6}, {:.6}]; integral may be biased",
            window.requested.0, window.requested.1, window.lower, window.upper
        );
    }
    Ok(window)
}

/// Weights of the samples in `range` under `rule`.
pub fn range_weights(signal: &Signal, range: Range<usize>, rule: IntegrationRule) -> Vec<f64> {
    quadrature_weights(&signal.positions()[range], rule, signal.mean_spacing())
}

/// `Σ w_i (y_i − b(x_i))` over the samples in `range`.
pub fn integrate_range(
    signal: &Signal,
    bg: &BackgroundModel,
    range: Range<usize>,
    rule: IntegrationRule,
) -> f64 {
    let weights = range_weights(signal, range.clone(), rule);
    let xs = &signal.positions()[range.clone()];
    let ys = &signal.values()[range];
    xs.iter()
        .zip(ys)
        .zip(&weights)
        .map(|((&x, &y), &w)| w * (y - bg.at(x)))
        .sum()
}

/// Background-subtracted integral over the window samples.
pub fn integrate(
    signal: &Signal,
    bg: &BackgroundModel,
    window: &IntegrationWindow,
    rule: IntegrationRule,
) -> f64 {
    let value = integrate_range(signal, bg, window.range(), rule);
    debug!(
        "integrate: [{:.6}, {:.6}] samples={} value={:.6e}",
        window.lower,
        window.upper,
        window.samples(),
        value
    );
    value
}
