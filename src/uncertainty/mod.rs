//! Uncertainty propagation for the window integral.
//!
//! The integral is linear in the samples, `I = Σ w_i (y_i − b(x_i))`, with the
//! background coefficients estimated from samples outside the window. The two
//! sources are therefore independent and their variances add:
//!
//! - noise: `Σ w_i² σ_i²`, one independent term per window sample;
//! - background: `gᵀ C g` with `g = (Σ w_i, Σ w_i (x_i − x_ref))`. The same
//!   fitted level is subtracted from every sample, so its error enters the
//!   integral coherently, scaling with `(Σ w_i)²` rather than `Σ w_i²`.
//!
//! The window-boundary sensitivity (spread of the integral when the window
//! multiplier is swept) is always reported. It is added in quadrature only
//! on request: the noise it measures is already counted in the first term.

mod options;

pub use options::UncertaintyOptions;

use crate::background::BackgroundModel;
use crate::integrate::{integrate_range, range_weights, IntegrationRule, IntegrationWindow};
use crate::signal::Signal;
use log::debug;
use serde::Serialize;

/// Contributions to the 1σ uncertainty of the integral.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UncertaintyBreakdown {
    /// σ from per-sample noise inside the window.
    pub noise: f64,
    /// σ from the background estimate.
    pub background: f64,
    /// Spread of the integral across window multipliers.
    pub boundary: f64,
    pub boundary_included: bool,
    /// Combined 1σ.
    pub total: f64,
}

/// Noise variance `Σ w_i² σ_i²` over the window.
///
/// With an estimated noise model every σ_i is the residual scatter of the
/// background samples.
pub fn noise_variance(
    signal: &Signal,
    bg: &BackgroundModel,
    window: &IntegrationWindow,
    rule: IntegrationRule,
) -> f64 {
    let weights = range_weights(signal, window.range(), rule);
    window
        .range()
        .zip(&weights)
        .map(|(i, &w)| {
            let sigma = signal.sigma_at(i).unwrap_or(bg.noise_sigma);
            w * w * sigma * sigma
        })
        .sum()
}

/// Variance of the subtracted background integral, fully correlated across
/// the window samples.
pub fn background_variance(
    signal: &Signal,
    bg: &BackgroundModel,
    window: &IntegrationWindow,
    rule: IntegrationRule,
) -> f64 {
    let weights = range_weights(signal, window.range(), rule);
    let xs = &signal.positions()[window.range()];
    let sum_w: f64 = weights.iter().sum();
    let sum_w_dx: f64 = xs
        .iter()
        .zip(&weights)
        .map(|(&x, &w)| w * (x - bg.reference))
        .sum();
    bg.integral_variance(sum_w, sum_w_dx)
}

/// Population standard deviation of the integral over the distinct windows
/// `center ± k·width`, `k` swept linearly over `opts.boundary_ratios` times the
/// window multiplier. The sweep stops at the background exclusion so no
/// window reaches samples the background was fitted on.
pub fn boundary_sensitivity(
    signal: &Signal,
    bg: &BackgroundModel,
    window: &IntegrationWindow,
    rule: IntegrationRule,
    opts: &UncertaintyOptions,
) -> f64 {
    let k = window.half_width / window.width;
    let k_lo = k * opts.boundary_ratios.0;
    let mut k_hi = k * opts.boundary_ratios.1;
    if let Some((lo, hi)) = bg.excluded {
        let k_max = (window.center - lo).min(hi - window.center) / window.width;
        k_hi = k_hi.min(k_max);
    }
    if k_hi < k_lo {
        return 0.0;
    }
    let steps = opts.boundary_steps.max(1);
    let mut ranges = Vec::with_capacity(steps);
    for s in 0..steps {
        let k = if steps == 1 {
            k_lo
        } else {
            k_lo + (k_hi - k_lo) * s as f64 / (steps - 1) as f64
        };
        let half = k * window.width;
        let range = signal.index_range(window.center - half, window.center + half);
        if range.len() >= 2 && !ranges.contains(&range) {
            ranges.push(range);
        }
    }
    if ranges.len() < 2 {
        return 0.0;
    }
    let areas: Vec<f64> = ranges
        .into_iter()
        .map(|r| integrate_range(signal, bg, r, rule))
        .collect();
    let mean = areas.iter().sum::<f64>() / areas.len() as f64;
    let var = areas.iter().map(|a| (a - mean) * (a - mean)).sum::<f64>() / areas.len() as f64;
    var.sqrt()
}

/// Combine all contributions into the final 1σ.
pub fn propagate(
    signal: &Signal,
    bg: &BackgroundModel,
    window: &IntegrationWindow,
    rule: IntegrationRule,
    opts: &UncertaintyOptions,
) -> UncertaintyBreakdown {
    let noise_var = noise_variance(signal, bg, window, rule);
    let bg_var = background_variance(signal, bg, window, rule);
    let boundary = boundary_sensitivity(signal, bg, window, rule, opts);
    let mut total_var = noise_var + bg_var;
    if opts.include_boundary_term {
        total_var += boundary * boundary;
    }
    let breakdown = UncertaintyBreakdown {
        noise: noise_var.sqrt(),
        background: bg_var.sqrt(),
        boundary,
        boundary_included: opts.include_boundary_term,
        total: total_var.sqrt(),
    };
    debug!(
        "propagate: noise={:.4e} background={:.4e} boundary={:.4e} total={:.4e}",
        breakdown.noise, breakdown.background, breakdown.boundary, breakdown.total
    );
    breakdown
}
