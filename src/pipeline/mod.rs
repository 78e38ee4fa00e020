//! Estimation pipeline driving the stages end-to-end.
//!
//! [`PulseIntegrator`] turns a [`Signal`] into an [`EstimateResult`]:
//!
//! 1. robust preliminary background over the whole signal;
//! 2. Gaussian localization seeded from it;
//! 3. integration window `center ± k·width`, clipped to the domain;
//! 4. final background from the samples outside the (margin-scaled) window;
//! 5. background-subtracted integral of the raw samples in the window;
//! 6. uncertainty propagation.
//!
//! Each stage returns its own failure immediately, so a non-converged fit
//! never reaches the integrator. The integrator holds only immutable
//! parameters: runs are pure functions of `(signal, params)` and batches
//! parallelise freely.
//!
//! ```no_run
//! use pulse_integrator::{IntegratorParams, NoiseModel, PulseIntegrator, Signal};
//!
//! # fn example(times: Vec<f64>, volts: Vec<f64>) {
//! let signal = Signal::new(times, volts, NoiseModel::Estimated).unwrap();
//! let integrator = PulseIntegrator::new(IntegratorParams::default());
//! match integrator.estimate(&signal) {
//!     Ok(res) => println!("area = {:.4} ± {:.4}", res.integral, res.uncertainty),
//!     Err(err) => eprintln!("rejected: {err}"),
//! }
//! # }
//! ```

pub mod params;

pub use params::IntegratorParams;

use crate::background;
use crate::diagnostics::{EstimationReport, InputDescriptor, PipelineTrace};
use crate::error::{EstimateError, EstimateResultOf};
use crate::integrate;
use crate::localize;
use crate::signal::Signal;
use crate::types::{EstimateFlag, EstimateResult};
use crate::uncertainty;
use log::debug;
use rayon::prelude::*;
use std::time::Instant;

/// Stateless pulse-area estimator.
#[derive(Clone, Debug, Default)]
pub struct PulseIntegrator {
    params: IntegratorParams,
}

impl PulseIntegrator {
    pub fn new(params: IntegratorParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &IntegratorParams {
        &self.params
    }

    /// Estimate the pulse area of `signal`.
    pub fn estimate(&self, signal: &Signal) -> EstimateResultOf<EstimateResult> {
        self.estimate_with_diagnostics(signal).into_result()
    }

    /// Estimate every signal in parallel; results keep the input order.
    pub fn estimate_batch(&self, signals: &[Signal]) -> Vec<EstimateResultOf<EstimateResult>> {
        signals.par_iter().map(|s| self.estimate(s)).collect()
    }

    /// Run the pipeline and return the outcome with a per-stage trace.
    pub fn estimate_with_diagnostics(&self, signal: &Signal) -> EstimationReport {
        let total_start = Instant::now();
        let mut trace = PipelineTrace::new(InputDescriptor::from_signal(signal));
        debug!(
            "PulseIntegrator::estimate start n={} domain=({:.6}, {:.6})",
            signal.len(),
            signal.domain().0,
            signal.domain().1
        );
        let outcome = self.run(signal, &mut trace);
        trace.timings.total_ms = total_start.elapsed().as_secs_f64() * 1000.0;
        if let Err(err) = &outcome {
            debug!(
                "PulseIntegrator::estimate rejected at {:?}: {err}",
                trace.failed_stage
            );
        }
        EstimationReport { outcome, trace }
    }

    fn run(&self, signal: &Signal, trace: &mut PipelineTrace) -> EstimateResultOf<EstimateResult> {
        let p = &self.params;
        stage(trace, "params", || p.validate())?;

        let preliminary = stage(trace, "preliminary_background", || {
            Ok(background::preliminary(signal, &p.background))
        })?;
        trace.preliminary_background = Some(preliminary.clone());

        let fit = stage(trace, "localize", || {
            localize::localize(signal, &preliminary, &p.localizer)
        })?;
        trace.fit = Some(fit.clone());

        let window = stage(trace, "window", || {
            integrate::window_for_fit(signal, &fit, &p.window)
        })?;
        trace.window = Some(window.clone());

        let margin = window.half_width * p.background.exclusion_margin;
        let excluded = (window.center - margin, window.center + margin);
        let bg = stage(trace, "background", || {
            background::estimate(signal, Some(excluded), &p.background)
        })?;
        trace.background = Some(bg.clone());

        let rule = p.window.rule;
        let integral = stage(trace, "integrate", || {
            Ok(integrate::integrate(signal, &bg, &window, rule))
        })?;
        trace.integral = Some(integral);

        let breakdown = stage(trace, "uncertainty", || {
            Ok(uncertainty::propagate(
                signal,
                &bg,
                &window,
                rule,
                &p.uncertainty,
            ))
        })?;
        trace.uncertainty = Some(breakdown.clone());

        let mut flags = Vec::new();
        if window.truncated_low {
            flags.push(EstimateFlag::TruncatedLow);
        }
        if window.truncated_high {
            flags.push(EstimateFlag::TruncatedHigh);
        }

        debug!(
            "PulseIntegrator::estimate area={:.6e} sigma={:.3e} flags={:?}",
            integral, breakdown.total, flags
        );
        Ok(EstimateResult {
            integral,
            uncertainty: breakdown.total,
            breakdown,
            window,
            background: bg,
            fit,
            flags,
        })
    }
}

/// Time one stage and record its label on failure.
fn stage<T>(
    trace: &mut PipelineTrace,
    label: &str,
    f: impl FnOnce() -> Result<T, EstimateError>,
) -> Result<T, EstimateError> {
    let start = Instant::now();
    let out = f();
    trace
        .timings
        .push(label, start.elapsed().as_secs_f64() * 1000.0);
    if out.is_err() {
        trace.failed_stage = Some(label.to_string());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::NoiseModel;

    fn gaussian_pulse(center: f64) -> Signal {
        let values = (0..400)
            .map(|i| {
                let x = i as f64 * 0.5;
                1.0 + 3.0 * (-(x - center).powi(2) / (2.0 * 4.0 * 4.0)).exp()
            })
            .collect();
        Signal::uniform(0.0, 0.5, values, NoiseModel::Constant(0.0)).unwrap()
    }

    #[test]
    fn trace_records_every_stage() {
        let report = PulseIntegrator::default().estimate_with_diagnostics(&gaussian_pulse(100.0));
        assert!(report.outcome.is_ok(), "error: {:?}", report.outcome);
        let labels: Vec<&str> = report
            .trace
            .timings
            .stages
            .iter()
            .map(|s| s.label.as_str())
            .collect();
        assert_eq!(
            labels,
            vec![
                "params",
                "preliminary_background",
                "localize",
                "window",
                "background",
                "integrate",
                "uncertainty"
            ]
        );
        assert!(report.trace.failed_stage.is_none());
        let fit_ms = report.trace.timings.stage_ms("localize").unwrap();
        assert!(fit_ms >= 0.0 && fit_ms <= report.trace.timings.total_ms);
        assert!(report.trace.timings.stage_ms("pyramid").is_none());
    }

    #[test]
    fn invalid_params_fail_before_any_stage_output() {
        let mut params = IntegratorParams::default();
        params.window.multiplier = -1.0;
        let report = PulseIntegrator::new(params).estimate_with_diagnostics(&gaussian_pulse(100.0));
        assert!(matches!(report.outcome, Err(EstimateError::InvalidParams(_))));
        assert_eq!(report.trace.failed_stage.as_deref(), Some("params"));
        assert!(report.trace.fit.is_none());
    }

    #[test]
    fn background_exclusion_covers_the_window() {
        let res = PulseIntegrator::default()
            .estimate(&gaussian_pulse(100.0))
            .unwrap();
        let (lo, hi) = res.background.excluded.unwrap();
        assert!(lo <= res.window.lower && hi >= res.window.upper);
        // Gaussian tails beyond ±3.5σ leak slightly into the background region.
        assert!((res.background.level - 1.0).abs() < 1e-3);
    }
}
