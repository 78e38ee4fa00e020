use super::TimingBreakdown;
use crate::background::BackgroundModel;
use crate::error::EstimateError;
use crate::integrate::IntegrationWindow;
use crate::localize::GaussianFit;
use crate::signal::{NoiseModel, Signal};
use crate::types::EstimateResult;
use crate::uncertainty::UncertaintyBreakdown;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Produced by [`PulseIntegrator::estimate_with_diagnostics`](crate::PulseIntegrator).
///
/// Serializes as `{ "result": .., "trace": .. }` or `{ "error": .., "trace": .. }`.
#[derive(Clone, Debug)]
pub struct EstimationReport {
    pub outcome: Result<EstimateResult, EstimateError>,
    pub trace: PipelineTrace,
}

impl EstimationReport {
    pub fn into_result(self) -> Result<EstimateResult, EstimateError> {
        self.outcome
    }
}

impl Serialize for EstimationReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        match &self.outcome {
            Ok(result) => map.serialize_entry("result", result)?,
            Err(error) => map.serialize_entry("error", error)?,
        }
        map.serialize_entry("trace", &self.trace)?;
        map.end()
    }
}

/// Stage-by-stage record of one run. Stages that did not run stay `None`.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineTrace {
    pub input: InputDescriptor,
    pub timings: TimingBreakdown,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preliminary_background: Option<BackgroundModel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fit: Option<GaussianFit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window: Option<IntegrationWindow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<BackgroundModel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub integral: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uncertainty: Option<UncertaintyBreakdown>,
    /// Label of the stage that rejected the signal.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_stage: Option<String>,
}

impl PipelineTrace {
    pub fn new(input: InputDescriptor) -> Self {
        Self {
            input,
            timings: TimingBreakdown::default(),
            preliminary_background: None,
            fit: None,
            window: None,
            background: None,
            integral: None,
            uncertainty: None,
            failed_stage: None,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputDescriptor {
    pub samples: usize,
    pub domain: (f64, f64),
    pub mean_spacing: f64,
    pub noise_model: &'static str,
}

impl InputDescriptor {
    pub fn from_signal(signal: &Signal) -> Self {
        let noise_model = match signal.noise() {
            NoiseModel::Constant(_) => "constant",
            NoiseModel::PerSample(_) => "perSample",
            NoiseModel::Estimated => "estimated",
        };
        Self {
            samples: signal.len(),
            domain: signal.domain(),
            mean_spacing: signal.mean_spacing(),
            noise_model,
        }
    }
}
