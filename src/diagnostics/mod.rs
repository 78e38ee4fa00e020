//! Diagnostics data model returned next to the estimate.
//!
//! `EstimationReport` bundles the outcome (result or failure) with a
//! `PipelineTrace` recording what every stage produced and how long it took,
//! so a rejected signal can be inspected without re-running the pipeline.

pub mod report;
pub mod timing;

pub use report::{EstimationReport, InputDescriptor, PipelineTrace};
pub use timing::{StageTiming, TimingBreakdown};
