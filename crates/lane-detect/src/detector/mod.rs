//! Full per-frame lane detection pipeline.
//!
//! This module wires the stages together: edge extraction, region masking,
//! line voting, left/right classification, per-side fitting, temporal
//! smoothing and the optional departure check.

mod error;
mod params;
mod pipeline;
mod result;

pub use error::{ConfigError, LaneDetectError};
pub use params::LaneDetectorParams;
pub use pipeline::LaneDetector;
pub use result::{FrameDiagnostics, LaneResult};
