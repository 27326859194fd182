//! Per-frame lane boundary estimation for road-scene video.
//!
//! Each frame runs through a fixed chain of stages:
//! - [`FramePreprocessor`]: luma, Gaussian blur, Canny edges,
//! - [`RegionMasker`]: keep edges inside the road polygon,
//! - [`LineExtractor`]: probabilistic line voting into segments,
//! - [`LaneClassifier`]: left/right assignment by slope sign and position,
//! - [`LaneFitter`]: least-squares fit extrapolated to a fixed row range,
//! - [`TemporalSmoother`]: per-side moving average with hold-last-good,
//! - [`DepartureDetector`]: optional lateral offset check.
//!
//! [`LaneDetector`] owns one instance of every stage and the per-stream
//! smoothing state. Each stage is also usable on its own.
//!
//! ## Quickstart
//!
//! ```no_run
//! use lane_detect::{detect, LaneDetector, LaneDetectorParams};
//! use image::ImageReader;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut detector = LaneDetector::new(LaneDetectorParams::default())?;
//! for path in ["frame_000.png", "frame_001.png"] {
//!     let img = ImageReader::open(path)?.decode()?;
//!     let result = detect::detect_lanes_dynamic(&mut detector, &img)?;
//!     println!("left={:?} right={:?}", result.left, result.right);
//! }
//! # Ok(())
//! # }
//! ```

mod classify;
pub mod detect;
mod departure;
mod detector;
mod fit;
mod hough;
mod io;
mod preprocess;
mod roi;
mod smoother;

pub use classify::{
    Classification, ClassifyParams, LaneCandidates, LaneClassifier, RejectionCounts,
};
pub use departure::{DepartureDetector, DepartureDirection, DepartureParams, DepartureStatus};
pub use detector::{
    ConfigError, FrameDiagnostics, LaneDetectError, LaneDetector, LaneDetectorParams, LaneResult,
};
pub use fit::{fit_least_squares, ExtrapolationParams, LaneFitter};
pub use hough::{HoughParams, LineExtractor};
pub use io::{FrameRecord, LaneDetectReport, LaneIoError, RunSummary};
pub use preprocess::{FramePreprocessor, PreprocessParams};
pub use roi::{RegionMasker, RoiParams, RoiPolygon};
pub use smoother::{LaneState, SmoothingParams, TemporalSmoother, TrackState};

pub use lane_detect_core::{
    frame_center_x, EdgeMap, ExtrapolationWindow, FrameError, FrameView, LaneLine, LaneSide,
    PixelLayout, Segment,
};
