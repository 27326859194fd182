use lane_detect_core::FrameError;

/// Invalid static configuration, reported once at construction.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("blur kernel size must be odd and >= 3 (got {size})")]
    InvalidKernelSize { size: usize },
    #[error("edge thresholds must satisfy 0 <= low < high (got low={low}, high={high})")]
    InvalidEdgeThresholds { low: f32, high: f32 },
    #[error("region of interest polygon is degenerate ({vertices} vertices)")]
    DegenerateRoi { vertices: usize },
    #[error("invalid line voting parameters: {0}")]
    InvalidHough(&'static str),
    #[error("minimum slope must be finite and >= 0 (got {0})")]
    InvalidSlopeThreshold(f32),
    #[error("extrapolation window must satisfy 0 <= y_top < y_bottom <= 1 (got {y_top}, {y_bottom})")]
    InvalidExtrapolation { y_top: f32, y_bottom: f32 },
    #[error("history window must be >= 1 (got {0})")]
    InvalidHistoryWindow(usize),
    #[error("departure threshold must be > 0 (got {0})")]
    InvalidDepartureThreshold(f32),
}

/// Errors returned by the lane detector.
#[derive(thiserror::Error, Debug)]
pub enum LaneDetectError {
    #[error(transparent)]
    Frame(#[from] FrameError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
