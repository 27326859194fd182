use crate::classify::RejectionCounts;
use crate::departure::DepartureStatus;
use crate::smoother::TrackState;
use lane_detect_core::{ExtrapolationWindow, LaneLine, LaneSide};
use serde::{Deserialize, Serialize};

/// Stage counts and smoother state for one frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrameDiagnostics {
    pub edge_pixels: usize,
    pub segments: usize,
    pub left_candidates: usize,
    pub right_candidates: usize,
    pub rejected: RejectionCounts,
    /// Raw per-frame fits before smoothing.
    pub left_fit: Option<LaneLine>,
    pub right_fit: Option<LaneLine>,
    pub left_state: TrackState,
    pub right_state: TrackState,
}

/// Output of one pipeline step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LaneResult {
    /// Zero-based index within the stream.
    pub frame_index: u64,
    pub frame_width: usize,
    pub frame_height: usize,
    /// Pixel rows every reported line spans.
    pub window: ExtrapolationWindow,
    pub left: Option<LaneLine>,
    pub right: Option<LaneLine>,
    /// `None` when the departure check is disabled.
    pub departure: Option<DepartureStatus>,
    pub diagnostics: FrameDiagnostics,
}

impl LaneResult {
    pub fn line(&self, side: LaneSide) -> Option<&LaneLine> {
        match side {
            LaneSide::Left => self.left.as_ref(),
            LaneSide::Right => self.right.as_ref(),
        }
    }

    pub fn is_departing(&self) -> bool {
        self.departure.is_some_and(|d| d.is_departing())
    }
}
