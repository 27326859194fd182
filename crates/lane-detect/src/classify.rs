//! Left/right assignment of line segments.
//!
//! A segment is lane evidence when it is steep enough and its slope sign
//! agrees with the half of the frame its midpoint lies in: left boundaries
//! rise toward the image center (negative slope in y-down coordinates), right
//! boundaries have positive slope.

use crate::ConfigError;
use lane_detect_core::{frame_center_x, LaneSide, Segment};
use log::trace;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifyParams {
    /// Segments with `|slope|` at or below this value are discarded as near-horizontal.
    pub min_abs_slope: f32,
}

impl Default for ClassifyParams {
    fn default() -> Self {
        Self { min_abs_slope: 0.3 }
    }
}

impl ClassifyParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.min_abs_slope.is_finite() || self.min_abs_slope < 0.0 {
            return Err(ConfigError::InvalidSlopeThreshold(self.min_abs_slope));
        }
        Ok(())
    }
}

/// Outcome of classifying a single segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Classification {
    Lane(LaneSide),
    /// Zero horizontal extent.
    Vertical,
    /// `|slope|` not above the threshold.
    TooFlat,
    /// Slope sign disagrees with the frame half the segment lies in.
    WrongSide,
}

/// Number of discarded segments per reason.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectionCounts {
    pub vertical: usize,
    pub too_flat: usize,
    pub wrong_side: usize,
}

impl RejectionCounts {
    pub fn total(&self) -> usize {
        self.vertical + self.too_flat + self.wrong_side
    }
}

/// Segments sorted into the two lane sides.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LaneCandidates {
    pub left: Vec<Segment>,
    pub right: Vec<Segment>,
    pub rejected: RejectionCounts,
}

impl LaneCandidates {
    pub fn side(&self, side: LaneSide) -> &[Segment] {
        match side {
            LaneSide::Left => &self.left,
            LaneSide::Right => &self.right,
        }
    }
}

#[derive(Clone, Debug)]
pub struct LaneClassifier {
    params: ClassifyParams,
}

impl LaneClassifier {
    pub fn new(params: ClassifyParams) -> Result<Self, ConfigError> {
        params.validate()?;
        Ok(Self { params })
    }

    #[inline]
    pub fn params(&self) -> &ClassifyParams {
        &self.params
    }

    /// Classify one segment of a frame `frame_width` pixels wide.
    pub fn classify(&self, segment: &Segment, frame_width: usize) -> Classification {
        let Some(slope) = segment.slope() else {
            return Classification::Vertical;
        };
        if !slope.is_finite() {
            return Classification::Vertical;
        }
        if slope.abs() <= self.params.min_abs_slope {
            return Classification::TooFlat;
        }
        let midline = frame_center_x(frame_width);
        let mid_x = segment.midpoint().x;
        if slope < 0.0 && mid_x < midline {
            Classification::Lane(LaneSide::Left)
        } else if slope > 0.0 && mid_x > midline {
            Classification::Lane(LaneSide::Right)
        } else {
            Classification::WrongSide
        }
    }

    /// Partition segments into left/right candidates, preserving input order.
    pub fn partition(&self, segments: &[Segment], frame_width: usize) -> LaneCandidates {
        let mut out = LaneCandidates::default();
        for seg in segments {
            let class = self.classify(seg, frame_width);
            trace!("segment {:?} -> {:?}", seg, class);
            match class {
                Classification::Lane(LaneSide::Left) => out.left.push(*seg),
                Classification::Lane(LaneSide::Right) => out.right.push(*seg),
                Classification::Vertical => out.rejected.vertical += 1,
                Classification::TooFlat => out.rejected.too_flat += 1,
                Classification::WrongSide => out.rejected.wrong_side += 1,
            }
        }
        out
    }
}
