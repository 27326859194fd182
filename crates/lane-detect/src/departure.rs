//! Lateral offset of the vehicle within its lane.

use crate::ConfigError;
use lane_detect_core::{frame_center_x, LaneLine};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DepartureParams {
    pub enabled: bool,
    /// `|offset|` above this fraction of the lane width flags a departure.
    pub offset_threshold: f32,
}

impl Default for DepartureParams {
    fn default() -> Self {
        Self {
            enabled: true,
            offset_threshold: 0.25,
        }
    }
}

impl DepartureParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.offset_threshold.is_finite() || self.offset_threshold <= 0.0 {
            return Err(ConfigError::InvalidDepartureThreshold(self.offset_threshold));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepartureDirection {
    Left,
    Right,
}

/// Per-frame departure signal.
///
/// `offset` is `(vehicle_center - lane_center) / lane_width` at the bottom
/// row; positive values mean the vehicle sits right of the lane center.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DepartureStatus {
    /// A lane line is missing or the lane has no positive width.
    Undetermined,
    Centered {
        offset: f32,
    },
    Departing {
        direction: DepartureDirection,
        offset: f32,
    },
}

impl DepartureStatus {
    pub fn offset(&self) -> Option<f32> {
        match *self {
            DepartureStatus::Undetermined => None,
            DepartureStatus::Centered { offset } | DepartureStatus::Departing { offset, .. } => {
                Some(offset)
            }
        }
    }

    pub fn is_departing(&self) -> bool {
        matches!(self, DepartureStatus::Departing { .. })
    }
}

/// Stateless comparison of lane center against frame center.
#[derive(Clone, Debug)]
pub struct DepartureDetector {
    params: DepartureParams,
}

impl DepartureDetector {
    pub fn new(params: DepartureParams) -> Result<Self, ConfigError> {
        params.validate()?;
        Ok(Self { params })
    }

    #[inline]
    pub fn params(&self) -> &DepartureParams {
        &self.params
    }

    pub fn evaluate(
        &self,
        left: Option<&LaneLine>,
        right: Option<&LaneLine>,
        frame_width: usize,
    ) -> DepartureStatus {
        let (Some(left), Some(right)) = (left, right) else {
            return DepartureStatus::Undetermined;
        };
        let lane_width = right.bottom.x - left.bottom.x;
        if !lane_width.is_finite() || lane_width <= 0.0 {
            return DepartureStatus::Undetermined;
        }
        let lane_center = 0.5 * (left.bottom.x + right.bottom.x);
        let vehicle_center = frame_center_x(frame_width);
        let offset = (vehicle_center - lane_center) / lane_width;
        if offset.abs() > self.params.offset_threshold {
            let direction = if offset > 0.0 {
                DepartureDirection::Right
            } else {
                DepartureDirection::Left
            };
            DepartureStatus::Departing { direction, offset }
        } else {
            DepartureStatus::Centered { offset }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lane_detect_core::ExtrapolationWindow;

    fn window() -> ExtrapolationWindow {
        ExtrapolationWindow::new(288.0, 479.0, 640)
    }

    /// Line through `(x_bottom, 479)` with the given slope.
    fn line_at(x_bottom: f32, slope: f32) -> LaneLine {
        LaneLine::from_slope_intercept(slope, 479.0 - slope * x_bottom, &window()).unwrap()
    }

    fn detector(threshold: f32) -> DepartureDetector {
        DepartureDetector::new(DepartureParams {
            enabled: true,
            offset_threshold: threshold,
        })
        .unwrap()
    }

    #[test]
    fn symmetric_lines_are_centered() {
        let left = line_at(120.0, -1.0);
        let right = line_at(520.0, 1.0);
        for threshold in [0.01, 0.25, 1.0] {
            let status = detector(threshold).evaluate(Some(&left), Some(&right), 640);
            assert!(!status.is_departing());
            assert!(status.offset().unwrap().abs() < 1e-4);
        }
    }

    #[test]
    fn lane_centered_on_classifier_midline_has_zero_offset() {
        // 641 px wide: the midline sits at x = 320.5.
        let left = line_at(120.5, -1.0);
        let right = line_at(520.5, 1.0);
        let status = detector(0.01).evaluate(Some(&left), Some(&right), 641);
        assert!(status.offset().unwrap().abs() < 1e-4);
    }

    #[test]
    fn large_offset_reports_direction() {
        // Lane shifted left in the image: the vehicle sits right of center.
        let left = line_at(0.0, -1.0);
        let right = line_at(300.0, 1.0);
        let status = detector(0.25).evaluate(Some(&left), Some(&right), 640);
        match status {
            DepartureStatus::Departing { direction, offset } => {
                assert_eq!(direction, DepartureDirection::Right);
                assert!(offset > 0.25);
            }
            other => panic!("expected departure, got {other:?}"),
        }
    }

    #[test]
    fn missing_or_crossed_lines_are_undetermined() {
        let left = line_at(400.0, -1.0);
        let right = line_at(200.0, 1.0);
        let d = detector(0.25);
        assert_eq!(d.evaluate(Some(&left), None, 640), DepartureStatus::Undetermined);
        assert_eq!(
            d.evaluate(Some(&left), Some(&right), 640),
            DepartureStatus::Undetermined
        );
    }

    #[test]
    fn threshold_must_be_positive() {
        assert!(DepartureDetector::new(DepartureParams {
            enabled: true,
            offset_threshold: 0.0,
        })
        .is_err());
    }
}
