//! One representative line per lane side.

use crate::ConfigError;
use lane_detect_core::{ExtrapolationWindow, LaneLine, Segment};
use log::warn;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Vertical extent of reported lines, as fractions of the frame height.
///
/// `0.0` is the top row and `1.0` the bottom row; the pixel row is
/// `fraction * (H - 1)`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtrapolationParams {
    pub y_top: f32,
    pub y_bottom: f32,
}

impl Default for ExtrapolationParams {
    fn default() -> Self {
        Self {
            y_top: 0.6,
            y_bottom: 1.0,
        }
    }
}

impl ExtrapolationParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (top, bottom) = (self.y_top, self.y_bottom);
        if !top.is_finite() || !bottom.is_finite() || top < 0.0 || bottom > 1.0 || top >= bottom {
            return Err(ConfigError::InvalidExtrapolation {
                y_top: top,
                y_bottom: bottom,
            });
        }
        Ok(())
    }

    /// Pixel-space window for a `width` x `height` frame.
    pub fn window(&self, width: usize, height: usize) -> ExtrapolationWindow {
        let rows = height.saturating_sub(1) as f32;
        ExtrapolationWindow::new(self.y_top * rows, self.y_bottom * rows, width)
    }
}

/// Least-squares fit of pooled segment endpoints, extrapolated over a window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LaneFitter {
    window: ExtrapolationWindow,
}

impl LaneFitter {
    pub fn new(window: ExtrapolationWindow) -> Self {
        Self { window }
    }

    #[inline]
    pub fn window(&self) -> &ExtrapolationWindow {
        &self.window
    }

    /// Fit one side's candidates. Empty input or a degenerate fit yields `None`.
    pub fn fit(&self, candidates: &[Segment]) -> Option<LaneLine> {
        if candidates.is_empty() {
            return None;
        }
        let points: Vec<Point2<f32>> = candidates.iter().flat_map(|s| [s.p0, s.p1]).collect();
        let Some((slope, intercept)) = fit_least_squares(&points) else {
            warn!(
                "degenerate lane fit over {} segments, treating side as undetected",
                candidates.len()
            );
            return None;
        };
        LaneLine::from_slope_intercept(slope, intercept, &self.window)
    }
}

/// Ordinary least squares `y = m * x + b` with equal point weights.
///
/// Returns `None` with fewer than two points or when all `x` coincide.
pub fn fit_least_squares(points: &[Point2<f32>]) -> Option<(f32, f32)> {
    if points.len() < 2 {
        return None;
    }
    let n = points.len() as f64;
    let (sum_x, sum_y) = points
        .iter()
        .fold((0.0f64, 0.0f64), |(sx, sy), p| (sx + p.x as f64, sy + p.y as f64));
    let (mean_x, mean_y) = (sum_x / n, sum_y / n);

    let mut sxx = 0.0f64;
    let mut sxy = 0.0f64;
    for p in points {
        let dx = p.x as f64 - mean_x;
        sxx += dx * dx;
        sxy += dx * (p.y as f64 - mean_y);
    }
    if sxx <= 1e-9 * n {
        return None;
    }
    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;
    (slope.is_finite() && intercept.is_finite()).then_some((slope as f32, intercept as f32))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn fitter() -> LaneFitter {
        LaneFitter::new(ExtrapolationParams::default().window(640, 480))
    }

    #[test]
    fn window_rows_follow_height_fractions() {
        let w = ExtrapolationParams::default().window(640, 480);
        assert_relative_eq!(w.y_top, 0.6 * 479.0);
        assert_relative_eq!(w.y_bottom, 479.0);
        assert_relative_eq!(w.x_max, 639.0);
    }

    #[test]
    fn pooled_points_weigh_equally() {
        // Two collinear pieces of y = -x + 600.
        let segs = [
            Segment::new(150.0, 450.0, 200.0, 400.0),
            Segment::new(250.0, 350.0, 300.0, 300.0),
        ];
        let line = fitter().fit(&segs).unwrap();
        assert_relative_eq!(line.slope, -1.0, epsilon = 1e-5);
        assert_relative_eq!(line.intercept, 600.0, epsilon = 1e-3);
        assert_eq!(line.top.y, 0.6 * 479.0);
        assert_eq!(line.bottom.y, 479.0);
        assert_relative_eq!(line.bottom.x, 121.0, epsilon = 1e-3);
    }

    #[test]
    fn empty_and_degenerate_inputs_are_absent() {
        assert!(fitter().fit(&[]).is_none());
        // All endpoints share one x.
        let vertical = [Segment::new(100.0, 10.0, 100.0, 90.0)];
        assert!(fitter().fit(&vertical).is_none());
        assert!(fit_least_squares(&[Point2::new(1.0, 1.0)]).is_none());
    }

    #[test]
    fn endpoints_stay_inside_frame() {
        // Shallow fit that would leave the frame when extrapolated.
        let segs = [Segment::new(600.0, 470.0, 630.0, 479.0)];
        let line = fitter().fit(&segs).unwrap();
        for p in [line.top, line.bottom] {
            assert!((0.0..=639.0).contains(&p.x));
        }
    }

    #[test]
    fn validates_window_order() {
        let bad = ExtrapolationParams {
            y_top: 0.8,
            y_bottom: 0.5,
        };
        assert!(matches!(
            bad.validate(),
            Err(ConfigError::InvalidExtrapolation { .. })
        ));
        assert!(ExtrapolationParams::default().validate().is_ok());
    }
}
