//! Lane geometry in pixel space (origin top-left, y down).

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Slopes with a smaller magnitude cannot be inverted to `x(y)` reliably.
const MIN_INVERTIBLE_SLOPE: f32 = 1e-6;

/// Image column splitting the frame into left and right halves: `W / 2`.
///
/// Shared by lane classification and departure so both agree on the center.
#[inline]
pub fn frame_center_x(frame_width: usize) -> f32 {
    frame_width as f32 * 0.5
}

/// Which lane boundary a piece of evidence belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaneSide {
    Left,
    Right,
}

impl LaneSide {
    pub const BOTH: [LaneSide; 2] = [LaneSide::Left, LaneSide::Right];

    pub fn as_str(self) -> &'static str {
        match self {
            LaneSide::Left => "left",
            LaneSide::Right => "right",
        }
    }
}

/// A detected straight line piece between two pixel endpoints.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub p0: Point2<f32>,
    pub p1: Point2<f32>,
}

impl Segment {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self {
            p0: Point2::new(x1, y1),
            p1: Point2::new(x2, y2),
        }
    }

    /// `dy/dx`, or `None` for a zero-width (vertical or degenerate) segment.
    #[inline]
    pub fn slope(&self) -> Option<f32> {
        let dx = self.p1.x - self.p0.x;
        if dx == 0.0 {
            return None;
        }
        Some((self.p1.y - self.p0.y) / dx)
    }

    #[inline]
    pub fn midpoint(&self) -> Point2<f32> {
        nalgebra::center(&self.p0, &self.p1)
    }

    #[inline]
    pub fn length(&self) -> f32 {
        (self.p1 - self.p0).norm()
    }
}

/// Fixed vertical extent every reported lane line spans, plus the horizontal clamp.
///
/// `y_top < y_bottom` are pixel rows; `x_max` is `W - 1`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExtrapolationWindow {
    pub y_top: f32,
    pub y_bottom: f32,
    pub x_max: f32,
}

impl ExtrapolationWindow {
    pub fn new(y_top: f32, y_bottom: f32, frame_width: usize) -> Self {
        Self {
            y_top,
            y_bottom,
            x_max: frame_width.saturating_sub(1) as f32,
        }
    }

    #[inline]
    pub fn clamp_x(&self, x: f32) -> f32 {
        x.clamp(0.0, self.x_max)
    }
}

/// Representative line for one lane side in one frame.
///
/// `slope`/`intercept` describe the unclamped fit `y = slope * x + intercept`.
/// `top`/`bottom` are the reported endpoints: their `y` equals the window's
/// `y_top`/`y_bottom` exactly and their `x` is clamped into `[0, W-1]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LaneLine {
    pub slope: f32,
    pub intercept: f32,
    pub top: Point2<f32>,
    pub bottom: Point2<f32>,
}

impl LaneLine {
    /// Extrapolate `y = slope * x + intercept` over the window.
    ///
    /// Returns `None` for non-finite or (near) horizontal lines.
    pub fn from_slope_intercept(
        slope: f32,
        intercept: f32,
        window: &ExtrapolationWindow,
    ) -> Option<Self> {
        if !slope.is_finite() || !intercept.is_finite() || slope.abs() < MIN_INVERTIBLE_SLOPE {
            return None;
        }
        let x_top = (window.y_top - intercept) / slope;
        let x_bottom = (window.y_bottom - intercept) / slope;
        if !x_top.is_finite() || !x_bottom.is_finite() {
            return None;
        }
        Some(Self {
            slope,
            intercept,
            top: Point2::new(window.clamp_x(x_top), window.y_top),
            bottom: Point2::new(window.clamp_x(x_bottom), window.y_bottom),
        })
    }

    /// Extrapolate a line given in the form `x = a * y + c`.
    ///
    /// Returns `None` for vertical (`a == 0`) or non-finite input.
    pub fn from_inverse(a: f32, c: f32, window: &ExtrapolationWindow) -> Option<Self> {
        if !a.is_finite() || !c.is_finite() || a == 0.0 {
            return None;
        }
        let slope = 1.0 / a;
        Self::from_slope_intercept(slope, -c * slope, window)
    }

    /// Line coefficients `(a, c)` of `x = a * y + c`.
    #[inline]
    pub fn inverse_form(&self) -> (f32, f32) {
        let a = 1.0 / self.slope;
        (a, -self.intercept * a)
    }

    /// Unclamped `x` of the fitted line at row `y`.
    #[inline]
    pub fn x_at(&self, y: f32) -> f32 {
        (y - self.intercept) / self.slope
    }

    /// Endpoints rounded to integer pixels, `[top, bottom]`.
    pub fn pixel_endpoints(&self) -> [[i32; 2]; 2] {
        [
            [self.top.x.round() as i32, self.top.y.round() as i32],
            [self.bottom.x.round() as i32, self.bottom.y.round() as i32],
        ]
    }
}
