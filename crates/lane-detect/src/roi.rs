//! Region-of-interest masking: keep only edge pixels inside the road polygon.

use crate::ConfigError;
use lane_detect_core::EdgeMap;
use log::debug;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Distance (pixels) within which a point counts as lying on a polygon edge.
const BOUNDARY_EPS: f32 = 1e-3;

/// Road-surface polygon in frame-relative coordinates.
///
/// Each vertex is `[x, y]` as a fraction of the frame: `0.0` is the first
/// pixel column/row, `1.0` the last one. Vertices may lie outside `[0, 1]`;
/// the parts of the polygon outside the frame simply select nothing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoiParams {
    pub polygon: Vec<[f32; 2]>,
}

impl Default for RoiParams {
    fn default() -> Self {
        // Wide at the bottom, narrow just below the horizon.
        Self {
            polygon: vec![[0.05, 1.0], [0.45, 0.6], [0.55, 0.6], [0.95, 1.0]],
        }
    }
}

impl RoiParams {
    /// Region covering the whole frame.
    pub fn full_frame() -> Self {
        Self {
            polygon: vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]],
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let vertices = self.polygon.len();
        if vertices < 3 {
            return Err(ConfigError::DegenerateRoi { vertices });
        }
        if self.polygon.iter().flatten().any(|v| !v.is_finite()) {
            return Err(ConfigError::DegenerateRoi { vertices });
        }
        let twice_area: f32 = self
            .polygon
            .iter()
            .zip(self.polygon.iter().cycle().skip(1))
            .map(|(a, b)| a[0] * b[1] - b[0] * a[1])
            .sum();
        if twice_area.abs() <= f32::EPSILON {
            return Err(ConfigError::DegenerateRoi { vertices });
        }
        Ok(())
    }

    /// Polygon scaled to a `width` x `height` frame.
    pub fn to_pixels(&self, width: usize, height: usize) -> RoiPolygon {
        let sx = width.saturating_sub(1) as f32;
        let sy = height.saturating_sub(1) as f32;
        RoiPolygon {
            vertices: self
                .polygon
                .iter()
                .map(|&[fx, fy]| Point2::new(fx * sx, fy * sy))
                .collect(),
        }
    }
}

/// Closed polygon in pixel coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct RoiPolygon {
    pub vertices: Vec<Point2<f32>>,
}

impl RoiPolygon {
    fn edges(&self) -> impl Iterator<Item = (Point2<f32>, Point2<f32>)> + '_ {
        self.vertices
            .iter()
            .copied()
            .zip(self.vertices.iter().copied().cycle().skip(1))
    }

    /// Even-odd containment test; points on the boundary are inside.
    pub fn contains(&self, p: Point2<f32>) -> bool {
        let mut inside = false;
        for (a, b) in self.edges() {
            if on_segment(p, a, b) {
                return true;
            }
            if (a.y > p.y) != (b.y > p.y) {
                let x_cross = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
                if p.x < x_cross {
                    inside = !inside;
                }
            }
        }
        inside
    }

    /// Pixel-aligned bounding box `(x0, y0, x1, y1)` clipped to the frame, inclusive.
    fn clipped_bounds(&self, width: usize, height: usize) -> Option<(usize, usize, usize, usize)> {
        if width == 0 || height == 0 || self.vertices.is_empty() {
            return None;
        }
        let (mut min_x, mut min_y) = (f32::INFINITY, f32::INFINITY);
        let (mut max_x, mut max_y) = (f32::NEG_INFINITY, f32::NEG_INFINITY);
        for v in &self.vertices {
            min_x = min_x.min(v.x);
            min_y = min_y.min(v.y);
            max_x = max_x.max(v.x);
            max_y = max_y.max(v.y);
        }
        let x_lim = (width - 1) as f32;
        let y_lim = (height - 1) as f32;
        if max_x < 0.0 || max_y < 0.0 || min_x > x_lim || min_y > y_lim {
            return None;
        }
        Some((
            min_x.max(0.0).floor() as usize,
            min_y.max(0.0).floor() as usize,
            max_x.min(x_lim).ceil() as usize,
            max_y.min(y_lim).ceil() as usize,
        ))
    }
}

fn on_segment(p: Point2<f32>, a: Point2<f32>, b: Point2<f32>) -> bool {
    let ab = b - a;
    let ap = p - a;
    let len2 = ab.norm_squared();
    if len2 <= f32::EPSILON {
        return ap.norm() <= BOUNDARY_EPS;
    }
    let cross = ab.x * ap.y - ab.y * ap.x;
    if cross.abs() > BOUNDARY_EPS * len2.sqrt() {
        return false;
    }
    let t = ab.dot(&ap);
    t >= 0.0 && t <= len2
}

#[derive(Clone, Debug)]
struct CachedMask {
    width: usize,
    height: usize,
    keep: Vec<bool>,
}

/// Zeroes edge pixels outside the configured polygon.
///
/// The per-pixel mask is rasterized once per frame size and reused.
#[derive(Clone, Debug)]
pub struct RegionMasker {
    params: RoiParams,
    cache: Option<CachedMask>,
}

impl RegionMasker {
    pub fn new(params: RoiParams) -> Result<Self, ConfigError> {
        params.validate()?;
        Ok(Self {
            params,
            cache: None,
        })
    }

    #[inline]
    pub fn params(&self) -> &RoiParams {
        &self.params
    }

    /// Per-pixel keep mask for a frame size (row-major).
    pub fn mask(&mut self, width: usize, height: usize) -> &[bool] {
        let stale = !matches!(&self.cache, Some(c) if c.width == width && c.height == height);
        if stale {
            let keep = rasterize(&self.params.to_pixels(width, height), width, height);
            debug!(
                "roi mask {}x{}: {} of {} pixels kept",
                width,
                height,
                keep.iter().filter(|&&k| k).count(),
                keep.len()
            );
            self.cache = Some(CachedMask {
                width,
                height,
                keep,
            });
        }
        match &self.cache {
            Some(c) => &c.keep,
            None => &[],
        }
    }

    /// Apply the region mask to an edge map.
    pub fn apply(&mut self, mut edges: EdgeMap) -> EdgeMap {
        let (w, h) = edges.dimensions();
        let keep = self.mask(w, h);
        for (px, &k) in edges.data.iter_mut().zip(keep.iter()) {
            if !k {
                *px = 0;
            }
        }
        edges
    }
}

fn rasterize(polygon: &RoiPolygon, width: usize, height: usize) -> Vec<bool> {
    let mut keep = vec![false; width * height];
    let Some((x0, y0, x1, y1)) = polygon.clipped_bounds(width, height) else {
        return keep;
    };
    for y in y0..=y1 {
        for x in x0..=x1 {
            if polygon.contains(Point2::new(x as f32, y as f32)) {
                keep[y * width + x] = true;
            }
        }
    }
    keep
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_edges(w: usize, h: usize) -> EdgeMap {
        EdgeMap {
            width: w,
            height: h,
            data: vec![255; w * h],
        }
    }

    #[test]
    fn full_frame_polygon_keeps_everything() {
        let mut masker = RegionMasker::new(RoiParams::full_frame()).unwrap();
        let out = masker.apply(full_edges(40, 30));
        assert_eq!(out.count_edges(), 40 * 30);
    }

    #[test]
    fn pixels_outside_polygon_are_zero() {
        let params = RoiParams::default();
        let (w, h) = (80, 60);
        let polygon = params.to_pixels(w, h);
        let mut masker = RegionMasker::new(params).unwrap();
        let out = masker.apply(full_edges(w, h));
        for y in 0..h {
            for x in 0..w {
                if !polygon.contains(Point2::new(x as f32, y as f32)) {
                    assert!(!out.is_edge(x, y), "pixel ({x}, {y}) should be masked");
                }
            }
        }
        // Sky and bottom corners are gone, the road center survives.
        assert!(!out.is_edge(40, 5));
        assert!(!out.is_edge(0, 59));
        assert!(out.is_edge(40, 55));
    }

    #[test]
    fn polygon_outside_frame_yields_empty_map() {
        let params = RoiParams {
            polygon: vec![[1.5, 1.5], [2.0, 1.5], [2.0, 2.0]],
        };
        let mut masker = RegionMasker::new(params).unwrap();
        assert_eq!(masker.apply(full_edges(20, 20)).count_edges(), 0);
    }

    #[test]
    fn degenerate_polygons_are_rejected() {
        let too_few = RoiParams {
            polygon: vec![[0.0, 0.0], [1.0, 1.0]],
        };
        assert!(matches!(
            too_few.validate(),
            Err(ConfigError::DegenerateRoi { vertices: 2 })
        ));
        let collinear = RoiParams {
            polygon: vec![[0.0, 0.0], [0.5, 0.5], [1.0, 1.0]],
        };
        assert!(collinear.validate().is_err());
        assert!(RoiParams { polygon: vec![] }.validate().is_err());
    }

    #[test]
    fn mask_is_recomputed_for_new_frame_size() {
        let mut masker = RegionMasker::new(RoiParams::full_frame()).unwrap();
        assert_eq!(masker.mask(10, 10).len(), 100);
        assert_eq!(masker.mask(4, 3).len(), 12);
    }
}
