//! Probabilistic line-voting transform producing finite segments.
//!
//! Edge pixels are visited in a shuffled (seeded) order. Each pixel votes
//! into a `(theta, rho)` accumulator; as soon as a cell reaches the vote
//! threshold, the line through the current pixel is walked in both directions
//! along the edge map, bridging gaps up to `max_line_gap`. Pixels on an
//! accepted segment are removed from the map and their votes withdrawn, so
//! every edge pixel contributes to at most one segment.

use crate::ConfigError;
use lane_detect_core::{EdgeMap, Segment};
use log::debug;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Fixed-point precision used while stepping along a candidate line.
const SHIFT: u32 = 16;

/// Line-voting parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HoughParams {
    /// Distance resolution of the accumulator, pixels.
    pub rho: f32,
    /// Angular resolution of the accumulator, degrees.
    pub theta_deg: f32,
    /// Minimum votes before a line is traced.
    pub threshold: u32,
    /// Shorter segments are discarded (pixels, measured along the dominant axis).
    pub min_line_length: f32,
    /// Maximum run of missing edge pixels bridged within one segment.
    pub max_line_gap: f32,
    /// Seed of the pixel visiting order.
    pub seed: u64,
}

impl Default for HoughParams {
    fn default() -> Self {
        Self {
            rho: 1.0,
            theta_deg: 1.0,
            threshold: 15,
            min_line_length: 40.0,
            max_line_gap: 20.0,
            seed: 0,
        }
    }
}

impl HoughParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.rho.is_finite() || self.rho <= 0.0 {
            return Err(ConfigError::InvalidHough("rho must be > 0"));
        }
        if !self.theta_deg.is_finite() || self.theta_deg <= 0.0 || self.theta_deg >= 180.0 {
            return Err(ConfigError::InvalidHough("theta_deg must be in (0, 180)"));
        }
        if self.threshold == 0 {
            return Err(ConfigError::InvalidHough("threshold must be >= 1"));
        }
        if i32::try_from(self.threshold).is_err() {
            return Err(ConfigError::InvalidHough("threshold must be <= i32::MAX"));
        }
        if !self.min_line_length.is_finite() || self.min_line_length < 0.0 {
            return Err(ConfigError::InvalidHough("min_line_length must be >= 0"));
        }
        if !self.max_line_gap.is_finite() || self.max_line_gap < 0.0 {
            return Err(ConfigError::InvalidHough("max_line_gap must be >= 0"));
        }
        Ok(())
    }
}

/// Reusable line extractor; buffers are kept between frames.
#[derive(Clone, Debug)]
pub struct LineExtractor {
    params: HoughParams,
    /// `(cos, sin) / rho` per accumulator angle.
    trig: Vec<(f32, f32)>,
    accum: Vec<i32>,
    mask: Vec<u8>,
}

impl LineExtractor {
    pub fn new(params: HoughParams) -> Result<Self, ConfigError> {
        params.validate()?;
        let theta = params.theta_deg.to_radians();
        let num_angle = ((PI / theta).round() as usize).max(1);
        let irho = 1.0 / params.rho;
        let trig = (0..num_angle)
            .map(|n| {
                let ang = n as f32 * theta;
                (ang.cos() * irho, ang.sin() * irho)
            })
            .collect();
        Ok(Self {
            params,
            trig,
            accum: Vec::new(),
            mask: Vec::new(),
        })
    }

    #[inline]
    pub fn params(&self) -> &HoughParams {
        &self.params
    }

    /// Detect line segments. An empty or malformed edge map yields an empty vector.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self, edges), fields(width = edges.width, height = edges.height))
    )]
    pub fn extract(&mut self, edges: &EdgeMap) -> Vec<Segment> {
        let Self {
            params,
            trig,
            accum,
            mask,
        } = self;
        let (w, h) = edges.dimensions();
        let mut segments = Vec::new();
        if edges.validate().is_err() {
            return segments;
        }

        let num_rho = ((((w + h) * 2 + 1) as f32 / params.rho).round() as usize).max(1);
        accum.clear();
        accum.resize(trig.len() * num_rho, 0);
        mask.clear();
        mask.extend(edges.data.iter().map(|&v| u8::from(v != 0)));

        let mut points: Vec<(usize, usize)> = mask
            .iter()
            .enumerate()
            .filter(|&(_, &m)| m != 0)
            .map(|(idx, _)| (idx % w, idx / w))
            .collect();
        if points.is_empty() {
            return segments;
        }
        let mut rng = StdRng::seed_from_u64(params.seed);
        points.shuffle(&mut rng);

        let threshold = params.threshold as i32;
        let min_len = params.min_line_length;
        let (wi, hi) = (w as i64, h as i64);

        for &(px, py) in &points {
            // Already consumed by an earlier segment.
            if mask[py * w + px] == 0 {
                continue;
            }

            let mut max_val = threshold - 1;
            let mut max_n = 0usize;
            for (n, &(c, s)) in trig.iter().enumerate() {
                if let Some(r) = rho_index(px, py, c, s, num_rho) {
                    let cell = &mut accum[n * num_rho + r];
                    *cell += 1;
                    if *cell > max_val {
                        max_val = *cell;
                        max_n = n;
                    }
                }
            }
            if max_val < threshold {
                continue;
            }

            let walk = LineWalk::new(px, py, trig[max_n]);

            let mut line_end = [(px as i64, py as i64); 2];
            for (k, end) in line_end.iter_mut().enumerate() {
                let mut gap = 0u32;
                for (x, y) in walk.steps(k == 1) {
                    if x < 0 || y < 0 || x >= wi || y >= hi {
                        break;
                    }
                    if mask[y as usize * w + x as usize] != 0 {
                        gap = 0;
                        *end = (x, y);
                    } else {
                        gap += 1;
                        if gap as f32 > params.max_line_gap {
                            break;
                        }
                    }
                }
            }

            let good_line = (line_end[1].0 - line_end[0].0).abs() as f32 >= min_len
                || (line_end[1].1 - line_end[0].1).abs() as f32 >= min_len;

            for (k, &end) in line_end.iter().enumerate() {
                for (x, y) in walk.steps(k == 1) {
                    if x < 0 || y < 0 || x >= wi || y >= hi {
                        break;
                    }
                    let (xu, yu) = (x as usize, y as usize);
                    let idx = yu * w + xu;
                    if mask[idx] != 0 {
                        if good_line {
                            for (n, &(c, s)) in trig.iter().enumerate() {
                                if let Some(r) = rho_index(xu, yu, c, s, num_rho) {
                                    accum[n * num_rho + r] -= 1;
                                }
                            }
                        }
                        mask[idx] = 0;
                    }
                    if (x, y) == end {
                        break;
                    }
                }
            }

            if good_line {
                segments.push(Segment::new(
                    line_end[0].0 as f32,
                    line_end[0].1 as f32,
                    line_end[1].0 as f32,
                    line_end[1].1 as f32,
                ));
            }
        }

        debug!(
            "line voting: {} edge pixels -> {} segments",
            points.len(),
            segments.len()
        );
        segments
    }
}

#[inline]
fn rho_index(x: usize, y: usize, c: f32, s: f32, num_rho: usize) -> Option<usize> {
    let r = (x as f32 * c + y as f32 * s).round() as i64 + (num_rho as i64 - 1) / 2;
    (r >= 0 && (r as usize) < num_rho).then_some(r as usize)
}

/// Fixed-point stepping along a line through a seed pixel.
///
/// The dominant axis advances one pixel per step; the other advances by the
/// line's slope in `SHIFT`-bit fixed point.
#[derive(Clone, Copy, Debug)]
struct LineWalk {
    x0: i64,
    y0: i64,
    dx: i64,
    dy: i64,
    x_major: bool,
}

impl LineWalk {
    fn new(px: usize, py: usize, (c, s): (f32, f32)) -> Self {
        // Direction along the line is perpendicular to the normal (c, s).
        let a = -(s as f64);
        let b = c as f64;
        let one = (1i64 << SHIFT) as f64;
        let half = 1i64 << (SHIFT - 1);
        if a.abs() > b.abs() {
            Self {
                x0: px as i64,
                y0: ((py as i64) << SHIFT) + half,
                dx: if a > 0.0 { 1 } else { -1 },
                dy: (b * one / a.abs()).round() as i64,
                x_major: true,
            }
        } else {
            Self {
                x0: ((px as i64) << SHIFT) + half,
                y0: py as i64,
                dx: (a * one / b.abs()).round() as i64,
                dy: if b > 0.0 { 1 } else { -1 },
                x_major: false,
            }
        }
    }

    /// Pixel positions starting at the seed (inclusive), forward or backward.
    fn steps(self, backward: bool) -> impl Iterator<Item = (i64, i64)> {
        let (dx, dy) = if backward {
            (-self.dx, -self.dy)
        } else {
            (self.dx, self.dy)
        };
        let x_major = self.x_major;
        (0i64..).map(move |i| {
            let x = self.x0 + i * dx;
            let y = self.y0 + i * dy;
            if x_major {
                (x, y >> SHIFT)
            } else {
                (x >> SHIFT, y)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draw_line(map: &mut EdgeMap, x0: f32, y0: f32, x1: f32, y1: f32) {
        let steps = (x1 - x0).abs().max((y1 - y0).abs()).ceil() as usize;
        for i in 0..=steps {
            let t = i as f32 / steps.max(1) as f32;
            let x = x0 + t * (x1 - x0);
            let y = y0 + t * (y1 - y0);
            map.set_edge(x.round() as i64, y.round() as i64);
        }
    }

    fn diagonal(n: usize) -> EdgeMap {
        let mut map = EdgeMap::new(n, n);
        for i in 0..n as i64 {
            map.set_edge(i, i);
        }
        map
    }

    #[test]
    fn empty_map_yields_no_segments() {
        let mut ex = LineExtractor::new(HoughParams::default()).unwrap();
        assert!(ex.extract(&EdgeMap::new(64, 48)).is_empty());
    }

    #[test]
    fn finds_a_single_diagonal_line() {
        let mut map = EdgeMap::new(200, 200);
        for dx in [-1.0, 0.0, 1.0] {
            draw_line(&mut map, 20.0 + dx, 180.0, 120.0 + dx, 30.0);
        }
        let mut ex = LineExtractor::new(HoughParams::default()).unwrap();
        let segments = ex.extract(&map);
        assert!(!segments.is_empty());
        for s in &segments {
            let slope = s.slope().expect("non-vertical");
            assert!((slope + 1.5).abs() < 0.1, "slope {slope}");
        }
        let longest = segments
            .iter()
            .map(|s| s.length())
            .fold(0.0f32, f32::max);
        assert!(longest > 80.0, "longest segment {longest}");
    }

    #[test]
    fn bridges_small_gaps_only() {
        let mut map = EdgeMap::new(200, 100);
        draw_line(&mut map, 10.0, 50.0, 80.0, 50.0);
        draw_line(&mut map, 90.0, 50.0, 180.0, 50.0);
        let params = HoughParams {
            max_line_gap: 15.0,
            ..Default::default()
        };
        let segments = LineExtractor::new(params).unwrap().extract(&map);
        assert_eq!(segments.len(), 1);
        assert!(segments[0].length() > 160.0);

        let params = HoughParams {
            max_line_gap: 3.0,
            ..Default::default()
        };
        let segments = LineExtractor::new(params).unwrap().extract(&map);
        assert_eq!(segments.len(), 2);
    }

    #[test]
    fn short_runs_are_dropped() {
        let mut map = EdgeMap::new(100, 100);
        draw_line(&mut map, 10.0, 10.0, 30.0, 10.0);
        let segments = LineExtractor::new(HoughParams::default())
            .unwrap()
            .extract(&map);
        assert!(segments.is_empty());
    }

    #[test]
    fn same_seed_is_deterministic() {
        let mut map = EdgeMap::new(160, 120);
        draw_line(&mut map, 10.0, 110.0, 70.0, 20.0);
        draw_line(&mut map, 150.0, 110.0, 90.0, 20.0);
        let mut a = LineExtractor::new(HoughParams::default()).unwrap();
        let mut b = LineExtractor::new(HoughParams::default()).unwrap();
        assert_eq!(a.extract(&map), b.extract(&map));
    }

    #[test]
    fn rejects_invalid_params() {
        let p = HoughParams {
            rho: 0.0,
            ..Default::default()
        };
        assert!(LineExtractor::new(p).is_err());
        let p = HoughParams {
            threshold: 0,
            ..Default::default()
        };
        assert!(LineExtractor::new(p).is_err());
        let p = HoughParams {
            threshold: 1 << 31,
            ..Default::default()
        };
        assert!(matches!(
            LineExtractor::new(p),
            Err(ConfigError::InvalidHough("threshold must be <= i32::MAX"))
        ));
        let p = HoughParams {
            threshold: i32::MAX as u32,
            ..Default::default()
        };
        let mut extractor = LineExtractor::new(p).unwrap();
        assert!(extractor.extract(&diagonal(64)).is_empty());
    }

    #[test]
    fn short_edge_buffers_yield_no_segments() {
        let mut extractor = LineExtractor::new(HoughParams::default()).unwrap();
        let mut edges = diagonal(64);
        edges.data.truncate(64 * 40);
        assert!(extractor.extract(&edges).is_empty());
    }
}
