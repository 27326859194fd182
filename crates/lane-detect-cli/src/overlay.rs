//! Annotated output frames.

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;
use lane_detect::{LaneLine, LaneResult};

const LANE_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const DEPARTURE_COLOR: Rgb<u8> = Rgb([255, 200, 0]);
const LANE_THICKNESS: i32 = 10;
const FRAME_WEIGHT: f32 = 0.8;
const LAYER_WEIGHT: f32 = 1.0;

/// Draw the result on a black layer and blend it onto the frame.
pub fn render(frame: &RgbImage, result: &LaneResult) -> RgbImage {
    let (w, h) = frame.dimensions();
    let mut layer = RgbImage::new(w, h);
    for line in [&result.left, &result.right].into_iter().flatten() {
        draw_lane(&mut layer, line);
    }
    if result.is_departing() {
        let bar_h = (h / 24).max(4);
        draw_filled_rect_mut(&mut layer, Rect::at(0, 0).of_size(w, bar_h), DEPARTURE_COLOR);
    }
    blend(frame, &layer)
}

fn draw_lane(layer: &mut RgbImage, line: &LaneLine) {
    let half = LANE_THICKNESS / 2;
    for dx in -half..=half {
        let off = dx as f32;
        draw_line_segment_mut(
            layer,
            (line.top.x + off, line.top.y),
            (line.bottom.x + off, line.bottom.y),
            LANE_COLOR,
        );
    }
}

/// `out = 0.8 * frame + 1.0 * layer`, saturating.
fn blend(frame: &RgbImage, layer: &RgbImage) -> RgbImage {
    let mut out = frame.clone();
    for (o, l) in out.pixels_mut().zip(layer.pixels()) {
        for c in 0..3 {
            let v = FRAME_WEIGHT * o[c] as f32 + LAYER_WEIGHT * l[c] as f32;
            o[c] = v.round().clamp(0.0, 255.0) as u8;
        }
    }
    out
}
