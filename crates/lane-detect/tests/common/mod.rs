#![allow(dead_code)]

use lane_detect::EdgeMap;

pub const WIDTH: usize = 640;
pub const HEIGHT: usize = 480;

const ROAD: [u8; 3] = [40, 40, 40];
const PAINT: [u8; 3] = [230, 230, 230];

/// Bottom-row x of the painted stripe centers.
pub const LEFT_STRIPE_X: f32 = 100.0;
pub const RIGHT_STRIPE_X: f32 = 540.0;
/// Topmost painted row.
pub const STRIPE_TOP: usize = 300;
const STRIPE_HALF_WIDTH: f32 = 4.0;

/// BGR road scene with two bright 45-degree stripes converging upward.
///
/// The left stripe center follows `x = 100 + (479 - y)` (slope -1), the right
/// one `x = 540 - (479 - y)` (slope +1).
pub fn road_frame() -> Vec<u8> {
    let mut data = Vec::with_capacity(WIDTH * HEIGHT * 3);
    for y in 0..HEIGHT {
        let d = (HEIGHT - 1 - y) as f32;
        let left = LEFT_STRIPE_X + d;
        let right = RIGHT_STRIPE_X - d;
        for x in 0..WIDTH {
            let xf = x as f32;
            let painted = y >= STRIPE_TOP
                && ((xf - left).abs() <= STRIPE_HALF_WIDTH
                    || (xf - right).abs() <= STRIPE_HALF_WIDTH);
            data.extend_from_slice(if painted { &PAINT } else { &ROAD });
        }
    }
    data
}

/// Plain road without markings.
pub fn blank_frame() -> Vec<u8> {
    ROAD.repeat(WIDTH * HEIGHT)
}

/// One-pixel 45-degree edge lines spanning rows 200..=479: left
/// `y = -(x - shift) + 519`, right `y = (x - shift) - 121`.
///
/// Pixels shifted past the frame border are dropped.
pub fn diagonal_edges(shift: i64) -> EdgeMap {
    let mut map = EdgeMap::new(WIDTH, HEIGHT);
    for y in 200..HEIGHT as i64 {
        map.set_edge(519 - y + shift, y);
        map.set_edge(y + 121 + shift, y);
    }
    map
}
