//! Core types and utilities for road-scene lane detection.
//!
//! This crate is intentionally small and purely geometric. It does *not*
//! depend on any concrete image decoding crate or vision primitives; the
//! pipeline stages live in `lane-detect`.
//!
//! Coordinate convention used everywhere: origin at the top-left pixel,
//! `x` grows to the right, `y` grows downward. Slopes are `dy/dx` in that
//! frame, so a left lane boundary (rising toward the vanishing point as it
//! moves right) has a *negative* slope and a right boundary a positive one.

mod geometry;
mod image;
mod logger;

pub use geometry::{frame_center_x, ExtrapolationWindow, LaneLine, LaneSide, Segment};
pub use image::{EdgeMap, FrameError, FrameView, GrayImage, GrayImageView, PixelLayout};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
