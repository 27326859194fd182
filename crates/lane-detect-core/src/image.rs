//! Lightweight image containers: input frames, grayscale buffers and edge maps.

use serde::{Deserialize, Serialize};

/// Channel order of an interleaved 8-bit frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PixelLayout {
    Gray,
    /// Blue-green-red, the layout produced by most video decoders.
    #[default]
    Bgr,
    Rgb,
    Bgra,
    Rgba,
}

impl PixelLayout {
    /// Number of interleaved channels per pixel.
    #[inline]
    pub fn channels(self) -> usize {
        match self {
            PixelLayout::Gray => 1,
            PixelLayout::Bgr | PixelLayout::Rgb => 3,
            PixelLayout::Bgra | PixelLayout::Rgba => 4,
        }
    }

    /// Decoder-style default layout for a bare channel count.
    ///
    /// Three channels are assumed to be BGR and four BGRA.
    pub fn from_channels(channels: usize) -> Result<Self, FrameError> {
        match channels {
            1 => Ok(PixelLayout::Gray),
            3 => Ok(PixelLayout::Bgr),
            4 => Ok(PixelLayout::Bgra),
            _ => Err(FrameError::UnsupportedChannels { channels }),
        }
    }
}

/// Structural problems with an input frame.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("frame has zero size (width={width}, height={height})")]
    ZeroSized { width: usize, height: usize },
    #[error("frame dimensions {width}x{height} overflow the addressable size")]
    TooLarge { width: usize, height: usize },
    #[error("unsupported channel layout ({channels} channels)")]
    UnsupportedChannels { channels: usize },
    #[error("invalid frame buffer length (expected {expected} bytes, got {got})")]
    BufferLength { expected: usize, got: usize },
    #[error("frame size {got:?} differs from the stream size {expected:?}")]
    DimensionMismatch {
        expected: (usize, usize),
        got: (usize, usize),
    },
}

/// Borrowed, interleaved 8-bit frame for one time step.
#[derive(Clone, Copy, Debug)]
pub struct FrameView<'a> {
    pub width: usize,
    pub height: usize,
    pub layout: PixelLayout,
    pub data: &'a [u8], // row-major, len = w*h*channels
}

impl<'a> FrameView<'a> {
    /// Build a validated frame view.
    pub fn new(
        width: usize,
        height: usize,
        layout: PixelLayout,
        data: &'a [u8],
    ) -> Result<Self, FrameError> {
        let frame = Self {
            width,
            height,
            layout,
            data,
        };
        frame.validate()?;
        Ok(frame)
    }

    /// Build a validated frame from a bare channel count (see [`PixelLayout::from_channels`]).
    pub fn from_channels(
        width: usize,
        height: usize,
        channels: usize,
        data: &'a [u8],
    ) -> Result<Self, FrameError> {
        Self::new(width, height, PixelLayout::from_channels(channels)?, data)
    }

    /// Check dimensions and buffer length.
    pub fn validate(&self) -> Result<(), FrameError> {
        if self.width == 0 || self.height == 0 {
            return Err(FrameError::ZeroSized {
                width: self.width,
                height: self.height,
            });
        }
        let expected = self
            .width
            .checked_mul(self.height)
            .and_then(|n| n.checked_mul(self.layout.channels()))
            .ok_or(FrameError::TooLarge {
                width: self.width,
                height: self.height,
            })?;
        check_len(expected, self.data.len())
    }

    #[inline]
    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Convert to single-channel intensity using BT.601 luma weights.
    ///
    /// Alpha is ignored. The frame is assumed to be valid.
    pub fn to_luma(&self) -> GrayImage {
        let n = self.width * self.height;
        let ch = self.layout.channels();
        let data = match self.layout {
            PixelLayout::Gray => self.data[..n].to_vec(),
            PixelLayout::Bgr | PixelLayout::Bgra => self
                .data
                .chunks_exact(ch)
                .map(|px| luma_bt601(px[2], px[1], px[0]))
                .collect(),
            PixelLayout::Rgb | PixelLayout::Rgba => self
                .data
                .chunks_exact(ch)
                .map(|px| luma_bt601(px[0], px[1], px[2]))
                .collect(),
        };
        GrayImage {
            width: self.width,
            height: self.height,
            data,
        }
    }
}

#[inline]
fn luma_bt601(r: u8, g: u8, b: u8) -> u8 {
    let acc = 299 * r as u32 + 587 * g as u32 + 114 * b as u32;
    ((acc + 500) / 1000) as u8
}

#[derive(Clone, Copy, Debug)]
pub struct GrayImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u8], // row-major, len = w*h
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrayImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl GrayImage {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0; width * height],
        }
    }

    #[inline]
    pub fn view(&self) -> GrayImageView<'_> {
        GrayImageView {
            width: self.width,
            height: self.height,
            data: &self.data,
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }
}

/// Per-pixel edge indicator with the same size as the frame it came from.
///
/// Any nonzero sample is an edge pixel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EdgeMap {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl EdgeMap {
    /// Empty (all-zero) edge map.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0; width * height],
        }
    }

    #[inline]
    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    #[inline]
    pub fn is_edge(&self, x: usize, y: usize) -> bool {
        self.data[y * self.width + x] != 0
    }

    /// Mark `(x, y)` as an edge. Out-of-bounds coordinates are ignored.
    #[inline]
    pub fn set_edge(&mut self, x: i64, y: i64) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        self.data[y as usize * self.width + x as usize] = 255;
    }

    /// Same structural checks as [`FrameView::validate`] for one byte per pixel.
    pub fn validate(&self) -> Result<(), FrameError> {
        if self.width == 0 || self.height == 0 {
            return Err(FrameError::ZeroSized {
                width: self.width,
                height: self.height,
            });
        }
        let expected = self
            .width
            .checked_mul(self.height)
            .ok_or(FrameError::TooLarge {
                width: self.width,
                height: self.height,
            })?;
        check_len(expected, self.data.len())
    }

    pub fn count_edges(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0).count()
    }

    #[inline]
    pub fn view(&self) -> GrayImageView<'_> {
        GrayImageView {
            width: self.width,
            height: self.height,
            data: &self.data,
        }
    }
}

impl From<GrayImage> for EdgeMap {
    fn from(img: GrayImage) -> Self {
        Self {
            width: img.width,
            height: img.height,
            data: img.data,
        }
    }
}

fn check_len(expected: usize, got: usize) -> Result<(), FrameError> {
    if got != expected {
        return Err(FrameError::BufferLength { expected, got });
    }
    Ok(())
}
