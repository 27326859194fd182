//! Frame to edge map: luma, Gaussian smoothing, Canny hysteresis thresholding.

use crate::ConfigError;
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use lane_detect_core::{EdgeMap, FrameError, FrameView, GrayImage};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Smoothing and edge-threshold settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessParams {
    /// Odd Gaussian kernel size (>= 3). The blur sigma is derived from it.
    pub blur_kernel_size: usize,
    /// Lower hysteresis threshold on gradient magnitude.
    pub canny_low: f32,
    /// Upper hysteresis threshold on gradient magnitude.
    pub canny_high: f32,
}

impl Default for PreprocessParams {
    fn default() -> Self {
        Self {
            blur_kernel_size: 5,
            canny_low: 50.0,
            canny_high: 150.0,
        }
    }
}

impl PreprocessParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let k = self.blur_kernel_size;
        if k < 3 || k % 2 == 0 {
            return Err(ConfigError::InvalidKernelSize { size: k });
        }
        let (low, high) = (self.canny_low, self.canny_high);
        if !low.is_finite() || !high.is_finite() || low < 0.0 || low >= high {
            return Err(ConfigError::InvalidEdgeThresholds { low, high });
        }
        Ok(())
    }

    /// Sigma of a Gaussian whose support matches `blur_kernel_size`.
    ///
    /// Same rule image libraries use when only a kernel size is given:
    /// `0.3 * ((k - 1) / 2 - 1) + 0.8`.
    pub fn blur_sigma(&self) -> f32 {
        let k = self.blur_kernel_size as f32;
        0.3 * ((k - 1.0) * 0.5 - 1.0) + 0.8
    }
}

/// Converts raw frames into binary edge maps of identical size.
#[derive(Clone, Debug)]
pub struct FramePreprocessor {
    params: PreprocessParams,
}

impl FramePreprocessor {
    pub fn new(params: PreprocessParams) -> Result<Self, ConfigError> {
        params.validate()?;
        Ok(Self { params })
    }

    #[inline]
    pub fn params(&self) -> &PreprocessParams {
        &self.params
    }

    /// Luma, blur and edge thresholding in one call.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self, frame), fields(width = frame.width, height = frame.height))
    )]
    pub fn process(&self, frame: &FrameView<'_>) -> Result<EdgeMap, FrameError> {
        frame.validate()?;
        let gray = frame.to_luma();
        let blurred = self.smooth(&gray)?;
        self.edges(&blurred)
    }

    /// Gaussian smoothing of a single-channel image.
    pub fn smooth(&self, gray: &GrayImage) -> Result<GrayImage, FrameError> {
        let img = to_image_gray(gray)?;
        let blurred = gaussian_blur_f32(&img, self.params.blur_sigma());
        Ok(from_image_gray(blurred))
    }

    /// Canny edge detection; edge pixels are 255, everything else 0.
    pub fn edges(&self, gray: &GrayImage) -> Result<EdgeMap, FrameError> {
        let img = to_image_gray(gray)?;
        let edges = canny(&img, self.params.canny_low, self.params.canny_high);
        Ok(EdgeMap::from(from_image_gray(edges)))
    }
}

fn to_image_gray(gray: &GrayImage) -> Result<image::GrayImage, FrameError> {
    let bad_size = || FrameError::TooLarge {
        width: gray.width,
        height: gray.height,
    };
    let w = u32::try_from(gray.width).map_err(|_| bad_size())?;
    let h = u32::try_from(gray.height).map_err(|_| bad_size())?;
    let expected = gray.width * gray.height;
    image::GrayImage::from_raw(w, h, gray.data.clone()).ok_or(FrameError::BufferLength {
        expected,
        got: gray.data.len(),
    })
}

fn from_image_gray(img: image::GrayImage) -> GrayImage {
    let (w, h) = img.dimensions();
    GrayImage {
        width: w as usize,
        height: h as usize,
        data: img.into_raw(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lane_detect_core::PixelLayout;

    fn step_frame(w: usize, h: usize) -> Vec<u8> {
        // Dark left half, bright right half, BGR.
        let mut data = vec![0u8; w * h * 3];
        for y in 0..h {
            for x in w / 2..w {
                let i = (y * w + x) * 3;
                data[i..i + 3].copy_from_slice(&[220, 220, 220]);
            }
        }
        data
    }

    #[test]
    fn output_keeps_frame_dimensions() {
        let pre = FramePreprocessor::new(PreprocessParams::default()).unwrap();
        for &(w, h) in &[(64usize, 48usize), (33, 17), (5, 5)] {
            let data = step_frame(w, h);
            let frame = FrameView::new(w, h, PixelLayout::Bgr, &data).unwrap();
            let edges = pre.process(&frame).unwrap();
            assert_eq!(edges.dimensions(), (w, h));
        }
    }

    #[test]
    fn step_edge_is_detected_and_flat_frame_is_empty() {
        let pre = FramePreprocessor::new(PreprocessParams::default()).unwrap();
        let data = step_frame(64, 48);
        let frame = FrameView::new(64, 48, PixelLayout::Bgr, &data).unwrap();
        let edges = pre.process(&frame).unwrap();
        assert!(edges.count_edges() > 0);
        // Edge pixels hug the intensity step.
        for y in 0..48 {
            for x in 0..64 {
                if edges.is_edge(x, y) {
                    assert!((x as i32 - 32).abs() <= 3, "stray edge at ({x}, {y})");
                }
            }
        }

        let flat = vec![90u8; 64 * 48];
        let frame = FrameView::new(64, 48, PixelLayout::Gray, &flat).unwrap();
        assert_eq!(pre.process(&frame).unwrap().count_edges(), 0);
    }

    #[test]
    fn invalid_frames_are_rejected() {
        let pre = FramePreprocessor::new(PreprocessParams::default()).unwrap();
        let frame = FrameView {
            width: 0,
            height: 4,
            layout: PixelLayout::Gray,
            data: &[],
        };
        assert!(matches!(
            pre.process(&frame),
            Err(FrameError::ZeroSized { .. })
        ));
    }

    #[test]
    fn validates_kernel_and_thresholds() {
        let even = PreprocessParams {
            blur_kernel_size: 4,
            ..Default::default()
        };
        assert!(matches!(
            even.validate(),
            Err(ConfigError::InvalidKernelSize { size: 4 })
        ));
        let inverted = PreprocessParams {
            canny_low: 200.0,
            canny_high: 100.0,
            ..Default::default()
        };
        assert!(matches!(
            inverted.validate(),
            Err(ConfigError::InvalidEdgeThresholds { .. })
        ));
        assert!((PreprocessParams::default().blur_sigma() - 1.1).abs() < 1e-6);
    }
}
