//! Adapters from `image` crate buffers to the pipeline's frame views.

use crate::{LaneDetectError, LaneDetector, LaneResult};
use image::DynamicImage;
use lane_detect_core::{FrameView, PixelLayout};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Borrow an `image::RgbImage` as a frame.
pub fn frame_view_rgb(img: &image::RgbImage) -> FrameView<'_> {
    FrameView {
        width: img.width() as usize,
        height: img.height() as usize,
        layout: PixelLayout::Rgb,
        data: img.as_raw(),
    }
}

/// Borrow an `image::RgbaImage` as a frame.
pub fn frame_view_rgba(img: &image::RgbaImage) -> FrameView<'_> {
    FrameView {
        width: img.width() as usize,
        height: img.height() as usize,
        layout: PixelLayout::Rgba,
        data: img.as_raw(),
    }
}

/// Borrow an `image::GrayImage` as a frame.
pub fn frame_view_gray(img: &image::GrayImage) -> FrameView<'_> {
    FrameView {
        width: img.width() as usize,
        height: img.height() as usize,
        layout: PixelLayout::Gray,
        data: img.as_raw(),
    }
}

/// Run the detector on any decoded image.
///
/// 8-bit gray, RGB and RGBA buffers are used in place; other pixel formats
/// are converted to RGB first.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(detector, img), fields(width = img.width(), height = img.height()))
)]
pub fn detect_lanes_dynamic(
    detector: &mut LaneDetector,
    img: &DynamicImage,
) -> Result<LaneResult, LaneDetectError> {
    match img {
        DynamicImage::ImageLuma8(gray) => detector.process(&frame_view_gray(gray)),
        DynamicImage::ImageRgb8(rgb) => detector.process(&frame_view_rgb(rgb)),
        DynamicImage::ImageRgba8(rgba) => detector.process(&frame_view_rgba(rgba)),
        other => {
            let rgb = other.to_rgb8();
            detector.process(&frame_view_rgb(&rgb))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LaneDetectorParams;

    #[test]
    fn views_match_buffer_layout() {
        let img = image::RgbImage::from_pixel(8, 4, image::Rgb([255, 0, 0]));
        let view = frame_view_rgb(&img);
        assert_eq!(view.dimensions(), (8, 4));
        assert!(view.validate().is_ok());
        // Pure red in RGB order, not BGR.
        assert_eq!(view.to_luma().get(0, 0), 76);
    }

    #[test]
    fn dynamic_images_of_any_format_are_accepted() {
        let mut detector = LaneDetector::new(LaneDetectorParams::default()).unwrap();
        let img = DynamicImage::ImageLumaA8(image::GrayAlphaImage::new(32, 24));
        let result = detect_lanes_dynamic(&mut detector, &img).unwrap();
        assert!(result.left.is_none() && result.right.is_none());
        assert_eq!((result.frame_width, result.frame_height), (32, 24));
    }
}
