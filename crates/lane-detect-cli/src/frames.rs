//! Image-sequence input: a directory of frames processed in file-name order.

use std::fs;
use std::path::{Path, PathBuf};

const FRAME_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp"];

fn is_frame(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| FRAME_EXTENSIONS.iter().any(|ext| e.eq_ignore_ascii_case(ext)))
}

/// Frame files in `dir`, sorted by file name.
pub fn list_frames(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut frames = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_frame(&path) {
            frames.push(path);
        }
    }
    frames.sort();
    Ok(frames)
}

/// Decode a frame as 8-bit RGB.
pub fn load_frame(path: &Path) -> Result<image::RgbImage, image::ImageError> {
    Ok(image::ImageReader::open(path)?.decode()?.to_rgb8())
}
