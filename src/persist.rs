//! Persistence of capture artifacts.
//!
//! One invocation writes two JPEGs sharing a single timestamp token:
//! the untouched frame into the "original" directory and the configured
//! sub-region into the "cropped" directory. The token is the only pairing
//! contract downstream consumers rely on.
//!
//! Failure ordering is deliberate: a degenerate rectangle aborts before any
//! write; an out-of-bounds rectangle aborts after the original is written,
//! and the original is retained (at-least-one-file, no rollback).

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use chrono::Local;
use image::codecs::jpeg::JpegEncoder;
use image::{imageops, RgbImage};

use crate::error::{CaptureError, Result};

/// Loss parameter for both JPEG artifacts.
pub const JPEG_QUALITY: u8 = 95;

/// Pixel-space sub-region of the source frame. Constant for a given camera
/// mounting; bounds against the actual frame are only checked at crop time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl CropRect {
    pub fn width(&self) -> u32 {
        self.right - self.left
    }

    pub fn height(&self) -> u32 {
        self.bottom - self.top
    }

    /// Rejects degenerate rectangles (`right <= left` or `bottom <= top`).
    pub fn validate_shape(&self) -> Result<()> {
        if self.right <= self.left || self.bottom <= self.top {
            return Err(CaptureError::Crop(format!(
                "degenerate rectangle ({},{})-({},{})",
                self.left, self.top, self.right, self.bottom
            )));
        }
        Ok(())
    }

    fn validate_within(&self, frame_width: u32, frame_height: u32) -> Result<()> {
        if self.right > frame_width || self.bottom > frame_height {
            return Err(CaptureError::Crop(format!(
                "rectangle ({},{})-({},{}) exceeds {}x{} frame",
                self.left, self.top, self.right, self.bottom, frame_width, frame_height
            )));
        }
        Ok(())
    }
}

/// Target directories for the two artifacts. Both must exist before the
/// first write; the binary creates them idempotently at startup.
#[derive(Debug, Clone)]
pub struct OutputDirs {
    pub original_dir: PathBuf,
    pub cropped_dir: PathBuf,
}

/// Second-resolution token extended with milliseconds, lexicographically
/// sortable. Shared verbatim by both filenames of one invocation.
pub fn timestamp_token() -> String {
    Local::now().format("%Y%m%d_%H%M%S_%3f").to_string()
}

/// Writes the full frame and the cropped sub-region, returning both paths.
pub fn persist(
    image: &RgbImage,
    crop: &CropRect,
    dirs: &OutputDirs,
) -> Result<(PathBuf, PathBuf)> {
    crop.validate_shape()?;

    let token = timestamp_token();
    let original_path = dirs
        .original_dir
        .join(format!("snapshot_ori_{}.jpg", token));
    write_jpeg(image, &original_path)?;
    log::info!(
        "saved original {} ({}x{})",
        original_path.display(),
        image.width(),
        image.height()
    );

    crop.validate_within(image.width(), image.height())?;
    let cropped =
        imageops::crop_imm(image, crop.left, crop.top, crop.width(), crop.height()).to_image();
    let cropped_path = dirs
        .cropped_dir
        .join(format!("snapshot_crop_{}.jpg", token));
    write_jpeg(&cropped, &cropped_path)?;
    log::info!(
        "saved cropped {} ({}x{})",
        cropped_path.display(),
        cropped.width(),
        cropped.height()
    );

    Ok((original_path, cropped_path))
}

fn write_jpeg(image: &RgbImage, path: &Path) -> Result<()> {
    let file = File::create(path)
        .map_err(|e| CaptureError::Persist(format!("create {}: {}", path.display(), e)))?;
    let mut writer = BufWriter::new(file);
    JpegEncoder::new_with_quality(&mut writer, JPEG_QUALITY)
        .encode_image(image)
        .map_err(|e| CaptureError::Persist(format!("encode {}: {}", path.display(), e)))?;
    Ok(())
}
