use std::path::Path;

use image::RgbaImage;

use crate::model::ScanVolume;

use super::raster::{read_raster, write_raster};
use super::tiff::{read_tiff, write_tiff};
use super::util::extension;
use super::{IoError, Result};

/// Opens a scan. TIFF pages become depth slices; a single raster is a one-slice volume.
pub fn read_volume(path: impl AsRef<Path>) -> Result<ScanVolume> {
    let path = path.as_ref();
    let extension = extension(path)?;
    let volume = match extension.as_str() {
        "png" | "jpg" | "jpeg" => read_raster(path)?,
        "tif" | "tiff" => read_tiff(path)?,
        other => return Err(IoError::UnknownScanType(other.to_string())),
    };
    log::info!(
        "read {} with {} slices of {}x{}",
        path.display(),
        volume.shape().z,
        volume.shape().x,
        volume.shape().y
    );
    Ok(volume.with_source(path))
}

pub fn write_volume(path: impl AsRef<Path>, volume: &ScanVolume) -> Result<()> {
    let path = path.as_ref();
    let extension = extension(path)?;
    match extension.as_str() {
        "png" | "jpg" | "jpeg" => write_raster(path, volume),
        "tif" | "tiff" => write_tiff(path, volume),
        other => Err(IoError::UnknownScanType(other.to_string())),
    }
}

pub fn supported_formats() -> &'static [&'static str] {
    &["png", "jpg", "jpeg", "tif", "tiff"]
}

pub fn save_canvas_png(canvas: &RgbaImage, path: &Path) -> Result<()> {
    canvas.save_with_format(path, image::ImageFormat::Png)?;
    Ok(())
}
