use std::path::Path;

use image::GrayImage;
use ndarray::Array3;

use crate::model::{Axis, AxisMap, ScanVolume};

use super::util::to_u8_samples;
use super::{IoError, Result};

/// A flat raster is a one-slice volume; color inputs are reduced to luma.
pub(crate) fn read_raster(path: &Path) -> Result<ScanVolume> {
    let image = image::open(path)?.to_luma8();
    let (width, height) = image.dimensions();
    let values = image
        .pixels()
        .map(|pixel| f32::from(pixel.0[0]))
        .collect::<Vec<_>>();
    let (normalized, (min, max)) = to_u8_samples(&values);
    let data = Array3::from_shape_vec((1, height as usize, width as usize), normalized)?;
    let volume = ScanVolume::new(data, AxisMap::new(1.0, 1.0, 1.0))?;
    Ok(volume.with_intensity_range(min, max))
}

pub(crate) fn write_raster(path: &Path, volume: &ScanVolume) -> Result<()> {
    let depth = volume.shape().z;
    if depth != 1 {
        return Err(IoError::SliceCount(depth));
    }
    let image: GrayImage = volume
        .slice_image(Axis::Z, 0)
        .ok_or(IoError::SliceCount(depth))?;
    image.save(path)?;
    Ok(())
}
