use std::path::PathBuf;

use image::GrayImage;
use ndarray::{Array3, ArrayView2, s};

use super::{Axis, AxisMap, Result, VolumeExtent};

/// Display-ready scan: samples normalized to `u8`, indexed `(z, y, x)`.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanVolume {
    pub data: Array3<u8>,
    pub spacing: AxisMap<f32>,
    /// Raw sample range before normalization.
    pub intensity_range: (f32, f32),
    pub source: Option<PathBuf>,
}

impl ScanVolume {
    pub fn new(data: Array3<u8>, spacing: AxisMap<f32>) -> Result<Self> {
        let volume = Self {
            data,
            spacing,
            intensity_range: (0.0, 255.0),
            source: None,
        };
        volume.extent()?;
        Ok(volume)
    }

    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_intensity_range(mut self, min: f32, max: f32) -> Self {
        self.intensity_range = (min, max);
        self
    }

    pub fn shape(&self) -> AxisMap<usize> {
        let (z, y, x) = self.data.dim();
        AxisMap::new(x, y, z)
    }

    pub fn extent(&self) -> Result<VolumeExtent> {
        VolumeExtent::new(self.shape(), self.spacing)
    }

    /// Plane through the volume at `index` along `axis`.
    ///
    /// The X view fixes x and spans `(z, y)`, the Y view fixes y and spans
    /// `(z, x)`, the Z view fixes z and spans `(y, x)`. Depth is always the
    /// vertical axis of the cross-sections.
    pub fn plane(&self, axis: Axis, index: usize) -> Option<ArrayView2<'_, u8>> {
        if index >= self.shape()[axis] {
            return None;
        }
        Some(match axis {
            Axis::X => self.data.slice(s![.., .., index]),
            Axis::Y => self.data.slice(s![.., index, ..]),
            Axis::Z => self.data.slice(s![index, .., ..]),
        })
    }

    pub fn slice_image(&self, axis: Axis, index: usize) -> Option<GrayImage> {
        let plane = self.plane(axis, index)?;
        let (height, width) = plane.dim();
        let pixels = plane.iter().copied().collect::<Vec<_>>();
        GrayImage::from_raw(width as u32, height as u32, pixels)
    }
}
