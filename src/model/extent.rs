use serde::{Deserialize, Serialize};

use super::{Axis, AxisMap, ModelError, Result};

/// Geometry of a loaded scan. Valid indices along every axis are `[0, shape - 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolumeExtent {
    pub shape: AxisMap<usize>,
    pub spacing: AxisMap<f32>,
    pub center: AxisMap<usize>,
}

impl VolumeExtent {
    pub fn new(shape: AxisMap<usize>, spacing: AxisMap<f32>) -> Result<Self> {
        for (axis, size) in shape.iter() {
            if *size == 0 {
                return Err(ModelError::ZeroSizedDimension { axis });
            }
        }
        Ok(Self {
            shape,
            spacing,
            center: shape.map(|size| size / 2),
        })
    }

    pub fn depth_count(&self) -> usize {
        self.shape.z
    }

    pub fn max_index(&self, axis: Axis) -> usize {
        self.shape[axis].saturating_sub(1)
    }

    /// Clamps a possibly negative or overshooting depth into `[0, shape.z - 1]`.
    pub fn clamp_depth(&self, raw: i64) -> usize {
        raw.clamp(0, self.max_index(Axis::Z) as i64) as usize
    }

    pub fn contains_depth(&self, z: usize) -> bool {
        z < self.shape.z
    }

    pub fn physical_size(&self) -> AxisMap<f32> {
        AxisMap::from_fn(|axis| self.shape[axis] as f32 * self.spacing[axis])
    }
}
