use std::path::Path;

use rayon::prelude::*;

use super::{IoError, Result};

pub(crate) fn extension(path: &Path) -> Result<String> {
    let ext = path
        .extension()
        .and_then(|value| value.to_str())
        .map(|value| value.to_ascii_lowercase())
        .ok_or_else(|| IoError::MissingExtension(path.to_path_buf()))?;
    Ok(ext)
}

/// Stretches `[min, max]` onto `0..=255`. A constant input maps to 0.
pub(crate) fn to_u8_samples(values: &[f32]) -> (Vec<u8>, (f32, f32)) {
    let (min, max) = min_max(values);
    let span = max - min;
    let samples = values
        .par_iter()
        .map(|value| {
            let normalized = if span.abs() < f32::EPSILON {
                0.0
            } else {
                (*value - min) / span
            };
            (normalized.clamp(0.0, 1.0) * 255.0).round() as u8
        })
        .collect();
    (samples, (min, max))
}

pub(crate) fn min_max(values: &[f32]) -> (f32, f32) {
    let mut iter = values.iter().copied();
    let first = iter.next().unwrap_or(0.0);
    let mut min = first;
    let mut max = first;
    for value in iter {
        if value < min {
            min = value;
        }
        if value > max {
            max = value;
        }
    }
    (min, max)
}
