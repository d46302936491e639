use std::fs::File;
use std::path::Path;

use ndarray::{Array3, s};
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::{TiffEncoder, colortype};

use crate::model::{AxisMap, ScanVolume};

use super::util::to_u8_samples;
use super::{IoError, Result};

/// Reads every page of a grayscale TIFF as one depth slice, then stretches the
/// whole stack onto `u8` with a single min/max.
pub(crate) fn read_tiff(path: &Path) -> Result<ScanVolume> {
    let file = File::open(path)?;
    let mut decoder = Decoder::new(file)?;
    let (width, height) = decoder.dimensions()?;
    let page_len = width as usize * height as usize;
    let mut samples = Vec::new();
    let mut depth = 0;

    loop {
        samples.extend(decode_tiff_page(&mut decoder, page_len)?);
        depth += 1;
        if !decoder.more_images() {
            break;
        }
        decoder.next_image()?;
        let (other_width, other_height) = decoder.dimensions()?;
        if (other_width, other_height) != (width, height) {
            return Err(IoError::MismatchedPages {
                page: depth,
                expected: (width, height),
                found: (other_width, other_height),
            });
        }
    }

    let (normalized, (min, max)) = to_u8_samples(&samples);
    let data = Array3::from_shape_vec((depth, height as usize, width as usize), normalized)?;
    let volume = ScanVolume::new(data, AxisMap::new(1.0, 1.0, 1.0))?;
    Ok(volume.with_intensity_range(min, max))
}

fn decode_tiff_page(decoder: &mut Decoder<File>, page_len: usize) -> Result<Vec<f32>> {
    let values = match decoder.read_image()? {
        DecodingResult::U8(buffer) => {
            check_page(buffer.len(), page_len)?;
            buffer.into_iter().map(f32::from).collect::<Vec<_>>()
        }
        DecodingResult::U16(buffer) => {
            check_page(buffer.len(), page_len)?;
            buffer.into_iter().map(f32::from).collect::<Vec<_>>()
        }
        DecodingResult::I16(buffer) => {
            check_page(buffer.len(), page_len)?;
            buffer.into_iter().map(f32::from).collect::<Vec<_>>()
        }
        DecodingResult::F32(buffer) => {
            check_page(buffer.len(), page_len)?;
            buffer
        }
        other => {
            return Err(IoError::UnsupportedSamples(format!("{other:?}")));
        }
    };
    Ok(values)
}

fn check_page(len: usize, page_len: usize) -> Result<()> {
    if len != page_len {
        return Err(IoError::UnsupportedSamples(format!(
            "page carries {len} samples for {page_len} pixels"
        )));
    }
    Ok(())
}

pub(crate) fn write_tiff(path: &Path, volume: &ScanVolume) -> Result<()> {
    let (depth, height, width) = volume.data.dim();
    let file = File::create(path)?;
    let mut encoder = TiffEncoder::new(file)?;

    for z in 0..depth {
        let page = volume
            .data
            .slice(s![z, .., ..])
            .iter()
            .copied()
            .collect::<Vec<_>>();
        let image = encoder.new_image::<colortype::Gray8>(width as u32, height as u32)?;
        image.write_data(&page)?;
    }
    Ok(())
}
