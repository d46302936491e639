use std::path::PathBuf;

use crate::model::ModelError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, IoError>;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("scan path has no file extension: {}", .0.display())]
    MissingExtension(PathBuf),

    #[error("`.{0}` is not a scan type; expected a .tif/.tiff stack or a .png/.jpg slice")]
    UnknownScanType(String),

    #[error("stack page {page} is {found:?} but the first page is {expected:?}")]
    MismatchedPages {
        page: usize,
        expected: (u32, u32),
        found: (u32, u32),
    },

    #[error("scan samples must be single-channel grayscale: {0}")]
    UnsupportedSamples(String),

    #[error("a flat image holds one slice, the scan has {0}")]
    SliceCount(usize),

    #[error("decoded samples do not fill the stack: {0}")]
    StackShape(#[from] ndarray::ShapeError),

    #[error("cannot access scan file: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot decode or encode slice image: {0}")]
    Image(#[from] image::ImageError),

    #[error("cannot decode or encode TIFF stack: {0}")]
    Tiff(#[from] tiff::TiffError),

    #[error("scan geometry rejected: {0}")]
    Model(#[from] ModelError),
}
