use std::path::PathBuf;

use crate::formats::IoError;
use crate::model::{AnnotationId, ModelError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SourceError>;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("no volume is loaded")]
    NoVolumeLoaded,

    #[error("unknown annotation `{0}`")]
    UnknownAnnotation(AnnotationId),

    #[error("volume failure: {0}")]
    Volume(#[from] IoError),

    #[error("label file {path} failure: {source}")]
    LabelIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("label serialization failure: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid annotation data: {0}")]
    Model(#[from] ModelError),

    #[error("data source unavailable: {0}")]
    Unavailable(String),
}
