use crate::config::ConfigError;
use crate::formats::IoError;
use crate::source::SourceError;
use crate::viewer::SelectionError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("volume source error: {0}")]
    Source(#[from] SourceError),

    #[error("selection error: {0}")]
    Selection(#[from] SelectionError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    #[error("report serialization failure: {0}")]
    Json(#[from] serde_json::Error),

    #[error("select a depth range first")]
    NoSelection,

    #[error("no annotation is being edited")]
    NotEditing,

    #[error("no annotation is selected")]
    NoAnnotationSelected,
}
