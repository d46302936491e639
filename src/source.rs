//! The volume data source the viewer talks to: opening scans, serving slices
//! and persisting annotations.

mod error;
mod labels;
mod memory;
mod resolve;
mod scan;


use std::path::{Path, PathBuf};

use image::GrayImage;

use crate::model::{Annotation, AnnotationDraft, AnnotationId, Axis};
use crate::viewer::LoadedVolume;

pub use error::{Result, SourceError};
pub use labels::{LabelFile, label_path, read_labels, write_labels};
pub use memory::MemoryVolumeSource;
pub use resolve::resolve_overlaps;
pub use scan::{VolumeEntry, scan_directory};

/// Result of persisting every pending edit.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveOutcome {
    pub saved_annotations: Vec<Annotation>,
    /// Label file written, when the volume came from disk.
    pub label: Option<PathBuf>,
}

/// Collaborator behind the viewer. Every call may fail; callers must not
/// touch local state until a call succeeds.
pub trait VolumeSource {
    fn load_file(&mut self, path: &Path) -> Result<LoadedVolume>;

    fn get_slice(&self, axis: Axis, index: usize) -> Result<GrayImage>;

    /// Stores a new interval and returns the authoritative record with its id.
    fn add_annotation(&mut self, draft: AnnotationDraft) -> Result<Annotation>;

    fn update_annotation(&mut self, id: &AnnotationId, draft: AnnotationDraft) -> Result<()>;

    fn delete_annotation(&mut self, id: &AnnotationId) -> Result<()>;

    fn list_annotations(&self) -> Result<Vec<Annotation>>;

    fn save_all(&mut self) -> Result<SaveOutcome>;
}
