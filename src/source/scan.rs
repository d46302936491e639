use std::path::{Path, PathBuf};

use serde::Serialize;
use walkdir::WalkDir;

use crate::formats::supported_formats;

use super::label_path;

/// A scan found under a data directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VolumeEntry {
    pub path: PathBuf,
    pub name: String,
    pub has_annotation: bool,
}

/// Lists readable scans below `directory`, sorted by path. A scan counts as
/// annotated when either the reader's label file or the shared one exists.
pub fn scan_directory(directory: &Path, doctor: Option<&str>) -> Vec<VolumeEntry> {
    let mut entries = WalkDir::new(directory)
        .min_depth(1)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                log::warn!("skipping unreadable entry: {err}");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && is_volume(entry.path()))
        .map(|entry| {
            let path = entry.into_path();
            let has_annotation = doctor
                .is_some_and(|doctor| label_path(&path, Some(doctor)).exists())
                || label_path(&path, None).exists();
            VolumeEntry {
                name: path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                path,
                has_annotation,
            }
        })
        .collect::<Vec<_>>();
    entries.sort_by(|left, right| left.path.cmp(&right.path));
    entries
}

fn is_volume(path: &Path) -> bool {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    supported_formats().contains(&extension.as_str())
}
