use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::Annotation;

use super::{Result, SourceError};

/// On-disk label document stored next to a scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelFile {
    pub data_file: String,
    #[serde(default)]
    pub doctor_name: String,
    #[serde(default)]
    pub last_modified: String,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

/// `<stem>_<doctor>_label.json`, or `<stem>_label.json` without a reader name.
pub fn label_path(volume: &Path, doctor: Option<&str>) -> PathBuf {
    let stem = volume
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match doctor.filter(|doctor| !doctor.is_empty()) {
        Some(doctor) => format!("{stem}_{doctor}_label.json"),
        None => format!("{stem}_label.json"),
    };
    volume.with_file_name(name)
}

pub fn read_labels(path: &Path) -> Result<LabelFile> {
    let raw = fs::read_to_string(path).map_err(|source| SourceError::LabelIo {
        path: path.to_path_buf(),
        source,
    })?;
    let mut document = serde_json::from_str::<Value>(&raw)?;
    if let Some(records) = document
        .get_mut("annotations")
        .and_then(Value::as_array_mut)
    {
        records.iter_mut().for_each(upgrade_record);
    }
    let mut labels: LabelFile = serde_json::from_value(document)?;
    labels.annotations = labels
        .annotations
        .into_iter()
        .map(Annotation::normalized)
        .collect();
    Ok(labels)
}

/// Older files carry a single `timestamp` and may lack ids. Missing ids are
/// left empty for the caller to assign.
fn upgrade_record(record: &mut Value) {
    let Some(fields) = record.as_object_mut() else {
        return;
    };
    let legacy = fields.get("timestamp").cloned();
    for key in ["created_at", "updated_at"] {
        let missing = fields.get(key).is_none_or(Value::is_null);
        if !missing {
            continue;
        }
        match &legacy {
            Some(timestamp) => fields.insert(key.to_string(), timestamp.clone()),
            None => fields.remove(key),
        };
    }
    if !fields.contains_key("annotation_id") {
        fields.insert("annotation_id".to_string(), Value::String(String::new()));
    }
}

pub fn write_labels(path: &Path, labels: &LabelFile) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| SourceError::LabelIo {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let serialized = serde_json::to_string_pretty(labels)?;
    fs::write(path, serialized).map_err(|source| SourceError::LabelIo {
        path: path.to_path_buf(),
        source,
    })?;
    log::info!(
        "wrote {} annotations to {}",
        labels.annotations.len(),
        path.display()
    );
    Ok(())
}
