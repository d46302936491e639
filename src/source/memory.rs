use std::path::{Path, PathBuf};

use image::GrayImage;

use crate::formats::read_volume;
use crate::model::{
    Annotation, AnnotationDraft, AnnotationId, Axis, AxisMap, ModelError, ScanVolume,
    timestamp_now,
};
use crate::viewer::LoadedVolume;

use super::{
    LabelFile, Result, SaveOutcome, SourceError, VolumeSource, label_path, read_labels,
    resolve_overlaps, write_labels,
};

type Clock = Box<dyn FnMut() -> String + Send>;

/// In-process source over a whole volume held in memory.
pub struct MemoryVolumeSource {
    volume: Option<ScanVolume>,
    annotations: Vec<Annotation>,
    doctor: Option<String>,
    label: Option<PathBuf>,
    next_id: u64,
    clock: Clock,
}

impl Default for MemoryVolumeSource {
    fn default() -> Self {
        Self::new(None)
    }
}

impl MemoryVolumeSource {
    pub fn new(doctor: Option<String>) -> Self {
        Self {
            volume: None,
            annotations: Vec::new(),
            doctor,
            label: None,
            next_id: 1,
            clock: Box::new(timestamp_now),
        }
    }

    /// Replaces the wall clock used for `created_at`/`updated_at`.
    pub fn with_clock(mut self, clock: impl FnMut() -> String + Send + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn volume(&self) -> Option<&ScanVolume> {
        self.volume.as_ref()
    }

    pub fn label_file(&self) -> Option<&Path> {
        self.label.as_deref()
    }

    /// Installs an already decoded volume. Labels are loaded when the volume
    /// has a source path and a matching label file exists.
    pub fn open_volume(&mut self, volume: ScanVolume) -> Result<LoadedVolume> {
        let extent = volume.extent()?;
        let slices = AxisMap::from_fn(|axis| {
            volume.slice_image(axis, extent.center[axis])
        });
        let AxisMap {
            x: Some(x),
            y: Some(y),
            z: Some(z),
        } = slices
        else {
            return Err(SourceError::Unavailable(
                "center slices could not be extracted".to_string(),
            ));
        };

        let label = volume
            .source
            .as_deref()
            .map(|path| label_path(path, self.doctor.as_deref()));
        let mut annotations = match &label {
            Some(path) if path.exists() => read_labels(path)?.annotations,
            _ => Vec::new(),
        };
        self.next_id = 1 + annotations
            .iter()
            .filter_map(|annotation| numeric_suffix(&annotation.annotation_id))
            .max()
            .unwrap_or(0);
        for annotation in annotations
            .iter_mut()
            .filter(|annotation| annotation.annotation_id.as_str().is_empty())
        {
            annotation.annotation_id = AnnotationId::new(format!("ann_{}", self.next_id));
            self.next_id += 1;
        }

        log::info!(
            "opened volume with {} stored annotations{}",
            annotations.len(),
            label
                .as_deref()
                .map(|path| format!(" (labels at {})", path.display()))
                .unwrap_or_default()
        );
        let intensity_range = Some(volume.intensity_range);
        self.annotations = annotations.clone();
        self.label = label;
        self.volume = Some(volume);
        Ok(LoadedVolume {
            extent,
            slices: AxisMap::new(x, y, z),
            annotations,
            intensity_range,
        })
    }

    fn allocate_id(&mut self) -> AnnotationId {
        let id = AnnotationId::new(format!("ann_{}", self.next_id));
        self.next_id += 1;
        id
    }

    fn require_volume(&self) -> Result<&ScanVolume> {
        self.volume.as_ref().ok_or(SourceError::NoVolumeLoaded)
    }

    fn check_range(&self, draft: &AnnotationDraft) -> Result<()> {
        let extent = self.require_volume()?.extent()?;
        if !extent.contains_depth(draft.z_end) {
            return Err(ModelError::IntervalOutOfExtent {
                start: draft.z_start,
                end: draft.z_end,
                max: extent.max_index(Axis::Z),
            }
            .into());
        }
        Ok(())
    }
}

fn numeric_suffix(id: &AnnotationId) -> Option<u64> {
    id.as_str().strip_prefix("ann_")?.parse().ok()
}

impl VolumeSource for MemoryVolumeSource {
    fn load_file(&mut self, path: &Path) -> Result<LoadedVolume> {
        let volume = read_volume(path)?;
        self.open_volume(volume)
    }

    /// Out-of-range indices are clamped to the last plane.
    fn get_slice(&self, axis: Axis, index: usize) -> Result<GrayImage> {
        let volume = self.require_volume()?;
        let last = volume.shape()[axis].saturating_sub(1);
        volume
            .slice_image(axis, index.min(last))
            .ok_or_else(|| SourceError::Unavailable(format!("no {axis} plane at {index}")))
    }

    fn add_annotation(&mut self, draft: AnnotationDraft) -> Result<Annotation> {
        self.check_range(&draft)?;
        let id = self.allocate_id();
        let annotation = draft.into_annotation(id, (self.clock)());
        log::debug!(
            "added annotation {} for {}..={}",
            annotation.annotation_id,
            annotation.z_start,
            annotation.z_end
        );
        self.annotations.push(annotation.clone());
        Ok(annotation)
    }

    fn update_annotation(&mut self, id: &AnnotationId, draft: AnnotationDraft) -> Result<()> {
        self.check_range(&draft)?;
        let timestamp = (self.clock)();
        let annotation = self
            .annotations
            .iter_mut()
            .find(|annotation| &annotation.annotation_id == id)
            .ok_or_else(|| SourceError::UnknownAnnotation(id.clone()))?;
        annotation.apply_draft(draft, timestamp);
        Ok(())
    }

    /// Removes every record with `id`; fragments left by overlap resolution share one.
    fn delete_annotation(&mut self, id: &AnnotationId) -> Result<()> {
        let before = self.annotations.len();
        self.annotations
            .retain(|annotation| &annotation.annotation_id != id);
        if self.annotations.len() == before {
            return Err(SourceError::UnknownAnnotation(id.clone()));
        }
        Ok(())
    }

    fn list_annotations(&self) -> Result<Vec<Annotation>> {
        self.require_volume()?;
        Ok(self.annotations.clone())
    }

    fn save_all(&mut self) -> Result<SaveOutcome> {
        let volume = self.require_volume()?;
        let resolved = resolve_overlaps(&self.annotations);
        if let Some(path) = &self.label {
            let data_file = volume
                .source
                .as_deref()
                .and_then(Path::file_name)
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            let labels = LabelFile {
                data_file,
                doctor_name: self.doctor.clone().unwrap_or_default(),
                last_modified: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
                annotations: resolved.clone(),
            };
            write_labels(path, &labels)?;
        }
        self.annotations = resolved.clone();
        Ok(SaveOutcome {
            saved_annotations: resolved,
            label: self.label.clone(),
        })
    }
}
