use std::path::Path;

use crate::config::ViewerConfig;
use crate::model::{AnnotationForm, AnnotationId, timestamp_now};
use crate::source::{SaveOutcome, VolumeSource};
use crate::viewer::{EditMode, Effect, LoadedVolume, SliceResponse, ViewerState};

use super::{AppError, Result};

const PROVISIONAL_ID: &str = "pending";

/// Drives one reader's session: a viewer over whatever `S` serves.
///
/// Every source call happens before the viewer is touched, so a failed call
/// leaves the visible state as it was. The one exception is the optimistic
/// append on add, which is reconciled or withdrawn before returning.
pub struct AnnotatorSession<S: VolumeSource> {
    state: ViewerState,
    source: S,
    unsaved: bool,
}

impl<S: VolumeSource> AnnotatorSession<S> {
    pub fn new(config: ViewerConfig, source: S) -> Self {
        Self {
            state: ViewerState::new(config),
            source,
            unsaved: false,
        }
    }

    pub fn state(&self) -> &ViewerState {
        &self.state
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.unsaved
    }

    pub fn open(&mut self, path: &Path) -> Result<Vec<Effect>> {
        let loaded = self.source.load_file(path)?;
        Ok(self.install(loaded))
    }

    /// Loads a volume the source has already opened.
    pub fn install(&mut self, loaded: LoadedVolume) -> Vec<Effect> {
        self.unsaved = false;
        let effects = self.state.load(loaded);
        self.dispatch(effects)
    }

    /// Runs a viewer operation and fulfils any slice requests it raises.
    pub fn apply(&mut self, operation: impl FnOnce(&mut ViewerState) -> Vec<Effect>) -> Vec<Effect> {
        let effects = operation(&mut self.state);
        self.dispatch(effects)
    }

    pub fn select_range(&mut self, start: i64, end: i64) -> Result<Vec<Effect>> {
        let effects = self.state.set_selection_from_inputs(start, end)?;
        Ok(self.dispatch(effects))
    }

    /// Satisfies `RequestSlice` effects from the source and returns the rest for
    /// the host. Failed fetches are logged and leave the old bitmap on screen.
    pub fn dispatch(&mut self, effects: Vec<Effect>) -> Vec<Effect> {
        let mut pending = Vec::with_capacity(effects.len());
        for effect in effects {
            let Effect::RequestSlice(ticket) = effect else {
                pending.push(effect);
                continue;
            };
            match self.source.get_slice(ticket.axis, ticket.index) {
                Ok(bitmap) => {
                    pending.extend(self.state.apply_slice(SliceResponse { ticket, bitmap }));
                }
                Err(err) => log::warn!("slice request {ticket:?} failed: {err}"),
            }
        }
        pending
    }

    /// Stores the selected range with the form's attributes.
    pub fn add_annotation(&mut self, form: AnnotationForm) -> Result<Vec<Effect>> {
        let (start, end) = self.state.selection().bounds().ok_or(AppError::NoSelection)?;
        let draft = form.into_draft(start, end);
        let provisional = AnnotationId::new(PROVISIONAL_ID);
        self.state.append_annotation(
            draft
                .clone()
                .into_annotation(provisional.clone(), timestamp_now()),
        );

        match self.source.add_annotation(draft) {
            Ok(record) => {
                log::info!("stored annotation {}", record.annotation_id);
                self.unsaved = true;
                let mut effects = self.state.reconcile_annotation(&provisional, record);
                effects.extend(self.state.cancel_edit());
                Ok(self.dispatch(effects))
            }
            Err(err) => {
                log::warn!("adding annotation failed: {err}");
                self.state.remove_annotation(&provisional);
                Err(err.into())
            }
        }
    }

    /// Labels the selected range as a normal segment.
    pub fn quick_normal(&mut self) -> Result<Vec<Effect>> {
        self.add_annotation(AnnotationForm::quick_normal())
    }

    /// Saves the form over the annotation being edited. The current selection
    /// becomes its new range; without one the stored range is kept.
    pub fn update_annotation(&mut self, form: AnnotationForm) -> Result<Vec<Effect>> {
        let EditMode::Editing(id) = self.state.mode().clone() else {
            return Err(AppError::NotEditing);
        };
        let (start, end) = match self.state.selection().bounds() {
            Some(bounds) => bounds,
            None => self
                .state
                .annotation(&id)
                .map(|annotation| (annotation.z_start, annotation.z_end))
                .ok_or(AppError::NotEditing)?,
        };
        self.source
            .update_annotation(&id, form.into_draft(start, end))?;
        self.unsaved = true;
        log::info!("updated annotation {id}");
        let annotations = self.source.list_annotations()?;
        let mut effects = self.state.replace_annotations(annotations);
        effects.extend(self.state.cancel_edit());
        Ok(self.dispatch(effects))
    }

    pub fn delete_selected(&mut self) -> Result<Vec<Effect>> {
        let id = self
            .state
            .selected_id()
            .cloned()
            .ok_or(AppError::NoAnnotationSelected)?;
        self.source.delete_annotation(&id)?;
        self.unsaved = true;
        log::info!("deleted annotation {id}");
        let annotations = self.source.list_annotations()?;
        let mut effects = self.state.replace_annotations(annotations);
        effects.extend(self.state.cancel_edit());
        Ok(self.dispatch(effects))
    }

    pub fn refresh_annotations(&mut self) -> Result<Vec<Effect>> {
        let annotations = self.source.list_annotations()?;
        let effects = self.state.replace_annotations(annotations);
        Ok(self.dispatch(effects))
    }

    /// Persists every pending edit and installs the resolved list, which may
    /// differ from the local one where intervals overlapped.
    pub fn save_all(&mut self) -> Result<(SaveOutcome, Vec<Effect>)> {
        let outcome = self.source.save_all()?;
        self.unsaved = false;
        let effects = self
            .state
            .replace_annotations(outcome.saved_annotations.clone());
        Ok((outcome, self.dispatch(effects)))
    }
}
