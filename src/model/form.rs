use serde::{Deserialize, Serialize};

use super::{AnnotationDraft, Confidence, ExcludeTag, PlaqueType, Presence, Stenosis};

/// Attribute values chosen by the reader for the interval being labeled.
///
/// `presence` is doubly optional: the outer `None` means nothing has been
/// picked yet, `Some(None)` is an explicit "cannot determine".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationForm {
    pub presence: Option<Option<Presence>>,
    pub type_main: Option<PlaqueType>,
    pub type_exclude: Vec<ExcludeTag>,
    pub stenosis: Option<Stenosis>,
    pub confidence: Option<Confidence>,
}

impl Default for AnnotationForm {
    fn default() -> Self {
        Self {
            presence: Some(Some(Presence::Present)),
            type_main: None,
            type_exclude: Vec::new(),
            stenosis: None,
            confidence: Some(Confidence::High),
        }
    }
}

impl AnnotationForm {
    /// Preset for a segment read as normal.
    pub fn quick_normal() -> Self {
        Self {
            presence: Some(Some(Presence::Absent)),
            type_main: Some(PlaqueType::Uncertain),
            type_exclude: Vec::new(),
            stenosis: Some(Stenosis::Minimal),
            confidence: Some(Confidence::High),
        }
    }

    pub fn from_annotation(annotation: &super::Annotation) -> Self {
        Self {
            presence: Some(annotation.presence),
            type_main: annotation.type_main,
            type_exclude: annotation.type_exclude.clone(),
            stenosis: annotation.stenosis,
            confidence: Some(annotation.confidence),
        }
    }

    pub fn into_draft(self, start: usize, end: usize) -> AnnotationDraft {
        let mut type_exclude = self.type_exclude;
        type_exclude.sort();
        type_exclude.dedup();
        AnnotationDraft {
            z_start: start.min(end),
            z_end: start.max(end),
            presence: self.presence.flatten(),
            type_main: self.type_main,
            type_exclude,
            stenosis: self.stenosis,
            confidence: self.confidence.unwrap_or_default(),
        }
    }

    /// One-sentence reading of the form, or `None` until confidence and presence are chosen.
    pub fn summary(&self) -> Option<String> {
        let confidence = self.confidence?;
        let presence = self.presence?;

        let mut summary = format!(
            "With {} confidence, this interval has {}",
            confidence.label(),
            presence.map_or("undeterminable plaque presence", Presence::label),
        );
        if let Some(type_main) = self.type_main {
            summary.push_str(&format!(", {} plaque", type_main.label()));
        }
        if !self.type_exclude.is_empty() {
            let excluded = self
                .type_exclude
                .iter()
                .map(|tag| tag.label())
                .collect::<Vec<_>>()
                .join(", ");
            summary.push_str(&format!(", definitely not {excluded}"));
        }
        match self.stenosis {
            Some(Stenosis::Indeterminate) => summary.push_str(", stenosis indeterminate"),
            Some(stenosis) => {
                summary.push_str(&format!(", stenosis about {}", stenosis.label()));
            }
            None => {}
        }
        summary.push('.');
        Some(summary)
    }
}
