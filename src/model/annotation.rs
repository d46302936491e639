use std::fmt;

use serde::{Deserialize, Serialize};

use super::ModelError;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

pub fn timestamp_now() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotationId(pub String);

impl AnnotationId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AnnotationId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

/// Plaque presence. An undetermined presence is stored as `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i8", into = "i8")]
pub enum Presence {
    Absent,
    Suspected,
    Present,
}

impl Presence {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Absent => "no plaque",
            Self::Suspected => "suspected plaque",
            Self::Present => "plaque present",
        }
    }
}

impl TryFrom<i8> for Presence {
    type Error = ModelError;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Self::Absent),
            0 => Ok(Self::Suspected),
            1 => Ok(Self::Present),
            other => Err(invalid("presence", other)),
        }
    }
}

impl From<Presence> for i8 {
    fn from(value: Presence) -> Self {
        match value {
            Presence::Absent => -1,
            Presence::Suspected => 0,
            Presence::Present => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum PlaqueType {
    Uncertain,
    Calcified,
    NonCalcified,
    Mixed,
}

impl PlaqueType {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Uncertain => "uncertain",
            Self::Calcified => "calcified",
            Self::NonCalcified => "non-calcified",
            Self::Mixed => "mixed",
        }
    }
}

impl TryFrom<u8> for PlaqueType {
    type Error = ModelError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Uncertain),
            1 => Ok(Self::Calcified),
            2 => Ok(Self::NonCalcified),
            3 => Ok(Self::Mixed),
            other => Err(invalid("type_main", other)),
        }
    }
}

impl From<PlaqueType> for u8 {
    fn from(value: PlaqueType) -> Self {
        value as u8
    }
}

/// Plaque types the reader is certain are absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ExcludeTag {
    #[serde(rename = "not_CP")]
    NotCalcified,
    #[serde(rename = "not_NCP")]
    NotNonCalcified,
    #[serde(rename = "not_MP")]
    NotMixed,
}

impl ExcludeTag {
    pub const fn label(self) -> &'static str {
        match self {
            Self::NotCalcified => "calcified",
            Self::NotNonCalcified => "non-calcified",
            Self::NotMixed => "mixed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Stenosis {
    Minimal,
    Mild,
    Moderate,
    Severe,
    Indeterminate,
}

impl Stenosis {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Minimal => "<25%",
            Self::Mild => "25-49%",
            Self::Moderate => "50-69%",
            Self::Severe => ">=70%",
            Self::Indeterminate => "indeterminate",
        }
    }
}

impl TryFrom<u8> for Stenosis {
    type Error = ModelError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Minimal),
            1 => Ok(Self::Mild),
            2 => Ok(Self::Moderate),
            3 => Ok(Self::Severe),
            4 => Ok(Self::Indeterminate),
            other => Err(invalid("stenosis", other)),
        }
    }
}

impl From<Stenosis> for u8 {
    fn from(value: Stenosis) -> Self {
        value as u8
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub enum Confidence {
    Low,
    #[default]
    Medium,
    High,
}

impl Confidence {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl TryFrom<u8> for Confidence {
    type Error = ModelError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Low),
            1 => Ok(Self::Medium),
            2 => Ok(Self::High),
            other => Err(invalid("confidence", other)),
        }
    }
}

impl From<Confidence> for u8 {
    fn from(value: Confidence) -> Self {
        value as u8
    }
}

fn invalid(name: &'static str, value: impl fmt::Display) -> ModelError {
    ModelError::InvalidAttribute {
        name,
        value: value.to_string(),
    }
}

/// Annotation payload sent to the store before it has an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationDraft {
    pub z_start: usize,
    pub z_end: usize,
    pub presence: Option<Presence>,
    pub type_main: Option<PlaqueType>,
    #[serde(default)]
    pub type_exclude: Vec<ExcludeTag>,
    pub stenosis: Option<Stenosis>,
    #[serde(default)]
    pub confidence: Confidence,
}

impl AnnotationDraft {
    pub fn into_annotation(self, annotation_id: AnnotationId, timestamp: String) -> Annotation {
        Annotation {
            annotation_id,
            z_start: self.z_start.min(self.z_end),
            z_end: self.z_start.max(self.z_end),
            presence: self.presence,
            type_main: self.type_main,
            type_exclude: self.type_exclude,
            stenosis: self.stenosis,
            confidence: self.confidence,
            created_at: timestamp.clone(),
            updated_at: timestamp,
        }
    }
}

/// A labeled depth interval. `z_start <= z_end` always holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub annotation_id: AnnotationId,
    pub z_start: usize,
    pub z_end: usize,
    pub presence: Option<Presence>,
    pub type_main: Option<PlaqueType>,
    #[serde(default)]
    pub type_exclude: Vec<ExcludeTag>,
    pub stenosis: Option<Stenosis>,
    #[serde(default)]
    pub confidence: Confidence,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

impl Annotation {
    pub fn contains(&self, z: usize) -> bool {
        self.z_start <= z && z <= self.z_end
    }

    pub fn overlaps(&self, other: &Annotation) -> bool {
        !(self.z_end < other.z_start || self.z_start > other.z_end)
    }

    /// Restores `z_start <= z_end` on records that arrive reversed.
    pub fn normalized(mut self) -> Self {
        if self.z_start > self.z_end {
            std::mem::swap(&mut self.z_start, &mut self.z_end);
        }
        self
    }

    pub fn mid_depth(&self) -> usize {
        (self.z_start + self.z_end) / 2
    }

    /// Whether this record wins an overlap against `other` when labels are saved.
    pub fn outranks(&self, other: &Annotation) -> bool {
        (self.confidence, &self.updated_at) > (other.confidence, &other.updated_at)
    }

    /// Rewrites attributes and range in place from an edited draft.
    pub fn apply_draft(&mut self, draft: AnnotationDraft, timestamp: String) {
        self.z_start = draft.z_start.min(draft.z_end);
        self.z_end = draft.z_start.max(draft.z_end);
        self.presence = draft.presence;
        self.type_main = draft.type_main;
        self.type_exclude = draft.type_exclude;
        self.stenosis = draft.stenosis;
        self.confidence = draft.confidence;
        self.updated_at = timestamp;
    }

    pub fn list_label(&self) -> String {
        format!(
            "Z: {} - {} | {} | {} | stenosis {} | confidence {}",
            self.z_start,
            self.z_end,
            self.presence.map_or("undetermined", Presence::label),
            self.type_main.map_or("unknown", PlaqueType::label),
            self.stenosis.map_or("unknown", Stenosis::label),
            self.confidence.label(),
        )
    }
}
