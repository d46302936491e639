mod annotation;
mod axis;
mod error;
mod extent;
mod form;
mod volume;


pub use annotation::{
    Annotation, AnnotationDraft, AnnotationId, Confidence, ExcludeTag, PlaqueType, Presence,
    Stenosis, timestamp_now,
};
pub use axis::{Axis, AxisMap};
pub use error::{ModelError, Result};
pub use extent::VolumeExtent;
pub use form::AnnotationForm;
pub use volume::ScanVolume;
