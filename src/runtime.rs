//! Controller tying the viewer state to a volume source.

mod error;
mod session;


pub use error::{AppError, Result};
pub use session::AnnotatorSession;
