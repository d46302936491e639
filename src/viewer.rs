//! The multi-view engine: viewport placement, contrast windowing, depth-range
//! selection, pointer gestures and overlay compositing for the three axes.

mod error;
pub mod interaction;
pub mod overlay;
pub mod render;
pub mod selection;
mod state;
pub mod transform;
pub mod window;

#[cfg(test)]
mod tests;

pub use error::{Result, SelectionError};
pub use interaction::{KeyCommand, PointerButton, PointerPhase};
pub use overlay::{Layer, OverlayStyle, Primitive, Shape};
pub use render::{Frame, RemapPolicy};
pub use selection::{DragBox, SelectionRange};
pub use state::{
    AxisView, Effect, EditMode, LoadedVolume, SliceResponse, SliceTicket, ViewerState,
    coverage_fraction,
};
pub use transform::{ImageCoord, Placement, Zoom, ZoomStep};
pub use window::{ContrastWindow, WindowDrag};
