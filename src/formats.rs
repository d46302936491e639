mod api;
mod error;
mod raster;
mod tiff;
mod util;

#[cfg(test)]
mod tests;

pub use api::{read_volume, save_canvas_png, supported_formats, write_volume};
pub use error::{IoError, Result};
