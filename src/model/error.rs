use thiserror::Error;

use super::Axis;

pub type Result<T> = std::result::Result<T, ModelError>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("invalid dimension size 0 along axis {axis}")]
    ZeroSizedDimension { axis: Axis },

    #[error("invalid {name} value: {value}")]
    InvalidAttribute { name: &'static str, value: String },

    #[error("interval [{start}, {end}] lies outside depth range [0, {max}]")]
    IntervalOutOfExtent { start: usize, end: usize, max: usize },
}
