use thiserror::Error;

pub type Result<T> = std::result::Result<T, SelectionError>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("no volume is loaded")]
    NoVolume,

    #[error("depth index {value} is outside [0, {max}]")]
    OutOfRange { value: i64, max: usize },
}
