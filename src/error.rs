#[cfg(feature = "python")]
use pyo3::exceptions::{PyRuntimeError, PyValueError};
#[cfg(feature = "python")]
use pyo3::PyErr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlightError {
    #[error("Insufficient data: need at least {required} observations, found {found}")]
    InsufficientData { required: usize, found: usize },

    #[error("Invalid {kind} selection: {value}")]
    InvalidSelection { kind: &'static str, value: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("InvalidData: {0}")]
    InvalidData(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T, E = FlightError> = std::result::Result<T, E>;

#[cfg(feature = "python")]
impl From<FlightError> for PyErr {
    fn from(err: FlightError) -> PyErr {
        match err {
            FlightError::InvalidSelection { .. } | FlightError::InvalidArgument(_) => {
                PyValueError::new_err(err.to_string())
            }
            _ => PyRuntimeError::new_err(err.to_string()),
        }
    }
}
