use thiserror::Error;

#[derive(Debug, Error)]
pub enum ErosionError {
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Grid index out of bounds: {axis}={index} (axis length {len})")]
    BoundsError {
        axis: &'static str,
        index: i64,
        len: usize,
    },

    #[error("Geometry error: {0}")]
    GeometryError(String),

    #[error("Numeric degeneracy: {0}")]
    NumericDegeneracy(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Volume archive error: {0}")]
    Archive(String),
}

pub type ErosionResult<T> = Result<T, ErosionError>;
