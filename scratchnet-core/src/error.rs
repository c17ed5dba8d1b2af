use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("shape mismatch in {op}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        op: &'static str,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    /// Backward was called on a component that has never run forward.
    #[error("{0}: backward called before forward")]
    MissingForward(&'static str),

    #[error("class index {index} out of range for {classes} classes")]
    LabelOutOfRange { index: usize, classes: usize },

    #[error("{0}: empty batch")]
    EmptyBatch(&'static str),

    #[error("non-finite value in {0}")]
    NonFinite(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn shape(op: &'static str, expected: &[usize], actual: &[usize]) -> Self {
        Error::ShapeMismatch {
            op,
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        }
    }
}
