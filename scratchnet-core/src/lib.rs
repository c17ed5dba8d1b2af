pub mod config;
pub mod data;
pub mod error;
pub mod nn;
pub mod tensor;
pub mod train;

pub use error::{Error, Result};
pub use tensor::Scalar;
