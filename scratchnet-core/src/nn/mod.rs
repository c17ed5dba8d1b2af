pub mod activations;
pub mod linear;
pub mod loss;
pub mod metrics;
pub mod network;
pub mod optimizers;

use crate::error::Result;
use crate::tensor::Scalar;
use ndarray::Array2;

/// A differentiable stage of the network.
///
/// `forward` caches whatever `backward` needs. `backward` must follow the
/// `forward` call for the same batch: a forward on a different batch in between
/// overwrites the cache and the gradients silently come out wrong.
pub trait Layer<T: Scalar> {
    fn forward(&mut self, input: &Array2<T>) -> Result<Array2<T>>;
    fn backward(&mut self, upstream_grad: &Array2<T>) -> Result<Array2<T>>;
}
