use super::Layer;
use crate::error::{Error, Result};
use crate::tensor::{constant, Scalar};

use ndarray::{Array1, Array2, Axis};
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};

/// Fully connected layer computing `input . weights + bias`.
///
/// Weights are laid out `[in_features, out_features]` so the forward pass needs
/// no transpose; the bias is a `[1, out_features]` row broadcast over the batch.
#[derive(Debug, Clone)]
pub struct Dense<T: Scalar> {
    pub weights: Array2<T>,
    pub bias: Array2<T>,
    pub weights_grad: Array2<T>,
    pub bias_grad: Array2<T>,
    input: Option<Array2<T>>,
}

impl<T: Scalar> Dense<T> {
    pub fn new(in_features: usize, out_features: usize) -> Self {
        Self::with_rng(in_features, out_features, &mut rand::thread_rng())
    }

    /// Weights drawn from `0.01 * N(0, 1)`, biases start at zero.
    pub fn with_rng<R: Rng + ?Sized>(in_features: usize, out_features: usize, rng: &mut R) -> Self {
        let scale = constant::<T>(0.01);
        let weights = Array2::from_shape_fn((in_features, out_features), |_| {
            let z: f64 = StandardNormal.sample(&mut *rng);
            scale * constant(z)
        });
        let bias = Array2::zeros((1, out_features));

        Self {
            weights_grad: Array2::zeros((in_features, out_features)),
            bias_grad: Array2::zeros((1, out_features)),
            weights,
            bias,
            input: None,
        }
    }

    pub fn from_weights(weights: Array2<T>, bias: Array2<T>) -> Result<Self> {
        let out_features = weights.ncols();
        if bias.shape() != [1, out_features] {
            return Err(Error::shape("dense bias", &[1, out_features], bias.shape()));
        }

        Ok(Self {
            weights_grad: Array2::zeros(weights.raw_dim()),
            bias_grad: Array2::zeros(bias.raw_dim()),
            weights,
            bias,
            input: None,
        })
    }

    /// Builds a layer from one weight row per neuron (`[neurons, inputs]`)
    /// and one bias per neuron.
    pub fn from_neuron_weights(neurons: &[Vec<T>], bias: &[T]) -> Result<Self> {
        let inputs = neurons.first().map_or(0, Vec::len);
        if let Some(row) = neurons.iter().find(|row| row.len() != inputs) {
            return Err(Error::shape("dense neuron weights", &[inputs], &[row.len()]));
        }
        if bias.len() != neurons.len() {
            return Err(Error::shape("dense bias", &[neurons.len()], &[bias.len()]));
        }

        let flat: Vec<T> = neurons.iter().flatten().copied().collect();
        let weights = Array2::from_shape_vec((neurons.len(), inputs), flat)?.reversed_axes();
        let bias = Array1::from(bias.to_vec()).insert_axis(Axis(0));

        Self::from_weights(weights, bias)
    }

    /// Transforms a single sample without touching the backward cache.
    pub fn forward_sample(&self, input: &Array1<T>) -> Result<Array1<T>> {
        if input.len() != self.in_features() {
            return Err(Error::shape("dense forward", &[self.in_features()], &[input.len()]));
        }
        Ok(input.dot(&self.weights) + &self.bias.row(0))
    }

    /// Batch forward pass that leaves the backward cache untouched.
    pub fn forward_batch(&self, input: &Array2<T>) -> Result<Array2<T>> {
        if input.ncols() != self.in_features() {
            return Err(Error::shape(
                "dense forward",
                &[input.nrows(), self.in_features()],
                input.shape(),
            ));
        }
        Ok(input.dot(&self.weights) + &self.bias)
    }

    pub fn in_features(&self) -> usize {
        self.weights.nrows()
    }

    pub fn out_features(&self) -> usize {
        self.weights.ncols()
    }

    pub fn parameter_count(&self) -> usize {
        self.weights.len() + self.bias.len()
    }

    pub fn is_finite(&self) -> bool {
        self.weights.iter().chain(self.bias.iter()).all(|x| x.is_finite())
    }
}

impl<T: Scalar> Layer<T> for Dense<T> {
    fn forward(&mut self, input: &Array2<T>) -> Result<Array2<T>> {
        let output = self.forward_batch(input)?;
        self.input = Some(input.clone());
        Ok(output)
    }

    fn backward(&mut self, upstream_grad: &Array2<T>) -> Result<Array2<T>> {
        let input = self.input.as_ref().ok_or(Error::MissingForward("dense"))?;
        let expected = [input.nrows(), self.out_features()];
        if upstream_grad.shape() != expected {
            return Err(Error::shape("dense backward", &expected, upstream_grad.shape()));
        }

        self.weights_grad = input.t().dot(upstream_grad);
        self.bias_grad = upstream_grad.sum_axis(Axis(0)).insert_axis(Axis(0));

        Ok(upstream_grad.dot(&self.weights.t()))
    }
}
