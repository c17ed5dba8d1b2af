use super::Layer;
use crate::error::{Error, Result};
use crate::tensor::{expect_shape, Scalar};

use ndarray::{Array2, Axis, Zip};

/// Row-wise softmax, shifted by the row maximum so `exp` cannot overflow.
pub fn softmax<T: Scalar>(x: &Array2<T>) -> Array2<T> {
    let max_vals = x.map_axis(Axis(1), |row| {
        row.iter().fold(T::neg_infinity(), |a, &b| a.max(b))
    });

    let exps = (x - &max_vals.insert_axis(Axis(1))).mapv(T::exp);
    let sums = exps.sum_axis(Axis(1)).insert_axis(Axis(1));
    exps / &sums
}

/// Rectified linear unit. Caches its input for the backward pass.
#[derive(Debug, Clone, Default)]
pub struct Relu<T: Scalar> {
    input: Option<Array2<T>>,
}

impl<T: Scalar> Relu<T> {
    pub fn new() -> Self {
        Self { input: None }
    }
}

impl<T: Scalar> Layer<T> for Relu<T> {
    fn forward(&mut self, input: &Array2<T>) -> Result<Array2<T>> {
        self.input = Some(input.clone());
        Ok(input.mapv(|x| x.max(T::zero())))
    }

    fn backward(&mut self, upstream_grad: &Array2<T>) -> Result<Array2<T>> {
        let input = self.input.as_ref().ok_or(Error::MissingForward("relu"))?;
        expect_shape("relu backward", input.shape(), upstream_grad.shape())?;

        let mut grad = upstream_grad.clone();
        Zip::from(&mut grad).and(input).for_each(|g, &x| {
            if x <= T::zero() {
                *g = T::zero();
            }
        });
        Ok(grad)
    }
}

/// Standalone softmax activation.
///
/// The backward pass materializes the `classes x classes` Jacobian of every
/// sample; training goes through `SoftmaxCrossEntropy` instead.
#[derive(Debug, Clone, Default)]
pub struct Softmax<T: Scalar> {
    output: Option<Array2<T>>,
}

impl<T: Scalar> Softmax<T> {
    pub fn new() -> Self {
        Self { output: None }
    }

    pub fn output(&self) -> Option<&Array2<T>> {
        self.output.as_ref()
    }
}

impl<T: Scalar> Layer<T> for Softmax<T> {
    fn forward(&mut self, input: &Array2<T>) -> Result<Array2<T>> {
        let output = softmax(input);
        self.output = Some(output.clone());
        Ok(output)
    }

    fn backward(&mut self, upstream_grad: &Array2<T>) -> Result<Array2<T>> {
        let output = self.output.as_ref().ok_or(Error::MissingForward("softmax"))?;
        expect_shape("softmax backward", output.shape(), upstream_grad.shape())?;

        let mut input_grad = Array2::zeros(upstream_grad.raw_dim());
        for ((y, grad), mut out) in output
            .outer_iter()
            .zip(upstream_grad.outer_iter())
            .zip(input_grad.outer_iter_mut())
        {
            // J = diag(y) - y y^T
            let column = y.insert_axis(Axis(1));
            let jacobian = Array2::from_diag(&y) - column.dot(&column.t());
            out.assign(&jacobian.dot(&grad));
        }
        Ok(input_grad)
    }
}
