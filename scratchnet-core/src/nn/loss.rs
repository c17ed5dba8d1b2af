use super::activations::Softmax;
use super::Layer;
use crate::error::{Error, Result};
use crate::tensor::{argmax_rows, batch_len, clip, constant, one_hot, Scalar};

use ndarray::{Array1, Array2, Axis};

/// Ground-truth labels, either class indices or one-hot rows.
#[derive(Debug, Clone, PartialEq)]
pub enum Targets<T> {
    Sparse(Array1<usize>),
    OneHot(Array2<T>),
}

impl<T: Scalar> Targets<T> {
    pub fn len(&self) -> usize {
        match self {
            Targets::Sparse(indices) => indices.len(),
            Targets::OneHot(encoded) => encoded.nrows(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Class index per sample; one-hot rows are reduced with argmax.
    pub fn indices(&self) -> Array1<usize> {
        match self {
            Targets::Sparse(indices) => indices.clone(),
            Targets::OneHot(encoded) => argmax_rows(&encoded.view()),
        }
    }

    pub fn to_one_hot(&self, num_classes: usize) -> Result<Array2<T>> {
        match self {
            Targets::Sparse(indices) => one_hot(indices, num_classes),
            Targets::OneHot(encoded) => {
                if encoded.ncols() != num_classes {
                    return Err(Error::shape(
                        "one-hot targets",
                        &[encoded.nrows(), num_classes],
                        encoded.shape(),
                    ));
                }
                Ok(encoded.clone())
            }
        }
    }

    /// Checks that the labels describe a non-empty batch of `samples` rows
    /// over `classes` classes.
    pub fn validate(&self, samples: usize, classes: usize) -> Result<()> {
        if samples == 0 {
            return Err(Error::EmptyBatch("targets"));
        }
        if self.len() != samples {
            return Err(Error::shape("targets", &[samples], &[self.len()]));
        }
        match self {
            Targets::Sparse(indices) => match indices.iter().find(|&&index| index >= classes) {
                Some(&index) => Err(Error::LabelOutOfRange { index, classes }),
                None => Ok(()),
            },
            Targets::OneHot(encoded) if encoded.ncols() != classes => {
                Err(Error::shape("one-hot targets", &[samples, classes], encoded.shape()))
            }
            Targets::OneHot(_) => Ok(()),
        }
    }

    fn check_batch(&self, op: &'static str, predictions: &Array2<T>) -> Result<()> {
        if predictions.nrows() == 0 {
            return Err(Error::EmptyBatch(op));
        }
        if self.len() != predictions.nrows() {
            return Err(Error::shape(op, &[predictions.nrows()], &[self.len()]));
        }
        Ok(())
    }
}

impl<T> From<Array1<usize>> for Targets<T> {
    fn from(indices: Array1<usize>) -> Self {
        Targets::Sparse(indices)
    }
}

impl<T> From<Array2<T>> for Targets<T> {
    fn from(encoded: Array2<T>) -> Self {
        Targets::OneHot(encoded)
    }
}

const CLIP_EPSILON: f64 = 1e-7;

/// Negative log-likelihood of the true class.
#[derive(Debug, Clone, Copy, Default)]
pub struct CategoricalCrossEntropy;

impl CategoricalCrossEntropy {
    pub fn new() -> Self {
        Self
    }

    /// Per-sample losses. Predictions are clipped to `[1e-7, 1 - 1e-7]` first.
    pub fn forward<T: Scalar>(&self, y_pred: &Array2<T>, targets: &Targets<T>) -> Result<Array1<T>> {
        targets.check_batch("cross-entropy forward", y_pred)?;

        let epsilon = constant::<T>(CLIP_EPSILON);
        let clipped = clip(y_pred, epsilon, T::one() - epsilon);

        let confidences = match targets {
            Targets::Sparse(indices) => {
                let mut confidences = Array1::zeros(indices.len());
                for (i, &index) in indices.iter().enumerate() {
                    if index >= clipped.ncols() {
                        return Err(Error::LabelOutOfRange { index, classes: clipped.ncols() });
                    }
                    confidences[i] = clipped[[i, index]];
                }
                confidences
            }
            Targets::OneHot(encoded) => {
                if encoded.shape() != clipped.shape() {
                    return Err(Error::shape("cross-entropy forward", clipped.shape(), encoded.shape()));
                }
                (&clipped * encoded).sum_axis(Axis(1))
            }
        };

        Ok(confidences.mapv(|c| -c.ln()))
    }

    /// Mean loss over the batch.
    pub fn calculate<T: Scalar>(&self, y_pred: &Array2<T>, targets: &Targets<T>) -> Result<T> {
        self.forward(y_pred, targets)?
            .mean()
            .ok_or(Error::EmptyBatch("cross-entropy"))
    }

    /// Gradient with respect to the predicted probabilities, `-y / y_pred`
    /// averaged over the batch.
    pub fn backward<T: Scalar>(&self, upstream_grad: &Array2<T>, targets: &Targets<T>) -> Result<Array2<T>> {
        targets.check_batch("cross-entropy backward", upstream_grad)?;

        let samples = batch_len::<T>(upstream_grad.nrows());
        let y_true = targets.to_one_hot(upstream_grad.ncols())?;

        Ok((-y_true / upstream_grad) / samples)
    }
}

/// Softmax fused with categorical cross-entropy.
///
/// The combined gradient with respect to the logits reduces to
/// `(y_pred - y_true) / batch`, which skips the per-sample Jacobian.
#[derive(Debug, Clone, Default)]
pub struct SoftmaxCrossEntropy<T: Scalar> {
    activation: Softmax<T>,
    loss: CategoricalCrossEntropy,
}

impl<T: Scalar> SoftmaxCrossEntropy<T> {
    pub fn new() -> Self {
        Self {
            activation: Softmax::new(),
            loss: CategoricalCrossEntropy::new(),
        }
    }

    /// Returns the predicted probabilities and the mean loss.
    pub fn forward(&mut self, logits: &Array2<T>, targets: &Targets<T>) -> Result<(Array2<T>, T)> {
        let y_pred = self.activation.forward(logits)?;
        let loss = self.loss.calculate(&y_pred, targets)?;
        Ok((y_pred, loss))
    }

    pub fn backward(&self, y_pred: &Array2<T>, targets: &Targets<T>) -> Result<Array2<T>> {
        targets.check_batch("softmax cross-entropy backward", y_pred)?;

        let samples = batch_len::<T>(y_pred.nrows());
        let classes = y_pred.ncols();

        let mut grad = y_pred.clone();
        for (i, &index) in targets.indices().iter().enumerate() {
            if index >= classes {
                return Err(Error::LabelOutOfRange { index, classes });
            }
            grad[[i, index]] -= T::one();
        }

        Ok(grad / samples)
    }

    /// Predictions cached by the last forward call.
    pub fn output(&self) -> Option<&Array2<T>> {
        self.activation.output()
    }
}
