use super::activations::Relu;
use super::linear::Dense;
use super::loss::{SoftmaxCrossEntropy, Targets};
use super::metrics::accuracy;
use super::optimizers::Sgd;
use super::Layer;
use crate::error::{Error, Result};
use crate::tensor::{argmax_rows, Scalar};

use ndarray::{Array1, Array2};
use rand::Rng;

/// Result of one forward pass over a labelled batch.
#[derive(Debug, Clone)]
pub struct StepOutput<T> {
    pub predictions: Array2<T>,
    pub loss: T,
    pub accuracy: T,
}

/// Two-layer classifier: Dense -> ReLU -> Dense -> softmax cross-entropy.
#[derive(Debug, Clone)]
pub struct Network<T: Scalar> {
    pub dense1: Dense<T>,
    pub relu: Relu<T>,
    pub dense2: Dense<T>,
    pub loss_activation: SoftmaxCrossEntropy<T>,
}

impl<T: Scalar> Network<T> {
    pub fn new<R: Rng + ?Sized>(inputs: usize, hidden: usize, classes: usize, rng: &mut R) -> Self {
        Self {
            dense1: Dense::with_rng(inputs, hidden, rng),
            relu: Relu::new(),
            dense2: Dense::with_rng(hidden, classes, rng),
            loss_activation: SoftmaxCrossEntropy::new(),
        }
    }

    /// Runs the batch through every stage and caches what `backward` needs.
    ///
    /// Inputs and targets are checked before any stage runs, so a rejected
    /// batch leaves the caches of the previous forward pass intact.
    pub fn forward(&mut self, input: &Array2<T>, targets: &Targets<T>) -> Result<StepOutput<T>> {
        if input.ncols() != self.dense1.in_features() {
            return Err(Error::shape(
                "network forward",
                &[input.nrows(), self.dense1.in_features()],
                input.shape(),
            ));
        }
        targets.validate(input.nrows(), self.dense2.out_features())?;

        let logits = self.logits(input)?;
        let (predictions, loss) = self.loss_activation.forward(&logits, targets)?;
        let accuracy = accuracy(&predictions, targets)?;

        Ok(StepOutput { predictions, loss, accuracy })
    }

    /// Backpropagates through every stage in reverse order, leaving the
    /// parameter gradients on `dense1` and `dense2`.
    pub fn backward(&mut self, targets: &Targets<T>) -> Result<()> {
        let predictions = self
            .loss_activation
            .output()
            .ok_or(Error::MissingForward("network"))?;

        let grad = self.loss_activation.backward(predictions, targets)?;
        let grad = self.dense2.backward(&grad)?;
        let grad = self.relu.backward(&grad)?;
        self.dense1.backward(&grad)?;
        Ok(())
    }

    pub fn apply(&mut self, optimizer: &Sgd<T>) {
        optimizer.update_params(&mut self.dense1);
        optimizer.update_params(&mut self.dense2);
    }

    /// Most likely class per sample. Layer caches are not touched, so this
    /// can run between `forward` and `backward`.
    pub fn predict(&self, input: &Array2<T>) -> Result<Array1<usize>> {
        let hidden = self.dense1.forward_batch(input)?.mapv(|x| x.max(T::zero()));
        let logits = self.dense2.forward_batch(&hidden)?;
        Ok(argmax_rows(&logits.view()))
    }

    pub fn parameter_count(&self) -> usize {
        self.dense1.parameter_count() + self.dense2.parameter_count()
    }

    pub fn is_finite(&self) -> bool {
        self.dense1.is_finite() && self.dense2.is_finite()
    }

    fn logits(&mut self, input: &Array2<T>) -> Result<Array2<T>> {
        let hidden = self.dense1.forward(input)?;
        let hidden = self.relu.forward(&hidden)?;
        self.dense2.forward(&hidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nn::optimizers::UpdateRule;
    use ndarray::array;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn batch() -> (Array2<f64>, Targets<f64>) {
        let x = array![[0.5, 0.1], [-0.3, 0.8], [0.9, -0.7], [-0.6, -0.2]];
        (x, Targets::Sparse(array![0, 1, 2, 1]))
    }

    #[test]
    fn test_network_forward_shapes() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut network = Network::<f64>::new(2, 3, 3, &mut rng);
        let (x, y) = batch();

        let step = network.forward(&x, &y).unwrap();
        assert_eq!(step.predictions.shape(), &[4, 3]);
        assert!(step.loss.is_finite());
        assert!((0.0..=1.0).contains(&step.accuracy));
        assert_eq!(network.parameter_count(), 9 + 12);
    }

    #[test]
    fn test_network_backward_fills_gradients() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut network = Network::<f64>::new(2, 3, 3, &mut rng);
        let (x, y) = batch();

        network.forward(&x, &y).unwrap();
        network.backward(&y).unwrap();
        assert_eq!(network.dense1.weights_grad.shape(), &[2, 3]);
        assert_eq!(network.dense2.bias_grad.shape(), &[1, 3]);
        assert!(network.dense2.weights_grad.iter().any(|&g| g != 0.0));
    }

    #[test]
    fn test_network_backward_before_forward() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut network = Network::<f64>::new(2, 3, 3, &mut rng);
        let (_, y) = batch();
        assert!(matches!(network.backward(&y), Err(Error::MissingForward(_))));
    }

    #[test]
    fn test_network_training_reduces_loss() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut network = Network::<f64>::new(2, 8, 3, &mut rng);
        let optimizer = Sgd::new(1.0, UpdateRule::GradientDescent);
        let (x, y) = batch();

        let initial = network.forward(&x, &y).unwrap().loss;
        let mut last = initial;
        for _ in 0..500 {
            last = network.forward(&x, &y).unwrap().loss;
            network.backward(&y).unwrap();
            network.apply(&optimizer);
        }
        assert!(last < initial);
        assert!(network.is_finite());
    }

    #[test]
    fn test_network_predict() {
        let mut rng = StdRng::seed_from_u64(5);
        let network = Network::<f32>::new(2, 3, 3, &mut rng);
        let predicted = network.predict(&array![[0.1, 0.2], [0.3, -0.4]]).unwrap();
        assert_eq!(predicted.len(), 2);
        assert!(predicted.iter().all(|&c| c < 3));
    }

    #[test]
    fn test_network_predict_between_forward_and_backward() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut reference = Network::<f64>::new(2, 4, 3, &mut rng);
        let mut network = reference.clone();
        let (x, y) = batch();

        reference.forward(&x, &y).unwrap();
        reference.backward(&y).unwrap();

        network.forward(&x, &y).unwrap();
        let predicted = network.predict(&array![[2.0, -1.0], [0.3, 0.3]]).unwrap();
        assert_eq!(predicted.len(), 2);
        network.backward(&y).unwrap();

        assert_eq!(network.dense1.weights_grad, reference.dense1.weights_grad);
        assert_eq!(network.dense1.bias_grad, reference.dense1.bias_grad);
        assert_eq!(network.dense2.weights_grad, reference.dense2.weights_grad);
        assert_eq!(network.dense2.bias_grad, reference.dense2.bias_grad);
    }

    #[test]
    fn test_network_rejected_targets_keep_caches() {
        let mut rng = StdRng::seed_from_u64(8);
        let mut reference = Network::<f64>::new(2, 4, 3, &mut rng);
        let mut network = reference.clone();
        let (x, y) = batch();

        reference.forward(&x, &y).unwrap();
        reference.backward(&y).unwrap();

        network.forward(&x, &y).unwrap();
        let err = network
            .forward(&array![[1.0, 1.0], [0.5, -0.5]], &Targets::Sparse(array![0, 1, 2]))
            .unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { .. }));
        let err = network
            .forward(&array![[1.0, 1.0]], &Targets::Sparse(array![5]))
            .unwrap_err();
        assert!(matches!(err, Error::LabelOutOfRange { index: 5, classes: 3 }));
        network.backward(&y).unwrap();

        assert_eq!(network.dense1.weights_grad, reference.dense1.weights_grad);
        assert_eq!(network.dense2.weights_grad, reference.dense2.weights_grad);
        assert_eq!(network.dense2.bias_grad, reference.dense2.bias_grad);
    }

    #[test]
    fn test_network_rejects_wrong_feature_count() {
        let mut rng = StdRng::seed_from_u64(6);
        let mut network = Network::<f64>::new(2, 3, 3, &mut rng);
        let err = network.forward(&array![[1.0, 2.0, 3.0]], &Targets::Sparse(array![0])).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { .. }));
    }
}
