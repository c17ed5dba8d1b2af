use super::linear::Dense;
use crate::tensor::{constant, Scalar};

use serde::{Deserialize, Serialize};
use tracing::trace;

/// How `Sgd` moves the parameters of a layer.
///
/// The default is `GradientDescent`. The classic from-scratch spiral demo used
/// `ParameterDecay`; select it with `"update_rule": "parameter_decay"` to
/// reproduce that run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateRule {
    /// `W -= lr * dW`, `b -= lr * db`.
    #[default]
    GradientDescent,
    /// `W -= lr * W`, `b -= lr * b`, the update rule of the classic spiral
    /// demo. Ignores the gradients and only shrinks the parameters towards
    /// zero; at `lr = 1.0` every parameter is zero after one step.
    ParameterDecay,
}

/// Plain full-batch gradient descent.
#[derive(Debug, Clone)]
pub struct Sgd<T: Scalar> {
    pub learning_rate: T,
    pub rule: UpdateRule,
}

impl<T: Scalar> Sgd<T> {
    pub fn new(learning_rate: T, rule: UpdateRule) -> Self {
        Self { learning_rate, rule }
    }

    pub fn update_params(&self, layer: &mut Dense<T>) {
        let lr = self.learning_rate;
        match self.rule {
            UpdateRule::GradientDescent => {
                layer.weights.scaled_add(-lr, &layer.weights_grad);
                layer.bias.scaled_add(-lr, &layer.bias_grad);
            }
            UpdateRule::ParameterDecay => {
                let keep = T::one() - lr;
                layer.weights.mapv_inplace(|w| w * keep);
                layer.bias.mapv_inplace(|b| b * keep);
            }
        }
        trace!(rule = ?self.rule, "updated dense parameters");
    }
}

impl<T: Scalar> Default for Sgd<T> {
    fn default() -> Self {
        Self {
            learning_rate: constant(1.0),
            rule: UpdateRule::GradientDescent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nn::Layer;
    use ndarray::{array, Array2};

    fn trained_layer() -> Dense<f64> {
        let mut dense = Dense::from_weights(array![[1.0, 2.0], [3.0, 4.0]], array![[0.5, -0.5]]).unwrap();
        dense.forward(&array![[1.0, 0.0]]).unwrap();
        dense.backward(&array![[1.0, 2.0]]).unwrap();
        dense
    }

    #[test]
    fn test_gradient_descent_step() {
        let mut dense = trained_layer();
        assert_eq!(dense.weights_grad, array![[1.0, 2.0], [0.0, 0.0]]);

        Sgd::new(0.5, UpdateRule::GradientDescent).update_params(&mut dense);
        assert_eq!(dense.weights, array![[0.5, 1.0], [3.0, 4.0]]);
        assert_eq!(dense.bias, array![[0.0, -1.5]]);
    }

    #[test]
    fn test_parameter_decay_step() {
        let mut dense = trained_layer();
        Sgd::new(0.5, UpdateRule::ParameterDecay).update_params(&mut dense);
        assert_eq!(dense.weights, array![[0.5, 1.0], [1.5, 2.0]]);
        assert_eq!(dense.bias, array![[0.25, -0.25]]);
    }

    #[test]
    fn test_parameter_decay_with_unit_rate_zeroes_parameters() {
        let mut dense = trained_layer();
        Sgd::new(1.0, UpdateRule::ParameterDecay).update_params(&mut dense);
        assert_eq!(dense.weights, Array2::<f64>::zeros((2, 2)));
        assert_eq!(dense.bias, Array2::<f64>::zeros((1, 2)));
    }

    #[test]
    fn test_default_optimizer() {
        let sgd = Sgd::<f32>::default();
        assert_eq!(sgd.learning_rate, 1.0);
        assert_eq!(sgd.rule, UpdateRule::GradientDescent);
        assert_eq!(UpdateRule::default(), UpdateRule::GradientDescent);
    }

    #[test]
    fn test_update_rule_serde_names() {
        let rule: UpdateRule = serde_json::from_str("\"parameter_decay\"").unwrap();
        assert_eq!(rule, UpdateRule::ParameterDecay);
    }
}
