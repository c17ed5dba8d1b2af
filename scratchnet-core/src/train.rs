use crate::config::TrainConfig;
use crate::data::{spiral_data, Dataset};
use crate::error::{Error, Result};
use crate::nn::network::Network;
use crate::nn::optimizers::Sgd;
use crate::tensor::{check_finite, constant, Scalar};

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq)]
pub struct EpochStats<T> {
    pub epoch: usize,
    pub loss: T,
    pub accuracy: T,
}

#[derive(Debug, Clone)]
pub struct TrainReport<T> {
    pub final_loss: T,
    pub final_accuracy: T,
    /// Stats of every logged epoch.
    pub history: Vec<EpochStats<T>>,
    pub elapsed: Duration,
}

/// Full-batch training: forward, backward, then one optimizer step per layer,
/// repeated `config.epochs` times.
pub fn train<T: Scalar>(
    network: &mut Network<T>,
    dataset: &Dataset<T>,
    optimizer: &Sgd<T>,
    config: &TrainConfig,
) -> Result<TrainReport<T>> {
    config.validate()?;

    let targets = dataset.targets();
    let start = Instant::now();
    let mut history = Vec::new();
    let mut final_loss = T::nan();
    let mut final_accuracy = T::zero();

    info!(
        epochs = config.epochs,
        samples = dataset.len(),
        parameters = network.parameter_count(),
        "starting training"
    );

    for epoch in 0..config.epochs {
        let step = network.forward(&dataset.x, &targets)?;
        if !step.loss.is_finite() {
            return Err(Error::NonFinite(format!("loss at epoch {}", epoch)));
        }

        if epoch % config.log_every == 0 {
            println!("epoch: {}, acc: {:.3}, loss: {:.3}", epoch, step.accuracy, step.loss);
            history.push(EpochStats { epoch, loss: step.loss, accuracy: step.accuracy });
        }
        debug!(epoch, loss = %step.loss, accuracy = %step.accuracy, "forward pass");

        network.backward(&targets)?;
        network.apply(optimizer);

        final_loss = step.loss;
        final_accuracy = step.accuracy;
    }

    check_finite(&network.dense1.weights, "dense1 weights")?;
    check_finite(&network.dense1.bias, "dense1 bias")?;
    check_finite(&network.dense2.weights, "dense2 weights")?;
    check_finite(&network.dense2.bias, "dense2 bias")?;

    let elapsed = start.elapsed();
    info!(loss = %final_loss, accuracy = %final_accuracy, ?elapsed, "training finished");

    Ok(TrainReport { final_loss, final_accuracy, history, elapsed })
}

/// Generates the spiral dataset, builds the network and trains it.
pub fn train_spiral<T: Scalar>(config: &TrainConfig) -> Result<(Network<T>, TrainReport<T>)> {
    config.validate()?;

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let dataset = spiral_data::<T, _>(config.samples_per_class, config.classes, &mut rng)?;
    let mut network = Network::new(dataset.features(), config.hidden_neurons, config.classes, &mut rng);
    let optimizer = Sgd::new(constant(config.learning_rate), config.update_rule);

    let report = train(&mut network, &dataset, &optimizer, config)?;
    Ok((network, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nn::optimizers::UpdateRule;
    use approx::assert_abs_diff_eq;

    fn small_config() -> TrainConfig {
        TrainConfig {
            samples_per_class: 30,
            classes: 3,
            hidden_neurons: 16,
            epochs: 501,
            log_every: 100,
            learning_rate: 1.0,
            update_rule: UpdateRule::GradientDescent,
            seed: Some(0),
        }
    }

    #[test]
    fn test_train_logs_every_interval() {
        let (_, report) = train_spiral::<f64>(&small_config()).unwrap();
        let epochs: Vec<usize> = report.history.iter().map(|s| s.epoch).collect();
        assert_eq!(epochs, vec![0, 100, 200, 300, 400, 500]);
    }

    #[test]
    fn test_train_gradient_descent_lowers_loss() {
        let (network, report) = train_spiral::<f64>(&small_config()).unwrap();
        assert!(report.final_loss.is_finite());
        assert!(report.final_loss < report.history[0].loss);
        assert!((0.0..=1.0).contains(&report.final_accuracy));
        assert!(network.is_finite());
    }

    #[test]
    fn test_train_parameter_decay_collapses_to_uniform() {
        let config = TrainConfig { update_rule: UpdateRule::ParameterDecay, epochs: 20, ..small_config() };
        let (network, report) = train_spiral::<f64>(&config).unwrap();

        assert!(network.dense1.weights.iter().all(|&w| w == 0.0));
        assert!(network.dense2.weights.iter().all(|&w| w == 0.0));
        assert_abs_diff_eq!(report.final_loss, 3.0f64.ln(), epsilon = 1e-12);
    }

    #[test]
    fn test_train_rejects_invalid_config() {
        let config = TrainConfig { log_every: 0, ..small_config() };
        assert!(matches!(train_spiral::<f32>(&config), Err(Error::Config(_))));
    }
}
