use crate::error::{Error, Result};
use crate::nn::optimizers::UpdateRule;

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Hyperparameters of a spiral training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub samples_per_class: usize,
    pub classes: usize,
    pub hidden_neurons: usize,
    pub epochs: usize,
    pub log_every: usize,
    pub learning_rate: f64,
    pub update_rule: UpdateRule,
    /// Fixed RNG seed; `None` draws from OS entropy.
    pub seed: Option<u64>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            samples_per_class: 100,
            classes: 3,
            hidden_neurons: 3,
            epochs: 10001,
            log_every: 100,
            learning_rate: 1.0,
            update_rule: UpdateRule::GradientDescent,
            seed: None,
        }
    }
}

impl TrainConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let sizes = [
            ("samples_per_class", self.samples_per_class),
            ("classes", self.classes),
            ("hidden_neurons", self.hidden_neurons),
            ("epochs", self.epochs),
            ("log_every", self.log_every),
        ];
        if let Some((name, _)) = sizes.iter().find(|(_, value)| *value == 0) {
            return Err(Error::Config(format!("{} must be greater than zero", name)));
        }
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(Error::Config(format!(
                "learning_rate must be positive and finite, got {}",
                self.learning_rate
            )));
        }
        Ok(())
    }
}
