use scratchnet_core::config::TrainConfig;
use scratchnet_core::nn::linear::Dense;
use scratchnet_core::nn::Layer;
use scratchnet_core::train::train_spiral;

use ndarray::array;
use std::path::Path;
use tracing::info;

const CONFIG_PATH: &str = "train_config.json";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    layer_demo()?;

    let config = if Path::new(CONFIG_PATH).exists() {
        let config = TrainConfig::from_file(CONFIG_PATH)?;
        info!("Config loaded from {}", CONFIG_PATH);
        config
    } else {
        TrainConfig::default()
    };

    let (network, report) = train_spiral::<f64>(&config)?;

    println!("Final accuracy: {:.3}, loss: {:.3}, time: {:?}", report.final_accuracy, report.final_loss, report.elapsed);
    println!("dense1 weights gradient:\n{}", network.dense1.weights_grad);
    println!("dense1 bias gradient:\n{}", network.dense1.bias_grad);
    println!("dense2 weights gradient:\n{}", network.dense2.weights_grad);
    println!("dense2 bias gradient:\n{}", network.dense2.bias_grad);

    Ok(())
}

/// Hand-written three-neuron layer, fed one sample and then a batch.
fn layer_demo() -> Result<(), Box<dyn std::error::Error>> {
    let neurons = vec![
        vec![0.2, 0.8, -0.5, 1.0],
        vec![0.5, -0.91, 0.26, -0.5],
        vec![-0.26, -0.27, 0.17, 0.87],
    ];
    let mut layer = Dense::<f64>::from_neuron_weights(&neurons, &[2.0, 3.0, 0.5])?;

    println!("{}", layer.forward_sample(&array![1.0, 2.0, 3.0, 2.5])?);

    let output = layer.forward(&array![
        [1.0, 2.0, 3.0, 2.5],
        [2.0, 5.0, -1.0, 2.0],
        [-1.5, 2.7, 3.3, -0.8]
    ])?;
    println!("Output shape: {:?}", output.shape());
    println!("{}", output);

    Ok(())
}
