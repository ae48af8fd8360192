use ndarray::{array, Array1};
use ozone::{
    ActivationType,
    FeedForwardLayer,
    Layer,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn layer(inputs: usize, neurons: usize, activation: ActivationType, seed: u64) -> FeedForwardLayer {
    FeedForwardLayer::new(inputs, neurons, activation, &mut StdRng::seed_from_u64(seed)).unwrap()
}

#[test]
fn test_layer_initialization() {
    let layer = layer(
        3,  // inputs
        4,  // neurons
        ActivationType::ReLU,
        0,
    );

    // Check layer configuration
    assert_eq!(layer.params.inputs, 3);
    assert_eq!(layer.params.neurons, 4);

    // Weights are (neurons × inputs), biases start at zero
    assert_eq!(layer.params.weights.dim(), (4, 3));
    assert_eq!(layer.params.bias, Array1::<f32>::zeros(4));
}

#[test]
fn test_zero_sized_layer_is_rejected() {
    let mut rng = StdRng::seed_from_u64(0);
    assert!(FeedForwardLayer::new(0, 4, ActivationType::ReLU, &mut rng).is_err());
    assert!(FeedForwardLayer::new(3, 0, ActivationType::ReLU, &mut rng).is_err());
}

#[test]
fn test_seeded_initialization_is_reproducible() {
    let a = layer(6, 5, ActivationType::ReLU, 42);
    let b = layer(6, 5, ActivationType::ReLU, 42);
    let c = layer(6, 5, ActivationType::ReLU, 43);

    assert_eq!(a.params.weights, b.params.weights);
    assert_ne!(a.params.weights, c.params.weights);
}

#[test]
fn test_forward_propagate() {
    let mut layer = layer(3, 2, ActivationType::ReLU, 0);

    let output = layer.forward(&array![1.0, 2.0, 3.0]);

    assert_eq!(output.len(), 2);
    // ReLU ensures non-negative
    assert!(output.iter().all(|&v| v >= 0.0));
    assert_eq!(layer.params.activation_cache, output);
}

#[test]
#[should_panic(expected = "Input size does not match layer's input size")]
fn test_forward_propagate_invalid_input_size() {
    let mut layer = layer(3, 2, ActivationType::ReLU, 0);

    let invalid_input = array![1.0, 2.0];
    layer.forward(&invalid_input);
}

#[test]
fn test_inference_matches_forward() {
    let mut layer = layer(3, 4, ActivationType::ReLU, 9);
    let rows = array![[0.5, -1.0, 2.0], [1.5, 0.0, -0.5]];

    let batch = layer.inference(rows.view());
    for (i, row) in rows.outer_iter().enumerate() {
        let single = layer.forward(&row.to_owned());
        for (a, b) in single.iter().zip(batch.row(i).iter()) {
            assert!((a - b).abs() < 1e-6);
        }
    }
}

#[test]
fn test_backward_matches_finite_differences() {
    let weights = array![[0.3, -0.2], [0.1, 0.4]];
    let bias = array![0.05, -0.1];
    let input = array![1.0, 2.0];
    let grad_output = array![1.0, 1.0];

    let mut layer = FeedForwardLayer::from_weights(weights.clone(), bias.clone(), ActivationType::Linear);
    layer.forward(&input);
    let grad_input = layer.backward(&input, &grad_output);

    // For a linear layer summed over outputs, dL/dW[i][j] = input[j]
    assert_eq!(layer.params.weight_grads, array![[1.0, 2.0], [1.0, 2.0]]);
    assert_eq!(layer.params.bias_grads, array![1.0, 1.0]);

    // dL/dinput = sum over neurons of W[i][j]
    let eps = 1e-3;
    for j in 0..2 {
        let mut bumped = input.clone();
        bumped[j] += eps;
        let probe = FeedForwardLayer::from_weights(weights.clone(), bias.clone(), ActivationType::Linear);
        let up = probe.inference(bumped.view().insert_axis(ndarray::Axis(0))).sum();
        let base = probe.inference(input.view().insert_axis(ndarray::Axis(0))).sum();
        assert!(((up - base) / eps - grad_input[j]).abs() < 1e-2);
    }
}

#[test]
fn test_zero_and_scale_grads() {
    let mut layer = layer(2, 2, ActivationType::Linear, 0);
    let input = array![1.0, 1.0];
    layer.forward(&input);
    layer.backward(&input, &array![2.0, 2.0]);

    layer.scale_grads(0.5);
    assert_eq!(layer.params.bias_grads, array![1.0, 1.0]);

    layer.zero_grads();
    assert!(layer.params.weight_grads.iter().all(|&g| g == 0.0));
}
