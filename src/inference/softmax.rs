//! Probability normalization for classifier logits.

/// Numerically stable softmax.
///
/// The maximum is subtracted before exponentiation. An empty input yields
/// an empty output and a zero exponent sum yields all zeros.
pub fn softmax(values: &[f32]) -> Vec<f32> {
    if values.is_empty() {
        return Vec::new();
    }
    let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f64> = values
        .iter()
        .map(|&v| ((v - max) as f64).exp())
        .collect();
    let sum: f64 = exps.iter().sum();
    if sum == 0.0 || !sum.is_finite() {
        return vec![0.0; values.len()];
    }
    exps.iter().map(|e| (e / sum) as f32).collect()
}

/// Softmax of `values / temperature`.
///
/// A non-finite or non-positive temperature is treated as 1.
pub fn softmax_with_temperature(values: &[f32], temperature: f32) -> Vec<f32> {
    let t = sanitize_temperature(temperature);
    if t == 1.0 {
        return softmax(values);
    }
    let scaled: Vec<f32> = values.iter().map(|v| v / t).collect();
    softmax(&scaled)
}

/// Replace unusable calibration temperatures with 1.
pub fn sanitize_temperature(temperature: f32) -> f32 {
    if temperature.is_finite() && temperature > 0.0 {
        temperature
    } else {
        1.0
    }
}

/// Probability of class 1 from a two-logit binary classifier.
///
/// Any other output shape passes through as 1.0.
pub fn binary_probability(logits: &[f32]) -> f32 {
    match logits {
        [_, _] => softmax(logits)[1],
        _ => 1.0,
    }
}
