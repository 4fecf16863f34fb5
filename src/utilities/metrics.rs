pub fn mean(x: &[f64]) -> f64 {
    x.iter().sum::<f64>() / x.len() as f64
}

// Assumes that the indexes of each slice align
pub fn weighted_mean(x: &[f64], weights: &[f64]) -> f64 {
    let total_weight: f64 = weights.iter().sum();

    x.iter()
        .zip(weights)
        .map(|(x, w)| x * w / total_weight)
        .sum()
}

pub fn min(x: &[f64]) -> f64 {
    x.iter().cloned().fold(f64::INFINITY, f64::min)
}
