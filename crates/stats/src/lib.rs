//! Statistical helper functions shared by the pluvio crates.

/// Arithmetic mean of a slice. Returns 0.0 if empty.
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let sum: f64 = data.iter().sum();
    sum / data.len() as f64
}

/// Sample variance with N-1 denominator.
/// Returns 0.0 if fewer than 2 elements.
pub fn variance(data: &[f64]) -> f64 {
    let n = data.len();
    if n < 2 {
        return 0.0;
    }
    let nf = n as f64;
    let mean = data.iter().sum::<f64>() / nf;
    data.iter().map(|&x| (x - mean) * (x - mean)).sum::<f64>() / (nf - 1.0)
}

/// Sample standard deviation with N-1 denominator.
/// Returns 0.0 if fewer than 2 elements.
pub fn sd(data: &[f64]) -> f64 {
    variance(data).sqrt()
}

/// Coefficient of determination of `predicted` against `observed`.
///
/// R² = 1 - SS_res / SS_tot, computed over indices where both values are
/// finite. Returns `None` if fewer than 2 finite pairs remain or the observed
/// values are constant (SS_tot = 0).
pub fn r_squared(observed: &[f64], predicted: &[f64]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = observed
        .iter()
        .zip(predicted.iter())
        .filter(|(o, p)| o.is_finite() && p.is_finite())
        .map(|(o, p)| (*o, *p))
        .collect();

    if pairs.len() < 2 {
        return None;
    }

    let mo = pairs.iter().map(|(o, _)| o).sum::<f64>() / pairs.len() as f64;
    let ss_tot: f64 = pairs.iter().map(|(o, _)| (o - mo) * (o - mo)).sum();
    if ss_tot == 0.0 {
        return None;
    }
    let ss_res: f64 = pairs.iter().map(|(o, p)| (o - p) * (o - p)).sum();

    Some(1.0 - ss_res / ss_tot)
}
