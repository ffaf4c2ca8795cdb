//! Simple linear regression over an evenly spaced series.
//!
//! The x axis is the position in the series (0, 1, ..., n-1), so a weekly
//! series yields a slope in "units per week".

/// Ordinary least-squares slope of `values` against their index.
///
/// Returns 0.0 for fewer than two points or when the x variance vanishes.
pub fn slope(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }

    let (mut sx, mut sy, mut sxy, mut sxx) = (0.0, 0.0, 0.0, 0.0);
    for (i, &y) in values.iter().enumerate() {
        let x = i as f64;
        sx += x;
        sy += y;
        sxy += x * y;
        sxx += x * x;
    }

    let n = n as f64;
    let denominator = n * sxx - sx * sx;
    if denominator == 0.0 {
        return 0.0;
    }

    (n * sxy - sx * sy) / denominator
}

/// Arithmetic mean; 0.0 for an empty series.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Slope divided by the series mean, i.e. the fractional change per step.
///
/// Returns 0.0 when the mean is not positive.
pub fn normalized_slope(values: &[f64]) -> f64 {
    let avg = mean(values);
    if avg > 0.0 {
        slope(values) / avg
    } else {
        0.0
    }
}
