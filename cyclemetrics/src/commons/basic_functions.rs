/// Arithmetic mean of `values`, NaN for an empty slice
///
/// NaN entries propagate.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// `part / total * 100`, NaN when there is nothing to count
pub fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        return f64::NAN;
    }
    (part as f64 / total as f64) * 100.0
}

/// Square meters to square kilometers
pub fn m2_to_km2(area_m2: f64) -> f64 {
    area_m2 / 1e6
}

/// Meters to kilometers
pub fn m_to_km(length_m: f64) -> f64 {
    length_m / 1000.0
}
