//! Quantile borders for numeric features
//!
//! A value falls on the "left" of border `k` when `value <= borders[k]`.
//! Missing values (`NaN`) are always placed after every border.

/// Candidate split borders for a numeric column, at most `max_bins - 1` of them
pub fn quantile_borders(values: &[f64], max_bins: usize) -> Vec<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.len() < 2 || max_bins < 2 {
        return Vec::new();
    }
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mut unique = sorted.clone();
    unique.dedup();

    if unique.len() <= max_bins {
        // Few distinct values: split halfway between each neighbouring pair
        return unique.windows(2).map(|w| (w[0] + w[1]) / 2.0).collect();
    }

    let mut borders: Vec<f64> = (1..max_bins)
        .map(|i| sorted[i * sorted.len() / max_bins])
        .collect();
    borders.dedup();
    // The maximum can't separate anything
    if borders.last() == unique.last() {
        borders.pop();
    }
    borders
}

/// Bin of a value: the number of borders strictly below it.
///
/// `NaN` maps to `borders.len()`, past every border.
pub fn bin_index(borders: &[f64], value: f64) -> usize {
    if value.is_nan() {
        borders.len()
    } else {
        borders.partition_point(|b| *b < value)
    }
}
