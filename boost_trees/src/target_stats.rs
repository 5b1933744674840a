//! Target statistics for categorical columns
//!
//! A category is replaced by a smoothed mean of the targets seen with it:
//! `(sum + prior * prior_weight) / (count + prior_weight)`.
//! During training the statistic of each row only uses rows that come
//! before it in a random permutation, so a row never sees its own target.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetStatistics {
    prior: f64,
    prior_weight: f64,
    /// Per category: (target sum, row count)
    totals: BTreeMap<u32, (f64, f64)>,
}

impl TargetStatistics {
    /// Statistics over all rows, used at prediction time
    pub fn fit(codes: &[Option<u32>], targets: &[f64], prior: f64, prior_weight: f64) -> Self {
        let mut totals: BTreeMap<u32, (f64, f64)> = BTreeMap::new();
        for (code, &target) in codes.iter().zip(targets) {
            if let Some(code) = code {
                let entry = totals.entry(*code).or_insert((0.0, 0.0));
                entry.0 += target;
                entry.1 += 1.0;
            }
        }

        Self {
            prior,
            prior_weight,
            totals,
        }
    }

    /// Encoded value of a category; missing or unseen categories get the prior
    pub fn encode(&self, code: Option<u32>) -> f64 {
        match code.and_then(|c| self.totals.get(&c)) {
            Some(&(sum, count)) => self.smooth(sum, count),
            None => self.prior,
        }
    }

    /// Encode a training column following `permutation`
    pub fn ordered_encode(
        codes: &[Option<u32>],
        targets: &[f64],
        permutation: &[usize],
        prior: f64,
        prior_weight: f64,
    ) -> Vec<f64> {
        let mut totals: BTreeMap<u32, (f64, f64)> = BTreeMap::new();
        let mut encoded = vec![prior; codes.len()];

        for &row in permutation {
            if let Some(code) = codes[row] {
                let entry = totals.entry(code).or_insert((0.0, 0.0));
                encoded[row] = smooth(entry.0, entry.1, prior, prior_weight);
                entry.0 += targets[row];
                entry.1 += 1.0;
            }
        }

        encoded
    }

    pub fn prior(&self) -> f64 {
        self.prior
    }

    /// Number of distinct categories seen during fitting
    pub fn n_categories(&self) -> usize {
        self.totals.len()
    }

    fn smooth(&self, sum: f64, count: f64) -> f64 {
        smooth(sum, count, self.prior, self.prior_weight)
    }
}

fn smooth(sum: f64, count: f64, prior: f64, prior_weight: f64) -> f64 {
    (sum + prior * prior_weight) / (count + prior_weight)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_encode_uses_smoothed_mean() {
        let codes = [Some(0), Some(0), Some(1), None];
        let targets = [10.0, 20.0, 40.0, 99.0];
        let stats = TargetStatistics::fit(&codes, &targets, 5.0, 1.0);

        assert_relative_eq!(stats.encode(Some(0)), (30.0 + 5.0) / 3.0);
        assert_relative_eq!(stats.encode(Some(1)), (40.0 + 5.0) / 2.0);
        assert_relative_eq!(stats.encode(Some(7)), 5.0);
        assert_relative_eq!(stats.encode(None), 5.0);
        assert_eq!(stats.n_categories(), 2);
    }

    #[test]
    fn test_ordered_encode_only_sees_earlier_rows() {
        let codes = [Some(3), Some(3), Some(3)];
        let targets = [1.0, 2.0, 3.0];
        let encoded = TargetStatistics::ordered_encode(&codes, &targets, &[2, 0, 1], 0.0, 1.0);

        // Row 2 comes first and only sees the prior
        assert_relative_eq!(encoded[2], 0.0);
        // Row 0 sees row 2
        assert_relative_eq!(encoded[0], 3.0 / 2.0);
        // Row 1 sees rows 2 and 0
        assert_relative_eq!(encoded[1], 4.0 / 3.0);
    }
}
