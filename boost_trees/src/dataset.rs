//! Column-major feature storage shared by the learners

use crate::{BoostError, Result};
use serde::{Deserialize, Serialize};

/// Kind of a feature column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureKind {
    Numeric,
    Categorical,
}

/// A single feature column
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureColumn {
    /// Numeric values; `NaN` marks a missing value
    Numeric(Vec<f64>),
    /// Category codes; `None` marks a missing or unseen category
    Categorical(Vec<Option<u32>>),
}

impl FeatureColumn {
    /// Number of rows in the column
    pub fn len(&self) -> usize {
        match self {
            FeatureColumn::Numeric(values) => values.len(),
            FeatureColumn::Categorical(codes) => codes.len(),
        }
    }

    /// Whether the column has no rows
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Kind of the column
    pub fn kind(&self) -> FeatureKind {
        match self {
            FeatureColumn::Numeric(_) => FeatureKind::Numeric,
            FeatureColumn::Categorical(_) => FeatureKind::Categorical,
        }
    }

    fn select(&self, rows: &[usize]) -> FeatureColumn {
        match self {
            FeatureColumn::Numeric(values) => {
                FeatureColumn::Numeric(rows.iter().map(|&r| values[r]).collect())
            }
            FeatureColumn::Categorical(codes) => {
                FeatureColumn::Categorical(rows.iter().map(|&r| codes[r]).collect())
            }
        }
    }
}

/// Feature matrix stored column by column
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    columns: Vec<FeatureColumn>,
    n_rows: usize,
}

impl Dataset {
    /// Create a dataset from columns of equal length
    pub fn new(columns: Vec<FeatureColumn>) -> Result<Self> {
        let n_rows = match columns.first() {
            Some(column) => column.len(),
            None => {
                return Err(BoostError::InvalidInput(
                    "dataset needs at least one feature column".to_string(),
                ))
            }
        };

        if let Some(position) = columns.iter().position(|c| c.len() != n_rows) {
            return Err(BoostError::InvalidInput(format!(
                "column {} has {} rows, expected {}",
                position,
                columns[position].len(),
                n_rows
            )));
        }

        Ok(Self { columns, n_rows })
    }

    /// Number of rows
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Number of feature columns
    pub fn n_features(&self) -> usize {
        self.columns.len()
    }

    /// All feature columns
    pub fn columns(&self) -> &[FeatureColumn] {
        &self.columns
    }

    /// A single feature column
    pub fn column(&self, index: usize) -> Option<&FeatureColumn> {
        self.columns.get(index)
    }

    /// Kinds of all feature columns, in order
    pub fn kinds(&self) -> Vec<FeatureKind> {
        self.columns.iter().map(FeatureColumn::kind).collect()
    }

    /// New dataset containing only the given rows, in the given order
    pub fn select_rows(&self, rows: &[usize]) -> Dataset {
        Dataset {
            columns: self.columns.iter().map(|c| c.select(rows)).collect(),
            n_rows: rows.len(),
        }
    }

    pub(crate) fn check_kinds(&self, expected: &[FeatureKind]) -> Result<()> {
        let kinds = self.kinds();
        if kinds != expected {
            return Err(BoostError::InvalidInput(format!(
                "feature layout {:?} doesn't match the layout the model was trained on {:?}",
                kinds, expected
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_ragged_columns() {
        let result = Dataset::new(vec![
            FeatureColumn::Numeric(vec![1.0, 2.0]),
            FeatureColumn::Categorical(vec![Some(0)]),
        ]);
        assert!(matches!(result, Err(BoostError::InvalidInput(_))));
    }

    #[test]
    fn test_new_rejects_empty_layout() {
        assert!(Dataset::new(Vec::new()).is_err());
    }

    #[test]
    fn test_select_rows_keeps_order() {
        let data = Dataset::new(vec![
            FeatureColumn::Numeric(vec![1.0, 2.0, 3.0]),
            FeatureColumn::Categorical(vec![Some(0), None, Some(2)]),
        ])
        .unwrap();

        let subset = data.select_rows(&[2, 0]);
        assert_eq!(subset.n_rows(), 2);
        assert_eq!(subset.column(0), Some(&FeatureColumn::Numeric(vec![3.0, 1.0])));
        assert_eq!(
            subset.column(1),
            Some(&FeatureColumn::Categorical(vec![Some(2), Some(0)]))
        );
        assert_eq!(
            subset.kinds(),
            vec![FeatureKind::Numeric, FeatureKind::Categorical]
        );
    }
}
