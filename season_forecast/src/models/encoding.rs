//! Mapping of categorical feature strings to integer codes

use crate::error::{ForecastError, Result};
use crate::features::{FeatureMatrix, FeatureValues};
use boost_trees::{Dataset, FeatureColumn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum EncodedFeature {
    Numeric {
        name: String,
    },
    Categorical {
        name: String,
        vocabulary: BTreeMap<String, u32>,
    },
}

impl EncodedFeature {
    fn name(&self) -> &str {
        match self {
            EncodedFeature::Numeric { name } | EncodedFeature::Categorical { name, .. } => name,
        }
    }
}

/// Feature layout and category vocabularies learned from training rows.
///
/// Stored with the trained model so prediction encodes exactly as training
/// did. Categories never seen during fitting are encoded as missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryEncoder {
    features: Vec<EncodedFeature>,
}

impl CategoryEncoder {
    /// Learn the layout and vocabularies; codes follow first appearance
    pub fn fit(x: &FeatureMatrix) -> Self {
        let features = x
            .columns()
            .iter()
            .map(|column| match &column.values {
                FeatureValues::Numeric(_) => EncodedFeature::Numeric {
                    name: column.name.clone(),
                },
                FeatureValues::Categorical(values) => {
                    let mut vocabulary = BTreeMap::new();
                    for value in values.iter().flatten() {
                        let next = vocabulary.len() as u32;
                        vocabulary.entry(value.clone()).or_insert(next);
                    }
                    EncodedFeature::Categorical {
                        name: column.name.clone(),
                        vocabulary,
                    }
                }
            })
            .collect();
        Self { features }
    }

    /// Names of the encoded features, in model column order
    pub fn feature_names(&self) -> Vec<&str> {
        self.features.iter().map(EncodedFeature::name).collect()
    }

    /// Number of known categories of a categorical feature
    pub fn n_categories(&self, name: &str) -> Option<usize> {
        self.features.iter().find_map(|f| match f {
            EncodedFeature::Categorical {
                name: n,
                vocabulary,
            } if n == name => Some(vocabulary.len()),
            _ => None,
        })
    }

    /// Encode a matrix with the learned layout.
    ///
    /// Columns are matched by name; a missing or retyped feature is an error.
    pub fn transform(&self, x: &FeatureMatrix) -> Result<Dataset> {
        let mut columns = Vec::with_capacity(self.features.len());
        for feature in &self.features {
            let source = x.column(feature.name()).ok_or_else(|| {
                ForecastError::ModelError(format!("Missing feature '{}'", feature.name()))
            })?;
            let column = match (feature, &source.values) {
                (EncodedFeature::Numeric { .. }, FeatureValues::Numeric(values)) => {
                    FeatureColumn::Numeric(values.clone())
                }
                (EncodedFeature::Categorical { vocabulary, .. }, FeatureValues::Categorical(values)) => {
                    FeatureColumn::Categorical(
                        values
                            .iter()
                            .map(|v| v.as_ref().and_then(|s| vocabulary.get(s).copied()))
                            .collect(),
                    )
                }
                _ => {
                    return Err(ForecastError::ModelError(format!(
                        "Feature '{}' changed type since training",
                        feature.name()
                    )))
                }
            };
            columns.push(column);
        }
        Ok(Dataset::new(columns)?)
    }
}
