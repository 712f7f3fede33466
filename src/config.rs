//! Word-space session configuration

use crate::algebra::{CombinedWeights, CompositionMethod};
use crate::codec::FeatureSpace;
use crate::error::{Result, WordSpaceError};
use crate::persistence::serialization;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How a corpus scan walks the word space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanMode {
    #[default]
    Sequential,
    /// Score records on the rayon thread pool
    Parallel,
}

/// Configuration for a word-space session.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WordSpaceConfig {
    /// Decode the whole word space into memory when opening it.
    pub load_into_memory: bool,
    /// Vector shape used for phrase composition and corpus scans.
    pub composition_features: FeatureSpace,
    pub scan: ScanMode,
    /// Weights for combined composition; unset weights use the defaults.
    pub combined: CombinedWeights,
    /// Dilation stretch factor; unset uses the default.
    pub dilation_lambda: Option<f32>,
}

impl WordSpaceConfig {
    /// Load a configuration from a JSON file. Missing fields keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        serialization::from_json(&bytes)
    }

    /// Resolve a method name, applying the configured weights.
    pub fn composition_method(&self, name: &str) -> Result<CompositionMethod> {
        Ok(match name.parse::<CompositionMethod>()? {
            CompositionMethod::Combined(_) => CompositionMethod::Combined(self.combined),
            CompositionMethod::Dilation { .. } => CompositionMethod::Dilation {
                lambda: self.dilation_lambda,
            },
            other => other,
        })
    }

    pub fn validate(&self) -> Result<()> {
        let weights = [
            self.combined.alpha,
            self.combined.beta,
            self.combined.gamma,
            self.dilation_lambda,
        ];
        if weights.iter().flatten().any(|w| !w.is_finite()) {
            return Err(WordSpaceError::SerializationError(
                "composition weights must be finite".to_string(),
            ));
        }
        Ok(())
    }
}
