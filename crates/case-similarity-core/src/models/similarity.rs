//! Similarity configuration and result models.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::case::ClinicalCase;
use crate::similarity::SimilarityResult;

/// Tolerance when checking that weights sum to 1.0.
const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Configuration errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("weight for {dimension} must be a finite non-negative number, got {value}")]
    InvalidWeight { dimension: &'static str, value: f64 },

    #[error("at least one weight must be positive")]
    AllWeightsZero,

    #[error("max_results must be at least 1")]
    ZeroMaxResults,

    #[error("min_similarity must be within [0, 1], got {0}")]
    MinSimilarityOutOfRange(f64),
}

/// Per-dimension weights for the aggregate score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SimilarityWeights {
    pub diagnosis: f64,
    pub symptoms: f64,
    pub demographics: f64,
    pub tags: f64,
    pub findings: f64,
    pub treatments: f64,
    pub lab_results: f64,
}

impl Default for SimilarityWeights {
    fn default() -> Self {
        Self {
            diagnosis: 0.25,
            symptoms: 0.20,
            tags: 0.15,
            findings: 0.15,
            demographics: 0.10,
            treatments: 0.10,
            lab_results: 0.05,
        }
    }
}

impl SimilarityWeights {
    fn named(&self) -> [(&'static str, f64); 7] {
        [
            ("diagnosis", self.diagnosis),
            ("symptoms", self.symptoms),
            ("demographics", self.demographics),
            ("tags", self.tags),
            ("findings", self.findings),
            ("treatments", self.treatments),
            ("labResults", self.lab_results),
        ]
    }

    /// Sum of all weights.
    pub fn sum(&self) -> f64 {
        self.named().iter().map(|(_, w)| w).sum()
    }

    /// Whether the weights sum to 1.0 (within tolerance).
    pub fn is_normalized(&self) -> bool {
        (self.sum() - 1.0).abs() < WEIGHT_SUM_TOLERANCE
    }

    /// Reject negative, non-finite and all-zero weights.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (dimension, value) in self.named() {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidWeight { dimension, value });
            }
        }
        if self.sum() <= 0.0 {
            return Err(ConfigError::AllWeightsZero);
        }
        Ok(())
    }
}

/// Partial weight override; unset fields keep the base value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct WeightsOverride {
    pub diagnosis: Option<f64>,
    pub symptoms: Option<f64>,
    pub demographics: Option<f64>,
    pub tags: Option<f64>,
    pub findings: Option<f64>,
    pub treatments: Option<f64>,
    pub lab_results: Option<f64>,
}

/// Per-call similarity configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SimilarityConfig {
    pub weights: SimilarityWeights,
    /// Result cap
    pub max_results: usize,
    /// Minimum total similarity to be listed
    pub min_similarity: f64,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            weights: SimilarityWeights::default(),
            max_results: 10,
            min_similarity: 0.3,
        }
    }
}

/// Partial configuration merged over [`SimilarityConfig::default`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SimilarityConfigOverride {
    pub weights: WeightsOverride,
    pub max_results: Option<usize>,
    pub min_similarity: Option<f64>,
}

impl SimilarityConfig {
    /// Merge a partial override over this configuration and validate the result.
    pub fn with_overrides(&self, overrides: &SimilarityConfigOverride) -> Result<Self, ConfigError> {
        let w = &overrides.weights;
        let merged = Self {
            weights: SimilarityWeights {
                diagnosis: w.diagnosis.unwrap_or(self.weights.diagnosis),
                symptoms: w.symptoms.unwrap_or(self.weights.symptoms),
                demographics: w.demographics.unwrap_or(self.weights.demographics),
                tags: w.tags.unwrap_or(self.weights.tags),
                findings: w.findings.unwrap_or(self.weights.findings),
                treatments: w.treatments.unwrap_or(self.weights.treatments),
                lab_results: w.lab_results.unwrap_or(self.weights.lab_results),
            },
            max_results: overrides.max_results.unwrap_or(self.max_results),
            min_similarity: overrides.min_similarity.unwrap_or(self.min_similarity),
        };
        merged.validate()?;
        Ok(merged)
    }

    /// Parse a JSON override document and merge it over the defaults.
    ///
    /// Malformed JSON fails with `Json`, out-of-range values with
    /// `InvalidConfig`.
    pub fn from_json(json: &str) -> SimilarityResult<Self> {
        let overrides: SimilarityConfigOverride = serde_json::from_str(json)?;
        Ok(Self::default().with_overrides(&overrides)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.weights.validate()?;
        if self.max_results == 0 {
            return Err(ConfigError::ZeroMaxResults);
        }
        if !(0.0..=1.0).contains(&self.min_similarity) {
            return Err(ConfigError::MinSimilarityOutOfRange(self.min_similarity));
        }
        Ok(())
    }
}

/// Raw scores of the seven dimensions for one case pair, each in [0, 1].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DimensionScores {
    pub diagnosis: f64,
    pub symptoms: f64,
    pub demographics: f64,
    pub tags: f64,
    pub findings: f64,
    pub treatments: f64,
    pub lab_results: f64,
}

impl DimensionScores {
    /// Weighted sum of all dimensions, clamped to [0, 1].
    pub fn weighted_total(&self, weights: &SimilarityWeights) -> f64 {
        let total = self.diagnosis * weights.diagnosis
            + self.symptoms * weights.symptoms
            + self.demographics * weights.demographics
            + self.tags * weights.tags
            + self.findings * weights.findings
            + self.treatments * weights.treatments
            + self.lab_results * weights.lab_results;
        total.clamp(0.0, 1.0)
    }
}

/// Category of a matched-feature group.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum FeatureCategory {
    Diagnosis,
    Tags,
    ImagingFindings,
}

impl FeatureCategory {
    /// Human-readable label shown on result chips.
    pub fn label(&self) -> &'static str {
        match self {
            FeatureCategory::Diagnosis => "Diagnosis",
            FeatureCategory::Tags => "Tags",
            FeatureCategory::ImagingFindings => "Imaging Findings",
        }
    }
}

impl std::fmt::Display for FeatureCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One explanation group attached to a result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchedFeature {
    pub category: FeatureCategory,
    pub items: Vec<String>,
}

/// A ranked similar case.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SimilarCaseResult {
    pub case: ClinicalCase,
    /// Total weighted similarity (0.0 - 1.0)
    pub similarity: f64,
    pub matched_features: Vec<MatchedFeature>,
    /// Per-dimension breakdown
    pub scores: DimensionScores,
}

impl SimilarCaseResult {
    /// Similarity as a rounded percentage for display.
    pub fn percentage(&self) -> u32 {
        (self.similarity * 100.0).round() as u32
    }
}
