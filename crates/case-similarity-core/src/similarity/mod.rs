//! Clinical case similarity engine.
//!
//! Pipeline: Repository → Dimension Scorers → Aggregation → Match Explainer → Ranker

mod dimensions;
mod explainer;
mod lexicon;
mod ranker;

pub use dimensions::*;
pub use explainer::*;
pub use lexicon::*;
pub use ranker::*;

use std::collections::HashMap;

use thiserror::Error;

use crate::models::{
    ClinicalCase, ConfigError, DimensionScores, SimilarCaseResult, SimilarityConfig,
    SimilarityConfigOverride,
};
use crate::repository::CaseReader;

/// Similarity errors.
#[derive(Error, Debug)]
pub enum SimilarityError {
    #[error("Database error: {0}")]
    Database(#[from] crate::db::DbError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type SimilarityResult<T> = Result<T, SimilarityError>;

/// Scores a target case against every other case in a repository.
pub struct SimilarityEngine<'a, R: CaseReader + ?Sized> {
    repo: &'a R,
    lexicon: &'a ClinicalLexicon,
}

impl<'a, R: CaseReader + ?Sized> SimilarityEngine<'a, R> {
    /// Create a new engine over a case repository.
    pub fn new(repo: &'a R, lexicon: &'a ClinicalLexicon) -> Self {
        Self { repo, lexicon }
    }

    /// Find cases similar to `target_id`, with optional overrides merged over
    /// the default configuration.
    ///
    /// An unknown target yields an empty list, not an error.
    pub fn similar_cases(
        &self,
        target_id: &str,
        overrides: Option<&SimilarityConfigOverride>,
    ) -> SimilarityResult<Vec<SimilarCaseResult>> {
        let config = match overrides {
            Some(o) => SimilarityConfig::default().with_overrides(o)?,
            None => SimilarityConfig::default(),
        };
        self.similar_cases_with_config(target_id, &config)
    }

    /// Find cases similar to `target_id` with a complete configuration.
    pub fn similar_cases_with_config(
        &self,
        target_id: &str,
        config: &SimilarityConfig,
    ) -> SimilarityResult<Vec<SimilarCaseResult>> {
        let Some(target) = self.repo.get_case(target_id)? else {
            tracing::debug!(target_id, "target case not found");
            return Ok(Vec::new());
        };
        self.similar_to_case(&target, config)
    }

    /// Rank the corpus against an ad-hoc case (which need not be stored).
    ///
    /// Stored cases sharing the target's ID are excluded.
    pub fn similar_to_case(
        &self,
        target: &ClinicalCase,
        config: &SimilarityConfig,
    ) -> SimilarityResult<Vec<SimilarCaseResult>> {
        config.validate()?;
        if !config.weights.is_normalized() {
            tracing::warn!(
                sum = config.weights.sum(),
                "similarity weights do not sum to 1.0; totals are clamped to [0, 1]"
            );
        }

        let candidates: Vec<ClinicalCase> = self
            .repo
            .list_cases()?
            .into_iter()
            .filter(|c| c.id != target.id)
            .collect();

        let tag_names: HashMap<String, String> = self
            .repo
            .list_tags()?
            .into_iter()
            .map(|t| (t.id, t.name))
            .collect();

        tracing::debug!(
            target_id = %target.id,
            candidates = candidates.len(),
            "scoring candidates"
        );

        let scored = score_candidates(target, candidates, self.lexicon, config, &tag_names);
        let ranked = rank(scored, config);

        tracing::debug!(target_id = %target.id, results = ranked.len(), "ranked similar cases");
        Ok(ranked)
    }

    /// All seven dimension scores for one pair.
    pub fn score_pair(&self, a: &ClinicalCase, b: &ClinicalCase) -> DimensionScores {
        score_pair(a, b, self.lexicon)
    }
}

/// All seven dimension scores for one pair.
pub fn score_pair(a: &ClinicalCase, b: &ClinicalCase, lexicon: &ClinicalLexicon) -> DimensionScores {
    DimensionScores {
        diagnosis: diagnosis_similarity(&a.diagnosis, &b.diagnosis),
        symptoms: symptom_similarity(a, b, lexicon),
        demographics: demographic_similarity(&a.patient_info, &b.patient_info, lexicon),
        tags: tag_similarity(&a.tags, &b.tags),
        findings: finding_similarity(a, b, lexicon),
        treatments: treatment_similarity(&a.treatments, &b.treatments),
        lab_results: lab_similarity(&a.lab_tests, &b.lab_tests),
    }
}

fn score_candidate(
    target: &ClinicalCase,
    candidate: ClinicalCase,
    lexicon: &ClinicalLexicon,
    config: &SimilarityConfig,
    tag_names: &HashMap<String, String>,
) -> SimilarCaseResult {
    let scores = score_pair(target, &candidate, lexicon);
    let matched_features = explain_match(target, &candidate, &scores, tag_names);
    SimilarCaseResult {
        similarity: scores.weighted_total(&config.weights),
        matched_features,
        scores,
        case: candidate,
    }
}

#[cfg(not(feature = "parallel"))]
fn score_candidates(
    target: &ClinicalCase,
    candidates: Vec<ClinicalCase>,
    lexicon: &ClinicalLexicon,
    config: &SimilarityConfig,
    tag_names: &HashMap<String, String>,
) -> Vec<SimilarCaseResult> {
    candidates
        .into_iter()
        .map(|c| score_candidate(target, c, lexicon, config, tag_names))
        .collect()
}

#[cfg(feature = "parallel")]
fn score_candidates(
    target: &ClinicalCase,
    candidates: Vec<ClinicalCase>,
    lexicon: &ClinicalLexicon,
    config: &SimilarityConfig,
    tag_names: &HashMap<String, String>,
) -> Vec<SimilarCaseResult> {
    use rayon::prelude::*;

    // Indexed collect keeps enumeration order, so the stable sort in `rank`
    // breaks ties exactly as the sequential path does.
    candidates
        .into_par_iter()
        .map(|c| score_candidate(target, c, lexicon, config, tag_names))
        .collect()
}
