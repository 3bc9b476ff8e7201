//! Case Similarity Core Library
//!
//! Clinical case library storage with an explainable, deterministic case
//! similarity engine.
//!
//! # Architecture
//!
//! ```text
//!                 Case Repository (SQLite / in-memory)
//!                               │
//!                  target case + all other cases
//!                               │
//!     ┌──────────┬──────────┬───┴──────┬──────────┬──────────┬──────────┐
//!     ▼          ▼          ▼          ▼          ▼          ▼          ▼
//! Diagnosis  Symptoms  Demographics  Tags    Findings  Treatments   Labs
//!     └──────────┴──────────┴───┬──────┴──────────┴──────────┴──────────┘
//!                               │
//!                    Weighted aggregation (0..1)
//!                               │
//!                  Match explainer (feature chips)
//!                               │
//!            Ranker: min similarity → sort desc → max results
//! ```
//!
//! # Core Principle
//!
//! **Scoring is read-only and stateless.** The same corpus, target and
//! configuration always produce the same ordered results; view/save counters
//! only change on explicit case-open actions.
//!
//! # Modules
//!
//! - [`db`]: SQLite case and tag storage
//! - [`models`]: Domain types (ClinicalCase, SimilarityConfig, SimilarCaseResult, etc.)
//! - [`repository`]: Repository contract and in-memory backing
//! - [`similarity`]: Dimension scorers, explainer, ranker and engine

pub mod db;
pub mod models;
pub mod repository;
pub mod similarity;

// Re-export commonly used types
pub use db::Database;
pub use models::{
    CaseTag, ClinicalCase, DimensionScores, FeatureCategory, MatchedFeature, SimilarCaseResult,
    SimilarityConfig, SimilarityConfigOverride, SimilarityWeights, WeightsOverride,
};
pub use repository::{CaseReader, CaseRepository, InMemoryCaseRepository};
pub use similarity::{ClinicalLexicon, SimilarityEngine};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum CaseSimilarityError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<db::DbError> for CaseSimilarityError {
    fn from(e: db::DbError) -> Self {
        match e {
            db::DbError::Json(j) => j.into(),
            other => CaseSimilarityError::DatabaseError(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for CaseSimilarityError {
    fn from(e: serde_json::Error) -> Self {
        CaseSimilarityError::SerializationError(e.to_string())
    }
}

impl From<similarity::SimilarityError> for CaseSimilarityError {
    fn from(e: similarity::SimilarityError) -> Self {
        use similarity::SimilarityError;
        match e {
            SimilarityError::Database(db) => db.into(),
            SimilarityError::InvalidConfig(c) => CaseSimilarityError::InvalidInput(c.to_string()),
            SimilarityError::Json(j) => j.into(),
            SimilarityError::Io(io) => CaseSimilarityError::InvalidInput(io.to_string()),
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for CaseSimilarityError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        CaseSimilarityError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a case library at the given path.
#[uniffi::export]
pub fn open_case_library(path: String) -> Result<Arc<CaseLibraryCore>, CaseSimilarityError> {
    let db = Database::open(&path)?;
    Ok(Arc::new(CaseLibraryCore::with_database(db)))
}

/// Create an in-memory case library (for testing).
#[uniffi::export]
pub fn open_case_library_in_memory() -> Result<Arc<CaseLibraryCore>, CaseSimilarityError> {
    let db = Database::open_in_memory()?;
    Ok(Arc::new(CaseLibraryCore::with_database(db)))
}

/// Install a stderr log subscriber. `filter` uses `RUST_LOG` syntax and
/// defaults to `info`. Calling it again is a no-op.
#[uniffi::export]
pub fn init_logging(filter: Option<String>) {
    let filter = tracing_subscriber::EnvFilter::try_new(filter.as_deref().unwrap_or("info"))
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe case library wrapper for FFI.
#[derive(uniffi::Object)]
pub struct CaseLibraryCore {
    db: Arc<Mutex<Database>>,
    lexicon: Mutex<ClinicalLexicon>,
}

impl CaseLibraryCore {
    fn with_database(db: Database) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            lexicon: Mutex::new(ClinicalLexicon::default()),
        }
    }
}

#[uniffi::export]
impl CaseLibraryCore {
    // =========================================================================
    // Case Operations
    // =========================================================================

    /// Add or update a case from its JSON form. Returns the case ID.
    pub fn upsert_case_json(&self, case_json: String) -> Result<String, CaseSimilarityError> {
        let case: ClinicalCase = serde_json::from_str(&case_json)?;
        if case.id.trim().is_empty() {
            return Err(CaseSimilarityError::InvalidInput("case id cannot be empty".into()));
        }
        let db = self.db.lock()?;
        db.upsert_case(&case)?;
        Ok(case.id)
    }

    /// Get a case as JSON.
    pub fn get_case_json(&self, case_id: String) -> Result<Option<String>, CaseSimilarityError> {
        let db = self.db.lock()?;
        let case = db.get_case(&case_id)?;
        Ok(case.map(|c| serde_json::to_string(&c)).transpose()?)
    }

    /// Record that a case was opened.
    pub fn record_view(&self, case_id: String) -> Result<bool, CaseSimilarityError> {
        let db = self.db.lock()?;
        Ok(db.record_view(&case_id)?)
    }

    /// Record that a case was bookmarked.
    pub fn record_save(&self, case_id: String) -> Result<bool, CaseSimilarityError> {
        let db = self.db.lock()?;
        Ok(db.record_save(&case_id)?)
    }

    // =========================================================================
    // Tag Operations
    // =========================================================================

    /// Add or update a tag catalog entry.
    pub fn upsert_tag(&self, tag: FfiCaseTag) -> Result<(), CaseSimilarityError> {
        let db = self.db.lock()?;
        db.upsert_tag(&tag.into())?;
        Ok(())
    }

    /// List the tag catalog.
    pub fn list_tags(&self) -> Result<Vec<FfiCaseTag>, CaseSimilarityError> {
        let db = self.db.lock()?;
        Ok(db.list_tags()?.into_iter().map(|t| t.into()).collect())
    }

    // =========================================================================
    // Similarity Operations
    // =========================================================================

    /// Replace the keyword lexicon with a JSON lexicon document.
    pub fn load_lexicon_json(&self, lexicon_json: String) -> Result<(), CaseSimilarityError> {
        let lexicon = ClinicalLexicon::from_json(&lexicon_json)?;
        *self.lexicon.lock()? = lexicon;
        Ok(())
    }

    /// Rank cases similar to `target_case_id`.
    pub fn similar_cases(
        &self,
        target_case_id: String,
        config: Option<FfiSimilarityConfig>,
    ) -> Result<Vec<FfiSimilarCase>, CaseSimilarityError> {
        let db = self.db.lock()?;
        let lexicon = self.lexicon.lock()?;
        let engine = SimilarityEngine::new(&*db, &*lexicon);

        let overrides = config.map(SimilarityConfigOverride::from);
        let results = engine.similar_cases(&target_case_id, overrides.as_ref())?;
        Ok(results.into_iter().map(|r| r.into()).collect())
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe tag.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiCaseTag {
    pub id: String,
    pub name: String,
    pub category: Option<String>,
}

impl From<CaseTag> for FfiCaseTag {
    fn from(tag: CaseTag) -> Self {
        Self {
            id: tag.id,
            name: tag.name,
            category: tag.category,
        }
    }
}

impl From<FfiCaseTag> for CaseTag {
    fn from(tag: FfiCaseTag) -> Self {
        CaseTag {
            id: tag.id,
            name: tag.name,
            category: tag.category,
        }
    }
}

/// FFI-safe partial similarity configuration; unset fields use defaults.
#[derive(Debug, Clone, Default, uniffi::Record)]
pub struct FfiSimilarityConfig {
    pub diagnosis_weight: Option<f64>,
    pub symptoms_weight: Option<f64>,
    pub demographics_weight: Option<f64>,
    pub tags_weight: Option<f64>,
    pub findings_weight: Option<f64>,
    pub treatments_weight: Option<f64>,
    pub lab_results_weight: Option<f64>,
    pub max_results: Option<u32>,
    pub min_similarity: Option<f64>,
}

impl From<FfiSimilarityConfig> for SimilarityConfigOverride {
    fn from(config: FfiSimilarityConfig) -> Self {
        SimilarityConfigOverride {
            weights: WeightsOverride {
                diagnosis: config.diagnosis_weight,
                symptoms: config.symptoms_weight,
                demographics: config.demographics_weight,
                tags: config.tags_weight,
                findings: config.findings_weight,
                treatments: config.treatments_weight,
                lab_results: config.lab_results_weight,
            },
            max_results: config.max_results.map(|n| n as usize),
            min_similarity: config.min_similarity,
        }
    }
}

/// FFI-safe matched-feature group.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiMatchedFeature {
    pub category: String,
    pub items: Vec<String>,
}

impl From<MatchedFeature> for FfiMatchedFeature {
    fn from(feature: MatchedFeature) -> Self {
        Self {
            category: feature.category.label().to_string(),
            items: feature.items,
        }
    }
}

/// FFI-safe similar-case result.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSimilarCase {
    pub case_id: String,
    pub title: String,
    pub primary_diagnosis: String,
    pub similarity: f64,
    pub percentage: u32,
    pub matched_features: Vec<FfiMatchedFeature>,
}

impl From<SimilarCaseResult> for FfiSimilarCase {
    fn from(result: SimilarCaseResult) -> Self {
        let percentage = result.percentage();
        Self {
            case_id: result.case.id,
            title: result.case.title,
            primary_diagnosis: result.case.diagnosis.primary,
            similarity: result.similarity,
            percentage,
            matched_features: result.matched_features.into_iter().map(|f| f.into()).collect(),
        }
    }
}
