//! Error types for the report engine

use crate::config::ConfigError;
use lbs_groups::StoreError;
use lbs_model::SectionIdError;
use lbs_numbering::SchedulerError;
use lbs_sections::CatalogError;

/// Main engine error type
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration rejected
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Group store operation failed
    #[error("group store error: {0}")]
    Store(#[from] StoreError),

    /// Custom catalog rejected
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Renumber scheduling failed
    #[error("scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    /// Section id did not parse
    #[error("invalid section id: {0}")]
    SectionId(#[from] SectionIdError),
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
