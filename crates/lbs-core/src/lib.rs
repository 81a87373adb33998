//! LBS Core - Report engine
//!
//! Group-scoped section access and global numbering for socioeconomic
//! baseline reports.
//!
//! # Architecture
//!
//! ```text
//! GroupConfigStore → GroupValidation → AccessControl → SectionNavigator
//!                                                    ↘
//!                        FieldStore → PhotoRegistry → GlobalNumbering → RenumberScheduler
//! ```
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use lbs_core::{EngineConfig, ReportEngine};
//! use lbs_groups::MemoryStorage;
//! use lbs_model::{FieldSnapshot, Group, GroupType, MemoryFieldStore};
//!
//! let engine = ReportEngine::new(
//!     EngineConfig::default(),
//!     Arc::new(MemoryStorage::new()),
//!     Arc::new(MemoryFieldStore::new(FieldSnapshot::new())),
//! )
//! .unwrap();
//!
//! assert!(!engine.is_section_available("3.1.4.A.1.1"));
//! engine.store().append(GroupType::Aisd, Group::new("Ayroca", GroupType::Aisd, ["0101"]));
//! assert!(engine.is_section_available("3.1.4.A.1.1"));
//! assert_eq!(engine.group_field_prefix("3.1.4.A.1.1"), "_A1");
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod config;
pub mod engine;
pub mod error;
pub mod telemetry;

// Re-exports
pub use config::{ConfigError, EngineConfig};
pub use engine::{ReportEngine, ReportEngineBuilder};
pub use error::{EngineError, EngineResult};
pub use telemetry::{init_json_tracing, init_tracing};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for hosts embedding the engine
    pub use crate::{EngineConfig, EngineError, EngineResult, ReportEngine};
    pub use lbs_groups::{ActiveCcppPolicy, GroupConfigStore, KeyValueStorage, MemoryStorage};
    pub use lbs_model::prelude::*;
    pub use lbs_sections::{AisiLayout, NavigationState, SectionAccessState};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
