//! LBS Groups
//!
//! Owns the AISD/AISI group configuration of a document and derives the
//! validity facts access control is built on.
//!
//! # Architecture
//!
//! ```text
//! KeyValueStorage ⇄ GroupConfigStore ──snapshot──→ GroupValidation
//!                         │
//!                         └─ subscribers (notified after each commit)
//! ```
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use lbs_groups::{ActiveCcppPolicy, GroupConfigStore, GroupValidation, MemoryStorage};
//! use lbs_model::{Group, GroupType};
//!
//! let store = GroupConfigStore::load_default(Arc::new(MemoryStorage::new()));
//! store.append(GroupType::Aisd, Group::new("Ayroca", GroupType::Aisd, ["0101"]));
//!
//! let validation = GroupValidation::evaluate(&store.snapshot(), ActiveCcppPolicy::AnyGroup);
//! assert!(validation.can_access_aisd());
//! assert!(!validation.can_access_aisi());
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod error;
pub mod integrity;
pub mod storage;
pub mod store;
pub mod validation;

// Re-exports
pub use error::{CodecError, StorageError, StoreError, StoreResult};
pub use integrity::{field_instance, DocumentValidator, ReferenceIssue, ReferenceValidator};
pub use storage::{decode_config, encode_config, KeyValueStorage, MemoryStorage, DEFAULT_STORAGE_KEY};
pub use store::{GroupConfigStore, SubscriptionId};
pub use validation::{ActiveCcppPolicy, GroupValidation, ValidationIssue};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
