//! LBS Numbering
//!
//! Consecutive table and photo numbers across a document whose size depends
//! on how many AISD/AISI groups exist.
//!
//! # Overview
//!
//! - [`GlobalNumbering`]: table and photo numbers for any section
//! - [`PhotoRegistry`]: filled image slots of a data snapshot
//! - [`RenumberPlan`]: dense renumbering of printed photo numbers
//! - [`RenumberScheduler`]: debounced, non-reentrant renumber runs
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use lbs_model::{GroupCounts, SectionId};
//! use lbs_numbering::GlobalNumbering;
//! use lbs_sections::{AisiLayout, SectionCatalog};
//!
//! let numbering = GlobalNumbering::new(Arc::new(SectionCatalog::standard(AisiLayout::Current)), "3.");
//! let section: SectionId = "3.1.3".parse().unwrap();
//! assert_eq!(numbering.global_table_number(GroupCounts::new(1, 1), &section, 0).as_deref(), Some("3.2"));
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod engine;
pub mod photos;
pub mod renumber;
pub mod scheduler;

// Re-exports
pub use engine::{GlobalNumbering, DEFAULT_NUMBERING_PREFIX};
pub use photos::{PhotoKey, PhotoRegistry, PhotoSlot, PrefixPhotos, MAX_PHOTO_SLOTS};
pub use renumber::{NumberChange, RenumberPlan};
pub use scheduler::{RenumberScheduler, SchedulerError, DEFAULT_RENUMBER_DEBOUNCE};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
