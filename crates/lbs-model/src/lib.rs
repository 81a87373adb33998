//! LBS Model
//!
//! Shared vocabulary of the report engine.
//!
//! # Overview
//!
//! - **Group** / **GroupConfig**: AISD and AISI instances with their CCPP sets
//! - **PopulatedCenter**: imported census records
//! - **SectionId**: dotted section identifiers and their group instance
//! - **FieldSnapshot**: flat view of the external form data
//!
//! # Example
//!
//! ```rust
//! use lbs_model::{Group, GroupConfig, GroupType, SectionId};
//!
//! let config = GroupConfig::new()
//!     .with_groups(GroupType::Aisd, [Group::new("Ayroca", GroupType::Aisd, ["0101", "0102"])]);
//! assert_eq!(config.counts().aisd, 1);
//!
//! let section: SectionId = "3.1.4.A.2.5".parse().unwrap();
//! assert_eq!(section.group_instance().unwrap().suffix(), "_A2");
//! ```

#![warn(missing_docs)]

pub mod ccpp;
pub mod config;
pub mod fields;
pub mod group;
pub mod section_id;

// Re-exports
pub use ccpp::{CcppCode, PopulatedCenter, PopulatedCenterIndex};
pub use config::{GroupConfig, GroupCounts};
pub use fields::{
    is_filled_value, FieldListener, FieldSnapshot, FieldStore, FieldSubscription, MemoryFieldStore,
};
pub use group::{normalize_codes, Group, GroupRequirement, GroupType};
pub use section_id::{GroupInstance, SectionId, SectionIdError, GROUP_PLACEHOLDER};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the model
    pub use crate::{
        FieldSnapshot, FieldStore, Group, GroupConfig, GroupCounts, GroupInstance,
        GroupRequirement, GroupType, SectionId,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
