//! LBS Sections
//!
//! Everything that depends on the document layout:
//!
//! - **prefix**: group field suffixes (`_A2`) and scoped field resolution
//! - **catalog**: the static section layout and per-section metadata
//! - **rules**: the requirement table classifying section ids
//! - **access**: availability decisions and push views
//! - **navigation**: next/previous over accessible sections
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use lbs_groups::{ActiveCcppPolicy, ReferenceValidator};
//! use lbs_model::{FieldSnapshot, Group, GroupConfig, GroupType, SectionId};
//! use lbs_sections::{AccessControl, AisiLayout, SectionCatalog, SectionNavigator};
//!
//! let catalog = Arc::new(SectionCatalog::standard(AisiLayout::Current));
//! let access = AccessControl::new(catalog, ActiveCcppPolicy::AnyGroup);
//! let navigator = SectionNavigator::new(access, Arc::new(ReferenceValidator::new(false)));
//!
//! let config = GroupConfig::new()
//!     .with_groups(GroupType::Aisd, [Group::new("Ayroca", GroupType::Aisd, ["0101"])]);
//! let from: SectionId = "3.1.4.A".parse().unwrap();
//! let next = navigator.next(&from, &config, &FieldSnapshot::new()).unwrap();
//! assert_eq!(next.to_string(), "3.1.4.A.1.1");
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod access;
pub mod catalog;
pub mod navigation;
pub mod prefix;
pub mod rules;

// Re-exports
pub use access::{AccessControl, AccessWatch, SectionAccessState};
pub use catalog::{
    AisiLayout, CatalogError, GroupBlock, PhotoSpec, SectionCatalog, SectionCatalogBuilder,
    SectionTemplate, AISD_SUBSECTIONS,
};
pub use navigation::{NavigationState, SectionNavigator};
pub use prefix::{group_field_prefix, resolve, resolve_text, scoped_field};
pub use rules::{RequirementRule, RequirementTable, RuleMatch};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
