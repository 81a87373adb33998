//! Referential integrity of a document
//!
//! A document is inconsistent when a group activates populated centers that
//! are missing from the imported dataset, or (in strict mode) when form data
//! is stored for a group instance that no longer exists.

use lbs_model::{FieldSnapshot, GroupConfig, GroupInstance, GroupType, PopulatedCenterIndex};
use std::fmt;
use std::sync::Arc;

/// One dangling reference
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReferenceIssue {
    /// Active code absent from the populated-center dataset
    UnknownCcpp {
        /// Group list holding the group
        group_type: GroupType,
        /// Position of the group
        index: usize,
        /// Unknown code
        code: String,
    },
    /// Field scoped to an instance beyond the generated instances
    OrphanField {
        /// Field key
        key: String,
        /// Instance named by the key's suffix
        instance: GroupInstance,
    },
}

impl fmt::Display for ReferenceIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownCcpp {
                group_type,
                index,
                code,
            } => write!(f, "{group_type} group {} activates unknown CCPP '{code}'", index + 1),
            Self::OrphanField { key, instance } => {
                write!(f, "field '{key}' belongs to missing {instance}")
            }
        }
    }
}

/// Instance named by the trailing `_A{n}`/`_B{n}` of a field key
#[must_use]
pub fn field_instance(key: &str) -> Option<GroupInstance> {
    let pos = key.rfind('_')?;
    GroupInstance::from_suffix(&key[pos..])
}

/// Decides whether a document is consistent enough to navigate
pub trait DocumentValidator: Send + Sync {
    /// `true` when navigation may proceed
    fn is_document_valid(&self, config: &GroupConfig, data: &FieldSnapshot) -> bool;
}

/// Reference checker used as the default [`DocumentValidator`]
#[derive(Debug, Clone, Default)]
pub struct ReferenceValidator {
    strict: bool,
    centers: Option<Arc<PopulatedCenterIndex>>,
}

impl ReferenceValidator {
    /// Create validator; `strict` also reports orphaned group-scoped fields
    #[inline]
    #[must_use]
    pub fn new(strict: bool) -> Self {
        Self {
            strict,
            centers: None,
        }
    }

    /// With the imported dataset to resolve active codes against
    #[must_use]
    pub fn with_centers(mut self, centers: Arc<PopulatedCenterIndex>) -> Self {
        self.centers = Some(centers);
        self
    }

    /// Collect every dangling reference
    ///
    /// Without a dataset, CCPP codes are not checked. A type with zero
    /// groups still generates one placeholder instance, so `_A1`/`_B1`
    /// fields are never orphaned.
    #[must_use]
    pub fn check(&self, config: &GroupConfig, data: &FieldSnapshot) -> Vec<ReferenceIssue> {
        let mut issues = Vec::new();

        if let Some(centers) = &self.centers {
            for group_type in GroupType::ALL {
                for (index, group) in config.groups(group_type).iter().enumerate() {
                    issues.extend(
                        group
                            .active_ccpp()
                            .filter(|code| centers.get(code).is_none())
                            .map(|code| ReferenceIssue::UnknownCcpp {
                                group_type,
                                index,
                                code: code.to_string(),
                            }),
                    );
                }
            }
        }

        if self.strict {
            let counts = config.counts();
            for key in data.keys() {
                if let Some(instance) = field_instance(key) {
                    if instance.ordinal as usize > counts.instances(instance.group_type) {
                        issues.push(ReferenceIssue::OrphanField {
                            key: key.to_string(),
                            instance,
                        });
                    }
                }
            }
        }

        if !issues.is_empty() {
            tracing::debug!(count = issues.len(), "dangling references found");
        }
        issues
    }
}

impl DocumentValidator for ReferenceValidator {
    fn is_document_valid(&self, config: &GroupConfig, data: &FieldSnapshot) -> bool {
        self.check(config, data).is_empty()
    }
}
