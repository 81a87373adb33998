//! Group configuration aggregate

use crate::group::{Group, GroupType};
use crate::section_id::GroupInstance;
use serde::{Deserialize, Serialize};

/// All AISD and AISI groups of a document
///
/// The group at index `i` of a type is instance `i + 1` of that type, i.e.
/// field suffix `_A{i+1}` / `_B{i+1}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupConfig {
    /// Community groups in document order
    #[serde(default)]
    pub aisd: Vec<Group>,
    /// District groups in document order
    #[serde(default)]
    pub aisi: Vec<Group>,
    /// Milliseconds since the Unix epoch of the last mutation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<i64>,
}

impl GroupConfig {
    /// Create empty configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With groups of one type appended
    #[must_use]
    pub fn with_groups(mut self, group_type: GroupType, groups: impl IntoIterator<Item = Group>) -> Self {
        self.groups_mut(group_type).extend(groups);
        self
    }

    /// Groups of one type
    #[inline]
    #[must_use]
    pub fn groups(&self, group_type: GroupType) -> &[Group] {
        match group_type {
            GroupType::Aisd => &self.aisd,
            GroupType::Aisi => &self.aisi,
        }
    }

    /// Mutable groups of one type
    #[inline]
    pub fn groups_mut(&mut self, group_type: GroupType) -> &mut Vec<Group> {
        match group_type {
            GroupType::Aisd => &mut self.aisd,
            GroupType::Aisi => &mut self.aisi,
        }
    }

    /// Group behind an instance handle
    #[inline]
    #[must_use]
    pub fn instance(&self, instance: GroupInstance) -> Option<&Group> {
        self.groups(instance.group_type).get(instance.index())
    }

    /// Number of configured groups per type
    #[inline]
    #[must_use]
    pub fn counts(&self) -> GroupCounts {
        GroupCounts {
            aisd: self.aisd.len(),
            aisi: self.aisi.len(),
        }
    }

    /// Check if neither type has a group
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.aisd.is_empty() && self.aisi.is_empty()
    }
}

/// Group counts driving section expansion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct GroupCounts {
    /// Number of AISD groups
    pub aisd: usize,
    /// Number of AISI groups
    pub aisi: usize,
}

impl GroupCounts {
    /// Create counts
    #[inline]
    #[must_use]
    pub fn new(aisd: usize, aisi: usize) -> Self {
        Self { aisd, aisi }
    }

    /// Count for one type
    #[inline]
    #[must_use]
    pub fn of(&self, group_type: GroupType) -> usize {
        match group_type {
            GroupType::Aisd => self.aisd,
            GroupType::Aisi => self.aisi,
        }
    }

    /// Instances generated for one type (a placeholder instance when zero)
    #[inline]
    #[must_use]
    pub fn instances(&self, group_type: GroupType) -> usize {
        self.of(group_type).max(1)
    }
}
