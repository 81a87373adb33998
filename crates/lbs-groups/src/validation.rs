//! Group validation
//!
//! Derives the boolean facts every access decision is built on from one
//! [`GroupConfig`] snapshot. Nothing here mutates or caches.

use lbs_model::{GroupConfig, GroupType};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which groups count when asking "does this type have active CCPP?"
///
/// Documents with several AISD groups where the first one is empty are the
/// case where the two policies disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActiveCcppPolicy {
    /// Any group of the type with a non-empty active set unlocks it
    #[default]
    AnyGroup,
    /// Only the first group of the type is inspected
    FirstGroup,
}

/// Validation facts of a configuration snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupValidation {
    /// At least one AISD group exists
    pub has_aisd: bool,
    /// At least one AISI group exists
    pub has_aisi: bool,
    /// At least one group of either type exists
    pub is_valid: bool,
    aisd_active: bool,
    aisi_active: bool,
}

impl GroupValidation {
    /// Evaluate a snapshot under a policy
    #[must_use]
    pub fn evaluate(config: &GroupConfig, policy: ActiveCcppPolicy) -> Self {
        let has_aisd = !config.aisd.is_empty();
        let has_aisi = !config.aisi.is_empty();
        let validation = Self {
            has_aisd,
            has_aisi,
            is_valid: has_aisd || has_aisi,
            aisd_active: has_active(config, GroupType::Aisd, policy),
            aisi_active: has_active(config, GroupType::Aisi, policy),
        };
        tracing::trace!(?validation, ?policy, "group validation evaluated");
        validation
    }

    /// Group of the type exists
    #[inline]
    #[must_use]
    pub fn has(&self, group_type: GroupType) -> bool {
        match group_type {
            GroupType::Aisd => self.has_aisd,
            GroupType::Aisi => self.has_aisi,
        }
    }

    /// AISD sections may be opened
    #[inline]
    #[must_use]
    pub fn can_access_aisd(&self) -> bool {
        self.has_aisd && self.aisd_active
    }

    /// AISI sections may be opened
    #[inline]
    #[must_use]
    pub fn can_access_aisi(&self) -> bool {
        self.has_aisi && self.aisi_active
    }

    /// Per-type variant of the two checks above
    #[inline]
    #[must_use]
    pub fn can_access(&self, group_type: GroupType) -> bool {
        match group_type {
            GroupType::Aisd => self.can_access_aisd(),
            GroupType::Aisi => self.can_access_aisi(),
        }
    }

    /// Human-readable problems, empty when every configured type is usable
    #[must_use]
    pub fn validation_errors(&self) -> Vec<ValidationIssue> {
        if !self.is_valid {
            return vec![ValidationIssue::NoGroupConfigured];
        }
        GroupType::ALL
            .into_iter()
            .filter(|t| self.has(*t) && !self.can_access(*t))
            .map(ValidationIssue::NoActiveCcpp)
            .collect()
    }
}

/// One problem reported by [`GroupValidation::validation_errors`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationIssue {
    /// Neither AISD nor AISI groups exist
    NoGroupConfigured,
    /// Groups of the type exist but none has active CCPP
    NoActiveCcpp(GroupType),
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoGroupConfigured => f.write_str("no group configured (add an AISD or AISI group)"),
            Self::NoActiveCcpp(t) => write!(f, "{t} configured but no active CCPP selected"),
        }
    }
}

fn has_active(config: &GroupConfig, group_type: GroupType, policy: ActiveCcppPolicy) -> bool {
    let groups = config.groups(group_type);
    match policy {
        ActiveCcppPolicy::AnyGroup => groups.iter().any(lbs_model::Group::has_active),
        ActiveCcppPolicy::FirstGroup => groups.first().is_some_and(lbs_model::Group::has_active),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lbs_model::Group;

    fn config(aisd: Vec<Group>, aisi: Vec<Group>) -> GroupConfig {
        GroupConfig::new()
            .with_groups(GroupType::Aisd, aisd)
            .with_groups(GroupType::Aisi, aisi)
    }

    fn active(t: GroupType) -> Group {
        Group::new("", t, ["1"])
    }

    fn inactive(t: GroupType) -> Group {
        Group::new("", t, ["1"]).with_active(std::iter::empty::<&str>())
    }

    #[test]
    fn empty_config_is_invalid() {
        let v = GroupValidation::evaluate(&GroupConfig::new(), ActiveCcppPolicy::AnyGroup);
        assert!(!v.is_valid);
        assert!(!v.can_access_aisd());
        assert_eq!(v.validation_errors(), vec![ValidationIssue::NoGroupConfigured]);
    }

    #[test]
    fn one_type_is_enough_for_validity() {
        let v = GroupValidation::evaluate(
            &config(vec![], vec![active(GroupType::Aisi)]),
            ActiveCcppPolicy::AnyGroup,
        );
        assert!(v.is_valid);
        assert!(!v.has_aisd);
        assert!(v.can_access_aisi());
        assert!(v.validation_errors().is_empty());
    }

    #[test]
    fn present_but_empty_is_reported_per_type() {
        let v = GroupValidation::evaluate(
            &config(vec![inactive(GroupType::Aisd)], vec![inactive(GroupType::Aisi)]),
            ActiveCcppPolicy::AnyGroup,
        );
        assert!(v.is_valid);
        assert!(!v.can_access_aisd());
        assert_eq!(
            v.validation_errors(),
            vec![
                ValidationIssue::NoActiveCcpp(GroupType::Aisd),
                ValidationIssue::NoActiveCcpp(GroupType::Aisi)
            ]
        );
        assert_eq!(
            v.validation_errors()[0].to_string(),
            "AISD configured but no active CCPP selected"
        );
    }

    #[test]
    fn policies_disagree_when_first_group_is_empty() {
        let cfg = config(vec![inactive(GroupType::Aisd), active(GroupType::Aisd)], vec![]);
        let any = GroupValidation::evaluate(&cfg, ActiveCcppPolicy::AnyGroup);
        let first = GroupValidation::evaluate(&cfg, ActiveCcppPolicy::FirstGroup);
        assert!(any.can_access_aisd());
        assert!(!first.can_access_aisd());
    }

    #[test]
    fn policy_serde_names() {
        let json = serde_json::to_string(&ActiveCcppPolicy::FirstGroup).unwrap();
        assert_eq!(json, "\"first_group\"");
    }
}
