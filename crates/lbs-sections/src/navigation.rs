//! Section navigation
//!
//! Walks the expanded section list forward or backward, skipping sections
//! that are not accessible and per-instance intro pages.

use crate::access::AccessControl;
use crate::catalog::SectionCatalog;
use lbs_groups::{DocumentValidator, GroupValidation};
use lbs_model::{FieldSnapshot, GroupConfig, SectionId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Navigation flags for the wizard buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationState {
    /// A previous section exists
    pub can_go_previous: bool,
    /// A next section exists
    pub can_go_next: bool,
    /// No next section and the current one is last in the list
    pub is_last_section: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Forward,
    Backward,
}

/// Navigator over the expanded section list
#[derive(Clone)]
pub struct SectionNavigator {
    access: AccessControl,
    validator: Arc<dyn DocumentValidator>,
}

impl std::fmt::Debug for SectionNavigator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SectionNavigator")
            .field("access", &self.access)
            .finish_non_exhaustive()
    }
}

impl SectionNavigator {
    /// Create navigator
    #[must_use]
    pub fn new(access: AccessControl, validator: Arc<dyn DocumentValidator>) -> Self {
        Self { access, validator }
    }

    /// Catalog sections come from
    #[inline]
    #[must_use]
    pub fn catalog(&self) -> &SectionCatalog {
        self.access.catalog()
    }

    /// Access evaluator in use
    #[inline]
    #[must_use]
    pub fn access(&self) -> &AccessControl {
        &self.access
    }

    /// Every section for the configuration's group counts, in document order
    #[must_use]
    pub fn expand_all(&self, config: &GroupConfig) -> Vec<SectionId> {
        self.catalog().expand_all(config.counts())
    }

    /// Sections the configuration can open, in document order
    #[must_use]
    pub fn all_available_sections(&self, config: &GroupConfig) -> Vec<SectionId> {
        let validation = GroupValidation::evaluate(config, self.access.policy());
        self.expand_all(config)
            .into_iter()
            .filter(|id| self.access.state_with(&validation, id).is_available)
            .collect()
    }

    /// Next accessible non-intro section after `current`
    #[must_use]
    pub fn next(&self, current: &SectionId, config: &GroupConfig, data: &FieldSnapshot) -> Option<SectionId> {
        self.step(current, config, data, Direction::Forward)
    }

    /// Previous accessible non-intro section before `current`
    #[must_use]
    pub fn previous(
        &self,
        current: &SectionId,
        config: &GroupConfig,
        data: &FieldSnapshot,
    ) -> Option<SectionId> {
        self.step(current, config, data, Direction::Backward)
    }

    /// Flags for the wizard buttons
    #[must_use]
    pub fn navigation_state(
        &self,
        current: &SectionId,
        config: &GroupConfig,
        data: &FieldSnapshot,
    ) -> NavigationState {
        let can_go_next = self.next(current, config, data).is_some();
        let can_go_previous = self.previous(current, config, data).is_some();
        let positionally_last = self.expand_all(config).last() == Some(current);
        NavigationState {
            can_go_previous,
            can_go_next,
            is_last_section: !can_go_next && positionally_last,
        }
    }

    fn step(
        &self,
        current: &SectionId,
        config: &GroupConfig,
        data: &FieldSnapshot,
        direction: Direction,
    ) -> Option<SectionId> {
        let all = self.expand_all(config);
        let Some(pos) = all.iter().position(|id| id == current) else {
            tracing::debug!(section = %current, "navigation from unknown section");
            return None;
        };
        if !self.validator.is_document_valid(config, data) {
            tracing::debug!(section = %current, "navigation blocked by document validation");
            return None;
        }
        let validation = GroupValidation::evaluate(config, self.access.policy());
        let usable = |id: &&SectionId| {
            !id.is_intro() && self.access.state_with(&validation, id).is_available
        };
        let found = match direction {
            Direction::Forward => all[pos + 1..].iter().find(usable),
            Direction::Backward => all[..pos].iter().rev().find(usable),
        };
        found.cloned()
    }
}
