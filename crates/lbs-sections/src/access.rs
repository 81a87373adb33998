//! Section access control
//!
//! Decides whether a section may be opened for a given group configuration.
//!
//! # Rules
//! - `NONE` sections are always available
//! - `AISD` sections need an AISD group with active CCPP (per policy)
//! - `AISI` sections likewise for AISI
//! - `BOTH` sections need at least one group of either type
//!
//! Decisions are pure functions of a [`GroupConfig`] snapshot. [`AccessControl::watch`]
//! layers a push view on top that re-evaluates after every store commit.

use crate::catalog::SectionCatalog;
use lbs_groups::{ActiveCcppPolicy, GroupConfigStore, GroupValidation, SubscriptionId};
use lbs_model::{GroupConfig, GroupRequirement, GroupType, SectionId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;

/// Access decision for one section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionAccessState {
    /// Section the decision is about
    pub section_id: SectionId,
    /// Whether the section may be opened
    pub is_available: bool,
    /// Why not; empty when available
    pub reason: String,
    /// Group types the section depends on
    pub required_groups: Vec<GroupType>,
}

/// Access evaluator bound to a catalog and an active-CCPP policy
#[derive(Debug, Clone)]
pub struct AccessControl {
    catalog: Arc<SectionCatalog>,
    policy: ActiveCcppPolicy,
}

impl AccessControl {
    /// Create evaluator
    #[inline]
    #[must_use]
    pub fn new(catalog: Arc<SectionCatalog>, policy: ActiveCcppPolicy) -> Self {
        Self { catalog, policy }
    }

    /// Active-CCPP policy in use
    #[inline]
    #[must_use]
    pub fn policy(&self) -> ActiveCcppPolicy {
        self.policy
    }

    /// Catalog the rules come from
    #[inline]
    #[must_use]
    pub fn catalog(&self) -> &Arc<SectionCatalog> {
        &self.catalog
    }

    /// Requirement of a section
    #[inline]
    #[must_use]
    pub fn requirement(&self, section: &SectionId) -> GroupRequirement {
        self.catalog.requirement(section)
    }

    /// Point check
    #[must_use]
    pub fn can_access(&self, config: &GroupConfig, section: &SectionId) -> bool {
        let validation = GroupValidation::evaluate(config, self.policy);
        Self::decide(&validation, self.requirement(section)).is_none()
    }

    /// Full decision with reason
    #[must_use]
    pub fn access_state(&self, config: &GroupConfig, section: &SectionId) -> SectionAccessState {
        let validation = GroupValidation::evaluate(config, self.policy);
        self.state_with(&validation, section)
    }

    /// Decision against an already evaluated snapshot
    #[must_use]
    pub fn state_with(&self, validation: &GroupValidation, section: &SectionId) -> SectionAccessState {
        let requirement = self.requirement(section);
        let reason = Self::decide(validation, requirement);
        SectionAccessState {
            section_id: section.clone(),
            is_available: reason.is_none(),
            reason: reason.unwrap_or_default(),
            required_groups: requirement.group_types(),
        }
    }

    /// Push view of one section's access state
    ///
    /// The receiver holds the current state immediately and is updated after
    /// every committed store mutation. Cancel with [`AccessWatch::cancel`];
    /// a watch whose receivers were all dropped is detached on the next commit.
    #[must_use]
    pub fn watch(&self, store: &GroupConfigStore, section: SectionId) -> AccessWatch {
        let initial = self.access_state(&store.snapshot(), &section);
        let (tx, rx) = watch::channel(initial);
        let control = self.clone();
        let subscription = store.subscribe_while(move |config| {
            if tx.is_closed() {
                tracing::debug!(section = %section, "access watch dropped");
                return false;
            }
            let next = control.access_state(config, &section);
            tx.send_if_modified(|current| {
                if *current == next {
                    false
                } else {
                    tracing::debug!(
                        section = %next.section_id,
                        available = next.is_available,
                        "section access changed"
                    );
                    *current = next;
                    true
                }
            });
            true
        });
        AccessWatch {
            receiver: rx,
            subscription,
        }
    }

    /// `None` when allowed, otherwise the reason
    fn decide(validation: &GroupValidation, requirement: GroupRequirement) -> Option<String> {
        match requirement {
            GroupRequirement::None => None,
            GroupRequirement::Aisd => Self::decide_type(validation, GroupType::Aisd),
            GroupRequirement::Aisi => Self::decide_type(validation, GroupType::Aisi),
            GroupRequirement::Both => (!validation.is_valid)
                .then(|| "requires at least one AISD or AISI group".to_string()),
        }
    }

    fn decide_type(validation: &GroupValidation, group_type: GroupType) -> Option<String> {
        if !validation.has(group_type) {
            Some(format!("requires an {group_type} group"))
        } else if !validation.can_access(group_type) {
            Some(format!("no active CCPP selected for {group_type}"))
        } else {
            None
        }
    }
}

/// Handle returned by [`AccessControl::watch`]
#[derive(Debug)]
pub struct AccessWatch {
    /// Latest access state
    pub receiver: watch::Receiver<SectionAccessState>,
    /// Store subscription feeding the channel
    pub subscription: SubscriptionId,
}

impl AccessWatch {
    /// Current state without waiting
    #[must_use]
    pub fn current(&self) -> SectionAccessState {
        self.receiver.borrow().clone()
    }

    /// Detach from the store; the receiver keeps its last value
    pub fn cancel(self, store: &GroupConfigStore) -> watch::Receiver<SectionAccessState> {
        store.unsubscribe(self.subscription);
        self.receiver
    }
}
