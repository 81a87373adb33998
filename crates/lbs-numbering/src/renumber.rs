//! Photo renumbering
//!
//! Printed photo numbers live in `…Numero…` fields next to each image slot.
//! After a photo in the middle of a sequence is removed, those numbers have
//! gaps; a renumber pass recomputes every number densely and writes back only
//! the fields whose value actually changed.

use crate::engine::GlobalNumbering;
use crate::photos::PhotoRegistry;
use lbs_model::{FieldSnapshot, FieldStore, GroupCounts};
use lbs_sections::group_field_prefix;
use serde::Serialize;
use serde_json::Value;

/// One number field that needs a new value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NumberChange {
    /// Number field (`fotografiaPEA2Numero_A1`)
    pub field: String,
    /// Value before the pass, if any
    pub previous: Option<Value>,
    /// Rendered number to write
    pub value: String,
}

/// Result of [`GlobalNumbering::renumber_all`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenumberPlan {
    changes: Vec<NumberChange>,
    assigned: u32,
}

impl RenumberPlan {
    /// Fields to write, in document order
    #[inline]
    #[must_use]
    pub fn changes(&self) -> &[NumberChange] {
        &self.changes
    }

    /// Photos numbered in the pass
    #[inline]
    #[must_use]
    pub fn assigned(&self) -> u32 {
        self.assigned
    }

    /// Get number of changed fields
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Check if nothing changes
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Write every change through the field store; returns fields written
    pub fn apply(&self, store: &dyn FieldStore) -> usize {
        for change in &self.changes {
            store.write(&change.field, Value::String(change.value.clone()));
        }
        self.changes.len()
    }
}

impl GlobalNumbering {
    /// Recompute every photo number in document order
    #[must_use]
    pub fn renumber_all(&self, counts: GroupCounts, data: &FieldSnapshot) -> RenumberPlan {
        let registry = PhotoRegistry::build(data);
        let mut plan = RenumberPlan::default();
        for section in self.catalog().expand_all(counts) {
            let suffix = group_field_prefix(&section);
            for photos in self.section_photos(&registry, &section) {
                for slot in photos.slots {
                    plan.assigned += 1;
                    let field = slot.number_field(&photos.prefix, &suffix);
                    let value = self.label(plan.assigned);
                    let previous = data.get(&field).cloned();
                    if previous.as_ref().and_then(Value::as_str) != Some(value.as_str()) {
                        plan.changes.push(NumberChange {
                            field,
                            previous,
                            value,
                        });
                    }
                }
            }
        }
        tracing::info!(
            assigned = plan.assigned,
            changed = plan.changes.len(),
            "photo renumber pass computed"
        );
        plan
    }
}
