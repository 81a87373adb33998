//! Group field prefixes
//!
//! Per-instance form data is kept apart by suffixing field names with the
//! instance they belong to: `tablaPoblacion` in section `3.1.4.A.2.3` is stored
//! as `tablaPoblacion_A2`. Every reader must go through these helpers or data
//! bleeds across instances.

use lbs_model::{FieldSnapshot, SectionId};
use serde_json::Value;

/// Suffix for fields of a section (`_A2`, `_B1`, or empty)
#[must_use]
pub fn group_field_prefix(section: &SectionId) -> String {
    section
        .group_instance()
        .map(|instance| instance.suffix())
        .unwrap_or_default()
}

/// Field name scoped to the section's group instance
#[must_use]
pub fn scoped_field(base: &str, section: &SectionId) -> String {
    format!("{base}{}", group_field_prefix(section))
}

/// Value of `base` for the section's instance
///
/// Returns the scoped value when filled, else the un-scoped value when
/// filled, else `None`.
#[must_use]
pub fn resolve<'a>(data: &'a FieldSnapshot, base: &str, section: &SectionId) -> Option<&'a Value> {
    let suffix = group_field_prefix(section);
    if !suffix.is_empty() {
        if let Some(value) = data.get_filled(&format!("{base}{suffix}")) {
            return Some(value);
        }
    }
    data.get_filled(base)
}

/// [`resolve`] rendered as text; empty when nothing is filled
#[must_use]
pub fn resolve_text(data: &FieldSnapshot, base: &str, section: &SectionId) -> String {
    match resolve(data, base, section) {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}
