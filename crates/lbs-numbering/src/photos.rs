//! Photo slot registry
//!
//! Photo fields follow a naming convention:
//!
//! - numbered slots `{prefix}{1..=10}Imagen{suffix}`
//! - one legacy base slot `{prefix}Imagen{suffix}`
//!
//! [`PhotoRegistry`] scans a [`FieldSnapshot`] once and answers every count
//! query from the parsed result.

use lbs_model::FieldSnapshot;
use lbs_sections::PhotoSpec;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Highest numbered slot per prefix
pub const MAX_PHOTO_SLOTS: u8 = 10;

static PHOTO_KEY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z][A-Za-z0-9]*?)(10|[1-9])?Imagen(_[AB][1-9][0-9]*)?$")
        .expect("photo key pattern is valid")
});

/// One image slot of a prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum PhotoSlot {
    /// Un-numbered legacy slot
    Base,
    /// Numbered slot `1..=10`
    Numbered(u8),
}

impl PhotoSlot {
    /// Image field of this slot
    #[must_use]
    pub fn image_field(self, prefix: &str, suffix: &str) -> String {
        format!("{prefix}{self}Imagen{suffix}")
    }

    /// Number field of this slot
    #[must_use]
    pub fn number_field(self, prefix: &str, suffix: &str) -> String {
        format!("{prefix}{self}Numero{suffix}")
    }
}

impl fmt::Display for PhotoSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Base => Ok(()),
            Self::Numbered(n) => write!(f, "{n}"),
        }
    }
}

/// A parsed photo image key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PhotoKey {
    /// Field prefix (`fotografiaPEA`)
    pub prefix: String,
    /// Slot within the prefix
    pub slot: PhotoSlot,
    /// Group suffix (`_A1`) or empty
    pub suffix: String,
}

impl PhotoKey {
    /// Parse an image field name
    #[must_use]
    pub fn parse(key: &str) -> Option<Self> {
        let caps = PHOTO_KEY.captures(key)?;
        let slot = match caps.get(2) {
            Some(m) => PhotoSlot::Numbered(m.as_str().parse().ok()?),
            None => PhotoSlot::Base,
        };
        Some(Self {
            prefix: caps[1].to_string(),
            slot,
            suffix: caps.get(3).map_or_else(String::new, |m| m.as_str().to_string()),
        })
    }
}

/// Counted photos of one prefix
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrefixPhotos {
    /// Field prefix
    pub prefix: String,
    /// Slots that count, in slot order
    pub slots: Vec<PhotoSlot>,
}

impl PrefixPhotos {
    /// Number of counted photos
    #[inline]
    #[must_use]
    pub fn count(&self) -> u32 {
        u32::try_from(self.slots.len()).unwrap_or(u32::MAX)
    }
}

/// Filled photo slots of a data snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhotoRegistry {
    filled: BTreeMap<(String, String), BTreeSet<PhotoSlot>>,
}

impl PhotoRegistry {
    /// Scan a snapshot for filled image slots
    #[must_use]
    pub fn build(data: &FieldSnapshot) -> Self {
        let mut filled: BTreeMap<(String, String), BTreeSet<PhotoSlot>> = BTreeMap::new();
        for (key, _) in data.iter().filter(|(k, _)| data.is_filled(k)) {
            if let Some(photo) = PhotoKey::parse(key) {
                filled
                    .entry((photo.prefix, photo.suffix))
                    .or_default()
                    .insert(photo.slot);
            }
        }
        tracing::debug!(prefixes = filled.len(), "photo registry built");
        Self { filled }
    }

    /// Slots of `(prefix, suffix)` that count as photos
    ///
    /// Numbered slots win whenever at least one is filled; the base slot is
    /// only a fallback and counts at most once.
    #[must_use]
    pub fn counted_slots(&self, prefix: &str, suffix: &str) -> Vec<PhotoSlot> {
        let Some(slots) = self.filled.get(&(prefix.to_string(), suffix.to_string())) else {
            return Vec::new();
        };
        let numbered: Vec<PhotoSlot> = slots
            .iter()
            .copied()
            .filter(|s| matches!(s, PhotoSlot::Numbered(_)))
            .collect();
        if !numbered.is_empty() {
            numbered
        } else if slots.contains(&PhotoSlot::Base) {
            vec![PhotoSlot::Base]
        } else {
            Vec::new()
        }
    }

    /// Number of counted photos of `(prefix, suffix)`
    #[inline]
    #[must_use]
    pub fn count(&self, prefix: &str, suffix: &str) -> u32 {
        u32::try_from(self.counted_slots(prefix, suffix).len()).unwrap_or(u32::MAX)
    }

    /// Prefix order for a section: declared candidates, then discovered
    /// prefixes claimed by `photo_spec`, sorted
    #[must_use]
    pub fn prefixes(&self, photo_spec: &PhotoSpec, suffix: &str) -> Vec<String> {
        let mut ordered: Vec<String> = photo_spec.candidates().to_vec();
        let discovered: BTreeSet<&str> = self
            .filled
            .keys()
            .filter(|(prefix, s)| s == suffix && !ordered.contains(prefix) && photo_spec.claims(prefix))
            .map(|(prefix, _)| prefix.as_str())
            .collect();
        ordered.extend(discovered.into_iter().map(str::to_string));
        ordered
    }

    /// Counted photos per prefix for a section
    #[must_use]
    pub fn section_photos(&self, photo_spec: &PhotoSpec, suffix: &str) -> Vec<PrefixPhotos> {
        self.prefixes(photo_spec, suffix)
            .into_iter()
            .map(|prefix| {
                let slots = self.counted_slots(&prefix, suffix);
                PrefixPhotos { prefix, slots }
            })
            .collect()
    }

    /// Total counted photos of a section
    #[must_use]
    pub fn section_total(&self, photo_spec: &PhotoSpec, suffix: &str) -> u32 {
        self.section_photos(photo_spec, suffix)
            .iter()
            .map(PrefixPhotos::count)
            .sum()
    }

    /// Check if no filled slot was found
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filled.is_empty()
    }
}
