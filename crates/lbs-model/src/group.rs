//! AISD/AISI groups
//!
//! A [`Group`] is one community (AISD) or district (AISI) instance together
//! with the populated-center codes it may use and the subset it actually uses.

use crate::ccpp::{CcppCode, PopulatedCenter};
use indexmap::IndexSet;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Kind of group instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GroupType {
    /// Direct social influence area (community groups)
    #[serde(rename = "AISD")]
    Aisd,
    /// Indirect social influence area (district groups)
    #[serde(rename = "AISI")]
    Aisi,
}

impl GroupType {
    /// Both types in canonical document order
    pub const ALL: [GroupType; 2] = [GroupType::Aisd, GroupType::Aisi];

    /// Letter used in section ids and field suffixes
    #[inline]
    #[must_use]
    pub fn letter(self) -> char {
        match self {
            Self::Aisd => 'A',
            Self::Aisi => 'B',
        }
    }

    /// Inverse of [`GroupType::letter`] for a whole segment
    #[inline]
    #[must_use]
    pub fn from_letter(segment: &str) -> Option<Self> {
        match segment {
            "A" => Some(Self::Aisd),
            "B" => Some(Self::Aisi),
            _ => None,
        }
    }

    /// Short label
    #[inline]
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Aisd => "AISD",
            Self::Aisi => "AISI",
        }
    }
}

impl fmt::Display for GroupType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which group types a section needs before it can be opened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GroupRequirement {
    /// Always reachable
    #[default]
    None,
    /// Needs a usable AISD group
    Aisd,
    /// Needs a usable AISI group
    Aisi,
    /// Needs at least one group of either type
    Both,
}

impl GroupRequirement {
    /// Group types named by the requirement
    #[must_use]
    pub fn group_types(self) -> Vec<GroupType> {
        match self {
            Self::None => Vec::new(),
            Self::Aisd => vec![GroupType::Aisd],
            Self::Aisi => vec![GroupType::Aisi],
            Self::Both => vec![GroupType::Aisd, GroupType::Aisi],
        }
    }
}

/// One AISD or AISI instance
///
/// Codes are trimmed, blank codes are dropped and duplicates collapse to
/// their first occurrence. The active set is always a subset of the eligible
/// set: codes that are not eligible are dropped without error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    /// User-editable display name
    pub name: String,
    /// AISD or AISI
    #[serde(rename = "type")]
    pub group_type: GroupType,
    ccpp_codes: IndexSet<String>,
    active_ccpp: IndexSet<String>,
}

impl Group {
    /// Create group with every eligible code active
    #[must_use]
    pub fn new<I, S>(name: impl Into<String>, group_type: GroupType, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let eligible = normalize_codes(codes);
        Self {
            name: name.into(),
            group_type,
            active_ccpp: eligible.clone(),
            ccpp_codes: eligible,
        }
    }

    /// Create empty group (no codes)
    #[inline]
    #[must_use]
    pub fn empty(group_type: GroupType) -> Self {
        Self::new("", group_type, std::iter::empty::<&str>())
    }

    /// Build from imported populated centers
    #[must_use]
    pub fn from_centers(
        name: impl Into<String>,
        group_type: GroupType,
        centers: &[PopulatedCenter],
    ) -> Self {
        Self::new(name, group_type, centers.iter().map(|c| c.code.key()))
    }

    /// With explicit active codes
    #[must_use]
    pub fn with_active<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.set_active(codes);
        self
    }

    /// Eligible codes in insertion order
    #[inline]
    pub fn ccpp_codes(&self) -> impl Iterator<Item = &str> {
        self.ccpp_codes.iter().map(String::as_str)
    }

    /// Active codes in insertion order
    #[inline]
    pub fn active_ccpp(&self) -> impl Iterator<Item = &str> {
        self.active_ccpp.iter().map(String::as_str)
    }

    /// Number of active codes
    #[inline]
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active_ccpp.len()
    }

    /// Whether any code is active
    #[inline]
    #[must_use]
    pub fn has_active(&self) -> bool {
        !self.active_ccpp.is_empty()
    }

    /// Check a single code (trimmed before comparison)
    #[inline]
    #[must_use]
    pub fn is_active(&self, code: &str) -> bool {
        self.active_ccpp.contains(code.trim())
    }

    /// Check eligibility of a single code
    #[inline]
    #[must_use]
    pub fn is_eligible(&self, code: &str) -> bool {
        self.ccpp_codes.contains(code.trim())
    }

    /// Replace the active set, keeping only eligible codes
    ///
    /// Returns the number of codes that were dropped for not being eligible.
    pub fn set_active<I, S>(&mut self, codes: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let requested = normalize_codes(codes);
        let before = requested.len();
        self.active_ccpp = requested
            .into_iter()
            .filter(|code| self.ccpp_codes.contains(code))
            .collect();
        let dropped = before - self.active_ccpp.len();
        if dropped > 0 {
            tracing::debug!(
                group = %self.name,
                dropped,
                "ignoring active codes outside the eligible set"
            );
        }
        dropped
    }

    /// Replace the eligible set; active codes no longer eligible are dropped
    pub fn set_eligible<I, S>(&mut self, codes: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.ccpp_codes = normalize_codes(codes);
        let eligible = &self.ccpp_codes;
        self.active_ccpp.retain(|code| eligible.contains(code));
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawGroup {
    #[serde(default)]
    name: String,
    #[serde(rename = "type")]
    group_type: GroupType,
    #[serde(default)]
    ccpp_codes: Vec<CcppCode>,
    #[serde(default)]
    active_ccpp: Vec<CcppCode>,
}

impl<'de> Deserialize<'de> for Group {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawGroup::deserialize(deserializer)?;
        let active: Vec<String> = raw
            .active_ccpp
            .into_iter()
            .map(|code| code.key())
            .collect();
        let group = Self::new(
            raw.name,
            raw.group_type,
            raw.ccpp_codes.into_iter().map(|code| code.key()),
        )
        .with_active(active);
        Ok(group)
    }
}

/// Trim, drop blanks and de-duplicate keeping first-seen order
#[must_use]
pub fn normalize_codes<I, S>(codes: I) -> IndexSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    codes
        .into_iter()
        .map(|code| code.as_ref().trim().to_string())
        .filter(|code| !code.is_empty())
        .collect()
}
