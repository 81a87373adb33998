//! Section identifiers
//!
//! Provides [`SectionId`] for hierarchical addressing of report sections and
//! [`GroupInstance`] for the AISD/AISI instance a section belongs to.

use crate::group::GroupType;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Placeholder segment standing for the group ordinal in template keys.
pub const GROUP_PLACEHOLDER: &str = "{g}";

/// Dotted identifier of a report section
///
/// Hierarchical structure using string segments.
///
/// # Examples
/// - `["3", "1", "1"]` → `3.1.1`
/// - `["3", "1", "4", "A", "2", "5"]` → `3.1.4.A.2.5` (5th subsection of the 2nd AISD group)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SectionId(Vec<String>);

impl SectionId {
    /// Create new id from segments
    #[inline]
    #[must_use]
    pub fn new(segments: Vec<String>) -> Self {
        Self(segments)
    }

    /// Get id segments
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Get number of segments
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if id has no segments
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get parent id (if any)
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.0.is_empty() {
            None
        } else {
            Some(Self(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    /// Get last segment
    #[inline]
    #[must_use]
    pub fn last(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// Append a segment, returning a new id
    #[inline]
    #[must_use]
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut new = self.clone();
        new.0.push(segment.into());
        new
    }

    /// Check if this id is a prefix of another
    ///
    /// # Examples
    /// - `3.1.4` is prefix of `3.1.4.A.1`
    /// - `3.1.4` is NOT prefix of `3.1.40`
    #[inline]
    #[must_use]
    pub fn is_prefix_of(&self, other: &Self) -> bool {
        if self.0.len() > other.0.len() {
            return false;
        }
        self.0 == other.0[..self.0.len()]
    }

    /// Check if this id is a strict ancestor of another
    #[inline]
    #[must_use]
    pub fn is_ancestor_of(&self, other: &Self) -> bool {
        self.0.len() < other.0.len() && self.is_prefix_of(other)
    }

    /// Group instance this section belongs to
    ///
    /// The first `A` or `B` segment marks the group type. A numeric segment
    /// right after it is the 1-based ordinal; a bare `A`/`B` (or one followed
    /// by something that is not a number) defaults to ordinal 1.
    #[must_use]
    pub fn group_instance(&self) -> Option<GroupInstance> {
        let pos = self
            .0
            .iter()
            .position(|seg| GroupType::from_letter(seg).is_some())?;
        let group_type = GroupType::from_letter(&self.0[pos])?;
        let ordinal = self
            .0
            .get(pos + 1)
            .and_then(|seg| seg.parse::<u32>().ok())
            .filter(|n| *n >= 1)
            .unwrap_or(1);
        Some(GroupInstance::new(group_type, ordinal))
    }

    /// Whether this is a per-instance intro section (`….A.{n}` / `….B.{n}`)
    #[must_use]
    pub fn is_intro(&self) -> bool {
        match self.0.as_slice() {
            [.., letter, ordinal] => {
                GroupType::from_letter(letter).is_some()
                    && !ordinal.is_empty()
                    && ordinal.chars().all(|c| c.is_ascii_digit())
            }
            _ => false,
        }
    }

    /// Template key shared by every instance of this section
    ///
    /// The ordinal following the group letter is replaced by [`GROUP_PLACEHOLDER`]:
    /// `3.1.4.A.2.5` → `3.1.4.A.{g}.5`. Ids outside a group instance are
    /// their own key.
    #[must_use]
    pub fn template_key(&self) -> String {
        let mut segments: Vec<&str> = self.0.iter().map(String::as_str).collect();
        if let Some(pos) = segments
            .iter()
            .position(|seg| GroupType::from_letter(seg).is_some())
        {
            if let Some(next) = segments.get_mut(pos + 1) {
                if next.chars().all(|c| c.is_ascii_digit()) {
                    *next = GROUP_PLACEHOLDER;
                }
            }
        }
        segments.join(".")
    }

    /// Iterator over segments from root to leaf
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl Display for SectionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

impl FromStr for SectionId {
    type Err = SectionIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(SectionIdError::Empty);
        }

        let segments: Vec<String> = s
            .split('.')
            .map(|seg| {
                if seg.is_empty() {
                    Err(SectionIdError::EmptySegment(s.to_string()))
                } else if seg
                    .contains(|c: char| !c.is_alphanumeric() && !matches!(c, '_' | '{' | '}'))
                {
                    Err(SectionIdError::InvalidSegment(seg.to_string()))
                } else {
                    Ok(seg.to_string())
                }
            })
            .collect::<Result<_, _>>()?;

        Ok(Self(segments))
    }
}

impl Serialize for SectionId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SectionId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Errors related to section ids
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SectionIdError {
    /// No segments at all
    #[error("section id is empty")]
    Empty,

    /// Empty segment in id
    #[error("section id '{0}' contains an empty segment")]
    EmptySegment(String),

    /// Invalid segment characters
    #[error("invalid segment: {0} (must be alphanumeric, underscore or a placeholder)")]
    InvalidSegment(String),
}

/// One concrete AISD or AISI instance (e.g. the 2nd community group)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupInstance {
    /// AISD or AISI
    pub group_type: GroupType,
    /// 1-based position within its type
    pub ordinal: u32,
}

impl GroupInstance {
    /// Create instance handle
    #[inline]
    #[must_use]
    pub fn new(group_type: GroupType, ordinal: u32) -> Self {
        Self {
            group_type,
            ordinal,
        }
    }

    /// Field-name suffix (`_A2`, `_B1`)
    #[must_use]
    pub fn suffix(&self) -> String {
        format!("_{}{}", self.group_type.letter(), self.ordinal)
    }

    /// 0-based index into the group list of this type
    #[inline]
    #[must_use]
    pub fn index(&self) -> usize {
        self.ordinal.saturating_sub(1) as usize
    }

    /// Parse a suffix of the form `_A{n}` / `_B{n}`
    #[must_use]
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        let rest = suffix.strip_prefix('_')?;
        let mut chars = rest.chars();
        let group_type = GroupType::from_letter(&chars.next()?.to_string())?;
        let digits = chars.as_str();
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let ordinal = digits.parse::<u32>().ok().filter(|n| *n >= 1)?;
        Some(Self::new(group_type, ordinal))
    }
}

impl Display for GroupInstance {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} #{}", self.group_type, self.ordinal)
    }
}
