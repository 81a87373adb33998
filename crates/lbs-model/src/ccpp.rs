//! Populated centers (CCPP)
//!
//! Reference records imported from the census dataset. Nothing in the
//! workspace mutates them.

use crate::group::Group;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// CCPP code as found in the dataset (text or number)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CcppCode {
    /// Textual code (may carry leading zeros)
    Text(String),
    /// Numeric code
    Number(i64),
}

impl CcppCode {
    /// Normalized lookup key
    #[must_use]
    pub fn key(&self) -> String {
        match self {
            Self::Text(s) => s.trim().to_string(),
            Self::Number(n) => n.to_string(),
        }
    }
}

impl fmt::Display for CcppCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

impl From<&str> for CcppCode {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<i64> for CcppCode {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

/// Populated center record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopulatedCenter {
    /// Row index in the source dataset
    #[serde(default)]
    pub item: u32,
    /// Geographic code
    #[serde(default)]
    pub ubigeo: String,
    /// CCPP code
    pub code: CcppCode,
    /// Center name
    pub name: String,
    /// Category (e.g. "capital")
    #[serde(default)]
    pub category: String,
    /// Census population
    #[serde(default)]
    pub population: u64,
    /// Registered households
    #[serde(default)]
    pub households: u64,
    /// Occupied households
    #[serde(default)]
    pub occupied_households: u64,
    /// Department name
    #[serde(default)]
    pub department: String,
    /// Province name
    #[serde(default)]
    pub province: String,
    /// District name
    #[serde(default)]
    pub district: String,
    /// Planar east coordinate
    #[serde(default)]
    pub east: f64,
    /// Planar north coordinate
    #[serde(default)]
    pub north: f64,
    /// Altitude in meters
    #[serde(default)]
    pub altitude: f64,
}

impl PopulatedCenter {
    /// Minimal record, mostly for imports and tests
    #[must_use]
    pub fn new(code: impl Into<CcppCode>, name: impl Into<String>, population: u64) -> Self {
        Self {
            item: 0,
            ubigeo: String::new(),
            code: code.into(),
            name: name.into(),
            category: String::new(),
            population,
            households: 0,
            occupied_households: 0,
            department: String::new(),
            province: String::new(),
            district: String::new(),
            east: 0.0,
            north: 0.0,
            altitude: 0.0,
        }
    }

    /// Whether the center is the capital of its district
    #[inline]
    #[must_use]
    pub fn is_capital(&self) -> bool {
        self.category.trim().eq_ignore_ascii_case("capital")
    }
}

/// Lookup of populated centers by normalized code
#[derive(Debug, Clone, Default)]
pub struct PopulatedCenterIndex {
    by_code: HashMap<String, PopulatedCenter>,
}

impl PopulatedCenterIndex {
    /// Build index; later records with the same code replace earlier ones
    #[must_use]
    pub fn new(centers: impl IntoIterator<Item = PopulatedCenter>) -> Self {
        let by_code = centers
            .into_iter()
            .map(|center| (center.code.key(), center))
            .collect();
        Self { by_code }
    }

    /// Get center by code
    #[inline]
    #[must_use]
    pub fn get(&self, code: &str) -> Option<&PopulatedCenter> {
        self.by_code.get(code.trim())
    }

    /// Number of centers
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    /// Check if index is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }

    /// Active centers of a group, in the group's order; unknown codes are skipped
    #[must_use]
    pub fn active_centers<'a>(&'a self, group: &'a Group) -> Vec<&'a PopulatedCenter> {
        group
            .active_ccpp()
            .filter_map(|code| self.by_code.get(code))
            .collect()
    }

    /// Total population of a group's active centers
    #[must_use]
    pub fn active_population(&self, group: &Group) -> u64 {
        self.active_centers(group)
            .iter()
            .map(|center| center.population)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::GroupType;

    #[test]
    fn code_accepts_text_or_number() {
        let text: CcppCode = serde_json::from_str("\" 0101 \"").unwrap();
        let number: CcppCode = serde_json::from_str("101").unwrap();
        assert_eq!(text.key(), "0101");
        assert_eq!(number.key(), "101");
    }

    #[test]
    fn center_from_camel_case_json() {
        let raw = r#"{"item":3,"code":4030,"name":"Cahuacho","category":"Capital","population":160,"occupiedHouseholds":40}"#;
        let center: PopulatedCenter = serde_json::from_str(raw).unwrap();
        assert_eq!(center.code.key(), "4030");
        assert!(center.is_capital());
        assert_eq!(center.occupied_households, 40);
    }

    #[test]
    fn active_population_sums_known_active_centers() {
        let index = PopulatedCenterIndex::new([
            PopulatedCenter::new("1", "Uno", 100),
            PopulatedCenter::new("2", "Dos", 50),
            PopulatedCenter::new(3, "Tres", 7),
        ]);
        let group = Group::new("", GroupType::Aisd, ["1", "2", "3", "9"]).with_active(["1", "3", "9"]);
        assert_eq!(index.active_population(&group), 107);
        let names: Vec<_> = index
            .active_centers(&group)
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(names, vec!["Uno", "Tres"]);
    }

    #[test]
    fn group_from_centers_uses_normalized_codes() {
        let centers = [PopulatedCenter::new(" 7 ", "Siete", 1), PopulatedCenter::new(8, "Ocho", 2)];
        let group = Group::from_centers("G", GroupType::Aisi, &centers);
        let codes: Vec<_> = group.ccpp_codes().collect();
        assert_eq!(codes, vec!["7", "8"]);
    }
}
