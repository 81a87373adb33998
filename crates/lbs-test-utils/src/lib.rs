//! Testing utilities for LBS workspace
//!
//! Shared fixtures: group configurations, stores, catalogs and snapshots.

#![allow(missing_docs)]

use lbs_groups::{GroupConfigStore, MemoryStorage};
use lbs_model::{FieldSnapshot, Group, GroupConfig, GroupType, PopulatedCenter, SectionId};
use lbs_sections::{AisiLayout, PhotoSpec, SectionCatalog, SectionTemplate};
use std::sync::Arc;

pub fn section(id: &str) -> SectionId {
    id.parse().unwrap()
}

/// Group with one active code derived from its position
pub fn sample_group(group_type: GroupType, index: usize) -> Group {
    let name = match group_type {
        GroupType::Aisd => format!("Comunidad Campesina {}", index + 1),
        GroupType::Aisi => format!("Distrito {}", index + 1),
    };
    Group::new(name, group_type, [format!("{}{:03}", group_type.letter(), index + 1)])
}

/// Same group with nothing selected
pub fn inactive_group(group_type: GroupType, index: usize) -> Group {
    sample_group(group_type, index).with_active(Vec::<String>::new())
}

pub fn config_with(aisd: usize, aisi: usize) -> GroupConfig {
    GroupConfig::new()
        .with_groups(GroupType::Aisd, (0..aisd).map(|i| sample_group(GroupType::Aisd, i)))
        .with_groups(GroupType::Aisi, (0..aisi).map(|i| sample_group(GroupType::Aisi, i)))
}

/// Two AISD groups where only the second has active CCPP
pub fn config_with_inactive_first_aisd() -> GroupConfig {
    GroupConfig::new().with_groups(
        GroupType::Aisd,
        [inactive_group(GroupType::Aisd, 0), sample_group(GroupType::Aisd, 1)],
    )
}

pub fn memory_store(config: GroupConfig) -> GroupConfigStore {
    GroupConfigStore::create(config, Arc::new(MemoryStorage::new()), lbs_groups::DEFAULT_STORAGE_KEY)
}

pub fn sample_centers() -> Vec<PopulatedCenter> {
    vec![
        PopulatedCenter::new("0403010001", "Cahuacho", 820),
        PopulatedCenter::new("0403010004", "Ayroca", 212),
        PopulatedCenter::new("0403010009", "Sondor", 96),
    ]
}

/// Small layout: two leading sections, two AISD subsections, legacy AISI
///
/// `3.1.3` has one table; every AISD instance's first subsection has one
/// table and photo candidates `fotoA`, `fotoB`.
pub fn small_catalog() -> SectionCatalog {
    SectionCatalog::builder()
        .leading(["3.1.1", "3.1.3"])
        .aisd("3.1.4.A", 2)
        .aisi("3.1.4.B", AisiLayout::Legacy)
        .template(SectionTemplate::new("3.1.1").with_photos(PhotoSpec::single("fotoUbicacion")))
        .template(SectionTemplate::new("3.1.3").with_tables(1))
        .template(
            SectionTemplate::new("3.1.4.A.{g}.1")
                .with_tables(1)
                .with_photos(PhotoSpec::new().with_candidates(["fotoA", "fotoB"])),
        )
        .template(SectionTemplate::new("3.1.4.B.{g}.1").with_tables(2))
        .build()
        .unwrap()
}

pub fn snapshot(entries: &[(&str, &str)]) -> FieldSnapshot {
    entries
        .iter()
        .map(|(k, v)| ((*k).to_string(), serde_json::Value::from(*v)))
        .collect()
}
