//! Global numbering
//!
//! Tables and photos are numbered consecutively across the whole document.
//! A number is the count of items in every section before the target, in
//! expanded document order, plus the item's position inside the target.

use crate::photos::{PhotoRegistry, PrefixPhotos};
use lbs_model::{GroupCounts, SectionId};
use lbs_sections::{group_field_prefix, SectionCatalog};
use std::sync::Arc;

/// Default label prefix (`3.` → `3.1`, `3.2`, …)
pub const DEFAULT_NUMBERING_PREFIX: &str = "3.";

/// Table and photo numbering over a catalog
#[derive(Debug, Clone)]
pub struct GlobalNumbering {
    catalog: Arc<SectionCatalog>,
    prefix: String,
}

impl GlobalNumbering {
    /// Create numbering with a label prefix
    #[must_use]
    pub fn new(catalog: Arc<SectionCatalog>, prefix: impl Into<String>) -> Self {
        Self {
            catalog,
            prefix: prefix.into(),
        }
    }

    /// Catalog in use
    #[inline]
    #[must_use]
    pub fn catalog(&self) -> &Arc<SectionCatalog> {
        &self.catalog
    }

    /// Label prefix
    #[inline]
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Render a global index as a label
    #[inline]
    #[must_use]
    pub fn label(&self, n: u32) -> String {
        format!("{}{n}", self.prefix)
    }

    /// 1-based global index of table `local` (0-based) in `section`
    ///
    /// `None` when the section is not part of the expanded document or the
    /// index does not fit in `u32`.
    #[must_use]
    pub fn table_index(&self, counts: GroupCounts, section: &SectionId, local: u32) -> Option<u32> {
        let all = self.catalog.expand_all(counts);
        let pos = all.iter().position(|id| id == section)?;
        let prior: u32 = all[..pos].iter().map(|id| self.catalog.tables(id)).sum();
        prior.checked_add(local)?.checked_add(1)
    }

    /// Rendered global table number
    #[must_use]
    pub fn global_table_number(
        &self,
        counts: GroupCounts,
        section: &SectionId,
        local: u32,
    ) -> Option<String> {
        let n = self.table_index(counts, section, local)?;
        tracing::trace!(section = %section, local, n, "table number");
        Some(self.label(n))
    }

    /// Counted photos of one section, using the section's own group suffix
    #[must_use]
    pub fn section_photos(&self, registry: &PhotoRegistry, section: &SectionId) -> Vec<PrefixPhotos> {
        self.catalog.template(section).map_or_else(Vec::new, |template| {
            registry.section_photos(template.photos(), &group_field_prefix(section))
        })
    }

    /// 1-based global index of photo `local` of `prefix` in `section`
    ///
    /// Counts every photo of the sections before `section`, then the photos
    /// of prefixes ordered before `prefix` under `suffix`. A prefix the
    /// section does not know is ordered after all known ones. `None` when the
    /// section is not part of the expanded document or the index overflows.
    #[must_use]
    pub fn photo_index(
        &self,
        registry: &PhotoRegistry,
        counts: GroupCounts,
        section: &SectionId,
        local: u32,
        prefix: &str,
        suffix: &str,
    ) -> Option<u32> {
        let all = self.catalog.expand_all(counts);
        let pos = all.iter().position(|id| id == section)?;
        let prior: u32 = all[..pos]
            .iter()
            .map(|id| {
                self.section_photos(registry, id)
                    .iter()
                    .map(PrefixPhotos::count)
                    .sum::<u32>()
            })
            .sum();
        let preceding: u32 = self.catalog.template(section).map_or(0, |template| {
            registry
                .prefixes(template.photos(), suffix)
                .iter()
                .take_while(|p| p.as_str() != prefix)
                .map(|p| registry.count(p, suffix))
                .sum()
        });
        prior
            .checked_add(preceding)?
            .checked_add(local)?
            .checked_add(1)
    }

    /// Rendered global photo number
    #[must_use]
    pub fn global_photo_number(
        &self,
        registry: &PhotoRegistry,
        counts: GroupCounts,
        section: &SectionId,
        local: u32,
        prefix: &str,
        suffix: &str,
    ) -> Option<String> {
        let n = self.photo_index(registry, counts, section, local, prefix, suffix)?;
        Some(self.label(n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lbs_model::FieldSnapshot;
    use lbs_sections::{AisiLayout, PhotoSpec, SectionTemplate};

    fn id(s: &str) -> SectionId {
        s.parse().unwrap()
    }

    fn catalog() -> Arc<SectionCatalog> {
        Arc::new(
            SectionCatalog::builder()
                .leading(["3.1.1", "3.1.3"])
                .aisd("3.1.4.A", 2)
                .aisi("3.1.4.B", AisiLayout::Legacy)
                .template(SectionTemplate::new("3.1.1"))
                .template(SectionTemplate::new("3.1.3").with_tables(1))
                .template(
                    SectionTemplate::new("3.1.4.A.{g}.1")
                        .with_tables(1)
                        .with_photos(PhotoSpec::new().with_candidates(["fotoA", "fotoB"])),
                )
                .template(
                    SectionTemplate::new("3.1.4.A.{g}.2")
                        .with_photos(PhotoSpec::single("fotoPoblacion")),
                )
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn table_numbers_across_instances() {
        let numbering = GlobalNumbering::new(catalog(), DEFAULT_NUMBERING_PREFIX);
        let counts = GroupCounts::new(2, 0);
        assert_eq!(
            numbering.global_table_number(counts, &id("3.1.3"), 0).as_deref(),
            Some("3.1")
        );
        assert_eq!(
            numbering.global_table_number(counts, &id("3.1.4.A.1.1"), 0).as_deref(),
            Some("3.2")
        );
        assert_eq!(
            numbering.global_table_number(counts, &id("3.1.4.A.2.1"), 0).as_deref(),
            Some("3.3")
        );
    }

    #[test]
    fn unknown_section_has_no_number() {
        let numbering = GlobalNumbering::new(catalog(), "3.");
        let counts = GroupCounts::new(1, 0);
        assert!(numbering.global_table_number(counts, &id("3.1.4.A.2.1"), 0).is_none());
        assert!(numbering.global_table_number(counts, &id("7"), 0).is_none());
    }

    #[test]
    fn out_of_range_local_index_has_no_number() {
        let numbering = GlobalNumbering::new(catalog(), "3.");
        let counts = GroupCounts::new(1, 0);
        assert_eq!(numbering.table_index(counts, &id("3.1.1"), u32::MAX - 1), Some(u32::MAX));
        assert!(numbering.global_table_number(counts, &id("3.1.3"), u32::MAX).is_none());

        let data = FieldSnapshot::new().with("fotoA1Imagen_A1", "1.png");
        let registry = PhotoRegistry::build(&data);
        let section = id("3.1.4.A.1.1");
        assert!(numbering
            .global_photo_number(&registry, counts, &section, u32::MAX, "fotoB", "_A1")
            .is_none());
    }

    #[test]
    fn photo_number_counts_preceding_prefixes() {
        let numbering = GlobalNumbering::new(catalog(), "3.");
        let data = FieldSnapshot::new()
            .with("fotoA1Imagen_A1", "1.png")
            .with("fotoA2Imagen_A1", "2.png")
            .with("fotoBImagen_A1", "b.png");
        let registry = PhotoRegistry::build(&data);
        let section = id("3.1.4.A.1.1");
        let counts = GroupCounts::new(1, 0);
        assert_eq!(numbering.photo_index(&registry, counts, &section, 0, "fotoB", "_A1"), Some(3));
        assert_eq!(numbering.photo_index(&registry, counts, &section, 1, "fotoA", "_A1"), Some(2));
        assert_eq!(
            numbering.global_photo_number(&registry, counts, &section, 0, "fotoB", "_A1").as_deref(),
            Some("3.3")
        );
    }

    #[test]
    fn photo_number_counts_earlier_instances_with_their_own_suffix() {
        let numbering = GlobalNumbering::new(catalog(), "3.");
        let data = FieldSnapshot::new()
            .with("fotoA1Imagen_A1", "1.png")
            .with("fotoPoblacionImagen_A1", "p.png")
            .with("fotoA1Imagen_A2", "x.png")
            .with("fotoA1Imagen", "unscoped.png");
        let registry = PhotoRegistry::build(&data);
        let counts = GroupCounts::new(2, 0);
        // A.1.1 has one, A.1.2 has one; unscoped keys never count
        assert_eq!(
            numbering.photo_index(&registry, counts, &id("3.1.4.A.2.1"), 0, "fotoA", "_A2"),
            Some(3)
        );
    }

    #[test]
    fn unknown_prefix_goes_after_known_ones() {
        let numbering = GlobalNumbering::new(catalog(), "3.");
        let data = FieldSnapshot::new().with("fotoB1Imagen_A1", "b.png");
        let registry = PhotoRegistry::build(&data);
        let n = numbering.photo_index(
            &registry,
            GroupCounts::new(1, 0),
            &id("3.1.4.A.1.1"),
            0,
            "fotoZ",
            "_A1",
        );
        assert_eq!(n, Some(2));
    }
}
