//! Section catalog
//!
//! The static layout of a baseline document:
//!
//! - leading sections before the group blocks (`3.1.1` … `3.1.4`)
//! - the AISD block: umbrella `3.1.4.A`, per instance an intro `3.1.4.A.{g}`
//!   and its subsections
//! - the AISI block, laid out the same way
//! - trailing sections after the group blocks
//!
//! Only the number of instances per block is dynamic; everything else is
//! fixed when the catalog is built.

use crate::rules::{RequirementRule, RequirementTable};
use lbs_model::{GroupCounts, GroupRequirement, GroupType, SectionId, SectionIdError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Errors building a catalog
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    /// A section id did not parse
    #[error("invalid section id: {0}")]
    InvalidId(#[from] SectionIdError),

    /// A group root does not end in its group letter
    #[error("{group_type} root '{id}' must end with its group letter")]
    InvalidGroupRoot {
        /// Block the root was given for
        group_type: GroupType,
        /// Offending id
        id: String,
    },

    /// Two templates share a key
    #[error("duplicate template: {0}")]
    DuplicateTemplate(String),
}

/// Number of subsections per AISI instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AisiLayout {
    /// Older documents with 9 AISI subsections
    Legacy,
    /// 16 AISI subsections, same as AISD
    #[default]
    Current,
}

impl AisiLayout {
    /// Subsections per AISI instance
    #[inline]
    #[must_use]
    pub fn subsections(self) -> u32 {
        match self {
            Self::Legacy => 9,
            Self::Current => 16,
        }
    }
}

/// Subsections per AISD instance
pub const AISD_SUBSECTIONS: u32 = 16;

/// Photo fields a template owns
///
/// Candidates are declared prefixes in display order. Discovery stems let
/// prefixes the user added later (e.g. `fotografiaVivienda2`) be picked up
/// from the data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoSpec {
    #[serde(default)]
    candidates: Vec<String>,
    #[serde(default)]
    discovery_stems: Vec<String>,
}

impl PhotoSpec {
    /// Create empty photo layout
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Single declared prefix that also acts as its own discovery stem
    #[must_use]
    pub fn single(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        Self {
            candidates: vec![prefix.clone()],
            discovery_stems: vec![prefix],
        }
    }

    /// With declared prefixes
    #[must_use]
    pub fn with_candidates<I, S>(mut self, candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.candidates = candidates.into_iter().map(Into::into).collect();
        self
    }

    /// With discovery stems
    #[must_use]
    pub fn with_stems<I, S>(mut self, stems: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.discovery_stems = stems.into_iter().map(Into::into).collect();
        self
    }

    /// Declared prefixes in display order
    #[inline]
    #[must_use]
    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    /// Stems discovered prefixes must start with
    #[inline]
    #[must_use]
    pub fn discovery_stems(&self) -> &[String] {
        &self.discovery_stems
    }

    /// Whether a prefix found in the data belongs to this layout
    #[must_use]
    pub fn claims(&self, prefix: &str) -> bool {
        self.candidates.iter().any(|c| c == prefix)
            || self.discovery_stems.iter().any(|s| prefix.starts_with(s.as_str()))
    }

    /// Check if the template has no photos
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty() && self.discovery_stems.is_empty()
    }
}

/// Static descriptor of one section (or of every instance of it)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionTemplate {
    key: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    requirement: GroupRequirement,
    #[serde(default)]
    tables: u32,
    #[serde(default)]
    photos: PhotoSpec,
}

impl SectionTemplate {
    /// Create template for a concrete id or a `{g}` key
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            title: String::new(),
            requirement: GroupRequirement::None,
            tables: 0,
            photos: PhotoSpec::new(),
        }
    }

    /// With display title
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// With fixed table count
    #[must_use]
    pub fn with_tables(mut self, tables: u32) -> Self {
        self.tables = tables;
        self
    }

    /// With photo fields
    #[must_use]
    pub fn with_photos(mut self, photos: PhotoSpec) -> Self {
        self.photos = photos;
        self
    }

    /// Template key (`3.1.3`, `3.1.4.A.{g}.2`)
    #[inline]
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Display title
    #[inline]
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Group requirement, as classified by the catalog's rule table
    #[inline]
    #[must_use]
    pub fn requirement(&self) -> GroupRequirement {
        self.requirement
    }

    /// Tables in the section
    #[inline]
    #[must_use]
    pub fn tables(&self) -> u32 {
        self.tables
    }

    /// Photo fields of the section
    #[inline]
    #[must_use]
    pub fn photos(&self) -> &PhotoSpec {
        &self.photos
    }
}

/// One group block (AISD or AISI)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupBlock {
    /// Umbrella id (`3.1.4.A`)
    pub root: SectionId,
    /// Subsections per instance
    pub subsections: u32,
}

impl GroupBlock {
    /// Intro id of instance `ordinal`
    #[must_use]
    pub fn intro(&self, ordinal: u32) -> SectionId {
        self.root.child(ordinal.to_string())
    }

    fn push_instances(&self, instances: usize, out: &mut Vec<SectionId>) {
        out.push(self.root.clone());
        for g in 1..=instances {
            let intro = self.intro(u32::try_from(g).unwrap_or(u32::MAX));
            out.push(intro.clone());
            out.extend((1..=self.subsections).map(|s| intro.child(s.to_string())));
        }
    }
}

/// Static document layout plus per-section metadata
#[derive(Debug, Clone)]
pub struct SectionCatalog {
    leading: Vec<SectionId>,
    aisd: GroupBlock,
    aisi: GroupBlock,
    trailing: Vec<SectionId>,
    templates: HashMap<String, SectionTemplate>,
    rules: RequirementTable,
}

impl SectionCatalog {
    /// Start building a catalog
    #[inline]
    #[must_use]
    pub fn builder() -> SectionCatalogBuilder {
        SectionCatalogBuilder::default()
    }

    /// The baseline document layout
    #[must_use]
    pub fn standard(layout: AisiLayout) -> Self {
        let leading = ["3.1.1", "3.1.2", "3.1.3", "3.1.4"].map(path).to_vec();
        let mut templates = vec![
            SectionTemplate::new("3.1.1").with_title("Ubicación del proyecto"),
            SectionTemplate::new("3.1.2")
                .with_title("Delimitación de las áreas de influencia social")
                .with_tables(1),
            SectionTemplate::new("3.1.3")
                .with_title("Índices demográficos, sociales y económicos")
                .with_tables(1),
            SectionTemplate::new("3.1.4").with_title("Caracterización socioeconómica"),
            SectionTemplate::new("3.1.4.A")
                .with_title("Área de influencia social directa")
                .with_photos(PhotoSpec::single("fotografiaAISD")),
            SectionTemplate::new("3.1.4.A.{g}")
                .with_title("Comunidad campesina")
                .with_tables(1),
            SectionTemplate::new("3.1.4.B")
                .with_title("Área de influencia social indirecta")
                .with_photos(PhotoSpec::single("fotografiaAISI")),
            SectionTemplate::new("3.1.4.B.{g}")
                .with_title("Centro poblado capital")
                .with_tables(1),
        ];
        for (n, (title, tables, photo)) in (1u32..).zip(SUBSECTION_TOPICS) {
            for letter in ["A", "B"] {
                templates.push(
                    SectionTemplate::new(format!("3.1.4.{letter}.{{g}}.{n}"))
                        .with_title(title)
                        .with_tables(tables)
                        .with_photos(PhotoSpec::single(photo)),
                );
            }
        }
        let mut templates_by_key = HashMap::new();
        for template in templates {
            templates_by_key.insert(template.key.clone(), template);
        }
        Self::assemble(
            leading,
            GroupBlock {
                root: path("3.1.4.A"),
                subsections: AISD_SUBSECTIONS,
            },
            GroupBlock {
                root: path("3.1.4.B"),
                subsections: layout.subsections(),
            },
            Vec::new(),
            templates_by_key,
            Vec::new(),
        )
    }

    fn assemble(
        leading: Vec<SectionId>,
        aisd: GroupBlock,
        aisi: GroupBlock,
        trailing: Vec<SectionId>,
        mut templates: HashMap<String, SectionTemplate>,
        extra_rules: Vec<RequirementRule>,
    ) -> Self {
        let mut rules = RequirementTable::new()
            .with(RequirementRule::prefix(aisd.root.clone(), GroupRequirement::Aisd))
            .with(RequirementRule::prefix(aisi.root.clone(), GroupRequirement::Aisi));
        if let (Some(a), Some(b)) = (aisd.root.parent(), aisi.root.parent()) {
            if a == b && !a.is_empty() {
                rules.push(RequirementRule::exact(a, GroupRequirement::Both));
            }
        }
        for rule in extra_rules {
            rules.push(rule);
        }
        for template in templates.values_mut() {
            template.requirement = classify_key(&rules, &template.key);
        }
        tracing::debug!(
            templates = templates.len(),
            rules = rules.len(),
            aisi_subsections = aisi.subsections,
            "section catalog assembled"
        );
        Self {
            leading,
            aisd,
            aisi,
            trailing,
            templates,
            rules,
        }
    }

    /// Block of a group type
    #[inline]
    #[must_use]
    pub fn block(&self, group_type: GroupType) -> &GroupBlock {
        match group_type {
            GroupType::Aisd => &self.aisd,
            GroupType::Aisi => &self.aisi,
        }
    }

    /// Sections before the group blocks
    #[inline]
    #[must_use]
    pub fn leading(&self) -> &[SectionId] {
        &self.leading
    }

    /// Sections after the group blocks
    #[inline]
    #[must_use]
    pub fn trailing(&self) -> &[SectionId] {
        &self.trailing
    }

    /// Requirement rules derived from the block roots
    #[inline]
    #[must_use]
    pub fn rules(&self) -> &RequirementTable {
        &self.rules
    }

    /// Requirement of a section
    #[inline]
    #[must_use]
    pub fn requirement(&self, section: &SectionId) -> GroupRequirement {
        self.rules.classify(section)
    }

    /// Template for a section: concrete id first, then its template key
    #[must_use]
    pub fn template(&self, section: &SectionId) -> Option<&SectionTemplate> {
        self.templates
            .get(&section.to_string())
            .or_else(|| self.templates.get(&section.template_key()))
    }

    /// Table count of a section (0 when no template exists)
    #[inline]
    #[must_use]
    pub fn tables(&self, section: &SectionId) -> u32 {
        self.template(section).map_or(0, SectionTemplate::tables)
    }

    /// All templates (unordered)
    pub fn templates(&self) -> impl Iterator<Item = &SectionTemplate> {
        self.templates.values()
    }

    /// Every section in document order for the given instance counts
    ///
    /// A type with no groups still gets one placeholder instance, so the
    /// document shape never collapses.
    #[must_use]
    pub fn expand_all(&self, counts: GroupCounts) -> Vec<SectionId> {
        let mut out = self.leading.clone();
        self.aisd
            .push_instances(counts.instances(GroupType::Aisd), &mut out);
        self.aisi
            .push_instances(counts.instances(GroupType::Aisi), &mut out);
        out.extend(self.trailing.iter().cloned());
        out
    }
}

impl Default for SectionCatalog {
    fn default() -> Self {
        Self::standard(AisiLayout::default())
    }
}

/// Builder for custom catalogs
#[derive(Debug, Clone, Default)]
pub struct SectionCatalogBuilder {
    leading: Vec<String>,
    aisd: Option<(String, u32)>,
    aisi: Option<(String, u32)>,
    trailing: Vec<String>,
    templates: Vec<SectionTemplate>,
    rules: Vec<(String, bool, GroupRequirement)>,
}

impl SectionCatalogBuilder {
    /// Sections before the group blocks
    #[must_use]
    pub fn leading<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.leading = ids.into_iter().map(Into::into).collect();
        self
    }

    /// AISD block root and subsections per instance
    #[must_use]
    pub fn aisd(mut self, root: impl Into<String>, subsections: u32) -> Self {
        self.aisd = Some((root.into(), subsections));
        self
    }

    /// AISI block root and layout
    #[must_use]
    pub fn aisi(mut self, root: impl Into<String>, layout: AisiLayout) -> Self {
        self.aisi = Some((root.into(), layout.subsections()));
        self
    }

    /// Sections after the group blocks
    #[must_use]
    pub fn trailing<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.trailing = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Add a template
    #[must_use]
    pub fn template(mut self, template: SectionTemplate) -> Self {
        self.templates.push(template);
        self
    }

    /// Add a requirement rule on top of the block-derived ones
    #[must_use]
    pub fn rule(mut self, id: impl Into<String>, exact: bool, requirement: GroupRequirement) -> Self {
        self.rules.push((id.into(), exact, requirement));
        self
    }

    /// Validate and build
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] for unparsable ids, group roots that do not
    /// end in their letter, or duplicate template keys.
    pub fn build(self) -> Result<SectionCatalog, CatalogError> {
        let leading = parse_all(&self.leading)?;
        let trailing = parse_all(&self.trailing)?;
        let (aisd_root, aisd_subsections) = self
            .aisd
            .unwrap_or_else(|| ("3.1.4.A".to_string(), AISD_SUBSECTIONS));
        let (aisi_root, aisi_subsections) = self
            .aisi
            .unwrap_or_else(|| ("3.1.4.B".to_string(), AisiLayout::default().subsections()));
        let aisd = GroupBlock {
            root: parse_root(GroupType::Aisd, &aisd_root)?,
            subsections: aisd_subsections,
        };
        let aisi = GroupBlock {
            root: parse_root(GroupType::Aisi, &aisi_root)?,
            subsections: aisi_subsections,
        };

        let mut templates = HashMap::new();
        for template in self.templates {
            if templates.contains_key(&template.key) {
                return Err(CatalogError::DuplicateTemplate(template.key));
            }
            templates.insert(template.key.clone(), template);
        }

        let mut rules = Vec::with_capacity(self.rules.len());
        for (id, exact, requirement) in self.rules {
            let id: SectionId = id.parse()?;
            rules.push(if exact {
                RequirementRule::exact(id, requirement)
            } else {
                RequirementRule::prefix(id, requirement)
            });
        }

        Ok(SectionCatalog::assemble(
            leading, aisd, aisi, trailing, templates, rules,
        ))
    }
}

/// Default subsection topics: (title, tables, photo prefix)
const SUBSECTION_TOPICS: [(&str, u32, &str); 16] = [
    ("Institucionalidad local", 1, "fotografiaInstitucionalidad"),
    ("Aspectos demográficos", 2, "fotografiaDemografia"),
    ("Población económicamente activa", 2, "fotografiaPEA"),
    ("Actividades económicas", 1, "fotografiaActividadesEconomicas"),
    ("Vivienda", 2, "fotografiaVivienda"),
    ("Servicios básicos", 3, "fotografiaServiciosBasicos"),
    ("Transporte y telecomunicaciones", 1, "fotografiaTransporte"),
    ("Infraestructura en salud", 2, "fotografiaSalud"),
    ("Infraestructura en educación", 2, "fotografiaEducacion"),
    ("Infraestructura recreativa y deportiva", 0, "fotografiaRecreacion"),
    ("Indicadores de salud", 2, "fotografiaIndicadoresSalud"),
    ("Indicadores de educación", 2, "fotografiaIndicadoresEducacion"),
    ("Aspectos culturales", 1, "fotografiaAspectosCulturales"),
    ("Uso de recursos naturales", 1, "fotografiaRecursosNaturales"),
    ("Índice de desarrollo humano", 1, "fotografiaIDH"),
    ("Necesidades básicas insatisfechas", 1, "fotografiaNBI"),
];

fn path(raw: &str) -> SectionId {
    SectionId::new(raw.split('.').map(str::to_string).collect())
}

fn parse_all(raw: &[String]) -> Result<Vec<SectionId>, CatalogError> {
    raw.iter()
        .map(|s| s.parse::<SectionId>().map_err(CatalogError::from))
        .collect()
}

fn parse_root(group_type: GroupType, raw: &str) -> Result<SectionId, CatalogError> {
    let id: SectionId = raw.parse()?;
    if id.last().and_then(GroupType::from_letter) == Some(group_type) {
        Ok(id)
    } else {
        Err(CatalogError::InvalidGroupRoot {
            group_type,
            id: raw.to_string(),
        })
    }
}

/// Classify a template key by substituting the first instance for `{g}`
fn classify_key(rules: &RequirementTable, key: &str) -> GroupRequirement {
    let concrete = key.replace(lbs_model::GROUP_PLACEHOLDER, "1");
    concrete
        .parse::<SectionId>()
        .map_or(GroupRequirement::None, |id| rules.classify(&id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ids(list: &[SectionId]) -> Vec<String> {
        list.iter().map(ToString::to_string).collect()
    }

    fn small() -> SectionCatalog {
        SectionCatalog::builder()
            .leading(["3.1.1", "3.1.3"])
            .aisd("3.1.4.A", 2)
            .aisi("3.1.4.B", AisiLayout::Legacy)
            .trailing(["3.2"])
            .template(SectionTemplate::new("3.1.3").with_tables(1))
            .template(SectionTemplate::new("3.1.4.A.{g}.1").with_tables(1))
            .build()
            .unwrap()
    }

    #[test]
    fn expand_with_two_aisd_instances() {
        let catalog = SectionCatalog::builder()
            .leading(["3.1.1"])
            .aisd("3.1.4.A", 2)
            .aisi("3.1.4.B", AisiLayout::Legacy)
            .build()
            .unwrap();
        let list = catalog.expand_all(GroupCounts::new(2, 0));
        let head: Vec<String> = ids(&list[..8]);
        assert_eq!(
            head,
            vec![
                "3.1.1",
                "3.1.4.A",
                "3.1.4.A.1",
                "3.1.4.A.1.1",
                "3.1.4.A.1.2",
                "3.1.4.A.2",
                "3.1.4.A.2.1",
                "3.1.4.A.2.2",
            ]
        );
        // AISI placeholder instance with 9 subsections
        assert_eq!(list[8].to_string(), "3.1.4.B");
        assert_eq!(list[9].to_string(), "3.1.4.B.1");
        assert_eq!(list.last().unwrap().to_string(), "3.1.4.B.1.9");
        assert_eq!(list.len(), 1 + 1 + 2 * 3 + 1 + 10);
    }

    #[test]
    fn zero_groups_keep_one_placeholder_instance() {
        let catalog = small();
        let none = catalog.expand_all(GroupCounts::new(0, 0));
        let one = catalog.expand_all(GroupCounts::new(1, 1));
        assert_eq!(none, one);
        assert_eq!(none.last().unwrap().to_string(), "3.2");
    }

    #[test]
    fn standard_layouts() {
        let current = SectionCatalog::standard(AisiLayout::Current);
        let legacy = SectionCatalog::standard(AisiLayout::Legacy);
        let counts = GroupCounts::new(1, 1);
        assert_eq!(current.expand_all(counts).len(), 4 + 1 + 17 + 1 + 17);
        assert_eq!(legacy.expand_all(counts).len(), 4 + 1 + 17 + 1 + 10);
    }

    #[test]
    fn group_umbrellas_are_navigable_and_open_each_block() {
        let catalog = SectionCatalog::standard(AisiLayout::Current);
        let list = catalog.expand_all(GroupCounts::new(2, 1));
        let position = |s: &str| list.iter().position(|id| id.to_string() == s).unwrap();

        let aisd = position("3.1.4.A");
        assert_eq!(list[aisd - 1].to_string(), "3.1.4");
        assert_eq!(list[aisd + 1].to_string(), "3.1.4.A.1");
        assert_eq!(position("3.1.4.B") - 1, position("3.1.4.A.2.16"));

        for root in [&list[aisd], &list[position("3.1.4.B")]] {
            assert!(!root.is_intro());
        }
        assert!(list[aisd + 1].is_intro());
        assert_eq!(catalog.requirement(&list[aisd]), GroupRequirement::Aisd);
        assert_eq!(
            catalog.requirement(&list[position("3.1.4.B")]),
            GroupRequirement::Aisi
        );
    }

    #[test]
    fn template_lookup_prefers_concrete_id() {
        let catalog = SectionCatalog::builder()
            .template(SectionTemplate::new("3.1.4.A.{g}.1").with_tables(1))
            .template(SectionTemplate::new("3.1.4.A.2.1").with_tables(4))
            .build()
            .unwrap();
        let first: SectionId = "3.1.4.A.1.1".parse().unwrap();
        let second: SectionId = "3.1.4.A.2.1".parse().unwrap();
        assert_eq!(catalog.tables(&first), 1);
        assert_eq!(catalog.tables(&second), 4);
        assert_eq!(catalog.tables(&"9.9".parse().unwrap()), 0);
    }

    #[test]
    fn template_requirements_follow_rules() {
        let catalog = SectionCatalog::standard(AisiLayout::Current);
        let aisd: SectionId = "3.1.4.A.3.5".parse().unwrap();
        let umbrella: SectionId = "3.1.4".parse().unwrap();
        assert_eq!(catalog.template(&aisd).unwrap().requirement(), GroupRequirement::Aisd);
        assert_eq!(catalog.template(&umbrella).unwrap().requirement(), GroupRequirement::Both);
        assert_eq!(catalog.requirement(&"3.1.2".parse().unwrap()), GroupRequirement::None);
    }

    #[test]
    fn builder_rejects_bad_roots_and_duplicates() {
        let err = SectionCatalog::builder().aisd("3.1.4.B", 16).build().unwrap_err();
        assert!(matches!(err, CatalogError::InvalidGroupRoot { group_type: GroupType::Aisd, .. }));

        let err = SectionCatalog::builder()
            .template(SectionTemplate::new("3.1.1"))
            .template(SectionTemplate::new("3.1.1"))
            .build()
            .unwrap_err();
        assert_eq!(err, CatalogError::DuplicateTemplate("3.1.1".into()));

        let err = SectionCatalog::builder().leading(["3..1"]).build().unwrap_err();
        assert!(matches!(err, CatalogError::InvalidId(_)));
    }

    #[test]
    fn photo_spec_claims_discovered_prefixes() {
        let photos = PhotoSpec::single("fotografiaVivienda");
        assert!(photos.claims("fotografiaVivienda"));
        assert!(photos.claims("fotografiaViviendaRural"));
        assert!(!photos.claims("fotografiaSalud"));
        assert!(PhotoSpec::new().is_empty());
    }
}
