use lbs_core::{EngineConfig, EngineError, ReportEngine};
use lbs_groups::{encode_config, ActiveCcppPolicy, MemoryStorage, DEFAULT_STORAGE_KEY};
use lbs_model::{FieldSnapshot, FieldStore, Group, GroupType, MemoryFieldStore, PopulatedCenterIndex};
use lbs_sections::{AccessControl, AisiLayout, SectionCatalog};
use lbs_test_utils::{
    config_with, config_with_inactive_first_aisd, inactive_group, memory_store, sample_centers,
    sample_group, section, small_catalog, snapshot,
};
use pretty_assertions::assert_eq;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

fn engine_with(config: EngineConfig, data: FieldSnapshot) -> (ReportEngine, Arc<MemoryFieldStore>) {
    let fields = Arc::new(MemoryFieldStore::new(data));
    let engine = ReportEngine::new(config, Arc::new(MemoryStorage::new()), fields.clone()).unwrap();
    (engine, fields)
}

#[test]
fn navigation_opens_up_as_groups_are_added() {
    let (engine, _) = engine_with(EngineConfig::default(), FieldSnapshot::new());
    assert_eq!(engine.next("3.1.2"), Some(section("3.1.3")));
    assert_eq!(engine.next("3.1.3"), None);
    assert!(!engine.navigation_state("3.1.3").can_go_next);

    engine.store().append(GroupType::Aisd, sample_group(GroupType::Aisd, 0));
    assert_eq!(engine.next("3.1.3"), Some(section("3.1.4")));
    assert_eq!(engine.next("3.1.4"), Some(section("3.1.4.A")));
    assert_eq!(engine.next("3.1.4.A"), Some(section("3.1.4.A.1.1")));
    assert_eq!(engine.previous("3.1.4.A.1.1"), Some(section("3.1.4.A")));
    assert!(engine.is_section_available("3.1.4.A.1.16"));
    assert!(!engine.is_section_available("3.1.4.B.1.1"));
    assert!(!engine.is_section_available("not..an.id"));
}

#[test]
fn access_state_reports_reason() {
    let (engine, _) = engine_with(EngineConfig::default(), FieldSnapshot::new());
    engine.store().append(GroupType::Aisi, inactive_group(GroupType::Aisi, 0));
    let state = engine.section_access_state("3.1.4.B.1.2").unwrap();
    assert!(!state.is_available);
    assert_eq!(state.reason, "no active CCPP selected for AISI");
    assert!(engine.section_access_state("").is_none());
}

#[test]
fn first_group_policy_from_toml() {
    let config = EngineConfig::from_toml_str("active_policy = \"first_group\"").unwrap();
    assert_eq!(config.active_policy, ActiveCcppPolicy::FirstGroup);
    let (engine, _) = engine_with(config, FieldSnapshot::new());
    engine.store().append(GroupType::Aisd, inactive_group(GroupType::Aisd, 0));
    engine.store().append(GroupType::Aisd, sample_group(GroupType::Aisd, 1));
    assert!(!engine.is_section_available("3.1.4.A.2.1"));
    engine
        .store()
        .set_active_ccpp(GroupType::Aisd, ["A001"], 0)
        .unwrap();
    assert!(engine.is_section_available("3.1.4.A.2.1"));
}

#[test]
fn table_numbers_shift_only_after_the_aisd_block() {
    let fields = Arc::new(MemoryFieldStore::new(FieldSnapshot::new()));
    let engine = ReportEngine::builder(EngineConfig::default())
        .with_catalog(small_catalog())
        .build(Arc::new(MemoryStorage::new()), fields)
        .unwrap();
    assert_eq!(engine.global_table_number("3.1.3", 0).as_deref(), Some("3.1"));
    assert_eq!(engine.global_table_number("3.1.4.B.1.1", 1).as_deref(), Some("3.4"));

    engine.store().append(GroupType::Aisd, sample_group(GroupType::Aisd, 0));
    engine.store().append(GroupType::Aisd, sample_group(GroupType::Aisd, 1));
    assert_eq!(engine.global_table_number("3.1.3", 0).as_deref(), Some("3.1"));
    assert_eq!(engine.global_table_number("3.1.4.A.2.1", 0).as_deref(), Some("3.3"));
    assert_eq!(engine.global_table_number("3.1.4.B.1.1", 1).as_deref(), Some("3.5"));
    assert_eq!(engine.global_table_number("3.1.4.A.3.1", 0), None);
}

#[test]
fn photo_numbers_and_renumbering() {
    let data = snapshot(&[
        ("fotoA1Imagen_A1", "1.png"),
        ("fotoA3Imagen_A1", "3.png"),
        ("fotoA3Numero_A1", "3.7"),
        ("fotoBImagen_A1", "b.png"),
    ]);
    let fields = Arc::new(MemoryFieldStore::new(data));
    let engine = ReportEngine::builder(EngineConfig::default())
        .with_catalog(small_catalog())
        .with_auto_renumber(false)
        .build(Arc::new(MemoryStorage::new()), fields.clone())
        .unwrap();
    engine.store().append(GroupType::Aisd, sample_group(GroupType::Aisd, 0));

    assert_eq!(
        engine.global_photo_number("3.1.4.A.1.1", 0, "fotoB", "_A1").as_deref(),
        Some("3.3")
    );
    let preview = engine.renumber_preview();
    assert_eq!(preview.assigned(), 3);
    assert_eq!(preview.len(), 3);

    assert!(engine.renumber_now());
    assert_eq!(fields.get("fotoA1Numero_A1"), Some(Value::from("3.1")));
    assert_eq!(fields.get("fotoA3Numero_A1"), Some(Value::from("3.2")));
    assert_eq!(fields.get("fotoBNumero_A1"), Some(Value::from("3.3")));
    assert!(engine.renumber_preview().is_empty());
}

#[tokio::test(start_paused = true)]
async fn image_edits_trigger_debounced_renumber() {
    let config = EngineConfig::default().with_renumber_debounce(Duration::from_millis(300));
    let fields = Arc::new(MemoryFieldStore::new(FieldSnapshot::new()));
    let engine = ReportEngine::builder(config)
        .with_catalog(small_catalog())
        .build(Arc::new(MemoryStorage::new()), fields.clone())
        .unwrap();
    engine.store().append(GroupType::Aisd, sample_group(GroupType::Aisd, 0));

    fields.write("fotoA1Imagen_A1", Value::from("a.png"));
    tokio::time::sleep(Duration::from_millis(100)).await;
    fields.write("fotoA2Imagen_A1", Value::from("b.png"));
    fields.write("parrafoIntro_A1", Value::from("texto"));
    assert!(engine.scheduler().pending());

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(engine.scheduler().completed_runs(), 1);
    assert_eq!(fields.get("fotoA2Numero_A1"), Some(Value::from("3.2")));
    assert!(!engine.scheduler().pending());
}

#[test]
fn strict_references_block_navigation_on_orphaned_fields() {
    let config = EngineConfig::default().with_strict_field_references(true);
    let (engine, fields) = engine_with(config, FieldSnapshot::new());
    engine.store().append(GroupType::Aisd, sample_group(GroupType::Aisd, 0));
    assert_eq!(engine.next("3.1.1"), Some(section("3.1.2")));

    fields.write("tablaPoblacion_A3", Value::from("huérfano"));
    assert_eq!(engine.next("3.1.1"), None);
}

#[test]
fn watch_tracks_group_changes() {
    let (engine, _) = engine_with(EngineConfig::default(), FieldSnapshot::new());
    let watch = engine.watch_section_access("3.1.4").unwrap();
    assert!(!watch.current().is_available);
    engine.store().append(GroupType::Aisi, sample_group(GroupType::Aisi, 0));
    assert!(watch.current().is_available);

    let err = engine.watch_section_access("3..4").unwrap_err();
    assert!(matches!(err, EngineError::SectionId(_)));
}

#[test]
fn configuration_survives_dispose_and_reload() {
    let storage = Arc::new(MemoryStorage::new());
    let config = EngineConfig::default()
        .with_storage_key("doc-7")
        .with_aisi_layout(AisiLayout::Legacy);
    let fields: Arc<MemoryFieldStore> = Arc::new(MemoryFieldStore::default());
    let engine = ReportEngine::new(config.clone(), storage.clone(), fields.clone()).unwrap();
    engine.store().append(GroupType::Aisd, sample_group(GroupType::Aisd, 0));
    engine.store().append(GroupType::Aisi, sample_group(GroupType::Aisi, 0));
    let saved = engine.dispose();

    let reloaded = ReportEngine::new(config, storage.clone(), fields).unwrap();
    assert_eq!(reloaded.store().snapshot(), saved);
    assert!(storage.get("doc-7").is_some());
    assert_eq!(reloaded.all_available_sections().last(), Some(&section("3.1.4.B.1.9")));
}

#[test]
fn dispose_releases_the_field_store() {
    let fields = Arc::new(MemoryFieldStore::default());
    let engine = ReportEngine::new(EngineConfig::default(), Arc::new(MemoryStorage::new()), fields.clone()).unwrap();
    assert_eq!(fields.listener_count(), 1);
    assert!(Arc::strong_count(&fields) > 1);

    engine.dispose();
    assert_eq!(fields.listener_count(), 0);
    assert_eq!(Arc::strong_count(&fields), 1);
}

#[test]
fn dropped_section_watches_do_not_accumulate() {
    let (engine, _) = engine_with(EngineConfig::default(), FieldSnapshot::new());
    for _ in 0..5 {
        drop(engine.watch_section_access("3.1.4").unwrap());
    }
    engine.store().append(GroupType::Aisd, sample_group(GroupType::Aisd, 0));
    assert_eq!(engine.store().subscriber_count(), 0);
}

#[test]
fn huge_local_index_yields_no_number() {
    let (engine, _) = engine_with(EngineConfig::default(), FieldSnapshot::new());
    assert_eq!(engine.global_table_number("3.1.4", u32::MAX), None);
    assert_eq!(engine.global_photo_number("3.1.1", u32::MAX, "fotoUbicacion", ""), None);
}

#[test]
fn persisted_configuration_drives_navigation() {
    let raw = encode_config(&config_with(2, 1)).unwrap();
    let storage = Arc::new(MemoryStorage::with_entry(DEFAULT_STORAGE_KEY, raw));
    let engine = ReportEngine::new(EngineConfig::default(), storage, Arc::new(MemoryFieldStore::default())).unwrap();
    let sections = engine.all_available_sections();
    assert!(sections.contains(&section("3.1.4.A.2.16")));
    assert_eq!(sections.last(), Some(&section("3.1.4.B.1.16")));
}

#[test]
fn policies_disagree_on_second_aisd_group() {
    let store = memory_store(config_with_inactive_first_aisd());
    let catalog = Arc::new(SectionCatalog::standard(AisiLayout::Current));
    for (policy, expected) in [(ActiveCcppPolicy::AnyGroup, true), (ActiveCcppPolicy::FirstGroup, false)] {
        let access = AccessControl::new(Arc::clone(&catalog), policy);
        let watch = access.watch(&store, section("3.1.4.A.2.1"));
        assert_eq!(watch.current().is_available, expected);
    }
}

#[test]
fn unknown_active_ccpp_blocks_navigation_when_centers_are_known() {
    let centers = sample_centers();
    let engine = ReportEngine::builder(EngineConfig::default())
        .with_centers(Arc::new(PopulatedCenterIndex::new(centers.clone())))
        .build(Arc::new(MemoryStorage::new()), Arc::new(MemoryFieldStore::default()))
        .unwrap();
    engine
        .store()
        .append(GroupType::Aisd, Group::from_centers("Cahuacho", GroupType::Aisd, &centers));
    assert_eq!(engine.next("3.1.1"), Some(section("3.1.2")));

    engine.store().append(GroupType::Aisd, sample_group(GroupType::Aisd, 1));
    assert_eq!(engine.next("3.1.1"), None);
}
