//! Report engine
//!
//! Wires the group store, access control, navigation and numbering together
//! behind the operations the wizard calls. Every query reads fresh snapshots
//! from the store and the field store; nothing derived is cached.

use crate::config::EngineConfig;
use crate::error::EngineResult;
use lbs_groups::{DocumentValidator, GroupConfigStore, KeyValueStorage, ReferenceValidator};
use lbs_model::{FieldStore, FieldSubscription, PopulatedCenterIndex, SectionId};
use lbs_numbering::{GlobalNumbering, PhotoKey, PhotoRegistry, RenumberPlan, RenumberScheduler};
use lbs_sections::{
    AccessControl, AccessWatch, NavigationState, SectionAccessState, SectionCatalog, SectionNavigator,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Builder for [`ReportEngine`]
pub struct ReportEngineBuilder {
    config: EngineConfig,
    catalog: Option<SectionCatalog>,
    validator: Option<Arc<dyn DocumentValidator>>,
    centers: Option<Arc<PopulatedCenterIndex>>,
    auto_renumber: bool,
}

impl ReportEngineBuilder {
    /// Use a custom catalog instead of the standard layout
    #[must_use]
    pub fn with_catalog(mut self, catalog: SectionCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Use a custom document validator for navigation
    #[must_use]
    pub fn with_validator(mut self, validator: Arc<dyn DocumentValidator>) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Check active CCPP codes against the imported dataset
    #[must_use]
    pub fn with_centers(mut self, centers: Arc<PopulatedCenterIndex>) -> Self {
        self.centers = Some(centers);
        self
    }

    /// Schedule a renumber pass whenever an image field changes (default on)
    #[must_use]
    pub fn with_auto_renumber(mut self, enabled: bool) -> Self {
        self.auto_renumber = enabled;
        self
    }

    /// Load the persisted group configuration and assemble the engine
    ///
    /// # Errors
    /// Returns [`crate::EngineError::Config`] when the configuration is invalid.
    pub fn build(
        self,
        storage: Arc<dyn KeyValueStorage>,
        fields: Arc<dyn FieldStore>,
    ) -> EngineResult<ReportEngine> {
        self.config.validate()?;
        let store = Arc::new(GroupConfigStore::load(storage, self.config.storage_key.clone()));
        let catalog = Arc::new(
            self.catalog
                .unwrap_or_else(|| SectionCatalog::standard(self.config.aisi_layout)),
        );
        let validator = self.validator.unwrap_or_else(|| {
            let mut validator = ReferenceValidator::new(self.config.strict_field_references);
            if let Some(centers) = self.centers {
                validator = validator.with_centers(centers);
            }
            Arc::new(validator)
        });

        let access = AccessControl::new(Arc::clone(&catalog), self.config.active_policy);
        let navigator = SectionNavigator::new(access, validator);
        let numbering = GlobalNumbering::new(catalog, self.config.numbering_prefix.clone());

        let scheduler = {
            let store = Arc::downgrade(&store);
            let fields = Arc::downgrade(&fields);
            let numbering = numbering.clone();
            RenumberScheduler::new(self.config.renumber_debounce(), move || {
                let (Some(store), Some(fields)) = (store.upgrade(), fields.upgrade()) else {
                    return;
                };
                let plan = numbering.renumber_all(store.snapshot().counts(), &fields.snapshot());
                let written = plan.apply(fields.as_ref());
                tracing::debug!(written, "renumber plan applied");
            })
        };

        let disposed = Arc::new(AtomicBool::new(false));
        let field_subscription = self.auto_renumber.then(|| {
            let scheduler = scheduler.clone();
            let disposed = Arc::clone(&disposed);
            fields.subscribe(Box::new(move |key: &str| {
                if disposed.load(Ordering::Acquire) || PhotoKey::parse(key).is_none() {
                    return;
                }
                if let Err(e) = scheduler.schedule() {
                    tracing::debug!(key, error = %e, "photo changed but renumbering not scheduled");
                }
            }))
        });

        tracing::info!(
            storage_key = %self.config.storage_key,
            aisi_layout = ?self.config.aisi_layout,
            policy = ?self.config.active_policy,
            "report engine ready"
        );
        Ok(ReportEngine {
            config: self.config,
            store,
            fields,
            navigator,
            numbering,
            scheduler,
            disposed,
            field_subscription,
        })
    }
}

/// Section access and numbering facade for one document
pub struct ReportEngine {
    config: EngineConfig,
    store: Arc<GroupConfigStore>,
    fields: Arc<dyn FieldStore>,
    navigator: SectionNavigator,
    numbering: GlobalNumbering,
    scheduler: RenumberScheduler,
    disposed: Arc<AtomicBool>,
    field_subscription: Option<FieldSubscription>,
}

impl std::fmt::Debug for ReportEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportEngine")
            .field("config", &self.config)
            .field("scheduler", &self.scheduler)
            .finish_non_exhaustive()
    }
}

impl ReportEngine {
    /// Start building an engine
    #[must_use]
    pub fn builder(config: EngineConfig) -> ReportEngineBuilder {
        ReportEngineBuilder {
            config,
            catalog: None,
            validator: None,
            centers: None,
            auto_renumber: true,
        }
    }

    /// Engine with the standard catalog and default validator
    ///
    /// # Errors
    /// Returns [`crate::EngineError::Config`] when the configuration is invalid.
    pub fn new(
        config: EngineConfig,
        storage: Arc<dyn KeyValueStorage>,
        fields: Arc<dyn FieldStore>,
    ) -> EngineResult<Self> {
        Self::builder(config).build(storage, fields)
    }

    /// Configuration in use
    #[inline]
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Group store for mutations and subscriptions
    #[inline]
    #[must_use]
    pub fn store(&self) -> &GroupConfigStore {
        &self.store
    }

    /// Catalog in use
    #[inline]
    #[must_use]
    pub fn catalog(&self) -> &SectionCatalog {
        self.navigator.catalog()
    }

    /// Renumber scheduler
    #[inline]
    #[must_use]
    pub fn scheduler(&self) -> &RenumberScheduler {
        &self.scheduler
    }

    /// Whether a section can be opened; unparsable ids are not available
    #[must_use]
    pub fn is_section_available(&self, section: &str) -> bool {
        parse(section).is_some_and(|id| {
            self.navigator
                .access()
                .can_access(&self.store.snapshot(), &id)
        })
    }

    /// Access decision for a section
    #[must_use]
    pub fn section_access_state(&self, section: &str) -> Option<SectionAccessState> {
        let id = parse(section)?;
        Some(self.navigator.access().access_state(&self.store.snapshot(), &id))
    }

    /// Push view of a section's access state
    ///
    /// # Errors
    /// Returns [`crate::EngineError::SectionId`] when `section` does not parse.
    pub fn watch_section_access(&self, section: &str) -> EngineResult<AccessWatch> {
        let id: SectionId = section.parse()?;
        Ok(self.navigator.access().watch(&self.store, id))
    }

    /// Accessible sections in document order
    #[must_use]
    pub fn all_available_sections(&self) -> Vec<SectionId> {
        self.navigator.all_available_sections(&self.store.snapshot())
    }

    /// Next accessible non-intro section
    #[must_use]
    pub fn next(&self, current: &str) -> Option<SectionId> {
        let id = parse(current)?;
        self.navigator
            .next(&id, &self.store.snapshot(), &self.fields.snapshot())
    }

    /// Previous accessible non-intro section
    #[must_use]
    pub fn previous(&self, current: &str) -> Option<SectionId> {
        let id = parse(current)?;
        self.navigator
            .previous(&id, &self.store.snapshot(), &self.fields.snapshot())
    }

    /// Wizard button flags; all false for unparsable ids
    #[must_use]
    pub fn navigation_state(&self, current: &str) -> NavigationState {
        parse(current).map_or_else(NavigationState::default, |id| {
            self.navigator
                .navigation_state(&id, &self.store.snapshot(), &self.fields.snapshot())
        })
    }

    /// Global label of table `local` (0-based) in a section
    #[must_use]
    pub fn global_table_number(&self, section: &str, local: u32) -> Option<String> {
        let id = parse(section)?;
        self.numbering
            .global_table_number(self.store.snapshot().counts(), &id, local)
    }

    /// Global label of photo `local` (0-based) of `prefix` under `suffix`
    #[must_use]
    pub fn global_photo_number(
        &self,
        section: &str,
        local: u32,
        prefix: &str,
        suffix: &str,
    ) -> Option<String> {
        let id = parse(section)?;
        let registry = PhotoRegistry::build(&self.fields.snapshot());
        self.numbering.global_photo_number(
            &registry,
            self.store.snapshot().counts(),
            &id,
            local,
            prefix,
            suffix,
        )
    }

    /// Field suffix of a section (`_A2`, or empty)
    #[must_use]
    pub fn group_field_prefix(&self, section: &str) -> String {
        parse(section)
            .map(|id| lbs_sections::group_field_prefix(&id))
            .unwrap_or_default()
    }

    /// Debounced renumber request
    ///
    /// # Errors
    /// Returns [`crate::EngineError::Scheduler`] outside a Tokio runtime.
    pub fn schedule_renumber(&self) -> EngineResult<()> {
        self.scheduler.schedule()?;
        Ok(())
    }

    /// Run a renumber pass now unless one is executing
    pub fn renumber_now(&self) -> bool {
        self.scheduler.run_now()
    }

    /// What a renumber pass would write, without writing
    #[must_use]
    pub fn renumber_preview(&self) -> RenumberPlan {
        self.numbering
            .renumber_all(self.store.snapshot().counts(), &self.fields.snapshot())
    }

    /// End the engine's lifecycle
    ///
    /// Cancels a pending renumber, detaches from the field store and disposes
    /// the group store. Returns the last group configuration.
    pub fn dispose(self) -> lbs_model::GroupConfig {
        self.disposed.store(true, Ordering::Release);
        if let Some(subscription) = self.field_subscription {
            self.fields.unsubscribe(subscription);
        }
        self.scheduler.cancel();
        let config = match Arc::try_unwrap(self.store) {
            Ok(store) => store.dispose(),
            Err(shared) => {
                tracing::warn!("group store still in use, returning snapshot without disposing");
                shared.snapshot()
            }
        };
        tracing::info!("report engine disposed");
        config
    }
}

fn parse(section: &str) -> Option<SectionId> {
    match section.parse() {
        Ok(id) => Some(id),
        Err(e) => {
            tracing::debug!(section, error = %e, "ignoring unparsable section id");
            None
        }
    }
}
