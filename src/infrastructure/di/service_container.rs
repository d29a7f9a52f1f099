//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::sync::Arc;

use tracing::debug;

use crate::application::services::PickerService;
use crate::config::Settings;
use crate::infrastructure::source::{CachingTaxonomySource, FileTaxonomySource};
use crate::infrastructure::store::JsonSelectionStore;
use crate::infrastructure::traits::{
    AnalyticsSink, FileSystem, NoopAnalytics, RealFileSystem, TaxonomySource, TracingAnalytics,
};
use crate::infrastructure::InfraResult;

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    /// Analytics destination
    pub analytics: Arc<dyn AnalyticsSink>,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> Self {
        let analytics: Arc<dyn AnalyticsSink> = if settings.analytics.enabled {
            Arc::new(TracingAnalytics)
        } else {
            Arc::new(NoopAnalytics)
        };
        Self::with_deps(settings, Arc::new(RealFileSystem), analytics)
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(
        settings: Settings,
        fs: Arc<dyn FileSystem>,
        analytics: Arc<dyn AnalyticsSink>,
    ) -> Self {
        Self {
            settings: Arc::new(settings),
            fs,
            analytics,
        }
    }

    /// File-backed taxonomy, loaded from `settings.taxonomy_file`.
    pub fn file_source(&self) -> InfraResult<FileTaxonomySource> {
        FileTaxonomySource::load(
            self.fs.as_ref(),
            &self.settings.taxonomy_file,
            self.settings.page_size,
        )
    }

    /// Taxonomy source used by pickers: the file source behind a children cache.
    pub fn taxonomy_source(&self) -> InfraResult<Arc<dyn TaxonomySource>> {
        let inner: Arc<dyn TaxonomySource> = Arc::new(self.file_source()?);
        Ok(Arc::new(CachingTaxonomySource::new(inner)))
    }

    pub fn selection_store(&self) -> JsonSelectionStore {
        JsonSelectionStore::new(
            Arc::clone(&self.fs),
            self.settings.selection_file.clone(),
        )
    }

    /// Open a picker seeded from the saved selection, with the tier-1 list loaded.
    pub async fn picker(&self, edit_mode: bool) -> InfraResult<PickerService> {
        let store = self.selection_store();
        let initial = store.load()?;
        debug!(
            "opening picker: {} saved paths from {}",
            initial.len(),
            store.path().display()
        );

        let mut options = self.settings.picker_options();
        options.edit_mode |= edit_mode;

        let picker = PickerService::open(
            options,
            initial,
            self.taxonomy_source()?,
            Arc::new(store),
            Arc::clone(&self.analytics),
        )
        .await?;
        Ok(picker)
    }
}
