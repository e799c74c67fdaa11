//! Catalog loading entry point.
//!
//! `CatalogLoader::load_into` is the only operation that replaces the shared
//! catalog: it takes the cell's reload guard, fetches from exactly one source,
//! and swaps the result in only if the fetch succeeded. There is no fallback
//! to another source on failure.

use tracing::{info, instrument, warn};

use crate::config::{CatalogSourceConfig, ConfigError, SourceKind};
use crate::error::CatalogLoadError;
use crate::gcp::GcpClientConfig;
use crate::sources::{build_source, CatalogSource};
use crate::state::CatalogCell;

/// Outcome of a successful load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadReport {
    pub source: SourceKind,
    pub products: usize,
    pub generation: u64,
}

pub struct CatalogLoader {
    source: Box<dyn CatalogSource>,
}

impl core::fmt::Debug for CatalogLoader {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CatalogLoader")
            .field("source", &self.source.kind())
            .finish()
    }
}

impl CatalogLoader {
    pub fn new(source: impl CatalogSource + 'static) -> Self {
        Self {
            source: Box::new(source),
        }
    }

    /// Build the loader for a source selected at startup.
    pub fn from_config(
        config: CatalogSourceConfig,
        gcp: &GcpClientConfig,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            source: build_source(config, gcp)?,
        })
    }

    pub fn source_kind(&self) -> SourceKind {
        self.source.kind()
    }

    /// Load the catalog and replace the cell's contents with it.
    ///
    /// On error the cell keeps whatever it held before the call.
    #[instrument(skip_all, fields(source = %self.source.kind()), err)]
    pub async fn load_into(&self, cell: &CatalogCell) -> Result<LoadReport, CatalogLoadError> {
        let guard = cell.begin_reload().await;

        let catalog = self.source.fetch().await?;
        if let Err(err) = catalog.check_unique_ids() {
            warn!(error = %err, "catalog contains duplicate product ids");
        }

        let products = catalog.len();
        let snapshot = guard.commit(catalog, self.source.kind());
        info!(products, generation = snapshot.generation, "catalog replaced");

        Ok(LoadReport {
            source: self.source.kind(),
            products,
            generation: snapshot.generation,
        })
    }
}
