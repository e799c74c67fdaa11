use std::path::PathBuf;

use async_trait::async_trait;
use tracing::{info, instrument, warn};

use productcatalog_products::{decode_catalog, Catalog};

use crate::config::{LocalFileConfig, SourceKind};
use crate::error::CatalogLoadError;

use super::CatalogSource;

/// Reads the catalog document from local storage.
#[derive(Debug, Clone)]
pub struct LocalFileSource {
    path: PathBuf,
}

impl LocalFileSource {
    pub fn new(config: LocalFileConfig) -> Self {
        Self { path: config.path }
    }
}

#[async_trait]
impl CatalogSource for LocalFileSource {
    fn kind(&self) -> SourceKind {
        SourceKind::LocalFile
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn fetch(&self) -> Result<Catalog, CatalogLoadError> {
        info!("loading catalog from local file");

        let bytes = tokio::fs::read(&self.path).await.map_err(|source| {
            warn!(error = %source, "failed to open product catalog file");
            CatalogLoadError::Io {
                path: self.path.clone(),
                source,
            }
        })?;

        let catalog = decode_catalog(&bytes).map_err(|source| {
            warn!(error = %source, "failed to parse product catalog file");
            CatalogLoadError::Decode {
                path: self.path.clone(),
                source,
            }
        })?;

        info!(products = catalog.len(), "parsed product catalog file");
        Ok(catalog)
    }
}
