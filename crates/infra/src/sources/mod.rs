//! Catalog sources.
//!
//! Each source is a leaf: it fetches a complete `Catalog` or fails, and never
//! touches shared state. Replacement is the loader's job.

use std::sync::Arc;

use async_trait::async_trait;

use productcatalog_products::Catalog;

use crate::config::{CatalogSourceConfig, ConfigError, SourceKind};
use crate::error::CatalogLoadError;
use crate::gcp::{AlloyDbDialer, GcpClientConfig, SecretManagerClient};

pub mod conventional_db;
pub mod local_file;
pub mod managed_db;
pub mod rows;

pub use conventional_db::ConventionalDbSource;
pub use local_file::LocalFileSource;
pub use managed_db::ManagedDbSource;

/// A strategy that produces a complete catalog.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    fn kind(&self) -> SourceKind;

    async fn fetch(&self) -> Result<Catalog, CatalogLoadError>;
}

#[async_trait]
impl<S> CatalogSource for Arc<S>
where
    S: CatalogSource + ?Sized,
{
    fn kind(&self) -> SourceKind {
        (**self).kind()
    }

    async fn fetch(&self) -> Result<Catalog, CatalogLoadError> {
        (**self).fetch().await
    }
}

/// Build the concrete source for a configuration.
pub fn build_source(
    config: CatalogSourceConfig,
    gcp: &GcpClientConfig,
) -> Result<Box<dyn CatalogSource>, ConfigError> {
    Ok(match config {
        CatalogSourceConfig::LocalFile(local) => Box::new(LocalFileSource::new(local)),
        CatalogSourceConfig::ManagedDb(managed) => {
            let secrets = SecretManagerClient::new(gcp).map_err(ConfigError::HttpClient)?;
            let dialer = AlloyDbDialer::new(gcp).map_err(ConfigError::HttpClient)?;
            Box::new(ManagedDbSource::new(managed, Arc::new(secrets), Arc::new(dialer)))
        }
        CatalogSourceConfig::ConventionalDb(conventional) => {
            Box::new(ConventionalDbSource::new(conventional))
        }
    })
}
