//! Managed Postgres cluster (AlloyDB) source.
//!
//! Sequence per load: secret -> dial -> pool -> one query -> map rows.
//! The pool lives only for the duration of one load and is closed on every
//! path once it exists.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions, PgRow, PgSslMode};
use tracing::{info, instrument, warn};

use productcatalog_products::Catalog;

use crate::config::{ManagedDbConfig, SourceKind};
use crate::error::CatalogLoadError;
use crate::gcp::{ClusterDialer, SecretAccessor};

use super::rows::{collect_products, scan_product_row, select_products};
use super::CatalogSource;

/// Database role used on the managed cluster.
pub const POSTGRES_USER: &str = "postgres";

pub struct ManagedDbSource {
    config: ManagedDbConfig,
    secrets: Arc<dyn SecretAccessor>,
    dialer: Arc<dyn ClusterDialer>,
    max_connections: u32,
    acquire_timeout: Duration,
}

impl core::fmt::Debug for ManagedDbSource {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ManagedDbSource")
            .field("config", &self.config)
            .field("max_connections", &self.max_connections)
            .field("acquire_timeout", &self.acquire_timeout)
            .finish_non_exhaustive()
    }
}

impl ManagedDbSource {
    pub fn new(
        config: ManagedDbConfig,
        secrets: Arc<dyn SecretAccessor>,
        dialer: Arc<dyn ClusterDialer>,
    ) -> Self {
        Self {
            config,
            secrets,
            dialer,
            max_connections: 4,
            acquire_timeout: Duration::from_secs(30),
        }
    }

    /// How long pool setup may spend establishing its first connection.
    pub fn with_acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    async fn connect(&self) -> Result<PgPool, CatalogLoadError> {
        let secret_name = self.config.secret_version();
        let password = self
            .secrets
            .access_secret_version(&secret_name)
            .await
            .map_err(|err| {
                warn!(secret = %secret_name, error = %err, "failed to access secret version");
                CatalogLoadError::SecretAccess(err)
            })?;

        let instance = self.config.instance_uri();
        let target = self.dialer.dial(&instance).await.map_err(|source| {
            warn!(%instance, error = %source, "failed to set up dialer connection");
            CatalogLoadError::ConnectionSetup {
                instance: instance.to_string(),
                source,
            }
        })?;

        let options = PgConnectOptions::new()
            .host(&target.host)
            .port(target.port)
            .username(POSTGRES_USER)
            .password(&password.as_str_lossy())
            .database(&self.config.database)
            .ssl_mode(PgSslMode::Require);

        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .acquire_timeout(self.acquire_timeout)
            .connect_with(options)
            .await
            .map_err(|err| {
                warn!(host = %target.host, port = target.port, error = %err, "failed to set up connection pool");
                CatalogLoadError::PoolSetup(err)
            })
    }

    async fn query_products(&self, pool: &PgPool) -> Result<Catalog, CatalogLoadError> {
        let sql = select_products(&self.config.table);
        let rows = sqlx::query(&sql).fetch_all(pool).await.map_err(|err| {
            warn!(error = %err, "failed to query database");
            CatalogLoadError::Query(err)
        })?;

        collect_products(tokio_stream::iter(rows.into_iter().map(Ok)), |row: PgRow| {
            scan_product_row(&row)
        })
        .await
    }
}

#[async_trait]
impl CatalogSource for ManagedDbSource {
    fn kind(&self) -> SourceKind {
        SourceKind::ManagedDb
    }

    #[instrument(
        skip(self),
        fields(cluster = %self.config.cluster, table = %self.config.table)
    )]
    async fn fetch(&self) -> Result<Catalog, CatalogLoadError> {
        info!("loading catalog from managed cluster");

        let pool = self.connect().await?;
        let result = self.query_products(&pool).await;
        pool.close().await;

        let catalog = result?;
        info!(products = catalog.len(), "parsed product catalog from managed cluster");
        Ok(catalog)
    }
}
