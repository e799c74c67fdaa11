//! Conventional MySQL server source.
//!
//! Connection phase: `Attempting(1) -> Attempting(n+1) | Connected | Exhausted`,
//! driven by the injected `RetryPolicy` (10 attempts, 1s doubling by default).
//! A connection only counts once it answers a ping.

use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection, MySqlRow};
use sqlx::{Connection, Executor};
use tracing::{debug, info, instrument};

use productcatalog_products::Catalog;

use crate::config::{ConventionalDbConfig, SourceKind};
use crate::error::CatalogLoadError;
use crate::retry::{retry_with_backoff, RetryPolicy};

use super::rows::{collect_products, scan_product_row, select_products};
use super::CatalogSource;

/// Table read on the conventional server. Not configurable.
pub const PRODUCTS_TABLE: &str = "products";

#[derive(Debug, Clone)]
pub struct ConventionalDbSource {
    config: ConventionalDbConfig,
    retry: RetryPolicy,
}

impl ConventionalDbSource {
    pub fn new(config: ConventionalDbConfig) -> Self {
        Self {
            config,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    fn connect_options(&self) -> MySqlConnectOptions {
        MySqlConnectOptions::new()
            .host(&self.config.host)
            .port(self.config.port)
            .username(&self.config.user)
            .password(&self.config.password)
            .database(&self.config.database)
            .charset("utf8mb4")
    }

    async fn connect(&self) -> Result<MySqlConnection, CatalogLoadError> {
        let options = self.connect_options();

        retry_with_backoff(&self.retry, "mysql_connect", |attempt| {
            let options = options.clone();
            async move {
                debug!(attempt, "connecting to MySQL");
                let mut conn = MySqlConnection::connect_with(&options).await?;
                let ping = conn.ping().await;
                if let Err(err) = ping {
                    close_quietly(conn).await;
                    return Err(err);
                }
                Ok(conn)
            }
        })
        .await
        .map_err(|exhausted| CatalogLoadError::ConnectionExhausted {
            attempts: exhausted.attempts,
            source: exhausted.last_error,
        })
    }
}

async fn close_quietly(conn: MySqlConnection) {
    if let Err(err) = conn.close().await {
        debug!(error = %err, "MySQL connection did not close cleanly");
    }
}

/// Stream the catalog rows off an open connection.
async fn query_products<'c, E>(executor: E) -> Result<Catalog, CatalogLoadError>
where
    E: Executor<'c, Database = sqlx::MySql>,
{
    let sql = select_products(PRODUCTS_TABLE);
    collect_products(executor.fetch(sqlx::query(&sql)), |row: MySqlRow| {
        scan_product_row(&row)
    })
    .await
}

#[async_trait]
impl CatalogSource for ConventionalDbSource {
    fn kind(&self) -> SourceKind {
        SourceKind::ConventionalDb
    }

    #[instrument(
        skip(self),
        fields(host = %self.config.host, port = self.config.port, database = %self.config.database)
    )]
    async fn fetch(&self) -> Result<Catalog, CatalogLoadError> {
        info!("loading catalog from MySQL");

        let mut conn = self.connect().await?;
        info!("connected to MySQL");

        let result = query_products(&mut conn).await;
        close_quietly(conn).await;

        let catalog = result?;
        info!(products = catalog.len(), "parsed product catalog from MySQL");
        Ok(catalog)
    }
}
