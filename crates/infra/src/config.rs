//! Catalog source configuration.
//!
//! The source is chosen once, at startup, from environment variables. The
//! selection is strict priority with no fallback between sources:
//!
//! 1. `ALLOYDB_CLUSTER_NAME` non-empty: managed cluster
//! 2. `MYSQL_HOST` non-empty: conventional server
//! 3. otherwise: local catalog document

use std::num::ParseIntError;
use std::path::PathBuf;

use thiserror::Error;

use productcatalog_products::DEFAULT_CATALOG_PATH;

use crate::gcp::{InstanceUri, SecretVersionName};

pub const ENV_PROJECT_ID: &str = "PROJECT_ID";
pub const ENV_REGION: &str = "REGION";
pub const ENV_ALLOYDB_CLUSTER_NAME: &str = "ALLOYDB_CLUSTER_NAME";
pub const ENV_ALLOYDB_INSTANCE_NAME: &str = "ALLOYDB_INSTANCE_NAME";
pub const ENV_ALLOYDB_DATABASE_NAME: &str = "ALLOYDB_DATABASE_NAME";
pub const ENV_ALLOYDB_TABLE_NAME: &str = "ALLOYDB_TABLE_NAME";
pub const ENV_ALLOYDB_SECRET_NAME: &str = "ALLOYDB_SECRET_NAME";

pub const ENV_MYSQL_HOST: &str = "MYSQL_HOST";
pub const ENV_MYSQL_PORT: &str = "MYSQL_PORT";
pub const ENV_MYSQL_USER: &str = "MYSQL_USER";
pub const ENV_MYSQL_PASSWORD: &str = "MYSQL_PASSWORD";
pub const ENV_MYSQL_DATABASE: &str = "MYSQL_DATABASE";

/// Secret version the managed path always reads.
pub const LATEST_SECRET_VERSION: &str = "latest";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid MYSQL_PORT '{value}': {source}")]
    InvalidPort {
        value: String,
        #[source]
        source: ParseIntError,
    },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// Which strategy produced (or will produce) a catalog.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum SourceKind {
    LocalFile,
    ManagedDb,
    ConventionalDb,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::LocalFile => "local_file",
            SourceKind::ManagedDb => "managed_db",
            SourceKind::ConventionalDb => "conventional_db",
        }
    }
}

impl core::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Local catalog document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFileConfig {
    pub path: PathBuf,
}

impl Default for LocalFileConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_CATALOG_PATH),
        }
    }
}

impl LocalFileConfig {
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }
}

/// Managed (AlloyDB) cluster coordinates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManagedDbConfig {
    pub project_id: String,
    pub region: String,
    pub cluster: String,
    pub instance: String,
    pub database: String,
    pub table: String,
    pub secret: String,
}

impl ManagedDbConfig {
    pub fn instance_uri(&self) -> InstanceUri {
        InstanceUri {
            project: self.project_id.clone(),
            region: self.region.clone(),
            cluster: self.cluster.clone(),
            instance: self.instance.clone(),
        }
    }

    pub fn secret_version(&self) -> SecretVersionName {
        SecretVersionName {
            project: self.project_id.clone(),
            secret: self.secret.clone(),
            version: LATEST_SECRET_VERSION.to_string(),
        }
    }
}

/// Conventional (MySQL) server.
#[derive(Clone, PartialEq, Eq)]
pub struct ConventionalDbConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl ConventionalDbConfig {
    pub const DEFAULT_PORT: u16 = 3306;
    pub const DEFAULT_USER: &'static str = "root";
    pub const DEFAULT_DATABASE: &'static str = "productcatalog";

    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: Self::DEFAULT_PORT,
            user: Self::DEFAULT_USER.to_string(),
            password: String::new(),
            database: Self::DEFAULT_DATABASE.to_string(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.user = user.into();
        self.password = password.into();
        self
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }
}

impl core::fmt::Debug for ConventionalDbConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ConventionalDbConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .finish()
    }
}

/// Tagged source selection, built once and handed to the loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSourceConfig {
    LocalFile(LocalFileConfig),
    ManagedDb(ManagedDbConfig),
    ConventionalDb(ConventionalDbConfig),
}

impl CatalogSourceConfig {
    pub fn kind(&self) -> SourceKind {
        match self {
            CatalogSourceConfig::LocalFile(_) => SourceKind::LocalFile,
            CatalogSourceConfig::ManagedDb(_) => SourceKind::ManagedDb,
            CatalogSourceConfig::ConventionalDb(_) => SourceKind::ConventionalDb,
        }
    }

    /// Select a source from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Select a source from an arbitrary key lookup.
    ///
    /// Empty values are treated the same as missing ones.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(cluster) = get(ENV_ALLOYDB_CLUSTER_NAME) {
            return Ok(CatalogSourceConfig::ManagedDb(ManagedDbConfig {
                project_id: get(ENV_PROJECT_ID).unwrap_or_default(),
                region: get(ENV_REGION).unwrap_or_default(),
                cluster,
                instance: get(ENV_ALLOYDB_INSTANCE_NAME).unwrap_or_default(),
                database: get(ENV_ALLOYDB_DATABASE_NAME).unwrap_or_default(),
                table: get(ENV_ALLOYDB_TABLE_NAME).unwrap_or_default(),
                secret: get(ENV_ALLOYDB_SECRET_NAME).unwrap_or_default(),
            }));
        }

        if let Some(host) = get(ENV_MYSQL_HOST) {
            let mut config = ConventionalDbConfig::new(host);
            if let Some(port) = get(ENV_MYSQL_PORT) {
                config.port = port
                    .parse()
                    .map_err(|source| ConfigError::InvalidPort { value: port, source })?;
            }
            if let Some(user) = get(ENV_MYSQL_USER) {
                config.user = user;
            }
            config.password = get(ENV_MYSQL_PASSWORD).unwrap_or_default();
            if let Some(database) = get(ENV_MYSQL_DATABASE) {
                config.database = database;
            }
            return Ok(CatalogSourceConfig::ConventionalDb(config));
        }

        Ok(CatalogSourceConfig::LocalFile(LocalFileConfig::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn nothing_configured_selects_local_file() {
        let config = CatalogSourceConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, CatalogSourceConfig::LocalFile(LocalFileConfig::default()));
        assert_eq!(config.kind(), SourceKind::LocalFile);
    }

    #[test]
    fn managed_cluster_takes_precedence_over_mysql() {
        let config = CatalogSourceConfig::from_lookup(lookup(&[
            (ENV_ALLOYDB_CLUSTER_NAME, "catalog-cluster"),
            (ENV_MYSQL_HOST, "mysql.internal"),
        ]))
        .unwrap();

        assert_eq!(config.kind(), SourceKind::ManagedDb);
    }

    #[test]
    fn empty_values_count_as_unset() {
        let config = CatalogSourceConfig::from_lookup(lookup(&[
            (ENV_ALLOYDB_CLUSTER_NAME, ""),
            (ENV_MYSQL_HOST, "mysql.internal"),
        ]))
        .unwrap();
        assert_eq!(config.kind(), SourceKind::ConventionalDb);

        let config =
            CatalogSourceConfig::from_lookup(lookup(&[(ENV_MYSQL_HOST, "")])).unwrap();
        assert_eq!(config.kind(), SourceKind::LocalFile);
    }

    #[test]
    fn managed_config_reads_every_coordinate() {
        let config = CatalogSourceConfig::from_lookup(lookup(&[
            (ENV_PROJECT_ID, "shop-prod"),
            (ENV_REGION, "us-central1"),
            (ENV_ALLOYDB_CLUSTER_NAME, "catalog-cluster"),
            (ENV_ALLOYDB_INSTANCE_NAME, "primary"),
            (ENV_ALLOYDB_DATABASE_NAME, "products"),
            (ENV_ALLOYDB_TABLE_NAME, "catalog_items"),
            (ENV_ALLOYDB_SECRET_NAME, "alloydb-password"),
        ]))
        .unwrap();

        let CatalogSourceConfig::ManagedDb(managed) = config else {
            panic!("Expected ManagedDb");
        };
        assert_eq!(managed.table, "catalog_items");
        assert_eq!(
            managed.instance_uri().to_string(),
            "projects/shop-prod/locations/us-central1/clusters/catalog-cluster/instances/primary"
        );
        assert_eq!(
            managed.secret_version().to_string(),
            "projects/shop-prod/secrets/alloydb-password/versions/latest"
        );
    }

    #[test]
    fn mysql_defaults_apply_when_unset() {
        let config =
            CatalogSourceConfig::from_lookup(lookup(&[(ENV_MYSQL_HOST, "mysql.internal")])).unwrap();

        let CatalogSourceConfig::ConventionalDb(mysql) = config else {
            panic!("Expected ConventionalDb");
        };
        assert_eq!(mysql.host, "mysql.internal");
        assert_eq!(mysql.port, 3306);
        assert_eq!(mysql.user, "root");
        assert_eq!(mysql.password, "");
        assert_eq!(mysql.database, "productcatalog");
    }

    #[test]
    fn mysql_overrides_are_honoured() {
        let config = CatalogSourceConfig::from_lookup(lookup(&[
            (ENV_MYSQL_HOST, "db"),
            (ENV_MYSQL_PORT, "3307"),
            (ENV_MYSQL_USER, "catalog"),
            (ENV_MYSQL_PASSWORD, "s3cret"),
            (ENV_MYSQL_DATABASE, "shop"),
        ]))
        .unwrap();

        assert_eq!(
            config,
            CatalogSourceConfig::ConventionalDb(
                ConventionalDbConfig::new("db")
                    .with_port(3307)
                    .with_credentials("catalog", "s3cret")
                    .with_database("shop")
            )
        );
    }

    #[test]
    fn non_numeric_port_is_rejected() {
        let err = CatalogSourceConfig::from_lookup(lookup(&[
            (ENV_MYSQL_HOST, "db"),
            (ENV_MYSQL_PORT, "mysql"),
        ]))
        .unwrap_err();

        assert!(matches!(err, ConfigError::InvalidPort { ref value, .. } if value == "mysql"));
    }

    #[test]
    fn debug_output_redacts_password() {
        let config = ConventionalDbConfig::new("db").with_credentials("root", "hunter2");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }
}
