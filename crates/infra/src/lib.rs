//! Infrastructure layer: catalog sources, shared catalog state, cloud clients.

pub mod config;
pub mod error;
pub mod gcp;
pub mod loader;
pub mod retry;
pub mod sources;
pub mod state;
pub mod workers;

pub use config::{
    CatalogSourceConfig, ConfigError, ConventionalDbConfig, LocalFileConfig, ManagedDbConfig,
    SourceKind,
};
pub use error::CatalogLoadError;
pub use gcp::GcpClientConfig;
pub use loader::{CatalogLoader, LoadReport};
pub use retry::RetryPolicy;
pub use sources::CatalogSource;
pub use state::{CatalogCell, CatalogSnapshot, ReloadGuard};
pub use workers::{CatalogRefresher, RefresherHandle};
