//! Catalog load errors.
//!
//! | Source | Variants |
//! |--------|----------|
//! | local file | `Io`, `Decode` |
//! | managed cluster | `SecretAccess`, `ConnectionSetup`, `PoolSetup`, `Query`, `Scan` |
//! | conventional server | `ConnectionExhausted`, `Query`, `Scan`, `RowIteration` |
//!
//! Every variant keeps its underlying error as `source`. None of them is
//! fatal by itself; the caller decides whether to keep serving the previous
//! catalog.

use std::path::PathBuf;

use thiserror::Error;

use crate::gcp::{DialError, SecretError};

#[derive(Debug, Error)]
pub enum CatalogLoadError {
    #[error("failed to read catalog document {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode catalog document {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to access database secret: {0}")]
    SecretAccess(#[source] SecretError),

    #[error("failed to set up connection to {instance}: {source}")]
    ConnectionSetup {
        instance: String,
        #[source]
        source: DialError,
    },

    #[error("failed to set up connection pool: {0}")]
    PoolSetup(#[source] sqlx::Error),

    #[error("catalog query failed: {0}")]
    Query(#[source] sqlx::Error),

    #[error("failed to scan catalog row {row}: {source}")]
    Scan {
        row: usize,
        #[source]
        source: sqlx::Error,
    },

    #[error("failed to connect after {attempts} attempts: {source}")]
    ConnectionExhausted {
        attempts: u32,
        #[source]
        source: sqlx::Error,
    },

    #[error("error iterating catalog rows after {rows} rows: {source}")]
    RowIteration {
        rows: usize,
        #[source]
        source: sqlx::Error,
    },
}
