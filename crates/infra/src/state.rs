//! Shared, swap-on-success catalog state.
//!
//! Readers take an `Arc` snapshot and are never blocked by a reload. Writers
//! first take the reload guard, which serialises reloads for the whole
//! fetch-then-swap sequence; the swap itself replaces the snapshot in one step.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, MutexGuard};

use productcatalog_products::Catalog;

use crate::config::SourceKind;

/// Immutable view of one loaded catalog.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogSnapshot {
    pub catalog: Catalog,
    /// `None` until the first successful load.
    pub source: Option<SourceKind>,
    pub loaded_at: Option<DateTime<Utc>>,
    /// Number of successful loads so far.
    pub generation: u64,
}

/// Owned catalog slot passed by reference to the loader.
#[derive(Debug, Default)]
pub struct CatalogCell {
    current: RwLock<Arc<CatalogSnapshot>>,
    reload: Mutex<()>,
}

impl CatalogCell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current catalog. Cheap; clones an `Arc`.
    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        match self.current.read() {
            Ok(current) => current.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Wait for exclusive reload rights. Released when the guard drops.
    pub async fn begin_reload(&self) -> ReloadGuard<'_> {
        ReloadGuard {
            cell: self,
            _lock: self.reload.lock().await,
        }
    }

    fn swap(&self, catalog: Catalog, source: SourceKind) -> Arc<CatalogSnapshot> {
        let mut current = match self.current.write() {
            Ok(current) => current,
            Err(poisoned) => poisoned.into_inner(),
        };
        let next = Arc::new(CatalogSnapshot {
            catalog,
            source: Some(source),
            loaded_at: Some(Utc::now()),
            generation: current.generation + 1,
        });
        *current = next.clone();
        next
    }
}

/// Exclusive right to replace the catalog.
///
/// Dropping the guard without committing leaves the current catalog untouched.
#[derive(Debug)]
pub struct ReloadGuard<'a> {
    cell: &'a CatalogCell,
    _lock: MutexGuard<'a, ()>,
}

impl ReloadGuard<'_> {
    /// Replace the catalog wholesale and release the guard.
    pub fn commit(self, catalog: Catalog, source: SourceKind) -> Arc<CatalogSnapshot> {
        self.cell.swap(catalog, source)
    }
}
