//! Background workers.

pub mod refresher;

pub use refresher::{CatalogRefresher, RefresherHandle};
