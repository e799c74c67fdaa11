//! Product catalog domain module.
//!
//! This crate contains the catalog shape and its mapping rules, implemented as
//! deterministic domain logic (no IO, no network, no storage).

pub mod document;
pub mod product;

pub use document::{decode_catalog, encode_catalog, DEFAULT_CATALOG_PATH};
pub use product::{parse_categories, Catalog, Money, Product, ProductId, ProductRow};
