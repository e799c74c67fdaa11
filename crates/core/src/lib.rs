//! `productcatalog-core`: domain building blocks shared by the catalog crates.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod entity;
pub mod error;
pub mod value_object;

pub use entity::{ensure_unique_ids, Entity};
pub use error::{DomainError, DomainResult};
pub use value_object::ValueObject;
