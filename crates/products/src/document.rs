//! Canonical text encoding of the catalog (`products.json`).
//!
//! The document is the JSON mapping of the catalog message:
//! lowerCamelCase field names, zero values for absent or `null` fields,
//! unknown fields rejected, and integers accepted either as a number or a
//! string.

use crate::product::Catalog;

/// Default location of the catalog document, relative to the working directory.
pub const DEFAULT_CATALOG_PATH: &str = "products.json";

/// Decode a catalog document.
pub fn decode_catalog(bytes: impl AsRef<[u8]>) -> Result<Catalog, serde_json::Error> {
    serde_json::from_slice(bytes.as_ref())
}

/// Encode a catalog as a pretty-printed document.
pub fn encode_catalog(catalog: &Catalog) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(catalog)
}
