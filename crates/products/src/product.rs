use serde::{Deserialize, Deserializer, Serialize};

use productcatalog_core::{ensure_unique_ids, DomainResult, Entity, ValueObject};

/// Product identifier (e.g. `OLJCESPC7Z`). Unique within one catalog load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub String);

impl ProductId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for ProductId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Amount of money: whole `units` plus `nanos` (10^-9) of the currency.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct Money {
    #[serde(alias = "currency_code", deserialize_with = "null_as_default")]
    pub currency_code: String,
    #[serde(deserialize_with = "int_json")]
    pub units: i64,
    #[serde(deserialize_with = "int_json")]
    pub nanos: i32,
}

impl Money {
    pub fn new(currency_code: impl Into<String>, units: i64, nanos: i32) -> Self {
        Self {
            currency_code: currency_code.into(),
            units,
            nanos,
        }
    }
}

impl ValueObject for Money {}

/// Catalog entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct Product {
    #[serde(deserialize_with = "null_as_default")]
    pub id: ProductId,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(deserialize_with = "null_as_default")]
    pub picture: String,
    #[serde(alias = "price_usd", deserialize_with = "null_as_default")]
    pub price_usd: Money,
    #[serde(deserialize_with = "null_as_default")]
    pub categories: Vec<String>,
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Ordered product sequence. Replaced wholesale on every successful load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Catalog {
    #[serde(deserialize_with = "null_as_default")]
    products: Vec<Product>,
}

impl Catalog {
    pub fn new(products: Vec<Product>) -> Self {
        Self { products }
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Product> {
        self.products.iter()
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// First product carrying `id`, in source order.
    pub fn product(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id().as_str() == id)
    }

    pub fn into_products(self) -> Vec<Product> {
        self.products
    }

    /// Reports the first identifier that appears more than once.
    ///
    /// Sources are trusted for shape only; callers decide whether a duplicate
    /// matters.
    pub fn check_unique_ids(&self) -> DomainResult<()> {
        ensure_unique_ids(&self.products)
    }
}

/// One row of the catalog query, in SELECT column order:
/// `id, name, description, picture, price_usd_currency_code, price_usd_units,
/// price_usd_nanos, categories`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductRow {
    pub id: String,
    pub name: String,
    pub description: String,
    pub picture: String,
    pub currency_code: String,
    pub units: i64,
    pub nanos: i32,
    pub categories: String,
}

impl ProductRow {
    pub fn into_product(self) -> Product {
        Product {
            id: ProductId(self.id),
            name: self.name,
            description: self.description,
            picture: self.picture,
            price_usd: Money::new(self.currency_code, self.units, self.nanos),
            categories: parse_categories(&self.categories),
        }
    }
}

/// Lowercases a comma-joined category field and splits it on `,`.
///
/// No trimming and no filtering: `""` yields `[""]`.
pub fn parse_categories(raw: &str) -> Vec<String> {
    raw.to_lowercase().split(',').map(str::to_string).collect()
}

/// Integers arrive as JSON numbers or decimal strings; `null` means zero.
fn int_json<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + TryFrom<i64> + core::str::FromStr,
    <T as TryFrom<i64>>::Error: core::fmt::Display,
    <T as core::str::FromStr>::Err: core::fmt::Display,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(i64),
        Text(String),
    }

    match Option::<Repr>::deserialize(deserializer)? {
        None => Ok(T::default()),
        Some(Repr::Number(n)) => T::try_from(n).map_err(serde::de::Error::custom),
        Some(Repr::Text(s)) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// `null` decodes to the field's zero value, like an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use productcatalog_core::DomainError;

    fn sunglasses_row() -> ProductRow {
        ProductRow {
            id: "OLJCESPC7Z".to_string(),
            name: "Sunglasses".to_string(),
            description: "Add a modern touch to your outfits with these sleek aviator sunglasses."
                .to_string(),
            picture: "/static/img/products/sunglasses.jpg".to_string(),
            currency_code: "USD".to_string(),
            units: 19,
            nanos: 990_000_000,
            categories: "Accessories".to_string(),
        }
    }

    #[test]
    fn row_maps_positionally_into_product() {
        let product = sunglasses_row().into_product();

        assert_eq!(product.id, ProductId::new("OLJCESPC7Z"));
        assert_eq!(product.name, "Sunglasses");
        assert_eq!(product.picture, "/static/img/products/sunglasses.jpg");
        assert_eq!(product.price_usd, Money::new("USD", 19, 990_000_000));
        assert_eq!(product.categories, vec!["accessories".to_string()]);
    }

    #[test]
    fn categories_are_lowercased_and_split_on_comma() {
        assert_eq!(parse_categories("Hot,Cold"), vec!["hot", "cold"]);
    }

    #[test]
    fn empty_categories_yield_single_empty_label() {
        assert_eq!(parse_categories(""), vec![""]);

        let mut row = sunglasses_row();
        row.categories = String::new();
        assert_eq!(row.into_product().categories, vec![String::new()]);
    }

    #[test]
    fn categories_keep_whitespace_and_empty_segments() {
        assert_eq!(parse_categories("Kitchen, Home,,"), vec!["kitchen", " home", "", ""]);
    }

    #[test]
    fn catalog_lookup_returns_first_match_in_source_order() {
        let mut second = sunglasses_row().into_product();
        second.name = "Shadow".to_string();
        let catalog = Catalog::new(vec![sunglasses_row().into_product(), second]);

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.product("OLJCESPC7Z").map(|p| p.name.as_str()), Some("Sunglasses"));
        assert!(catalog.product("missing").is_none());
    }

    #[test]
    fn duplicate_ids_are_reported_as_conflict() {
        let catalog = Catalog::new(vec![
            sunglasses_row().into_product(),
            sunglasses_row().into_product(),
        ]);

        match catalog.check_unique_ids() {
            Err(DomainError::Conflict(msg)) => assert!(msg.contains("OLJCESPC7Z")),
            other => panic!("Expected Conflict, got {other:?}"),
        }
        assert!(Catalog::default().check_unique_ids().is_ok());
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: splitting never loses a segment; count equals commas + 1.
            #[test]
            fn category_count_matches_separator_count(raw in "[A-Za-z ,]{0,40}") {
                let parsed = parse_categories(&raw);
                prop_assert_eq!(parsed.len(), raw.matches(',').count() + 1);
                prop_assert_eq!(parsed.join(","), raw.to_lowercase());
            }

            /// Property: every produced label is already lowercase.
            #[test]
            fn categories_are_always_lowercase(raw in "[A-Za-z0-9 ,]{0,40}") {
                for label in parse_categories(&raw) {
                    prop_assert_eq!(label.to_lowercase(), label);
                }
            }
        }
    }
}
