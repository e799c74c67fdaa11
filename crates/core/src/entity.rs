//! Entity trait: things a catalog tells apart by identifier alone.

use std::collections::HashSet;

use crate::error::{DomainError, DomainResult};

/// An item whose identity is its identifier, whatever its other fields say.
pub trait Entity {
    /// Identifier type; printable so conflicts can name it.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug + core::fmt::Display;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}

/// Fail with `Conflict` on the first identifier seen twice, in iteration order.
pub fn ensure_unique_ids<'a, E, I>(entities: I) -> DomainResult<()>
where
    E: Entity + 'a,
    I: IntoIterator<Item = &'a E>,
{
    let mut seen = HashSet::new();
    for entity in entities {
        if !seen.insert(entity.id()) {
            return Err(DomainError::conflict(format!(
                "duplicate id '{}'",
                entity.id()
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Sku(String);

    impl Entity for Sku {
        type Id = String;

        fn id(&self) -> &String {
            &self.0
        }
    }

    #[test]
    fn distinct_ids_pass() {
        let items = [Sku("A".into()), Sku("B".into())];
        assert!(ensure_unique_ids(&items).is_ok());
        assert!(ensure_unique_ids::<Sku, _>(&[]).is_ok());
    }

    #[test]
    fn first_repeated_id_is_reported() {
        let items = [Sku("A".into()), Sku("B".into()), Sku("B".into()), Sku("A".into())];
        assert_eq!(
            ensure_unique_ids(&items),
            Err(DomainError::Conflict("duplicate id 'B'".to_string()))
        );
    }
}
