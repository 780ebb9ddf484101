//! Property registry: dense, append-only storage of property records.
//!
//! Ids are assigned sequentially from zero and never reused; records are
//! never removed, only flagged delisted or sold.

use estatemesh_types::{Identity, Listing, MarketError, Property, PropertyId, Result, Timestamp};

#[derive(Debug, Clone, Default)]
pub struct PropertyRegistry {
    properties: Vec<Property>,
}

impl PropertyRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new listed property and return its id.
    pub fn create(&mut self, seller: Identity, listing: Listing, now: Timestamp) -> PropertyId {
        let id = PropertyId(self.properties.len() as u64);
        self.properties
            .push(Property::from_listing(id, seller, listing, now));
        id
    }

    /// The id the next [`Self::create`] will assign.
    #[must_use]
    pub fn next_id(&self) -> PropertyId {
        PropertyId(self.properties.len() as u64)
    }

    /// # Errors
    /// `PropertyNotFound` if `id` was never assigned.
    pub fn get(&self, id: PropertyId) -> Result<&Property> {
        self.properties
            .get(id.index())
            .ok_or(MarketError::PropertyNotFound(id))
    }

    /// # Errors
    /// `PropertyNotFound` if `id` was never assigned.
    pub fn get_mut(&mut self, id: PropertyId) -> Result<&mut Property> {
        self.properties
            .get_mut(id.index())
            .ok_or(MarketError::PropertyNotFound(id))
    }

    /// Fetch a property for a seller-only operation.
    ///
    /// # Errors
    /// `PropertyNotFound`, or `Unauthorized` if `caller` is not the seller.
    pub fn require_seller(&mut self, caller: Identity, id: PropertyId) -> Result<&mut Property> {
        let property = self.get_mut(id)?;
        if !property.is_seller(caller) {
            return Err(MarketError::unauthorized(format!(
                "{caller} is not the seller of {id}"
            )));
        }
        Ok(property)
    }

    /// Overwrite a record with a copy captured before a failed operation.
    /// Records past the current end are ignored.
    pub fn restore(&mut self, property: Property) {
        if let Some(slot) = self.properties.get_mut(property.id.index()) {
            *slot = property;
        }
    }

    /// Drop records at or after `len`. Used to undo a failed listing.
    pub fn truncate(&mut self, len: usize) {
        self.properties.truncate(len);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Property> {
        self.properties.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_dense_from_zero() {
        let mut registry = PropertyRegistry::new();
        let seller = Identity::new();
        assert!(registry.is_empty());
        assert_eq!(registry.create(seller, Listing::simple(1, "a"), 0), PropertyId(0));
        assert_eq!(registry.create(seller, Listing::simple(2, "b"), 0), PropertyId(1));
        assert_eq!(registry.next_id(), PropertyId(2));
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get(PropertyId(1)).unwrap().price, 2);
    }

    #[test]
    fn unknown_id_not_found() {
        let registry = PropertyRegistry::new();
        assert!(matches!(
            registry.get(PropertyId(0)),
            Err(MarketError::PropertyNotFound(_))
        ));
    }

    #[test]
    fn require_seller_rejects_others() {
        let mut registry = PropertyRegistry::new();
        let seller = Identity::new();
        let id = registry.create(seller, Listing::simple(1, "a"), 0);

        assert!(registry.require_seller(seller, id).is_ok());
        let err = registry.require_seller(Identity::new(), id).unwrap_err();
        assert!(matches!(err, MarketError::Unauthorized { .. }));
    }

    #[test]
    fn restore_and_truncate() {
        let mut registry = PropertyRegistry::new();
        let seller = Identity::new();
        let id = registry.create(seller, Listing::simple(1, "a"), 0);
        let before = registry.get(id).unwrap().clone();

        registry.get_mut(id).unwrap().price = 99;
        registry.restore(before);
        assert_eq!(registry.get(id).unwrap().price, 1);

        registry.create(seller, Listing::simple(5, "b"), 0);
        registry.truncate(1);
        assert_eq!(registry.len(), 1);
    }
}
