//! Ownership titles: one non-fungible token per property.
//!
//! Token identifier equals the property id. A token is minted once, at
//! listing, to the seller, and moves only through settlement.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use estatemesh_types::{Identity, MarketError, PropertyId, Result, constants};

/// Title holder index, keyed both ways.
#[derive(Debug, Clone, Default)]
pub struct TitleRegistry {
    holders: BTreeMap<PropertyId, Identity>,
    by_holder: HashMap<Identity, BTreeSet<PropertyId>>,
}

impl TitleRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint the title for `property_id` to `holder`.
    ///
    /// # Errors
    /// `Title` if the token already exists.
    pub fn mint(&mut self, property_id: PropertyId, holder: Identity) -> Result<()> {
        if self.holders.contains_key(&property_id) {
            return Err(MarketError::Title {
                reason: format!("title for {property_id} already minted"),
            });
        }
        self.holders.insert(property_id, holder);
        self.by_holder.entry(holder).or_default().insert(property_id);
        tracing::debug!(property = %property_id, holder = %holder, "Title minted");
        Ok(())
    }

    /// Move the title from `from` to `to`.
    ///
    /// # Errors
    /// `PropertyNotFound` if no title exists, `Title` if `from` does not hold it.
    pub fn transfer(&mut self, property_id: PropertyId, from: Identity, to: Identity) -> Result<()> {
        let holder = self.owner_of(property_id)?;
        if holder != from {
            return Err(MarketError::Title {
                reason: format!("{from} does not hold the title for {property_id}"),
            });
        }
        self.set_holder(property_id, to);
        tracing::debug!(property = %property_id, from = %from, to = %to, "Title transferred");
        Ok(())
    }

    /// Current holder of a title.
    ///
    /// # Errors
    /// `PropertyNotFound` if the token was never minted.
    pub fn owner_of(&self, property_id: PropertyId) -> Result<Identity> {
        self.holders
            .get(&property_id)
            .copied()
            .ok_or(MarketError::PropertyNotFound(property_id))
    }

    /// Number of titles held by `holder`.
    #[must_use]
    pub fn balance_of(&self, holder: Identity) -> usize {
        self.by_holder.get(&holder).map_or(0, BTreeSet::len)
    }

    /// Titles currently held by `holder`, in ascending id order.
    #[must_use]
    pub fn tokens_of(&self, holder: Identity) -> Vec<PropertyId> {
        self.by_holder
            .get(&holder)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Total minted titles.
    #[must_use]
    pub fn total_supply(&self) -> usize {
        self.holders.len()
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        constants::TITLE_NAME
    }

    #[must_use]
    pub fn symbol(&self) -> &'static str {
        constants::TITLE_SYMBOL
    }

    /// Put a title back to a holder captured before a failed operation.
    /// `None` removes the token entirely.
    pub fn restore(&mut self, property_id: PropertyId, holder: Option<Identity>) {
        match holder {
            Some(holder) => self.set_holder(property_id, holder),
            None => {
                if let Some(previous) = self.holders.remove(&property_id) {
                    self.unindex(previous, property_id);
                }
            }
        }
    }

    fn set_holder(&mut self, property_id: PropertyId, holder: Identity) {
        if let Some(previous) = self.holders.insert(property_id, holder) {
            self.unindex(previous, property_id);
        }
        self.by_holder.entry(holder).or_default().insert(property_id);
    }

    fn unindex(&mut self, holder: Identity, property_id: PropertyId) {
        if let Some(ids) = self.by_holder.get_mut(&holder) {
            ids.remove(&property_id);
            if ids.is_empty() {
                self.by_holder.remove(&holder);
            }
        }
    }
}
