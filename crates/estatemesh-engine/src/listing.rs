//! Property lifecycle operations: listing, edits, approvals, delisting.

use estatemesh_ledger::PayoutRail;
use estatemesh_types::{
    Amount, DocumentHash, Identity, Listing, MarketError, MarketEvent, OfferOutcome, Property,
    PropertyId, Result,
};

use crate::Marketplace;

impl<R: PayoutRail> Marketplace<R> {
    // =================================================================
    // Listing
    // =================================================================

    /// List a property and mint its title to `seller`.
    ///
    /// # Errors
    /// `InvalidListing` for a zero price or a commission above the cap,
    /// `Unauthorized` if the named agent is not authorized.
    pub fn list_property(&mut self, seller: Identity, listing: Listing) -> Result<PropertyId> {
        let next = self.registry.next_id();
        self.transact(next, move |m, now| {
            if listing.price == 0 {
                return Err(MarketError::InvalidListing {
                    reason: "price must be positive".to_string(),
                });
            }
            let cap = m.config.max_agent_commission_bps;
            if listing.agent_commission > cap {
                return Err(MarketError::InvalidListing {
                    reason: format!("agent commission {} exceeds {cap}", listing.agent_commission),
                });
            }
            if let Some(agent) = listing.agent {
                m.access.require_authorized_agent(agent)?;
            }

            let price = listing.price;
            let location = listing.location.clone();
            let id = m.registry.create(seller, listing, now);
            m.titles.mint(id, seller)?;

            tracing::info!(property = %id, seller = %seller, price, "Property listed");
            m.emit(MarketEvent::PropertyListed {
                property_id: id,
                seller,
                price,
                location,
            });
            Ok((id, Vec::new()))
        })
    }

    /// Residential listing with no agent and no details.
    pub fn list_property_simple(
        &mut self,
        seller: Identity,
        price: Amount,
        location: impl Into<String>,
    ) -> Result<PropertyId> {
        self.list_property(seller, Listing::simple(price, location))
    }

    // =================================================================
    // Seller edits
    // =================================================================

    pub fn update_property_price(&mut self, caller: Identity, property_id: PropertyId, new_price: Amount) -> Result<()> {
        self.transact(property_id, |m, _| {
            let property = m.registry.require_seller(caller, property_id)?;
            if property.is_sold {
                return Err(MarketError::AlreadySold(property_id));
            }
            if new_price == 0 {
                return Err(MarketError::InvalidListing {
                    reason: "price must be positive".to_string(),
                });
            }
            let old_price = std::mem::replace(&mut property.price, new_price);
            m.emit(MarketEvent::PriceUpdated {
                property_id,
                old_price,
                new_price,
            });
            Ok(((), Vec::new()))
        })
    }

    /// Append a document hash to the property's ordered document list.
    pub fn add_document(&mut self, caller: Identity, property_id: PropertyId, hash: DocumentHash) -> Result<()> {
        self.transact(property_id, |m, _| {
            let limit = m.config.max_documents_per_property;
            let property = m.registry.require_seller(caller, property_id)?;
            if property.documents.len() >= limit {
                return Err(MarketError::InvalidArgument {
                    reason: format!("{property_id} already carries {limit} documents"),
                });
            }
            property.documents.push(hash);
            m.emit(MarketEvent::DocumentAdded { property_id, hash });
            Ok(((), Vec::new()))
        })
    }

    /// Record that `viewer` looked at the property. Any identity may call.
    pub fn view_property(&mut self, viewer: Identity, property_id: PropertyId) -> Result<()> {
        self.transact(property_id, |m, _| {
            m.registry.get_mut(property_id)?.viewers.insert(viewer);
            m.emit(MarketEvent::PropertyViewed { property_id, viewer });
            Ok(((), Vec::new()))
        })
    }

    /// Take a listed property off the market, clearing any auction and
    /// refunding every active offer and bid. The title stays with the seller.
    pub fn delist_property(&mut self, caller: Identity, property_id: PropertyId) -> Result<()> {
        self.transact(property_id, |m, _| {
            let property = m.registry.require_seller(caller, property_id)?;
            if property.is_sold {
                return Err(MarketError::AlreadySold(property_id));
            }
            if !property.is_listed {
                return Err(MarketError::NotListed(property_id));
            }
            property.is_listed = false;
            property.clear_auction();
            let seller = property.seller;

            let refunds: Vec<_> = m
                .book
                .refund_all_active(&mut m.escrow, property_id, OfferOutcome::Cancelled)?
                .into_iter()
                .map(|(_, payout)| payout)
                .collect();

            tracing::info!(property = %property_id, refunded = refunds.len(), "Property delisted");
            m.emit(MarketEvent::PropertyDelisted { property_id, seller });
            Ok(((), refunds))
        })
    }

    // =================================================================
    // Approvals
    // =================================================================

    /// Shorthand for a passing inspection.
    pub fn inspect_property(&mut self, caller: Identity, property_id: PropertyId) -> Result<()> {
        self.update_inspection_status(caller, property_id, true)
    }

    /// Appraiser-only.
    pub fn update_inspection_status(&mut self, caller: Identity, property_id: PropertyId, passed: bool) -> Result<()> {
        self.transact(property_id, |m, _| {
            m.access.require_appraiser(caller)?;
            let property = unsold(m.registry.get_mut(property_id)?)?;
            property.is_inspection_passed = passed;
            tracing::info!(property = %property_id, passed, "Inspection updated");
            m.emit(MarketEvent::InspectionUpdated { property_id, passed });
            Ok(((), Vec::new()))
        })
    }

    /// Owner-only.
    pub fn update_financing(&mut self, caller: Identity, property_id: PropertyId, approved: bool) -> Result<()> {
        self.transact(property_id, |m, _| {
            m.access.require_owner(caller)?;
            let property = unsold(m.registry.get_mut(property_id)?)?;
            property.financing_approved = approved;
            tracing::info!(property = %property_id, approved, "Financing updated");
            m.emit(if approved {
                MarketEvent::FinancingApproved { property_id }
            } else {
                MarketEvent::FinancingRejected { property_id }
            });
            Ok(((), Vec::new()))
        })
    }

    // =================================================================
    // Emergency
    // =================================================================

    /// Owner-only drain of a property's escrow. Every active offer is closed
    /// as drained and any auction leader is cleared.
    ///
    /// # Errors
    /// `IllegalState` when nothing is held.
    pub fn withdraw_escrow(&mut self, caller: Identity, property_id: PropertyId) -> Result<Amount> {
        self.transact(property_id, |m, _| {
            m.access.require_owner(caller)?;
            let property = m.registry.get_mut(property_id)?;
            if m.escrow.balance(property_id) == 0 {
                return Err(MarketError::illegal_state(format!(
                    "no escrow held on {property_id}"
                )));
            }
            if property.has_auction() {
                property.highest_bid = 0;
                property.highest_bidder = None;
            }

            let drained = m.book.close_all_active(property_id, OfferOutcome::Drained)?;
            let payout = m.escrow.drain(property_id, caller)?;
            let amount = payout.amount;

            tracing::warn!(
                property = %property_id,
                amount,
                offers = drained.len(),
                "Escrow withdrawn by owner"
            );
            m.emit(MarketEvent::EscrowWithdrawn {
                property_id,
                recipient: caller,
                amount,
            });
            Ok((amount, vec![payout]))
        })
    }

    // =================================================================
    // Queries
    // =================================================================

    /// # Errors
    /// `PropertyNotFound` for unknown ids.
    pub fn get_property_details(&self, property_id: PropertyId) -> Result<&Property> {
        self.registry.get(property_id)
    }

    /// Current title holder.
    ///
    /// # Errors
    /// `PropertyNotFound` for unknown ids.
    pub fn get_property_owner(&self, property_id: PropertyId) -> Result<Identity> {
        self.titles.owner_of(property_id)
    }

    /// # Errors
    /// `PropertyNotFound` for unknown ids.
    pub fn get_seller(&self, property_id: PropertyId) -> Result<Identity> {
        Ok(self.registry.get(property_id)?.seller)
    }

    /// # Errors
    /// `PropertyNotFound` for unknown ids.
    pub fn is_property_listed(&self, property_id: PropertyId) -> Result<bool> {
        Ok(self.registry.get(property_id)?.is_listed)
    }

    /// # Errors
    /// `PropertyNotFound` for unknown ids.
    pub fn is_property_sold(&self, property_id: PropertyId) -> Result<bool> {
        Ok(self.registry.get(property_id)?.is_sold)
    }

    /// Properties whose title `identity` currently holds, ascending.
    #[must_use]
    pub fn get_properties_by_owner(&self, identity: Identity) -> Vec<PropertyId> {
        self.titles.tokens_of(identity)
    }

    #[must_use]
    pub fn get_total_properties(&self) -> usize {
        self.registry.len()
    }

    #[must_use]
    pub fn title_name(&self) -> &'static str {
        self.titles.name()
    }

    #[must_use]
    pub fn title_symbol(&self) -> &'static str {
        self.titles.symbol()
    }

    /// Number of titles held by `identity`.
    #[must_use]
    pub fn title_balance_of(&self, identity: Identity) -> usize {
        self.titles.balance_of(identity)
    }
}

fn unsold(property: &mut Property) -> Result<&mut Property> {
    if property.is_sold {
        return Err(MarketError::AlreadySold(property.id));
    }
    Ok(property)
}
