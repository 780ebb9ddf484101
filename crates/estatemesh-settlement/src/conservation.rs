//! Escrow conservation and ledger consistency checks.
//!
//! Invariants checked per property:
//! ```text
//! escrow.held == Σ(active offer amounts)
//! escrow.held == deposited − released − refunded
//! at most one active offer per buyer
//! is_sold ⇒ ¬is_listed ∧ title holder == buyer ∧ no active offers
//! exactly one title per property
//! ```
//!
//! A failure here means bookkeeping has gone wrong somewhere upstream; the
//! engine runs these after randomized test sequences and exposes them via
//! `verify_invariants`.

use std::collections::HashSet;

use estatemesh_ledger::{EscrowLedger, PropertyRegistry, TitleRegistry};
use estatemesh_offers::OfferBook;
use estatemesh_types::{MarketError, PropertyId, Result};

/// Check that a property's escrow exactly backs its active offers.
///
/// # Errors
/// `EscrowInvariantViolation` describing the mismatch.
pub fn verify_escrow(property_id: PropertyId, book: &OfferBook, escrow: &EscrowLedger) -> Result<()> {
    let account = escrow.account(property_id);
    let active = book.active_total(property_id);
    if account.held != active {
        return Err(MarketError::EscrowInvariantViolation {
            reason: format!(
                "{property_id}: escrow holds {} but active offers total {active}",
                account.held
            ),
        });
    }
    if !account.is_balanced() {
        return Err(MarketError::EscrowInvariantViolation {
            reason: format!(
                "{property_id}: held {} != deposited {} - released {} - refunded {}",
                account.held, account.deposited, account.released, account.refunded
            ),
        });
    }
    let mut buyers = HashSet::new();
    for offer in book.active(property_id) {
        if !buyers.insert(offer.buyer) {
            return Err(MarketError::EscrowInvariantViolation {
                reason: format!("{property_id}: {} holds two active offers", offer.buyer),
            });
        }
    }
    Ok(())
}

/// Check every property in the registry, plus escrow held for ids the
/// registry does not know.
///
/// # Errors
/// The first violation found.
pub fn verify_market(
    registry: &PropertyRegistry,
    book: &OfferBook,
    escrow: &EscrowLedger,
    titles: &TitleRegistry,
) -> Result<()> {
    for property in registry.iter() {
        let id = property.id;
        verify_escrow(id, book, escrow)?;

        if !property.lifecycle_consistent() {
            return Err(MarketError::illegal_state(format!(
                "{id}: inconsistent lifecycle (listed={}, sold={}, buyer={:?})",
                property.is_listed, property.is_sold, property.buyer
            )));
        }
        let holder = titles.owner_of(id)?;
        if property.is_sold {
            if property.buyer != Some(holder) {
                return Err(MarketError::illegal_state(format!(
                    "{id}: sold but title is held by {holder}"
                )));
            }
            if book.active(id).next().is_some() {
                return Err(MarketError::illegal_state(format!(
                    "{id}: sold with active offers remaining"
                )));
            }
        } else if holder != property.seller {
            return Err(MarketError::illegal_state(format!(
                "{id}: unsold but title is held by {holder}"
            )));
        }
    }

    if titles.total_supply() != registry.len() {
        return Err(MarketError::illegal_state(format!(
            "{} titles for {} properties",
            titles.total_supply(),
            registry.len()
        )));
    }
    for id in book.property_ids() {
        if registry.get(id).is_err() {
            return Err(MarketError::EscrowInvariantViolation {
                reason: format!("offers recorded for unknown {id}"),
            });
        }
    }
    let expected: u128 = registry.iter().map(|p| book.active_total(p.id)).sum();
    if escrow.total_held() != expected {
        return Err(MarketError::EscrowInvariantViolation {
            reason: format!(
                "total escrow {} != total active offers {expected}",
                escrow.total_held()
            ),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use estatemesh_types::{Identity, Listing, Offer};

    use super::*;

    fn market() -> (PropertyRegistry, OfferBook, EscrowLedger, TitleRegistry, PropertyId) {
        let mut registry = PropertyRegistry::new();
        let mut titles = TitleRegistry::new();
        let seller = Identity::new();
        let id = registry.create(seller, Listing::simple(100, "Elm St"), 0);
        titles.mint(id, seller).unwrap();
        (registry, OfferBook::new(), EscrowLedger::new(), titles, id)
    }

    #[test]
    fn consistent_market_passes() {
        let (registry, mut book, mut escrow, titles, id) = market();
        let offer = Offer::new(id, Identity::new(), 40, 0, 0).unwrap();
        book.submit(&mut escrow, offer, 8).unwrap();
        verify_market(&registry, &book, &escrow, &titles).unwrap();
    }

    #[test]
    fn stray_escrow_is_detected() {
        let (registry, book, mut escrow, titles, id) = market();
        escrow.deposit(id, 5).unwrap();
        let err = verify_market(&registry, &book, &escrow, &titles).unwrap_err();
        assert!(matches!(err, MarketError::EscrowInvariantViolation { .. }));
    }

    #[test]
    fn title_mismatch_is_detected() {
        let (registry, book, escrow, mut titles, id) = market();
        let seller = registry.get(id).unwrap().seller;
        titles.transfer(id, seller, Identity::new()).unwrap();
        let err = verify_market(&registry, &book, &escrow, &titles).unwrap_err();
        assert!(matches!(err, MarketError::IllegalState { .. }));
    }

    #[test]
    fn missing_title_is_detected() {
        let (registry, book, escrow, _, _) = market();
        let err = verify_market(&registry, &book, &escrow, &TitleRegistry::new()).unwrap_err();
        assert!(matches!(err, MarketError::PropertyNotFound(_)));
    }
}
