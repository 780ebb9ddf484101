//! The marketplace engine: explicit state, one atomic call per operation.
//!
//! Every mutating operation on a property runs through [`Marketplace::transact`]:
//!
//! ```text
//! pause check → in-flight check → read clock → snapshot property
//!   → operation (bookkeeping only, returns payouts)
//!   → guard.begin → rail.dispatch → guard.finish
//!   → on any error: restore snapshot, drop emitted events
//! ```
//!
//! Payouts are dispatched only once all bookkeeping is committed, so a
//! failing rail can never observe half-updated state, and a rail failure
//! leaves the marketplace exactly as it was before the call.

use std::sync::Arc;

use estatemesh_ledger::{
    AccessControl, EscrowAccount, EscrowLedger, PayoutLedger, PayoutRail, PropertyRegistry,
    TitleRegistry,
};
use estatemesh_offers::OfferBook;
use estatemesh_settlement::{SettlementGuard, verify_market};
use estatemesh_types::{
    Amount, BasisPoints, Clock, Identity, MarketConfig, MarketError, MarketEvent, Offer, Payout,
    Property, PropertyId, Result, Timestamp,
};

/// Per-property state captured before an operation runs.
struct Snapshot {
    property: Option<Property>,
    registry_len: usize,
    offers: Vec<Offer>,
    escrow: EscrowAccount,
    title: Option<Identity>,
    settled: bool,
    events_len: usize,
}

/// Peer-to-peer property marketplace.
///
/// Generic over the payout rail so hosts can plug in their own transfer
/// mechanism; [`PayoutLedger`] is the in-memory default.
pub struct Marketplace<R: PayoutRail = PayoutLedger> {
    pub(crate) config: MarketConfig,
    pub(crate) access: AccessControl,
    pub(crate) registry: PropertyRegistry,
    pub(crate) titles: TitleRegistry,
    pub(crate) escrow: EscrowLedger,
    pub(crate) book: OfferBook,
    pub(crate) guard: SettlementGuard,
    pub(crate) platform_fee: BasisPoints,
    rail: R,
    clock: Arc<dyn Clock>,
    last_now: Timestamp,
    paused: bool,
    events: Vec<MarketEvent>,
}

impl<R: PayoutRail + std::fmt::Debug> std::fmt::Debug for Marketplace<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Marketplace")
            .field("config", &self.config)
            .field("access", &self.access)
            .field("registry", &self.registry)
            .field("titles", &self.titles)
            .field("escrow", &self.escrow)
            .field("book", &self.book)
            .field("guard", &self.guard)
            .field("platform_fee", &self.platform_fee)
            .field("rail", &self.rail)
            .field("last_now", &self.last_now)
            .field("paused", &self.paused)
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}

impl Marketplace<PayoutLedger> {
    /// A marketplace owned by `owner` paying out into an in-memory ledger.
    ///
    /// # Errors
    /// `Configuration` if `config` is out of range.
    pub fn new(owner: Identity, config: MarketConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        Self::with_rail(owner, config, clock, PayoutLedger::new())
    }
}

impl<R: PayoutRail> Marketplace<R> {
    /// A marketplace dispatching payouts through `rail`.
    ///
    /// # Errors
    /// `Configuration` if `config` is out of range.
    pub fn with_rail(owner: Identity, config: MarketConfig, clock: Arc<dyn Clock>, rail: R) -> Result<Self> {
        config.validate()?;
        let last_now = clock.now();
        tracing::info!(
            owner = %owner,
            platform_fee = %config.platform_fee_bps,
            "Marketplace initialized"
        );
        Ok(Self {
            platform_fee: config.platform_fee_bps,
            config,
            access: AccessControl::new(owner),
            registry: PropertyRegistry::new(),
            titles: TitleRegistry::new(),
            escrow: EscrowLedger::new(),
            book: OfferBook::new(),
            guard: SettlementGuard::new(),
            rail,
            clock,
            last_now,
            paused: false,
            events: Vec::new(),
        })
    }

    // =================================================================
    // Administration (owner-only)
    // =================================================================

    pub fn set_appraiser(&mut self, caller: Identity, appraiser: Identity) -> Result<()> {
        self.ensure_running()?;
        self.access.set_appraiser(caller, appraiser)?;
        tracing::info!(appraiser = %appraiser, "Appraiser set");
        self.emit(MarketEvent::AppraiserChanged { appraiser });
        Ok(())
    }

    pub fn set_agent_authorization(&mut self, caller: Identity, agent: Identity, authorized: bool) -> Result<()> {
        self.ensure_running()?;
        self.access.set_agent_authorization(caller, agent, authorized)?;
        tracing::info!(agent = %agent, authorized, "Agent authorization changed");
        self.emit(MarketEvent::AgentAuthorized { agent, authorized });
        Ok(())
    }

    /// Change the fee applied at every future settlement.
    ///
    /// # Errors
    /// `Unauthorized`, `Paused`, or `InvalidFee` when the fee plus the
    /// configured agent commission cap exceeds 10000 bps.
    pub fn set_platform_fee(&mut self, caller: Identity, fee: BasisPoints) -> Result<()> {
        self.ensure_running()?;
        self.access.require_owner(caller)?;
        let commission_cap = self.config.max_agent_commission_bps;
        if !fee.fits_with(commission_cap) {
            return Err(MarketError::InvalidFee {
                reason: format!(
                    "platform fee {fee} plus agent commission cap {commission_cap} exceeds {}",
                    BasisPoints::FULL
                ),
            });
        }
        let old_fee = self.platform_fee;
        self.platform_fee = fee;
        tracing::info!(old_fee = %old_fee, new_fee = %fee, "Platform fee updated");
        self.emit(MarketEvent::PlatformFeeUpdated { old_fee, new_fee: fee });
        Ok(())
    }

    /// Disable every mutating operation except [`Self::unpause`].
    pub fn pause(&mut self, caller: Identity) -> Result<()> {
        self.ensure_running()?;
        self.access.require_owner(caller)?;
        self.paused = true;
        tracing::warn!(by = %caller, "Marketplace paused");
        self.emit(MarketEvent::Paused { by: caller });
        Ok(())
    }

    pub fn unpause(&mut self, caller: Identity) -> Result<()> {
        self.access.require_owner(caller)?;
        if !self.paused {
            return Err(MarketError::illegal_state("marketplace is not paused"));
        }
        self.paused = false;
        tracing::info!(by = %caller, "Marketplace unpaused");
        self.emit(MarketEvent::Unpaused { by: caller });
        Ok(())
    }

    // =================================================================
    // Queries
    // =================================================================

    #[must_use]
    pub fn owner(&self) -> Identity {
        self.access.owner()
    }

    #[must_use]
    pub fn appraiser(&self) -> Option<Identity> {
        self.access.appraiser()
    }

    #[must_use]
    pub fn is_owner(&self, identity: Identity) -> bool {
        self.access.is_owner(identity)
    }

    #[must_use]
    pub fn is_appraiser(&self, identity: Identity) -> bool {
        self.access.is_appraiser(identity)
    }

    #[must_use]
    pub fn is_authorized_agent(&self, identity: Identity) -> bool {
        self.access.is_authorized_agent(identity)
    }

    #[must_use]
    pub fn platform_fee(&self) -> BasisPoints {
        self.platform_fee
    }

    #[must_use]
    pub fn paused(&self) -> bool {
        self.paused
    }

    #[must_use]
    pub fn config(&self) -> &MarketConfig {
        &self.config
    }

    /// Escrow currently held on a property.
    ///
    /// # Errors
    /// `PropertyNotFound` for unknown ids.
    pub fn escrow_balance(&self, property_id: PropertyId) -> Result<Amount> {
        self.registry.get(property_id)?;
        Ok(self.escrow.balance(property_id))
    }

    /// Escrow held across every property.
    #[must_use]
    pub fn total_escrow(&self) -> Amount {
        self.escrow.total_held()
    }

    /// Current engine time: the clock reading, never earlier than the time
    /// seen by the last operation.
    #[must_use]
    pub fn now(&self) -> Timestamp {
        self.clock.now().max(self.last_now)
    }

    /// Notification log, oldest first.
    #[must_use]
    pub fn events(&self) -> &[MarketEvent] {
        &self.events
    }

    /// Drain the notification log.
    pub fn take_events(&mut self) -> Vec<MarketEvent> {
        std::mem::take(&mut self.events)
    }

    #[must_use]
    pub fn rail(&self) -> &R {
        &self.rail
    }

    pub fn rail_mut(&mut self) -> &mut R {
        &mut self.rail
    }

    /// Check every ledger invariant across the whole marketplace.
    ///
    /// # Errors
    /// The first violation found.
    pub fn verify_invariants(&self) -> Result<()> {
        verify_market(&self.registry, &self.book, &self.escrow, &self.titles)
    }

    // =================================================================
    // Transaction machinery
    // =================================================================

    pub(crate) fn ensure_running(&self) -> Result<()> {
        if self.paused {
            return Err(MarketError::Paused);
        }
        Ok(())
    }

    pub(crate) fn emit(&mut self, event: MarketEvent) {
        self.events.push(event);
    }

    /// Read the clock, clamped so time never runs backwards.
    fn tick(&mut self) -> Timestamp {
        let now = self.clock.now().max(self.last_now);
        self.last_now = now;
        now
    }

    /// Run `op` against `property_id` as one atomic call.
    ///
    /// `op` performs bookkeeping and returns its value plus the payouts to
    /// dispatch. On error from `op` or from the rail, the property's
    /// registry record, offers, escrow, title, settlement flag and any
    /// events emitted during the call are restored.
    pub(crate) fn transact<T>(
        &mut self,
        property_id: PropertyId,
        op: impl FnOnce(&mut Self, Timestamp) -> Result<(T, Vec<Payout>)>,
    ) -> Result<T> {
        self.ensure_running()?;
        self.guard.check_idle(property_id)?;
        let now = self.tick();
        let snapshot = self.snapshot(property_id);

        let (value, payouts) = match op(self, now) {
            Ok(done) => done,
            Err(err) => {
                self.rollback(property_id, snapshot);
                return Err(err);
            }
        };

        if let Err(err) = self.dispatch(property_id, &payouts) {
            tracing::warn!(
                property = %property_id,
                payouts = payouts.len(),
                error = %err,
                "Payout dispatch failed, rolling back"
            );
            self.rollback(property_id, snapshot);
            return Err(err);
        }
        Ok(value)
    }

    fn dispatch(&mut self, property_id: PropertyId, payouts: &[Payout]) -> Result<()> {
        if payouts.is_empty() {
            return Ok(());
        }
        self.guard.begin(property_id)?;
        let result = self.rail.dispatch(payouts);
        self.guard.finish(property_id);
        result
    }

    fn snapshot(&self, property_id: PropertyId) -> Snapshot {
        Snapshot {
            property: self.registry.get(property_id).ok().cloned(),
            registry_len: self.registry.len(),
            offers: self.book.snapshot(property_id),
            escrow: self.escrow.account(property_id),
            title: self.titles.owner_of(property_id).ok(),
            settled: self.guard.is_settled(property_id),
            events_len: self.events.len(),
        }
    }

    fn rollback(&mut self, property_id: PropertyId, snapshot: Snapshot) {
        match snapshot.property {
            Some(property) => self.registry.restore(property),
            None => self.registry.truncate(snapshot.registry_len),
        }
        self.book.restore(property_id, snapshot.offers);
        self.escrow.restore(property_id, snapshot.escrow);
        self.titles.restore(property_id, snapshot.title);
        if !snapshot.settled {
            self.guard.unmark_settled(property_id);
        }
        self.events.truncate(snapshot.events_len);
    }
}
