//! Randomized operation sequences against the marketplace.
//!
//! After every call, successful or not, the ledgers must still agree:
//! escrow equals the active offers, titles follow sale state, and every
//! unit deposited is either still held or has been paid out exactly once.

use std::sync::Arc;

use estatemesh_engine::Marketplace;
use estatemesh_types::{Amount, Identity, ManualClock, MarketConfig, PropertyId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const UNIT: Amount = 1_000_000_000_000_000_000;
const STEPS: usize = 400;

struct World {
    market: Marketplace,
    clock: ManualClock,
    owner: Identity,
    appraiser: Identity,
    sellers: Vec<Identity>,
    buyers: Vec<Identity>,
    properties: Vec<PropertyId>,
    deposited: Amount,
}

impl World {
    fn new() -> Self {
        let owner = Identity::new();
        let appraiser = Identity::new();
        let clock = ManualClock::starting_at(1_000);
        let mut market =
            Marketplace::new(owner, MarketConfig::default(), Arc::new(clock.clone())).unwrap();
        market.set_appraiser(owner, appraiser).unwrap();
        Self {
            market,
            clock,
            owner,
            appraiser,
            sellers: (0..2).map(|_| Identity::new()).collect(),
            buyers: (0..4).map(|_| Identity::new()).collect(),
            properties: Vec::new(),
            deposited: 0,
        }
    }

    fn pick<T: Copy>(rng: &mut StdRng, items: &[T]) -> T {
        items[rng.gen_range(0..items.len())]
    }

    /// One random operation. Errors are expected and ignored; only the
    /// resulting state is checked.
    fn step(&mut self, rng: &mut StdRng) {
        if self.properties.is_empty() || rng.gen_bool(0.05) {
            let seller = Self::pick(rng, &self.sellers);
            let price = rng.gen_range(1..=20) * UNIT / 10;
            if let Ok(id) = self.market.list_property_simple(seller, price, "Lot") {
                self.properties.push(id);
            }
            return;
        }

        let id = Self::pick(rng, &self.properties);
        let seller = self.market.get_seller(id).unwrap();
        let buyer = Self::pick(rng, &self.buyers);
        let amount = rng.gen_range(1..=20) * UNIT / 10;

        match rng.gen_range(0..14) {
            0..=2 => {
                let expiry = if rng.gen_bool(0.5) { 0 } else { rng.gen_range(1..120) };
                if self.market.submit_offer(buyer, id, amount, expiry).is_ok() {
                    self.deposited += amount;
                }
            }
            3 => {
                let _ = self.market.reject_offer(seller, id, buyer);
            }
            4 => {
                let _ = self.market.accept_first_offer(seller, id);
            }
            5 => {
                let _ = self.market.accept_offer(seller, id, buyer);
            }
            6 => {
                let _ = self.market.inspect_property(self.appraiser, id);
                let _ = self.market.update_financing(self.owner, id, rng.gen_bool(0.8));
            }
            7 => {
                let _ = self.market.start_auction(seller, id, UNIT / 10, rng.gen_range(1..200));
            }
            8 => {
                if self.market.bid_on_auction(buyer, id, amount).is_ok() {
                    self.deposited += amount;
                }
            }
            9 => {
                let _ = self.market.end_auction(seller, id);
            }
            10 => {
                let _ = self.market.expire_offers(buyer, id);
                let _ = self.market.refund_deposit(buyer, id);
            }
            11 => {
                let _ = if rng.gen_bool(0.2) {
                    self.market.delist_property(seller, id)
                } else {
                    self.market.reject_first_offer(seller, id).map(|_| ())
                };
            }
            12 => {
                if rng.gen_bool(0.1) {
                    let _ = self.market.withdraw_escrow(self.owner, id);
                }
            }
            _ => self.clock.advance(rng.gen_range(1..90)),
        }
    }

    fn check(&self, step: usize) {
        if let Err(err) = self.market.verify_invariants() {
            panic!("invariant broken after step {step}: {err}");
        }
        assert_eq!(
            self.market.total_escrow() + self.market.rail().total_paid(),
            self.deposited,
            "funds not conserved after step {step}"
        );
        for &id in &self.properties {
            let sold = self.market.is_property_sold(id).unwrap();
            let holder = self.market.get_property_owner(id).unwrap();
            let details = self.market.get_property_details(id).unwrap();
            if sold {
                assert_eq!(Some(holder), details.buyer);
                assert_eq!(self.market.escrow_balance(id).unwrap(), 0);
            } else {
                assert_eq!(holder, details.seller);
            }
        }
    }
}

// =========================================================================
// Test: ledgers stay consistent under random traffic
// =========================================================================

#[test]
fn random_traffic_preserves_invariants() {
    for seed in [1_u64, 7, 42, 1_337, 90_210] {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut world = World::new();
        for step in 0..STEPS {
            world.step(&mut rng);
            world.check(step);
        }
    }
}

#[test]
fn random_traffic_under_pause_changes_nothing() {
    let mut rng = StdRng::seed_from_u64(3);
    let mut world = World::new();
    for step in 0..STEPS / 2 {
        world.step(&mut rng);
        world.check(step);
    }

    world.market.pause(world.owner).unwrap();
    let escrow = world.market.total_escrow();
    let paid = world.market.rail().total_paid();
    let events = world.market.events().len();
    let deposited = world.deposited;

    for _ in 0..STEPS / 2 {
        world.step(&mut rng);
    }
    assert_eq!(world.market.total_escrow(), escrow);
    assert_eq!(world.market.rail().total_paid(), paid);
    assert_eq!(world.market.events().len(), events);
    assert_eq!(world.deposited, deposited);
    world.market.verify_invariants().unwrap();
}
