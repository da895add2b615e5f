//! Per-pool lifecycle FSM.
//!
//! Re-architected per the Design Notes away from a singleton tracker: this
//! is an owned map inside `Registry`, not global mutable state.

use crate::types::{Address, Slot};
use std::collections::{HashMap, HashSet};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PoolState {
    Discovered,
    TopologyFrozen,
    Active,
    Refreshing,
    Evicted,
}

/// The immutable set of auxiliary addresses a pool depends on, frozen at
/// discovery time and replaced wholesale (never mutated incrementally) on
/// refresh.
#[derive(Clone, Debug, Default)]
pub struct Topology {
    pub keys: HashSet<Address>,
}

impl Topology {
    pub fn new(keys: HashSet<Address>) -> Self {
        Topology { keys }
    }

    pub fn contains(&self, key: &Address) -> bool {
        self.keys.contains(key)
    }
}

#[derive(Clone, Debug)]
pub struct LifecycleRecord {
    pub state: PoolState,
    pub discovered_slot: Slot,
    pub frozen_slot: Option<Slot>,
    pub topology: Option<Topology>,
    pub last_refresh: Option<Slot>,
    /// At-most-one in-flight bootstrap per pool.
    pub bootstrap_in_flight: bool,
}

impl LifecycleRecord {
    fn new(discovered_slot: Slot) -> Self {
        LifecycleRecord {
            state: PoolState::Discovered,
            discovered_slot,
            frozen_slot: None,
            topology: None,
            last_refresh: None,
            bootstrap_in_flight: false,
        }
    }
}

/// Owns the per-pool lifecycle state for every pool the oracle has seen.
/// `start_slot` is captured once, from the first accepted stream message,
/// and gates `TOPOLOGY_FROZEN -> ACTIVE`.
pub struct LifecycleTable {
    records: HashMap<Address, LifecycleRecord>,
    start_slot: Option<Slot>,
}

impl LifecycleTable {
    pub fn new() -> Self {
        LifecycleTable { records: HashMap::new(), start_slot: None }
    }

    /// Captures the convergence gate from the first accepted stream message.
    /// Re-armed (not reset) on stream reconnect: the topology oracle
    /// re-validates against the new slot but does not forget prior activity.
    pub fn arm_start_slot(&mut self, slot: Slot) {
        if self.start_slot.is_none() {
            self.start_slot = Some(slot);
        }
    }

    pub fn rearm_start_slot_on_reconnect(&mut self, slot: Slot) {
        self.start_slot = Some(slot);
    }

    pub fn start_slot(&self) -> Option<Slot> {
        self.start_slot
    }

    pub fn get(&self, pool: &Address) -> Option<&LifecycleRecord> {
        self.records.get(pool)
    }

    pub fn state_of(&self, pool: &Address) -> Option<PoolState> {
        self.records.get(pool).map(|r| r.state)
    }

    /// Finds the pool whose frozen topology contains `key`, regardless of
    /// lifecycle state. Used to route vault / amm-config updates to their
    /// owning pool even while that pool is still `TopologyFrozen` or
    /// `Refreshing`, not just `Active`.
    pub fn find_pool_for_dependency(&self, key: &Address) -> Option<Address> {
        self.records
            .iter()
            .find(|(_, record)| record.topology.as_ref().is_some_and(|t| t.contains(key)))
            .map(|(pool, _)| *pool)
    }

    /// `NONE -> DISCOVERED`. Idempotent: re-invoking on an already-known
    /// pool is a no-op.
    pub fn discover(&mut self, pool: Address, slot: Slot) -> bool {
        if self.records.contains_key(&pool) {
            return false;
        }
        self.records.insert(pool, LifecycleRecord::new(slot));
        true
    }

    pub fn mark_bootstrap_in_flight(&mut self, pool: &Address, in_flight: bool) {
        if let Some(r) = self.records.get_mut(pool) {
            r.bootstrap_in_flight = in_flight;
        }
    }

    pub fn is_bootstrap_in_flight(&self, pool: &Address) -> bool {
        self.records.get(pool).map(|r| r.bootstrap_in_flight).unwrap_or(false)
    }

    /// `DISCOVERED -> TOPOLOGY_FROZEN` (or `REFRESHING -> ACTIVE`'s topology
    /// swap, see `complete_refresh`).
    pub fn freeze(&mut self, pool: Address, keys: HashSet<Address>, frozen_slot: Slot) {
        let record = self.records.entry(pool).or_insert_with(|| LifecycleRecord::new(frozen_slot));
        record.topology = Some(Topology::new(keys));
        record.frozen_slot = Some(frozen_slot);
        record.state = PoolState::TopologyFrozen;
        record.bootstrap_in_flight = false;
    }

    /// Attempts `TOPOLOGY_FROZEN -> ACTIVE`. Caller supplies a predicate
    /// telling whether every topology key has a stored value at
    /// `slot >= frozen_slot`.
    pub fn try_activate(&mut self, pool: &Address, completeness: impl Fn(&Topology, Slot) -> bool) -> bool {
        let Some(start_slot) = self.start_slot else { return false };
        let Some(record) = self.records.get_mut(pool) else { return false };
        if !matches!(record.state, PoolState::TopologyFrozen | PoolState::Refreshing) {
            return false;
        }
        let Some(frozen_slot) = record.frozen_slot else { return false };
        if frozen_slot < start_slot {
            return false;
        }
        let Some(topology) = &record.topology else { return false };
        if completeness(topology, frozen_slot) {
            record.state = PoolState::Active;
            true
        } else {
            false
        }
    }

    /// `ACTIVE -> REFRESHING`, subject to the per-pool minimum interval.
    /// Returns `false` if a refresh is already in flight or too recent.
    pub fn begin_refresh(&mut self, pool: &Address, now_slot: Slot, min_interval_slots: Slot) -> bool {
        let Some(record) = self.records.get_mut(pool) else { return false };
        if record.state != PoolState::Active {
            return false;
        }
        if let Some(last) = record.last_refresh {
            if now_slot.saturating_sub(last) < min_interval_slots {
                return false;
            }
        }
        record.state = PoolState::Refreshing;
        record.last_refresh = Some(now_slot);
        true
    }

    /// `REFRESHING -> ACTIVE`: the new topology replaces the old one
    /// atomically once complete.
    pub fn complete_refresh(&mut self, pool: Address, keys: HashSet<Address>, frozen_slot: Slot) {
        self.freeze(pool, keys, frozen_slot);
        // freeze() leaves the record in TOPOLOGY_FROZEN; try_activate drives
        // the TOPOLOGY_FROZEN -> ACTIVE transition against the new topology.
    }

    pub fn evict(&mut self, pool: &Address) {
        if let Some(r) = self.records.get_mut(pool) {
            r.state = PoolState::Evicted;
        }
    }

    pub fn active_pools(&self) -> impl Iterator<Item = &Address> {
        self.records.iter().filter(|(_, r)| r.state == PoolState::Active).map(|(a, _)| a)
    }

    /// Every pool in a given state, for the bootstrap pipeline's periodic
    /// sweep over `Discovered`/`TopologyFrozen` pools.
    pub fn pools_in_state(&self, state: PoolState) -> impl Iterator<Item = &Address> {
        self.records.iter().filter(move |(_, r)| r.state == state).map(|(a, _)| a)
    }

    /// Every known pool regardless of state. Used to resolve a vault's
    /// owning pool even before that pool has a frozen topology to check
    /// containment against.
    pub fn all_pools(&self) -> impl Iterator<Item = &Address> {
        self.records.keys()
    }
}

impl Default for LifecycleTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discovery_is_idempotent() {
        let mut table = LifecycleTable::new();
        let pool = Address::new([1; 32]);
        assert!(table.discover(pool, 100));
        assert!(!table.discover(pool, 101));
        assert_eq!(table.get(&pool).unwrap().discovered_slot, 100);
    }

    #[test]
    fn activation_requires_start_slot_and_completeness() {
        let mut table = LifecycleTable::new();
        let pool = Address::new([2; 32]);
        table.discover(pool, 100);
        table.freeze(pool, HashSet::new(), 101);

        // No start_slot armed yet: activation cannot proceed.
        assert!(!table.try_activate(&pool, |_, _| true));

        table.arm_start_slot(100);
        assert!(table.try_activate(&pool, |_, _| true));
        assert_eq!(table.state_of(&pool), Some(PoolState::Active));
    }

    #[test]
    fn activation_rejects_frozen_slot_before_start_slot() {
        let mut table = LifecycleTable::new();
        let pool = Address::new([3; 32]);
        table.arm_start_slot(200);
        table.discover(pool, 50);
        table.freeze(pool, HashSet::new(), 150); // frozen before start_slot
        assert!(!table.try_activate(&pool, |_, _| true));
    }

    #[test]
    fn refresh_respects_minimum_interval() {
        let mut table = LifecycleTable::new();
        let pool = Address::new([4; 32]);
        table.arm_start_slot(0);
        table.discover(pool, 0);
        table.freeze(pool, HashSet::new(), 0);
        table.try_activate(&pool, |_, _| true);

        assert!(table.begin_refresh(&pool, 1000, 500));
        table.complete_refresh(pool, HashSet::new(), 1000);
        table.try_activate(&pool, |_, _| true);

        // Too soon after the last refresh.
        assert!(!table.begin_refresh(&pool, 1200, 500));
        assert!(table.begin_refresh(&pool, 1600, 500));
    }
}
