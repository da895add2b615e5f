//! Topology oracle: derives the finite dependency set a pool needs, and the
//! orphan buffer for tick/bin arrays that arrive before their pool.
//!
//! The actual async bulk-fetch is orchestrated by `Engine` (it needs the
//! RPC pool and the registry together); this module holds the pure
//! derivation logic and the buffering structure so both can be unit tested
//! without a network.

use crate::pool::state::{adjacent_bin_array_indices, Pool, PoolKind};
use crate::types::{Address, Slot, Version};
use solana_sdk::pubkey::Pubkey;
use std::collections::{HashSet, VecDeque};
use std::time::{Duration, Instant};

/// Tags each address `derive_topology_dependencies` returns with the decoder
/// the bootstrap fetcher must use to turn its raw bytes into a `Payload`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DependencyKind {
    Vault,
    Tick,
    Bin,
    AmmConfig,
}

/// Derives `topology(pool)` from decoded pool state, tagged with the kind of
/// account each dependency address names so a caller can route fetched bytes
/// to the right decoder.
pub fn derive_topology_dependencies(pool: &Pool, tick_array_radius: i32, bin_array_radius: i32) -> Vec<(Address, DependencyKind)> {
    let mut deps = vec![(pool.vault_a, DependencyKind::Vault), (pool.vault_b, DependencyKind::Vault)];

    match &pool.kind {
        PoolKind::CpBonding { .. } | PoolKind::CpAmm { .. } => {
            // vaults already inserted above; nothing venue-specific to add.
        }
        PoolKind::ClAmm { amm_config, tick_spacing, tick_current, .. } => {
            deps.push((*amm_config, DependencyKind::AmmConfig));
            for addr in derive_tick_array_addresses(&pool.address, *tick_spacing, *tick_current, tick_array_radius) {
                deps.push((addr, DependencyKind::Tick));
            }
        }
        PoolKind::BinAmm { active_id, .. } => {
            for addr in derive_bin_array_addresses(&pool.address, *active_id, bin_array_radius) {
                deps.push((addr, DependencyKind::Bin));
            }
        }
    }

    deps
}

/// `derive_topology_dependencies`, flattened to the bare key set `freeze`
/// stores as the pool's frozen `Topology`.
pub fn derive_topology_keys(pool: &Pool, tick_array_radius: i32, bin_array_radius: i32) -> HashSet<Address> {
    derive_topology_dependencies(pool, tick_array_radius, bin_array_radius).into_iter().map(|(addr, _)| addr).collect()
}

const TICKS_PER_ARRAY: i32 = 60;

/// `2k+1` tick-array PDAs centered on the current tick.
pub fn derive_tick_array_addresses(pool: &Address, tick_spacing: u16, tick_current: i32, radius: i32) -> Vec<Address> {
    let span = tick_spacing as i32 * TICKS_PER_ARRAY;
    let center = tick_current.div_euclid(span.max(1));
    (center - radius..=center + radius)
        .map(|array_idx| {
            let start_tick = array_idx * span;
            tick_array_pda(pool, start_tick)
        })
        .collect()
}

/// `2k+1` bin-array PDAs centered on the active bin.
pub fn derive_bin_array_addresses(pool: &Address, active_id: i32, radius: i32) -> Vec<Address> {
    let center = crate::pool::state::bin_array_index(active_id, crate::constants::BINS_PER_ARRAY);
    (center - radius..=center + radius).map(|idx| bin_array_pda(pool, idx)).collect()
}

fn tick_array_pda(pool: &Address, start_tick: i32) -> Address {
    let (pda, _bump) = Pubkey::find_program_address(
        &[b"tick_array", pool.as_bytes(), &start_tick.to_le_bytes()],
        &crate::constants::CL_AMM_PROGRAM.to_pubkey(),
    );
    Address::from_pubkey(&pda)
}

fn bin_array_pda(pool: &Address, array_index: i32) -> Address {
    let (pda, _bump) = Pubkey::find_program_address(
        &[b"bin_array", pool.as_bytes(), &array_index.to_le_bytes()],
        &crate::constants::BIN_AMM_PROGRAM.to_pubkey(),
    );
    Address::from_pubkey(&pda)
}

/// For a CL-AMM pool with frozen window `[lo, hi]` array indices and current
/// tick `t_cur`, whether the window edge is within `boundary_buffer` arrays.
pub fn cl_amm_needs_refresh(tick_spacing: u16, tick_current: i32, lo: i32, hi: i32, boundary_buffer: i32) -> bool {
    let span = tick_spacing as i32 * TICKS_PER_ARRAY;
    let a_cur = tick_current.div_euclid(span.max(1));
    a_cur - lo < boundary_buffer || hi - a_cur < boundary_buffer
}

/// Analogous test for Bin-AMM on bin-array indices.
pub fn bin_amm_needs_refresh(active_id: i32, lo: i32, hi: i32, boundary_buffer: i32) -> bool {
    let a_cur = crate::pool::state::bin_array_index(active_id, crate::constants::BINS_PER_ARRAY);
    a_cur - lo < boundary_buffer || hi - a_cur < boundary_buffer
}

#[derive(Clone)]
pub enum OrphanPayload {
    Tick(crate::pool::state::TickArray),
    Bin(crate::pool::state::BinArray),
}

struct OrphanEntry {
    key: Address,
    owning_pool: Address,
    payload: OrphanPayload,
    version: Version,
    queued_at: Instant,
}

/// Buffers tick/bin-array updates whose owning pool is not yet known.
/// Bounded and TTL-evicted so a flood of updates for pools nobody
/// discovers cannot grow this unboundedly.
pub struct OrphanBuffer {
    entries: VecDeque<OrphanEntry>,
    capacity: usize,
    ttl: Duration,
}

impl OrphanBuffer {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        OrphanBuffer { entries: VecDeque::new(), capacity, ttl }
    }

    pub fn push(&mut self, key: Address, owning_pool: Address, payload: OrphanPayload, version: Version) {
        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(OrphanEntry { key, owning_pool, payload, version, queued_at: Instant::now() });
    }

    /// Evicts entries past their TTL. Must be called periodically by the
    /// owner; this module performs no background scheduling of its own.
    pub fn evict_expired(&mut self) {
        let ttl = self.ttl;
        self.entries.retain(|e| e.queued_at.elapsed() < ttl);
    }

    /// Removes and returns every buffered update for `pool`, in arrival
    /// order, so the caller can drain them through `commit` before the RPC
    /// bootstrap starts.
    pub fn take_for_pool(&mut self, pool: &Address) -> Vec<(Address, OrphanPayload, Version)> {
        let mut claimed = Vec::new();
        let mut remaining = VecDeque::with_capacity(self.entries.len());
        for entry in self.entries.drain(..) {
            if entry.owning_pool == *pool {
                claimed.push((entry.key, entry.payload, entry.version));
            } else {
                remaining.push_back(entry);
            }
        }
        self.entries = remaining;
        claimed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Minimum slots between boundary-triggered refreshes for a single pool,
/// expressed as a slot count derived from a millisecond interval at
/// Solana's ~400ms slot.
pub fn refresh_min_interval_slots(refresh_interval: Duration) -> Slot {
    (refresh_interval.as_millis() / 400).max(1) as Slot
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::state::{BinArray, TickArray};

    #[test]
    fn orphan_claim_returns_entries_in_arrival_order_and_clears_them() {
        let mut buf = OrphanBuffer::new(16, Duration::from_secs(60));
        let pool = Address::new([9; 32]);
        let other_pool = Address::new([8; 32]);
        let k1 = Address::new([1; 32]);
        let k2 = Address::new([2; 32]);

        buf.push(k1, pool, OrphanPayload::Tick(TickArray { pool, start_tick_index: 0, raw: vec![] }), Version::new(200, 0));
        buf.push(
            Address::new([3; 32]),
            other_pool,
            OrphanPayload::Bin(BinArray { pool: other_pool, array_index: 0, raw: vec![] }),
            Version::new(201, 0),
        );
        buf.push(k2, pool, OrphanPayload::Tick(TickArray { pool, start_tick_index: 60, raw: vec![] }), Version::new(202, 0));

        let claimed = buf.take_for_pool(&pool);
        assert_eq!(claimed.len(), 2);
        assert_eq!(claimed[0].0, k1);
        assert_eq!(claimed[1].0, k2);
        assert_eq!(buf.len(), 1); // only the other pool's entry remains
        assert!(buf.take_for_pool(&pool).is_empty());
    }

    #[test]
    fn cl_amm_boundary_check_fires_near_either_edge() {
        // window [0, 2], tick_spacing=64, TICKS_PER_ARRAY=60 -> span=3840
        assert!(cl_amm_needs_refresh(64, 0, 0, 2, 1)); // a_cur=0, near lower edge
        assert!(!cl_amm_needs_refresh(64, 3840, 0, 2, 1)); // a_cur=1, centered
        assert!(cl_amm_needs_refresh(64, 7680, 0, 2, 1)); // a_cur=2, near upper edge
    }

    #[test]
    fn bin_amm_adjacent_indices_match_boundary_window() {
        let center_indices = adjacent_bin_array_indices(75, 70);
        assert_eq!(center_indices, [0, 1, 2]);
        assert!(bin_amm_needs_refresh(75, 0, 2, 1)); // index 1, window [0,2]: both edges within buffer 1
        assert!(!bin_amm_needs_refresh(220, 0, 6, 1)); // index 3, window [0,6]: 3 arrays from either edge
    }
}
