//! Entity types held in the cache registry.

use crate::types::{Address, Venue};

#[derive(Clone, Debug, PartialEq)]
pub enum PoolKind {
    CpBonding {
        lp_mint: Address,
        creator: Address,
        lp_supply: u64,
    },
    CpAmm {
        lp_mint: Address,
        amm_authority_nonce: u8,
        status: u8,
        open_time: i64,
    },
    ClAmm {
        amm_config: Address,
        tick_spacing: u16,
        tick_current: i32,
        liquidity: u128,
        /// Q64.64 fixed point.
        sqrt_price_x64: u128,
        tick_array_lower: Address,
        tick_array_upper: Address,
    },
    BinAmm {
        active_id: i32,
        bin_step: u16,
        base_factor: u16,
        protocol_share: u16,
        volatility_accumulator: u32,
        populated_bin_arrays: u64,
        oracle: Address,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Pool {
    pub address: Address,
    pub venue: Venue,
    pub mint_a: Address,
    pub mint_b: Address,
    pub vault_a: Address,
    pub vault_b: Address,
    pub kind: PoolKind,
}

impl Pool {
    pub fn mints(&self) -> (Address, Address) {
        (self.mint_a, self.mint_b)
    }

    pub fn vaults(&self) -> [Address; 2] {
        [self.vault_a, self.vault_b]
    }
}

/// SPL-token-like account: balance at a fixed offset.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vault {
    pub amount: u64,
}

/// Pool-scoped array of discrete ticks, addressed by `(pool, start_tick_index)`.
/// Carrying the exact tick grid is out of scope for pricing — sqrt_price is
/// authoritative — so the cache only needs enough to satisfy
/// topology-completeness checks and to feed a future simulator.
#[derive(Clone, Debug, PartialEq)]
pub struct TickArray {
    pub pool: Address,
    pub start_tick_index: i32,
    pub raw: Vec<u8>,
}

/// Pool-scoped array of bins, addressed by `(pool, array_index)`.
#[derive(Clone, Debug, PartialEq)]
pub struct BinArray {
    pub pool: Address,
    pub array_index: i32,
    pub raw: Vec<u8>,
}

/// Fee tier / trade-fee-rate table shared by many CL-AMM pools.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AmmConfig {
    pub trade_fee_rate_bps: u32,
    pub tick_spacing: u16,
}

/// Protocol-fee recipient set and program-level constants (CP-Bonding only).
#[derive(Clone, Debug, PartialEq)]
pub struct GlobalConfig {
    pub fee_recipients: Vec<Address>,
    pub protocol_fee_bps: u32,
}

/// Computes the bin-array index containing `active_id`, and the three
/// adjacent indices a swap touching that bin might also need.
pub fn bin_array_index(active_id: i32, bins_per_array: i32) -> i32 {
    active_id.div_euclid(bins_per_array)
}

pub fn adjacent_bin_array_indices(active_id: i32, bins_per_array: i32) -> [i32; 3] {
    let center = bin_array_index(active_id, bins_per_array);
    [center - 1, center, center + 1]
}
