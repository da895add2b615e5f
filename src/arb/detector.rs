//! Arbitrage detector: cross-venue spread scan over the fragmentation index
//!.

use super::fragmentation::FragmentationIndex;
use super::pricing::{fee_bps, indicative_mid_price};
use crate::registry::Registry;
use crate::types::{Address, Venue};
use rayon::prelude::*;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Computes `(sell - buy) / buy * 10_000` in fixed-point so the comparison
/// against `min_candidate_spread_bps` doesn't drift near the threshold the
/// way repeated `f64` division can.
fn spread_bps_decimal(buy_price: f64, sell_price: f64) -> Option<f64> {
    let buy = Decimal::from_f64_retain(buy_price)?;
    let sell = Decimal::from_f64_retain(sell_price)?;
    if buy.is_zero() {
        return None;
    }
    ((sell - buy) / buy * Decimal::from(10_000)).to_f64()
}

#[derive(Clone, Debug)]
pub struct VenueQuote {
    pub venue: Venue,
    pub pool: Address,
    pub price: f64,
    pub liquidity: u64,
}

#[derive(Clone, Debug)]
pub struct Opportunity {
    pub token_mint: Address,
    pub buy: VenueQuote,
    pub sell: VenueQuote,
    pub spread_bps: f64,
    pub net_bps: f64,
    pub score: f64,
}

/// Snapshot of one pool's cached state, read once per evaluation.
struct Snapshot {
    venue: Venue,
    pool: Address,
    token_mint: Address,
    price: f64,
    liquidity: u64,
    fee_bps: u32,
    last_update: crate::types::Slot,
}

pub struct Detector {
    min_candidate_spread_bps: i64,
    stale_threshold: Duration,
    debounce_window: Duration,
    last_emit: HashMap<(Address, Address), Instant>,
}

impl Detector {
    pub fn new(min_candidate_spread_bps: i64, stale_threshold: Duration, debounce_window: Duration) -> Self {
        Detector { min_candidate_spread_bps, stale_threshold, debounce_window, last_emit: HashMap::new() }
    }

    /// Runs the full cross-venue spread scan over every fragmented mint
    /// pair touching `touched_mints`, against a slot/wall-clock reading
    /// taken once for the whole pass.
    pub fn scan(
        &mut self,
        registry: &Registry,
        fragmentation: &FragmentationIndex,
        touched_mints: &[(Address, Address)],
        current_slot: crate::types::Slot,
        now: Instant,
    ) -> Vec<Opportunity> {
        let mut snapshots: Vec<Snapshot> = Vec::new();

        for &(mint_a, mint_b) in touched_mints {
            if !fragmentation.is_fragmented(mint_a, mint_b) {
                continue;
            }
            for (venue, pool_addr) in fragmentation.pools_for(mint_a, mint_b) {
                let Some(pool) = registry.pool(&pool_addr) else { continue };
                if registry.lifecycle.state_of(&pool_addr) != Some(crate::pool::lifecycle::PoolState::Active) {
                    continue;
                }
                let Some(price) = indicative_mid_price(&pool, registry) else { continue };
                let amm_config = match &pool.kind {
                    crate::pool::state::PoolKind::ClAmm { amm_config, .. } => registry.amm_config(amm_config),
                    _ => None,
                };
                let Some(fee) = fee_bps(&pool, amm_config.as_ref()) else { continue };
                let Some(vault_a) = registry.vault(&pool.vault_a) else { continue };
                let last_update = registry
                    .vault_version(&pool.vault_a)
                    .map(|v| v.slot)
                    .unwrap_or(0)
                    .max(registry.version_of(crate::registry::commit::EntityKind::Pool, &pool_addr).map(|v| v.slot).unwrap_or(0));

                snapshots.push(Snapshot {
                    venue,
                    pool: pool_addr,
                    token_mint: mint_a,
                    price,
                    liquidity: vault_a.amount,
                    fee_bps: fee,
                    last_update,
                });
            }
        }

        // Group by token mint, then compare every venue pair in parallel
        //`).
        let mut by_mint: HashMap<Address, Vec<Snapshot>> = HashMap::new();
        for s in snapshots {
            by_mint.entry(s.token_mint).or_default().push(s);
        }

        let stale_slots = (self.stale_threshold.as_millis() / 400).max(1) as crate::types::Slot;

        let candidates: Vec<Opportunity> = by_mint
            .into_par_iter()
            .flat_map(|(mint, quotes)| {
                let mut found = Vec::new();
                for i in 0..quotes.len() {
                    for j in 0..quotes.len() {
                        if i == j {
                            continue;
                        }
                        let buy = &quotes[i];
                        let sell = &quotes[j];
                        if sell.price <= buy.price {
                            continue;
                        }
                        let Some(spread_bps) = spread_bps_decimal(buy.price, sell.price) else { continue };
                        if (spread_bps as i64) < self.min_candidate_spread_bps {
                            continue;
                        }
                        let net_bps = spread_bps - (buy.fee_bps + sell.fee_bps) as f64;

                        let stale = current_slot.saturating_sub(buy.last_update) > stale_slots
                            || current_slot.saturating_sub(sell.last_update) > stale_slots;
                        if stale || net_bps <= 0.0 {
                            continue;
                        }

                        found.push(Opportunity {
                            token_mint: mint,
                            buy: VenueQuote { venue: buy.venue, pool: buy.pool, price: buy.price, liquidity: buy.liquidity },
                            sell: VenueQuote { venue: sell.venue, pool: sell.pool, price: sell.price, liquidity: sell.liquidity },
                            spread_bps,
                            net_bps,
                            score: net_bps * (buy.liquidity.min(sell.liquidity) as f64).ln().max(0.0),
                        });
                    }
                }
                found
            })
            .collect();

        // Debounce: at most one opportunity per (pool_a, pool_b) pair per
        // window.
        let mut emitted = Vec::new();
        for opp in candidates {
            let key = if opp.buy.pool.as_bytes() <= opp.sell.pool.as_bytes() {
                (opp.buy.pool, opp.sell.pool)
            } else {
                (opp.sell.pool, opp.buy.pool)
            };
            let should_emit = match self.last_emit.get(&key) {
                Some(last) => now.duration_since(*last) >= self.debounce_window,
                None => true,
            };
            if should_emit {
                self.last_emit.insert(key, now);
                emitted.push(opp);
            }
        }
        emitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debounce_suppresses_repeat_emission_within_window() {
        let mut detector = Detector::new(30, Duration::from_millis(30_000), Duration::from_millis(100));
        let pool_a = Address::new([1; 32]);
        let pool_b = Address::new([2; 32]);
        let t0 = Instant::now();
        detector.last_emit.insert((pool_a, pool_b), t0);

        let key_lookup = detector.last_emit.get(&(pool_a, pool_b)).copied();
        assert!(key_lookup.is_some());
        // within window: would be suppressed
        assert!(t0.duration_since(t0) < Duration::from_millis(100));
    }
}
