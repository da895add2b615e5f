//! Indicative mid-price and fee-rate derivation per venue.

use crate::pool::state::{AmmConfig, Pool, PoolKind, Vault};
use crate::registry::Registry;

/// Mid-price of `mint_b` denominated in `mint_a`, from cached reserves or
/// venue-specific state. Returns `None` if a dependency is not cached yet.
pub fn indicative_mid_price(pool: &Pool, registry: &Registry) -> Option<f64> {
    match &pool.kind {
        PoolKind::CpBonding { .. } | PoolKind::CpAmm { .. } => {
            let vault_a = registry.vault(&pool.vault_a)?;
            let vault_b = registry.vault(&pool.vault_b)?;
            constant_product_price(&vault_a, &vault_b)
        }
        PoolKind::ClAmm { sqrt_price_x64, .. } => Some(cl_amm_price(*sqrt_price_x64)),
        PoolKind::BinAmm { active_id, bin_step, .. } => Some(bin_amm_price(*active_id, *bin_step)),
    }
}

fn constant_product_price(vault_a: &Vault, vault_b: &Vault) -> Option<f64> {
    if vault_a.amount == 0 {
        return None;
    }
    Some(vault_b.amount as f64 / vault_a.amount as f64)
}

/// `sqrt_price^2` is authoritative; computing price from vault ratios for a
/// CL-AMM pool was documented as buggy upstream and is never done here
///.
pub fn cl_amm_price(sqrt_price_x64: u128) -> f64 {
    let sqrt_price = sqrt_price_x64 as f64 / (1u128 << 64) as f64;
    sqrt_price * sqrt_price
}

/// Standard bin pricing: `price = (1 + bin_step / 10_000) ^ active_id`.
pub fn bin_amm_price(active_id: i32, bin_step: u16) -> f64 {
    let base = 1.0 + (bin_step as f64) / 10_000.0;
    base.powi(active_id)
}

/// Exact per-pool fee in basis points. CL-AMM and
/// Bin-AMM must quote the pool's own cached fee; CP variants use the fixed
/// venue constants. A Bin-AMM pool whose exact fee is unavailable must not
/// be quoted at all.
pub fn fee_bps(pool: &Pool, amm_config: Option<&AmmConfig>) -> Option<u32> {
    match &pool.kind {
        PoolKind::CpBonding { .. } => Some(crate::constants::CP_BONDING_FEE_BPS),
        PoolKind::CpAmm { .. } => Some(crate::constants::CP_AMM_FEE_BPS),
        PoolKind::ClAmm { .. } => amm_config.map(|c| c.trade_fee_rate_bps),
        PoolKind::BinAmm { base_factor, bin_step, .. } => {
            // Meteora-style dynamic fee approximation: base_factor * bin_step,
            // in hundred-thousandths, converted to basis points. No default:
            // a zero base_factor means the exact fee genuinely is unavailable.
            if *base_factor == 0 {
                None
            } else {
                let raw = (*base_factor as u64) * (*bin_step as u64);
                Some((raw / 100) as u32)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cl_amm_price_of_unity_sqrt_price_is_one() {
        let sqrt_price_x64 = 1u128 << 64;
        assert!((cl_amm_price(sqrt_price_x64) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn bin_amm_price_increases_with_active_id() {
        let low = bin_amm_price(0, 10);
        let high = bin_amm_price(100, 10);
        assert!(high > low);
        assert!((low - 1.0).abs() < 1e-9);
    }

    #[test]
    fn bin_amm_refuses_to_quote_without_exact_fee() {
        let pool = Pool {
            address: crate::types::Address::new([1; 32]),
            venue: crate::types::Venue::BinAmm,
            mint_a: crate::types::Address::new([2; 32]),
            mint_b: crate::types::Address::new([3; 32]),
            vault_a: crate::types::Address::new([4; 32]),
            vault_b: crate::types::Address::new([5; 32]),
            kind: PoolKind::BinAmm {
                active_id: 0,
                bin_step: 10,
                base_factor: 0,
                protocol_share: 0,
                volatility_accumulator: 0,
                populated_bin_arrays: 0,
                oracle: crate::types::Address::new([6; 32]),
            },
        };
        assert_eq!(fee_bps(&pool, None), None);
    }
}
