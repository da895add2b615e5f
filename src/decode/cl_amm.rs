//! CL-AMM (Raydium CLMM-like) pool decoder.
//!
//! `sqrt_price_x64` is the authoritative pricing input; `tick_current` is carried alongside for the boundary check
//! only and must never be used to derive reserves outside a simulator.

use super::{check_discriminator, read_address, read_i32, read_u128, read_u16};
use crate::errors::DecodeError;
use crate::pool::state::{Pool, PoolKind};
use crate::types::{Address, Venue};

pub const POOL_DISCRIMINATOR: [u8; 8] = [0x24, 0x7d, 0x2d, 0xd6, 0x4c, 0x2b, 0x14, 0x1f];

const AMM_CONFIG_OFFSET: usize = 9;
const TOKEN_MINT_0_OFFSET: usize = 73;
const TOKEN_MINT_1_OFFSET: usize = 105;
const TOKEN_VAULT_0_OFFSET: usize = 137;
const TOKEN_VAULT_1_OFFSET: usize = 169;
const TICK_SPACING_OFFSET: usize = 235;
const LIQUIDITY_OFFSET: usize = 237;
const SQRT_PRICE_OFFSET: usize = 253;
const TICK_CURRENT_OFFSET: usize = 269;
const TICK_ARRAY_LOWER_OFFSET: usize = 273;
const TICK_ARRAY_UPPER_OFFSET: usize = 305;
pub const MIN_ACCOUNT_LEN: usize = TICK_ARRAY_UPPER_OFFSET + 32;

pub fn decode(address: Address, data: &[u8]) -> Result<Pool, DecodeError> {
    check_discriminator(data, &POOL_DISCRIMINATOR)?;
    if data.len() < MIN_ACCOUNT_LEN {
        return Err(DecodeError::Malformed);
    }

    let amm_config = read_address(data, AMM_CONFIG_OFFSET)?;
    let mint_a = read_address(data, TOKEN_MINT_0_OFFSET)?;
    let mint_b = read_address(data, TOKEN_MINT_1_OFFSET)?;
    let vault_a = read_address(data, TOKEN_VAULT_0_OFFSET)?;
    let vault_b = read_address(data, TOKEN_VAULT_1_OFFSET)?;
    let tick_spacing = read_u16(data, TICK_SPACING_OFFSET)?;
    let liquidity = read_u128(data, LIQUIDITY_OFFSET)?;
    let sqrt_price_x64 = read_u128(data, SQRT_PRICE_OFFSET)?;
    let tick_current = read_i32(data, TICK_CURRENT_OFFSET)?;
    let tick_array_lower = read_address(data, TICK_ARRAY_LOWER_OFFSET)?;
    let tick_array_upper = read_address(data, TICK_ARRAY_UPPER_OFFSET)?;

    Ok(Pool {
        address,
        venue: Venue::ClAmm,
        mint_a,
        mint_b,
        vault_a,
        vault_b,
        kind: PoolKind::ClAmm {
            amm_config,
            tick_spacing,
            tick_current,
            liquidity,
            sqrt_price_x64,
            tick_array_lower,
            tick_array_upper,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> Vec<u8> {
        let mut data = vec![0u8; MIN_ACCOUNT_LEN];
        data[..8].copy_from_slice(&POOL_DISCRIMINATOR);
        data[AMM_CONFIG_OFFSET..AMM_CONFIG_OFFSET + 32].copy_from_slice(&[1u8; 32]);
        data[TOKEN_MINT_0_OFFSET..TOKEN_MINT_0_OFFSET + 32].copy_from_slice(&[2u8; 32]);
        data[TOKEN_MINT_1_OFFSET..TOKEN_MINT_1_OFFSET + 32].copy_from_slice(&[3u8; 32]);
        data[TOKEN_VAULT_0_OFFSET..TOKEN_VAULT_0_OFFSET + 32].copy_from_slice(&[4u8; 32]);
        data[TOKEN_VAULT_1_OFFSET..TOKEN_VAULT_1_OFFSET + 32].copy_from_slice(&[5u8; 32]);
        data[TICK_SPACING_OFFSET..TICK_SPACING_OFFSET + 2].copy_from_slice(&64u16.to_le_bytes());
        data[LIQUIDITY_OFFSET..LIQUIDITY_OFFSET + 16].copy_from_slice(&1_000_000_000u128.to_le_bytes());
        data[SQRT_PRICE_OFFSET..SQRT_PRICE_OFFSET + 16].copy_from_slice(&(1u128 << 64).to_le_bytes());
        data[TICK_CURRENT_OFFSET..TICK_CURRENT_OFFSET + 4].copy_from_slice(&0i32.to_le_bytes());
        data
    }

    #[test]
    fn decodes_well_formed_pool() {
        let pool = decode(Address::new([7; 32]), &fixture()).unwrap();
        assert_eq!(pool.venue, Venue::ClAmm);
        match pool.kind {
            PoolKind::ClAmm { tick_spacing, sqrt_price_x64, .. } => {
                assert_eq!(tick_spacing, 64);
                assert_eq!(sqrt_price_x64, 1u128 << 64);
            }
            _ => panic!("wrong kind"),
        }
    }

    #[test]
    fn rejects_truncated_as_malformed() {
        let data = vec![0u8; 8];
        let mut d = data;
        d[..8].copy_from_slice(&POOL_DISCRIMINATOR);
        assert_eq!(decode(Address::new([7; 32]), &d), Err(DecodeError::Malformed));
    }
}
