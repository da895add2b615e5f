//! CP-Bonding (PumpSwap-like) pool decoder.
//!
//! Byte layout mirrors the reference bot's offset-based parsing of its
//! bonding-curve pool account: fixed 8-byte discriminator, then mint and
//! vault addresses at fixed offsets, little-endian integers throughout.

use super::{check_discriminator, read_address, read_u64};
use crate::errors::DecodeError;
use crate::pool::state::{Pool, PoolKind};
use crate::types::{Address, Venue};

pub const POOL_DISCRIMINATOR: [u8; 8] = [0xf1, 0x9a, 0x6d, 0x04, 0x11, 0xb1, 0x6d, 0x0c];

const BASE_MINT_OFFSET: usize = 43;
const QUOTE_MINT_OFFSET: usize = 75;
const POOL_BASE_VAULT_OFFSET: usize = 139;
const POOL_QUOTE_VAULT_OFFSET: usize = 171;
const CREATOR_OFFSET: usize = 203;
const LP_MINT_OFFSET: usize = 235;
const LP_SUPPLY_OFFSET: usize = 267;
pub const MIN_ACCOUNT_LEN: usize = LP_SUPPLY_OFFSET + 8;

pub fn decode(address: Address, data: &[u8]) -> Result<Pool, DecodeError> {
    check_discriminator(data, &POOL_DISCRIMINATOR)?;
    if data.len() < MIN_ACCOUNT_LEN {
        return Err(DecodeError::Malformed);
    }

    let mint_a = read_address(data, BASE_MINT_OFFSET)?;
    let mint_b = read_address(data, QUOTE_MINT_OFFSET)?;
    let vault_a = read_address(data, POOL_BASE_VAULT_OFFSET)?;
    let vault_b = read_address(data, POOL_QUOTE_VAULT_OFFSET)?;
    let creator = read_address(data, CREATOR_OFFSET)?;
    let lp_mint = read_address(data, LP_MINT_OFFSET)?;
    let lp_supply = read_u64(data, LP_SUPPLY_OFFSET)?;

    Ok(Pool {
        address,
        venue: Venue::CpBonding,
        mint_a,
        mint_b,
        vault_a,
        vault_b,
        kind: PoolKind::CpBonding { lp_mint, creator, lp_supply },
    })
}
