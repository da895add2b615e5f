//! Bin-AMM (Meteora DLMM-like) pool decoder.

use super::{check_discriminator, read_address, read_i32, read_u16, read_u32, read_u64};
use crate::errors::DecodeError;
use crate::pool::state::{Pool, PoolKind};
use crate::types::{Address, Venue};

pub const POOL_DISCRIMINATOR: [u8; 8] = [0x21, 0xc3, 0x62, 0x9a, 0x55, 0x0f, 0x88, 0xe6];

const TOKEN_X_MINT_OFFSET: usize = 9;
const TOKEN_Y_MINT_OFFSET: usize = 41;
const RESERVE_X_OFFSET: usize = 73;
const RESERVE_Y_OFFSET: usize = 105;
const ACTIVE_ID_OFFSET: usize = 137;
const BIN_STEP_OFFSET: usize = 141;
const BASE_FACTOR_OFFSET: usize = 143;
const PROTOCOL_SHARE_OFFSET: usize = 145;
const VOLATILITY_ACCUMULATOR_OFFSET: usize = 147;
const BIN_ARRAY_BITMAP_OFFSET: usize = 151;
const ORACLE_OFFSET: usize = 159;
pub const MIN_ACCOUNT_LEN: usize = ORACLE_OFFSET + 32;

pub fn decode(address: Address, data: &[u8]) -> Result<Pool, DecodeError> {
    check_discriminator(data, &POOL_DISCRIMINATOR)?;
    if data.len() < MIN_ACCOUNT_LEN {
        return Err(DecodeError::Malformed);
    }

    let mint_a = read_address(data, TOKEN_X_MINT_OFFSET)?;
    let mint_b = read_address(data, TOKEN_Y_MINT_OFFSET)?;
    let vault_a = read_address(data, RESERVE_X_OFFSET)?;
    let vault_b = read_address(data, RESERVE_Y_OFFSET)?;
    let active_id = read_i32(data, ACTIVE_ID_OFFSET)?;
    let bin_step = read_u16(data, BIN_STEP_OFFSET)?;
    let base_factor = read_u16(data, BASE_FACTOR_OFFSET)?;
    let protocol_share = read_u16(data, PROTOCOL_SHARE_OFFSET)?;
    let volatility_accumulator = read_u32(data, VOLATILITY_ACCUMULATOR_OFFSET)?;
    let populated_bin_arrays = read_u64(data, BIN_ARRAY_BITMAP_OFFSET)?;
    let oracle = read_address(data, ORACLE_OFFSET)?;

    Ok(Pool {
        address,
        venue: Venue::BinAmm,
        mint_a,
        mint_b,
        vault_a,
        vault_b,
        kind: PoolKind::BinAmm {
            active_id,
            bin_step,
            base_factor,
            protocol_share,
            volatility_accumulator,
            populated_bin_arrays,
            oracle,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(active_id: i32) -> Vec<u8> {
        let mut data = vec![0u8; MIN_ACCOUNT_LEN];
        data[..8].copy_from_slice(&POOL_DISCRIMINATOR);
        data[TOKEN_X_MINT_OFFSET..TOKEN_X_MINT_OFFSET + 32].copy_from_slice(&[1u8; 32]);
        data[TOKEN_Y_MINT_OFFSET..TOKEN_Y_MINT_OFFSET + 32].copy_from_slice(&[2u8; 32]);
        data[RESERVE_X_OFFSET..RESERVE_X_OFFSET + 32].copy_from_slice(&[3u8; 32]);
        data[RESERVE_Y_OFFSET..RESERVE_Y_OFFSET + 32].copy_from_slice(&[4u8; 32]);
        data[ACTIVE_ID_OFFSET..ACTIVE_ID_OFFSET + 4].copy_from_slice(&active_id.to_le_bytes());
        data[BIN_STEP_OFFSET..BIN_STEP_OFFSET + 2].copy_from_slice(&10u16.to_le_bytes());
        data
    }

    #[test]
    fn decodes_well_formed_pool() {
        let pool = decode(Address::new([5; 32]), &fixture(150)).unwrap();
        assert_eq!(pool.venue, Venue::BinAmm);
        match pool.kind {
            PoolKind::BinAmm { active_id, bin_step, .. } => {
                assert_eq!(active_id, 150);
                assert_eq!(bin_step, 10);
            }
            _ => panic!("wrong kind"),
        }
    }

    #[test]
    fn decodes_negative_active_id() {
        let pool = decode(Address::new([5; 32]), &fixture(-42)).unwrap();
        match pool.kind {
            PoolKind::BinAmm { active_id, .. } => assert_eq!(active_id, -42),
            _ => panic!("wrong kind"),
        }
    }
}
