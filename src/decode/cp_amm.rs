//! CP-AMM (Raydium V4-like) pool decoder.
//!
//! No Anchor discriminator — the reference bot's Raydium V4 layout is a
//! plain `#[repr(C)]` struct; decoders instead key off (data length, owner
//! program) as the "kind" signal and parse fixed offsets directly.

use super::{read_address, read_u64};
use crate::errors::DecodeError;
use crate::pool::state::{Pool, PoolKind};
use crate::types::{Address, Venue};

const STATUS_OFFSET: usize = 0;
const NONCE_OFFSET: usize = 8;
const OPEN_TIME_OFFSET: usize = 16;
const COIN_VAULT_OFFSET: usize = 40;
const PC_VAULT_OFFSET: usize = 72;
const COIN_MINT_OFFSET: usize = 104;
const PC_MINT_OFFSET: usize = 136;
const LP_MINT_OFFSET: usize = 168;
pub const MIN_ACCOUNT_LEN: usize = LP_MINT_OFFSET + 32;

/// Raydium V4 AMM account bodies are exactly this length in the reference
/// program; a mismatch means this decoder is the wrong kind for the data.
pub const EXPECTED_ACCOUNT_LEN: usize = 752;

pub fn decode(address: Address, data: &[u8]) -> Result<Pool, DecodeError> {
    if data.len() != EXPECTED_ACCOUNT_LEN {
        return Err(DecodeError::NotThisKind);
    }
    if data.len() < MIN_ACCOUNT_LEN {
        return Err(DecodeError::Malformed);
    }

    let status = read_u64(data, STATUS_OFFSET)?;
    let nonce = read_u64(data, NONCE_OFFSET)?;
    let open_time = read_u64(data, OPEN_TIME_OFFSET)? as i64;
    let vault_a = read_address(data, COIN_VAULT_OFFSET)?;
    let vault_b = read_address(data, PC_VAULT_OFFSET)?;
    let mint_a = read_address(data, COIN_MINT_OFFSET)?;
    let mint_b = read_address(data, PC_MINT_OFFSET)?;
    let lp_mint = read_address(data, LP_MINT_OFFSET)?;

    Ok(Pool {
        address,
        venue: Venue::CpAmm,
        mint_a,
        mint_b,
        vault_a,
        vault_b,
        kind: PoolKind::CpAmm { lp_mint, amm_authority_nonce: nonce as u8, status: status as u8, open_time },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> Vec<u8> {
        let mut data = vec![0u8; EXPECTED_ACCOUNT_LEN];
        data[STATUS_OFFSET..STATUS_OFFSET + 8].copy_from_slice(&6u64.to_le_bytes());
        data[NONCE_OFFSET..NONCE_OFFSET + 8].copy_from_slice(&254u64.to_le_bytes());
        data[OPEN_TIME_OFFSET..OPEN_TIME_OFFSET + 8].copy_from_slice(&1_700_000_000u64.to_le_bytes());
        data[COIN_VAULT_OFFSET..COIN_VAULT_OFFSET + 32].copy_from_slice(&[1u8; 32]);
        data[PC_VAULT_OFFSET..PC_VAULT_OFFSET + 32].copy_from_slice(&[2u8; 32]);
        data[COIN_MINT_OFFSET..COIN_MINT_OFFSET + 32].copy_from_slice(&[3u8; 32]);
        data[PC_MINT_OFFSET..PC_MINT_OFFSET + 32].copy_from_slice(&[4u8; 32]);
        data[LP_MINT_OFFSET..LP_MINT_OFFSET + 32].copy_from_slice(&[5u8; 32]);
        data
    }

    #[test]
    fn decodes_well_formed_pool() {
        let pool = decode(Address::new([1; 32]), &fixture()).unwrap();
        assert_eq!(pool.venue, Venue::CpAmm);
        assert_eq!(pool.vault_a, Address::new([1; 32]));
        match pool.kind {
            PoolKind::CpAmm { amm_authority_nonce, status, .. } => {
                assert_eq!(amm_authority_nonce, 254);
                assert_eq!(status, 6);
            }
            _ => panic!("wrong kind"),
        }
    }

    #[test]
    fn rejects_wrong_length_as_not_this_kind() {
        let data = vec![0u8; 10];
        assert_eq!(decode(Address::new([1; 32]), &data), Err(DecodeError::NotThisKind));
    }
}
