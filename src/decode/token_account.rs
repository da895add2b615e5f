//! SPL-token-like vault decoder: balance is a little-endian
//! `u64` 64 bytes into the account body (mint: 32, owner: 32, amount: 8, ...).

use super::read_u64;
use crate::errors::DecodeError;
use crate::pool::state::Vault;

const AMOUNT_OFFSET: usize = 64;
pub const MIN_ACCOUNT_LEN: usize = AMOUNT_OFFSET + 8;

pub fn decode(data: &[u8]) -> Result<Vault, DecodeError> {
    if data.len() < MIN_ACCOUNT_LEN {
        return Err(DecodeError::Malformed);
    }
    let amount = read_u64(data, AMOUNT_OFFSET)?;
    Ok(Vault { amount })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_balance_at_fixed_offset() {
        let mut data = vec![0u8; MIN_ACCOUNT_LEN];
        data[AMOUNT_OFFSET..AMOUNT_OFFSET + 8].copy_from_slice(&42_000u64.to_le_bytes());
        assert_eq!(decode(&data).unwrap().amount, 42_000);
    }

    #[test]
    fn rejects_body_shorter_than_layout_minimum() {
        let data = vec![0u8; MIN_ACCOUNT_LEN - 1];
        assert_eq!(decode(&data), Err(DecodeError::Malformed));
    }
}
