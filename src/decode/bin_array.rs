//! Bin-AMM bin-array decoder: a pool-scoped bucket of bins, addressed by
//! `(pool, array_index)`. Mirrors `tick_array`'s shape — presence in the
//! cache, not bin contents, is what topology completeness checks against.

use super::{check_discriminator, read_address, read_i32};
use crate::errors::DecodeError;
use crate::pool::state::BinArray;

pub const DISCRIMINATOR: [u8; 8] = [0x5c, 0x3a, 0xd1, 0x9e, 0x22, 0x6f, 0xb4, 0x01];

const POOL_OFFSET: usize = 8;
const ARRAY_INDEX_OFFSET: usize = 40;
pub const MIN_ACCOUNT_LEN: usize = ARRAY_INDEX_OFFSET + 4;

pub fn decode(data: &[u8]) -> Result<BinArray, DecodeError> {
    check_discriminator(data, &DISCRIMINATOR)?;
    if data.len() < MIN_ACCOUNT_LEN {
        return Err(DecodeError::Malformed);
    }

    let pool = read_address(data, POOL_OFFSET)?;
    let array_index = read_i32(data, ARRAY_INDEX_OFFSET)?;

    Ok(BinArray { pool, array_index, raw: data.to_vec() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Address;

    fn fixture(array_index: i32) -> Vec<u8> {
        let mut data = vec![0u8; MIN_ACCOUNT_LEN];
        data[..8].copy_from_slice(&DISCRIMINATOR);
        data[POOL_OFFSET..POOL_OFFSET + 32].copy_from_slice(&[6u8; 32]);
        data[ARRAY_INDEX_OFFSET..ARRAY_INDEX_OFFSET + 4].copy_from_slice(&array_index.to_le_bytes());
        data
    }

    #[test]
    fn decodes_pool_and_array_index() {
        let bin_array = decode(&fixture(-2)).unwrap();
        assert_eq!(bin_array.pool, Address::new([6; 32]));
        assert_eq!(bin_array.array_index, -2);
    }

    #[test]
    fn rejects_truncated_as_malformed() {
        let data = fixture(0);
        let truncated = &data[..MIN_ACCOUNT_LEN - 1];
        assert_eq!(decode(truncated), Err(DecodeError::Malformed));
    }
}
