//! CL-AMM tick-array decoder: a pool-scoped bucket of ticks, addressed by
//! `(pool, start_tick_index)`. The detector never reads tick contents
//! directly — only presence in the cache matters for topology completeness —
//! so this decoder keeps the raw body instead of unpacking individual ticks.

use super::{check_discriminator, read_address, read_i32};
use crate::errors::DecodeError;
use crate::pool::state::TickArray;

pub const DISCRIMINATOR: [u8; 8] = [0x17, 0x92, 0x4e, 0x6b, 0x5d, 0xa3, 0x0f, 0x88];

const POOL_OFFSET: usize = 8;
const START_TICK_INDEX_OFFSET: usize = 40;
pub const MIN_ACCOUNT_LEN: usize = START_TICK_INDEX_OFFSET + 4;

pub fn decode(data: &[u8]) -> Result<TickArray, DecodeError> {
    check_discriminator(data, &DISCRIMINATOR)?;
    if data.len() < MIN_ACCOUNT_LEN {
        return Err(DecodeError::Malformed);
    }

    let pool = read_address(data, POOL_OFFSET)?;
    let start_tick_index = read_i32(data, START_TICK_INDEX_OFFSET)?;

    Ok(TickArray { pool, start_tick_index, raw: data.to_vec() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Address;

    fn fixture(start_tick_index: i32) -> Vec<u8> {
        let mut data = vec![0u8; MIN_ACCOUNT_LEN];
        data[..8].copy_from_slice(&DISCRIMINATOR);
        data[POOL_OFFSET..POOL_OFFSET + 32].copy_from_slice(&[4u8; 32]);
        data[START_TICK_INDEX_OFFSET..START_TICK_INDEX_OFFSET + 4].copy_from_slice(&start_tick_index.to_le_bytes());
        data
    }

    #[test]
    fn decodes_pool_and_start_tick_index() {
        let tick_array = decode(&fixture(-3840)).unwrap();
        assert_eq!(tick_array.pool, Address::new([4; 32]));
        assert_eq!(tick_array.start_tick_index, -3840);
    }

    #[test]
    fn rejects_truncated_as_malformed() {
        let data = fixture(0);
        let truncated = &data[..MIN_ACCOUNT_LEN - 2];
        assert_eq!(decode(truncated), Err(DecodeError::Malformed));
    }

    #[test]
    fn rejects_wrong_discriminator_as_not_this_kind() {
        let mut data = fixture(0);
        data[0] = 0xff;
        assert_eq!(decode(&data), Err(DecodeError::NotThisKind));
    }
}
