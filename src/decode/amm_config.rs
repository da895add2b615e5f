//! CL-AMM fee-tier config decoder: one config account is shared by every
//! pool on that tier, so unlike a pool or vault it carries no address of its
//! own — the registry keys it by its account address, same as everything
//! else.

use super::{check_discriminator, read_u16, read_u32};
use crate::errors::DecodeError;
use crate::pool::state::AmmConfig;

pub const DISCRIMINATOR: [u8; 8] = [0x9d, 0x41, 0x2c, 0x77, 0xe8, 0x03, 0x55, 0xf0];

const TRADE_FEE_RATE_OFFSET: usize = 8;
const TICK_SPACING_OFFSET: usize = 12;
pub const MIN_ACCOUNT_LEN: usize = TICK_SPACING_OFFSET + 2;

pub fn decode(data: &[u8]) -> Result<AmmConfig, DecodeError> {
    check_discriminator(data, &DISCRIMINATOR)?;
    if data.len() < MIN_ACCOUNT_LEN {
        return Err(DecodeError::Malformed);
    }

    let trade_fee_rate_bps = read_u32(data, TRADE_FEE_RATE_OFFSET)?;
    let tick_spacing = read_u16(data, TICK_SPACING_OFFSET)?;

    Ok(AmmConfig { trade_fee_rate_bps, tick_spacing })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(trade_fee_rate_bps: u32, tick_spacing: u16) -> Vec<u8> {
        let mut data = vec![0u8; MIN_ACCOUNT_LEN];
        data[..8].copy_from_slice(&DISCRIMINATOR);
        data[TRADE_FEE_RATE_OFFSET..TRADE_FEE_RATE_OFFSET + 4].copy_from_slice(&trade_fee_rate_bps.to_le_bytes());
        data[TICK_SPACING_OFFSET..TICK_SPACING_OFFSET + 2].copy_from_slice(&tick_spacing.to_le_bytes());
        data
    }

    #[test]
    fn decodes_fee_rate_and_tick_spacing() {
        let config = decode(&fixture(25, 64)).unwrap();
        assert_eq!(config.trade_fee_rate_bps, 25);
        assert_eq!(config.tick_spacing, 64);
    }

    #[test]
    fn rejects_truncated_as_malformed() {
        let data = fixture(25, 64);
        let truncated = &data[..MIN_ACCOUNT_LEN - 1];
        assert_eq!(decode(truncated), Err(DecodeError::Malformed));
    }
}
