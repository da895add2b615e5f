//! CP-Bonding global-config decoder: a single program-wide singleton, not
//! pool-scoped, carrying the protocol-fee rate and a variable-length
//! fee-recipient list.

use super::{check_discriminator, read_address, read_u32};
use crate::errors::DecodeError;
use crate::pool::state::GlobalConfig;

pub const DISCRIMINATOR: [u8; 8] = [0x62, 0xd8, 0xa1, 0x0f, 0x9b, 0x2e, 0x7c, 0x44];

const PROTOCOL_FEE_BPS_OFFSET: usize = 8;
const RECIPIENT_COUNT_OFFSET: usize = 12;
const RECIPIENTS_OFFSET: usize = 16;

pub fn decode(data: &[u8]) -> Result<GlobalConfig, DecodeError> {
    check_discriminator(data, &DISCRIMINATOR)?;
    if data.len() < RECIPIENTS_OFFSET {
        return Err(DecodeError::Malformed);
    }

    let protocol_fee_bps = read_u32(data, PROTOCOL_FEE_BPS_OFFSET)?;
    let count = read_u32(data, RECIPIENT_COUNT_OFFSET)? as usize;

    let mut fee_recipients = Vec::with_capacity(count);
    let mut offset = RECIPIENTS_OFFSET;
    for _ in 0..count {
        fee_recipients.push(read_address(data, offset)?);
        offset += 32;
    }

    Ok(GlobalConfig { fee_recipients, protocol_fee_bps })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Address;

    fn fixture(recipients: &[Address]) -> Vec<u8> {
        let mut data = vec![0u8; RECIPIENTS_OFFSET + recipients.len() * 32];
        data[..8].copy_from_slice(&DISCRIMINATOR);
        data[PROTOCOL_FEE_BPS_OFFSET..PROTOCOL_FEE_BPS_OFFSET + 4].copy_from_slice(&100u32.to_le_bytes());
        data[RECIPIENT_COUNT_OFFSET..RECIPIENT_COUNT_OFFSET + 4].copy_from_slice(&(recipients.len() as u32).to_le_bytes());
        let mut offset = RECIPIENTS_OFFSET;
        for recipient in recipients {
            data[offset..offset + 32].copy_from_slice(recipient.as_bytes());
            offset += 32;
        }
        data
    }

    #[test]
    fn decodes_variable_length_recipient_list() {
        let recipients = vec![Address::new([1; 32]), Address::new([2; 32])];
        let config = decode(&fixture(&recipients)).unwrap();
        assert_eq!(config.protocol_fee_bps, 100);
        assert_eq!(config.fee_recipients, recipients);
    }

    #[test]
    fn decodes_empty_recipient_list() {
        let config = decode(&fixture(&[])).unwrap();
        assert!(config.fee_recipients.is_empty());
    }

    #[test]
    fn rejects_truncated_header_as_malformed() {
        let data = vec![0u8; RECIPIENTS_OFFSET - 1];
        assert_eq!(decode(&data), Err(DecodeError::Malformed));
    }
}
