pub mod amm_config;
pub mod bin_amm;
pub mod bin_array;
pub mod bonding;
pub mod cl_amm;
pub mod cp_amm;
pub mod global_config;
pub mod tick_array;
pub mod token_account;

use crate::errors::DecodeError;

/// Reads a little-endian `u64` at `offset`, failing `Malformed` (not
/// `NotThisKind`) if the buffer is too short — the discriminator already
/// matched by the time callers reach field parsing.
pub fn read_u64(data: &[u8], offset: usize) -> Result<u64, DecodeError> {
    let bytes = data.get(offset..offset + 8).ok_or(DecodeError::Malformed)?;
    Ok(u64::from_le_bytes(bytes.try_into().unwrap()))
}

pub fn read_u128(data: &[u8], offset: usize) -> Result<u128, DecodeError> {
    let bytes = data.get(offset..offset + 16).ok_or(DecodeError::Malformed)?;
    Ok(u128::from_le_bytes(bytes.try_into().unwrap()))
}

pub fn read_u32(data: &[u8], offset: usize) -> Result<u32, DecodeError> {
    let bytes = data.get(offset..offset + 4).ok_or(DecodeError::Malformed)?;
    Ok(u32::from_le_bytes(bytes.try_into().unwrap()))
}

pub fn read_i32(data: &[u8], offset: usize) -> Result<i32, DecodeError> {
    read_u32(data, offset).map(|v| v as i32)
}

pub fn read_u16(data: &[u8], offset: usize) -> Result<u16, DecodeError> {
    let bytes = data.get(offset..offset + 2).ok_or(DecodeError::Malformed)?;
    Ok(u16::from_le_bytes(bytes.try_into().unwrap()))
}

/// Booleans are "non-zero is true" so a flag-byte expansion by the host
/// program does not break decoding.
pub fn read_bool(data: &[u8], offset: usize) -> Result<bool, DecodeError> {
    let byte = *data.get(offset).ok_or(DecodeError::Malformed)?;
    Ok(byte != 0)
}

pub fn read_address(data: &[u8], offset: usize) -> Result<crate::types::Address, DecodeError> {
    let bytes = data.get(offset..offset + 32).ok_or(DecodeError::Malformed)?;
    let mut arr = [0u8; 32];
    arr.copy_from_slice(bytes);
    Ok(crate::types::Address::new(arr))
}

pub fn check_discriminator(data: &[u8], expected: &[u8]) -> Result<(), DecodeError> {
    if data.len() < expected.len() {
        return Err(DecodeError::NotThisKind);
    }
    if &data[..expected.len()] != expected {
        return Err(DecodeError::NotThisKind);
    }
    Ok(())
}
