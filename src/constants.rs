//! Canonical program addresses, tip accounts, and quote mints.
//!
//! Declared once here instead of once per decoder: four decoders and the
//! bundle builder all need the same program and mint addresses.

use crate::types::Address;
use std::str::FromStr;
use std::sync::LazyLock;

macro_rules! addr {
    ($s:expr) => {
        LazyLock::new(|| Address::from_str($s).expect("constant address is valid base58"))
    };
}

/// CP-Bonding venue program (PumpSwap-like).
pub static CP_BONDING_PROGRAM: LazyLock<Address> = addr!("pAMMBay6oceH9fJKBRHGP5D4bD4sWpmSwMn52FMfXEA");
/// CP-AMM venue program (Raydium V4-like).
pub static CP_AMM_PROGRAM: LazyLock<Address> = addr!("675kPX9MHTjS2zt1qfr1NYHuzeLXfQM9H24wFSUt1Mp8");
/// CL-AMM venue program (Raydium CLMM-like).
pub static CL_AMM_PROGRAM: LazyLock<Address> = addr!("CAMMCzo5YL8w4VFF8KVHrK22GGUsp5VTaW7grrKgrWqK");
/// Bin-AMM venue program (Meteora DLMM-like).
pub static BIN_AMM_PROGRAM: LazyLock<Address> = addr!("LBUZKhRxPF3XUpBCjp4YzTKgLccjZhTSDM9YuVaPwxo");

pub static SPL_TOKEN_PROGRAM: LazyLock<Address> = addr!("TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA");
pub static ASSOCIATED_TOKEN_PROGRAM: LazyLock<Address> = addr!("ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL");

/// Wrapped native mint, recognized as a quote side everywhere.
pub static WRAPPED_NATIVE_MINT: LazyLock<Address> = addr!("So11111111111111111111111111111111111111112");
pub static USDC_MINT: LazyLock<Address> = addr!("EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v");
pub static USDT_MINT: LazyLock<Address> = addr!("Es9vMFrzaCERmJfrF4H2FYD4KCoNkY11McCe8BenwNYB");

pub fn is_recognized_quote(mint: &Address) -> bool {
    *mint == *WRAPPED_NATIVE_MINT || *mint == *USDC_MINT || *mint == *USDT_MINT
}

/// Eight JITO-style validator-tip accounts; one is chosen at random per
/// bundle.
pub static TIP_ACCOUNTS: LazyLock<[Address; 8]> = LazyLock::new(|| {
    [
        Address::from_str("96gYZGLnJYVFmbjzopPSU6QiEV5fGqZNyN9nmNhvrZU5").unwrap(),
        Address::from_str("HFqU5x63VTqvQss8hp11i4wVV8bD44PvwucfZ2bU7gRe").unwrap(),
        Address::from_str("Cw8CFyM9FkoMi7K7Crf6HNQqf4uEMzpKw6QNghXLvLkY").unwrap(),
        Address::from_str("ADaUMid9yfUytqMBgopwjb2DTLSokTSzL1zt6iGPaS49").unwrap(),
        Address::from_str("DfXygSm4jCyNCybVYYK6DwvWqjKee8pbDmJGcLWNDXjh").unwrap(),
        Address::from_str("ADuUkR4vqLUMWXxW9gh6D6L8pMSawimctcNZ5pGwDcEt").unwrap(),
        Address::from_str("DttWaMuVvTiduZRnguLF7jNxTgiMBZ1hyAumKUiL2KRL").unwrap(),
        Address::from_str("3AVi9Tg9Uo68tJfuvoKvqKNWKkC5wPdSSdeBnizKZ6jT").unwrap(),
    ]
});

pub fn random_tip_account() -> Address {
    let idx = fastrand::usize(..TIP_ACCOUNTS.len());
    TIP_ACCOUNTS[idx]
}

/// Fixed per-venue fee constants used where an exact on-chain fee table is
/// not cached.
pub const CP_BONDING_FEE_BPS: u32 = 30; // 0.30% total
pub const CP_AMM_FEE_BPS: u32 = 25; // 0.25%

/// Bin-AMM array sizing.
pub const BINS_PER_ARRAY: i32 = 70;
