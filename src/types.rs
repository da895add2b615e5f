//! Core identifiers shared by every component: addresses, slots, write-versions.
//!
//! Addresses are kept as raw 32-byte buffers (never hex strings) so that cache
//! lookups in the hot commit path never format a string first.

use std::fmt;
use std::str::FromStr;

/// A 32-byte on-chain address. Hashes and compares on the raw bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(pub [u8; 32]);

impl Address {
    pub const ZERO: Address = Address([0u8; 32]);

    pub fn new(bytes: [u8; 32]) -> Self {
        Address(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_pubkey(self) -> solana_sdk::pubkey::Pubkey {
        solana_sdk::pubkey::Pubkey::new_from_array(self.0)
    }

    pub fn from_pubkey(pk: &solana_sdk::pubkey::Pubkey) -> Self {
        Address(pk.to_bytes())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl FromStr for Address {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = bs58::decode(s).into_vec()?;
        if bytes.len() != 32 {
            anyhow::bail!("address {} decodes to {} bytes, expected 32", s, bytes.len());
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Address(arr))
    }
}

/// Monotonically increasing slot counter assigned by the upstream source.
pub type Slot = u64;

/// Per-account monotonic counter supplied by the stream source; strictly
/// increases per account per slot.
pub type WriteVersion = u64;

/// Origin of a committed value. RPC writes are forbidden against a pool's
/// frozen topology once it has left `DISCOVERED` (see `registry::commit`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Source {
    Grpc,
    Rpc,
}

/// `(slot, write_version)` ordering key. Commits are accepted only when the
/// incoming pair is strictly greater than the stored one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Version {
    pub slot: Slot,
    pub write_version: WriteVersion,
}

impl Version {
    pub fn new(slot: Slot, write_version: WriteVersion) -> Self {
        Version { slot, write_version }
    }
}

/// The four venue families this engine understands. Each carries enough
/// venue-specific state to derive an indicative price and a topology set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Venue {
    CpBonding,
    CpAmm,
    ClAmm,
    BinAmm,
}

impl Venue {
    pub fn label(&self) -> &'static str {
        match self {
            Venue::CpBonding => "cp-bonding",
            Venue::CpAmm => "cp-amm",
            Venue::ClAmm => "cl-amm",
            Venue::BinAmm => "bin-amm",
        }
    }

    /// Per-venue compute-unit estimate for a two-swap backrun.
    pub fn backrun_compute_units(&self) -> u32 {
        match self {
            Venue::CpBonding => 120_000,
            Venue::CpAmm => 200_000,
            Venue::ClAmm => 400_000,
            Venue::BinAmm => 300_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_round_trips_through_base58() {
        let addr = Address([7u8; 32]);
        let s = addr.to_string();
        let parsed: Address = s.parse().unwrap();
        assert_eq!(addr, parsed);
    }

    #[test]
    fn version_orders_lexicographically() {
        let a = Version::new(100, 5);
        let b = Version::new(100, 6);
        let c = Version::new(101, 0);
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn bad_length_address_is_rejected() {
        let s = bs58::encode([1u8; 16]).into_string();
        assert!(Address::from_str(&s).is_err());
    }
}
