//! Address Lookup Table cache with coalesced fetches: concurrent lookups for
//! the same missing ALT share one in-flight RPC call instead of stampeding
//! the fetcher.

use crate::types::Address;
use dashmap::DashMap;
use solana_sdk::pubkey::Pubkey;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};

#[derive(Clone, Debug)]
pub struct ResolvedAlt {
    pub addresses: Vec<Address>,
}

enum FetchState {
    Resolved(ResolvedAlt),
    InFlight(broadcast::Sender<Result<ResolvedAlt, String>>),
}

/// Hotlist-warmed, coalesced ALT cache. Construct once per engine and share
/// it between the pending-tx decoder and the background fetcher task.
pub struct AltCache {
    entries: DashMap<Address, ResolvedAlt>,
    in_flight: Mutex<HashMap<Address, broadcast::Sender<Result<ResolvedAlt, String>>>>,
}

impl AltCache {
    pub fn new() -> Self {
        AltCache { entries: DashMap::new(), in_flight: Mutex::new(HashMap::new()) }
    }

    /// Loads a hotlist of previously-seen ALT addresses at startup without
    /// resolving their contents; a miss on first use still triggers a fetch,
    /// but the hotlist lets the engine warm a fetch queue ahead of traffic.
    pub fn seed_known_addresses(&self, addresses: &[Address]) -> Vec<Address> {
        addresses.iter().filter(|a| !self.entries.contains_key(a)).copied().collect()
    }

    pub fn get(&self, alt: &Address) -> Option<ResolvedAlt> {
        self.entries.get(alt).map(|v| v.clone())
    }

    pub fn insert(&self, alt: Address, resolved: ResolvedAlt) {
        self.entries.insert(alt, resolved);
    }

    /// Resolves `alt`, either from cache or by coalescing with an in-flight
    /// fetch for the same key. `fetcher` is called at most once per
    /// concurrently-missing key regardless of how many callers ask.
    pub async fn resolve_or_fetch<F, Fut>(&self, alt: Address, fetcher: F) -> Result<ResolvedAlt, String>
    where
        F: FnOnce(Address) -> Fut,
        Fut: std::future::Future<Output = Result<Vec<Address>, String>>,
    {
        if let Some(hit) = self.get(&alt) {
            return Ok(hit);
        }

        let mut guard = self.in_flight.lock().await;
        if let Some(sender) = guard.get(&alt) {
            let mut receiver = sender.subscribe();
            drop(guard);
            return receiver.recv().await.map_err(|e| e.to_string())?;
        }

        let (sender, _) = broadcast::channel(8);
        guard.insert(alt, sender.clone());
        drop(guard);

        let result = fetcher(alt).await.map(|addresses| ResolvedAlt { addresses });
        if let Ok(resolved) = &result {
            self.insert(alt, resolved.clone());
        }

        let mut guard = self.in_flight.lock().await;
        guard.remove(&alt);
        drop(guard);

        let _ = sender.send(result.clone());
        result
    }
}

impl Default for AltCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Stream-subscribed variant: the engine can also learn ALT contents
/// passively from the same account-update feed (an ALT account is itself an
/// SPL account-like blob the geyser stream delivers), avoiding an RPC round
/// trip entirely when the table was already being watched.
pub fn try_decode_alt_from_account_update(owner: &Address, data: &[u8]) -> Option<ResolvedAlt> {
    const ADDRESS_LOOKUP_TABLE_PROGRAM: &str = "AddressLookupTab1e1111111111111111111111111";
    let expected = ADDRESS_LOOKUP_TABLE_PROGRAM.parse::<Address>().ok()?;
    if *owner != expected {
        return None;
    }
    // ALT account layout: 56-byte header (type tag, deactivation slot, etc.)
    // followed by a flat array of 32-byte addresses.
    const HEADER_LEN: usize = 56;
    if data.len() < HEADER_LEN {
        return None;
    }
    let body = &data[HEADER_LEN..];
    if body.len() % 32 != 0 {
        return None;
    }
    let addresses = body
        .chunks_exact(32)
        .map(|chunk| {
            let mut arr = [0u8; 32];
            arr.copy_from_slice(chunk);
            Address::new(arr)
        })
        .collect();
    Some(ResolvedAlt { addresses })
}

pub fn alt_lookup(alt: &ResolvedAlt, index: u8) -> Option<Pubkey> {
    alt.addresses.get(index as usize).map(|a| a.to_pubkey())
}

pub type SharedAltCache = Arc<AltCache>;
