//! Pending (unconfirmed, mempool-visible) v0 transaction parsing: resolves
//! every Address Lookup Table reference against the ALT cache, surfacing a
//! typed miss instead of silently dropping the transaction.

use super::alt_cache::{alt_lookup, AltCache};
use crate::errors::AltError;
use crate::types::Address;
use solana_sdk::message::{v0, VersionedMessage};
use solana_sdk::pubkey::Pubkey;

/// A v0 transaction with every referenced account resolved to a concrete
/// key: the static keys from the message header, followed by ALT-resolved
/// writable keys, then ALT-resolved readonly keys (matches Solana's
/// on-chain account-ordering convention).
#[derive(Debug)]
pub struct ResolvedTransaction {
    pub signature_bytes: Vec<u8>,
    pub accounts: Vec<Pubkey>,
    pub program_ids_touched: Vec<Address>,
}

/// Parses a raw pending-transaction payload and resolves its account list.
/// Returns `AltError::Miss` naming every ALT address not currently cached;
/// the caller is expected to queue those for fetch and retry once resolved,
/// keeping this parse step itself best-effort and non-blocking.
pub fn resolve_pending_transaction(
    signature_bytes: Vec<u8>,
    message_bytes: &[u8],
    alt_cache: &AltCache,
) -> Result<ResolvedTransaction, AltError> {
    let message: VersionedMessage = bincode::deserialize(message_bytes).map_err(|e| AltError::FetchFailed(e.to_string()))?;

    match message {
        VersionedMessage::Legacy(legacy) => Ok(ResolvedTransaction {
            signature_bytes,
            program_ids_touched: legacy.account_keys.iter().map(Address::from_pubkey).collect(),
            accounts: legacy.account_keys,
        }),
        VersionedMessage::V0(v0_message) => resolve_v0(signature_bytes, v0_message, alt_cache),
    }
}

fn resolve_v0(signature_bytes: Vec<u8>, message: v0::Message, alt_cache: &AltCache) -> Result<ResolvedTransaction, AltError> {
    let mut accounts: Vec<Pubkey> = message.account_keys.clone();
    let mut misses = Vec::new();

    let mut writable_extension = Vec::new();
    let mut readonly_extension = Vec::new();

    for lookup in &message.address_table_lookups {
        let alt_address = Address::from_pubkey(&lookup.account_key);
        let Some(resolved) = alt_cache.get(&alt_address) else {
            misses.push(alt_address);
            continue;
        };

        for &index in &lookup.writable_indexes {
            match alt_lookup(&resolved, index) {
                Some(pk) => writable_extension.push(pk),
                None => return Err(AltError::FetchFailed(format!("ALT {alt_address} has no entry at index {index}"))),
            }
        }
        for &index in &lookup.readonly_indexes {
            match alt_lookup(&resolved, index) {
                Some(pk) => readonly_extension.push(pk),
                None => return Err(AltError::FetchFailed(format!("ALT {alt_address} has no entry at index {index}"))),
            }
        }
    }

    if !misses.is_empty() {
        return Err(AltError::Miss(misses));
    }

    accounts.extend(writable_extension);
    accounts.extend(readonly_extension);

    Ok(ResolvedTransaction {
        signature_bytes,
        program_ids_touched: accounts.iter().map(Address::from_pubkey).collect(),
        accounts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::alt_cache::ResolvedAlt;
    use solana_sdk::message::v0::MessageAddressTableLookup;

    fn v0_message_with_one_lookup(alt_key: Pubkey) -> v0::Message {
        v0::Message {
            header: solana_sdk::message::MessageHeader {
                num_required_signatures: 1,
                num_readonly_signed_accounts: 0,
                num_readonly_unsigned_accounts: 1,
            },
            account_keys: vec![Pubkey::new_unique()],
            recent_blockhash: solana_sdk::hash::Hash::default(),
            instructions: vec![],
            address_table_lookups: vec![MessageAddressTableLookup {
                account_key: alt_key,
                writable_indexes: vec![0],
                readonly_indexes: vec![1],
            }],
        }
    }

    #[test]
    fn missing_alt_surfaces_as_typed_miss() {
        let cache = AltCache::new();
        let alt_key = Pubkey::new_unique();
        let message = v0_message_with_one_lookup(alt_key);

        let result = resolve_v0(vec![], message, &cache);
        match result {
            Err(AltError::Miss(addrs)) => assert_eq!(addrs, vec![Address::from_pubkey(&alt_key)]),
            other => panic!("expected AltError::Miss, got {other:?}"),
        }
    }

    #[test]
    fn cached_alt_extends_account_list_writable_then_readonly() {
        let cache = AltCache::new();
        let alt_key = Pubkey::new_unique();
        let writable = Pubkey::new_unique();
        let readonly = Pubkey::new_unique();
        cache.insert(
            Address::from_pubkey(&alt_key),
            ResolvedAlt { addresses: vec![Address::from_pubkey(&writable), Address::from_pubkey(&readonly)] },
        );

        let message = v0_message_with_one_lookup(alt_key);
        let resolved = resolve_v0(vec![], message, &cache).unwrap();
        assert_eq!(resolved.accounts.len(), 3); // 1 static + 1 writable + 1 readonly
        assert_eq!(resolved.accounts[1], writable);
        assert_eq!(resolved.accounts[2], readonly);
    }
}
