//! gRPC account/pending-transaction stream: connects, demuxes updates by
//! owner program, decodes, and forwards `CommitUpdate`s to the registry.
//! Reconnects with exponential backoff on any stream error, re-validating
//! the startup-slot gate on every reconnect.

use crate::constants::{BIN_AMM_PROGRAM, CL_AMM_PROGRAM, CP_AMM_PROGRAM, CP_BONDING_PROGRAM, SPL_TOKEN_PROGRAM};
use crate::decode;
use crate::registry::commit::{CommitUpdate, EntityKind, Payload};
use crate::types::{Address, Source, Version};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tonic::transport::{Channel, ClientTlsConfig};
use tracing::{error, info, warn};

pub mod geyser {
    tonic::include_proto!("geyser");
}

use geyser::geyser_ingest_client::GeyserIngestClient;
use geyser::subscribe_update::UpdateOneof;
use geyser::SubscribeRequest;

/// Emitted by the stream loop for the engine to act on: a ready-to-apply
/// commit, or a slot advance used to re-arm / validate the startup gate.
pub enum StreamEvent {
    Commit(CommitUpdate),
    SlotAdvanced(crate::types::Slot),
    Reconnected,
    PendingTransaction { signature: Vec<u8>, message_bytes: Vec<u8> },
}

pub struct StreamConfig {
    pub endpoint: String,
    pub account_owners: Vec<Address>,
    pub reconnect_backoff_cap: Duration,
    pub stream_stall_threshold: Duration,
}

/// Runs forever, reconnecting on failure. `tx` carries decoded events to
/// the engine; the loop never touches the registry directly so it stays
/// testable without a live connection.
pub async fn run(config: StreamConfig, tx: mpsc::Sender<StreamEvent>) {
    // Capped exponential backoff with jitter, same shape the RPC dependency
    // fetcher would use for a retried call; here it governs reconnect
    // spacing across the whole stream lifetime rather than a single call.
    let mut backoff = ExponentialBackoff::from_millis(2).factor(250).max_delay(config.reconnect_backoff_cap).map(jitter);

    loop {
        match connect_and_stream(&config, &tx).await {
            Ok(()) => {
                warn!("geyser stream ended cleanly, reconnecting");
            }
            Err(e) => {
                error!(error = %e, "geyser stream error, reconnecting");
            }
        }

        let _ = tx.send(StreamEvent::Reconnected).await;
        let delay = backoff.next().unwrap_or(config.reconnect_backoff_cap);
        tokio::time::sleep(delay).await;
    }
}

async fn connect_and_stream(config: &StreamConfig, tx: &mpsc::Sender<StreamEvent>) -> anyhow::Result<()> {
    let tls = ClientTlsConfig::new();
    let channel = Channel::from_shared(config.endpoint.clone())?.tls_config(tls)?.connect().await?;
    let mut client = GeyserIngestClient::new(channel);

    let request = SubscribeRequest {
        account_owners: config.account_owners.iter().map(|a| a.as_bytes().to_vec()).collect(),
        account_keys: vec![],
        include_pending_transactions: true,
    };

    let mut stream = client.subscribe(request).await?.into_inner();
    info!(endpoint = %config.endpoint, "geyser stream connected");

    loop {
        let next = tokio::time::timeout(config.stream_stall_threshold, stream.message()).await;
        let message = match next {
            Ok(Ok(Some(m))) => m,
            Ok(Ok(None)) => return Ok(()),
            Ok(Err(status)) => anyhow::bail!("stream status error: {status}"),
            Err(_) => anyhow::bail!("stream stalled past {:?}", config.stream_stall_threshold),
        };

        let Some(update) = message.update_oneof else { continue };
        match update {
            UpdateOneof::SlotUpdate(slot) => {
                let _ = tx.send(StreamEvent::SlotAdvanced(slot)).await;
            }
            UpdateOneof::Account(account) => {
                if let Some(commit_update) = decode_account_update(&account) {
                    let _ = tx.send(StreamEvent::Commit(commit_update)).await;
                }
            }
            UpdateOneof::PendingTransaction(pending) => {
                let _ = tx
                    .send(StreamEvent::PendingTransaction {
                        signature: pending.signature,
                        message_bytes: pending.message_bytes,
                    })
                    .await;
            }
        }
    }
}

/// Routes a raw account update to the decoder for its owner program, and
/// wraps the result as a `CommitUpdate` with `owning_pool` left unset for
/// pool-kind payloads (the commit containment rule does not apply to them).
fn decode_account_update(account: &geyser::AccountUpdate) -> Option<CommitUpdate> {
    let mut pubkey_bytes = [0u8; 32];
    if account.pubkey.len() != 32 {
        return None;
    }
    pubkey_bytes.copy_from_slice(&account.pubkey);
    let address = Address::new(pubkey_bytes);

    let mut owner_bytes = [0u8; 32];
    if account.owner.len() != 32 {
        return None;
    }
    owner_bytes.copy_from_slice(&account.owner);
    let owner = Address::new(owner_bytes);

    let version = Version::new(account.slot, account.write_version);
    let data_len = account.data.len();

    if owner == *SPL_TOKEN_PROGRAM {
        let vault = decode::token_account::decode(&account.data).ok()?;
        return Some(CommitUpdate {
            kind: EntityKind::Vault,
            key: address,
            owning_pool: None, // caller (engine) fills this from topology membership
            payload: Payload::Vault(vault),
            version,
            source: Source::Grpc,
            data_len,
        });
    }

    if owner == *CL_AMM_PROGRAM {
        if let Ok(pool) = decode::cl_amm::decode(address, &account.data) {
            return Some(CommitUpdate {
                kind: EntityKind::Pool,
                key: address,
                owning_pool: None,
                payload: Payload::Pool(pool),
                version,
                source: Source::Grpc,
                data_len,
            });
        }
        if let Ok(tick_array) = decode::tick_array::decode(&account.data) {
            let owning_pool = Some(tick_array.pool);
            return Some(CommitUpdate {
                kind: EntityKind::Tick,
                key: address,
                owning_pool,
                payload: Payload::Tick(tick_array),
                version,
                source: Source::Grpc,
                data_len,
            });
        }
        if let Ok(amm_config) = decode::amm_config::decode(&account.data) {
            // amm_config accounts carry no pool field of their own; the
            // engine resolves owning_pool from topology membership.
            return Some(CommitUpdate {
                kind: EntityKind::AmmConfig,
                key: address,
                owning_pool: None,
                payload: Payload::AmmConfig(amm_config),
                version,
                source: Source::Grpc,
                data_len,
            });
        }
        return None;
    }

    if owner == *BIN_AMM_PROGRAM {
        if let Ok(pool) = decode::bin_amm::decode(address, &account.data) {
            return Some(CommitUpdate {
                kind: EntityKind::Pool,
                key: address,
                owning_pool: None,
                payload: Payload::Pool(pool),
                version,
                source: Source::Grpc,
                data_len,
            });
        }
        if let Ok(bin_array) = decode::bin_array::decode(&account.data) {
            let owning_pool = Some(bin_array.pool);
            return Some(CommitUpdate {
                kind: EntityKind::Bin,
                key: address,
                owning_pool,
                payload: Payload::Bin(bin_array),
                version,
                source: Source::Grpc,
                data_len,
            });
        }
        return None;
    }

    let pool = if owner == *CP_BONDING_PROGRAM {
        decode::bonding::decode(address, &account.data).ok()
    } else if owner == *CP_AMM_PROGRAM {
        decode::cp_amm::decode(address, &account.data).ok()
    } else {
        None
    }?;

    Some(CommitUpdate {
        kind: EntityKind::Pool,
        key: address,
        owning_pool: None,
        payload: Payload::Pool(pool),
        version,
        source: Source::Grpc,
        data_len,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_update_with_wrong_length_pubkey_is_skipped() {
        let account = geyser::AccountUpdate {
            pubkey: vec![0u8; 31],
            owner: vec![0u8; 32],
            data: vec![],
            lamports: 0,
            slot: 1,
            write_version: 1,
            is_startup: false,
        };
        assert!(decode_account_update(&account).is_none());
    }

    #[test]
    fn account_update_from_unrecognized_owner_is_skipped() {
        let account = geyser::AccountUpdate {
            pubkey: vec![1u8; 32],
            owner: vec![2u8; 32],
            data: vec![0u8; 200],
            lamports: 0,
            slot: 1,
            write_version: 1,
            is_startup: false,
        };
        assert!(decode_account_update(&account).is_none());
    }
}
