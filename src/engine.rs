//! Owns every long-lived component and wires ingest -> commit -> detect ->
//! build -> submit, threaded explicitly through `main` as one struct rather
//! than scattered module-level statics.

use crate::arb::detector::Detector;
use crate::arb::fragmentation::FragmentationIndex;
use crate::bundle::builder::{BondingTrailingAccounts, BundleBuilder};
use crate::bundle::cost::{BundleCosts, TipFloor};
use crate::bundle::sink::{BundleSink, NullSink};
use crate::config::Config;
use crate::decode;
use crate::errors::AltError;
use crate::health::AltMissTracker;
use crate::ingest::alt_cache::AltCache;
use crate::ingest::pending_tx;
use crate::ingest::stream::{self, StreamConfig, StreamEvent};
use crate::opportunity_log::OpportunityLog;
use crate::pool::lifecycle::{PoolState, Topology};
use crate::pool::topology::{derive_topology_dependencies, DependencyKind, OrphanBuffer, OrphanPayload};
use crate::registry::commit::{CommitUpdate, EntityKind, Payload};
use crate::registry::Registry;
use crate::rpc::RpcDependencyFetcher;
use crate::types::{Address, Source, Version};
use solana_sdk::pubkey::Pubkey;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, mpsc, RwLock};
use tracing::{debug, info, warn};

#[derive(Default, Debug)]
pub struct EngineStats {
    pub commits_applied: u64,
    pub commits_rejected: u64,
    pub opportunities_detected: u64,
    pub bundles_built: u64,
    pub bundles_submitted: u64,
}

pub struct Engine {
    config: Config,
    registry: Arc<RwLock<Registry>>,
    fragmentation: Arc<RwLock<FragmentationIndex>>,
    orphan_buffer: Arc<RwLock<OrphanBuffer>>,
    alt_cache: Arc<AltCache>,
    alt_misses: Arc<AltMissTracker>,
    detector: Arc<RwLock<Detector>>,
    opportunity_log: Arc<OpportunityLog>,
    tip_floor: Arc<RwLock<TipFloor>>,
    sink: Arc<dyn BundleSink>,
    payer: Pubkey,
    stats: Arc<RwLock<EngineStats>>,
    rpc_fetcher: Arc<RpcDependencyFetcher>,
}

impl Engine {
    pub fn new(config: Config, payer: Pubkey) -> anyhow::Result<Self> {
        let opportunity_log = OpportunityLog::open(std::path::Path::new(&config.opportunity_log_path), config.dust_threshold_lamports)?;
        let rpc_fetcher =
            Arc::new(RpcDependencyFetcher::new(config.rpc_endpoint.clone(), config.max_concurrent_rpc, Duration::from_secs(10)));

        Ok(Engine {
            registry: Arc::new(RwLock::new(Registry::new())),
            fragmentation: Arc::new(RwLock::new(FragmentationIndex::new())),
            orphan_buffer: Arc::new(RwLock::new(OrphanBuffer::new(10_000, Duration::from_secs(60)))),
            alt_cache: Arc::new(AltCache::new()),
            alt_misses: Arc::new(AltMissTracker::default()),
            detector: Arc::new(RwLock::new(Detector::new(
                config.min_candidate_spread_bps,
                config.stale_threshold,
                config.debounce_window,
            ))),
            opportunity_log: Arc::new(opportunity_log),
            tip_floor: Arc::new(RwLock::new(TipFloor::default())),
            sink: Arc::new(NullSink),
            payer,
            stats: Arc::new(RwLock::new(EngineStats::default())),
            rpc_fetcher,
            config,
        })
    }

    pub fn with_sink(mut self, sink: Arc<dyn BundleSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn registry_handle(&self) -> Arc<RwLock<Registry>> {
        self.registry.clone()
    }

    pub fn orphan_buffer_handle(&self) -> Arc<RwLock<OrphanBuffer>> {
        self.orphan_buffer.clone()
    }

    pub fn alt_cache_handle(&self) -> Arc<AltCache> {
        self.alt_cache.clone()
    }

    pub fn alt_miss_tracker_handle(&self) -> Arc<AltMissTracker> {
        self.alt_misses.clone()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Spawns the ingest stream task, the topology bootstrap loop, and the
    /// tip-floor refresher, then runs the commit/detect/build loop itself
    /// until `shutdown` fires.
    pub async fn run(&self, mut shutdown: broadcast::Receiver<()>) {
        let (tx, mut rx) = mpsc::channel::<StreamEvent>(4096);

        let stream_config = StreamConfig {
            endpoint: self.config.grpc_endpoint.clone(),
            account_owners: vec![
                *crate::constants::CP_BONDING_PROGRAM,
                *crate::constants::CP_AMM_PROGRAM,
                *crate::constants::CL_AMM_PROGRAM,
                *crate::constants::BIN_AMM_PROGRAM,
                *crate::constants::SPL_TOKEN_PROGRAM,
            ],
            reconnect_backoff_cap: self.config.reconnect_backoff_cap,
            stream_stall_threshold: self.config.stream_stall_threshold,
        };

        let stream_handle = tokio::spawn(stream::run(stream_config, tx));

        let tip_floor_handle = tokio::spawn(run_tip_floor_refresh(
            self.tip_floor.clone(),
            self.config.tip_floor_feed_url.clone(),
            self.config.tip_floor_refresh_interval,
        ));

        let bootstrap_handle = tokio::spawn(run_bootstrap_pipeline(
            self.registry.clone(),
            self.orphan_buffer.clone(),
            self.fragmentation.clone(),
            self.rpc_fetcher.clone(),
            self.config.tick_array_radius,
            self.config.bin_array_radius,
        ));

        let mut current_slot: crate::types::Slot = 0;
        let mut touched_mints: Vec<(Address, Address)> = Vec::new();

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    info!("engine shutdown requested");
                    break;
                }
                event = rx.recv() => {
                    let Some(event) = event else { break };
                    self.handle_stream_event(event, &mut current_slot, &mut touched_mints).await;
                }
                _ = tokio::time::sleep(Duration::from_millis(250)) => {
                    if !touched_mints.is_empty() {
                        self.run_detection_pass(current_slot, std::mem::take(&mut touched_mints)).await;
                    }
                }
            }
        }

        stream_handle.abort();
        tip_floor_handle.abort();
        bootstrap_handle.abort();
    }

    async fn handle_stream_event(&self, event: StreamEvent, current_slot: &mut crate::types::Slot, touched_mints: &mut Vec<(Address, Address)>) {
        match event {
            StreamEvent::SlotAdvanced(slot) => {
                *current_slot = slot;
                let mut registry = self.registry.write().await;
                registry.lifecycle.arm_start_slot(slot);
            }
            StreamEvent::Reconnected => {
                warn!("ingest stream reconnected, re-validating startup gate");
                let mut registry = self.registry.write().await;
                registry.lifecycle.rearm_start_slot_on_reconnect(*current_slot);
            }
            StreamEvent::PendingTransaction { signature, message_bytes } => {
                match pending_tx::resolve_pending_transaction(signature, &message_bytes, &self.alt_cache) {
                    Ok(resolved) => {
                        self.alt_misses.record_hit();
                        debug!(accounts = resolved.accounts.len(), "pending transaction resolved");
                    }
                    Err(AltError::Miss(missing)) => {
                        self.alt_misses.record_miss();
                        debug!(missing = missing.len(), "pending transaction referenced an uncached lookup table");
                    }
                    Err(AltError::FetchFailed(e)) => {
                        warn!(error = %e, "pending transaction parse failed");
                    }
                }
            }
            StreamEvent::Commit(mut update) => {
                // The stream decoder can't always know an update's owning
                // pool by itself: vaults are matched by address, tick/bin
                // arrays carry their pool inline (set by the decoder
                // already), and amm-config accounts have no pool field at
                // all and must be resolved through topology membership.
                let owning_pool = match update.kind {
                    EntityKind::Vault => {
                        let found = self.find_owning_pool(&update.key).await;
                        update.owning_pool = found;
                        found
                    }
                    EntityKind::Pool => Some(update.key),
                    EntityKind::Tick | EntityKind::Bin => update.owning_pool,
                    EntityKind::AmmConfig => {
                        let registry = self.registry.read().await;
                        let found = registry.lifecycle.find_pool_for_dependency(&update.key);
                        drop(registry);
                        update.owning_pool = found;
                        found
                    }
                    EntityKind::GlobalConfig => None,
                };

                // A tick/bin update for a pool nobody has discovered yet
                // can't be committed (there's nothing to check containment
                // against) and must not be dropped either — buffer it for
                // the bootstrap pipeline to replay once the pool exists.
                if matches!(update.kind, EntityKind::Tick | EntityKind::Bin) {
                    let pool_known = match owning_pool {
                        Some(pool_addr) => {
                            let registry = self.registry.read().await;
                            registry.lifecycle.get(&pool_addr).is_some()
                        }
                        None => false,
                    };
                    if !pool_known {
                        if let Some(pool_addr) = owning_pool {
                            let key = update.key;
                            let version = update.version;
                            let orphan_payload = match update.payload {
                                Payload::Tick(t) => OrphanPayload::Tick(t),
                                Payload::Bin(b) => OrphanPayload::Bin(b),
                                _ => return,
                            };
                            self.orphan_buffer.write().await.push(key, pool_addr, orphan_payload, version);
                        }
                        return;
                    }
                }

                let is_new_pool = matches!(update.payload, Payload::Pool(_));
                let pool_payload_mints = match &update.payload {
                    Payload::Pool(p) => Some((p.venue, p.mints())),
                    _ => None,
                };

                let mut registry = self.registry.write().await;
                if is_new_pool {
                    registry.lifecycle.discover(update.key, *current_slot);
                }
                let result = registry.commit(update);
                drop(registry);

                let mut stats = self.stats.write().await;
                if result.updated {
                    stats.commits_applied += 1;
                } else {
                    stats.commits_rejected += 1;
                }
                drop(stats);

                if !result.updated {
                    return;
                }

                // Fragmentation membership tracks ACTIVE state exactly, so
                // a fresh pool commit (still DISCOVERED) never upserts here
                // — only the bootstrap pipeline's activation does.
                if let (Some(pool_addr), Some((venue, (mint_a, mint_b)))) = (owning_pool, pool_payload_mints) {
                    let is_active = {
                        let registry = self.registry.read().await;
                        registry.lifecycle.state_of(&pool_addr) == Some(PoolState::Active)
                    };
                    if is_active {
                        let mut fragmentation = self.fragmentation.write().await;
                        fragmentation.upsert(pool_addr, venue, mint_a, mint_b);
                    }
                }

                if let Some(pool_addr) = owning_pool {
                    let registry = self.registry.read().await;
                    if let Some(pool) = registry.pool(&pool_addr) {
                        touched_mints.push(pool.mints());
                    }
                }
            }
        }
    }

    /// Finds the pool owning `vault` by address match, regardless of
    /// lifecycle state — a vault balance update can arrive for a pool that
    /// is still `DISCOVERED`, well before its topology is frozen.
    async fn find_owning_pool(&self, vault: &Address) -> Option<Address> {
        let registry = self.registry.read().await;
        let found = registry.lifecycle.all_pools().find_map(|pool_addr| {
            registry.pool(pool_addr).and_then(|pool| {
                if pool.vault_a == *vault || pool.vault_b == *vault {
                    Some(*pool_addr)
                } else {
                    None
                }
            })
        });
        found
    }

    async fn run_detection_pass(&self, current_slot: crate::types::Slot, touched_mints: Vec<(Address, Address)>) {
        let registry = self.registry.read().await;
        let fragmentation = self.fragmentation.read().await;
        let mut detector = self.detector.write().await;

        let opportunities = detector.scan(&registry, &fragmentation, &touched_mints, current_slot, Instant::now());
        drop(detector);
        drop(fragmentation);

        if opportunities.is_empty() {
            return;
        }

        let mut stats = self.stats.write().await;
        stats.opportunities_detected += opportunities.len() as u64;
        drop(stats);

        let tip_floor = self.tip_floor.read().await;
        let builder = BundleBuilder::new(&registry, self.payer);

        for opportunity in &opportunities {
            let gross_profit_lamports = (opportunity.net_bps.max(0.0) / 10_000.0 * 1_000_000_000.0) as u64;
            let compute_units = opportunity.buy.venue.backrun_compute_units() + opportunity.sell.venue.backrun_compute_units();
            let costs = BundleCosts::calculate(gross_profit_lamports, compute_units, 1_000, 55, 1_000_000_000, &tip_floor);

            let correlation_id = self.opportunity_log.record(opportunity, &costs, gross_profit_lamports).await;

            if !costs.is_profitable(gross_profit_lamports) {
                continue;
            }

            let Ok(built) = builder.build(opportunity, 1_000_000_000, 0, 1_000, BondingTrailingAccounts::FromGlobalConfig) else { continue };

            let mut stats = self.stats.write().await;
            stats.bundles_built += 1;
            drop(stats);

            if self.config.enable_real_trading {
                match self.sink.submit(built.transaction_bytes, built.tip_lamports).await {
                    Ok(result) => {
                        info!(?correlation_id, accepted = result.accepted, bundle_id = ?result.bundle_id, "bundle submitted");
                        if result.accepted {
                            let mut stats = self.stats.write().await;
                            stats.bundles_submitted += 1;
                        }
                    }
                    Err(e) => warn!(?correlation_id, error = %e, "bundle submission failed"),
                }
            }
        }
    }

    pub async fn stats_snapshot(&self) -> EngineStats {
        let stats = self.stats.read().await;
        EngineStats {
            commits_applied: stats.commits_applied,
            commits_rejected: stats.commits_rejected,
            opportunities_detected: stats.opportunities_detected,
            bundles_built: stats.bundles_built,
            bundles_submitted: stats.bundles_submitted,
        }
    }
}

/// Background loop driving pools from `DISCOVERED` through
/// `TOPOLOGY_FROZEN` to `ACTIVE`. Without this, `state_of` never returns
/// `Active` for anything and the detector skips every pool unconditionally.
async fn run_bootstrap_pipeline(
    registry: Arc<RwLock<Registry>>,
    orphan_buffer: Arc<RwLock<OrphanBuffer>>,
    fragmentation: Arc<RwLock<FragmentationIndex>>,
    rpc_fetcher: Arc<RpcDependencyFetcher>,
    tick_array_radius: i64,
    bin_array_radius: i64,
) {
    let mut ticker = tokio::time::interval(Duration::from_millis(500));
    loop {
        ticker.tick().await;
        bootstrap_tick(&registry, &orphan_buffer, &fragmentation, &rpc_fetcher, tick_array_radius, bin_array_radius).await;
    }
}

/// One sweep: bootstraps every newly-discovered pool, then re-checks
/// completeness for every pool still waiting on its topology to fill in.
async fn bootstrap_tick(
    registry: &Arc<RwLock<Registry>>,
    orphan_buffer: &Arc<RwLock<OrphanBuffer>>,
    fragmentation: &Arc<RwLock<FragmentationIndex>>,
    rpc_fetcher: &Arc<RpcDependencyFetcher>,
    tick_array_radius: i64,
    bin_array_radius: i64,
) {
    orphan_buffer.write().await.evict_expired();

    let discovered: Vec<Address> = {
        let reg = registry.read().await;
        reg.lifecycle.pools_in_state(PoolState::Discovered).copied().collect()
    };
    for pool_addr in discovered {
        bootstrap_pool(pool_addr, registry, orphan_buffer, fragmentation, rpc_fetcher, tick_array_radius, bin_array_radius).await;
    }

    let frozen: Vec<Address> = {
        let reg = registry.read().await;
        reg.lifecycle.pools_in_state(PoolState::TopologyFrozen).copied().collect()
    };
    for pool_addr in frozen {
        activate_if_complete(pool_addr, registry, orphan_buffer, fragmentation).await;
    }
}

async fn bootstrap_pool(
    pool_addr: Address,
    registry: &Arc<RwLock<Registry>>,
    orphan_buffer: &Arc<RwLock<OrphanBuffer>>,
    fragmentation: &Arc<RwLock<FragmentationIndex>>,
    rpc_fetcher: &Arc<RpcDependencyFetcher>,
    tick_array_radius: i64,
    bin_array_radius: i64,
) {
    {
        let mut reg = registry.write().await;
        if reg.lifecycle.is_bootstrap_in_flight(&pool_addr) {
            return;
        }
        reg.lifecycle.mark_bootstrap_in_flight(&pool_addr, true);
    }

    let pool = {
        let reg = registry.read().await;
        reg.pool(&pool_addr)
    };
    let Some(pool) = pool else {
        registry.write().await.lifecycle.mark_bootstrap_in_flight(&pool_addr, false);
        return;
    };

    let deps = derive_topology_dependencies(&pool, tick_array_radius as i32, bin_array_radius as i32);

    let to_fetch: Vec<(Address, DependencyKind)> = {
        let reg = registry.read().await;
        deps.iter().copied().filter(|(addr, _)| !dependency_cached(&reg, addr)).collect()
    };

    let frozen_slot = registry.read().await.lifecycle.start_slot().unwrap_or(0);

    if !to_fetch.is_empty() {
        if rpc_fetcher.circuit_breaker_tripped() {
            warn!(%pool_addr, "rpc circuit breaker open, evicting pool pending recovery");
            registry.write().await.lifecycle.evict(&pool_addr);
            fragmentation.write().await.remove(&pool_addr);
            return;
        }

        let kinds: HashMap<Address, DependencyKind> = to_fetch.iter().copied().collect();
        let addresses: Vec<Address> = to_fetch.iter().map(|(a, _)| *a).collect();
        let fetched = rpc_fetcher.fetch_many(addresses).await;

        for (address, result) in fetched {
            let Ok(Some(bytes)) = result else { continue };
            let Some(kind) = kinds.get(&address).copied() else { continue };
            let Some(payload) = decode_dependency(kind, &bytes) else { continue };
            let update = CommitUpdate {
                kind: entity_kind_for(kind),
                key: address,
                owning_pool: if kind == DependencyKind::AmmConfig { None } else { Some(pool_addr) },
                payload,
                version: Version::new(frozen_slot, 0),
                source: Source::Rpc,
                data_len: bytes.len(),
            };
            registry.write().await.commit(update);
        }
    }

    let keys = deps.into_iter().map(|(addr, _)| addr).collect();
    registry.write().await.lifecycle.freeze(pool_addr, keys, frozen_slot);

    activate_if_complete(pool_addr, registry, orphan_buffer, fragmentation).await;
}

/// Replays any orphaned tick/bin updates now that `pool_addr` has a frozen
/// topology to check them against, then activates the pool if every
/// topology key is now cached.
async fn activate_if_complete(
    pool_addr: Address,
    registry: &Arc<RwLock<Registry>>,
    orphan_buffer: &Arc<RwLock<OrphanBuffer>>,
    fragmentation: &Arc<RwLock<FragmentationIndex>>,
) {
    let drained = orphan_buffer.write().await.take_for_pool(&pool_addr);
    for (key, payload, version) in drained {
        let (kind, data_len, payload) = match payload {
            OrphanPayload::Tick(t) => (EntityKind::Tick, t.raw.len(), Payload::Tick(t)),
            OrphanPayload::Bin(b) => (EntityKind::Bin, b.raw.len(), Payload::Bin(b)),
        };
        let update = CommitUpdate { kind, key, owning_pool: Some(pool_addr), payload, version, source: Source::Grpc, data_len };
        registry.write().await.commit(update);
    }

    let complete = {
        let reg = registry.read().await;
        reg.lifecycle.get(&pool_addr).and_then(|r| r.topology.as_ref()).map(|t| topology_is_complete(&reg, t)).unwrap_or(false)
    };

    let activated = {
        let mut reg = registry.write().await;
        reg.lifecycle.try_activate(&pool_addr, |_, _| complete)
    };

    if activated {
        let reg = registry.read().await;
        if let Some(pool) = reg.pool(&pool_addr) {
            let (mint_a, mint_b) = pool.mints();
            let venue = pool.venue;
            drop(reg);
            fragmentation.write().await.upsert(pool_addr, venue, mint_a, mint_b);
        }
    }
}

fn dependency_cached(registry: &Registry, addr: &Address) -> bool {
    registry.vault(addr).is_some() || registry.tick_array(addr).is_some() || registry.bin_array(addr).is_some() || registry.amm_config(addr).is_some()
}

fn topology_is_complete(registry: &Registry, topology: &Topology) -> bool {
    topology.keys.iter().all(|key| dependency_cached(registry, key))
}

fn decode_dependency(kind: DependencyKind, data: &[u8]) -> Option<Payload> {
    match kind {
        DependencyKind::Vault => decode::token_account::decode(data).ok().map(Payload::Vault),
        DependencyKind::Tick => decode::tick_array::decode(data).ok().map(Payload::Tick),
        DependencyKind::Bin => decode::bin_array::decode(data).ok().map(Payload::Bin),
        DependencyKind::AmmConfig => decode::amm_config::decode(data).ok().map(Payload::AmmConfig),
    }
}

fn entity_kind_for(kind: DependencyKind) -> EntityKind {
    match kind {
        DependencyKind::Vault => EntityKind::Vault,
        DependencyKind::Tick => EntityKind::Tick,
        DependencyKind::Bin => EntityKind::Bin,
        DependencyKind::AmmConfig => EntityKind::AmmConfig,
    }
}

/// Background loop refreshing tip-floor percentiles from the configured
/// feed. Runs for the lifetime of `Engine::run` and is aborted on shutdown.
async fn run_tip_floor_refresh(tip_floor: Arc<RwLock<TipFloor>>, feed_url: String, interval: Duration) {
    let client = reqwest::Client::new();
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        let mut floor = tip_floor.write().await;
        floor.refresh_from_feed(&feed_url, &client).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::state::{Pool, PoolKind, Vault};
    use crate::types::Venue;

    fn test_config() -> Config {
        Config {
            grpc_endpoint: "http://localhost:10000".into(),
            rpc_endpoint: "http://localhost:1".into(),
            tick_array_radius: 3,
            bin_array_radius: 3,
            boundary_buffer: 1,
            refresh_interval: Duration::from_millis(5_000),
            max_concurrent_rpc: 4,
            stale_threshold: Duration::from_millis(30_000),
            min_candidate_spread_bps: 30,
            dust_threshold_lamports: 0,
            debounce_window: Duration::from_millis(100),
            stream_stall_threshold: Duration::from_secs(30),
            reconnect_backoff_cap: Duration::from_secs(30),
            hotlist_path: "alt_hotlist.txt".into(),
            opportunity_log_path: std::env::temp_dir()
                .join(format!("engine_test_opp_log_{}", std::process::id()))
                .to_string_lossy()
                .into_owned(),
            tip_floor_feed_url: "https://example.invalid/tip_floor".into(),
            tip_floor_refresh_interval: Duration::from_millis(10_000),
            enable_real_trading: false,
        }
    }

    fn bonding_pool(address: Address, mint_a: Address, mint_b: Address, vault_a: Address, vault_b: Address) -> Pool {
        Pool {
            address,
            venue: Venue::CpBonding,
            mint_a,
            mint_b,
            vault_a,
            vault_b,
            kind: PoolKind::CpBonding { lp_mint: Address::new([99; 32]), creator: Address::new([98; 32]), lp_supply: 0 },
        }
    }

    fn cp_amm_pool(address: Address, mint_a: Address, mint_b: Address, vault_a: Address, vault_b: Address) -> Pool {
        Pool {
            address,
            venue: Venue::CpAmm,
            mint_a,
            mint_b,
            vault_a,
            vault_b,
            kind: PoolKind::CpAmm { lp_mint: Address::new([97; 32]), amm_authority_nonce: 0, status: 0, open_time: 0 },
        }
    }

    fn pool_commit(pool: Pool, slot: crate::types::Slot) -> StreamEvent {
        StreamEvent::Commit(CommitUpdate {
            kind: EntityKind::Pool,
            key: pool.address,
            owning_pool: None,
            payload: Payload::Pool(pool),
            version: Version::new(slot, 0),
            source: Source::Grpc,
            data_len: 0,
        })
    }

    fn vault_commit(key: Address, amount: u64, slot: crate::types::Slot) -> StreamEvent {
        StreamEvent::Commit(CommitUpdate {
            kind: EntityKind::Vault,
            key,
            owning_pool: None,
            payload: Payload::Vault(Vault { amount }),
            version: Version::new(slot, 0),
            source: Source::Grpc,
            data_len: 0,
        })
    }

    #[tokio::test]
    async fn discover_freeze_activate_detect_end_to_end() {
        let config = test_config();
        let opp_log_path = config.opportunity_log_path.clone();
        let engine = Engine::new(config, Pubkey::new_unique()).unwrap();

        let mut slot = 0u64;
        let mut touched = Vec::new();

        engine.handle_stream_event(StreamEvent::SlotAdvanced(100), &mut slot, &mut touched).await;

        let token_mint = Address::new([50; 32]);
        let quote_mint = *crate::constants::WRAPPED_NATIVE_MINT;

        let pool_a = Address::new([1; 32]);
        let vault_a1 = Address::new([11; 32]);
        let vault_a2 = Address::new([12; 32]);
        let pool_b = Address::new([2; 32]);
        let vault_b1 = Address::new([21; 32]);
        let vault_b2 = Address::new([22; 32]);

        engine
            .handle_stream_event(pool_commit(bonding_pool(pool_a, token_mint, quote_mint, vault_a1, vault_a2), 100), &mut slot, &mut touched)
            .await;
        engine.handle_stream_event(vault_commit(vault_a1, 1_000_000, 100), &mut slot, &mut touched).await;
        engine.handle_stream_event(vault_commit(vault_a2, 1_000_000, 100), &mut slot, &mut touched).await;

        engine
            .handle_stream_event(pool_commit(cp_amm_pool(pool_b, token_mint, quote_mint, vault_b1, vault_b2), 100), &mut slot, &mut touched)
            .await;
        engine.handle_stream_event(vault_commit(vault_b1, 1_000_000, 100), &mut slot, &mut touched).await;
        engine.handle_stream_event(vault_commit(vault_b2, 1_100_000, 100), &mut slot, &mut touched).await;

        // Neither pool is active yet: both are still sitting in DISCOVERED
        // waiting on the bootstrap pipeline.
        assert_eq!(engine.registry.read().await.lifecycle.state_of(&pool_a), Some(PoolState::Discovered));

        bootstrap_tick(
            &engine.registry,
            &engine.orphan_buffer,
            &engine.fragmentation,
            &engine.rpc_fetcher,
            engine.config.tick_array_radius,
            engine.config.bin_array_radius,
        )
        .await;

        assert_eq!(engine.registry.read().await.lifecycle.state_of(&pool_a), Some(PoolState::Active));
        assert_eq!(engine.registry.read().await.lifecycle.state_of(&pool_b), Some(PoolState::Active));
        assert!(engine.fragmentation.read().await.is_fragmented(token_mint, quote_mint));

        engine.run_detection_pass(slot, touched).await;

        let stats = engine.stats_snapshot().await;
        assert!(stats.commits_applied >= 6);
        assert!(stats.opportunities_detected >= 1);

        let _ = std::fs::remove_file(&opp_log_path);
    }
}
