//! The canonical `commit` entry point. This is the only writer
//! to any cache in the registry — decoders, topology bootstrap, the orphan
//! buffer drainer, and refresh all funnel through it.

use crate::errors::CommitRejection;
use crate::pool::lifecycle::{LifecycleTable, PoolState};
use crate::pool::state::{AmmConfig, BinArray, GlobalConfig, Pool, TickArray, Vault};
use crate::types::{Address, Source, Version};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntityKind {
    Pool,
    Vault,
    Tick,
    Bin,
    AmmConfig,
    GlobalConfig,
}

pub enum Payload {
    Pool(Pool),
    Vault(Vault),
    Tick(TickArray),
    Bin(BinArray),
    AmmConfig(AmmConfig),
    GlobalConfig(GlobalConfig),
}

/// A tagged update bound for the registry.
pub struct CommitUpdate {
    pub kind: EntityKind,
    pub key: Address,
    /// The pool this account is scoped to, for the containment check. Not
    /// meaningful for `Pool` (nothing contains a pool) or `GlobalConfig`
    /// (a program-level singleton, not pool-scoped) — both kinds are
    /// excluded from the containment rule below.
    pub owning_pool: Option<Address>,
    pub payload: Payload,
    pub version: Version,
    pub source: Source,
    pub data_len: usize,
}

pub struct CommitResult {
    pub updated: bool,
    pub reason: Option<CommitRejection>,
}

impl CommitResult {
    fn applied() -> Self {
        CommitResult { updated: true, reason: None }
    }
    fn rejected(reason: CommitRejection) -> Self {
        CommitResult { updated: false, reason: Some(reason) }
    }
}

/// Anything `commit` needs to check containment and apply a write. Kept as
/// a trait so `commit` can be unit-tested against a minimal fake registry
/// without constructing the full `Registry`.
pub trait CommitSink {
    fn lifecycle(&self) -> &LifecycleTable;
    fn apply_pool(&mut self, key: Address, value: Pool, version: Version) -> bool;
    fn apply_vault(&mut self, key: Address, value: Vault, version: Version) -> bool;
    fn apply_tick(&mut self, key: Address, value: TickArray, version: Version) -> bool;
    fn apply_bin(&mut self, key: Address, value: BinArray, version: Version) -> bool;
    fn apply_amm_config(&mut self, key: Address, value: AmmConfig, version: Version) -> bool;
    fn apply_global_config(&mut self, key: Address, value: GlobalConfig, version: Version) -> bool;
    fn current_version(&self, kind: EntityKind, key: &Address) -> Option<Version>;
}

fn containment_checked(kind: EntityKind) -> bool {
    matches!(kind, EntityKind::Tick | EntityKind::Bin | EntityKind::AmmConfig | EntityKind::Vault)
}

/// The single entry point every write must pass through.
pub fn commit(sink: &mut impl CommitSink, update: CommitUpdate) -> CommitResult {
    // Rule 1: source containment.
    if containment_checked(update.kind) {
        if let Some(owner) = update.owning_pool {
            if let Some(record) = sink.lifecycle().get(&owner) {
                let frozen = matches!(record.state, PoolState::TopologyFrozen | PoolState::Active);
                if frozen {
                    if update.source == Source::Rpc {
                        return CommitResult::rejected(CommitRejection::RpcForbidden);
                    }
                    let in_topology = record
                        .topology
                        .as_ref()
                        .map(|t| t.contains(&update.key))
                        .unwrap_or(false);
                    if !in_topology {
                        return CommitResult::rejected(CommitRejection::OutOfTopology);
                    }
                }
            }
        }
    }

    // Rule 2: monotonic ordering.
    if let Some(current) = sink.current_version(update.kind, &update.key) {
        if update.version <= current {
            return CommitResult::rejected(CommitRejection::Stale);
        }
    }

    // Rule 3: apply.
    let applied = match update.payload {
        Payload::Pool(v) => sink.apply_pool(update.key, v, update.version),
        Payload::Vault(v) => sink.apply_vault(update.key, v, update.version),
        Payload::Tick(v) => sink.apply_tick(update.key, v, update.version),
        Payload::Bin(v) => sink.apply_bin(update.key, v, update.version),
        Payload::AmmConfig(v) => sink.apply_amm_config(update.key, v, update.version),
        Payload::GlobalConfig(v) => sink.apply_global_config(update.key, v, update.version),
    };

    if applied {
        CommitResult::applied()
    } else {
        // A race lost between the version check above and the apply below.
        CommitResult::rejected(CommitRejection::Stale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::lifecycle::Topology;
    use crate::registry::cache::VersionedCache;
    use std::collections::HashSet;

    struct FakeRegistry {
        lifecycle: LifecycleTable,
        pools: VersionedCache<Address, Pool>,
        vaults: VersionedCache<Address, Vault>,
    }

    impl CommitSink for FakeRegistry {
        fn lifecycle(&self) -> &LifecycleTable {
            &self.lifecycle
        }
        fn apply_pool(&mut self, key: Address, value: Pool, version: Version) -> bool {
            self.pools.try_apply(key, value, version)
        }
        fn apply_vault(&mut self, key: Address, value: Vault, version: Version) -> bool {
            self.vaults.try_apply(key, value, version)
        }
        fn apply_tick(&mut self, _: Address, _: TickArray, _: Version) -> bool {
            true
        }
        fn apply_bin(&mut self, _: Address, _: BinArray, _: Version) -> bool {
            true
        }
        fn apply_amm_config(&mut self, _: Address, _: AmmConfig, _: Version) -> bool {
            true
        }
        fn apply_global_config(&mut self, _: Address, _: GlobalConfig, _: Version) -> bool {
            true
        }
        fn current_version(&self, kind: EntityKind, key: &Address) -> Option<Version> {
            match kind {
                EntityKind::Pool => self.pools.current_version(key),
                EntityKind::Vault => self.vaults.current_version(key),
                _ => None,
            }
        }
    }

    fn vault_update(key: Address, owner: Address, amount: u64, version: Version, source: Source) -> CommitUpdate {
        CommitUpdate {
            kind: EntityKind::Vault,
            key,
            owning_pool: Some(owner),
            payload: Payload::Vault(Vault { amount }),
            version,
            source,
            data_len: 72,
        }
    }

    #[test]
    fn rpc_write_forbidden_once_pool_is_frozen() {
        let pool = Address::new([1; 32]);
        let vault = Address::new([2; 32]);
        let mut lifecycle = LifecycleTable::new();
        lifecycle.discover(pool, 100);
        lifecycle.freeze(pool, HashSet::from([vault]), 101);

        let mut registry = FakeRegistry { lifecycle, pools: VersionedCache::new(), vaults: VersionedCache::new() };

        let result = commit(&mut registry, vault_update(vault, pool, 500, Version::new(102, 0), Source::Rpc));
        assert!(!result.updated);
        assert_eq!(result.reason, Some(CommitRejection::RpcForbidden));
    }

    #[test]
    fn grpc_write_outside_topology_is_rejected() {
        let pool = Address::new([1; 32]);
        let in_topology_vault = Address::new([2; 32]);
        let other_vault = Address::new([3; 32]);
        let mut lifecycle = LifecycleTable::new();
        lifecycle.discover(pool, 100);
        lifecycle.freeze(pool, HashSet::from([in_topology_vault]), 101);

        let mut registry = FakeRegistry { lifecycle, pools: VersionedCache::new(), vaults: VersionedCache::new() };

        let result = commit(
            &mut registry,
            vault_update(other_vault, pool, 500, Version::new(102, 0), Source::Grpc),
        );
        assert_eq!(result.reason, Some(CommitRejection::OutOfTopology));
    }

    #[test]
    fn rpc_write_allowed_before_freeze() {
        let pool = Address::new([1; 32]);
        let vault = Address::new([2; 32]);
        let mut lifecycle = LifecycleTable::new();
        lifecycle.discover(pool, 100);

        let mut registry = FakeRegistry { lifecycle, pools: VersionedCache::new(), vaults: VersionedCache::new() };

        let result = commit(&mut registry, vault_update(vault, pool, 500, Version::new(101, 0), Source::Rpc));
        assert!(result.updated);
    }

    #[test]
    fn stale_version_is_rejected_after_containment_passes() {
        let pool = Address::new([1; 32]);
        let vault = Address::new([2; 32]);
        let mut lifecycle = LifecycleTable::new();
        lifecycle.discover(pool, 100);
        lifecycle.freeze(pool, HashSet::from([vault]), 101);
        let _ = Topology::default();

        let mut registry = FakeRegistry { lifecycle, pools: VersionedCache::new(), vaults: VersionedCache::new() };
        registry.vaults.try_apply(vault, Vault { amount: 1 }, Version::new(105, 0));

        let result = commit(&mut registry, vault_update(vault, pool, 999, Version::new(105, 0), Source::Grpc));
        assert_eq!(result.reason, Some(CommitRejection::Stale));
    }
}
