pub mod cache;
pub mod commit;

use crate::pool::lifecycle::LifecycleTable;
use crate::pool::state::{AmmConfig, BinArray, GlobalConfig, Pool, TickArray, Vault};
use crate::types::{Address, Version};
use cache::VersionedCache;
use commit::{CommitSink, CommitUpdate, EntityKind};

/// Owns the six caches plus the lifecycle table. Replaces the "shared
/// mutable caches via duck typing" pattern the Design Notes call out: every
/// mutation outside this module goes through `registry::commit::commit`.
pub struct Registry {
    pub lifecycle: LifecycleTable,
    pools: VersionedCache<Address, Pool>,
    vaults: VersionedCache<Address, Vault>,
    ticks: VersionedCache<Address, TickArray>,
    bins: VersionedCache<Address, BinArray>,
    amm_configs: VersionedCache<Address, AmmConfig>,
    global_configs: VersionedCache<Address, GlobalConfig>,
}

impl Registry {
    pub fn new() -> Self {
        Registry {
            lifecycle: LifecycleTable::new(),
            pools: VersionedCache::new(),
            vaults: VersionedCache::new(),
            ticks: VersionedCache::new(),
            bins: VersionedCache::new(),
            amm_configs: VersionedCache::new(),
            global_configs: VersionedCache::new(),
        }
    }

    pub fn commit(&mut self, update: CommitUpdate) -> commit::CommitResult {
        commit::commit(self, update)
    }

    pub fn pool(&self, addr: &Address) -> Option<Pool> {
        self.pools.get(addr).map(|v| v.value)
    }

    pub fn vault(&self, addr: &Address) -> Option<Vault> {
        self.vaults.get(addr).map(|v| v.value)
    }

    pub fn vault_version(&self, addr: &Address) -> Option<Version> {
        self.vaults.current_version(addr)
    }

    pub fn tick_array(&self, addr: &Address) -> Option<TickArray> {
        self.ticks.get(addr).map(|v| v.value)
    }

    pub fn bin_array(&self, addr: &Address) -> Option<BinArray> {
        self.bins.get(addr).map(|v| v.value)
    }

    pub fn amm_config(&self, addr: &Address) -> Option<AmmConfig> {
        self.amm_configs.get(addr).map(|v| v.value)
    }

    pub fn global_config(&self, addr: &Address) -> Option<GlobalConfig> {
        self.global_configs.get(addr).map(|v| v.value)
    }

    /// Version of any entity at `key`, keyed with the same lookup `commit`
    /// uses for the monotonic-ordering check.
    pub fn version_of(&self, kind: EntityKind, key: &Address) -> Option<Version> {
        CommitSink::current_version(self, kind, key)
    }

    pub fn pool_count(&self) -> usize {
        self.pools.len()
    }

    pub fn active_pool_count(&self) -> usize {
        self.lifecycle.active_pools().count()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl CommitSink for Registry {
    fn lifecycle(&self) -> &LifecycleTable {
        &self.lifecycle
    }

    fn apply_pool(&mut self, key: Address, value: Pool, version: Version) -> bool {
        self.pools.try_apply(key, value, version)
    }

    fn apply_vault(&mut self, key: Address, value: Vault, version: Version) -> bool {
        self.vaults.try_apply(key, value, version)
    }

    fn apply_tick(&mut self, key: Address, value: TickArray, version: Version) -> bool {
        self.ticks.try_apply(key, value, version)
    }

    fn apply_bin(&mut self, key: Address, value: BinArray, version: Version) -> bool {
        self.bins.try_apply(key, value, version)
    }

    fn apply_amm_config(&mut self, key: Address, value: AmmConfig, version: Version) -> bool {
        self.amm_configs.try_apply(key, value, version)
    }

    fn apply_global_config(&mut self, key: Address, value: GlobalConfig, version: Version) -> bool {
        self.global_configs.try_apply(key, value, version)
    }

    fn current_version(&self, kind: EntityKind, key: &Address) -> Option<Version> {
        match kind {
            EntityKind::Pool => self.pools.current_version(key),
            EntityKind::Vault => self.vaults.current_version(key),
            EntityKind::Tick => self.ticks.current_version(key),
            EntityKind::Bin => self.bins.current_version(key),
            EntityKind::AmmConfig => self.amm_configs.current_version(key),
            EntityKind::GlobalConfig => self.global_configs.current_version(key),
        }
    }
}
