//! Health monitor: cheap, synchronous checks over already-maintained
//! counters, run periodically to decide whether the engine should keep
//! accepting new work.

use crate::ingest::alt_cache::AltCache;
use crate::pool::topology::OrphanBuffer;
use crate::registry::Registry;

pub struct HealthReport {
    pub healthy: bool,
    pub reasons: Vec<String>,
}

pub struct HealthThresholds {
    pub max_orphan_buffer_len: usize,
    pub min_active_pool_ratio: f64,
    pub max_alt_miss_rate: f64,
}

impl Default for HealthThresholds {
    fn default() -> Self {
        HealthThresholds { max_orphan_buffer_len: 10_000, min_active_pool_ratio: 0.5, max_alt_miss_rate: 0.5 }
    }
}

/// Rolling ALT hit/miss counters the engine updates as it resolves pending
/// transactions; read-only from the health check's perspective.
#[derive(Default)]
pub struct AltMissTracker {
    hits: std::sync::atomic::AtomicU64,
    misses: std::sync::atomic::AtomicU64,
}

impl AltMissTracker {
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
    }
    pub fn record_miss(&self) {
        self.misses.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
    }
    fn miss_rate(&self) -> f64 {
        let hits = self.hits.load(std::sync::atomic::Ordering::Relaxed) as f64;
        let misses = self.misses.load(std::sync::atomic::Ordering::Relaxed) as f64;
        if hits + misses == 0.0 {
            0.0
        } else {
            misses / (hits + misses)
        }
    }
}

pub fn check(
    registry: &Registry,
    orphan_buffer: &OrphanBuffer,
    alt_cache: &AltCache,
    alt_misses: &AltMissTracker,
    thresholds: &HealthThresholds,
) -> HealthReport {
    let _ = alt_cache; // cardinality itself isn't a health signal; miss rate is
    let mut reasons = Vec::new();

    if orphan_buffer.len() > thresholds.max_orphan_buffer_len {
        reasons.push(format!("orphan buffer at {} entries (limit {})", orphan_buffer.len(), thresholds.max_orphan_buffer_len));
    }

    let total_pools = registry.pool_count();
    if total_pools > 0 {
        let ratio = registry.active_pool_count() as f64 / total_pools as f64;
        if ratio < thresholds.min_active_pool_ratio {
            reasons.push(format!("only {:.1}% of known pools are active", ratio * 100.0));
        }
    }

    let miss_rate = alt_misses.miss_rate();
    if miss_rate > thresholds.max_alt_miss_rate {
        reasons.push(format!("alt miss rate at {:.1}%", miss_rate * 100.0));
    }

    HealthReport { healthy: reasons.is_empty(), reasons }
}
