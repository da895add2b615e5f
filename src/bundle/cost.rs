//! Dynamic tip floor tracking and total-cost accounting for a two-swap
//! backrun bundle.

use serde::Deserialize;
use std::time::Instant;

/// Tip-floor percentile data, refreshed periodically from an external feed.
/// `Default` gives conservative (higher) tips when that feed is unavailable.
#[derive(Debug, Clone, Deserialize)]
pub struct TipFloor {
    #[serde(rename = "landed_tips_25th_percentile")]
    pub p25: f64,
    #[serde(rename = "landed_tips_50th_percentile")]
    pub p50: f64,
    #[serde(rename = "landed_tips_75th_percentile")]
    pub p75: f64,
    #[serde(rename = "landed_tips_95th_percentile")]
    pub p95: f64,
    #[serde(rename = "landed_tips_99th_percentile")]
    pub p99: f64,
    #[serde(skip, default = "Instant::now")]
    pub last_updated: Instant,
}

impl Default for TipFloor {
    fn default() -> Self {
        TipFloor {
            p25: 0.000_001,
            p50: 0.000_001,
            p75: 0.000_010,
            p95: 0.001_000,
            p99: 0.010_000,
            last_updated: Instant::now(),
        }
    }
}

const LAMPORTS_PER_SOL: f64 = 1_000_000_000.0;
const MAX_TIP_LAMPORTS: u64 = 3_000_000; // 0.003 SOL hard cap

impl TipFloor {
    /// Refreshes percentiles from an external JITO-style tip-floor feed.
    /// Leaves the existing (conservative) values in place on any failure —
    /// a stale feed should never block bundle construction.
    pub async fn refresh_from_feed(&mut self, feed_url: &str, client: &reqwest::Client) {
        match client.get(feed_url).send().await {
            Ok(resp) => match resp.json::<Vec<TipFloor>>().await {
                Ok(mut entries) if !entries.is_empty() => {
                    let fresh = entries.remove(0);
                    self.p25 = fresh.p25;
                    self.p50 = fresh.p50;
                    self.p75 = fresh.p75;
                    self.p95 = fresh.p95;
                    self.p99 = fresh.p99;
                    self.last_updated = Instant::now();
                }
                Ok(_) => tracing::warn!("tip floor feed returned an empty body"),
                Err(e) => tracing::warn!(error = %e, "tip floor feed returned unparsable body"),
            },
            Err(e) => tracing::warn!(error = %e, feed_url, "tip floor feed request failed"),
        }
    }

    fn p95_lamports(&self) -> u64 {
        (self.p95 * LAMPORTS_PER_SOL) as u64
    }
    fn p99_lamports(&self) -> u64 {
        (self.p99 * LAMPORTS_PER_SOL) as u64
    }

    /// 10% above the percentile to beat competitive landers, hard-capped.
    pub fn competitive_tip_95(&self) -> u64 {
        (((self.p95_lamports() as f64) * 1.10) as u64).min(MAX_TIP_LAMPORTS)
    }

    pub fn competitive_tip_99(&self) -> u64 {
        (((self.p99_lamports() as f64) * 1.10) as u64).min(MAX_TIP_LAMPORTS)
    }
}

/// Per-venue base compute-unit-price floor (micro-lamports), used when no
/// tip-floor feed is available at all.
pub const DEFAULT_COMPUTE_UNIT_PRICE_MICRO_LAMPORTS: u64 = 1_000;

pub struct BundleCosts {
    pub dex_fee_lamports: u64,
    pub jito_tip_lamports: u64,
    pub base_tx_fee_lamports: u64,
    pub compute_fee_lamports: u64,
    pub total_cost_lamports: u64,
}

impl BundleCosts {
    /// Scales the tip to the size of the expected profit: small
    /// opportunities pay the p95 floor, larger ones pay p99 to reduce the
    /// chance of losing the slot to a competing searcher (cost_calculator
    /// pattern in the reference bot).
    pub fn calculate(
        expected_profit_lamports: u64,
        compute_units: u32,
        compute_unit_price_micro_lamports: u64,
        dex_fee_bps_total: u32,
        gross_input_lamports: u64,
        tip_floor: &TipFloor,
    ) -> Self {
        let base_tx_fee_lamports = 5_000;
        let compute_fee_lamports = (compute_units as u128 * compute_unit_price_micro_lamports as u128 / 1_000_000) as u64;
        let dex_fee_lamports = (gross_input_lamports as u128 * dex_fee_bps_total as u128 / 10_000) as u64;

        let jito_tip_lamports = if expected_profit_lamports > 50_000_000 {
            tip_floor.competitive_tip_99()
        } else {
            tip_floor.competitive_tip_95()
        };

        let total_cost_lamports = base_tx_fee_lamports + compute_fee_lamports + dex_fee_lamports + jito_tip_lamports;

        BundleCosts { dex_fee_lamports, jito_tip_lamports, base_tx_fee_lamports, compute_fee_lamports, total_cost_lamports }
    }

    pub fn net_profit(&self, gross_profit_lamports: u64) -> i64 {
        gross_profit_lamports as i64 - self.total_cost_lamports as i64
    }

    pub fn is_profitable(&self, gross_profit_lamports: u64) -> bool {
        self.net_profit(gross_profit_lamports) > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tip_is_capped_at_max_even_with_extreme_percentile() {
        let floor = TipFloor { p95: 1.0, p99: 2.0, ..Default::default() };
        assert_eq!(floor.competitive_tip_95(), MAX_TIP_LAMPORTS);
        assert_eq!(floor.competitive_tip_99(), MAX_TIP_LAMPORTS);
    }

    #[test]
    fn large_profit_uses_p99_tip_tier() {
        let floor = TipFloor::default();
        let costs = BundleCosts::calculate(100_000_000, 400_000, 1_000, 55, 1_000_000_000, &floor);
        assert_eq!(costs.jito_tip_lamports, floor.competitive_tip_99());
    }

    #[test]
    fn profitability_accounts_for_every_cost_component() {
        let floor = TipFloor::default();
        let costs = BundleCosts::calculate(1_000_000, 300_000, 1_000, 55, 1_000_000, &floor);
        assert!(costs.total_cost_lamports > costs.jito_tip_lamports);
        assert_eq!(costs.is_profitable(100), false);
    }
}
