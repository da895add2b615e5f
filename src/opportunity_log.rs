//! NDJSON opportunity log: one line per emitted opportunity that
//! clears the dust threshold, written append-only for offline analysis.

use crate::arb::detector::Opportunity;
use crate::bundle::cost::BundleCosts;
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tokio::sync::Mutex;

#[derive(Serialize)]
struct OpportunityRecord<'a> {
    /// Correlates this log line with the bundle-build/submit trace spans
    /// emitted for the same opportunity, since the two are written from
    /// different points in `Engine::run_detection_pass`.
    correlation_id: uuid::Uuid,
    token_mint: String,
    buy_venue: &'static str,
    buy_pool: String,
    sell_venue: &'static str,
    sell_pool: String,
    spread_bps: f64,
    net_bps: f64,
    score: f64,
    profit_lamports: i64,
    tip_lamports: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    note: Option<&'a str>,
}

pub struct OpportunityLog {
    file: Mutex<std::fs::File>,
    dust_threshold_lamports: u64,
}

impl OpportunityLog {
    pub fn open(path: &Path, dust_threshold_lamports: u64) -> anyhow::Result<Self> {
        let file = std::fs::OpenOptions::new().create(true).append(true).open(path)?;
        Ok(OpportunityLog { file: Mutex::new(file), dust_threshold_lamports })
    }

    /// Writes one record if `gross_profit_lamports` clears the dust floor;
    /// silently skips otherwise. Returns the
    /// record's correlation id so the caller can tag later spans for the
    /// same opportunity, or `None` if nothing was written.
    pub async fn record(&self, opportunity: &Opportunity, costs: &BundleCosts, gross_profit_lamports: u64) -> Option<uuid::Uuid> {
        if gross_profit_lamports < self.dust_threshold_lamports {
            return None;
        }
        let net = costs.net_profit(gross_profit_lamports);
        let correlation_id = uuid::Uuid::new_v4();

        let record = OpportunityRecord {
            correlation_id,
            token_mint: opportunity.token_mint.to_string(),
            buy_venue: opportunity.buy.venue.label(),
            buy_pool: opportunity.buy.pool.to_string(),
            sell_venue: opportunity.sell.venue.label(),
            sell_pool: opportunity.sell.pool.to_string(),
            spread_bps: opportunity.spread_bps,
            net_bps: opportunity.net_bps,
            score: opportunity.score,
            profit_lamports: net,
            tip_lamports: costs.jito_tip_lamports,
            note: None,
        };

        let Ok(line) = serde_json::to_string(&record) else { return None };
        let mut file = self.file.lock().await;
        let _ = writeln!(file, "{line}");
        Some(correlation_id)
    }
}
