//! Submission sink abstraction: the builder hands off serialized bytes, the
//! sink decides how (and where) they land on-chain.

use async_trait::async_trait;

pub struct SubmitResult {
    pub accepted: bool,
    pub bundle_id: Option<String>,
}

/// Object-safe so `Engine` can hold `Box<dyn BundleSink>` and swap the real
/// relay client for `NullSink` in tests without a generic parameter.
#[async_trait]
pub trait BundleSink: Send + Sync {
    async fn submit(&self, transaction_bytes: Vec<u8>, tip_lamports: u64) -> anyhow::Result<SubmitResult>;
}

/// Discards every bundle without submitting it. Used for dry-run detection
/// passes and for tests that exercise the full pipeline without touching a
/// real relay.
pub struct NullSink;

#[async_trait]
impl BundleSink for NullSink {
    async fn submit(&self, transaction_bytes: Vec<u8>, tip_lamports: u64) -> anyhow::Result<SubmitResult> {
        tracing::info!(bytes = transaction_bytes.len(), tip_lamports, "null sink: discarding bundle");
        Ok(SubmitResult { accepted: false, bundle_id: None })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn null_sink_never_accepts() {
        let sink = NullSink;
        let result = sink.submit(vec![1, 2, 3], 10_000).await.unwrap();
        assert!(!result.accepted);
        assert!(result.bundle_id.is_none());
    }
}
