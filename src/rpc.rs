//! Bounded-concurrency RPC dependency fetcher: resolves a pool's missing
//! topology keys (vaults, tick/bin arrays, amm-config) without flooding the
//! RPC endpoint.
//!
//! Uses `solana_client::nonblocking::rpc_client` instead of the blocking
//! client the rest of the stack is grounded on (DESIGN.md notes this as a
//! deliberate deviation: a blocking call inside an async task would stall
//! the whole worker thread).

use crate::errors::FetchError;
use crate::types::Address;
use futures::stream::{FuturesUnordered, StreamExt};
use governor::{Quota, RateLimiter};
use solana_client::nonblocking::rpc_client::RpcClient;
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, error, warn};

const CIRCUIT_BREAKER_THRESHOLD: u32 = 5;

type Limiter = RateLimiter<governor::state::NotKeyed, governor::state::InMemoryState, governor::clock::DefaultClock>;

pub struct RpcDependencyFetcher {
    client: Arc<RpcClient>,
    permits: Arc<Semaphore>,
    /// Caps requests per second independent of `permits`, which only bounds
    /// how many fetches run concurrently — this bounds how fast new ones
    /// start, so a burst of pool bootstraps doesn't hammer the endpoint.
    rate_limiter: Limiter,
    per_request_timeout: Duration,
    consecutive_failures: AtomicU32,
}

impl RpcDependencyFetcher {
    pub fn new(endpoint: String, max_concurrent: usize, per_request_timeout: Duration) -> Self {
        Self::with_rate_limit(endpoint, max_concurrent, per_request_timeout, 50)
    }

    pub fn with_rate_limit(endpoint: String, max_concurrent: usize, per_request_timeout: Duration, max_requests_per_sec: u32) -> Self {
        let quota = Quota::per_second(NonZeroU32::new(max_requests_per_sec.max(1)).unwrap());
        RpcDependencyFetcher {
            client: Arc::new(RpcClient::new(endpoint)),
            permits: Arc::new(Semaphore::new(max_concurrent)),
            rate_limiter: RateLimiter::direct(quota),
            per_request_timeout,
            consecutive_failures: AtomicU32::new(0),
        }
    }

    pub fn circuit_breaker_tripped(&self) -> bool {
        self.consecutive_failures.load(Ordering::Relaxed) >= CIRCUIT_BREAKER_THRESHOLD
    }

    fn record_success(&self) {
        self.consecutive_failures.store(0, Ordering::Relaxed);
    }

    fn record_failure(&self) {
        let failures = self.consecutive_failures.fetch_add(1, Ordering::Relaxed) + 1;
        if failures >= CIRCUIT_BREAKER_THRESHOLD {
            error!(failures, "rpc circuit breaker tripped, dependency fetches halted");
        }
    }

    /// Fetches one account, bounded by the shared semaphore and a per-request
    /// timeout. Does not retry internally; callers decide whether a
    /// `FetchError::Timeout` is worth a second attempt.
    pub async fn fetch_one(&self, address: Address) -> Result<Option<Vec<u8>>, FetchError> {
        if self.circuit_breaker_tripped() {
            return Err(FetchError::Rpc("circuit breaker open".into()));
        }

        let _permit = self.permits.clone().acquire_owned().await.map_err(|_| FetchError::Rpc("semaphore closed".into()))?;
        self.rate_limiter.until_ready().await;
        let pubkey = address.to_pubkey();

        let result = tokio::time::timeout(self.per_request_timeout, self.client.get_account(&pubkey)).await;

        match result {
            Ok(Ok(account)) => {
                self.record_success();
                Ok(Some(account.data))
            }
            Ok(Err(e)) => {
                let msg = e.to_string();
                if msg.contains("AccountNotFound") || msg.contains("not found") {
                    self.record_success(); // absence is a valid answer, not a failure
                    Ok(None)
                } else {
                    self.record_failure();
                    Err(FetchError::Rpc(msg))
                }
            }
            Err(_) => {
                self.record_failure();
                Err(FetchError::Timeout)
            }
        }
    }

    /// Fetches an entire topology dependency set concurrently, bounded by
    /// the same semaphore, so a single pool's bootstrap can't itself starve
    /// every other in-flight fetch.
    pub async fn fetch_many(&self, addresses: Vec<Address>) -> Vec<(Address, Result<Option<Vec<u8>>, FetchError>)> {
        let mut futures = FuturesUnordered::new();
        for address in addresses {
            futures.push(async move { (address, self.fetch_one(address).await) });
        }

        let mut results = Vec::new();
        while let Some((address, result)) = futures.next().await {
            if let Err(e) = &result {
                warn!(%address, error = %e, "dependency fetch failed");
            } else {
                debug!(%address, "dependency fetched");
            }
            results.push((address, result));
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn circuit_breaker_trips_after_threshold_failures() {
        let fetcher = RpcDependencyFetcher::new("http://localhost:1".into(), 4, Duration::from_millis(10));
        for _ in 0..CIRCUIT_BREAKER_THRESHOLD {
            fetcher.record_failure();
        }
        assert!(fetcher.circuit_breaker_tripped());
    }

    #[test]
    fn success_resets_circuit_breaker() {
        let fetcher = RpcDependencyFetcher::new("http://localhost:1".into(), 4, Duration::from_millis(10));
        for _ in 0..CIRCUIT_BREAKER_THRESHOLD {
            fetcher.record_failure();
        }
        fetcher.record_success();
        assert!(!fetcher.circuit_breaker_tripped());
    }
}
