//! Per-client rate limiting middleware.
//!
//! Token-bucket admission control keyed by client address. A single mutex
//! guards the whole registry so lookup, refill, and decrement form one
//! atomic step; contention is proportional to live clients, not request
//! rate, because a decision on an existing bucket is O(1). A background
//! sweep evicts buckets idle past a threshold so the registry stays
//! bounded under churn of distinct client addresses.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    middleware::Next,
    response::Response,
};
use tokio::sync::broadcast;

use crate::config::RateLimitConfig;
use crate::gate::AdmissionError;
use crate::observability::metrics;

/// How often the background sweep runs.
const EVICTION_INTERVAL: Duration = Duration::from_secs(60);

/// Idle time after which a bucket is removed.
const IDLE_THRESHOLD: Duration = Duration::from_secs(180);

/// One client's bucket. Invariant: `0 <= tokens <= burst`.
struct Bucket {
    tokens: f64,
    last_seen: Instant,
}

/// Token-bucket registry for all clients.
pub struct RateLimiter {
    buckets: Mutex<HashMap<String, Bucket>>,
    requests_per_second: f64,
    burst: f64,
    enabled: bool,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
            requests_per_second: config.requests_per_second,
            burst: f64::from(config.burst_size),
            enabled: config.enabled,
        }
    }

    /// Decide whether one request from `key` is admitted.
    ///
    /// A new bucket starts full. Refill and decrement happen under a
    /// single lock acquisition, so concurrent calls for the same key can
    /// never both spend the last token; the lock is released before any
    /// await point.
    pub fn allow(&self, key: &str) -> bool {
        if !self.enabled {
            return true;
        }

        let now = Instant::now();
        let mut buckets = self.buckets.lock().expect("rate limiter mutex poisoned");
        let bucket = buckets.entry(key.to_string()).or_insert(Bucket {
            tokens: self.burst,
            last_seen: now,
        });

        let elapsed = now.duration_since(bucket.last_seen).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.requests_per_second).min(self.burst);
        bucket.last_seen = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Remove every bucket idle for longer than `threshold`.
    ///
    /// Returns how many buckets were removed.
    pub fn evict_idle(&self, threshold: Duration) -> usize {
        let now = Instant::now();
        let mut buckets = self.buckets.lock().expect("rate limiter mutex poisoned");
        let before = buckets.len();
        buckets.retain(|_, bucket| now.duration_since(bucket.last_seen) <= threshold);
        before - buckets.len()
    }

    /// Number of client buckets currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.buckets.lock().expect("rate limiter mutex poisoned").len()
    }

    /// Periodic eviction sweep; runs until the shutdown signal fires.
    pub async fn run_eviction(self: Arc<Self>, mut shutdown: broadcast::Receiver<()>) {
        let mut ticker = tokio::time::interval(EVICTION_INTERVAL);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let evicted = self.evict_idle(IDLE_THRESHOLD);
                    metrics::record_tracked_clients(self.tracked_clients());
                    if evicted > 0 {
                        tracing::trace!(evicted, "Evicted idle rate limit buckets");
                    }
                }
                _ = shutdown.recv() => {
                    tracing::debug!("Rate limiter eviction sweep stopped");
                    break;
                }
            }
        }
    }
}

/// Admission middleware keyed on the connecting socket's IP address.
///
/// Known limitation: behind a reverse proxy every client shares the
/// proxy's address and therefore a single bucket. Deployments in that
/// position should rate limit at the edge instead of trusting a
/// forwarded-address header here.
pub async fn rate_limit_middleware(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(limiter): State<Arc<RateLimiter>>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AdmissionError> {
    let key = addr.ip().to_string();
    if limiter.allow(&key) {
        Ok(next.run(request).await)
    } else {
        tracing::warn!(client = %key, "Rate limit exceeded");
        metrics::record_rate_limited();
        Err(AdmissionError::RateLimited)
    }
}
