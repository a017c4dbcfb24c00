//! Per-IP request throttling.
//!
//! A token bucket per client address, refilled continuously. Bucket state is
//! kept in millitokens so the refill arithmetic stays integral.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::Response;
use tokio::sync::Mutex;
use tracing::warn;

const MILLI: u64 = 1_000;

struct Bucket {
    millitokens: u64,
    touched: Instant,
}

#[derive(Clone)]
pub struct RateLimiter {
    buckets: Arc<Mutex<HashMap<IpAddr, Bucket>>>,
    /// Sustained refill rate, requests per second.
    per_second: u64,
    /// Bucket capacity, i.e. the tolerated burst.
    burst: u64,
}

impl RateLimiter {
    pub fn new(per_second: u64, burst: u64) -> Self {
        Self {
            buckets: Arc::new(Mutex::new(HashMap::new())),
            per_second,
            burst,
        }
    }

    /// Take one token for `ip`, refilling the bucket for the time elapsed
    /// since its last use. Returns `false` when the bucket is empty.
    pub async fn try_acquire(&self, ip: IpAddr) -> bool {
        let capacity = self.burst * MILLI;
        let now = Instant::now();

        let mut buckets = self.buckets.lock().await;
        let bucket = buckets.entry(ip).or_insert(Bucket {
            millitokens: capacity,
            touched: now,
        });

        let elapsed_ms = now.duration_since(bucket.touched).as_millis() as u64;
        bucket.millitokens = (bucket.millitokens + elapsed_ms * self.per_second).min(capacity);
        bucket.touched = now;

        if bucket.millitokens >= MILLI {
            bucket.millitokens -= MILLI;
            true
        } else {
            false
        }
    }

    /// Drop buckets that have not been touched for `max_idle`.
    pub async fn purge_idle(&self, max_idle: Duration) {
        let now = Instant::now();
        let mut buckets = self.buckets.lock().await;
        buckets.retain(|_, bucket| now.duration_since(bucket.touched) < max_idle);
    }

    #[cfg(test)]
    async fn bucket_count(&self) -> usize {
        self.buckets.lock().await.len()
    }
}

impl Default for RateLimiter {
    /// 10 req/s sustained, burst of 30.
    fn default() -> Self {
        Self::new(10, 30)
    }
}

pub async fn rate_limit_middleware(
    State(limiter): State<RateLimiter>,
    req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if let Some(ip) = client_ip(&req) {
        if !limiter.try_acquire(ip).await {
            warn!(ip = %ip, "Rate limit exceeded");
            return Err(StatusCode::TOO_MANY_REQUESTS);
        }
    }

    Ok(next.run(req).await)
}

/// Socket address from the connection, or the first X-Forwarded-For entry
/// when the server sits behind a proxy.
fn client_ip(req: &Request) -> Option<IpAddr> {
    if let Some(connect_info) = req.extensions().get::<ConnectInfo<std::net::SocketAddr>>() {
        return Some(connect_info.0.ip());
    }

    let forwarded = req.headers().get("x-forwarded-for")?.to_str().ok()?;
    forwarded.split(',').next()?.trim().parse().ok()
}
