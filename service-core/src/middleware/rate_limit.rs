use crate::error::AppError;
use dashmap::DashMap;
use governor::{
    Quota, RateLimiter,
    clock::{Clock, DefaultClock},
    state::{InMemoryState, NotKeyed},
};
use std::{num::NonZeroU32, sync::Arc, time::Duration};

/// Rate limiter for a single client
pub type UnkeyedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Create a limiter allowing `attempts` per `window_seconds`, with the full
/// allowance available as a burst.
pub fn create_unkeyed_rate_limiter(attempts: u32, window_seconds: u64) -> UnkeyedRateLimiter {
    let attempts = NonZeroU32::new(attempts).unwrap_or(NonZeroU32::MIN);
    let period_ms = (window_seconds.max(1) * 1000) / u64::from(attempts.get());
    let quota = Quota::with_period(Duration::from_millis(period_ms.max(1)))
        .unwrap_or_else(|| Quota::per_second(NonZeroU32::MIN))
        .allow_burst(attempts);

    Arc::new(RateLimiter::direct(quota))
}

/// A key's limiter together with the quota it was built for.
#[derive(Clone)]
struct KeyBucket {
    requests_per_minute: u32,
    limiter: UnkeyedRateLimiter,
}

impl KeyBucket {
    fn new(requests_per_minute: u32) -> Self {
        Self {
            requests_per_minute,
            limiter: create_unkeyed_rate_limiter(requests_per_minute, 60),
        }
    }
}

/// Per-API-key limiter. Permits everything unless `enforce` is set, in which
/// case each key gets its own per-minute quota. A key whose quota changes
/// starts over with a fresh bucket.
#[derive(Clone)]
pub struct ApiKeyRateLimiter {
    enforce: bool,
    limiters: Arc<DashMap<String, KeyBucket>>,
}

impl ApiKeyRateLimiter {
    pub fn new(enforce: bool) -> Self {
        Self {
            enforce,
            limiters: Arc::new(DashMap::new()),
        }
    }

    pub fn check(&self, key_id: &str, requests_per_minute: u32) -> Result<(), AppError> {
        if !self.enforce || requests_per_minute == 0 {
            return Ok(());
        }

        let limiter = {
            let mut bucket = self
                .limiters
                .entry(key_id.to_string())
                .or_insert_with(|| KeyBucket::new(requests_per_minute));
            if bucket.requests_per_minute != requests_per_minute {
                tracing::debug!(key_id = %key_id, requests_per_minute, "API key quota changed");
                *bucket = KeyBucket::new(requests_per_minute);
            }
            bucket.limiter.clone()
        };

        match limiter.check() {
            Ok(_) => Ok(()),
            Err(negative) => {
                let wait_time = negative.wait_time_from(DefaultClock::default().now());
                tracing::warn!(key_id = %key_id, "API key rate limit exceeded");
                Err(AppError::TooManyRequests(
                    "Rate limit exceeded".to_string(),
                    Some(wait_time.as_secs().max(1)),
                ))
            }
        }
    }
}
