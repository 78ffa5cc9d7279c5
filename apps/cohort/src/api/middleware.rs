//! # Rate Limiting
//!
//! A single global token bucket in front of every endpoint.
//! `COHORT_RATE_LIMIT` sets requests per second; `0` turns limiting off.

use super::DEFAULT_RATE_LIMIT;
use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use std::num::NonZeroU32;
use std::sync::Arc;

pub type GlobalRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Limiter allowing `requests_per_second` (at least one).
pub fn create_rate_limiter(requests_per_second: u32) -> GlobalRateLimiter {
    let rps = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
    Arc::new(RateLimiter::direct(Quota::per_second(rps)))
}

/// `COHORT_RATE_LIMIT`, falling back to the default on absence or garbage.
pub fn get_rate_limit_from_env() -> u32 {
    match std::env::var("COHORT_RATE_LIMIT") {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("COHORT_RATE_LIMIT '{}' is not a number, using {}", raw, DEFAULT_RATE_LIMIT);
            DEFAULT_RATE_LIMIT
        }),
        Err(_) => DEFAULT_RATE_LIMIT,
    }
}

/// 429 once the bucket is empty.
pub async fn rate_limit_middleware(
    State(limiter): State<GlobalRateLimiter>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, &'static str)> {
    if limiter.check().is_ok() {
        Ok(next.run(request).await)
    } else {
        tracing::warn!(path = request.uri().path(), "Rate limit exceeded");
        Err((StatusCode::TOO_MANY_REQUESTS, "Too Many Requests"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limiter_runs_dry_within_a_second() {
        let limiter = create_rate_limiter(2);
        assert!(limiter.check().is_ok());
        assert!(limiter.check().is_ok());
        assert!(limiter.check().is_err());
    }

    #[test]
    fn zero_still_allows_one_request() {
        let limiter = create_rate_limiter(0);
        assert!(limiter.check().is_ok());
    }
}
