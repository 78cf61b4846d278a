//! Rate limiting for the staff login form.
//!
//! The back-office has a single sensitive unauthenticated endpoint, so only
//! `POST /auth/login` is limited: one attempt every 12 seconds per IP with
//! a burst of 5.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::extract::ConnectInfo;
use axum::http::Request;
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

/// Replenish period in seconds.
const LOGIN_PERIOD_SECS: u64 = 12;

/// Attempts allowed back to back.
const LOGIN_BURST: u32 = 5;

/// Key extractor using the proxy-reported client IP, then the TCP peer.
#[derive(Clone, Copy)]
pub struct PeerIpKeyExtractor;

impl tower_governor::key_extractor::KeyExtractor for PeerIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        let forwarded = ["x-forwarded-for", "x-real-ip"].into_iter().find_map(|name| {
            req.headers()
                .get(name)?
                .to_str()
                .ok()?
                .split(',')
                .next()?
                .trim()
                .parse::<IpAddr>()
                .ok()
        });

        forwarded
            .or_else(|| {
                req.extensions()
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| addr.ip())
            })
            .ok_or(GovernorError::UnableToExtractKey)
    }
}

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer =
    GovernorLayer<PeerIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Rate limiter for the login form.
///
/// # Panics
///
/// Never in practice: the period and burst are non-zero constants.
#[must_use]
pub fn login_rate_limiter() -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(PeerIpKeyExtractor)
        .per_second(LOGIN_PERIOD_SECS)
        .burst_size(LOGIN_BURST)
        .finish()
        .expect("login rate limiter constants are non-zero");
    GovernorLayer::new(Arc::new(config))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tower_governor::key_extractor::KeyExtractor;

    use super::*;

    #[test]
    fn test_real_ip_header() {
        let req = Request::builder()
            .header("x-real-ip", "105.98.12.4")
            .body(())
            .unwrap();
        assert_eq!(
            PeerIpKeyExtractor.extract(&req).ok(),
            "105.98.12.4".parse().ok()
        );
    }

    #[test]
    fn test_garbage_header_falls_through_to_peer() {
        let mut req = Request::builder()
            .header("x-forwarded-for", "unknown")
            .body(())
            .unwrap();
        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([10, 0, 0, 2], 443))));
        assert_eq!(
            PeerIpKeyExtractor.extract(&req).ok(),
            "10.0.0.2".parse().ok()
        );
    }
}
