use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use crate::config::AppConfig;
use crate::error::AppError;

/// Fixed-window request limiter keyed by endpoint and device.
///
/// Expired windows are dropped on every check, so idle devices do not
/// accumulate.
#[derive(Clone)]
pub struct EndpointRateLimiter {
    windows: Arc<Mutex<HashMap<(ProtectedEndpoint, String), DeviceWindow>>>,
    window: Duration,
    diff_limit: u32,
    commit_limit: u32,
    metrics: Arc<RateLimitMetrics>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProtectedEndpoint {
    SyncDiff,
    SyncCommit,
}

#[derive(Default)]
struct RateLimitMetrics {
    diff_allowed: AtomicU64,
    diff_limited: AtomicU64,
    commit_allowed: AtomicU64,
    commit_limited: AtomicU64,
}

#[derive(Debug, Clone, Copy, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitMetricsSnapshot {
    pub diff_allowed: u64,
    pub diff_limited: u64,
    pub commit_allowed: u64,
    pub commit_limited: u64,
}

#[derive(Debug, Clone, Copy)]
struct DeviceWindow {
    started_at: Instant,
    count: u32,
}

impl EndpointRateLimiter {
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.rate_limit_window,
            config.sync_diff_rate_limit_per_window,
            config.sync_commit_rate_limit_per_window,
        )
    }

    fn new(window: Duration, diff_limit: u32, commit_limit: u32) -> Self {
        Self {
            windows: Arc::new(Mutex::new(HashMap::new())),
            window,
            diff_limit,
            commit_limit,
            metrics: Arc::new(RateLimitMetrics::default()),
        }
    }

    pub async fn check(&self, endpoint: ProtectedEndpoint, device_id: &str) -> Result<(), AppError> {
        let limit = match endpoint {
            ProtectedEndpoint::SyncDiff => self.diff_limit,
            ProtectedEndpoint::SyncCommit => self.commit_limit,
        };

        let now = Instant::now();
        let mut windows = self.windows.lock().await;
        windows.retain(|_, window| now.duration_since(window.started_at) < self.window);
        let entry = windows
            .entry((endpoint, device_id.to_string()))
            .or_insert(DeviceWindow {
                started_at: now,
                count: 0,
            });

        if entry.count >= limit {
            let retry_after_secs = self
                .window
                .saturating_sub(now.duration_since(entry.started_at))
                .as_secs();
            self.metric(endpoint, true).fetch_add(1, Ordering::Relaxed);
            tracing::warn!(
                endpoint = endpoint.label(),
                device = device_id,
                retry_after_secs,
                "Rate limit exceeded"
            );
            return Err(AppError::too_many_requests(
                "Rate limit exceeded for sync endpoint",
                retry_after_secs,
            ));
        }

        entry.count += 1;
        self.metric(endpoint, false).fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    #[cfg(test)]
    async fn tracked_windows(&self) -> usize {
        self.windows.lock().await.len()
    }

    pub fn metrics_snapshot(&self) -> RateLimitMetricsSnapshot {
        RateLimitMetricsSnapshot {
            diff_allowed: self.metrics.diff_allowed.load(Ordering::Relaxed),
            diff_limited: self.metrics.diff_limited.load(Ordering::Relaxed),
            commit_allowed: self.metrics.commit_allowed.load(Ordering::Relaxed),
            commit_limited: self.metrics.commit_limited.load(Ordering::Relaxed),
        }
    }

    fn metric(&self, endpoint: ProtectedEndpoint, limited: bool) -> &AtomicU64 {
        match (endpoint, limited) {
            (ProtectedEndpoint::SyncDiff, false) => &self.metrics.diff_allowed,
            (ProtectedEndpoint::SyncDiff, true) => &self.metrics.diff_limited,
            (ProtectedEndpoint::SyncCommit, false) => &self.metrics.commit_allowed,
            (ProtectedEndpoint::SyncCommit, true) => &self.metrics.commit_limited,
        }
    }
}

impl ProtectedEndpoint {
    pub const fn label(self) -> &'static str {
        match self {
            Self::SyncDiff => "sync_diff",
            Self::SyncCommit => "sync_commit",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rate_limiter_blocks_after_limit() {
        let limiter = EndpointRateLimiter::new(Duration::from_secs(60), 2, 2);

        limiter
            .check(ProtectedEndpoint::SyncDiff, "device-a")
            .await
            .unwrap();
        limiter
            .check(ProtectedEndpoint::SyncDiff, "device-a")
            .await
            .unwrap();

        let err = limiter
            .check(ProtectedEndpoint::SyncDiff, "device-a")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::TooManyRequests(_, _)));

        let metrics = limiter.metrics_snapshot();
        assert_eq!(metrics.diff_allowed, 2);
        assert_eq!(metrics.diff_limited, 1);
    }

    #[tokio::test]
    async fn limits_are_per_device_and_endpoint() {
        let limiter = EndpointRateLimiter::new(Duration::from_secs(60), 1, 1);

        limiter
            .check(ProtectedEndpoint::SyncDiff, "device-a")
            .await
            .unwrap();
        limiter
            .check(ProtectedEndpoint::SyncDiff, "device-b")
            .await
            .unwrap();
        limiter
            .check(ProtectedEndpoint::SyncCommit, "device-a")
            .await
            .unwrap();

        assert_eq!(limiter.metrics_snapshot().commit_allowed, 1);
    }

    #[tokio::test]
    async fn expired_windows_are_dropped() {
        let limiter = EndpointRateLimiter::new(Duration::from_secs(60), 5, 5);
        limiter
            .check(ProtectedEndpoint::SyncDiff, "device-a")
            .await
            .unwrap();
        limiter
            .check(ProtectedEndpoint::SyncDiff, "device-b")
            .await
            .unwrap();
        assert_eq!(limiter.tracked_windows().await, 2);

        let limiter = EndpointRateLimiter::new(Duration::ZERO, 1, 1);
        for device in ["device-a", "device-b", "device-c"] {
            limiter
                .check(ProtectedEndpoint::SyncCommit, device)
                .await
                .unwrap();
        }
        assert_eq!(limiter.tracked_windows().await, 1);
    }
}
