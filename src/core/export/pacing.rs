//! Inter-page delays
//!
//! Both delays grow with the square of the session's retry budget. The
//! throttle delay is applied between successful pages, the backoff delay
//! before retrying a rate-limited page.

use crate::config::ExportConfig;
use std::time::Duration;

/// Default throttle base between successful pages
pub const DEFAULT_THROTTLE_BASE_MS: u64 = 500;

/// Default backoff base before retrying a rate-limited page
pub const DEFAULT_BACKOFF_BASE_MS: u64 = 1000;

/// Quadratic delay policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacingPolicy {
    throttle_base_ms: u64,
    backoff_base_ms: u64,
}

impl PacingPolicy {
    /// Create a policy from explicit bases
    pub fn new(throttle_base_ms: u64, backoff_base_ms: u64) -> Self {
        Self {
            throttle_base_ms,
            backoff_base_ms,
        }
    }

    /// Create a policy from export configuration
    pub fn from_config(config: &ExportConfig) -> Self {
        Self::new(config.throttle_base_ms, config.backoff_base_ms)
    }

    /// Delay before fetching the next page after a success
    pub fn throttle_delay(&self, retry_budget: u32) -> Duration {
        scaled(self.throttle_base_ms, retry_budget)
    }

    /// Delay before retrying a page that returned 429
    pub fn backoff_delay(&self, retry_budget: u32) -> Duration {
        scaled(self.backoff_base_ms, retry_budget)
    }
}

impl Default for PacingPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_THROTTLE_BASE_MS, DEFAULT_BACKOFF_BASE_MS)
    }
}

fn scaled(base_ms: u64, retry_budget: u32) -> Duration {
    let factor = u64::from(retry_budget).saturating_pow(2);
    Duration::from_millis(factor.saturating_mul(base_ms))
}
