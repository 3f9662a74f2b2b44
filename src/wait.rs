//! Async polling helpers.
//!
//! Configurator UIs settle asynchronously after scrolls, clicks, and
//! presentation-mode switches. The helpers here poll a probe closure at a
//! fixed interval until it produces a value or a deadline passes.

// ============================================================================
// Imports
// ============================================================================

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use crate::error::{Error, Result};

// ============================================================================
// Polling
// ============================================================================

/// Polls `probe` until it yields a value or `timeout` elapses.
///
/// Returns `None` on timeout. Use this for best-effort waits where the
/// caller proceeds anyway after the deadline.
pub async fn poll_until<T, F, Fut>(timeout: Duration, interval: Duration, mut probe: F) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    let deadline = Instant::now() + timeout;

    loop {
        if let Some(value) = probe().await {
            return Some(value);
        }
        if Instant::now() >= deadline {
            return None;
        }
        tokio::time::sleep(interval).await;
    }
}

/// Polls `probe` until it yields a value, failing with [`Error::Timeout`]
/// when `timeout` elapses first.
///
/// Probe errors abort the wait immediately.
pub async fn wait_for<T, F, Fut>(
    operation: &str,
    timeout: Duration,
    interval: Duration,
    mut probe: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
{
    let deadline = Instant::now() + timeout;

    loop {
        if let Some(value) = probe().await? {
            return Ok(value);
        }
        if Instant::now() >= deadline {
            return Err(Error::timeout(operation, timeout.as_millis() as u64));
        }
        tokio::time::sleep(interval).await;
    }
}

// ============================================================================
// Tests
// ============================================================================
