//! Engine tuning knobs.
//!
//! Collects capture geometry, retry policy, and every pacing delay in
//! one place so batch runs stay deterministic and tests can crank the
//! waits down.
//!
//! # Example
//!
//! ```
//! use configurator_capture::EngineOptions;
//!
//! let options = EngineOptions::new()
//!     .with_capture_size(1024, 768)
//!     .with_boost(false)
//!     .with_retry_attempts(5);
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use crate::error::{Error, Result};

// ============================================================================
// EngineOptions
// ============================================================================

/// Batch engine configuration.
///
/// Defaults mirror what works against a real product configurator:
/// generous settle times, three capture attempts per image, and a
/// boosted 2048x1536 output.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineOptions {
    /// Target image width in pixels.
    pub capture_width: u32,

    /// Target image height in pixels.
    pub capture_height: u32,

    /// Flatten transparency onto a neutral background.
    pub neutral_background: bool,

    /// Use boosted presentation for higher-fidelity frames.
    pub boost: bool,

    /// Re-apply every selection per item instead of diffing against the
    /// previous combination.
    pub full_reapply: bool,

    /// Capture attempts per item before it is recorded as failed.
    pub retry_attempts: u32,

    /// Delay between capture attempts on the same item.
    pub retry_delay: Duration,

    /// Render settle time after applying selections.
    pub settle_after_apply: Duration,

    /// Delay between consecutive batch items.
    pub iteration_delay: Duration,

    /// Poll interval while paused.
    pub pause_poll: Duration,

    /// Settle time after clicking a control.
    pub click_settle: Duration,

    /// Settle time after a scroll step.
    pub scroll_settle: Duration,

    /// Smallest scroll step in pixels; larger viewports scroll by 75%
    /// of their height.
    pub min_scroll_step: f64,

    /// Scroll pass cap while enumerating the group list.
    pub group_scan_passes: u32,

    /// Scroll pass cap while enumerating one group's values.
    pub value_scan_passes: u32,

    /// Scroll pass cap while locating a control to click.
    pub locate_passes: u32,

    /// How long to wait for a view transition while applying.
    pub view_wait_timeout: Duration,

    /// How long to wait for a view transition while scanning.
    pub scan_view_timeout: Duration,

    /// Poll interval for view transition waits.
    pub view_poll_interval: Duration,

    /// How long to wait for the viewer to produce stable frames.
    pub stabilization_timeout: Duration,

    /// Poll interval for the stabilization wait.
    pub stabilization_interval: Duration,

    /// Delay before the in-boost retry grab.
    pub boost_retry_delay: Duration,
}

// ============================================================================
// Constructors
// ============================================================================

impl EngineOptions {
    /// Creates options with production defaults.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            capture_width: 2048,
            capture_height: 1536,
            neutral_background: true,
            boost: true,
            full_reapply: false,
            retry_attempts: 3,
            retry_delay: Duration::from_millis(600),
            settle_after_apply: Duration::from_millis(1500),
            iteration_delay: Duration::from_millis(500),
            pause_poll: Duration::from_millis(100),
            click_settle: Duration::from_millis(400),
            scroll_settle: Duration::from_millis(160),
            min_scroll_step: 160.0,
            group_scan_passes: 40,
            value_scan_passes: 50,
            locate_passes: 60,
            view_wait_timeout: Duration::from_millis(2500),
            scan_view_timeout: Duration::from_millis(2000),
            view_poll_interval: Duration::from_millis(80),
            stabilization_timeout: Duration::from_millis(2500),
            stabilization_interval: Duration::from_millis(60),
            boost_retry_delay: Duration::from_millis(250),
        }
    }
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl EngineOptions {
    /// Sets the target image size in pixels.
    #[inline]
    #[must_use]
    pub fn with_capture_size(mut self, width: u32, height: u32) -> Self {
        self.capture_width = width;
        self.capture_height = height;
        self
    }

    /// Enables or disables the neutral background override.
    #[inline]
    #[must_use]
    pub fn with_neutral_background(mut self, enabled: bool) -> Self {
        self.neutral_background = enabled;
        self
    }

    /// Enables or disables boosted presentation during capture.
    #[inline]
    #[must_use]
    pub fn with_boost(mut self, enabled: bool) -> Self {
        self.boost = enabled;
        self
    }

    /// Re-applies every selection per item instead of diffing.
    #[inline]
    #[must_use]
    pub fn with_full_reapply(mut self, enabled: bool) -> Self {
        self.full_reapply = enabled;
        self
    }

    /// Sets capture attempts per item.
    #[inline]
    #[must_use]
    pub fn with_retry_attempts(mut self, attempts: u32) -> Self {
        self.retry_attempts = attempts;
        self
    }

    /// Sets the delay between capture attempts.
    #[inline]
    #[must_use]
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Sets the render settle time after applying selections.
    #[inline]
    #[must_use]
    pub fn with_settle_after_apply(mut self, delay: Duration) -> Self {
        self.settle_after_apply = delay;
        self
    }

    /// Sets the delay between consecutive batch items.
    #[inline]
    #[must_use]
    pub fn with_iteration_delay(mut self, delay: Duration) -> Self {
        self.iteration_delay = delay;
        self
    }

    /// Sets the settle time after clicking a control.
    #[inline]
    #[must_use]
    pub fn with_click_settle(mut self, delay: Duration) -> Self {
        self.click_settle = delay;
        self
    }
}

// ============================================================================
// Validation
// ============================================================================

impl EngineOptions {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when a zero or degenerate value would
    /// make a batch run impossible.
    pub fn validate(&self) -> Result<()> {
        if self.capture_width == 0 || self.capture_height == 0 {
            return Err(Error::config("capture dimensions must be nonzero"));
        }
        if self.retry_attempts == 0 {
            return Err(Error::config("retry attempts must be at least 1"));
        }
        if self.min_scroll_step <= 0.0 {
            return Err(Error::config("scroll step must be positive"));
        }
        if self.group_scan_passes == 0 || self.value_scan_passes == 0 || self.locate_passes == 0 {
            return Err(Error::config("scan pass caps must be at least 1"));
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
