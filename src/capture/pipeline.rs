//! Capture orchestration over a viewer surface.
//!
//! # Flow
//!
//! 1. Probe the background override (best effort).
//! 2. With boost enabled and supported: wait for the render to
//!    stabilize, grab, and retry once in-boost when the result looks
//!    blank or implausibly small.
//! 3. Leave boosted presentation even when the grab failed.
//! 4. Fall back to a plain grab when boosted output stays suspicious.
//!
//! The batch loop owns cross-capture retries; this module only retries
//! within a single boosted session.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use tracing::{debug, warn};

use crate::engine::EngineOptions;
use crate::error::{Error, Result};
use crate::surface::{BackgroundSpec, Capability, ViewerSurface};
use crate::wait::poll_until;

use super::frame::{is_likely_blank, process_frame};

// ============================================================================
// Constants
// ============================================================================

/// Encoded images below this many bytes are treated as failed captures.
const MIN_PLAUSIBLE_PNG_BYTES: usize = 8000;

/// The render is considered stable once frames reach this edge length.
const MIN_STABLE_EDGE: u32 = 200;

// ============================================================================
// Captured Image
// ============================================================================

/// A finished, delivery-ready PNG.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedImage {
    /// Encoded PNG bytes.
    pub bytes: Vec<u8>,
    /// Final image width in pixels.
    pub width: u32,
    /// Final image height in pixels.
    pub height: u32,
}

// ============================================================================
// Capture Pipeline
// ============================================================================

/// Turns viewer frames into delivery-ready PNGs.
pub struct CapturePipeline {
    viewer: Arc<dyn ViewerSurface>,
    options: Arc<EngineOptions>,
}

impl CapturePipeline {
    /// Creates a pipeline over a viewer.
    #[must_use]
    pub fn new(viewer: Arc<dyn ViewerSurface>, options: Arc<EngineOptions>) -> Self {
        Self { viewer, options }
    }

    /// Captures one image at the given target size.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Capture`] when every grab produced a blank or
    /// implausibly small result, or the underlying surface error when a
    /// grab itself failed.
    pub async fn capture(&self, width: u32, height: u32) -> Result<CapturedImage> {
        if self.options.neutral_background {
            match self.viewer.set_background(BackgroundSpec::Neutral).await {
                Capability::Supported => debug!("Background override engaged"),
                Capability::Unsupported => debug!("Background override unsupported"),
                Capability::Failed(reason) => {
                    warn!(reason = %reason, "Background override failed, continuing");
                }
            }
        }

        if self.options.boost {
            let aspect = f64::from(width) / f64::from(height.max(1));
            match self.viewer.enter_boosted_presentation(aspect).await {
                Capability::Supported => return self.capture_boosted(width, height).await,
                Capability::Unsupported => {
                    debug!("Boosted presentation unsupported, capturing plain");
                }
                Capability::Failed(reason) => {
                    warn!(reason = %reason, "Boosted presentation failed, capturing plain");
                }
            }
        }

        self.grab_processed(width, height).await
    }

    /// Boosted capture with in-boost retry and plain fallback.
    async fn capture_boosted(&self, width: u32, height: u32) -> Result<CapturedImage> {
        let boosted = self.boosted_attempts(width, height).await;

        if let Capability::Failed(reason) = self.viewer.exit_boosted_presentation().await {
            warn!(reason = %reason, "Failed to leave boosted presentation");
        }

        match boosted {
            Ok(image) => Ok(image),
            Err(err) => {
                warn!(error = %err, "Boosted capture failed, falling back to plain grab");
                match self.grab_processed(width, height).await {
                    Ok(image) => Ok(image),
                    Err(Error::Capture { .. }) => {
                        Err(Error::capture("persistently blank viewer output"))
                    }
                    Err(err) => Err(err),
                }
            }
        }
    }

    async fn boosted_attempts(&self, width: u32, height: u32) -> Result<CapturedImage> {
        self.wait_for_stable_render().await;

        match self.grab_processed(width, height).await {
            Ok(image) => Ok(image),
            Err(first) => {
                debug!(error = %first, "Boosted grab suspicious, retrying in boost");
                tokio::time::sleep(self.options.boost_retry_delay).await;
                self.grab_processed(width, height).await
            }
        }
    }

    /// One grab, analyzed and encoded.
    async fn grab_processed(&self, width: u32, height: u32) -> Result<CapturedImage> {
        let frame = self.viewer.grab_frame().await?;
        if is_likely_blank(&frame) {
            return Err(Error::capture(format!(
                "frame looks blank ({}x{})",
                frame.width, frame.height
            )));
        }

        let background = self
            .options
            .neutral_background
            .then_some(BackgroundSpec::Neutral);
        let (bytes, out_width, out_height) = process_frame(frame, width, height, background)?;
        if bytes.len() < MIN_PLAUSIBLE_PNG_BYTES {
            return Err(Error::capture(format!(
                "implausibly small image ({} bytes)",
                bytes.len()
            )));
        }

        debug!(
            width = out_width,
            height = out_height,
            bytes = bytes.len(),
            "Captured frame"
        );
        Ok(CapturedImage {
            bytes,
            width: out_width,
            height: out_height,
        })
    }

    /// Polls until frames look rendered; proceeds anyway on timeout.
    async fn wait_for_stable_render(&self) {
        let viewer = &self.viewer;
        let ready = poll_until(
            self.options.stabilization_timeout,
            self.options.stabilization_interval,
            || async {
                match viewer.grab_frame().await {
                    Ok(frame)
                        if frame.width >= MIN_STABLE_EDGE
                            && frame.height >= MIN_STABLE_EDGE
                            && !is_likely_blank(&frame) =>
                    {
                        Some(())
                    }
                    _ => None,
                }
            },
        )
        .await;

        if ready.is_none() {
            warn!(
                timeout_ms = self.options.stabilization_timeout.as_millis() as u64,
                "Viewer did not stabilize in time, capturing anyway"
            );
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
