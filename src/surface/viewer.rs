//! Viewer surface: the port to the rendered 3D scene.

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;

use crate::error::Result;

// ============================================================================
// Capability
// ============================================================================

/// Outcome of a best-effort viewer hook.
///
/// Background overrides and boosted presentation are conveniences the
/// host may not implement. Probing returns one of three states so the
/// pipeline can degrade without guessing from errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Capability {
    /// The hook took effect.
    Supported,
    /// The host does not implement the hook; silently degraded.
    Unsupported,
    /// The host implements the hook but it failed; degraded with a log.
    Failed(String),
}

impl Capability {
    /// Returns `true` only when the hook actually took effect.
    #[inline]
    #[must_use]
    pub fn engaged(&self) -> bool {
        matches!(self, Self::Supported)
    }
}

// ============================================================================
// Background
// ============================================================================

/// Requested viewer background for catalog-style shots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackgroundSpec {
    /// Neutral studio white.
    Neutral,
    /// A specific solid color.
    Solid { r: u8, g: u8, b: u8 },
}

// ============================================================================
// Raw Frame
// ============================================================================

/// A native-resolution frame from the viewer, tightly packed RGBA8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// `width * height * 4` bytes, row-major RGBA.
    pub pixels: Vec<u8>,
}

impl RawFrame {
    /// Creates a frame from raw parts.
    #[must_use]
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Returns `true` when the pixel buffer length matches the declared
    /// dimensions.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        (self.width as usize)
            .checked_mul(self.height as usize)
            .and_then(|n| n.checked_mul(4))
            .is_some_and(|expected| expected == self.pixels.len())
    }
}

// ============================================================================
// Viewer Surface
// ============================================================================

/// Port to the 3D viewer.
#[async_trait]
pub trait ViewerSurface: Send + Sync {
    /// Best-effort background override.
    async fn set_background(&self, background: BackgroundSpec) -> Capability;

    /// Best-effort switch into a high-resolution presentation mode with
    /// the given aspect ratio (width / height).
    async fn enter_boosted_presentation(&self, aspect: f64) -> Capability;

    /// Leaves boosted presentation. Called even when the boosted grab
    /// failed, so implementations must tolerate redundant exits.
    async fn exit_boosted_presentation(&self) -> Capability;

    /// Grabs a native-resolution frame.
    ///
    /// # Errors
    ///
    /// Fails when the viewer has no drawable surface or refuses
    /// readback.
    async fn grab_frame(&self) -> Result<RawFrame>;
}

// ============================================================================
// Tests
// ============================================================================
