//! Automation surface: the port to the configurator page.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use async_trait::async_trait;

use crate::error::Result;
use crate::label::normalize_label;

// ============================================================================
// Constants
// ============================================================================

/// Scroll containers round subpixel offsets; treat anything within this
/// distance of the maximum as fully scrolled.
const SCROLL_SATURATION_EPSILON: f64 = 2.0;

// ============================================================================
// Control Handle
// ============================================================================

/// A transient handle to a rendered control.
///
/// Virtualized lists recycle their rows, so a handle is only valid until
/// the next scroll or view change. Identity across snapshots is the
/// normalized label, never the handle itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlHandle {
    /// Raw label text as rendered.
    pub label: String,
    /// Opaque host token; stale after the next DOM change.
    pub token: u64,
}

impl ControlHandle {
    /// Creates a handle from a raw label and a host token.
    #[must_use]
    pub fn new(label: impl Into<String>, token: u64) -> Self {
        Self {
            label: label.into(),
            token,
        }
    }

    /// Canonical match key for this control's label.
    #[must_use]
    pub fn normalized_label(&self) -> String {
        normalize_label(&self.label)
    }
}

// ============================================================================
// Scroll Types
// ============================================================================

/// Which scrollable list a scroll operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScrollRegion {
    /// The list of option group summaries.
    GroupList,
    /// The list of values inside an opened group.
    ValueList,
}

impl fmt::Display for ScrollRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GroupList => write!(f, "group list"),
            Self::ValueList => write!(f, "value list"),
        }
    }
}

/// Scroll position of a virtualized list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollState {
    /// Current scroll offset in pixels.
    pub offset: f64,
    /// Maximum reachable offset.
    pub max_offset: f64,
    /// Visible extent of the container.
    pub viewport: f64,
}

impl ScrollState {
    /// Returns `true` when the list is scrolled to (or within epsilon of)
    /// its end.
    #[must_use]
    pub fn is_saturated(&self) -> bool {
        self.offset >= self.max_offset - SCROLL_SATURATION_EPSILON
    }

    /// Returns `true` when the list has anywhere to scroll at all.
    #[must_use]
    pub fn is_scrollable(&self) -> bool {
        self.max_offset > SCROLL_SATURATION_EPSILON
    }
}

// ============================================================================
// Automation Surface
// ============================================================================

/// Port to the configurator page.
///
/// Implementations wrap whatever drives the real UI. All methods take
/// `&self`; implementations handle their own interior mutability.
#[async_trait]
pub trait AutomationSurface: Send + Sync {
    /// Snapshot of currently rendered interactive controls.
    ///
    /// Virtualized lists only materialize visible rows; enumeration
    /// combines this with scrolling.
    async fn visible_controls(&self) -> Result<Vec<ControlHandle>>;

    /// Activates a control.
    ///
    /// # Errors
    ///
    /// Fails when the handle's token is stale or the click does not
    /// land.
    async fn click(&self, control: &ControlHandle) -> Result<()>;

    /// Cheap liveness probe for a handle.
    async fn is_visible(&self, control: &ControlHandle) -> Result<bool>;

    /// Scroll position of a region, or `None` when the region is not
    /// present in the current view.
    async fn scroll_state(&self, region: ScrollRegion) -> Result<Option<ScrollState>>;

    /// Scrolls a region to an absolute offset.
    async fn scroll_to(&self, region: ScrollRegion, offset: f64) -> Result<()>;

    /// Current page URL, fragment included.
    async fn page_address(&self) -> Result<String>;

    /// Best-effort product name for filenames and snapshots.
    async fn product_title(&self) -> Result<Option<String>>;
}

// ============================================================================
// Tests
// ============================================================================
