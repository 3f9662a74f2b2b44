//! Scripted surface implementations for tests.
//!
//! [`FakeConfigurator`] models a virtualized two-level option UI (group
//! list, value list per group) with row-based scrolling, transient
//! handles, and failure injection. [`FakeViewer`] produces deterministic
//! noise frames with togglable blank/small/failing behavior.
//! [`CollectingDelivery`] records delivered files.

// ============================================================================
// Imports
// ============================================================================

use std::ops::Range;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::error::{Error, Result};
use crate::label::normalize_label;

use super::{
    AutomationSurface, BackgroundSpec, Capability, ControlHandle, FileDelivery, RawFrame,
    ScrollRegion, ScrollState, ViewerSurface,
};

// ============================================================================
// Fake Configurator
// ============================================================================

/// One option group in the fake UI.
#[derive(Debug, Clone)]
pub(crate) struct FakeGroup {
    pub name: String,
    pub declared_count: u32,
    pub current_value: String,
    pub values: Vec<String>,
}

impl FakeGroup {
    pub fn new(name: &str, values: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            declared_count: values.len() as u32,
            current_value: values.first().map_or_else(String::new, |v| (*v).to_string()),
            values: values.iter().map(|v| (*v).to_string()).collect(),
        }
    }

    /// Overrides the advertised option count (to model stale UIs).
    pub fn with_declared_count(mut self, count: u32) -> Self {
        self.declared_count = count;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum View {
    Groups,
    Values(usize),
}

#[derive(Debug)]
struct FakeUiState {
    view: View,
    group_scroll: f64,
    value_scroll: f64,
    generation: u64,
}

/// Scripted [`AutomationSurface`] over an in-memory option tree.
///
/// Rows are `row_height` pixels tall inside a `viewport` pixel window;
/// only intersecting rows are rendered, like the real virtualized list.
/// Handles go stale (token mismatch) on every scroll or view change.
pub(crate) struct FakeConfigurator {
    groups: Mutex<Vec<FakeGroup>>,
    ui: Mutex<FakeUiState>,
    applied: Mutex<Vec<(String, String)>>,
    failing_clicks: Mutex<FxHashMap<String, u32>>,
    address: String,
    product: Option<String>,
    row_height: f64,
    viewport: f64,
}

impl FakeConfigurator {
    pub fn new(groups: Vec<FakeGroup>) -> Self {
        Self {
            groups: Mutex::new(groups),
            ui: Mutex::new(FakeUiState {
                view: View::Groups,
                group_scroll: 0.0,
                value_scroll: 0.0,
                generation: 0,
            }),
            applied: Mutex::new(Vec::new()),
            failing_clicks: Mutex::new(FxHashMap::default()),
            address: "https://shop.example/product/chair?id=42#viewer".to_string(),
            product: Some("Fauteuil Grand Repos".to_string()),
            row_height: 40.0,
            viewport: 200.0,
        }
    }

    pub fn with_product(mut self, product: Option<&str>) -> Self {
        self.product = product.map(str::to_string);
        self
    }

    pub fn with_address(mut self, address: &str) -> Self {
        self.address = address.to_string();
        self
    }

    /// Makes the next `times` clicks on `value_label` fail.
    pub fn fail_clicks_on(&self, value_label: &str, times: u32) {
        self.failing_clicks
            .lock()
            .insert(normalize_label(value_label), times);
    }

    /// Log of `(group, value)` selections in click order.
    pub fn applied_log(&self) -> Vec<(String, String)> {
        self.applied.lock().clone()
    }

    pub fn clear_applied_log(&self) {
        self.applied.lock().clear();
    }

    fn summary_row(group: &FakeGroup) -> String {
        let noun = if group.declared_count == 1 {
            "option"
        } else {
            "options"
        };
        format!(
            "{}\n{} {}\n{}",
            group.name, group.declared_count, noun, group.current_value
        )
    }

    fn rows(&self, view: View) -> Vec<String> {
        let groups = self.groups.lock();
        match view {
            View::Groups => groups.iter().map(Self::summary_row).collect(),
            View::Values(gi) => {
                let group = &groups[gi];
                let mut rows = vec!["Retour".to_string(), "Filtre".to_string()];
                rows.extend(group.values.iter().cloned());
                rows.push("Ajouter au panier".to_string());
                rows
            }
        }
    }

    fn visible_range(&self, rows: usize, offset: f64) -> Range<usize> {
        let first = (offset / self.row_height).floor() as usize;
        let last = ((offset + self.viewport) / self.row_height).ceil() as usize;
        first.min(rows)..last.min(rows)
    }

    fn current_offset(&self, view: View, ui: &FakeUiState) -> f64 {
        match view {
            View::Groups => ui.group_scroll,
            View::Values(_) => ui.value_scroll,
        }
    }

    fn region_matches_view(region: ScrollRegion, view: View) -> bool {
        matches!(
            (region, view),
            (ScrollRegion::GroupList, View::Groups) | (ScrollRegion::ValueList, View::Values(_))
        )
    }
}

#[async_trait]
impl AutomationSurface for FakeConfigurator {
    async fn visible_controls(&self) -> Result<Vec<ControlHandle>> {
        let ui = self.ui.lock();
        let rows = self.rows(ui.view);
        let offset = self.current_offset(ui.view, &ui);
        let range = self.visible_range(rows.len(), offset);

        Ok(rows[range]
            .iter()
            .map(|label| ControlHandle::new(label.clone(), ui.generation))
            .collect())
    }

    async fn click(&self, control: &ControlHandle) -> Result<()> {
        let mut ui = self.ui.lock();
        if control.token != ui.generation {
            return Err(Error::surface("stale control handle"));
        }

        let rows = self.rows(ui.view);
        let offset = self.current_offset(ui.view, &ui);
        let range = self.visible_range(rows.len(), offset);
        let target = control.normalized_label();
        let row_index = rows[range.clone()]
            .iter()
            .position(|row| normalize_label(row) == target)
            .map(|i| range.start + i)
            .ok_or_else(|| Error::surface(format!("control not rendered: {}", control.label)))?;

        match ui.view {
            View::Groups => {
                let group_index = row_index;
                ui.view = View::Values(group_index);
                ui.value_scroll = 0.0;
                ui.generation += 1;
                Ok(())
            }
            View::Values(gi) => {
                let label = rows[row_index].clone();
                let key = normalize_label(&label);
                if key == "retour" {
                    ui.view = View::Groups;
                    ui.generation += 1;
                    return Ok(());
                }

                let mut failing = self.failing_clicks.lock();
                if let Some(remaining) = failing.get_mut(&key)
                    && *remaining > 0
                {
                    *remaining -= 1;
                    return Err(Error::surface(format!("click rejected: {label}")));
                }
                drop(failing);

                let mut groups = self.groups.lock();
                if groups[gi].values.iter().any(|v| normalize_label(v) == key) {
                    groups[gi].current_value = label.clone();
                    self.applied.lock().push((groups[gi].name.clone(), label));
                    ui.generation += 1;
                }
                Ok(())
            }
        }
    }

    async fn is_visible(&self, control: &ControlHandle) -> Result<bool> {
        let ui = self.ui.lock();
        if control.token != ui.generation {
            return Ok(false);
        }

        let rows = self.rows(ui.view);
        let offset = self.current_offset(ui.view, &ui);
        let range = self.visible_range(rows.len(), offset);
        let target = control.normalized_label();
        Ok(rows[range].iter().any(|row| normalize_label(row) == target))
    }

    async fn scroll_state(&self, region: ScrollRegion) -> Result<Option<ScrollState>> {
        let ui = self.ui.lock();
        if !Self::region_matches_view(region, ui.view) {
            return Ok(None);
        }

        let rows = self.rows(ui.view).len() as f64;
        let max_offset = (rows * self.row_height - self.viewport).max(0.0);
        Ok(Some(ScrollState {
            offset: self.current_offset(ui.view, &ui),
            max_offset,
            viewport: self.viewport,
        }))
    }

    async fn scroll_to(&self, region: ScrollRegion, offset: f64) -> Result<()> {
        let mut ui = self.ui.lock();
        if !Self::region_matches_view(region, ui.view) {
            return Err(Error::surface(format!("{region} not present")));
        }

        let rows = self.rows(ui.view).len() as f64;
        let max_offset = (rows * self.row_height - self.viewport).max(0.0);
        let clamped = offset.clamp(0.0, max_offset);
        match ui.view {
            View::Groups => ui.group_scroll = clamped,
            View::Values(_) => ui.value_scroll = clamped,
        }
        ui.generation += 1;
        Ok(())
    }

    async fn page_address(&self) -> Result<String> {
        Ok(self.address.clone())
    }

    async fn product_title(&self) -> Result<Option<String>> {
        Ok(self.product.clone())
    }
}

// ============================================================================
// Fake Viewer
// ============================================================================

/// Scripted [`ViewerSurface`] producing deterministic noise frames.
///
/// Noise frames survive the blank heuristic and encode to PNGs large
/// enough to pass plausibility checks, while blank frames are uniform
/// gray.
pub(crate) struct FakeViewer {
    native_size: (u32, u32),
    support_background: bool,
    support_boost: bool,
    boosted: Mutex<Option<(u32, u32)>>,
    background: Mutex<Option<BackgroundSpec>>,
    all_blank: AtomicBool,
    boosted_blank: AtomicBool,
    failing_grabs: AtomicU32,
    small_grabs: AtomicU32,
    pub grab_count: AtomicU32,
    pub enter_count: AtomicU32,
    pub exit_count: AtomicU32,
}

impl FakeViewer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            native_size: (width, height),
            support_background: true,
            support_boost: true,
            boosted: Mutex::new(None),
            background: Mutex::new(None),
            all_blank: AtomicBool::new(false),
            boosted_blank: AtomicBool::new(false),
            failing_grabs: AtomicU32::new(0),
            small_grabs: AtomicU32::new(0),
            grab_count: AtomicU32::new(0),
            enter_count: AtomicU32::new(0),
            exit_count: AtomicU32::new(0),
        }
    }

    pub fn without_boost(mut self) -> Self {
        self.support_boost = false;
        self
    }

    pub fn without_background(mut self) -> Self {
        self.support_background = false;
        self
    }

    /// All subsequent frames are uniform gray.
    pub fn set_all_blank(&self, blank: bool) {
        self.all_blank.store(blank, Ordering::SeqCst);
    }

    /// Frames grabbed while boosted are uniform gray; normal frames stay
    /// fine.
    pub fn set_boosted_blank(&self, blank: bool) {
        self.boosted_blank.store(blank, Ordering::SeqCst);
    }

    /// The next `n` grabs fail outright.
    pub fn fail_next_grabs(&self, n: u32) {
        self.failing_grabs.store(n, Ordering::SeqCst);
    }

    /// The next `n` grabs return a 100x100 frame (still warming up).
    pub fn small_next_grabs(&self, n: u32) {
        self.small_grabs.store(n, Ordering::SeqCst);
    }

    pub fn background(&self) -> Option<BackgroundSpec> {
        *self.background.lock()
    }

    fn noise_frame(width: u32, height: u32, blank: bool) -> RawFrame {
        let mut pixels = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            for x in 0..width {
                if blank {
                    pixels.extend_from_slice(&[128, 128, 128, 255]);
                } else {
                    let mut h = x.wrapping_mul(31).wrapping_add(y.wrapping_mul(97));
                    h ^= h >> 7;
                    h = h.wrapping_mul(0x9E37_79B9);
                    pixels.extend_from_slice(&[
                        (h & 0xFF) as u8,
                        ((h >> 8) & 0xFF) as u8,
                        ((h >> 16) & 0xFF) as u8,
                        255,
                    ]);
                }
            }
        }
        RawFrame::new(width, height, pixels)
    }
}

/// Decrements `counter` if positive; `true` when a charge was consumed.
fn take_one(counter: &AtomicU32) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

#[async_trait]
impl ViewerSurface for FakeViewer {
    async fn set_background(&self, background: BackgroundSpec) -> Capability {
        if !self.support_background {
            return Capability::Unsupported;
        }
        *self.background.lock() = Some(background);
        Capability::Supported
    }

    async fn enter_boosted_presentation(&self, aspect: f64) -> Capability {
        self.enter_count.fetch_add(1, Ordering::SeqCst);
        if !self.support_boost {
            return Capability::Unsupported;
        }
        let width = 400u32;
        let height = (f64::from(width) / aspect).round() as u32;
        *self.boosted.lock() = Some((width, height));
        Capability::Supported
    }

    async fn exit_boosted_presentation(&self) -> Capability {
        self.exit_count.fetch_add(1, Ordering::SeqCst);
        *self.boosted.lock() = None;
        Capability::Supported
    }

    async fn grab_frame(&self) -> Result<RawFrame> {
        self.grab_count.fetch_add(1, Ordering::SeqCst);

        if take_one(&self.failing_grabs) {
            return Err(Error::capture("viewer readback refused"));
        }
        if take_one(&self.small_grabs) {
            return Ok(Self::noise_frame(100, 100, false));
        }

        let boosted = *self.boosted.lock();
        let (width, height) = boosted.unwrap_or(self.native_size);
        let blank = self.all_blank.load(Ordering::SeqCst)
            || (boosted.is_some() && self.boosted_blank.load(Ordering::SeqCst));
        Ok(Self::noise_frame(width, height, blank))
    }
}

// ============================================================================
// Collecting Delivery
// ============================================================================

/// [`FileDelivery`] that records `(filename, byte length)` pairs.
#[derive(Default)]
pub(crate) struct CollectingDelivery {
    delivered: Mutex<Vec<(String, usize)>>,
    failing: AtomicU32,
}

impl CollectingDelivery {
    pub fn new() -> Self {
        Self::default()
    }

    /// The next `n` deliveries fail.
    pub fn fail_next(&self, n: u32) {
        self.failing.store(n, Ordering::SeqCst);
    }

    pub fn delivered(&self) -> Vec<(String, usize)> {
        self.delivered.lock().clone()
    }

    pub fn filenames(&self) -> Vec<String> {
        self.delivered.lock().iter().map(|(name, _)| name.clone()).collect()
    }
}

#[async_trait]
impl FileDelivery for CollectingDelivery {
    async fn deliver(&self, bytes: &[u8], filename: &str) -> Result<()> {
        if take_one(&self.failing) {
            return Err(Error::store("delivery refused"));
        }
        self.delivered
            .lock()
            .push((filename.to_string(), bytes.len()));
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn three_groups() -> Vec<FakeGroup> {
        vec![
            FakeGroup::new("Couleur", &["Rouge", "Bleu", "Vert"]),
            FakeGroup::new("Taille", &["Petit", "Grand"]),
            FakeGroup::new("Piètement", &["Chromé", "Noir"]),
        ]
    }

    #[tokio::test]
    async fn test_fake_lists_only_visible_rows() {
        let fake = FakeConfigurator::new(
            (0..12)
                .map(|i| FakeGroup::new(&format!("Groupe {i}"), &["A", "B"]))
                .collect(),
        );

        // 12 rows * 40px in a 200px viewport: five fully visible rows.
        let controls = fake.visible_controls().await.unwrap();
        assert_eq!(controls.len(), 5);

        fake.scroll_to(ScrollRegion::GroupList, 280.0).await.unwrap();
        let controls = fake.visible_controls().await.unwrap();
        assert!(controls.iter().any(|c| c.label.contains("Groupe 11")));
    }

    #[tokio::test]
    async fn test_fake_click_opens_group_and_back_returns() {
        let fake = FakeConfigurator::new(three_groups());

        let controls = fake.visible_controls().await.unwrap();
        fake.click(&controls[0]).await.unwrap();

        let rows = fake.visible_controls().await.unwrap();
        assert!(rows.iter().any(|c| normalize_label(&c.label) == "retour"));
        assert!(rows.iter().any(|c| c.label == "Rouge"));

        let back = rows
            .iter()
            .find(|c| normalize_label(&c.label) == "retour")
            .unwrap();
        fake.click(back).await.unwrap();

        let rows = fake.visible_controls().await.unwrap();
        assert!(rows[0].label.starts_with("Couleur"));
    }

    #[tokio::test]
    async fn test_fake_stale_handle_rejected() {
        let fake = FakeConfigurator::new(three_groups());

        let controls = fake.visible_controls().await.unwrap();
        fake.scroll_to(ScrollRegion::GroupList, 0.0).await.unwrap();

        let err = fake.click(&controls[0]).await.unwrap_err();
        assert!(err.to_string().contains("stale"));
        assert!(!fake.is_visible(&controls[0]).await.unwrap());
    }

    #[tokio::test]
    async fn test_fake_value_click_records_selection() {
        let fake = FakeConfigurator::new(three_groups());

        let controls = fake.visible_controls().await.unwrap();
        fake.click(&controls[0]).await.unwrap();

        let rows = fake.visible_controls().await.unwrap();
        let bleu = rows.iter().find(|c| c.label == "Bleu").unwrap();
        fake.click(bleu).await.unwrap();

        assert_eq!(
            fake.applied_log(),
            vec![("Couleur".to_string(), "Bleu".to_string())]
        );
    }

    #[tokio::test]
    async fn test_fake_viewer_blank_toggle() {
        let viewer = FakeViewer::new(640, 480);

        let frame = viewer.grab_frame().await.unwrap();
        assert!(frame.is_well_formed());
        assert_eq!((frame.width, frame.height), (640, 480));

        viewer.set_all_blank(true);
        let blank = viewer.grab_frame().await.unwrap();
        assert!(blank.pixels.chunks(4).all(|px| px == [128, 128, 128, 255]));
    }

    #[tokio::test]
    async fn test_fake_viewer_boost_changes_size() {
        let viewer = FakeViewer::new(640, 480);

        assert!(viewer.enter_boosted_presentation(4.0 / 3.0).await.engaged());
        let frame = viewer.grab_frame().await.unwrap();
        assert_eq!((frame.width, frame.height), (400, 300));

        viewer.exit_boosted_presentation().await;
        let frame = viewer.grab_frame().await.unwrap();
        assert_eq!((frame.width, frame.height), (640, 480));
    }

    #[tokio::test]
    async fn test_collecting_delivery_failure_injection() {
        let delivery = CollectingDelivery::new();
        delivery.fail_next(1);

        assert!(delivery.deliver(b"x", "a.png").await.is_err());
        delivery.deliver(b"xy", "b.png").await.unwrap();
        assert_eq!(delivery.delivered(), vec![("b.png".to_string(), 2)]);
    }
}
