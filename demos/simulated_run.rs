//! Full capture workflow against a simulated configurator.
//!
//! Demonstrates:
//! - Implementing [`AutomationSurface`] and [`ViewerSurface`] for a host app
//! - Scanning option groups and building a plan over all of them
//! - Subscribing to batch events
//! - Pausing and resuming a run in flight
//! - Resume snapshot lifecycle (present while interrupted, cleared on completion)
//! - Delivering finished PNGs into a directory
//!
//! The simulated showroom is a two-level panel (group list, value list per
//! group) over a sofa with three option groups, and a viewer that renders a
//! noise scene tinted by the current selection. No browser is involved.
//!
//! Usage:
//!   cargo run --example simulated_run
//!   cargo run --example simulated_run -- --debug
//!   cargo run --example simulated_run -- --clean

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing_subscriber::EnvFilter;

use configurator_capture::label::normalize_label;
use configurator_capture::plan::combination_for_index;
use configurator_capture::{
    AutomationSurface, BackgroundSpec, BatchEvent, Capability, CaptureEngine, ControlHandle,
    DirectoryDelivery, EngineOptions, Error, MemoryStore, RawFrame, Result, ScrollRegion,
    ScrollState, SelectionSet, ViewerSurface,
};

// ============================================================================
// Constants
// ============================================================================

const OUTPUT_DIR: &str = "./demo_captures";
const PAGE_ADDRESS: &str = "https://meubles.example/canape-oslo?finish=tissu#configurateur";
const PRODUCT_NAME: &str = "Canapé Oslo";

/// Native canvas size of the simulated viewer.
const NATIVE_WIDTH: u32 = 960;
const NATIVE_HEIGHT: u32 = 720;

// ============================================================================
// Simulated Showroom - State
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PanelView {
    Groups,
    Values(usize),
}

#[derive(Debug)]
struct ShowroomGroup {
    name: &'static str,
    values: Vec<&'static str>,
    current: usize,
}

/// Shared model behind both surfaces: the panel mutates it, the viewer
/// renders it.
#[derive(Debug)]
struct ShowroomState {
    groups: Vec<ShowroomGroup>,
    view: PanelView,
    generation: u64,
}

impl ShowroomState {
    fn sofa() -> Self {
        Self {
            groups: vec![
                ShowroomGroup {
                    name: "Tissu",
                    values: vec!["Lin naturel", "Velours côtelé", "Cuir fauve"],
                    current: 0,
                },
                ShowroomGroup {
                    name: "Piètement",
                    values: vec!["Chêne clair", "Noir mat"],
                    current: 0,
                },
                ShowroomGroup {
                    name: "Accoudoirs",
                    values: vec!["Fins", "Larges"],
                    current: 0,
                },
            ],
            view: PanelView::Groups,
            generation: 0,
        }
    }

    /// FNV-1a over the selected labels; seeds the viewer's scene.
    fn scene_seed(&self) -> u32 {
        let mut h: u32 = 0x811C_9DC5;
        for group in &self.groups {
            for byte in group.values[group.current].bytes() {
                h ^= u32::from(byte);
                h = h.wrapping_mul(0x0100_0193);
            }
        }
        h
    }
}

// ============================================================================
// Simulated Showroom - Panel
// ============================================================================

/// Two-level option panel: a group list with summary rows, and one value
/// list per group behind a "Retour" control. The panel is short enough to
/// render without virtualization, so scroll queries report no scrollable
/// region.
struct ShowroomPanel {
    state: Arc<Mutex<ShowroomState>>,
}

impl ShowroomPanel {
    fn new(state: Arc<Mutex<ShowroomState>>) -> Self {
        Self { state }
    }

    fn rows(state: &ShowroomState) -> Vec<String> {
        match state.view {
            PanelView::Groups => {
                let mut rows = vec!["Configuration".to_string()];
                rows.extend(state.groups.iter().map(|group| {
                    format!(
                        "{}\n{} options\n{}",
                        group.name,
                        group.values.len(),
                        group.values[group.current]
                    )
                }));
                rows
            }
            PanelView::Values(index) => {
                let group = &state.groups[index];
                let mut rows = vec!["Retour".to_string()];
                rows.extend(group.values.iter().map(|v| (*v).to_string()));
                rows.push("Ajouter au panier".to_string());
                rows
            }
        }
    }
}

#[async_trait]
impl AutomationSurface for ShowroomPanel {
    async fn visible_controls(&self) -> Result<Vec<ControlHandle>> {
        let state = self.state.lock();
        Ok(Self::rows(&state)
            .into_iter()
            .map(|label| ControlHandle::new(label, state.generation))
            .collect())
    }

    async fn click(&self, control: &ControlHandle) -> Result<()> {
        let mut state = self.state.lock();
        if control.token != state.generation {
            return Err(Error::surface("stale control handle"));
        }

        let rows = Self::rows(&state);
        let target = control.normalized_label();
        let row_index = rows
            .iter()
            .position(|row| normalize_label(row) == target)
            .ok_or_else(|| Error::surface(format!("control not rendered: {}", control.label)))?;

        match state.view {
            PanelView::Groups => {
                // Row 0 is the inert panel header.
                if row_index > 0 {
                    state.view = PanelView::Values(row_index - 1);
                    state.generation += 1;
                }
                Ok(())
            }
            PanelView::Values(group_index) => {
                if target == "retour" {
                    state.view = PanelView::Groups;
                    state.generation += 1;
                    return Ok(());
                }
                let group = &mut state.groups[group_index];
                if let Some(value_index) = group
                    .values
                    .iter()
                    .position(|v| normalize_label(v) == target)
                {
                    group.current = value_index;
                }
                Ok(())
            }
        }
    }

    async fn is_visible(&self, control: &ControlHandle) -> Result<bool> {
        let state = self.state.lock();
        if control.token != state.generation {
            return Ok(false);
        }
        let target = control.normalized_label();
        Ok(Self::rows(&state)
            .iter()
            .any(|row| normalize_label(row) == target))
    }

    async fn scroll_state(&self, _region: ScrollRegion) -> Result<Option<ScrollState>> {
        // Every row fits the panel; enumeration takes its single-capture path.
        Ok(None)
    }

    async fn scroll_to(&self, region: ScrollRegion, _offset: f64) -> Result<()> {
        Err(Error::surface(format!("{region} is not scrollable")))
    }

    async fn page_address(&self) -> Result<String> {
        Ok(PAGE_ADDRESS.to_string())
    }

    async fn product_title(&self) -> Result<Option<String>> {
        Ok(Some(PRODUCT_NAME.to_string()))
    }
}

// ============================================================================
// Simulated Showroom - Viewer
// ============================================================================

/// Renders a noise scene whose tint follows the current selection, so every
/// combination produces a visibly different capture. Boosted presentation is
/// left unimplemented to show the plain-grab degrade path.
struct ShowroomViewer {
    state: Arc<Mutex<ShowroomState>>,
}

impl ShowroomViewer {
    fn new(state: Arc<Mutex<ShowroomState>>) -> Self {
        Self { state }
    }
}

#[async_trait]
impl ViewerSurface for ShowroomViewer {
    async fn set_background(&self, _background: BackgroundSpec) -> Capability {
        // The simulated studio is already lit neutrally.
        Capability::Supported
    }

    async fn enter_boosted_presentation(&self, _aspect: f64) -> Capability {
        Capability::Unsupported
    }

    async fn exit_boosted_presentation(&self) -> Capability {
        Capability::Unsupported
    }

    async fn grab_frame(&self) -> Result<RawFrame> {
        let seed = self.state.lock().scene_seed();
        let base = [
            96 + (seed & 0x7F) as u8,
            96 + ((seed >> 8) & 0x7F) as u8,
            96 + ((seed >> 16) & 0x7F) as u8,
        ];

        let mut pixels = Vec::with_capacity(NATIVE_WIDTH as usize * NATIVE_HEIGHT as usize * 4);
        for y in 0..NATIVE_HEIGHT {
            for x in 0..NATIVE_WIDTH {
                let mut n = x.wrapping_mul(0x9E37).wrapping_add(y.wrapping_mul(0x79B9)) ^ seed;
                n ^= n >> 5;
                n = n.wrapping_mul(0x27D4_EB2F);
                let jitter = ((n & 0x1F) as i16) - 16;
                for channel in base {
                    pixels.push((i16::from(channel) + jitter).clamp(0, 255) as u8);
                }
                pixels.push(255);
            }
        }
        Ok(RawFrame::new(NATIVE_WIDTH, NATIVE_HEIGHT, pixels))
    }
}

// ============================================================================
// Arguments and Logging
// ============================================================================

#[derive(Debug, Clone)]
struct Args {
    debug: bool,
    clean: bool,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = std::env::args().collect();
        Self {
            debug: args.iter().any(|a| a == "--debug"),
            clean: args.iter().any(|a| a == "--clean"),
        }
    }
}

fn init_logging(debug: bool) {
    let filter = if debug {
        "configurator_capture=debug"
    } else {
        "configurator_capture=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.debug);

    if let Err(e) = run(args).await {
        eprintln!("\n[ERROR] {e}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    println!("=== Simulated capture run ===\n");

    // ========================================================================
    // Setup
    // ========================================================================

    if args.clean {
        println!("[Setup] Removing previous captures...");
        std::fs::remove_dir_all(OUTPUT_DIR).ok();
    }
    std::fs::create_dir_all(OUTPUT_DIR).ok();
    println!("[Setup] Output directory ready: {OUTPUT_DIR}");

    let state = Arc::new(Mutex::new(ShowroomState::sofa()));
    let engine = CaptureEngine::builder()
        .automation(Arc::new(ShowroomPanel::new(state.clone())))
        .viewer(Arc::new(ShowroomViewer::new(state)))
        .delivery(Arc::new(DirectoryDelivery::new(OUTPUT_DIR)))
        .store(Arc::new(MemoryStore::new()))
        .options(
            EngineOptions::new()
                .with_capture_size(640, 480)
                .with_settle_after_apply(Duration::from_millis(50))
                .with_iteration_delay(Duration::from_millis(120))
                .with_click_settle(Duration::from_millis(5))
                .with_retry_delay(Duration::from_millis(100)),
        )
        .build()?;
    println!("[Setup] Engine ready\n");

    // ========================================================================
    // Scan
    // ========================================================================

    println!("[1] Scan the configurator...");
    let groups = engine.scan().await?;
    for group in &groups {
        let current = group.current_value.as_deref().unwrap_or("?");
        println!(
            "    - {} ({} values, current: {current})",
            group.name,
            group.values.len()
        );
        for value in &group.values {
            println!("        * {}", value.label);
        }
    }
    println!();

    // ========================================================================
    // Plan
    // ========================================================================

    println!("[2] Build a plan over every group...");
    let selection = (0..groups.len()).fold(SelectionSet::new(), |set, index| set.with_group(index));
    let plan = engine.build_plan(&selection).await?;
    let total = plan.total_images;
    println!(
        "    ✓ {} combinations at {}x{} for {}",
        total,
        plan.capture_width,
        plan.capture_height,
        plan.product_name.as_deref().unwrap_or("(untitled)")
    );

    for index in 0..total.min(3) {
        let combination = combination_for_index(&plan, index)?;
        let labels: Vec<&str> = combination.iter().map(|s| s.value_label.as_str()).collect();
        println!("    [{index}] {}", labels.join(" / "));
    }
    println!("    ...\n");

    // ========================================================================
    // Events
    // ========================================================================

    println!("[3] Subscribe to batch events...\n");
    engine.set_event_handler(Box::new(move |event| match event {
        BatchEvent::ItemCompleted {
            index,
            filename,
            bytes,
        } => {
            println!("    ✓ {}/{total} {filename} ({bytes} bytes)", index + 1);
        }
        BatchEvent::AttemptFailed {
            index,
            attempt,
            max_attempts,
            error,
        } => {
            println!("    ⚠ item {index} attempt {attempt}/{max_attempts}: {error}");
        }
        BatchEvent::ItemFailed { index, error } => {
            println!("    ✗ item {index} failed: {error}");
        }
        BatchEvent::Finished { completed, failed } => {
            println!("\n    Run finished: {completed} captured, {failed} failed");
        }
        _ => {}
    }));

    // ========================================================================
    // Run with a Pause in the Middle
    // ========================================================================

    println!("[4] Start, then pause and resume mid-run...");
    engine.start(plan).await?;

    tokio::time::sleep(Duration::from_millis(500)).await;
    match engine.pause().await {
        Ok(()) => {
            let done = engine.progress().completed_count;
            println!("    ✓ Paused after {done} items (status: {})", engine.status());
            match engine.load_resume_snapshot().await? {
                Some(snapshot) => println!(
                    "    Resume snapshot on record: {}/{} done for {}",
                    snapshot.progress.completed_count,
                    snapshot.progress.total_images,
                    snapshot.source_address()
                ),
                None => println!("    ⚠ No resume snapshot found"),
            }

            tokio::time::sleep(Duration::from_millis(300)).await;
            engine.resume().await?;
            println!("    ✓ Resumed\n");
        }
        Err(_) => println!("    ⚠ Run finished before the pause landed\n"),
    }

    engine.wait_until_terminal().await;

    // ========================================================================
    // Summary
    // ========================================================================

    let progress = engine.progress();
    println!("\n[5] Final state:");
    println!("    Status:    {}", engine.status());
    println!("    Captured:  {}/{}", progress.completed_count, progress.total_images);
    println!("    Failed:    {}", progress.failed_count);
    println!("    Delivered: {} bytes", progress.downloaded_bytes);
    for item in &progress.failed_items {
        println!("    ✗ [{}] {}: {}", item.index, item.labels.join(" / "), item.error);
    }

    println!("\n[6] Output directory:");
    match std::fs::read_dir(OUTPUT_DIR) {
        Ok(entries) => {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_file()
                    && let Ok(metadata) = std::fs::metadata(&path)
                {
                    println!("    - {} ({} bytes)", path.display(), metadata.len());
                }
            }
        }
        Err(_) => println!("    (no captures written)"),
    }

    println!("\n[7] Resume snapshot after completion:");
    match engine.load_resume_snapshot().await? {
        None => println!("    ✓ Cleared, nothing left to resume"),
        Some(snapshot) => println!("    ⚠ Still present (status: {})", snapshot.status),
    }

    println!("\n=== Simulated capture run complete ===");
    Ok(())
}
