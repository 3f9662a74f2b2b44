//! Frame analysis and processing.
//!
//! Viewers occasionally hand back all-one-color frames: WebGL contexts
//! mid-recompile, canvases before the first presented frame, or readback
//! during a resize. [`is_likely_blank`] is the cheap gate that catches
//! these before an item gets delivered.

// ============================================================================
// Imports
// ============================================================================

use std::io::Cursor;

use image::imageops::FilterType;
use image::{DynamicImage, ImageBuffer, Rgba, RgbaImage, imageops};

use crate::error::{Error, Result};
use crate::surface::{BackgroundSpec, RawFrame};

// ============================================================================
// Constants
// ============================================================================

/// Frames with either edge below this are unusable.
const MIN_FRAME_EDGE: u32 = 16;

/// Probe thumbnail edge for the blank heuristic.
const PROBE_EDGE: u32 = 64;

/// Every n-th probe pixel is sampled.
const PROBE_STRIDE: usize = 4;

/// Sampled value spread below this means a blank frame.
const BLANK_VALUE_RANGE: u16 = 6;

// ============================================================================
// Blank Detection
// ============================================================================

/// Heuristically decides whether a frame is blank.
///
/// Tiny or malformed frames count as blank. Otherwise the frame is
/// downsampled to a 64x64 thumbnail, every 4th pixel is reduced to
/// `(r + g + b + a) / 4`, and the frame is blank when the sampled values
/// span less than 6 levels.
#[must_use]
pub(crate) fn is_likely_blank(frame: &RawFrame) -> bool {
    if frame.width < MIN_FRAME_EDGE || frame.height < MIN_FRAME_EDGE {
        return true;
    }
    let Some(image) =
        ImageBuffer::<Rgba<u8>, _>::from_raw(frame.width, frame.height, frame.pixels.as_slice())
    else {
        return true;
    };

    let probe = imageops::resize(&image, PROBE_EDGE, PROBE_EDGE, FilterType::Triangle);

    let mut min = u16::MAX;
    let mut max = 0u16;
    for pixel in probe.pixels().step_by(PROBE_STRIDE) {
        let [r, g, b, a] = pixel.0;
        let value = (u16::from(r) + u16::from(g) + u16::from(b) + u16::from(a)) / 4;
        min = min.min(value);
        max = max.max(value);
    }

    max - min < BLANK_VALUE_RANGE
}

// ============================================================================
// Cropping & Scaling
// ============================================================================

/// Largest centered rectangle of `frame_w` x `frame_h` with the target
/// aspect ratio. Returns `(x, y, width, height)`.
fn center_crop_rect(frame_w: u32, frame_h: u32, target_aspect: f64) -> (u32, u32, u32, u32) {
    let frame_aspect = f64::from(frame_w) / f64::from(frame_h);

    if frame_aspect > target_aspect {
        // Wider than target: crop the sides.
        let crop_h = frame_h;
        let crop_w = ((f64::from(crop_h) * target_aspect).round() as u32)
            .clamp(1, frame_w);
        ((frame_w - crop_w) / 2, 0, crop_w, crop_h)
    } else {
        // Taller than target: crop top and bottom.
        let crop_w = frame_w;
        let crop_h = ((f64::from(crop_w) / target_aspect).round() as u32)
            .clamp(1, frame_h);
        (0, (frame_h - crop_h) / 2, crop_w, crop_h)
    }
}

fn composite_over(image: &mut RgbaImage, background: BackgroundSpec) {
    let (br, bg_, bb) = match background {
        BackgroundSpec::Neutral => (255u16, 255u16, 255u16),
        BackgroundSpec::Solid { r, g, b } => (u16::from(r), u16::from(g), u16::from(b)),
    };

    for pixel in image.pixels_mut() {
        let [r, g, b, a] = pixel.0;
        let alpha = u16::from(a);
        let inverse = 255 - alpha;
        pixel.0 = [
            ((u16::from(r) * alpha + br * inverse) / 255) as u8,
            ((u16::from(g) * alpha + bg_ * inverse) / 255) as u8,
            ((u16::from(b) * alpha + bb * inverse) / 255) as u8,
            255,
        ];
    }
}

/// Crops a frame to the target aspect, downscales it to the target size
/// (never upscales), optionally flattens it onto a background, and
/// encodes PNG.
///
/// Returns the PNG bytes and the final dimensions.
pub(crate) fn process_frame(
    frame: RawFrame,
    target_width: u32,
    target_height: u32,
    background: Option<BackgroundSpec>,
) -> Result<(Vec<u8>, u32, u32)> {
    if !frame.is_well_formed() {
        return Err(Error::capture(format!(
            "frame buffer length {} does not match {}x{}",
            frame.pixels.len(),
            frame.width,
            frame.height
        )));
    }
    let image: RgbaImage = ImageBuffer::from_raw(frame.width, frame.height, frame.pixels)
        .ok_or_else(|| Error::capture("frame buffer rejected"))?;

    let target_aspect = f64::from(target_width) / f64::from(target_height.max(1));
    let (x, y, crop_w, crop_h) = center_crop_rect(frame.width, frame.height, target_aspect);
    let mut image = imageops::crop_imm(&image, x, y, crop_w, crop_h).to_image();

    // Downscale only. A frame smaller than the target ships at its own
    // size rather than interpolating pixels that were never rendered.
    let out_w = target_width.min(crop_w);
    let out_h = target_height.min(crop_h);
    if (out_w, out_h) != (crop_w, crop_h) {
        image = imageops::resize(&image, out_w, out_h, FilterType::Lanczos3);
    }

    if let Some(background) = background {
        composite_over(&mut image, background);
    }

    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(image)
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .map_err(|e| Error::capture(format!("png encode failed: {e}")))?;

    Ok((bytes, out_w, out_h))
}

// ============================================================================
// Tests
// ============================================================================
