//! Annotated copies of scanned images.
//!
//! Each symbol box is outlined in a colour that tells where it came from:
//! green for decoded symbols, orange for localizer boxes and blue for
//! ground-truth boxes.

use std::fs;
use std::path::{Path, PathBuf};

use image::{DynamicImage, Rgb, RgbImage};
use tracing::debug;

use crate::error::ScanError;
use crate::model::{Outcome, Rect, Source};

const DECODED_COLOUR: Rgb<u8> = Rgb([0, 200, 0]);
const LOCALIZER_COLOUR: Rgb<u8> = Rgb([255, 140, 0]);
const GROUND_TRUTH_COLOUR: Rgb<u8> = Rgb([0, 90, 255]);

pub fn colour_for(source: Source) -> Rgb<u8> {
    match source {
        Source::Decoded => DECODED_COLOUR,
        Source::LocalizerFallback => LOCALIZER_COLOUR,
        Source::GroundTruthFallback => GROUND_TRUTH_COLOUR,
    }
}

/// With input root `photos` and suffix `_detected`, `photos/train/a.jpg`
/// becomes `<output_dir>/train/a_detected.jpg`. The directories below the
/// root are mirrored so same-named images in different folders stay apart.
/// An input outside the root lands directly in `output_dir`. Images without
/// an extension are written as PNG.
pub fn output_path(input: &Path, input_root: &Path, output_dir: &Path, suffix: &str) -> PathBuf {
    let subdir = input
        .strip_prefix(input_root)
        .ok()
        .and_then(Path::parent)
        .unwrap_or_else(|| Path::new(""));
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    let ext = input
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "png".to_string());
    output_dir.join(subdir).join(format!("{stem}{suffix}.{ext}"))
}

/// Outlines `rect` in place. Parts outside the canvas are skipped.
pub fn draw_rect(canvas: &mut RgbImage, rect: Rect, colour: Rgb<u8>, thickness: u32) {
    let (width, height) = canvas.dimensions();
    for t in 0..thickness.min(rect.width()).min(rect.height()) {
        let left = rect.x() + t;
        let top = rect.y() + t;
        let right = rect.right() - 1 - t;
        let bottom = rect.bottom() - 1 - t;

        for x in left..=right {
            for y in [top, bottom] {
                if x < width && y < height {
                    canvas.put_pixel(x, y, colour);
                }
            }
        }
        for y in top..=bottom {
            for x in [left, right] {
                if x < width && y < height {
                    canvas.put_pixel(x, y, colour);
                }
            }
        }
    }
}

/// Draws every symbol of `outcome` onto a copy of `pixels`.
pub fn render(pixels: &DynamicImage, outcome: &Outcome, thickness: u32) -> RgbImage {
    let mut canvas = pixels.to_rgb8();
    for symbol in outcome.symbols() {
        draw_rect(&mut canvas, symbol.bbox(), colour_for(symbol.source()), thickness);
    }
    canvas
}

/// Renders and saves the annotated copy, returning where it was written.
pub fn save_visualization(
    input: &Path,
    pixels: &DynamicImage,
    outcome: &Outcome,
    input_root: &Path,
    output_dir: &Path,
    suffix: &str,
    thickness: u32,
) -> Result<PathBuf, ScanError> {
    let path = output_path(input, input_root, output_dir, suffix);
    fs::create_dir_all(path.parent().unwrap_or(output_dir))?;
    render(pixels, outcome, thickness)
        .save(&path)
        .map_err(|source| ScanError::VisualizationWrite {
            path: path.clone(),
            source,
        })?;
    debug!("Saved visualization to {}", path.display());
    Ok(path)
}
