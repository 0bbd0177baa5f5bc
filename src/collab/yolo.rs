//! YOLO-format label files as ground truth and as localizer output.
//!
//! Both collaborators read one `.txt` file per image where every non-empty
//! line is `class_id cx cy w h` in normalized coordinates. Prediction files
//! may carry a sixth token with the model's confidence, as written by
//! Ultralytics' `save_conf` option.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{ClassLabel, CollaboratorError, Frame, GroundTruth, Localization, Localizer};
use crate::model::{BBox, ImageId, Normalized, Pixel};

const LABEL_EXTENSION: &str = "txt";

/// Where the label file for an image lives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LabelLayout {
    /// `photo.txt` next to `photo.jpg`.
    Sibling,
    /// A label tree mirroring an image tree: `labels_root/a/b.txt` belongs to
    /// `images_root/a/b.jpg`.
    Mirrored {
        images_root: PathBuf,
        labels_root: PathBuf,
    },
}

impl LabelLayout {
    /// Detects a dataset-style `images/` + `labels/` layout around `input`,
    /// falling back to sibling label files.
    ///
    /// `input` may be the dataset root, its `images/` directory, or a single
    /// image file inside either.
    pub fn discover(input: &Path) -> Self {
        let dir = if input.is_file() {
            match input.parent() {
                Some(parent) => parent,
                None => return LabelLayout::Sibling,
            }
        } else {
            input
        };

        if dir.join("images").is_dir() && dir.join("labels").is_dir() {
            return LabelLayout::Mirrored {
                images_root: dir.join("images"),
                labels_root: dir.join("labels"),
            };
        }

        for ancestor in dir.ancestors() {
            if is_dir_named(ancestor, "images") {
                if let Some(root) = ancestor.parent() {
                    if root.join("labels").is_dir() {
                        return LabelLayout::Mirrored {
                            images_root: ancestor.to_path_buf(),
                            labels_root: root.join("labels"),
                        };
                    }
                }
            }
        }

        LabelLayout::Sibling
    }

    /// Label file path for `image_path`.
    ///
    /// Images outside a mirrored layout's image root use sibling files.
    pub fn label_path(&self, image_path: &Path) -> PathBuf {
        match self {
            LabelLayout::Sibling => image_path.with_extension(LABEL_EXTENSION),
            LabelLayout::Mirrored {
                images_root,
                labels_root,
            } => match image_path.strip_prefix(images_root) {
                Ok(rel) => labels_root.join(rel).with_extension(LABEL_EXTENSION),
                Err(_) => image_path.with_extension(LABEL_EXTENSION),
            },
        }
    }
}

/// Ground truth read from YOLO label files.
///
/// The image id is taken to be the image path. Image dimensions, needed to
/// scale normalized boxes, are read from the image header with `imagesize`.
#[derive(Clone, Debug)]
pub struct YoloAnnotations {
    layout: LabelLayout,
}

impl YoloAnnotations {
    pub fn new(layout: LabelLayout) -> Self {
        Self { layout }
    }
}

impl GroundTruth for YoloAnnotations {
    fn lookup(&self, image: &ImageId) -> Result<Vec<BBox<Pixel>>, CollaboratorError> {
        let image_path = image.path();
        let label_path = self.layout.label_path(image_path);
        let Some(rows) = read_label_file(&label_path, false)? else {
            debug!("no annotation file for {image} at {}", label_path.display());
            return Ok(Vec::new());
        };
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let (width, height) = read_image_dimensions(image_path)?;
        Ok(rows
            .iter()
            .map(|row| row.normalized_bbox().to_pixel(width, height))
            .collect())
    }
}

/// Localizer output precomputed by a detection model and saved as YOLO
/// prediction files, with class 0 = single symbol and class 1 = multiple.
#[derive(Clone, Debug)]
pub struct YoloPredictions {
    layout: LabelLayout,
}

impl YoloPredictions {
    pub fn new(layout: LabelLayout) -> Self {
        Self { layout }
    }
}

impl Localizer for YoloPredictions {
    fn locate(&self, frame: &Frame<'_>) -> Result<Vec<Localization>, CollaboratorError> {
        let label_path = self.layout.label_path(frame.id.path());
        let Some(rows) = read_label_file(&label_path, true)? else {
            debug!("no prediction file for {} at {}", frame.id, label_path.display());
            return Ok(Vec::new());
        };

        rows.into_iter()
            .map(|row| {
                let class_label = ClassLabel::from_class_id(row.class_id).ok_or_else(|| {
                    CollaboratorError::Annotation {
                        path: label_path.clone(),
                        line: row.line,
                        message: format!(
                            "class_id {} is not a localizer class (expected 0 or 1)",
                            row.class_id
                        ),
                    }
                })?;
                Ok(Localization {
                    bbox: row
                        .normalized_bbox()
                        .to_pixel(frame.width(), frame.height()),
                    class_label,
                    confidence: row.confidence,
                })
            })
            .collect()
    }
}

#[derive(Debug, PartialEq)]
struct LabelRow {
    line: usize,
    class_id: usize,
    cx: f64,
    cy: f64,
    w: f64,
    h: f64,
    confidence: Option<f64>,
}

impl LabelRow {
    fn normalized_bbox(&self) -> BBox<Normalized> {
        BBox::from_cxcywh(self.cx, self.cy, self.w, self.h)
    }
}

/// Returns `Ok(None)` when the file does not exist.
fn read_label_file(
    path: &Path,
    allow_confidence: bool,
) -> Result<Option<Vec<LabelRow>>, CollaboratorError> {
    if !path.is_file() {
        return Ok(None);
    }

    let content = fs::read_to_string(path).map_err(|source| CollaboratorError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut rows = Vec::new();
    for (line_idx, line) in content.lines().enumerate() {
        if let Some(row) = parse_label_line(line, path, line_idx + 1, allow_confidence)? {
            rows.push(row);
        }
    }
    Ok(Some(rows))
}

fn parse_label_line(
    line: &str,
    file_path: &Path,
    line_num: usize,
    allow_confidence: bool,
) -> Result<Option<LabelRow>, CollaboratorError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let annotation_error = |message: String| CollaboratorError::Annotation {
        path: file_path.to_path_buf(),
        line: line_num,
        message,
    };

    // Take at most 7 tokens so pathological inputs do not allocate unbounded memory.
    let tokens: Vec<&str> = trimmed.split_whitespace().take(7).collect();
    let max_tokens = if allow_confidence { 6 } else { 5 };

    if tokens.len() < 5 {
        return Err(annotation_error(format!(
            "expected 5 tokens, found {}",
            tokens.len()
        )));
    }
    if tokens.len() > max_tokens {
        return Err(annotation_error(format!(
            "expected at most {max_tokens} tokens, found {}",
            tokens.len()
        )));
    }

    let class_id = tokens[0].parse::<usize>().map_err(|_| {
        annotation_error(format!(
            "invalid class_id '{}'; expected non-negative integer",
            tokens[0]
        ))
    })?;

    let parse_f64 = |raw: &str, field_name: &str| {
        raw.parse::<f64>().map_err(|_| {
            annotation_error(format!(
                "invalid {field_name} '{raw}'; expected floating-point number"
            ))
        })
    };

    let cx = parse_f64(tokens[1], "x_center")?;
    let cy = parse_f64(tokens[2], "y_center")?;
    let w = parse_f64(tokens[3], "width")?;
    let h = parse_f64(tokens[4], "height")?;
    let confidence = match tokens.get(5) {
        Some(raw) => Some(parse_f64(raw, "confidence")?),
        None => None,
    };

    Ok(Some(LabelRow {
        line: line_num,
        class_id,
        cx,
        cy,
        w,
        h,
        confidence,
    }))
}

/// Fuzz-only entrypoint for single-line label parsing, with and without the
/// confidence column.
#[cfg(feature = "fuzzing")]
pub fn fuzz_parse_label_line(input: &str) -> Result<(), CollaboratorError> {
    let _ = parse_label_line(input, Path::new("<fuzz>"), 1, false)?;
    let _ = parse_label_line(input, Path::new("<fuzz>"), 1, true)?;
    Ok(())
}

fn read_image_dimensions(path: &Path) -> Result<(u32, u32), CollaboratorError> {
    let size = imagesize::size(path).map_err(|err| {
        CollaboratorError::Failed(format!(
            "could not read dimensions of {}: {err}",
            path.display()
        ))
    })?;

    let width: u32 = size.width.try_into().map_err(|_| {
        CollaboratorError::Failed(format!("image width {} does not fit in u32", size.width))
    })?;
    let height: u32 = size.height.try_into().map_err(|_| {
        CollaboratorError::Failed(format!(
            "image height {} does not fit in u32",
            size.height
        ))
    })?;

    Ok((width, height))
}

fn is_dir_named(path: &Path, dir_name: &str) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.eq_ignore_ascii_case(dir_name))
        .unwrap_or(false)
}
