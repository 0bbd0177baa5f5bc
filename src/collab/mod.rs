//! Collaborators consulted by the detection strategies.
//!
//! The pipeline never reads pixels or annotation files itself. It talks to
//! four capabilities, each behind a trait so that tests and library callers
//! can substitute their own:
//!
//! - [`ImageLoader`]: path to pixels
//! - [`Decoder`]: pixels to located and decoded symbols
//! - [`Localizer`]: pixels to located symbol boxes, no payload
//! - [`GroundTruth`]: image id to annotated boxes
//!
//! Concrete implementations used by the CLI live in the submodules.

mod loader;
mod rqrr_decoder;
mod rxing_decoder;
pub mod yolo;

pub use loader::FsImageLoader;
pub use rqrr_decoder::RqrrDecoder;
pub use rxing_decoder::{symbology_for, RxingDecoder, StandardDecoder};
pub use yolo::{LabelLayout, YoloAnnotations, YoloPredictions};

use std::path::{Path, PathBuf};

use image::DynamicImage;
use thiserror::Error;

use crate::error::ScanError;
use crate::model::{BBox, ImageId, Pixel, Symbology};

/// Failure reported by a collaborator for one image.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("{0}")]
    Failed(String),

    #[error("timed out after {after_ms} ms")]
    Timeout { after_ms: u64 },

    #[error("{path}:{line}: {message}")]
    Annotation {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// An image handed to the decoder and localizer.
#[derive(Clone, Copy)]
pub struct Frame<'a> {
    pub id: &'a ImageId,
    pub pixels: &'a DynamicImage,
}

impl<'a> Frame<'a> {
    pub fn new(id: &'a ImageId, pixels: &'a DynamicImage) -> Self {
        Self { id, pixels }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }
}

/// Which symbologies a decode call should report.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SymbologyFilter {
    /// QR codes only.
    QrFamily,
    /// Every symbology except the QR family.
    NonQr,
}

impl SymbologyFilter {
    pub fn accepts(&self, symbology: Symbology) -> bool {
        match self {
            SymbologyFilter::QrFamily => symbology.is_qr_family(),
            SymbologyFilter::NonQr => !symbology.is_qr_family(),
        }
    }
}

/// A symbol read by a [`Decoder`].
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedSymbol {
    /// Axis-aligned box; polygon outputs are reduced with [`BBox::from_points`].
    pub bbox: BBox<Pixel>,
    pub payload: String,
    pub symbology: Symbology,
}

/// Reads symbols directly from pixels.
///
/// An image with nothing decodable yields `Ok(vec![])`, never an error.
pub trait Decoder: Send + Sync {
    fn decode(
        &self,
        frame: &Frame<'_>,
        filter: SymbologyFilter,
    ) -> Result<Vec<DecodedSymbol>, CollaboratorError>;
}

/// Localizer class labels, following the two-class dataset convention.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClassLabel {
    /// Class 0: exactly one symbol in the image.
    Single,
    /// Class 1: more than one symbol in the image.
    Multiple,
}

impl ClassLabel {
    pub fn from_class_id(class_id: usize) -> Option<Self> {
        match class_id {
            0 => Some(ClassLabel::Single),
            1 => Some(ClassLabel::Multiple),
            _ => None,
        }
    }

    /// True if `count` boxes is what this label predicts.
    pub fn agrees_with(&self, count: usize) -> bool {
        match self {
            ClassLabel::Single => count == 1,
            ClassLabel::Multiple => count > 1,
        }
    }
}

/// A box found by a [`Localizer`].
#[derive(Clone, Debug, PartialEq)]
pub struct Localization {
    pub bbox: BBox<Pixel>,
    pub class_label: ClassLabel,
    /// `None` when the model did not report a score.
    pub confidence: Option<f64>,
}

/// Finds symbol boxes without reading them.
pub trait Localizer: Send + Sync {
    fn locate(&self, frame: &Frame<'_>) -> Result<Vec<Localization>, CollaboratorError>;
}

/// Supplies annotated boxes for an image, if any exist.
pub trait GroundTruth: Send + Sync {
    /// Returns an empty list when the image has no annotation.
    fn lookup(&self, image: &ImageId) -> Result<Vec<BBox<Pixel>>, CollaboratorError>;
}

/// Loads pixels for a path.
pub trait ImageLoader: Send + Sync {
    /// Fails with [`ScanError::Read`] on missing or corrupt files.
    fn load(&self, path: &Path) -> Result<DynamicImage, ScanError>;
}
