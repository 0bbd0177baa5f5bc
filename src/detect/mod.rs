//! Detection strategies and the router that picks between them.
//!
//! There are exactly two strategies:
//!
//! - [`Strategy::Qr`]: decode QR symbols; a decode is both the location and
//!   the payload. No fallback.
//! - [`Strategy::Barcode`]: decode non-QR symbols, and when that finds
//!   nothing walk [`FALLBACK_ORDER`] until a source produces a box.
//!
//! A [`Detector`] holds the collaborators both strategies need. It borrows
//! them, so one decoder instance can serve every worker of a batch.

mod hybrid;
mod qr;
mod router;

pub use hybrid::{FallbackSource, FALLBACK_ORDER};
pub use router::{route, TypeHint};

use tracing::debug;

use crate::collab::{CollaboratorError, Decoder, Frame, GroundTruth, Localizer};
use crate::config::{DetectionConfig, GROUND_TRUTH_CONFIDENCE, LOCALIZER_DEFAULT_CONFIDENCE};
use crate::model::{CodeKind, SymbolResult};

/// The closed set of detection strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Strategy {
    Qr,
    Barcode,
}

impl Strategy {
    /// The classification recorded on an outcome produced by this strategy.
    pub fn kind(&self) -> CodeKind {
        match self {
            Strategy::Qr => CodeKind::Qr,
            Strategy::Barcode => CodeKind::Barcode,
        }
    }
}

/// Symbols found in one image and the strategy that found them.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    pub strategy: Strategy,
    pub symbols: Vec<SymbolResult>,
}

/// Runs strategies against images using borrowed collaborators.
#[derive(Clone, Copy)]
pub struct Detector<'a> {
    decoder: &'a dyn Decoder,
    localizer: Option<&'a dyn Localizer>,
    ground_truth: Option<&'a dyn GroundTruth>,
    localizer_default_confidence: f64,
    ground_truth_confidence: f64,
}

impl<'a> Detector<'a> {
    /// A detector with no fallback sources; barcode images can only be
    /// located by decoding.
    pub fn new(decoder: &'a dyn Decoder) -> Self {
        Self {
            decoder,
            localizer: None,
            ground_truth: None,
            localizer_default_confidence: LOCALIZER_DEFAULT_CONFIDENCE,
            ground_truth_confidence: GROUND_TRUTH_CONFIDENCE,
        }
    }

    pub fn with_localizer(mut self, localizer: &'a dyn Localizer) -> Self {
        self.localizer = Some(localizer);
        self
    }

    pub fn with_ground_truth(mut self, ground_truth: &'a dyn GroundTruth) -> Self {
        self.ground_truth = Some(ground_truth);
        self
    }

    /// Applies the confidence constants from `config`.
    pub fn with_config(mut self, config: &DetectionConfig) -> Self {
        self.localizer_default_confidence = config.localizer_default_confidence;
        self.ground_truth_confidence = config.ground_truth_confidence;
        self
    }

    /// Runs one strategy.
    pub fn detect(
        &self,
        strategy: Strategy,
        frame: &Frame<'_>,
    ) -> Result<Vec<SymbolResult>, CollaboratorError> {
        match strategy {
            Strategy::Qr => qr::detect(self.decoder, frame),
            Strategy::Barcode => self.detect_barcode(frame),
        }
    }

    /// Routes the image with `hint` and runs the chosen strategy.
    ///
    /// For [`TypeHint::Auto`] the QR strategy runs first; its result is
    /// reused when the router keeps the QR classification.
    pub fn detect_routed(
        &self,
        frame: &Frame<'_>,
        hint: TypeHint,
    ) -> Result<Detection, CollaboratorError> {
        if hint != TypeHint::Auto {
            let strategy = route(hint, None);
            let symbols = self.detect(strategy, frame)?;
            return Ok(Detection { strategy, symbols });
        }

        let first_pass = self.detect(Strategy::Qr, frame)?;
        match route(hint, Some(&first_pass)) {
            Strategy::Qr => Ok(Detection {
                strategy: Strategy::Qr,
                symbols: first_pass,
            }),
            Strategy::Barcode => {
                debug!("{}: no QR symbols, trying barcode strategy", frame.id);
                let symbols = self.detect(Strategy::Barcode, frame)?;
                Ok(Detection {
                    strategy: Strategy::Barcode,
                    symbols,
                })
            }
        }
    }
}
