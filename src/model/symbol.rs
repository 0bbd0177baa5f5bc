//! One located (and possibly decoded) symbol instance.

use serde::Serialize;
use std::fmt;

use super::rect::Rect;

/// Confidence attached to every directly decoded symbol.
pub const DECODED_CONFIDENCE: f64 = 1.0;

/// Symbologies a result can carry.
///
/// `Unknown` is used for boxes that were located without being read.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Symbology {
    #[serde(rename = "QR")]
    Qr,
    #[serde(rename = "EAN13")]
    Ean13,
    #[serde(rename = "EAN8")]
    Ean8,
    #[serde(rename = "UPC_A")]
    UpcA,
    #[serde(rename = "UPC_E")]
    UpcE,
    #[serde(rename = "CODE128")]
    Code128,
    #[serde(rename = "CODE39")]
    Code39,
    #[serde(rename = "CODE93")]
    Code93,
    #[serde(rename = "ITF")]
    Itf,
    #[serde(rename = "CODABAR")]
    Codabar,
    #[serde(rename = "DATAMATRIX")]
    DataMatrix,
    #[serde(rename = "PDF417")]
    Pdf417,
    #[serde(rename = "AZTEC")]
    Aztec,
    #[serde(rename = "UNKNOWN")]
    Unknown,
}

impl Symbology {
    /// All variants, in declaration order.
    pub const ALL: [Symbology; 14] = [
        Symbology::Qr,
        Symbology::Ean13,
        Symbology::Ean8,
        Symbology::UpcA,
        Symbology::UpcE,
        Symbology::Code128,
        Symbology::Code39,
        Symbology::Code93,
        Symbology::Itf,
        Symbology::Codabar,
        Symbology::DataMatrix,
        Symbology::Pdf417,
        Symbology::Aztec,
        Symbology::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Symbology::Qr => "QR",
            Symbology::Ean13 => "EAN13",
            Symbology::Ean8 => "EAN8",
            Symbology::UpcA => "UPC_A",
            Symbology::UpcE => "UPC_E",
            Symbology::Code128 => "CODE128",
            Symbology::Code39 => "CODE39",
            Symbology::Code93 => "CODE93",
            Symbology::Itf => "ITF",
            Symbology::Codabar => "CODABAR",
            Symbology::DataMatrix => "DATAMATRIX",
            Symbology::Pdf417 => "PDF417",
            Symbology::Aztec => "AZTEC",
            Symbology::Unknown => "UNKNOWN",
        }
    }

    /// True for the symbologies handled by the QR strategy.
    #[inline]
    pub fn is_qr_family(&self) -> bool {
        matches!(self, Symbology::Qr)
    }
}

impl fmt::Display for Symbology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a symbol's location came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Source {
    /// Read by the decoder: location and payload are both known.
    Decoded,
    /// Located by the localizer model; payload unknown.
    LocalizerFallback,
    /// Taken from a ground-truth annotation; payload unknown.
    GroundTruthFallback,
}

impl Source {
    pub const ALL: [Source; 3] = [
        Source::Decoded,
        Source::LocalizerFallback,
        Source::GroundTruthFallback,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Decoded => "DECODED",
            Source::LocalizerFallback => "LOCALIZER_FALLBACK",
            Source::GroundTruthFallback => "GROUND_TRUTH_FALLBACK",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single symbol instance found in an image.
///
/// Built once by a detection strategy and never modified afterwards, so the
/// fields are only reachable through accessors.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SymbolResult {
    symbol_type: Symbology,
    #[serde(rename = "box")]
    bbox: Rect,
    payload: Option<String>,
    confidence: f64,
    source: Source,
}

impl SymbolResult {
    /// A symbol read directly by the decoder.
    pub fn decoded(symbol_type: Symbology, bbox: Rect, payload: impl Into<String>) -> Self {
        Self {
            symbol_type,
            bbox,
            payload: Some(payload.into()),
            confidence: DECODED_CONFIDENCE,
            source: Source::Decoded,
        }
    }

    /// A box reported by the localizer. `confidence` is clamped into [0, 1].
    pub fn localized(bbox: Rect, confidence: f64) -> Self {
        Self::located(bbox, confidence, Source::LocalizerFallback)
    }

    /// A box taken from a ground-truth annotation.
    pub fn from_ground_truth(bbox: Rect, confidence: f64) -> Self {
        Self::located(bbox, confidence, Source::GroundTruthFallback)
    }

    fn located(bbox: Rect, confidence: f64, source: Source) -> Self {
        let confidence = if confidence.is_finite() {
            confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            symbol_type: Symbology::Unknown,
            bbox,
            payload: None,
            confidence,
            source,
        }
    }

    #[inline]
    pub fn symbol_type(&self) -> Symbology {
        self.symbol_type
    }

    #[inline]
    pub fn bbox(&self) -> Rect {
        self.bbox
    }

    #[inline]
    pub fn payload(&self) -> Option<&str> {
        self.payload.as_deref()
    }

    #[inline]
    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    #[inline]
    pub fn source(&self) -> Source {
        self.source
    }
}
