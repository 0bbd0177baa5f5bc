//! Per-image outcome records.

use serde::Serialize;
use std::fmt;

use super::ids::ImageId;
use super::symbol::SymbolResult;

/// The detection family an image was routed to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CodeKind {
    Qr,
    Barcode,
}

impl CodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CodeKind::Qr => "QR",
            CodeKind::Barcode => "BARCODE",
        }
    }
}

impl fmt::Display for CodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final state of one image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Success,
    NoSymbolFound,
    Error,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Success => "SUCCESS",
            Status::NoSymbolFound => "NO_SYMBOL_FOUND",
            Status::Error => "ERROR",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result for one input image.
///
/// The constructors are the only way to build one, and they uphold:
/// `status == Success` iff `symbols` is non-empty, `status == Error` implies
/// `symbols` is empty, and `error_detail` is present iff `status == Error`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Outcome {
    image_id: ImageId,
    /// `None` only when the image failed before it could be routed.
    detected_type: Option<CodeKind>,
    symbols: Vec<SymbolResult>,
    status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_detail: Option<String>,
}

impl Outcome {
    /// Outcome of an image that was processed; status follows from `symbols`.
    pub fn from_symbols(
        image_id: ImageId,
        detected_type: CodeKind,
        symbols: Vec<SymbolResult>,
    ) -> Self {
        let status = if symbols.is_empty() {
            Status::NoSymbolFound
        } else {
            Status::Success
        };
        Self {
            image_id,
            detected_type: Some(detected_type),
            symbols,
            status,
            error_detail: None,
        }
    }

    /// Outcome of an image whose loading or processing failed.
    pub fn failed(
        image_id: ImageId,
        detected_type: Option<CodeKind>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            image_id,
            detected_type,
            symbols: Vec::new(),
            status: Status::Error,
            error_detail: Some(detail.into()),
        }
    }

    #[inline]
    pub fn image_id(&self) -> &ImageId {
        &self.image_id
    }

    #[inline]
    pub fn detected_type(&self) -> Option<CodeKind> {
        self.detected_type
    }

    #[inline]
    pub fn symbols(&self) -> &[SymbolResult] {
        &self.symbols
    }

    #[inline]
    pub fn status(&self) -> Status {
        self.status
    }

    #[inline]
    pub fn error_detail(&self) -> Option<&str> {
        self.error_detail.as_deref()
    }

    #[inline]
    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }
}
