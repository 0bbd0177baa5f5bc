//! Strategy selection per image.

use std::fmt;
use std::str::FromStr;

use super::Strategy;
use crate::error::ScanError;
use crate::model::SymbolResult;

/// What the caller knows about an image's content.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypeHint {
    Qr,
    Barcode,
    /// QR-first auto-detection: the QR strategy runs first and the image is
    /// classified QR if it finds anything, otherwise barcode.
    Auto,
}

impl TypeHint {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeHint::Qr => "qr",
            TypeHint::Barcode => "barcode",
            TypeHint::Auto => "auto",
        }
    }
}

impl FromStr for TypeHint {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "qr" => Ok(TypeHint::Qr),
            "barcode" => Ok(TypeHint::Barcode),
            "auto" => Ok(TypeHint::Auto),
            other => Err(ScanError::InvalidArgument(format!(
                "unknown type hint '{other}' (supported: qr, barcode, auto)"
            ))),
        }
    }
}

impl fmt::Display for TypeHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps a hint, plus the result of the QR pass for [`TypeHint::Auto`], to a
/// strategy.
///
/// Explicit hints always win and ignore the QR pass. For `Auto`, a QR pass with
/// at least one symbol selects QR; an empty one selects barcode. `Auto`
/// without a QR pass selects QR, the strategy that has to run first.
///
/// A barcode image that happens to decode under QR rules is classified QR.
pub fn route(hint: TypeHint, qr_pass: Option<&[SymbolResult]>) -> Strategy {
    match hint {
        TypeHint::Qr => Strategy::Qr,
        TypeHint::Barcode => Strategy::Barcode,
        TypeHint::Auto => match qr_pass {
            Some(found) if found.is_empty() => Strategy::Barcode,
            _ => Strategy::Qr,
        },
    }
}
