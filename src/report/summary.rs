//! Summary counts and their terminal rendering.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::model::{Source, Symbology};

/// Aggregate counts over a batch of outcomes.
///
/// Every field is order-independent, so the same outcomes always produce the
/// same summary whatever order they were processed in.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Summary {
    /// Number of outcomes (one per input image).
    pub images: usize,
    /// Images with at least one symbol.
    pub success: usize,
    /// Images processed without finding a symbol.
    pub no_symbol_found: usize,
    /// Images that failed to load or process.
    pub error: usize,
    /// Symbols across all images.
    pub total_symbols: usize,
    /// Symbols that carry a decoded payload.
    pub decoded_symbols: usize,
    /// Symbol counts per symbology. Only non-zero entries are present.
    pub by_symbol_type: BTreeMap<Symbology, usize>,
    /// Symbol counts per source. Only non-zero entries are present.
    pub by_source: BTreeMap<Source, usize>,
}

impl Summary {
    /// Fraction of images with at least one symbol; 0.0 for an empty batch.
    pub fn success_rate(&self) -> f64 {
        if self.images == 0 {
            0.0
        } else {
            self.success as f64 / self.images as f64
        }
    }

    pub fn count_for_type(&self, symbology: Symbology) -> usize {
        self.by_symbol_type.get(&symbology).copied().unwrap_or(0)
    }

    pub fn count_for_source(&self, source: Source) -> usize {
        self.by_source.get(&source).copied().unwrap_or(0)
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Scan summary")?;
        writeln!(f, "  images:            {}", self.images)?;
        writeln!(
            f,
            "  success:           {} ({:.1}%)",
            self.success,
            self.success_rate() * 100.0
        )?;
        writeln!(f, "  no symbol found:   {}", self.no_symbol_found)?;
        writeln!(f, "  errors:            {}", self.error)?;
        writeln!(
            f,
            "  symbols:           {} ({} decoded)",
            self.total_symbols, self.decoded_symbols
        )?;

        if !self.by_symbol_type.is_empty() {
            writeln!(f)?;
            writeln!(f, "By symbol type:")?;
            for (symbology, count) in &self.by_symbol_type {
                writeln!(f, "  {:<12} {}", symbology.as_str(), count)?;
            }
        }

        if !self.by_source.is_empty() {
            writeln!(f)?;
            writeln!(f, "By source:")?;
            for (source, count) in &self.by_source {
                writeln!(f, "  {:<22} {}", source.as_str(), count)?;
            }
        }

        Ok(())
    }
}
