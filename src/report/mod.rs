//! Batch reports.
//!
//! A [`Report`] owns the outcomes of a run in input order. Its [`Summary`] is
//! never stored: [`summarize`] recomputes it from the outcomes on request.

mod summary;

pub use summary::Summary;

use serde::ser::SerializeStruct;
use serde::Serialize;
use std::fmt;

use crate::model::{CodeKind, Outcome, Source, Status, Symbology};

/// Folds outcomes into summary counts.
///
/// Pure: one pass over the outcomes and one over each outcome's symbols.
pub fn summarize(outcomes: &[Outcome]) -> Summary {
    let mut summary = Summary {
        images: outcomes.len(),
        ..Default::default()
    };

    for outcome in outcomes {
        match outcome.status() {
            Status::Success => summary.success += 1,
            Status::NoSymbolFound => summary.no_symbol_found += 1,
            Status::Error => summary.error += 1,
        }

        for symbol in outcome.symbols() {
            summary.total_symbols += 1;
            if symbol.payload().is_some() {
                summary.decoded_symbols += 1;
            }
            *summary
                .by_symbol_type
                .entry(symbol.symbol_type())
                .or_insert(0) += 1;
            *summary.by_source.entry(symbol.source()).or_insert(0) += 1;
        }
    }

    summary
}

/// Every outcome of a batch, one per input image, in input order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Report {
    outcomes: Vec<Outcome>,
}

impl Report {
    pub fn new(outcomes: Vec<Outcome>) -> Self {
        Self { outcomes }
    }

    pub fn outcomes(&self) -> &[Outcome] {
        &self.outcomes
    }

    pub fn into_outcomes(self) -> Vec<Outcome> {
        self.outcomes
    }

    /// Recomputes the summary from the current outcomes.
    pub fn summary(&self) -> Summary {
        summarize(&self.outcomes)
    }

    /// One flat row per symbol instance, for tabular export.
    pub fn symbol_rows(&self) -> Vec<SymbolRow<'_>> {
        self.outcomes
            .iter()
            .flat_map(|outcome| {
                outcome.symbols().iter().map(move |symbol| {
                    let (x, y, width, height) = symbol.bbox().to_xywh();
                    SymbolRow {
                        image_id: outcome.image_id().as_str(),
                        detected_type: outcome.detected_type(),
                        symbol_type: symbol.symbol_type(),
                        source: symbol.source(),
                        payload: symbol.payload(),
                        confidence: symbol.confidence(),
                        x,
                        y,
                        width,
                        height,
                    }
                })
            })
            .collect()
    }
}

impl Serialize for Report {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Report", 2)?;
        state.serialize_field("summary", &self.summary())?;
        state.serialize_field("outcomes", &self.outcomes)?;
        state.end()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.summary())?;

        let failed: Vec<&Outcome> = self
            .outcomes
            .iter()
            .filter(|o| o.status() == Status::Error)
            .collect();
        if !failed.is_empty() {
            writeln!(f)?;
            writeln!(f, "Errors ({}):", failed.len())?;
            for outcome in failed {
                writeln!(
                    f,
                    "  - {}: {}",
                    outcome.image_id(),
                    outcome.error_detail().unwrap_or("unknown error")
                )?;
            }
        }

        Ok(())
    }
}

/// A symbol instance flattened with its image, as written to CSV.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SymbolRow<'a> {
    pub image_id: &'a str,
    pub detected_type: Option<CodeKind>,
    pub symbol_type: Symbology,
    pub source: Source,
    pub payload: Option<&'a str>,
    pub confidence: f64,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}
