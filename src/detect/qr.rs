//! QR strategy: decoding is the only source of locations.

use tracing::{debug, warn};

use crate::collab::{CollaboratorError, DecodedSymbol, Decoder, Frame, SymbologyFilter};
use crate::model::SymbolResult;

pub(super) fn detect(
    decoder: &dyn Decoder,
    frame: &Frame<'_>,
) -> Result<Vec<SymbolResult>, CollaboratorError> {
    let decoded = decoder.decode(frame, SymbologyFilter::QrFamily)?;
    Ok(decoded_results(frame, decoded, SymbologyFilter::QrFamily))
}

/// Converts decoder output into results, dropping symbologies outside
/// `filter` and boxes that do not survive clamping to the image.
pub(super) fn decoded_results(
    frame: &Frame<'_>,
    decoded: Vec<DecodedSymbol>,
    filter: SymbologyFilter,
) -> Vec<SymbolResult> {
    let mut results = Vec::with_capacity(decoded.len());
    for symbol in decoded {
        if !filter.accepts(symbol.symbology) {
            debug!(
                "{}: ignoring {} symbol outside {:?} request",
                frame.id, symbol.symbology, filter
            );
            continue;
        }
        match symbol.bbox.clamp_to(frame.width(), frame.height()) {
            Some(rect) => results.push(SymbolResult::decoded(
                symbol.symbology,
                rect,
                symbol.payload,
            )),
            None => warn!(
                "{}: discarding decoded {} with unusable box {:?}",
                frame.id, symbol.symbology, symbol.bbox
            ),
        }
    }
    results
}
