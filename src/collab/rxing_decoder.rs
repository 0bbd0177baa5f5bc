//! Linear and 2D barcode decoding backed by `rxing`.

use std::panic::{self, AssertUnwindSafe};

use rxing::BarcodeFormat;
use tracing::debug;

use super::{CollaboratorError, DecodedSymbol, Decoder, Frame, SymbologyFilter};
use crate::model::{BBox, Pixel, Symbology};

/// Smallest extent, in pixels, a decoded box may have on either axis.
///
/// Linear formats report the two ends of the scan line they were read on,
/// so their boxes arrive with no height.
const MIN_EXTENT: f64 = 2.0;

/// Height of the band drawn around a linear barcode's scan line, as a
/// fraction of the decoded width.
const LINEAR_BAND_RATIO: f64 = 0.25;

/// A [`Decoder`] for every format `rxing` reads. Results outside the
/// requested filter are dropped.
#[derive(Clone, Copy, Debug, Default)]
pub struct RxingDecoder;

impl Decoder for RxingDecoder {
    fn decode(
        &self,
        frame: &Frame<'_>,
        filter: SymbologyFilter,
    ) -> Result<Vec<DecodedSymbol>, CollaboratorError> {
        let luma = frame.pixels.to_luma8();
        let (width, height) = luma.dimensions();
        if width == 0 || height == 0 {
            return Ok(Vec::new());
        }

        let results = panic::catch_unwind(AssertUnwindSafe(|| {
            rxing::helpers::detect_multiple_in_luma(luma.into_raw(), width, height)
        }))
        .map_err(|_| {
            CollaboratorError::Failed(format!("barcode decoder panicked on {}", frame.id))
        })?;

        // rxing reports "nothing found" as an error.
        let results = match results {
            Ok(results) => results,
            Err(err) => {
                debug!("{}: rxing found nothing: {err}", frame.id);
                return Ok(Vec::new());
            }
        };

        let mut symbols = Vec::with_capacity(results.len());
        for result in results {
            let Some(symbology) = symbology_for(result.getBarcodeFormat()) else {
                debug!(
                    "{}: skipping unsupported format {:?}",
                    frame.id,
                    result.getBarcodeFormat()
                );
                continue;
            };
            if !filter.accepts(symbology) {
                continue;
            }

            let corners = result.getPoints().iter().map(|p| (p.x as f64, p.y as f64));
            let Some(bbox) = BBox::from_points(corners) else {
                debug!("{}: {symbology} result without points", frame.id);
                continue;
            };

            symbols.push(DecodedSymbol {
                bbox: widen_scan_line(bbox),
                payload: result.getText().to_string(),
                symbology,
            });
        }
        Ok(symbols)
    }
}

pub fn symbology_for(format: &BarcodeFormat) -> Option<Symbology> {
    let symbology = match format {
        BarcodeFormat::QR_CODE | BarcodeFormat::MICRO_QR_CODE => Symbology::Qr,
        BarcodeFormat::EAN_13 => Symbology::Ean13,
        BarcodeFormat::EAN_8 => Symbology::Ean8,
        BarcodeFormat::UPC_A => Symbology::UpcA,
        BarcodeFormat::UPC_E => Symbology::UpcE,
        BarcodeFormat::CODE_128 => Symbology::Code128,
        BarcodeFormat::CODE_39 => Symbology::Code39,
        BarcodeFormat::CODE_93 => Symbology::Code93,
        BarcodeFormat::ITF => Symbology::Itf,
        BarcodeFormat::CODABAR => Symbology::Codabar,
        BarcodeFormat::DATA_MATRIX => Symbology::DataMatrix,
        BarcodeFormat::PDF_417 => Symbology::Pdf417,
        BarcodeFormat::AZTEC => Symbology::Aztec,
        _ => return None,
    };
    Some(symbology)
}

/// Grows a degenerate box into a band around its scan line.
fn widen_scan_line(bbox: BBox<Pixel>) -> BBox<Pixel> {
    let band = (bbox.width() * LINEAR_BAND_RATIO).max(MIN_EXTENT);
    let (mut xmin, mut ymin, mut xmax, mut ymax) = (bbox.xmin, bbox.ymin, bbox.xmax, bbox.ymax);
    if bbox.width() < MIN_EXTENT {
        let cx = (xmin + xmax) / 2.0;
        xmin = cx - band / 2.0;
        xmax = cx + band / 2.0;
    }
    if bbox.height() < MIN_EXTENT {
        let cy = (ymin + ymax) / 2.0;
        ymin = cy - band / 2.0;
        ymax = cy + band / 2.0;
    }
    BBox::from_xyxy(xmin, ymin, xmax, ymax)
}

/// The decoder the CLI uses: `rqrr` for QR requests, `rxing` for the rest.
#[derive(Clone, Copy, Debug, Default)]
pub struct StandardDecoder {
    qr: super::RqrrDecoder,
    barcode: RxingDecoder,
}

impl Decoder for StandardDecoder {
    fn decode(
        &self,
        frame: &Frame<'_>,
        filter: SymbologyFilter,
    ) -> Result<Vec<DecodedSymbol>, CollaboratorError> {
        match filter {
            SymbologyFilter::QrFamily => self.qr.decode(frame, filter),
            SymbologyFilter::NonQr => self.barcode.decode(frame, filter),
        }
    }
}
