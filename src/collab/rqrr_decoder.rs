//! QR decoding backed by `rqrr`.

use std::panic::{self, AssertUnwindSafe};

use image::GrayImage;
use tracing::debug;

use super::{CollaboratorError, DecodedSymbol, Decoder, Frame, SymbologyFilter};
use crate::model::{BBox, Symbology};

/// A [`Decoder`] that reads QR codes with `rqrr`.
///
/// `rqrr` has no linear-barcode support, so a [`SymbologyFilter::NonQr`]
/// request always returns an empty list. [`super::StandardDecoder`] pairs it
/// with [`super::RxingDecoder`] for those.
#[derive(Clone, Copy, Debug, Default)]
pub struct RqrrDecoder;

impl Decoder for RqrrDecoder {
    fn decode(
        &self,
        frame: &Frame<'_>,
        filter: SymbologyFilter,
    ) -> Result<Vec<DecodedSymbol>, CollaboratorError> {
        if !filter.accepts(Symbology::Qr) {
            return Ok(Vec::new());
        }

        let luma = frame.pixels.to_luma8();
        if luma.width() == 0 || luma.height() == 0 {
            return Ok(Vec::new());
        }

        panic::catch_unwind(AssertUnwindSafe(|| scan_luma(&luma))).map_err(|_| {
            CollaboratorError::Failed(format!("QR decoder panicked on {}", frame.id))
        })
    }
}

fn scan_luma(luma: &GrayImage) -> Vec<DecodedSymbol> {
    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
        luma.width() as usize,
        luma.height() as usize,
        |x, y| luma.get_pixel(x as u32, y as u32)[0],
    );

    let grids = prepared.detect_grids();
    let mut symbols = Vec::with_capacity(grids.len());

    for grid in grids {
        let content = match grid.decode() {
            Ok((_meta, content)) => content,
            Err(err) => {
                debug!("QR grid found but not decodable: {err:?}");
                continue;
            }
        };

        let corners = grid.bounds.iter().map(|p| (p.x as f64, p.y as f64));
        let Some(bbox) = BBox::from_points(corners) else {
            continue;
        };

        symbols.push(DecodedSymbol {
            bbox,
            payload: content,
            symbology: Symbology::Qr,
        });
    }

    symbols
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::{Detector, Strategy};
    use crate::model::{ImageId, Source};
    use image::DynamicImage;

    #[test]
    fn blank_image_decodes_to_nothing() {
        let id = ImageId::new("blank.png");
        let pixels = DynamicImage::ImageLuma8(GrayImage::from_pixel(64, 64, image::Luma([255])));
        let frame = Frame::new(&id, &pixels);

        let symbols = RqrrDecoder
            .decode(&frame, SymbologyFilter::QrFamily)
            .expect("blank image is not an error");
        assert!(symbols.is_empty());
    }

    /// Renders `contents` at 6 px per module with a 4-module quiet zone.
    fn qr_image(contents: &str) -> DynamicImage {
        let code = qrcode::QrCode::new(contents.as_bytes()).expect("encode qr");
        let modules = code.width() as u32;
        let colors = code.to_colors();
        let (scale, quiet) = (6u32, 4u32);
        let side = (modules + 2 * quiet) * scale;

        let mut img = GrayImage::from_pixel(side, side, image::Luma([255]));
        for (i, color) in colors.iter().enumerate() {
            if *color != qrcode::Color::Dark {
                continue;
            }
            let (mx, my) = (i as u32 % modules, i as u32 / modules);
            for dy in 0..scale {
                for dx in 0..scale {
                    img.put_pixel((mx + quiet) * scale + dx, (my + quiet) * scale + dy, image::Luma([0]));
                }
            }
        }
        DynamicImage::ImageLuma8(img)
    }

    #[test]
    fn reads_rendered_qr() {
        let id = ImageId::new("menu.png");
        let pixels = qr_image("https://example.com/menu");
        let frame = Frame::new(&id, &pixels);

        let symbols = RqrrDecoder
            .decode(&frame, SymbologyFilter::QrFamily)
            .expect("decode");

        assert_eq!(symbols.len(), 1);
        assert_eq!(symbols[0].symbology, Symbology::Qr);
        assert_eq!(symbols[0].payload, "https://example.com/menu");
        let rect = symbols[0]
            .bbox
            .clamp_to(pixels.width(), pixels.height())
            .expect("usable box");
        // The symbol sits inside the quiet zone, away from the image edges.
        assert!(rect.x() >= 20 && rect.y() >= 20);
        assert!(rect.right() <= pixels.width() - 20);
        assert!(rect.bottom() <= pixels.height() - 20);
    }

    #[test]
    fn qr_strategy_reports_decoded_symbol() {
        let id = ImageId::new("menu.png");
        let pixels = qr_image("codescan");
        let detector = Detector::new(&RqrrDecoder);

        let results = detector
            .detect(Strategy::Qr, &Frame::new(&id, &pixels))
            .expect("detect");

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].source(), Source::Decoded);
        assert_eq!(results[0].confidence(), 1.0);
        assert_eq!(results[0].payload(), Some("codescan"));
        assert!(results[0].bbox().fits_within(pixels.width(), pixels.height()));
    }

    #[test]
    fn non_qr_requests_are_empty() {
        let id = ImageId::new("shelf.png");
        let pixels = DynamicImage::ImageLuma8(GrayImage::new(32, 32));
        let frame = Frame::new(&id, &pixels);

        let symbols = RqrrDecoder
            .decode(&frame, SymbologyFilter::NonQr)
            .expect("decode");
        assert!(symbols.is_empty());
    }
}
