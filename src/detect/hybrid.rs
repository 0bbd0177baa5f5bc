//! Barcode strategy: decode first, then fall back to located-only boxes.

use tracing::{debug, warn};

use super::{qr, Detector};
use crate::collab::{CollaboratorError, Frame, SymbologyFilter};
use crate::model::SymbolResult;

/// A secondary source of symbol locations for undecodable barcode images.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FallbackSource {
    Localizer,
    GroundTruth,
}

/// Fallback sources in the order they are consulted. The first one that
/// yields at least one box wins.
pub const FALLBACK_ORDER: [FallbackSource; 2] =
    [FallbackSource::Localizer, FallbackSource::GroundTruth];

impl Detector<'_> {
    pub(super) fn detect_barcode(
        &self,
        frame: &Frame<'_>,
    ) -> Result<Vec<SymbolResult>, CollaboratorError> {
        let decoded = self.decoder.decode(frame, SymbologyFilter::NonQr)?;
        let decoded = qr::decoded_results(frame, decoded, SymbologyFilter::NonQr);
        if !decoded.is_empty() {
            return Ok(decoded);
        }

        for source in FALLBACK_ORDER {
            let located = self.fallback(source, frame)?;
            if !located.is_empty() {
                debug!(
                    "{}: {} box(es) from {:?} fallback",
                    frame.id,
                    located.len(),
                    source
                );
                return Ok(located);
            }
        }

        Ok(Vec::new())
    }

    /// Boxes from a single fallback source. An unconfigured source yields an
    /// empty list.
    ///
    /// Overlapping boxes are kept as separate results.
    pub fn fallback(
        &self,
        source: FallbackSource,
        frame: &Frame<'_>,
    ) -> Result<Vec<SymbolResult>, CollaboratorError> {
        match source {
            FallbackSource::Localizer => self.from_localizer(frame),
            FallbackSource::GroundTruth => self.from_ground_truth(frame),
        }
    }

    fn from_localizer(&self, frame: &Frame<'_>) -> Result<Vec<SymbolResult>, CollaboratorError> {
        let Some(localizer) = self.localizer else {
            return Ok(Vec::new());
        };

        let found = localizer.locate(frame)?;
        // The class label is a sanity check on the box count, never a filter.
        if let Some(first) = found.first() {
            if !first.class_label.agrees_with(found.len()) {
                warn!(
                    "{}: localizer labelled {:?} but returned {} box(es); keeping all boxes",
                    frame.id,
                    first.class_label,
                    found.len()
                );
            }
        }

        let mut results = Vec::with_capacity(found.len());
        for loc in found {
            let Some(rect) = loc.bbox.clamp_to(frame.width(), frame.height()) else {
                warn!("{}: discarding localizer box {:?}", frame.id, loc.bbox);
                continue;
            };
            let confidence = loc.confidence.unwrap_or(self.localizer_default_confidence);
            results.push(SymbolResult::localized(rect, confidence));
        }
        Ok(results)
    }

    fn from_ground_truth(&self, frame: &Frame<'_>) -> Result<Vec<SymbolResult>, CollaboratorError> {
        let Some(ground_truth) = self.ground_truth else {
            return Ok(Vec::new());
        };

        let boxes = ground_truth.lookup(frame.id)?;
        let mut results = Vec::with_capacity(boxes.len());
        for bbox in boxes {
            let Some(rect) = bbox.clamp_to(frame.width(), frame.height()) else {
                warn!("{}: discarding annotated box {:?}", frame.id, bbox);
                continue;
            };
            results.push(SymbolResult::from_ground_truth(
                rect,
                self.ground_truth_confidence,
            ));
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::ClassLabel;
    use crate::detect::mocks::{ScriptedDecoder, ScriptedGroundTruth, ScriptedLocalizer};
    use crate::detect::Strategy;
    use crate::model::{ImageId, Source, Symbology};
    use image::DynamicImage;

    fn pixels() -> DynamicImage {
        DynamicImage::new_rgb8(640, 480)
    }

    #[test]
    fn decode_wins_over_fallbacks() {
        let decoder = ScriptedDecoder::default().with(
            "a.jpg",
            Symbology::Ean13,
            "4006381333931",
            [50.0, 60.0, 300.0, 120.0],
        );
        let localizer = ScriptedLocalizer::default().with(
            "a.jpg",
            ClassLabel::Single,
            Some(0.8),
            [0.0, 0.0, 10.0, 10.0],
        );
        let gt = ScriptedGroundTruth::default().with("a.jpg", [10.0, 20.0, 100.0, 40.0]);
        let detector = Detector::new(&decoder)
            .with_localizer(&localizer)
            .with_ground_truth(&gt);

        let id = ImageId::new("a.jpg");
        let px = pixels();
        let results = detector
            .detect(Strategy::Barcode, &Frame::new(&id, &px))
            .expect("detect");

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].source(), Source::Decoded);
        assert_eq!(results[0].confidence(), 1.0);
        assert_eq!(results[0].payload(), Some("4006381333931"));
    }

    #[test]
    fn qr_decodes_do_not_count_as_barcodes() {
        let decoder = ScriptedDecoder::default().with("a.jpg", Symbology::Qr, "qr", [0.0, 0.0, 40.0, 40.0]);
        let gt = ScriptedGroundTruth::default().with("a.jpg", [10.0, 20.0, 100.0, 40.0]);
        let detector = Detector::new(&decoder).with_ground_truth(&gt);

        let id = ImageId::new("a.jpg");
        let px = pixels();
        let results = detector
            .detect(Strategy::Barcode, &Frame::new(&id, &px))
            .expect("detect");

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].source(), Source::GroundTruthFallback);
    }

    #[test]
    fn localizer_boxes_used_when_decode_fails() {
        let decoder = ScriptedDecoder::default();
        let localizer = ScriptedLocalizer::default()
            .with("b.jpg", ClassLabel::Multiple, Some(0.77), [10.0, 10.0, 80.0, 30.0])
            .with("b.jpg", ClassLabel::Multiple, None, [200.0, 10.0, 80.0, 30.0]);
        let gt = ScriptedGroundTruth::default().with("b.jpg", [10.0, 20.0, 100.0, 40.0]);
        let detector = Detector::new(&decoder)
            .with_localizer(&localizer)
            .with_ground_truth(&gt);

        let id = ImageId::new("b.jpg");
        let px = pixels();
        let results = detector
            .detect(Strategy::Barcode, &Frame::new(&id, &px))
            .expect("detect");

        assert_eq!(results.len(), 2);
        assert!(results
            .iter()
            .all(|r| r.source() == Source::LocalizerFallback && r.payload().is_none()));
        assert_eq!(results[0].confidence(), 0.77);
        assert_eq!(results[1].confidence(), 0.5);
    }

    #[test]
    fn ground_truth_used_when_localizer_is_empty() {
        let decoder = ScriptedDecoder::default();
        let localizer = ScriptedLocalizer::default();
        let gt = ScriptedGroundTruth::default().with("c.jpg", [10.0, 20.0, 100.0, 40.0]);
        let detector = Detector::new(&decoder)
            .with_localizer(&localizer)
            .with_ground_truth(&gt);

        let id = ImageId::new("c.jpg");
        let px = pixels();
        let results = detector
            .detect(Strategy::Barcode, &Frame::new(&id, &px))
            .expect("detect");

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].source(), Source::GroundTruthFallback);
        assert_eq!(results[0].bbox().to_xywh(), (10, 20, 100, 40));
        assert!(results[0].payload().is_none());
        assert_eq!(results[0].confidence(), 0.9);
    }

    #[test]
    fn ground_truth_used_when_localizer_is_unavailable() {
        let decoder = ScriptedDecoder::default();
        let gt = ScriptedGroundTruth::default()
            .with("d.jpg", [10.0, 20.0, 100.0, 40.0])
            .with("d.jpg", [30.0, 25.0, 100.0, 40.0]);
        let detector = Detector::new(&decoder).with_ground_truth(&gt);

        let id = ImageId::new("d.jpg");
        let px = pixels();
        let results = detector
            .detect(Strategy::Barcode, &Frame::new(&id, &px))
            .expect("detect");

        // Overlapping annotations stay separate.
        assert_eq!(results.len(), 2);
        assert!(results
            .iter()
            .all(|r| r.source() == Source::GroundTruthFallback));
    }

    #[test]
    fn class_label_disagreement_keeps_boxes() {
        let decoder = ScriptedDecoder::default();
        let localizer = ScriptedLocalizer::default()
            .with("e.jpg", ClassLabel::Single, Some(0.6), [10.0, 10.0, 80.0, 30.0])
            .with("e.jpg", ClassLabel::Single, Some(0.4), [200.0, 10.0, 80.0, 30.0])
            .with("e.jpg", ClassLabel::Single, Some(0.3), [300.0, 10.0, 80.0, 30.0]);
        let detector = Detector::new(&decoder).with_localizer(&localizer);

        let id = ImageId::new("e.jpg");
        let px = pixels();
        let results = detector
            .fallback(FallbackSource::Localizer, &Frame::new(&id, &px))
            .expect("fallback");
        assert_eq!(results.len(), 3);
    }

    #[test]
    fn unusable_fallback_boxes_fall_through() {
        let decoder = ScriptedDecoder::default();
        let localizer = ScriptedLocalizer::default().with(
            "f.jpg",
            ClassLabel::Single,
            Some(0.9),
            [900.0, 900.0, 50.0, 50.0],
        );
        let gt = ScriptedGroundTruth::default().with("f.jpg", [10.0, 20.0, 100.0, 40.0]);
        let detector = Detector::new(&decoder)
            .with_localizer(&localizer)
            .with_ground_truth(&gt);

        let id = ImageId::new("f.jpg");
        let px = pixels();
        let results = detector
            .detect(Strategy::Barcode, &Frame::new(&id, &px))
            .expect("detect");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].source(), Source::GroundTruthFallback);
    }

    #[test]
    fn no_source_means_no_symbols() {
        let decoder = ScriptedDecoder::default();
        let localizer = ScriptedLocalizer::default();
        let gt = ScriptedGroundTruth::default();
        let detector = Detector::new(&decoder)
            .with_localizer(&localizer)
            .with_ground_truth(&gt);

        let id = ImageId::new("g.jpg");
        let px = pixels();
        assert!(detector
            .detect(Strategy::Barcode, &Frame::new(&id, &px))
            .expect("detect")
            .is_empty());
    }

    #[test]
    fn configured_confidences_apply() {
        let decoder = ScriptedDecoder::default();
        let gt = ScriptedGroundTruth::default().with("h.jpg", [10.0, 20.0, 100.0, 40.0]);
        let config = crate::config::DetectionConfig {
            ground_truth_confidence: 0.75,
            ..Default::default()
        };
        let detector = Detector::new(&decoder)
            .with_ground_truth(&gt)
            .with_config(&config);

        let id = ImageId::new("h.jpg");
        let px = pixels();
        let results = detector
            .fallback(FallbackSource::GroundTruth, &Frame::new(&id, &px))
            .expect("fallback");
        assert_eq!(results[0].confidence(), 0.75);
    }
}
