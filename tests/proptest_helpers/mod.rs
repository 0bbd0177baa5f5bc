#![allow(dead_code)]

use std::path::PathBuf;

use codescan::model::Symbology;
use proptest::prelude::*;
use proptest::strategy::BoxedStrategy;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

use crate::common::{FakeDecoder, FakeGroundTruth, FakeLocalizer};

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// What the collaborators know about one generated image.
#[derive(Clone, Debug)]
pub enum Scenario {
    /// The decoder reads this many barcodes.
    Decodable(Vec<[f64; 4]>),
    /// Nothing decodes; the localizer finds these boxes.
    Localizable(Vec<[f64; 4]>),
    /// Nothing decodes or localizes; ground truth has these boxes.
    Annotated(Vec<[f64; 4]>),
    /// No source knows anything.
    Blank,
    /// The loader fails.
    Corrupt,
}

impl Scenario {
    pub fn expected_symbols(&self) -> usize {
        match self {
            Scenario::Decodable(boxes) | Scenario::Localizable(boxes) | Scenario::Annotated(boxes) => {
                boxes.len()
            }
            Scenario::Blank | Scenario::Corrupt => 0,
        }
    }
}

/// Boxes that fit the 640x480 frames served by `MemoryLoader`.
pub fn arb_box() -> impl Strategy<Value = [f64; 4]> {
    (0u32..500, 0u32..400, 10u32..100, 10u32..60)
        .prop_map(|(x, y, w, h)| [x as f64, y as f64, w as f64, h as f64])
}

pub fn arb_scenario() -> BoxedStrategy<Scenario> {
    let boxes = || prop::collection::vec(arb_box(), 1..4);
    prop_oneof![
        boxes().prop_map(Scenario::Decodable),
        boxes().prop_map(Scenario::Localizable),
        boxes().prop_map(Scenario::Annotated),
        Just(Scenario::Blank),
        Just(Scenario::Corrupt),
    ]
    .boxed()
}

pub fn arb_batch(max_images: usize) -> BoxedStrategy<Vec<Scenario>> {
    prop::collection::vec(arb_scenario(), 0..=max_images).boxed()
}

/// Image paths and collaborators realising `scenarios`.
pub struct Fixture {
    pub images: Vec<PathBuf>,
    pub decoder: FakeDecoder,
    pub localizer: FakeLocalizer,
    pub ground_truth: FakeGroundTruth,
}

pub fn build_fixture(scenarios: &[Scenario]) -> Fixture {
    let mut images = Vec::with_capacity(scenarios.len());
    let mut decoder = FakeDecoder::default();
    let mut localizer = FakeLocalizer::default();
    let mut ground_truth = FakeGroundTruth::default();

    for (index, scenario) in scenarios.iter().enumerate() {
        let name = match scenario {
            Scenario::Corrupt => format!("corrupt_{index:03}.jpg"),
            _ => format!("img_{index:03}.jpg"),
        };
        match scenario {
            Scenario::Decodable(boxes) => {
                for (n, xywh) in boxes.iter().enumerate() {
                    decoder = decoder.with(&name, Symbology::Code128, &format!("{index}-{n}"), *xywh);
                }
            }
            Scenario::Localizable(boxes) => {
                for xywh in boxes {
                    localizer = localizer.with(&name, Some(0.75), *xywh);
                }
            }
            Scenario::Annotated(boxes) => {
                for xywh in boxes {
                    ground_truth = ground_truth.with(&name, *xywh);
                }
            }
            Scenario::Blank | Scenario::Corrupt => {}
        }
        images.push(PathBuf::from(name));
    }

    Fixture {
        images,
        decoder,
        localizer,
        ground_truth,
    }
}
