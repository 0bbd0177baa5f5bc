//! Scan configuration loaded from YAML.
//!
//! Every field has a default, so a config file only needs to name the values
//! it changes:
//!
//! ```yaml
//! detection:
//!   ground_truth_confidence: 0.8
//! batch:
//!   jobs: 4
//! ```

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::ScanError;

/// Confidence given to ground-truth fallback boxes: the location is verified,
/// the content is not.
pub const GROUND_TRUTH_CONFIDENCE: f64 = 0.9;

/// Confidence given to localizer boxes when the model reports no score.
pub const LOCALIZER_DEFAULT_CONFIDENCE: f64 = 0.5;

const DEFAULT_IMAGE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "bmp", "tiff", "tif"];

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanConfig {
    pub detection: DetectionConfig,
    pub input: InputConfig,
    pub visualization: VisualizationConfig,
    pub batch: BatchConfig,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DetectionConfig {
    pub localizer_default_confidence: f64,
    /// Must stay below 1.0 so fallback boxes never look decoded.
    pub ground_truth_confidence: f64,
    /// Consult ground-truth annotations when decoding and localization fail.
    pub use_annotations: bool,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            localizer_default_confidence: LOCALIZER_DEFAULT_CONFIDENCE,
            ground_truth_confidence: GROUND_TRUTH_CONFIDENCE,
            use_annotations: true,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InputConfig {
    /// Case-insensitive, without the leading dot.
    pub image_extensions: Vec<String>,
    pub recursive: bool,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            image_extensions: DEFAULT_IMAGE_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            recursive: true,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VisualizationConfig {
    pub box_thickness: u32,
    /// Appended to the image stem for annotated copies.
    pub suffix: String,
}

impl Default for VisualizationConfig {
    fn default() -> Self {
        Self {
            box_thickness: 2,
            suffix: "_detected".to_string(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatchConfig {
    /// Worker threads; 1 processes images sequentially.
    pub jobs: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { jobs: 1 }
    }
}

impl ScanConfig {
    /// Reads and validates a YAML config file.
    pub fn load(path: &Path) -> Result<Self, ScanError> {
        let data = fs::read_to_string(path)?;
        let config = Self::from_yaml_str(&data).map_err(|source| ScanError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Parses YAML without validating.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, serde_yaml::Error> {
        // An empty document deserializes to `null`; treat it as all defaults.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml)
    }

    /// Rejects values the pipeline cannot honour.
    pub fn validate(&self) -> Result<(), ScanError> {
        let det = &self.detection;
        if !(0.0..=1.0).contains(&det.localizer_default_confidence) {
            return Err(ScanError::InvalidArgument(format!(
                "detection.localizer_default_confidence must be within [0, 1], got {}",
                det.localizer_default_confidence
            )));
        }
        if !(0.0..1.0).contains(&det.ground_truth_confidence) {
            return Err(ScanError::InvalidArgument(format!(
                "detection.ground_truth_confidence must be within [0, 1), got {}",
                det.ground_truth_confidence
            )));
        }
        if self.input.image_extensions.is_empty() {
            return Err(ScanError::InvalidArgument(
                "input.image_extensions must not be empty".to_string(),
            ));
        }
        if self.visualization.box_thickness == 0 {
            return Err(ScanError::InvalidArgument(
                "visualization.box_thickness must be at least 1".to_string(),
            ));
        }
        if self.batch.jobs == 0 {
            return Err(ScanError::InvalidArgument(
                "batch.jobs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
