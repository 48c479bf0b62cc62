use serde_derive::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};

/// Tunables of the multi-object tracker.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct TrackerConfig {
    /// minimum IoU for a track/detection pair to be matched
    pub iou_threshold: f32,
    /// consecutive hits before a track is confirmed
    pub min_hits: u32,
    /// frames a track may go unmatched before it is deleted
    pub max_age: u32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            iou_threshold: 0.3,
            min_hits: 3,
            max_age: 1,
        }
    }
}

impl TrackerConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.iou_threshold > 0.0 && self.iou_threshold <= 1.0) {
            return Err(Error::Config(format!(
                "iou_threshold must be in (0, 1], got {}",
                self.iou_threshold
            )));
        }

        if self.min_hits == 0 {
            return Err(Error::Config("min_hits must be at least 1".into()));
        }

        Ok(())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct DetectorConfig {
    pub confidence_threshold: f32,
    /// COCO class ids accepted as vehicles
    pub vehicle_classes: Vec<i32>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.25,
            vehicle_classes: vec![2, 3, 5, 7],
        }
    }
}

/// Settings of one processing run over a single video stream.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    pub tracker: TrackerConfig,
    pub detector: DetectorConfig,
    /// slack in px when testing whether a plate lies inside a vehicle box
    pub plate_margin: f32,
    pub fps: f64,
    pub video_source: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            tracker: TrackerConfig::default(),
            detector: DetectorConfig::default(),
            plate_margin: 4.0,
            fps: 25.0,
            video_source: String::new(),
        }
    }
}

impl PipelineConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let config: PipelineConfig = serde_json::from_reader(std::io::BufReader::new(file))?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.tracker.validate()?;

        if !(self.plate_margin >= 0.0 && self.plate_margin.is_finite()) {
            return Err(Error::Config(format!(
                "plate_margin must be a non-negative number, got {}",
                self.plate_margin
            )));
        }

        if !self.fps.is_finite() {
            return Err(Error::Config(format!("fps must be finite, got {}", self.fps)));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TrackerConfig::default();

        assert_eq!(config.iou_threshold, 0.3);
        assert_eq!(config.min_hits, 3);
        assert_eq!(config.max_age, 1);
        assert!(PipelineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_falls_back_to_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"tracker":{"min_hits":5},"fps":30.0}"#).unwrap();

        assert_eq!(config.tracker.min_hits, 5);
        assert_eq!(config.tracker.max_age, 1);
        assert_eq!(config.fps, 30.0);
        assert_eq!(config.detector.vehicle_classes, vec![2, 3, 5, 7]);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = PipelineConfig::default();
        config.tracker.iou_threshold = 0.0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = PipelineConfig::default();
        config.tracker.min_hits = 0;
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.plate_margin = -1.0;
        assert!(config.validate().is_err());
    }
}
