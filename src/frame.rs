use serde_derive::{Deserialize, Serialize};

use crate::detection::{Detection, PlateReading};

/// Everything the detectors and the text reader reported for one video frame.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Frame {
    pub index: u64,
    #[serde(default)]
    pub vehicles: Vec<Detection>,
    #[serde(default)]
    pub plates: Vec<PlateReading>,
}

impl Frame {
    pub fn new(index: u64, vehicles: Vec<Detection>, plates: Vec<PlateReading>) -> Self {
        Self {
            index,
            vehicles,
            plates,
        }
    }

    /// Drops detections with malformed boxes so they never reach the tracker.
    /// Returns the number of dropped entries.
    pub fn sanitize(&mut self) -> usize {
        let before = self.vehicles.len() + self.plates.len();
        let index = self.index;

        self.vehicles.retain(|det| {
            let keep = det.is_valid();
            if !keep {
                log::warn!("frame #{}: rejected vehicle detection {:?}", index, det.bbox);
            }
            keep
        });

        self.plates.retain(|plate| {
            let keep = plate.is_valid();
            if !keep {
                log::warn!("frame #{}: rejected plate detection {:?}", index, plate.bbox);
            }
            keep
        });

        before - self.vehicles.len() - self.plates.len()
    }

    #[inline]
    pub fn vehicle_count(&self) -> usize {
        self.vehicles.len()
    }

    #[inline]
    pub fn plate_count(&self) -> usize {
        self.plates.len()
    }

    /// True when the frame carries neither vehicles nor plates.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty() && self.plates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bbox::BBox;
    use crate::detection::VehicleClass;

    #[test]
    fn test_sanitize_drops_malformed() {
        let good = Detection::new(BBox::ltrb(0.0, 0.0, 50.0, 40.0), 0.9, VehicleClass::Car).unwrap();
        let bad = Detection {
            bbox: BBox::ltrb(-3.0, 0.0, 50.0, 40.0),
            confidence: 0.9,
            class: VehicleClass::Car,
        };
        let plate = PlateReading {
            bbox: BBox::ltrb(10.0, 10.0, 10.0, 20.0),
            confidence: 0.5,
            text: Some("X".into()),
            text_score: 0.5,
        };

        let mut frame = Frame::new(4, vec![good, bad], vec![plate]);

        assert_eq!(frame.sanitize(), 2);
        assert_eq!(frame.vehicles, vec![good]);
        assert_eq!(frame.plate_count(), 0);
        assert!(!frame.is_empty());
    }

    #[test]
    fn test_frame_json_defaults() {
        let frame: Frame = serde_json::from_str(r#"{"index":7}"#).unwrap();

        assert_eq!(frame.index, 7);
        assert!(frame.is_empty());
        assert_eq!(frame.vehicle_count(), 0);
        assert_eq!(frame.plate_count(), 0);
    }
}
