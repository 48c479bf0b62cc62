use serde_derive::{Deserialize, Serialize};
use std::convert::TryFrom;

use crate::bbox::{BBox, Ltrb};
use crate::error::{Error, Result};

/// Vehicle categories kept from the COCO label set.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(try_from = "i32", into = "i32")]
pub enum VehicleClass {
    Car,
    Motorcycle,
    Bus,
    Truck,
}

impl VehicleClass {
    #[inline]
    pub fn coco_id(self) -> i32 {
        match self {
            VehicleClass::Car => 2,
            VehicleClass::Motorcycle => 3,
            VehicleClass::Bus => 5,
            VehicleClass::Truck => 7,
        }
    }

    #[inline]
    pub fn from_coco(id: i32) -> Option<Self> {
        match id {
            2 => Some(VehicleClass::Car),
            3 => Some(VehicleClass::Motorcycle),
            5 => Some(VehicleClass::Bus),
            7 => Some(VehicleClass::Truck),
            _ => None,
        }
    }
}

impl TryFrom<i32> for VehicleClass {
    type Error = String;

    fn try_from(id: i32) -> std::result::Result<Self, Self::Error> {
        VehicleClass::from_coco(id).ok_or_else(|| format!("class {} is not a vehicle", id))
    }
}

impl From<VehicleClass> for i32 {
    fn from(class: VehicleClass) -> i32 {
        class.coco_id()
    }
}

/// A single vehicle box reported by the detector for one frame
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub bbox: BBox<Ltrb>,
    #[serde(rename = "p")]
    pub confidence: f32,
    #[serde(rename = "c")]
    pub class: VehicleClass,
}

impl Detection {
    pub fn new(bbox: BBox<Ltrb>, confidence: f32, class: VehicleClass) -> Result<Self> {
        if !bbox.is_valid() {
            return Err(Error::InvalidBBox(bbox.into()));
        }

        Ok(Self {
            bbox,
            confidence,
            class,
        })
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.bbox.is_valid() && self.confidence.is_finite()
    }
}

/// A license plate box together with what the text reader made of it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PlateReading {
    pub bbox: BBox<Ltrb>,
    #[serde(rename = "p")]
    pub confidence: f32,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub text_score: f32,
}

impl PlateReading {
    pub fn new(
        bbox: BBox<Ltrb>,
        confidence: f32,
        text: Option<String>,
        text_score: f32,
    ) -> Result<Self> {
        if !bbox.is_valid() {
            return Err(Error::InvalidBBox(bbox.into()));
        }

        Ok(Self {
            bbox,
            confidence,
            text,
            text_score,
        })
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.bbox.is_valid() && self.confidence.is_finite() && self.text_score.is_finite()
    }

    /// Text of a successful reading, `None` when the reader gave up.
    #[inline]
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref().filter(|t| !t.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_degenerate_boxes() {
        let ok = Detection::new(BBox::ltrb(0.0, 0.0, 10.0, 10.0), 0.9, VehicleClass::Car);
        assert!(ok.is_ok());

        let flat = Detection::new(BBox::ltrb(0.0, 5.0, 10.0, 5.0), 0.9, VehicleClass::Car);
        assert!(matches!(flat, Err(Error::InvalidBBox(_))));

        let nan = PlateReading::new(BBox::ltrb(f32::NAN, 0.0, 1.0, 1.0), 0.5, None, 0.0);
        assert!(matches!(nan, Err(Error::InvalidBBox(_))));
    }

    #[test]
    fn test_vehicle_class_from_coco() {
        assert_eq!(VehicleClass::from_coco(2), Some(VehicleClass::Car));
        assert_eq!(VehicleClass::from_coco(7), Some(VehicleClass::Truck));
        assert_eq!(VehicleClass::from_coco(0), None);
    }

    #[test]
    fn test_detection_json_format() {
        let det: Detection =
            serde_json::from_str(r#"{"bbox":[1.0,2.0,30.0,40.0],"p":0.8,"c":5}"#).unwrap();

        assert_eq!(det.class, VehicleClass::Bus);
        assert_eq!(det.bbox.right(), 30.0);

        let bad: std::result::Result<Detection, _> =
            serde_json::from_str(r#"{"bbox":[1.0,2.0,30.0,40.0],"p":0.8,"c":0}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_blank_reading_has_no_text() {
        let bbox = BBox::ltrb(0.0, 0.0, 10.0, 5.0);
        let blank = PlateReading::new(bbox, 0.7, Some("  ".into()), 0.4).unwrap();
        let read = PlateReading::new(bbox, 0.7, Some("AB12CDE".into()), 0.4).unwrap();

        assert_eq!(blank.text(), None);
        assert_eq!(read.text(), Some("AB12CDE"));
    }
}
