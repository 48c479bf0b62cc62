use crate::bbox::{BBox, Ltrb};
use crate::config::DetectorConfig;
use crate::detection::{Detection, PlateReading, VehicleClass};
use crate::error::Result;
use crate::frame::Frame;

/// Box reported by an object detection model, before any filtering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawDetection {
    pub bbox: BBox<Ltrb>,
    pub confidence: f32,
    pub class: i32,
}

/// Object detection model run once per frame.
pub trait ObjectDetector<I> {
    fn detect(&mut self, image: &I) -> Result<Vec<RawDetection>>;
}

/// Plate text reader. Returns `None` when nothing legible was found.
pub trait TextReader<I> {
    fn read(&mut self, image: &I, region: &BBox<Ltrb>) -> Result<Option<(String, f32)>>;
}

/// Runs the vehicle detector, the plate detector and the text reader on a
/// frame image and assembles a validated [`Frame`].
pub struct FrameBuilder<V, P, R> {
    vehicle_detector: V,
    plate_detector: P,
    reader: R,
    config: DetectorConfig,
}

impl<V, P, R> FrameBuilder<V, P, R> {
    pub fn new(vehicle_detector: V, plate_detector: P, reader: R, config: DetectorConfig) -> Self {
        Self {
            vehicle_detector,
            plate_detector,
            reader,
            config,
        }
    }

    #[inline]
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    fn vehicle(&self, frame_index: u64, raw: &RawDetection) -> Option<Detection> {
        if raw.confidence <= self.config.confidence_threshold
            || !self.config.vehicle_classes.contains(&raw.class)
        {
            return None;
        }

        let class = VehicleClass::from_coco(raw.class)?;

        match Detection::new(raw.bbox, raw.confidence, class) {
            Ok(det) => Some(det),
            Err(err) => {
                log::warn!("frame #{}: {}", frame_index, err);
                None
            }
        }
    }

    pub fn build<I>(&mut self, index: u64, image: &I) -> Result<Frame>
    where
        V: ObjectDetector<I>,
        P: ObjectDetector<I>,
        R: TextReader<I>,
    {
        let raw_vehicles = self.vehicle_detector.detect(image)?;
        let vehicles = raw_vehicles
            .iter()
            .filter_map(|raw| self.vehicle(index, raw))
            .collect();

        let mut plates = Vec::new();
        for raw in self.plate_detector.detect(image)? {
            if !raw.bbox.is_valid() {
                log::warn!("frame #{}: rejected plate detection {:?}", index, raw.bbox);
                continue;
            }

            let (text, text_score) = match self.reader.read(image, &raw.bbox) {
                Ok(Some((text, score))) => (Some(text), score),
                Ok(None) => (None, 0.0),
                Err(err) => {
                    log::warn!("frame #{}: plate reader failed: {}", index, err);
                    (None, 0.0)
                }
            };

            plates.push(PlateReading::new(raw.bbox, raw.confidence, text, text_score)?);
        }

        let mut frame = Frame::new(index, vehicles, plates);
        frame.sanitize();

        Ok(frame)
    }
}
