use chrono::{DateTime, Utc};
use serde_derive::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

use crate::error::Result;
use crate::plate::PlateAssociation;
use crate::registry::{normalize_plate, Registry, VehicleRecord};

/// Normalized plates already looked up during the current run.
#[derive(Debug, Clone, Default)]
pub struct SeenPlateSet {
    plates: HashSet<String>,
}

impl SeenPlateSet {
    #[inline]
    pub fn contains(&self, normalized: &str) -> bool {
        self.plates.contains(normalized)
    }

    /// Returns false when the plate was already present.
    #[inline]
    pub fn insert(&mut self, normalized: String) -> bool {
        self.plates.insert(normalized)
    }

    /// Returns false when the plate was not present.
    #[inline]
    pub fn remove(&mut self, normalized: &str) -> bool {
        self.plates.remove(normalized)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.plates.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.plates.is_empty()
    }
}

/// Produced once per registered plate per run.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CorrelationEvent {
    pub plate_text: String,
    pub vehicle: VehicleRecord,
    pub track_id: u32,
    pub frame_index: u64,
    pub timecode: String,
    pub confidence: f32,
    pub video_source: String,
    pub image_path: Option<PathBuf>,
    pub detected_at: DateTime<Utc>,
}

impl CorrelationEvent {
    /// Attaches the exported frame; call before the event is persisted.
    pub fn with_image_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.image_path = Some(path.into());
        self
    }
}

/// `HH:MM:SS` offset of a frame into the video, `00:00:00` when fps is unknown.
pub fn timecode(frame_index: u64, fps: f64) -> String {
    let seconds = if fps > 0.0 {
        (frame_index as f64 / fps) as u64
    } else {
        0
    };

    format!(
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        (seconds % 3600) / 60,
        seconds % 60
    )
}

/// Turns plate associations into at most one registry lookup, and at most
/// one event, per distinct plate per run.
#[derive(Debug)]
pub struct CorrelationEngine<R> {
    registry: R,
    seen: SeenPlateSet,
    fps: f64,
    video_source: String,
    lookups: u64,
}

impl<R: Registry> CorrelationEngine<R> {
    pub fn new<S: Into<String>>(registry: R, fps: f64, video_source: S) -> Self {
        Self {
            registry,
            seen: SeenPlateSet::default(),
            fps,
            video_source: video_source.into(),
            lookups: 0,
        }
    }

    #[inline]
    pub fn seen(&self) -> &SeenPlateSet {
        &self.seen
    }

    /// Number of registry lookups issued so far, failed ones included.
    #[inline]
    pub fn lookups(&self) -> u64 {
        self.lookups
    }

    #[inline]
    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// Rolls back a plate marked seen by [`observe`](Self::observe), so a
    /// later frame carrying it is looked up again. Used when the event built
    /// for it could not be persisted.
    pub fn forget(&mut self, plate_text: &str) -> bool {
        self.seen.remove(&normalize_plate(plate_text))
    }

    /// Registry failures are returned without marking the plate as seen, so a
    /// later frame carrying the same plate retries the lookup.
    pub fn observe(&mut self, association: &PlateAssociation) -> Result<Option<CorrelationEvent>> {
        let plate = normalize_plate(&association.plate_text);

        if plate.is_empty() || self.seen.contains(&plate) {
            return Ok(None);
        }

        self.lookups += 1;
        let found = self.registry.lookup(&plate)?;
        self.seen.insert(plate.clone());

        let vehicle = match found {
            Some(vehicle) => vehicle,
            None => {
                log::debug!("plate {} is not registered", plate);
                return Ok(None);
            }
        };

        log::info!(
            "plate {} matched registry record #{} at frame {} (track #{})",
            plate,
            vehicle.id,
            association.frame_index,
            association.track_id
        );

        Ok(Some(CorrelationEvent {
            plate_text: plate,
            vehicle,
            track_id: association.track_id,
            frame_index: association.frame_index,
            timecode: timecode(association.frame_index, self.fps),
            confidence: association.text_score,
            video_source: self.video_source.clone(),
            image_path: None,
            detected_at: Utc::now(),
        }))
    }
}
