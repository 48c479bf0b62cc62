use serde_derive::{Deserialize, Serialize};

use crate::bbox::{BBox, Ltrb};
use crate::detection::PlateReading;
use crate::track::Track;

/// A plate reading attributed to a vehicle track in one frame.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PlateAssociation {
    pub frame_index: u64,
    pub track_id: u32,
    pub vehicle_bbox: BBox<Ltrb>,
    pub plate_bbox: BBox<Ltrb>,
    pub plate_text: String,
    pub text_score: f32,
    pub bbox_score: f32,
}

/// Attributes plates to the vehicle whose box contains them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlateAssociator {
    margin: f32,
}

impl Default for PlateAssociator {
    fn default() -> Self {
        Self::new(4.0)
    }
}

impl PlateAssociator {
    pub fn new(margin: f32) -> Self {
        Self {
            margin: margin.max(0.0),
        }
    }

    #[inline]
    pub fn margin(&self) -> f32 {
        self.margin
    }

    /// Id of the tightest track box fully containing `plate`, `None` when no
    /// track contains it. Equal areas resolve to the lower track id.
    pub fn assign(&self, plate: &BBox<Ltrb>, tracks: &[Track]) -> Option<u32> {
        let mut best: Option<(f32, u32)> = None;

        for track in tracks {
            if !track.bbox.contains(plate, self.margin) {
                continue;
            }

            let area = track.bbox.area();
            let better = match best {
                None => true,
                Some((best_area, best_id)) => {
                    area < best_area || (area == best_area && track.track_id < best_id)
                }
            };

            if better {
                best = Some((area, track.track_id));
            }
        }

        best.map(|(_, id)| id)
    }

    /// Builds the association for a plate reading, `None` when the reader
    /// produced no text or the plate lies inside no track.
    pub fn associate(
        &self,
        frame_index: u64,
        reading: &PlateReading,
        tracks: &[Track],
    ) -> Option<PlateAssociation> {
        let text = reading.text()?;
        let track_id = self.assign(&reading.bbox, tracks)?;
        let vehicle_bbox = tracks.iter().find(|t| t.track_id == track_id)?.bbox;

        Some(PlateAssociation {
            frame_index,
            track_id,
            vehicle_bbox,
            plate_bbox: reading.bbox,
            plate_text: text.to_string(),
            text_score: reading.text_score,
            bbox_score: reading.confidence,
        })
    }
}
