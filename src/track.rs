use crate::bbox::{BBox, Ltrb};
use crate::detection::{Detection, VehicleClass};
use crate::kalman::{KalmanFilter, MotionState};

///
/// Lifecycle of a track. Newly created tracks are `Tentative` until they
/// collect `min_hits` consecutive matches, then become `Confirmed`. Tracks
/// missing for more than `max_age` frames become `Deleted` and are removed at
/// the end of that frame.
///
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TrackState {
    Tentative,
    Confirmed,
    Deleted,
}

/// One physically continuous vehicle followed across frames.
#[derive(Debug, Clone)]
pub struct Track {
    pub track_id: u32,
    pub state: TrackState,
    pub bbox: BBox<Ltrb>,
    pub class: VehicleClass,
    pub confidence: f32,

    // consecutive frames with a matched detection
    pub hit_streak: u32,
    pub hits: u32,
    pub age: u32,
    pub time_since_update: u32,

    motion: MotionState,
}

impl Track {
    pub(crate) fn new(track_id: u32, kf: &KalmanFilter, det: &Detection) -> Self {
        Self {
            track_id,
            state: TrackState::Tentative,
            bbox: det.bbox,
            class: det.class,
            confidence: det.confidence,
            hit_streak: 1,
            hits: 1,
            age: 1,
            time_since_update: 0,
            motion: kf.initiate(&det.bbox.as_xyah()),
        }
    }

    #[inline]
    pub fn motion(&self) -> &MotionState {
        &self.motion
    }

    /// Propagates the motion state one frame ahead.
    pub(crate) fn predict(&mut self, kf: &KalmanFilter) -> BBox<Ltrb> {
        self.bbox = kf.predict(&mut self.motion).as_ltrb();
        self.age += 1;
        self.bbox
    }

    /// Applies a matched detection. Returns true when this update confirmed the track.
    pub(crate) fn update(&mut self, kf: &KalmanFilter, det: &Detection, min_hits: u32) -> bool {
        kf.correct(&mut self.motion, &det.bbox.as_xyah());

        self.bbox = self.motion.bbox().as_ltrb();
        self.class = det.class;
        self.confidence = det.confidence;
        self.hits += 1;
        self.hit_streak += 1;
        self.time_since_update = 0;

        if self.state == TrackState::Tentative && self.hit_streak >= min_hits {
            self.state = TrackState::Confirmed;
            return true;
        }

        false
    }

    /// Marks this track as missed for the current frame.
    pub(crate) fn mark_missed(&mut self, max_age: u32) {
        self.hit_streak = 0;
        self.time_since_update += 1;

        if self.time_since_update > max_age {
            self.state = TrackState::Deleted;
        }
    }

    #[inline]
    pub fn is_tentative(&self) -> bool {
        self.state == TrackState::Tentative
    }

    #[inline]
    pub fn is_confirmed(&self) -> bool {
        self.state == TrackState::Confirmed
    }

    #[inline]
    pub fn is_deleted(&self) -> bool {
        self.state == TrackState::Deleted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bbox::BBox;

    fn det(l: f32) -> Detection {
        Detection::new(BBox::ltrb(l, 10.0, l + 80.0, 60.0), 0.9, VehicleClass::Car).unwrap()
    }

    #[test]
    fn test_track_lifecycle() {
        let kf = KalmanFilter::new();
        let mut track = Track::new(1, &kf, &det(0.0));

        assert!(track.is_tentative());
        assert_eq!(track.hit_streak, 1);

        track.predict(&kf);
        assert!(!track.update(&kf, &det(2.0), 3));
        track.predict(&kf);
        assert!(track.update(&kf, &det(4.0), 3));
        assert!(track.is_confirmed());
        assert_eq!(track.age, 3);

        track.predict(&kf);
        track.mark_missed(1);
        assert!(track.is_confirmed());
        assert_eq!(track.hit_streak, 0);

        track.predict(&kf);
        track.mark_missed(1);
        assert!(track.is_deleted());
    }
}
