use crate::assignment::match_by_iou;
use crate::config::TrackerConfig;
use crate::detection::Detection;
use crate::error::Result;
use crate::kalman::KalmanFilter;
use crate::store::TrackStore;
use crate::track::Track;

/// SORT-style multi-object tracker: predict, match by IoU, update, age out.
#[derive(Debug, Clone)]
pub struct Tracker {
    config: TrackerConfig,
    kf: KalmanFilter,
    store: TrackStore,
    frame_count: u64,
}

impl Tracker {
    pub fn new(config: TrackerConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            config,
            kf: KalmanFilter::new(),
            store: TrackStore::new(),
            frame_count: 0,
        })
    }

    #[inline]
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    #[inline]
    pub fn store(&self) -> &TrackStore {
        &self.store
    }

    #[inline]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Advances the tracking state by exactly one frame and returns the
    /// confirmed tracks in ascending id order.
    pub fn step(&mut self, detections: &[Detection]) -> Vec<Track> {
        self.frame_count += 1;

        let detections: Vec<&Detection> = detections
            .iter()
            .filter(|det| {
                let valid = det.is_valid();
                if !valid {
                    log::warn!("tracker: skipping malformed detection {:?}", det.bbox);
                }
                valid
            })
            .collect();

        let ids = self.store.ids();
        let kf = &self.kf;
        let predicted: Vec<_> = self
            .store
            .all_active_mut()
            .map(|track| track.predict(kf))
            .collect();

        let boxes: Vec<_> = detections.iter().map(|det| det.bbox).collect();
        let matching = match_by_iou(&predicted, &boxes, self.config.iou_threshold);

        for &(t, d, _) in &matching.matches {
            if let Some(track) = self.store.get_mut(ids[t]) {
                if track.update(kf, detections[d], self.config.min_hits) {
                    log::info!("track #{} confirmed at frame {}", track.track_id, self.frame_count);
                }
            }
        }

        let mut deleted = Vec::new();
        for &t in &matching.unmatched_tracks {
            if let Some(track) = self.store.get_mut(ids[t]) {
                track.mark_missed(self.config.max_age);

                if track.is_deleted() {
                    deleted.push(track.track_id);
                }
            }
        }

        for &d in &matching.unmatched_detections {
            let id = self.store.create(kf, detections[d]);
            log::debug!("track #{} created at frame {}", id, self.frame_count);
        }

        for id in deleted {
            if let Some(track) = self.store.remove(id) {
                if track.hits >= self.config.min_hits {
                    log::info!("track #{} deleted after {} frames", id, track.age);
                } else {
                    log::debug!("track #{} deleted after {} frames", id, track.age);
                }
            }
        }

        log::debug!(
            "frame {}: {} detections, {} matched, {} active tracks",
            self.frame_count,
            detections.len(),
            matching.matches.len(),
            self.store.len()
        );

        self.tracks()
    }

    /// Confirmed tracks in ascending id order.
    pub fn tracks(&self) -> Vec<Track> {
        self.store
            .all_active()
            .filter(|t| t.is_confirmed())
            .cloned()
            .collect()
    }
}
