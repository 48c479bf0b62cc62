use std::collections::BTreeMap;

use crate::detection::Detection;
use crate::kalman::KalmanFilter;
use crate::track::Track;

/// Owns the active tracks of one run, keyed by id.
///
/// Ids start at 1, grow monotonically and are never handed out twice, even
/// after the track holding them has been removed.
#[derive(Debug, Clone)]
pub struct TrackStore {
    tracks: BTreeMap<u32, Track>,
    next_id: u32,
}

impl Default for TrackStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackStore {
    pub fn new() -> Self {
        Self {
            tracks: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Allocates a new tentative track seeded from `det`.
    pub fn create(&mut self, kf: &KalmanFilter, det: &Detection) -> u32 {
        let id = self.next_id;
        self.next_id += 1;

        let prev = self.tracks.insert(id, Track::new(id, kf, det));
        assert!(prev.is_none(), "track id {} allocated twice", id);

        id
    }

    #[inline]
    pub fn get(&self, id: u32) -> Option<&Track> {
        self.tracks.get(&id)
    }

    #[inline]
    pub fn get_mut(&mut self, id: u32) -> Option<&mut Track> {
        self.tracks.get_mut(&id)
    }

    #[inline]
    pub fn remove(&mut self, id: u32) -> Option<Track> {
        self.tracks.remove(&id)
    }

    /// Active tracks in ascending id order.
    #[inline]
    pub fn all_active(&self) -> impl Iterator<Item = &Track> {
        self.tracks.values()
    }

    #[inline]
    pub(crate) fn all_active_mut(&mut self) -> impl Iterator<Item = &mut Track> {
        self.tracks.values_mut()
    }

    #[inline]
    pub fn ids(&self) -> Vec<u32> {
        self.tracks.keys().copied().collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}
