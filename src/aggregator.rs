use std::collections::BTreeMap;

use crate::plate::PlateAssociation;

#[derive(Debug, Clone)]
struct Best {
    text: String,
    score: f32,
    frame_index: u64,
}

/// Picks the highest-confidence reading of every track over a whole run.
///
/// Ties on score go to the earliest frame. Feeding the same log again from a
/// fresh aggregator always yields the same result.
#[derive(Debug, Clone, Default)]
pub struct ReadingAggregator {
    best: BTreeMap<u32, Best>,
}

impl ReadingAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, association: &PlateAssociation) {
        let candidate = Best {
            text: association.plate_text.clone(),
            score: association.text_score,
            frame_index: association.frame_index,
        };

        match self.best.get_mut(&association.track_id) {
            Some(best) => {
                let better = candidate.score > best.score
                    || (candidate.score == best.score && candidate.frame_index < best.frame_index);

                if better {
                    *best = candidate;
                }
            }
            None => {
                self.best.insert(association.track_id, candidate);
            }
        }
    }

    pub fn extend<'a, I: IntoIterator<Item = &'a PlateAssociation>>(&mut self, log: I) {
        for association in log {
            self.push(association);
        }
    }

    /// `track_id -> canonical text`
    pub fn finish(self) -> BTreeMap<u32, String> {
        self.best
            .into_iter()
            .map(|(track_id, best)| (track_id, best.text))
            .collect()
    }
}

/// Canonical plate text of every track in an association log.
pub fn canonical_readings<'a, I>(log: I) -> BTreeMap<u32, String>
where
    I: IntoIterator<Item = &'a PlateAssociation>,
{
    let mut aggregator = ReadingAggregator::new();
    aggregator.extend(log);
    aggregator.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bbox::BBox;

    fn reading(track_id: u32, frame_index: u64, text: &str, text_score: f32) -> PlateAssociation {
        PlateAssociation {
            frame_index,
            track_id,
            vehicle_bbox: BBox::ltrb(0.0, 0.0, 100.0, 100.0),
            plate_bbox: BBox::ltrb(10.0, 60.0, 50.0, 75.0),
            plate_text: text.to_string(),
            text_score,
            bbox_score: 0.9,
        }
    }

    #[test]
    fn test_best_score_wins() {
        let log = vec![
            reading(1, 1, "AB12", 0.7),
            reading(1, 5, "AB12", 0.95),
            reading(2, 2, "CD34", 0.6),
        ];

        let canonical = canonical_readings(&log);

        assert_eq!(canonical.len(), 2);
        assert_eq!(canonical[&1], "AB12");
        assert_eq!(canonical[&2], "CD34");
    }

    #[test]
    fn test_noisy_reading_is_overridden() {
        let log = vec![
            reading(3, 1, "A812", 0.4),
            reading(3, 2, "AB12", 0.9),
            reading(3, 3, "AB1Z", 0.5),
        ];

        assert_eq!(canonical_readings(&log)[&3], "AB12");
    }

    #[test]
    fn test_tie_goes_to_earliest_frame() {
        let log = vec![reading(1, 8, "LATE", 0.8), reading(1, 2, "EARLY", 0.8)];

        assert_eq!(canonical_readings(&log)[&1], "EARLY");
    }

    #[test]
    fn test_empty_log() {
        assert!(canonical_readings(&Vec::<PlateAssociation>::new()).is_empty());
    }
}
