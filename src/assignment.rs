use munkres::{solve_assignment, WeightMatrix};

use crate::bbox::{ious, BBox, Ltrb};

// cost for pairs that must never be matched (below IoU gate or padding)
const DISALLOWED_COST: f64 = 100_000.0;

// keeps equal-cost pairs ordered by detection index, far below any IoU difference that matters
const TIE_BREAK_STEP: f64 = 1e-9;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Matching {
    /// `(track_idx, det_idx, iou)` sorted by track index
    pub matches: Vec<(usize, usize, f32)>,
    pub unmatched_tracks: Vec<usize>,
    pub unmatched_detections: Vec<usize>,
}

/// Minimum-cost bipartite assignment of detections to predicted track boxes
/// with cost `1 - IoU`. Pairs with `IoU < iou_threshold` are never matched.
pub fn match_by_iou(
    tracks: &[BBox<Ltrb>],
    detections: &[BBox<Ltrb>],
    iou_threshold: f32,
) -> Matching {
    let mut matches = Vec::new();

    if !tracks.is_empty() && !detections.is_empty() {
        let iou = ious(tracks, detections);
        let eligible = |r: usize, c: usize| iou[[r, c]] >= iou_threshold;

        let n = tracks.len().max(detections.len());
        let mut mat = WeightMatrix::from_fn(n, |(r, c)| {
            if r < tracks.len() && c < detections.len() && eligible(r, c) {
                1.0 - iou[[r, c]] as f64 + c as f64 * TIE_BREAK_STEP
            } else {
                DISALLOWED_COST
            }
        });

        match solve_assignment(&mut mat) {
            Ok(positions) => {
                for p in positions {
                    if p.row < tracks.len() && p.column < detections.len() && eligible(p.row, p.column) {
                        matches.push((p.row, p.column, iou[[p.row, p.column]]));
                    }
                }
            }
            Err(err) => {
                log::warn!("assignment could not be solved: {:?}", err);
            }
        }
    }

    matches.sort_unstable_by_key(|&(t, _, _)| t);

    let unmatched_tracks = (0..tracks.len())
        .filter(|t| !matches.iter().any(|&(mt, _, _)| mt == *t))
        .collect();

    let unmatched_detections = (0..detections.len())
        .filter(|d| !matches.iter().any(|&(_, md, _)| md == *d))
        .collect();

    Matching {
        matches,
        unmatched_tracks,
        unmatched_detections,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optimal_assignment() {
        let tracks = [
            BBox::ltrb(0.0, 0.0, 10.0, 10.0),
            BBox::ltrb(20.0, 0.0, 30.0, 10.0),
        ];
        let dets = [
            BBox::ltrb(21.0, 0.0, 31.0, 10.0),
            BBox::ltrb(1.0, 0.0, 11.0, 10.0),
        ];

        let m = match_by_iou(&tracks, &dets, 0.3);

        assert_eq!(
            m.matches.iter().map(|&(t, d, _)| (t, d)).collect::<Vec<_>>(),
            vec![(0, 1), (1, 0)]
        );
        assert!(m.unmatched_tracks.is_empty());
        assert!(m.unmatched_detections.is_empty());
    }

    #[test]
    fn test_gate_rejects_low_iou() {
        let tracks = [BBox::ltrb(0.0, 0.0, 10.0, 10.0)];
        let dets = [BBox::ltrb(8.0, 0.0, 18.0, 10.0)];

        let m = match_by_iou(&tracks, &dets, 0.3);

        assert!(m.matches.is_empty());
        assert_eq!(m.unmatched_tracks, vec![0]);
        assert_eq!(m.unmatched_detections, vec![0]);
    }

    #[test]
    fn test_tie_prefers_lower_detection_index() {
        let tracks = [BBox::ltrb(10.0, 0.0, 20.0, 10.0)];
        // both shifted by the same amount, identical IoU
        let dets = [
            BBox::ltrb(8.0, 0.0, 18.0, 10.0),
            BBox::ltrb(12.0, 0.0, 22.0, 10.0),
        ];

        let m = match_by_iou(&tracks, &dets, 0.3);

        assert_eq!(m.matches.len(), 1);
        assert_eq!(m.matches[0].1, 0);
        assert_eq!(m.unmatched_detections, vec![1]);
    }

    #[test]
    fn test_empty_sides() {
        let boxes = [BBox::ltrb(0.0, 0.0, 10.0, 10.0)];

        let no_dets = match_by_iou(&boxes, &[], 0.3);
        assert_eq!(no_dets.unmatched_tracks, vec![0]);

        let no_tracks = match_by_iou(&[], &boxes, 0.3);
        assert_eq!(no_tracks.unmatched_detections, vec![0]);
    }
}
