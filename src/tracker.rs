use std::collections::BTreeMap;

use ndarray::Array2;

use crate::detection::Detection;
use crate::track::{TrackId, TrackedObject};

/// Result of matching one frame of detections against live tracks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Assignment {
    /// `(track id, detection index)` in acceptance order
    pub matched: Vec<(TrackId, usize)>,
    /// detection indexes left without a track, ascending
    pub unmatched: Vec<usize>,
}

/// Pairwise center distances, one row per track (ascending id), one column per detection.
pub fn distance_matrix(tracks: &BTreeMap<TrackId, TrackedObject>, dets: &[Detection]) -> Array2<f64> {
    let centers: Vec<_> = tracks.values().map(|t| t.current_center).collect();

    Array2::from_shape_fn((centers.len(), dets.len()), |(r, c)| dets[c].distance(&centers[r]))
}

/// Greedy nearest-neighbour association.
///
/// Candidates are pairs closer than `max_distance` with the same class id. They
/// are accepted closest first; equal distances keep track-major then
/// detection-major order, so the outcome only depends on input order.
pub fn associate(
    tracks: &BTreeMap<TrackId, TrackedObject>,
    dets: &[Detection],
    max_distance: f64,
) -> Assignment {
    if tracks.is_empty() || dets.is_empty() {
        return Assignment {
            matched: Vec::new(),
            unmatched: (0..dets.len()).collect(),
        };
    }

    let ids: Vec<TrackId> = tracks.keys().copied().collect();
    let distances = distance_matrix(tracks, dets);

    let mut pairs = Vec::new();
    for (r, track) in tracks.values().enumerate() {
        for (c, det) in dets.iter().enumerate() {
            let dist = distances[[r, c]];
            if dist < max_distance && track.class_id == det.class_id {
                pairs.push((dist, r, c));
            }
        }
    }

    // stable, keeps generation order on ties
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut used_tracks = vec![false; ids.len()];
    let mut used_dets = vec![false; dets.len()];
    let mut matched = Vec::with_capacity(ids.len().min(dets.len()));

    for (_, r, c) in pairs {
        if used_tracks[r] || used_dets[c] {
            continue;
        }

        used_tracks[r] = true;
        used_dets[c] = true;
        matched.push((ids[r], c));
    }

    let unmatched = used_dets
        .iter()
        .enumerate()
        .filter(|(_, used)| !**used)
        .map(|(idx, _)| idx)
        .collect();

    Assignment { matched, unmatched }
}

/// Live tracks plus id allocation and expiry.
#[derive(Debug, Clone)]
pub struct TrackStore {
    tracks: BTreeMap<TrackId, TrackedObject>,
    next_id: TrackId,
    max_distance: f64,
    max_frames_missing: u32,
}

impl TrackStore {
    pub fn new(max_distance: f64, max_frames_missing: u32) -> Self {
        Self {
            tracks: BTreeMap::new(),
            next_id: 1,
            max_distance,
            max_frames_missing,
        }
    }

    #[inline]
    pub fn tracks(&self) -> &BTreeMap<TrackId, TrackedObject> {
        &self.tracks
    }

    #[inline]
    pub fn tracks_mut(&mut self) -> &mut BTreeMap<TrackId, TrackedObject> {
        &mut self.tracks
    }

    #[inline]
    pub fn get(&self, id: TrackId) -> Option<&TrackedObject> {
        self.tracks.get(&id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Drops every track and restarts id allocation at 1.
    pub fn clear(&mut self) {
        self.tracks.clear();
        self.next_id = 1;
    }

    pub fn update(&mut self, dets: &[Detection]) -> &BTreeMap<TrackId, TrackedObject> {
        let assignment = associate(&self.tracks, dets, self.max_distance);

        for &(id, idx) in &assignment.matched {
            let track = self
                .tracks
                .get_mut(&id)
                .unwrap_or_else(|| panic!("matched track {} is not live", id));

            track.update(&dets[idx]);
        }

        let max_missing = self.max_frames_missing;
        let mut matched: Vec<TrackId> = assignment.matched.iter().map(|&(id, _)| id).collect();
        matched.sort_unstable();

        self.tracks.retain(|id, track| {
            if matched.binary_search(id).is_ok() {
                return true;
            }

            track.frames_missing += 1;
            if track.frames_missing > max_missing {
                tracing::debug!(track = id, class = %track.class_name, "track expired");
                return false;
            }

            true
        });

        for idx in assignment.unmatched {
            let id = self.next_id;
            self.next_id += 1;

            let det = &dets[idx];
            tracing::debug!(
                track = id,
                class = %det.class_name,
                x = det.center.x,
                y = det.center.y,
                "track created"
            );

            self.tracks.insert(id, TrackedObject::new(id, det));
        }

        &self.tracks
    }
}
