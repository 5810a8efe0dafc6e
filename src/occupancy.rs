use std::collections::BTreeMap;

use crate::track::{TrackId, TrackedObject};
use crate::zone::CountingPolygon;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ZoneTransition {
    Entered,
    Exited,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneEvent {
    pub track_id: TrackId,
    pub zone_id: String,
    pub class_name: String,
    pub transition: ZoneTransition,
}

/// Occupancy of one zone on one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneOccupancy {
    pub zone_id: String,
    /// ascending track ids currently inside
    pub inside: Vec<TrackId>,
}

impl ZoneOccupancy {
    #[inline]
    pub fn count(&self) -> usize {
        self.inside.len()
    }
}

/// Recomputes zone membership of every live track from its current center.
///
/// Membership in `in_zones` is synced to the result and every change is
/// reported. The inside set is rebuilt from scratch each call, so occupancy
/// never depends on earlier frames.
pub fn detect_occupancy(
    tracks: &mut BTreeMap<TrackId, TrackedObject>,
    zones: &[CountingPolygon],
) -> (Vec<ZoneOccupancy>, Vec<ZoneEvent>) {
    let mut occupancy = Vec::with_capacity(zones.len());
    let mut events = Vec::new();

    for zone in zones {
        let mut inside = Vec::new();

        for track in tracks.values_mut() {
            let transition = if zone.contains(&track.current_center) {
                inside.push(track.id);

                if !track.in_zones.insert(zone.id.clone()) {
                    continue;
                }
                ZoneTransition::Entered
            } else {
                if !track.in_zones.remove(&zone.id) {
                    continue;
                }
                ZoneTransition::Exited
            };

            tracing::debug!(
                track = track.id,
                zone = %zone.id,
                class = %track.class_name,
                ?transition,
                "zone membership changed"
            );

            events.push(ZoneEvent {
                track_id: track.id,
                zone_id: zone.id.clone(),
                class_name: track.class_name.clone(),
                transition,
            });
        }

        occupancy.push(ZoneOccupancy {
            zone_id: zone.id.clone(),
            inside,
        });
    }

    (occupancy, events)
}
