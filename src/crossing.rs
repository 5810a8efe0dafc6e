use std::collections::BTreeMap;

use crate::counts::Direction;
use crate::line::CountingLine;
use crate::track::{TrackId, TrackedObject};

/// A track changed sides of a line for the first time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrossingEvent {
    pub track_id: TrackId,
    pub line_id: String,
    pub class_name: String,
    pub direction: Direction,
}

/// Updates per-line side history of every moving track and reports new crossings.
///
/// A crossing needs a non-zero recorded side and a different non-zero current
/// side. Samples on the line (side `0`) neither fire nor overwrite a recorded
/// non-zero side, so a track stepping onto the line and off the other side
/// still counts once. Each `(track, line)` pair fires at most once: the line
/// id goes into `crossed_lines` and the track is not evaluated against it
/// again.
pub fn detect_crossings(
    tracks: &mut BTreeMap<TrackId, TrackedObject>,
    lines: &[CountingLine],
) -> Vec<CrossingEvent> {
    let mut events = Vec::new();

    for track in tracks.values_mut() {
        if track.previous_center.is_none() {
            continue;
        }

        for line in lines {
            if track.has_crossed(&line.id) {
                continue;
            }

            let current = line.side(&track.current_center);
            let previous = track.line_sides.get(&line.id).copied();

            if current == 0 {
                // on the line: keep the last real side
                if previous.is_none() {
                    track.line_sides.insert(line.id.clone(), 0);
                }
                continue;
            }

            track.line_sides.insert(line.id.clone(), current);

            let prev = match previous {
                Some(prev) if prev != 0 => prev,
                _ => continue,
            };

            if prev == current {
                continue;
            }

            let direction = if current > 0 {
                Direction::In
            } else {
                Direction::Out
            };

            tracing::debug!(
                track = track.id,
                line = %line.id,
                class = %track.class_name,
                ?direction,
                "line crossed"
            );

            track.crossed_lines.insert(line.id.clone());
            events.push(CrossingEvent {
                track_id: track.id,
                line_id: line.id.clone(),
                class_name: track.class_name.clone(),
                direction,
            });
        }
    }

    events
}
