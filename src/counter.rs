//! The per-frame counting engine.
//!
//! One [`ObjectCounter::update`] call runs a whole frame: detections are
//! validated, associated to tracks, then checked against the active lines and
//! zones, and the resulting events are folded into the tallies. Geometry is
//! held as shared immutable snapshots; replacing it is a configuration change
//! that bumps the geometry epoch and purges per-track state for lines and zones
//! that disappeared or moved.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde_derive::{Deserialize, Serialize};

use crate::counts::{CountAggregator, LineCounts, RegionCounts, ZoneCounts};
use crate::crossing::{detect_crossings, CrossingEvent};
use crate::detection::Detection;
use crate::error::Error;
use crate::layout::Layout;
use crate::line::CountingLine;
use crate::occupancy::{detect_occupancy, ZoneEvent};
use crate::track::{TrackId, TrackedObject};
use crate::tracker::TrackStore;
use crate::zone::CountingPolygon;

pub const DEFAULT_MAX_DISTANCE: f64 = 100.0;
pub const DEFAULT_MAX_FRAMES_MISSING: u32 = 30;

#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
pub struct CounterConfig {
    /// Association gate in pixels, exclusive.
    #[serde(default = "default_max_distance")]
    pub max_distance: f64,
    /// Consecutive unmatched frames a track survives.
    #[serde(default = "default_max_frames_missing")]
    pub max_frames_missing: u32,
}

fn default_max_distance() -> f64 {
    DEFAULT_MAX_DISTANCE
}

fn default_max_frames_missing() -> u32 {
    DEFAULT_MAX_FRAMES_MISSING
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DISTANCE, DEFAULT_MAX_FRAMES_MISSING)
    }
}

impl CounterConfig {
    pub fn new(max_distance: f64, max_frames_missing: u32) -> Self {
        Self {
            max_distance,
            max_frames_missing,
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        if !self.max_distance.is_finite() || self.max_distance <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "max_distance must be a positive number, got {}",
                self.max_distance
            )));
        }

        Ok(())
    }
}

/// Ids of `old` regions that are gone from `new` or whose geometry changed.
fn stale_ids<T, K, G>(old: &[T], new: &[T], key: K, geometry: G) -> Vec<String>
where
    K: Fn(&T) -> &str,
    G: Fn(&T, &T) -> bool,
{
    old.iter()
        .filter(|o| {
            !new.iter()
                .any(|n| key(n) == key(o) && geometry(o, n))
        })
        .map(|o| key(o).to_string())
        .collect()
}

fn id_set<'a, T: 'a, K: Fn(&T) -> &str>(items: &'a [T], key: K) -> BTreeSet<&'a str> {
    items.iter().map(key).collect()
}

pub struct ObjectCounter {
    config: CounterConfig,
    store: TrackStore,
    lines: Arc<[CountingLine]>,
    polygons: Arc<[CountingPolygon]>,
    epoch: u64,
    counts: CountAggregator,
    frames: u64,
    last_crossings: Vec<CrossingEvent>,
    last_zone_events: Vec<ZoneEvent>,
}

impl ObjectCounter {
    pub fn new(config: CounterConfig) -> Result<Self, Error> {
        config.validate()?;

        Ok(Self {
            config,
            store: TrackStore::new(config.max_distance, config.max_frames_missing),
            lines: Arc::from(Vec::new()),
            polygons: Arc::from(Vec::new()),
            epoch: 0,
            counts: CountAggregator::new(),
            frames: 0,
            last_crossings: Vec::new(),
            last_zone_events: Vec::new(),
        })
    }

    #[inline]
    pub fn config(&self) -> &CounterConfig {
        &self.config
    }

    #[inline]
    pub fn lines(&self) -> &[CountingLine] {
        &self.lines
    }

    #[inline]
    pub fn polygons(&self) -> &[CountingPolygon] {
        &self.polygons
    }

    /// Bumped every time the active geometry changes in a way that affects tracks.
    #[inline]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Frames processed since the last tracking reset.
    #[inline]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    #[inline]
    pub fn tracks(&self) -> &BTreeMap<TrackId, TrackedObject> {
        self.store.tracks()
    }

    pub fn set_lines(&mut self, lines: Arc<[CountingLine]>) {
        let stale = stale_ids(&self.lines[..], &lines[..], |l| l.id.as_str(), |a, b| {
            a.start == b.start && a.end == b.end
        });
        let changed = !stale.is_empty()
            || id_set(&self.lines[..], |l| l.id.as_str()) != id_set(&lines[..], |l| l.id.as_str());

        if !stale.is_empty() {
            for track in self.store.tracks_mut().values_mut() {
                for id in &stale {
                    track.line_sides.remove(id);
                    track.crossed_lines.remove(id);
                }
            }
        }

        self.lines = lines;
        self.counts.ensure(&self.lines, &[]);

        if changed {
            self.bump_epoch(stale.len(), "lines");
        }
    }

    pub fn set_polygons(&mut self, polygons: Arc<[CountingPolygon]>) {
        let stale = stale_ids(&self.polygons[..], &polygons[..], |p| p.id.as_str(), |a, b| {
            a.points == b.points
        });
        let changed = !stale.is_empty()
            || id_set(&self.polygons[..], |p| p.id.as_str())
                != id_set(&polygons[..], |p| p.id.as_str());

        if !stale.is_empty() {
            let counts = &mut self.counts;
            for track in self.store.tracks_mut().values_mut() {
                for id in &stale {
                    if track.in_zones.remove(id) {
                        counts.forget_member(id, &track.class_name);
                    }
                }
            }
        }

        self.polygons = polygons;
        self.counts.ensure(&[], &self.polygons);
        self.counts.retire_zones(&self.polygons);

        if changed {
            self.bump_epoch(stale.len(), "polygons");
        }
    }

    fn bump_epoch(&mut self, purged: usize, what: &'static str) {
        self.epoch += 1;
        tracing::debug!(epoch = self.epoch, purged, what, "geometry changed");
    }

    /// Installs the lines and zones of a loaded layout. Counts are kept.
    pub fn apply_layout(&mut self, layout: &Layout) {
        self.set_lines(layout.lines_snapshot());
        self.set_polygons(layout.polygons_snapshot());
    }

    /// Runs one frame.
    ///
    /// `None` for `lines` or `polygons` keeps the current geometry. Malformed
    /// detections are logged and skipped; the rest of the frame proceeds.
    pub fn update<I>(
        &mut self,
        detections: I,
        lines: Option<Arc<[CountingLine]>>,
        polygons: Option<Arc<[CountingPolygon]>>,
    ) -> &BTreeMap<TrackId, TrackedObject>
    where
        I: IntoIterator<Item = Detection>,
    {
        if let Some(lines) = lines {
            self.set_lines(lines);
        }

        if let Some(polygons) = polygons {
            self.set_polygons(polygons);
        }

        let frame = self.frames;
        let dets: Vec<Detection> = detections
            .into_iter()
            .filter(|det| match det.validate() {
                Ok(()) => true,
                Err(err) => {
                    tracing::warn!(frame, %err, "skipping detection");
                    false
                }
            })
            .collect();

        self.store.update(&dets);

        let tracks = self.store.tracks_mut();
        let crossings = detect_crossings(tracks, &self.lines);
        let (occupancy, zone_events) = detect_occupancy(tracks, &self.polygons);

        for ev in &crossings {
            self.counts.apply_crossing(ev);
        }

        for ev in &zone_events {
            self.counts.apply_zone_event(ev);
        }

        for occ in &occupancy {
            self.counts.apply_occupancy(occ);
        }

        self.last_crossings = crossings;
        self.last_zone_events = zone_events;
        self.frames += 1;

        self.store.tracks()
    }

    /// Crossings fired by the most recent frame.
    #[inline]
    pub fn last_crossings(&self) -> &[CrossingEvent] {
        &self.last_crossings
    }

    /// Zone enters and exits fired by the most recent frame.
    #[inline]
    pub fn last_zone_events(&self) -> &[ZoneEvent] {
        &self.last_zone_events
    }

    /// Clears tallies and re-creates zero entries for the active geometry.
    pub fn reset_counts(&mut self) {
        self.counts.reset(&self.lines, &self.polygons);
    }

    /// Clears tallies and all tracks; the next track gets id 1.
    pub fn reset_tracking(&mut self) {
        self.store.clear();
        self.frames = 0;
        self.last_crossings.clear();
        self.last_zone_events.clear();
        self.reset_counts();
    }

    #[inline]
    pub fn reset(&mut self) {
        self.reset_tracking();
    }

    #[inline]
    pub fn counters(&self) -> &CountAggregator {
        &self.counts
    }

    #[inline]
    pub fn line_counts(&self) -> &BTreeMap<String, LineCounts> {
        self.counts.line_counts()
    }

    #[inline]
    pub fn zone_counts(&self) -> &BTreeMap<String, ZoneCounts> {
        self.counts.zone_counts()
    }

    #[inline]
    pub fn all_counts(&self) -> BTreeMap<String, RegionCounts> {
        self.counts.all_counts()
    }

    #[inline]
    pub fn counts(&self) -> Vec<(String, u64)> {
        self.counts.counts(&self.lines, &self.polygons)
    }

    #[inline]
    pub fn count_summary(&self) -> String {
        self.counts.summary(&self.lines, &self.polygons)
    }

    #[inline]
    pub fn class_breakdown(&self) -> String {
        self.counts.class_breakdown(&self.lines, &self.polygons)
    }
}
