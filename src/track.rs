use std::collections::{BTreeMap, BTreeSet};

use crate::bbox::BBox;
use crate::detection::Detection;
use crate::geometry::Point;

pub type TrackId = u32;

/// Persistent identity of one physical object across frames.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedObject {
    pub id: TrackId,
    pub class_id: u32,
    pub class_name: String,
    pub current_center: Point,
    pub previous_center: Option<Point>,
    pub bbox: BBox,
    pub confidence: f32,

    // consecutive frames without a matching detection
    pub frames_missing: u32,

    pub line_sides: BTreeMap<String, i8>,
    pub crossed_lines: BTreeSet<String>,
    pub in_zones: BTreeSet<String>,
}

impl TrackedObject {
    pub fn new(id: TrackId, det: &Detection) -> Self {
        Self {
            id,
            class_id: det.class_id,
            class_name: det.class_name.clone(),
            current_center: det.center,
            previous_center: None,
            bbox: det.bbox,
            confidence: det.confidence,
            frames_missing: 0,
            line_sides: BTreeMap::new(),
            crossed_lines: BTreeSet::new(),
            in_zones: BTreeSet::new(),
        }
    }

    /// Moves the track onto a matched detection. Class is fixed at creation and stays.
    pub fn update(&mut self, det: &Detection) {
        self.previous_center = Some(self.current_center);
        self.current_center = det.center;
        self.bbox = det.bbox;
        self.confidence = det.confidence;
        self.frames_missing = 0;
    }

    #[inline]
    pub fn has_crossed(&self, line_id: &str) -> bool {
        self.crossed_lines.contains(line_id)
    }

    #[inline]
    pub fn is_in_zone(&self, zone_id: &str) -> bool {
        self.in_zones.contains(zone_id)
    }
}
