//! Running tallies for lines and zones.

use std::collections::BTreeMap;

use num_traits::Zero;
use serde_derive::{Deserialize, Serialize};

use crate::crossing::CrossingEvent;
use crate::line::CountingLine;
use crate::occupancy::{ZoneEvent, ZoneOccupancy, ZoneTransition};
use crate::zone::CountingPolygon;

#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    In,
    Out,
}

#[derive(Serialize, Deserialize, Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct LineCounts {
    #[serde(rename = "in")]
    pub inbound: u64,
    #[serde(rename = "out")]
    pub outbound: u64,
    pub total: u64,
}

impl LineCounts {
    #[inline]
    pub fn record(&mut self, dir: Direction) {
        match dir {
            Direction::In => self.inbound += 1,
            Direction::Out => self.outbound += 1,
        }
        self.total += 1;
    }
}

#[derive(Serialize, Deserialize, Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct ClassLineCounts {
    #[serde(rename = "in")]
    pub inbound: u64,
    #[serde(rename = "out")]
    pub outbound: u64,
}

#[derive(Serialize, Deserialize, Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct ZoneCounts {
    /// tracks inside right now
    pub count: u64,
    pub entered: u64,
    pub exited: u64,
}

/// Either kind of tally, for the combined table.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum RegionCounts {
    Line(LineCounts),
    Zone(ZoneCounts),
}

/// Returns the entry for `key`, inserting zero first if it is missing.
pub fn tally<'a, V: Zero>(map: &'a mut BTreeMap<String, V>, key: &str) -> &'a mut V {
    map.entry(key.to_string()).or_insert_with(V::zero)
}

/// Get-or-insert-default for the struct tallies.
fn entry<'a, V: Default>(map: &'a mut BTreeMap<String, V>, key: &str) -> &'a mut V {
    map.entry(key.to_string()).or_default()
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CountAggregator {
    lines: BTreeMap<String, LineCounts>,
    zones: BTreeMap<String, ZoneCounts>,
    line_classes: BTreeMap<String, BTreeMap<String, ClassLineCounts>>,
    // net entered per class, may go negative
    zone_classes: BTreeMap<String, BTreeMap<String, i64>>,
}

impl CountAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_crossing(&mut self, line_id: &str, class_name: &str, dir: Direction) {
        entry(&mut self.lines, line_id).record(dir);

        let per_class = entry(entry(&mut self.line_classes, line_id), class_name);
        match dir {
            Direction::In => per_class.inbound += 1,
            Direction::Out => per_class.outbound += 1,
        }
    }

    pub fn record_enter(&mut self, zone_id: &str, class_name: &str) {
        entry(&mut self.zones, zone_id).entered += 1;
        *tally(entry(&mut self.zone_classes, zone_id), class_name) += 1;
    }

    pub fn record_exit(&mut self, zone_id: &str, class_name: &str) {
        entry(&mut self.zones, zone_id).exited += 1;
        *tally(entry(&mut self.zone_classes, zone_id), class_name) -= 1;
    }

    /// Drops one member from the class net count without recording an exit.
    pub fn forget_member(&mut self, zone_id: &str, class_name: &str) {
        *tally(entry(&mut self.zone_classes, zone_id), class_name) -= 1;
    }

    pub fn set_occupancy(&mut self, zone_id: &str, count: u64) {
        entry(&mut self.zones, zone_id).count = count;
    }

    pub fn apply_crossing(&mut self, ev: &CrossingEvent) {
        self.record_crossing(&ev.line_id, &ev.class_name, ev.direction);
    }

    pub fn apply_zone_event(&mut self, ev: &ZoneEvent) {
        match ev.transition {
            ZoneTransition::Entered => self.record_enter(&ev.zone_id, &ev.class_name),
            ZoneTransition::Exited => self.record_exit(&ev.zone_id, &ev.class_name),
        }
    }

    pub fn apply_occupancy(&mut self, occ: &ZoneOccupancy) {
        self.set_occupancy(&occ.zone_id, occ.count() as u64);
    }

    /// Adds zero entries for lines and zones that have none yet.
    pub fn ensure(&mut self, lines: &[CountingLine], polygons: &[CountingPolygon]) {
        for line in lines {
            entry(&mut self.lines, &line.id);
        }

        for poly in polygons {
            entry(&mut self.zones, &poly.id);
        }
    }

    /// Zeroes the occupancy of zones that are no longer configured. Their
    /// cumulative entered and exited tallies stay.
    pub fn retire_zones(&mut self, polygons: &[CountingPolygon]) {
        for (id, c) in self.zones.iter_mut() {
            if !polygons.iter().any(|p| &p.id == id) {
                c.count = 0;
            }
        }
    }

    /// Clears everything, then adds zero entries for the given geometry.
    pub fn reset(&mut self, lines: &[CountingLine], polygons: &[CountingPolygon]) {
        self.lines.clear();
        self.zones.clear();
        self.line_classes.clear();
        self.zone_classes.clear();
        self.ensure(lines, polygons);
    }

    #[inline]
    pub fn line(&self, line_id: &str) -> LineCounts {
        self.lines.get(line_id).copied().unwrap_or_default()
    }

    #[inline]
    pub fn zone(&self, zone_id: &str) -> ZoneCounts {
        self.zones.get(zone_id).copied().unwrap_or_default()
    }

    pub fn line_class(&self, line_id: &str, class_name: &str) -> ClassLineCounts {
        self.line_classes
            .get(line_id)
            .and_then(|m| m.get(class_name))
            .copied()
            .unwrap_or_default()
    }

    pub fn zone_class(&self, zone_id: &str, class_name: &str) -> i64 {
        self.zone_classes
            .get(zone_id)
            .and_then(|m| m.get(class_name))
            .copied()
            .unwrap_or(0)
    }

    #[inline]
    pub fn line_counts(&self) -> &BTreeMap<String, LineCounts> {
        &self.lines
    }

    #[inline]
    pub fn zone_counts(&self) -> &BTreeMap<String, ZoneCounts> {
        &self.zones
    }

    #[inline]
    pub fn line_class_counts(&self) -> &BTreeMap<String, BTreeMap<String, ClassLineCounts>> {
        &self.line_classes
    }

    #[inline]
    pub fn zone_class_counts(&self) -> &BTreeMap<String, BTreeMap<String, i64>> {
        &self.zone_classes
    }

    /// Lines and zones in one table keyed by id. A zone sharing a line's id wins.
    pub fn all_counts(&self) -> BTreeMap<String, RegionCounts> {
        self.lines
            .iter()
            .map(|(id, c)| (id.clone(), RegionCounts::Line(*c)))
            .chain(
                self.zones
                    .iter()
                    .map(|(id, c)| (id.clone(), RegionCounts::Zone(*c))),
            )
            .collect()
    }

    /// Headline number per configured region, by display name: line total, zone occupancy.
    pub fn counts(&self, lines: &[CountingLine], polygons: &[CountingPolygon]) -> Vec<(String, u64)> {
        lines
            .iter()
            .map(|l| (l.name.clone(), self.line(&l.id).total))
            .chain(polygons.iter().map(|p| (p.name.clone(), self.zone(&p.id).count)))
            .collect()
    }

    pub fn summary(&self, lines: &[CountingLine], polygons: &[CountingPolygon]) -> String {
        let mut out = Vec::with_capacity(lines.len() + polygons.len());

        for line in lines {
            let c = self.line(&line.id);
            out.push(format!(
                "{}: In={}, Out={}, Total={}",
                line.name, c.inbound, c.outbound, c.total
            ));
        }

        for poly in polygons {
            let c = self.zone(&poly.id);
            out.push(format!(
                "{}: Current={}, Entered={}, Exited={}",
                poly.name, c.count, c.entered, c.exited
            ));
        }

        if out.is_empty() {
            "No counting zones defined".to_string()
        } else {
            out.join("\n")
        }
    }

    pub fn class_breakdown(&self, lines: &[CountingLine], polygons: &[CountingPolygon]) -> String {
        let mut out = Vec::new();

        for line in lines {
            match self.line_classes.get(&line.id) {
                Some(classes) if !classes.is_empty() => {
                    out.push(format!("{}:", line.name));
                    for (class, c) in classes {
                        out.push(format!("  - {}: In={}, Out={}", class, c.inbound, c.outbound));
                    }
                }
                _ => {}
            }
        }

        for poly in polygons {
            match self.zone_classes.get(&poly.id) {
                Some(classes) if !classes.is_empty() => {
                    out.push(format!("{}:", poly.name));
                    for (class, n) in classes.iter().filter(|(_, n)| **n > 0) {
                        out.push(format!("  - {}: {}", class, n));
                    }
                }
                _ => {}
            }
        }

        if out.is_empty() {
            "No counts yet".to_string()
        } else {
            out.join("\n")
        }
    }
}
