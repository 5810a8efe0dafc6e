//! Persisted set of counting lines and zones.
//!
//! The on-disk form is the JSON document
//! `{width, height, lines: [...], polygons: [...]}`. Loading a layout replaces
//! the active geometry but never touches counts; the engine decides what a
//! geometry change means for tracks.

use std::io::{Read, Write};
use std::path::Path;
use std::sync::Arc;

use serde_derive::{Deserialize, Serialize};

use crate::error::Error;
use crate::geometry::Point;
use crate::line::CountingLine;
use crate::zone::CountingPolygon;

pub const DEFAULT_WIDTH: u32 = 1280;
pub const DEFAULT_HEIGHT: u32 = 720;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Layout {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default)]
    pub lines: Vec<CountingLine>,
    #[serde(default)]
    pub polygons: Vec<CountingPolygon>,

    #[serde(skip)]
    line_counter: u32,
    #[serde(skip)]
    polygon_counter: u32,
}

fn default_width() -> u32 {
    DEFAULT_WIDTH
}

fn default_height() -> u32 {
    DEFAULT_HEIGHT
}

impl Default for Layout {
    fn default() -> Self {
        Self::new(DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }
}

impl Layout {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            lines: Vec::new(),
            polygons: Vec::new(),
            line_counter: 0,
            polygon_counter: 0,
        }
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, Error> {
        let mut layout: Layout = serde_json::from_reader(reader)?;
        layout.line_counter = layout.lines.len() as u32;
        layout.polygon_counter = layout.polygons.len() as u32;

        tracing::debug!(
            lines = layout.lines.len(),
            polygons = layout.polygons.len(),
            "layout loaded"
        );

        Ok(layout)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    pub fn to_writer<W: Write>(&self, writer: W) -> Result<(), Error> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        let file = std::fs::File::create(path)?;
        let mut writer = std::io::BufWriter::new(file);
        self.to_writer(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Appends a line with the next `line_N` id and returns that id.
    pub fn add_line(&mut self, start: Point, end: Point) -> String {
        self.line_counter += 1;
        let n = self.line_counter;
        let line = CountingLine::new(format!("line_{}", n), start, end)
            .with_name(format!("Line {}", n));
        let id = line.id.clone();
        self.lines.push(line);
        id
    }

    /// Appends a zone with the next `zone_N` id. Fewer than three points add nothing.
    pub fn add_polygon(&mut self, points: Vec<Point>) -> Option<String> {
        if points.len() < 3 {
            return None;
        }

        self.polygon_counter += 1;
        let n = self.polygon_counter;
        let zone = CountingPolygon::new(format!("zone_{}", n), points)
            .with_name(format!("Zone {}", n));
        let id = zone.id.clone();
        self.polygons.push(zone);
        Some(id)
    }

    pub fn remove_line(&mut self, id: &str) {
        self.lines.retain(|l| l.id != id);
    }

    pub fn remove_polygon(&mut self, id: &str) {
        self.polygons.retain(|p| p.id != id);
    }

    /// Drops all geometry. Id allocation keeps counting so old ids are not handed out again.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.polygons.clear();
    }

    /// Scales every point to new frame dimensions.
    pub fn rescale(&mut self, width: u32, height: u32) {
        if width == self.width && height == self.height {
            return;
        }

        if self.width == 0 || self.height == 0 {
            self.width = width;
            self.height = height;
            return;
        }

        let sx = width as f64 / self.width as f64;
        let sy = height as f64 / self.height as f64;
        let scale = |p: &Point| Point::new((p.x as f64 * sx) as i32, (p.y as f64 * sy) as i32);

        for line in &mut self.lines {
            line.start = scale(&line.start);
            line.end = scale(&line.end);
        }

        for poly in &mut self.polygons {
            for p in &mut poly.points {
                *p = scale(p);
            }
        }

        self.width = width;
        self.height = height;
    }

    /// Frozen copy of the lines, suitable for handing to the engine.
    pub fn lines_snapshot(&self) -> Arc<[CountingLine]> {
        self.lines.clone().into()
    }

    /// Frozen copy of the zones, suitable for handing to the engine.
    pub fn polygons_snapshot(&self) -> Arc<[CountingPolygon]> {
        self.polygons.clone().into()
    }

    pub fn summary(&self) -> String {
        let mut out = Vec::with_capacity(self.lines.len() + self.polygons.len() + 3);
        out.push(format!("Canvas Size: {}x{}", self.width, self.height));
        out.push(format!("Lines: {}", self.lines.len()));
        for line in &self.lines {
            out.push(format!(
                "  - {}: ({}, {}) -> ({}, {})",
                line.name, line.start.x, line.start.y, line.end.x, line.end.y
            ));
        }
        out.push(format!("Zones: {}", self.polygons.len()));
        for poly in &self.polygons {
            out.push(format!("  - {}: {} points", poly.name, poly.points.len()));
        }

        out.join("\n")
    }
}
