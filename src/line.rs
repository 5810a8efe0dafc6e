use serde_derive::{Deserialize, Serialize};

use crate::geometry::{self, Point};

pub const DEFAULT_LINE_COLOR: [u8; 3] = [255, 165, 0];
pub const DEFAULT_LINE_THICKNESS: u32 = 3;

/// Display hint for which crossings the user cares about. Counting ignores it.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LineDirection {
    In,
    Out,
    #[default]
    Both,
}

/// Counting line between two pixel points.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CountingLine {
    pub id: String,
    pub start: Point,
    pub end: Point,
    #[serde(default = "default_name")]
    pub name: String,
    /// BGR
    #[serde(default = "default_color")]
    pub color: [u8; 3],
    #[serde(default = "default_thickness")]
    pub thickness: u32,
    #[serde(default)]
    pub direction: LineDirection,
}

fn default_name() -> String {
    "Line".to_string()
}

fn default_color() -> [u8; 3] {
    DEFAULT_LINE_COLOR
}

fn default_thickness() -> u32 {
    DEFAULT_LINE_THICKNESS
}

impl CountingLine {
    pub fn new(id: impl Into<String>, start: Point, end: Point) -> Self {
        Self {
            id: id.into(),
            start,
            end,
            name: default_name(),
            color: DEFAULT_LINE_COLOR,
            thickness: DEFAULT_LINE_THICKNESS,
            direction: LineDirection::Both,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[inline]
    pub fn equation(&self) -> (f64, f64, f64) {
        geometry::line_equation(&self.start, &self.end)
    }

    #[inline]
    pub fn side(&self, p: &Point) -> i8 {
        geometry::line_side(&self.start, &self.end, p)
    }
}
