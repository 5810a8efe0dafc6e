use serde_derive::{Deserialize, Serialize};

use crate::geometry::{self, Point};

pub const DEFAULT_ZONE_COLOR: [u8; 3] = [255, 0, 255];
pub const DEFAULT_ZONE_THICKNESS: u32 = 2;
pub const DEFAULT_FILL_ALPHA: f32 = 0.3;

/// Polygonal counting zone. Needs at least three vertices to contain anything.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CountingPolygon {
    pub id: String,
    pub points: Vec<Point>,
    #[serde(default = "default_name")]
    pub name: String,
    /// BGR
    #[serde(default = "default_color")]
    pub color: [u8; 3],
    #[serde(default = "default_thickness")]
    pub thickness: u32,
    #[serde(default = "default_fill_alpha", alias = "fillAlpha")]
    pub fill_alpha: f32,
}

fn default_name() -> String {
    "Zone".to_string()
}

fn default_color() -> [u8; 3] {
    DEFAULT_ZONE_COLOR
}

fn default_thickness() -> u32 {
    DEFAULT_ZONE_THICKNESS
}

fn default_fill_alpha() -> f32 {
    DEFAULT_FILL_ALPHA
}

impl CountingPolygon {
    pub fn new(id: impl Into<String>, points: Vec<Point>) -> Self {
        Self {
            id: id.into(),
            points,
            name: default_name(),
            color: DEFAULT_ZONE_COLOR,
            thickness: DEFAULT_ZONE_THICKNESS,
            fill_alpha: DEFAULT_FILL_ALPHA,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[inline]
    pub fn is_usable(&self) -> bool {
        self.points.len() >= 3
    }

    #[inline]
    pub fn contains(&self, p: &Point) -> bool {
        geometry::polygon_contains(&self.points, p)
    }
}
