use nalgebra as na;
use serde_derive::{Deserialize, Serialize};

use crate::bbox::BBox;
use crate::error::Error;

/// One detected object on a single frame.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Detection {
    pub bbox: BBox,
    pub confidence: f32,
    pub class_id: u32,
    pub class_name: String,
    pub center: na::Point2<i32>,
}

impl Detection {
    /// Builds a detection whose center is the midpoint of `bbox`.
    pub fn new(bbox: BBox, confidence: f32, class_id: u32, class_name: impl Into<String>) -> Self {
        Self {
            center: bbox.center(),
            bbox,
            confidence,
            class_id,
            class_name: class_name.into(),
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        if !self.bbox.is_valid() {
            return Err(Error::InvalidDetection(format!(
                "empty bounding box {:?}",
                self.bbox.as_slice()
            )));
        }

        if !self.confidence.is_finite() || !(0.0..=1.0).contains(&self.confidence) {
            return Err(Error::InvalidDetection(format!(
                "confidence {} outside [0, 1]",
                self.confidence
            )));
        }

        if !self.bbox.contains(&self.center) {
            return Err(Error::InvalidDetection(format!(
                "center ({}, {}) outside bounding box {:?}",
                self.center.x,
                self.center.y,
                self.bbox.as_slice()
            )));
        }

        Ok(())
    }

    #[inline]
    pub fn distance(&self, p: &na::Point2<i32>) -> f64 {
        let dx = self.center.x as f64 - p.x as f64;
        let dy = self.center.y as f64 - p.y as f64;

        dx.hypot(dy)
    }
}
