use nalgebra as na;
use serde_derive::{Deserialize, Serialize};

/// Left-top-right-bottom box in integer pixel coordinates, serialized as `[x1, y1, x2, y2]`
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct BBox([i32; 4]);

impl From<[i32; 4]> for BBox {
    #[inline]
    fn from(ltrb: [i32; 4]) -> Self {
        BBox(ltrb)
    }
}

impl From<BBox> for [i32; 4] {
    #[inline]
    fn from(bbox: BBox) -> Self {
        bbox.0
    }
}

impl BBox {
    #[inline]
    pub fn ltrb(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        BBox([left, top, right, bottom])
    }

    #[inline]
    pub fn as_slice(&self) -> &[i32; 4] {
        &self.0
    }

    #[inline(always)]
    pub fn left(&self) -> i32 {
        self.0[0]
    }

    #[inline(always)]
    pub fn top(&self) -> i32 {
        self.0[1]
    }

    #[inline(always)]
    pub fn right(&self) -> i32 {
        self.0[2]
    }

    #[inline(always)]
    pub fn bottom(&self) -> i32 {
        self.0[3]
    }

    /// Midpoint rounded toward zero, the way detectors report it.
    #[inline]
    pub fn center(&self) -> na::Point2<i32> {
        let mid = |a: i32, b: i32| ((a as i64 + b as i64) / 2) as i32;

        na::Point2::new(mid(self.0[0], self.0[2]), mid(self.0[1], self.0[3]))
    }

    /// A box is usable only when it has strictly positive extent on both axes.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.0[0] < self.0[2] && self.0[1] < self.0[3]
    }

    #[inline]
    pub fn contains(&self, p: &na::Point2<i32>) -> bool {
        p.x >= self.0[0] && p.x <= self.0[2] && p.y >= self.0[1] && p.y <= self.0[3]
    }
}
