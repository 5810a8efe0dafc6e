use crate::detection::Detection;

/// All detections recorded for one video frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub index: u64,
    pub detections: Vec<Detection>,
}

impl Frame {
    pub fn new(index: u64, detections: Vec<Detection>) -> Self {
        Self { index, detections }
    }
}
