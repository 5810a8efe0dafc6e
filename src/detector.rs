//! Detector seam and a replayer for recorded detections.
//!
//! Recorded dumps hold one frame per line, `<frame index>:<json array>`, where
//! each array element is a detection record. Lines that cannot be split or
//! parsed are skipped with a warning, and so are individual records that fail
//! to parse, so one bad entry never drops the rest of a stream. A repeated frame
//! index replaces the earlier line, with a warning.

use std::collections::BTreeMap;
use std::io::BufRead;
use std::path::Path;

use crate::detection::Detection;
use crate::error::Error;
use crate::frame::Frame;

/// Produces the detections of a single frame.
pub trait Detector {
    type Frame: ?Sized;
    type Detections: Iterator<Item = Detection>;

    /// Detects objects on `frame`, keeping only `classes` when given.
    fn detect(
        &mut self,
        frame: &Self::Frame,
        classes: Option<&[u32]>,
    ) -> Result<Self::Detections, Error>;
}

/// Detections read back from a dump, addressed by frame index.
#[derive(Debug, Clone, Default)]
pub struct RecordedDetector {
    frames: BTreeMap<u64, Vec<Detection>>,
}

fn parse_line(line: &str, line_no: usize) -> Result<Frame, Error> {
    let (index, payload) = line.split_once(':').ok_or_else(|| Error::InvalidRecord {
        line: line_no,
        reason: "expected `:`".to_string(),
    })?;

    let index = index.trim().parse::<u64>().map_err(|err| Error::InvalidRecord {
        line: line_no,
        reason: format!("bad frame index: {}", err),
    })?;

    let records: Vec<serde_json::Value> = serde_json::from_str(payload)?;
    let mut detections = Vec::with_capacity(records.len());

    for (i, record) in records.into_iter().enumerate() {
        match serde_json::from_value::<Detection>(record) {
            Ok(det) => detections.push(det),
            Err(err) => {
                tracing::warn!(line = line_no, record = i, %err, "skipping detection record")
            }
        }
    }

    Ok(Frame::new(index, detections))
}

impl RecordedDetector {
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, Error> {
        let mut frames = BTreeMap::new();

        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            let line_no = i + 1;

            if line.trim().is_empty() {
                continue;
            }

            match parse_line(&line, line_no) {
                Ok(frame) => {
                    let index = frame.index;
                    if frames.insert(index, frame.detections).is_some() {
                        tracing::warn!(
                            line = line_no,
                            frame = index,
                            "duplicate frame, keeping the later one"
                        );
                    }
                }
                Err(err) => tracing::warn!(line = line_no, %err, "wrong file format"),
            }
        }

        Ok(Self { frames })
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    pub fn from_frames<I: IntoIterator<Item = Frame>>(frames: I) -> Self {
        Self {
            frames: frames
                .into_iter()
                .map(|f| (f.index, f.detections))
                .collect(),
        }
    }

    /// Recorded frame indexes, ascending.
    pub fn frame_indexes(&self) -> Vec<u64> {
        self.frames.keys().copied().collect()
    }

    /// Last recorded index, if any.
    pub fn last_frame(&self) -> Option<u64> {
        self.frames.keys().next_back().copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl Detector for RecordedDetector {
    type Frame = u64;
    type Detections = std::vec::IntoIter<Detection>;

    /// Frames missing from the dump yield no detections.
    fn detect(&mut self, frame: &u64, classes: Option<&[u32]>) -> Result<Self::Detections, Error> {
        let dets = self.frames.get(frame).cloned().unwrap_or_default();

        let dets = match classes {
            Some(classes) => dets
                .into_iter()
                .filter(|d| classes.contains(&d.class_id))
                .collect(),
            None => dets,
        };

        Ok(dets.into_iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DUMP: &str = r#"0:[{"bbox":[0,0,10,10],"confidence":0.9,"class_id":0,"class_name":"person","center":[5,5]}]
1:[{"bbox":[2,0,12,10],"confidence":0.8,"class_id":0,"class_name":"person","center":[7,5]},{"bbox":[50,50,70,70],"confidence":0.7,"class_id":2,"class_name":"car","center":[60,60]}]
garbage line
3:not json

4:[{"bbox":[0,0,10,10],"confidence":0.9,"class_id":-1,"class_name":"person","center":[5,5]},{"bbox":[0,0,10,10],"confidence":0.9,"class_id":1,"class_name":"bicycle","center":[5,5]}]
"#;

    #[test]
    fn reads_dump_and_skips_bad_lines() {
        let rec = RecordedDetector::from_reader(DUMP.as_bytes()).unwrap();
        assert_eq!(rec.frame_indexes(), vec![0, 1, 4]);
        assert_eq!(rec.last_frame(), Some(4));
    }

    #[test]
    fn bad_record_does_not_drop_frame() {
        let mut rec = RecordedDetector::from_reader(DUMP.as_bytes()).unwrap();
        let dets: Vec<_> = rec.detect(&4, None).unwrap().collect();
        assert_eq!(dets.len(), 1);
        assert_eq!(dets[0].class_name, "bicycle");
    }

    #[test]
    fn repeated_frame_keeps_later_line() {
        let dump = "2:[]\n2:[{\"bbox\":[0,0,10,10],\"confidence\":0.9,\"class_id\":0,\"class_name\":\"person\",\"center\":[5,5]}]\n";
        let mut rec = RecordedDetector::from_reader(dump.as_bytes()).unwrap();

        assert_eq!(rec.len(), 1);
        assert_eq!(rec.detect(&2, None).unwrap().count(), 1);
    }

    #[test]
    fn class_filter() {
        let mut rec = RecordedDetector::from_reader(DUMP.as_bytes()).unwrap();

        assert_eq!(rec.detect(&1, None).unwrap().count(), 2);

        let cars: Vec<_> = rec.detect(&1, Some(&[2][..])).unwrap().collect();
        assert_eq!(cars.len(), 1);
        assert_eq!(cars[0].class_name, "car");

        assert_eq!(rec.detect(&2, None).unwrap().count(), 0);
    }
}
