pub mod bbox;
pub mod counter;
pub mod counts;
pub mod crossing;
pub mod detection;
pub mod detector;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod layout;
pub mod line;
pub mod occupancy;
pub mod tracker;
pub mod zone;

mod track;

pub use counter::{CounterConfig, ObjectCounter};
pub use detection::Detection;
pub use detector::{Detector, RecordedDetector};
pub use error::{Error, Result};
pub use frame::Frame;
pub use layout::Layout;
pub use line::CountingLine;
pub use track::{TrackId, TrackedObject};
pub use zone::CountingPolygon;

/// Feeds `frames` from `detector` through `counter`, one update per frame, in order.
///
/// Stops at the first detector error; frames already processed stay counted.
pub fn run<D, I>(
    counter: &mut ObjectCounter,
    detector: &mut D,
    frames: I,
    classes: Option<&[u32]>,
) -> Result<u64>
where
    D: Detector,
    D::Frame: Sized,
    I: IntoIterator<Item = D::Frame>,
{
    let mut processed = 0;

    for frame in frames {
        let dets = detector.detect(&frame, classes)?;
        counter.update(dets, None, None);
        processed += 1;
    }

    Ok(processed)
}
