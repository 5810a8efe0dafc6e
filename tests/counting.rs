//! End-to-end counting behaviour through the public engine API.

use std::sync::Arc;

use linecount::bbox::BBox;
use linecount::counts::{LineCounts, ZoneCounts};
use linecount::geometry::Point;
use linecount::{
    CounterConfig, CountingLine, CountingPolygon, Detection, Frame, ObjectCounter,
    RecordedDetector,
};

fn det(x: i32, y: i32, class_id: u32, class_name: &str) -> Detection {
    Detection::new(BBox::ltrb(x - 8, y - 8, x + 8, y + 8), 0.9, class_id, class_name)
}

fn person(x: i32, y: i32) -> Detection {
    det(x, y, 0, "person")
}

fn horizontal_gate() -> Arc<[CountingLine]> {
    Arc::from(vec![CountingLine::new(
        "line_1",
        Point::new(-100, 0),
        Point::new(100, 0),
    )
    .with_name("Gate")])
}

fn square_zone() -> Arc<[CountingPolygon]> {
    Arc::from(vec![CountingPolygon::new(
        "zone_1",
        vec![
            Point::new(0, 0),
            Point::new(100, 0),
            Point::new(100, 100),
            Point::new(0, 100),
        ],
    )
    .with_name("Dock")])
}

fn counter() -> ObjectCounter {
    ObjectCounter::new(CounterConfig::default()).unwrap()
}

#[test]
fn sweep_across_line_counts_once() {
    let mut counter = counter();
    let lines = horizontal_gate();

    // one sample per pixel, including the frame exactly on the line
    for y in (-100..=100).rev() {
        counter.update(vec![person(0, y)], Some(lines.clone()), None);
    }

    assert_eq!(counter.tracks().len(), 1);
    assert_eq!(
        counter.line_counts()["line_1"],
        LineCounts {
            inbound: 1,
            outbound: 0,
            total: 1
        }
    );
}

#[test]
fn out_and_back_counts_first_crossing_only() {
    let mut counter = counter();
    counter.update(vec![person(0, 50)], Some(horizontal_gate()), None);

    let path = [40, 20, -20, -40, -20, 20, 40, 20, -20];
    for y in path {
        counter.update(vec![person(0, y)], None, None);
    }

    let c = counter.line_counts()["line_1"];
    assert_eq!(c.total, 1);
    assert_eq!(c.inbound, 1);
    assert_eq!(c.outbound, 0);
    assert!(counter.tracks()[&1].has_crossed("line_1"));
}

#[test]
fn crossed_lines_never_shrink() {
    let mut counter = counter();
    let lines: Arc<[CountingLine]> = Arc::from(vec![
        CountingLine::new("h", Point::new(-500, 0), Point::new(500, 0)),
        CountingLine::new("v", Point::new(0, -500), Point::new(0, 500)),
    ]);
    counter.update(vec![person(-60, -60)], Some(lines), None);

    let mut seen = 0;
    for step in 0..40 {
        let x = -60 + step * 5;
        let y = if step % 2 == 0 { -60 + step * 4 } else { -60 + step * 2 };
        counter.update(vec![person(x, y)], None, None);

        let crossed = counter.tracks()[&1].crossed_lines.len();
        assert!(crossed >= seen);
        seen = crossed;
    }

    assert_eq!(seen, 2);
}

#[test]
fn zone_entered_once_and_counted_while_inside() {
    let mut counter = counter();
    let zones = square_zone();

    counter.update(vec![person(50, 50)], None, Some(zones));
    assert_eq!(
        counter.zone_counts()["zone_1"],
        ZoneCounts {
            count: 1,
            entered: 1,
            exited: 0
        }
    );

    for _ in 0..5 {
        counter.update(vec![person(50, 50)], None, None);
        assert_eq!(counter.zone_counts()["zone_1"].count, 1);
        assert_eq!(counter.zone_counts()["zone_1"].entered, 1);
    }

    counter.update(vec![person(130, 50)], None, None);
    assert_eq!(
        counter.zone_counts()["zone_1"],
        ZoneCounts {
            count: 0,
            entered: 1,
            exited: 1
        }
    );
}

#[test]
fn zone_count_matches_live_tracks_inside() {
    let mut counter = counter();
    let zones = square_zone();
    counter.update(Vec::new(), None, Some(zones.clone()));

    let frames: Vec<Vec<Detection>> = vec![
        vec![person(10, 10), person(300, 300), person(90, 90)],
        vec![person(20, 10), person(290, 300), person(120, 90)],
        vec![person(30, 10), person(250, 250)],
        vec![person(150, 10), person(200, 200)],
        vec![],
    ];

    for dets in frames {
        counter.update(dets, None, None);

        let inside = counter
            .tracks()
            .values()
            .filter(|t| zones[0].contains(&t.current_center))
            .count() as u64;

        assert_eq!(counter.zone_counts()["zone_1"].count, inside);

        let members = counter
            .tracks()
            .values()
            .filter(|t| t.is_in_zone("zone_1"))
            .count() as u64;
        assert_eq!(members, inside);
    }
}

#[test]
fn expiry_after_max_frames_missing_plus_one() {
    let max_missing = 3;
    let mut counter = ObjectCounter::new(CounterConfig::new(100.0, max_missing)).unwrap();
    counter.update(vec![person(10, 10)], None, None);

    for missed in 1..=max_missing {
        counter.update(Vec::new(), None, None);
        let track = &counter.tracks()[&1];
        assert_eq!(track.frames_missing, missed);
    }

    counter.update(Vec::new(), None, None);
    assert!(counter.tracks().is_empty());

    counter.update(vec![person(10, 10)], None, None);
    assert!(counter.tracks().contains_key(&2));
}

#[test]
fn rematch_resets_missing_counter() {
    let mut counter = ObjectCounter::new(CounterConfig::new(100.0, 2)).unwrap();
    counter.update(vec![person(10, 10)], None, None);
    counter.update(Vec::new(), None, None);
    counter.update(Vec::new(), None, None);
    counter.update(vec![person(15, 10)], None, None);

    let track = &counter.tracks()[&1];
    assert_eq!(track.frames_missing, 0);
    assert_eq!(track.previous_center, Some(Point::new(10, 10)));
}

#[test]
fn classes_never_match_each_other() {
    let mut counter = counter();
    counter.update(vec![det(10, 10, 2, "car")], None, None);
    counter.update(vec![det(12, 10, 0, "person")], None, None);

    let tracks = counter.tracks();
    assert_eq!(tracks.len(), 2);
    assert_eq!(tracks[&1].class_name, "car");
    assert_eq!(tracks[&2].class_name, "person");
}

#[test]
fn closest_detection_claims_track_first() {
    let mut counter = counter();
    counter.update(vec![person(0, 0), person(120, 0)], None, None);

    // detection 1 is the closest pair overall and takes track 1; detection 0
    // is equally close to both tracks and falls to track 2
    counter.update(vec![person(60, 0), person(5, 0)], None, None);

    let tracks = counter.tracks();
    assert_eq!(tracks.len(), 2);
    assert_eq!(tracks[&1].current_center, Point::new(5, 0));
    assert_eq!(tracks[&2].current_center, Point::new(60, 0));
}

#[test]
fn far_apart_coordinates_keep_engine_alive() {
    let mut counter = counter();
    let tall: Arc<[CountingPolygon]> = Arc::from(vec![CountingPolygon::new(
        "zone_1",
        vec![
            Point::new(-10, -2_000_000_000),
            Point::new(10, -2_000_000_000),
            Point::new(0, 2_000_000_000),
        ],
    )]);

    counter.update(vec![person(-2_000_000_000, 0)], None, Some(tall));
    counter.update(vec![person(2_000_000_000, 0)], None, None);
    counter.update(vec![person(0, 0)], None, None);

    let tracks = counter.tracks();
    assert_eq!(tracks.len(), 3);
    assert!(tracks[&3].is_in_zone("zone_1"));
    assert_eq!(counter.zone_counts()["zone_1"].count, 1);
}

fn scripted_run(counter: &mut ObjectCounter) {
    let lines = horizontal_gate();
    let zones = square_zone();

    for frame in 0..60 {
        let mut dets = vec![
            person(10 + frame, 80 - frame * 3),
            det(90 - frame, -40 + frame * 2, 2, "car"),
        ];
        if frame % 7 != 3 {
            dets.push(person(50, 20 + frame));
        }

        let geometry = if frame == 0 {
            (Some(lines.clone()), Some(zones.clone()))
        } else {
            (None, None)
        };
        counter.update(dets, geometry.0, geometry.1);
    }
}

#[test]
fn reset_then_replay_is_idempotent() {
    let mut counter = counter();
    scripted_run(&mut counter);
    let first = counter.all_counts();
    let first_breakdown = counter.class_breakdown();
    let first_ids: Vec<_> = counter.tracks().keys().copied().collect();

    counter.reset();
    assert!(counter.tracks().is_empty());
    assert_eq!(counter.line_counts()["line_1"], LineCounts::default());

    scripted_run(&mut counter);
    assert_eq!(counter.all_counts(), first);
    assert_eq!(counter.class_breakdown(), first_breakdown);
    assert_eq!(counter.tracks().keys().copied().collect::<Vec<_>>(), first_ids);
}

#[test]
fn independent_runs_are_identical() {
    let mut a = counter();
    let mut b = counter();
    scripted_run(&mut a);
    scripted_run(&mut b);

    assert_eq!(a.all_counts(), b.all_counts());
    assert_eq!(a.counters(), b.counters());
    assert_eq!(a.tracks(), b.tracks());
    assert!(a.line_counts()["line_1"].total > 0);
}

#[test]
fn reset_counts_keeps_tracks() {
    let mut counter = counter();
    scripted_run(&mut counter);
    let tracks = counter.tracks().len();

    counter.reset_counts();
    assert_eq!(counter.tracks().len(), tracks);
    assert_eq!(counter.zone_counts()["zone_1"], ZoneCounts::default());
    assert_eq!(counter.counts().len(), 2);
}

#[test]
fn per_class_tallies_and_summaries() {
    let mut counter = counter();
    let lines = horizontal_gate();

    counter.update(
        vec![person(-50, 30), det(50, 30, 2, "car")],
        Some(lines),
        Some(square_zone()),
    );
    counter.update(vec![person(-50, 20), det(50, 20, 2, "car")], None, None);
    counter.update(vec![person(-50, -20), det(50, -20, 2, "car")], None, None);

    let agg = counter.counters();
    assert_eq!(agg.line_class("line_1", "person").inbound, 1);
    assert_eq!(agg.line_class("line_1", "car").inbound, 1);
    assert_eq!(agg.zone_class("zone_1", "car"), 0);

    assert_eq!(
        counter.count_summary(),
        "Gate: In=2, Out=0, Total=2\nDock: Current=0, Entered=1, Exited=1"
    );
    assert_eq!(
        counter.counts(),
        vec![("Gate".to_string(), 2), ("Dock".to_string(), 0)]
    );
}

#[test]
fn replayed_dump_drives_engine() {
    let frames = (0..10).map(|i| Frame::new(i, vec![person(0, 45 - i as i32 * 10)]));
    let mut detector = RecordedDetector::from_frames(frames);

    let mut counter = counter();
    counter.set_lines(horizontal_gate());

    let processed = linecount::run(&mut counter, &mut detector, 0..10, Some(&[0][..])).unwrap();
    assert_eq!(processed, 10);
    assert_eq!(counter.line_counts()["line_1"].total, 1);

    counter.reset();
    linecount::run(&mut counter, &mut detector, 0..10, Some(&[5][..])).unwrap();
    assert!(counter.tracks().is_empty());
    assert_eq!(counter.line_counts()["line_1"].total, 0);
}
