use linecount::{CounterConfig, Layout, ObjectCounter, RecordedDetector};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), linecount::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut args = std::env::args();
    let _ = args.next();
    let layout_file_name = args.next().expect("expected layout file name");
    let dets_file_name = args.next().expect("expected detections file name");

    let config = match args.next() {
        Some(config_file_name) => {
            let file = std::fs::File::open(config_file_name)?;
            serde_json::from_reader(std::io::BufReader::new(file))?
        }
        None => CounterConfig::default(),
    };

    let layout = Layout::load(&layout_file_name)?;
    println!("{}", layout.summary());

    let mut detector = RecordedDetector::load(&dets_file_name)?;
    let mut counter = ObjectCounter::new(config)?;
    counter.apply_layout(&layout);
    counter.reset_counts();

    // every index up to the last recorded one, so gaps count as empty frames
    let frames = 0..=detector.last_frame().unwrap_or(0);
    let processed = linecount::run(&mut counter, &mut detector, frames, None)?;

    tracing::info!(
        frames = processed,
        tracks = counter.tracks().len(),
        "replay finished"
    );

    println!();
    println!("{}", counter.count_summary());
    println!();
    println!("{}", counter.class_breakdown());

    Ok(())
}
