use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, Subcommand};
use image::ImageReader;
use ring_gauge::config::{SessionConfig, StrategyKind};
use ring_gauge::data_loader::{measure_capture_file, measure_folder, measure_landmarks_file};
use ring_gauge::io::{CaptureReport, object_from_json, write_measurement_report};
use ring_gauge::quad::CardDetector;
use ring_gauge::recommendation::{RecommendationRequest, SizeGuide, SizeRecommender};

#[derive(Parser)]
#[command(version, about, author)]
struct RingGaugeCli {
    #[command(subcommand)]
    command: Command,

    /// session config json, defaults are used for missing fields
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// overrides the calibration strategy from the config
    #[arg(long, value_enum, global = true)]
    strategy: Option<StrategyKind>,

    /// body height in mm, needed by the height-heuristic strategy
    #[arg(long, global = true)]
    height_mm: Option<f64>,

    /// size guide json ({"rows": [{"label", "circumference_mm"}]})
    #[arg(long, global = true)]
    size_guide: Option<PathBuf>,

    /// save a rerun recording of the overlays to this .rrd file
    #[arg(long, global = true)]
    rerun: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// measure one square capture with its <stem>.landmarks.json sidecar
    Measure {
        image: Option<PathBuf>,
        /// landmark json without an image, measured on a capture_size frame
        #[arg(long, conflicts_with = "image")]
        landmarks: Option<PathBuf>,
    },
    /// measure every capture in a folder and write a json report
    Batch {
        folder: String,
        #[arg(short, long, default_value = "report.json")]
        output: PathBuf,
    },
    /// find the reference card and write the rectified crop
    DetectCard {
        image: PathBuf,
        #[arg(short, long, default_value = "card_rectified.png")]
        output: PathBuf,
    },
}

fn with_recommendation(mut report: CaptureReport, guide: Option<&SizeGuide>) -> CaptureReport {
    if let (Some(guide), Some(width_cm)) = (guide, report.finger_width_cm) {
        let request = RecommendationRequest {
            finger_width_cm: width_cm,
            reference_image_base64: String::new(),
        };
        match guide.recommend(&request) {
            Ok(rec) => report.recommendation = Some(rec),
            Err(e) => log::warn!("{}: {}", report.capture, e),
        }
    }
    report
}

fn capture_name(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = RingGaugeCli::parse();

    let mut config: SessionConfig = match &cli.config {
        Some(path) => object_from_json(path)?,
        None => SessionConfig::default(),
    };
    if let Some(kind) = cli.strategy {
        config.strategy = kind;
    }
    let size_guide: Option<SizeGuide> = cli
        .size_guide
        .as_ref()
        .map(|p| object_from_json::<SizeGuide, _>(p))
        .transpose()?;
    let recording = match &cli.rerun {
        Some(path) => Some(rerun::RecordingStreamBuilder::new("ring_gauge").save(path)?),
        None => None,
    };
    let strategy = config.strategy(cli.height_mm);

    match &cli.command {
        Command::Measure { image, landmarks } => {
            let (name, outcome) = match (image, landmarks) {
                (Some(image), _) => (
                    capture_name(image),
                    measure_capture_file(image, &strategy, &config.measurement, recording.as_ref()),
                ),
                (None, Some(landmarks)) => (
                    capture_name(landmarks),
                    measure_landmarks_file(
                        landmarks,
                        config.capture_size,
                        &strategy,
                        &config.measurement,
                    ),
                ),
                (None, None) => return Err("measure needs an image or --landmarks".into()),
            };
            let report = with_recommendation(
                CaptureReport::from_outcome(&name, &outcome),
                size_guide.as_ref(),
            );
            println!("{}", serde_json::to_string_pretty(&report)?);
            outcome?;
        }
        Command::Batch { folder, output } => {
            let now = Instant::now();
            let results =
                measure_folder(folder, &strategy, &config.measurement, recording.as_ref())?;
            let duration_sec = now.elapsed().as_secs_f64();
            println!("measuring {} captures took {:.6} sec", results.len(), duration_sec);
            let reports: Vec<_> = results
                .iter()
                .map(|(path, outcome)| {
                    with_recommendation(
                        CaptureReport::from_outcome(&capture_name(path), outcome),
                        size_guide.as_ref(),
                    )
                })
                .collect();
            for r in &reports {
                match (&r.finger_width_mm, &r.error) {
                    (Some(w), _) => println!("{}: {:.2} mm", r.capture, w),
                    (None, Some(e)) => println!("{}: failed ({})", r.capture, e),
                    (None, None) => {}
                }
            }
            write_measurement_report(output, &reports)?;
            println!("report written to {}", output.display());
        }
        Command::DetectCard { image, output } => {
            let img = ImageReader::open(image)?.decode()?;
            let card = CardDetector::new(config.detector.clone()).detect(&img)?;
            card.image.save(output)?;
            println!(
                "card {:.1}x{:.1} px, {:.5} mm/px, written to {}",
                card.width_px,
                card.height_px,
                config.card_width_mm / card.width_px,
                output.display()
            );
        }
    }
    Ok(())
}
