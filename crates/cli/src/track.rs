use std::io::BufRead;
use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use clap::{ArgAction, Parser};

use facelog_core::capture::infrastructure::image_file_writer::ImageFileWriter;
use facelog_core::capture::infrastructure::image_sequence_source::ImageSequenceSource;
use facelog_core::capture::unknown_snapshot_writer::UnknownSnapshotWriter;
use facelog_core::detection::infrastructure::sidecar_face_detector::SidecarFaceDetector;
use facelog_core::pipeline::preconditions::{validate_folder_structure, validate_trained_artifacts};
use facelog_core::pipeline::session_logger::StdoutSessionLogger;
use facelog_core::pipeline::track_presence_use_case::TrackPresenceUseCase;
use facelog_core::presence::infrastructure::csv_report_writer::CsvReportWriter;
use facelog_core::recognition::domain::identity_labeler::{AcceptanceBand, IdentityLabeler};
use facelog_core::recognition::infrastructure::label_map_store;
use facelog_core::recognition::infrastructure::lbp_face_recognizer::LbpFaceRecognizer;
use facelog_core::shared::clock::SystemClock;
use facelog_core::shared::workspace_layout::WorkspaceLayout;

/// Logs who is in front of the camera and for how long.
#[derive(Parser)]
#[command(name = "facelog-track")]
struct Cli {
    /// Camera source.
    #[arg(short, long, default_value = "0")]
    camera: u32,

    /// Write a CSV report per person to the reports folder.
    #[arg(short, long, default_value = "true", action = ArgAction::Set)]
    report: bool,

    /// Save a snapshot of every unknown face.
    #[arg(long, default_value = "true", action = ArgAction::Set)]
    capture_unknown: bool,

    /// Working directory holding recognizers, labels, reports, dataset and cameras.
    #[arg(long, default_value = ".")]
    root: PathBuf,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let layout = WorkspaceLayout::load(&cli.root);
    validate_folder_structure(&layout)?;
    validate_trained_artifacts(&layout)?;

    let labels = label_map_store::load(&layout.label_map())?;
    let recognizer = LbpFaceRecognizer::load(&layout.recognizer_model())?;
    log::info!(
        "Loaded recognizer with {} identities",
        recognizer.label_count()
    );

    let source = ImageSequenceSource::open(&layout.camera(cli.camera))?;
    let detector = SidecarFaceDetector::new(source.frame_paths().to_vec());
    let snapshots = cli.capture_unknown.then(|| {
        UnknownSnapshotWriter::new(layout.unknown_snapshots(), Box::new(ImageFileWriter::new()))
    });
    let reports = cli.report.then(|| CsvReportWriter::new(layout.reports()));

    let mut use_case = TrackPresenceUseCase::new(
        Box::new(source),
        Box::new(detector),
        Box::new(recognizer),
        IdentityLabeler::new(labels, AcceptanceBand::default()),
        snapshots,
        reports,
        Box::new(SystemClock),
        Box::new(StdoutSessionLogger::default()),
    );

    let stop = spawn_stop_listener();
    eprintln!("Tracking camera {}. Type 'q' and press Enter to stop.", cli.camera);
    use_case.run(&|| stop.load(Ordering::Relaxed))?;

    if cli.report {
        log::info!("Reports written to {}", layout.reports().display());
    }
    Ok(())
}

/// Sets the returned flag once the user enters `q` on stdin.
fn spawn_stop_listener() -> Arc<AtomicBool> {
    let stop = Arc::new(AtomicBool::new(false));
    let flag = stop.clone();
    thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            match line {
                Ok(line) if line.trim().eq_ignore_ascii_case("q") => break,
                Ok(_) => continue,
                Err(_) => return,
            }
        }
        flag.store(true, Ordering::Relaxed);
    });
    stop
}
