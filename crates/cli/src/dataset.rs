use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

use clap::{ArgAction, Parser};

use facelog_core::capture::infrastructure::image_file_writer::ImageFileWriter;
use facelog_core::capture::infrastructure::image_sequence_source::ImageSequenceSource;
use facelog_core::dataset::dataset_directory::{check_base_dir, prepare_dataset_dir};
use facelog_core::dataset::unique_id::UniqueIdSequence;
use facelog_core::pipeline::create_dataset_use_case::CreateDatasetUseCase;
use facelog_core::pipeline::train_recognizer_use_case::train_recognizer;
use facelog_core::shared::constants::{DEFAULT_CAPTURE_INTERVAL_MS, DEFAULT_DATASET_COUNT};
use facelog_core::shared::workspace_layout::WorkspaceLayout;

/// Captures a face dataset for one person from the camera.
#[derive(Parser)]
#[command(name = "facelog-dataset")]
struct Cli {
    /// Name of the dataset (the person being captured).
    name: String,

    /// Number of images to take.
    #[arg(short, long, default_value_t = DEFAULT_DATASET_COUNT)]
    count: usize,

    /// Base directory where the dataset is saved.
    #[arg(short, long, default_value = "dataset")]
    base_dir: PathBuf,

    /// Remove existing images of this dataset first.
    #[arg(long, default_value = "false", action = ArgAction::Set)]
    clean: bool,

    /// Camera source.
    #[arg(long, default_value = "0")]
    camera: u32,

    /// Train the recognizer once capturing is done.
    #[arg(long, default_value = "true", action = ArgAction::Set)]
    run_train: bool,

    /// Pause between two captures, in milliseconds.
    #[arg(long, default_value_t = DEFAULT_CAPTURE_INTERVAL_MS)]
    interval_ms: u64,

    /// Skip the readiness prompt.
    #[arg(short, long)]
    yes: bool,
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

    check_base_dir(&cli.base_dir)?;
    let dataset_dir = prepare_dataset_dir(&cli.base_dir, &cli.name, cli.clean)?;

    if !cli.yes && !confirm_ready()? {
        return Ok(());
    }

    let mut layout = WorkspaceLayout::load(Path::new("."));
    let source = ImageSequenceSource::open(&layout.camera(cli.camera))?;
    eprintln!(
        "Turning on camera {} to take {} frames. Smile :)...",
        cli.camera, cli.count
    );

    let progress: Box<dyn Fn(usize, usize) + Send> = Box::new(|current, total| {
        eprint!("\rCaptured {current}/{total}");
    });
    let mut use_case = CreateDatasetUseCase::new(
        Box::new(source),
        Box::new(ImageFileWriter::new()),
        UniqueIdSequence::new(),
        Duration::from_millis(cli.interval_ms),
        Some(progress),
    );
    let written = use_case.execute(&dataset_dir, cli.count);
    eprintln!();
    let written = written?;
    log::info!("Saved {} images to {}", written.len(), dataset_dir.display());

    if cli.run_train {
        layout.dataset_dir = cli.base_dir;
        let identities = train_recognizer(&layout)?;
        eprintln!("Recognizer trained on {identities} people.");
    } else {
        eprintln!("Run training to let the recognizer learn from the new dataset.");
    }
    Ok(())
}

/// Only an explicit "n" aborts.
fn confirm_ready() -> io::Result<bool> {
    eprint!("Are you ready to take pictures? y/n: ");
    io::stderr().flush()?;
    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;
    Ok(answer.trim() != "n")
}
