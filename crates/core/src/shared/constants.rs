/// Sentinel identity for faces the recognizer could not match.
pub const UNKNOWN_IDENTITY: &str = "Unknown";

/// Closed acceptance band for recognizer confidence (lower = closer match).
pub const ACCEPTANCE_LOWER: f64 = 40.0;
pub const ACCEPTANCE_UPPER: f64 = 85.0;

pub const DEFAULT_DATASET_COUNT: usize = 1000;
/// Pause between dataset captures.
pub const DEFAULT_CAPTURE_INTERVAL_MS: u64 = 2000;

pub const RECOGNIZER_MODEL_FILENAME: &str = "face-trainer.json";
pub const LABEL_MAP_FILENAME: &str = "face-labels.json";
pub const WORKSPACE_CONFIG_FILENAME: &str = "facelog.json";

/// Folder under the dataset base that holds unknown-face snapshots.
/// Skipped when training.
pub const UNKNOWN_SNAPSHOT_DIRNAME: &str = "unknown";

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];
