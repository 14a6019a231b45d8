use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("dataset base folder does not exist: {0}")]
    MissingBaseDir(PathBuf),
    #[error("failed to prepare dataset folder {path}: {source}")]
    Prepare {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("camera did not return a frame")]
    CameraFailed,
}

pub fn check_base_dir(base_dir: &Path) -> Result<(), DatasetError> {
    log::info!("Checking directory: {} ...", base_dir.display());
    if !base_dir.is_dir() {
        return Err(DatasetError::MissingBaseDir(base_dir.to_path_buf()));
    }
    Ok(())
}

/// Returns `base_dir/name`, ready for new images.
///
/// With `clean`, any existing folder is removed first so it starts empty.
/// Without it, an existing folder is reused as-is and a missing one is
/// created.
pub fn prepare_dataset_dir(base_dir: &Path, name: &str, clean: bool) -> Result<PathBuf, DatasetError> {
    let dataset_dir = base_dir.join(name);
    let prepare_err = |e| DatasetError::Prepare {
        path: dataset_dir.clone(),
        source: e,
    };

    if clean && dataset_dir.is_dir() {
        log::info!("Removing existing dataset {}", dataset_dir.display());
        fs::remove_dir_all(&dataset_dir).map_err(prepare_err)?;
    }
    if !dataset_dir.is_dir() {
        fs::create_dir_all(&dataset_dir).map_err(prepare_err)?;
    }
    Ok(dataset_dir)
}
