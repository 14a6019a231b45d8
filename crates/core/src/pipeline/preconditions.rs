use std::path::PathBuf;

use thiserror::Error;

use crate::shared::workspace_layout::WorkspaceLayout;

#[derive(Error, Debug, PartialEq)]
pub enum PreconditionError {
    #[error("missing compulsory folder structure: {}", display_paths(.0))]
    MissingFolders(Vec<PathBuf>),
    #[error("missing files for recognizing people ({}); create a dataset and train the recognizer first", display_paths(.0))]
    MissingArtifacts(Vec<PathBuf>),
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// The recognizer, label and report folders must exist before a session.
pub fn validate_folder_structure(layout: &WorkspaceLayout) -> Result<(), PreconditionError> {
    let missing: Vec<PathBuf> = [layout.recognizers(), layout.labels(), layout.reports()]
        .into_iter()
        .filter(|dir| !dir.is_dir())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(PreconditionError::MissingFolders(missing))
    }
}

/// The trained recognizer model and its label map must both be present.
pub fn validate_trained_artifacts(layout: &WorkspaceLayout) -> Result<(), PreconditionError> {
    let missing: Vec<PathBuf> = [layout.recognizer_model(), layout.label_map()]
        .into_iter()
        .filter(|file| !file.is_file())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(PreconditionError::MissingArtifacts(missing))
    }
}
