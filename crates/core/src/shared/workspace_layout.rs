use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::shared::constants::{
    LABEL_MAP_FILENAME, RECOGNIZER_MODEL_FILENAME, UNKNOWN_SNAPSHOT_DIRNAME,
    WORKSPACE_CONFIG_FILENAME,
};

/// Directory conventions for a facelog working tree.
///
/// Every path is relative to `root`. Defaults match the layout the tools
/// create; a `facelog.json` in the root may override individual entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceLayout {
    #[serde(skip)]
    pub root: PathBuf,
    pub recognizers_dir: PathBuf,
    pub labels_dir: PathBuf,
    pub reports_dir: PathBuf,
    pub dataset_dir: PathBuf,
    pub cameras_dir: PathBuf,
}

impl Default for WorkspaceLayout {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            recognizers_dir: PathBuf::from("recognizers"),
            labels_dir: PathBuf::from("labels"),
            reports_dir: PathBuf::from("reports"),
            dataset_dir: PathBuf::from("dataset"),
            cameras_dir: PathBuf::from("cameras"),
        }
    }
}

impl WorkspaceLayout {
    /// Loads the layout for `root`, falling back to defaults when the config
    /// file is absent or unreadable.
    pub fn load(root: &Path) -> Self {
        let path = root.join(WORKSPACE_CONFIG_FILENAME);
        let mut layout: Self = fs::read_to_string(&path)
            .ok()
            .and_then(|json| match serde_json::from_str(&json) {
                Ok(layout) => Some(layout),
                Err(e) => {
                    log::warn!("Ignoring invalid {}: {e}", path.display());
                    None
                }
            })
            .unwrap_or_default();
        layout.root = root.to_path_buf();
        layout
    }

    pub fn recognizers(&self) -> PathBuf {
        self.root.join(&self.recognizers_dir)
    }

    pub fn labels(&self) -> PathBuf {
        self.root.join(&self.labels_dir)
    }

    pub fn reports(&self) -> PathBuf {
        self.root.join(&self.reports_dir)
    }

    pub fn dataset(&self) -> PathBuf {
        self.root.join(&self.dataset_dir)
    }

    pub fn unknown_snapshots(&self) -> PathBuf {
        self.dataset().join(UNKNOWN_SNAPSHOT_DIRNAME)
    }

    /// Frame directory backing the virtual camera with the given index.
    pub fn camera(&self, index: u32) -> PathBuf {
        self.root.join(&self.cameras_dir).join(index.to_string())
    }

    pub fn recognizer_model(&self) -> PathBuf {
        self.recognizers().join(RECOGNIZER_MODEL_FILENAME)
    }

    pub fn label_map(&self) -> PathBuf {
        self.labels().join(LABEL_MAP_FILENAME)
    }
}
