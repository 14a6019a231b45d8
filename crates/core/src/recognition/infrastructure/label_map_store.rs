use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::recognition::domain::label_map::LabelMap;

#[derive(Error, Debug)]
pub enum LabelMapError {
    #[error("failed to read label map {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse label map {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write label map {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("label map {path} assigns id {label_id} to more than one identity")]
    DuplicateId { path: PathBuf, label_id: i32 },
}

/// Loads the JSON label map (`{"identity": id, ...}`) written by training.
pub fn load(path: &Path) -> Result<LabelMap, LabelMapError> {
    let json = fs::read_to_string(path).map_err(|e| LabelMapError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    let ids: BTreeMap<String, i32> =
        serde_json::from_str(&json).map_err(|e| LabelMapError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;

    let labels = LabelMap::from_identity_ids(&ids);
    if labels.len() != ids.len() {
        let mut seen = std::collections::HashSet::new();
        let label_id = ids
            .values()
            .copied()
            .find(|id| !seen.insert(*id))
            .unwrap_or_default();
        return Err(LabelMapError::DuplicateId {
            path: path.to_path_buf(),
            label_id,
        });
    }
    log::debug!("Loaded {} labels from {}", labels.len(), path.display());
    Ok(labels)
}

pub fn save(path: &Path, labels: &LabelMap) -> Result<(), LabelMapError> {
    let write_err = |e| LabelMapError::Write {
        path: path.to_path_buf(),
        source: e,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    let json = serde_json::to_string_pretty(&labels.to_identity_ids())
        .map_err(|e| write_err(std::io::Error::other(e)))?;
    fs::write(path, json).map_err(write_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::identity::Identity;
    use tempfile::TempDir;

    #[test]
    fn test_save_then_load() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("labels").join("face-labels.json");
        let labels = LabelMap::from_iter([(0, Identity::from("alice")), (1, Identity::from("bob"))]);
        save(&path, &labels).unwrap();
        assert_eq!(load(&path).unwrap(), labels);
    }

    #[test]
    fn test_load_missing_file_is_read_error() {
        let tmp = TempDir::new().unwrap();
        let err = load(&tmp.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, LabelMapError::Read { .. }));
    }

    #[test]
    fn test_load_malformed_file_is_parse_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("labels.json");
        fs::write(&path, "[1, 2, 3]").unwrap();
        assert!(matches!(load(&path).unwrap_err(), LabelMapError::Parse { .. }));
    }

    #[test]
    fn test_load_duplicate_id_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("labels.json");
        fs::write(&path, r#"{"alice": 0, "bob": 0}"#).unwrap();
        let err = load(&path).unwrap_err();
        assert!(matches!(err, LabelMapError::DuplicateId { label_id: 0, .. }));
    }
}
