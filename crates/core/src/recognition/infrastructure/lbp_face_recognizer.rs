//! Local-binary-pattern recognizer.
//!
//! Each face is reduced to a grid of LBP histograms; a label is modelled by
//! the mean histogram of its training images. Prediction returns the nearest
//! label by chi-square distance, so confidence follows the "lower is closer"
//! convention the acceptance band expects.
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use image::GrayImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::recognition::domain::face_recognizer::{FaceRecognizer, Prediction};
use crate::recognition::domain::label_map::LabelMap;
use crate::shared::constants::{IMAGE_EXTENSIONS, UNKNOWN_SNAPSHOT_DIRNAME};
use crate::shared::frame::Frame;
use crate::shared::identity::Identity;

/// Side length faces are resized to before feature extraction.
pub const FACE_SIZE: u32 = 64;
/// Cells per side of the histogram grid.
pub const GRID: usize = 8;
const BINS: usize = 256;

/// Clockwise from the top-left neighbour.
const NEIGHBOURS: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
];

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse recognizer model {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write recognizer model {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode training image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("no training images found under {0}")]
    EmptyDataset(PathBuf),
    #[error("recognizer model has no labels")]
    Untrained,
    #[error("face crop has no pixels")]
    EmptyFace,
    #[error("recognizer model {path} does not match this build: {reason}")]
    Incompatible { path: PathBuf, reason: String },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct LabelModel {
    label_id: i32,
    samples: usize,
    histogram: Vec<f64>,
}

/// Trained LBP model, persisted as JSON.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LbpFaceRecognizer {
    face_size: u32,
    grid: usize,
    labels: Vec<LabelModel>,
}

/// Result of [`LbpFaceRecognizer::train`]: the model plus the label map that
/// names its label ids.
pub struct TrainedModel {
    pub recognizer: LbpFaceRecognizer,
    pub labels: LabelMap,
}

impl LbpFaceRecognizer {
    /// Trains on `dataset_dir/<identity>/*.<image>`.
    ///
    /// Identities are numbered in sorted order starting at 0. The unknown
    /// snapshot folder and stray files at the top level are ignored.
    pub fn train(dataset_dir: &Path) -> Result<TrainedModel, ModelError> {
        let mut by_identity: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
        for entry in read_dir_sorted(dataset_dir)? {
            if !entry.is_dir() {
                continue;
            }
            let Some(name) = entry.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if name == UNKNOWN_SNAPSHOT_DIRNAME {
                continue;
            }
            let images: Vec<PathBuf> = read_dir_sorted(&entry)?
                .into_iter()
                .filter(|p| is_image(p))
                .collect();
            if !images.is_empty() {
                by_identity.insert(name.to_string(), images);
            }
        }

        if by_identity.is_empty() {
            return Err(ModelError::EmptyDataset(dataset_dir.to_path_buf()));
        }

        let mut labels = Vec::with_capacity(by_identity.len());
        let mut names = Vec::with_capacity(by_identity.len());
        for (label_id, (name, images)) in by_identity.into_iter().enumerate() {
            let label_id = label_id as i32;
            let mut mean = vec![0.0; GRID * GRID * BINS];
            for path in &images {
                let gray = image::open(path)
                    .map_err(|e| ModelError::Image {
                        path: path.clone(),
                        source: e,
                    })?
                    .to_luma8();
                let histogram = lbp_histogram(&normalize_size(gray));
                for (m, h) in mean.iter_mut().zip(histogram) {
                    *m += h;
                }
            }
            let count = images.len() as f64;
            mean.iter_mut().for_each(|m| *m /= count);
            log::info!("Trained label {label_id} ({name}) from {} images", images.len());

            labels.push(LabelModel {
                label_id,
                samples: images.len(),
                histogram: mean,
            });
            names.push((label_id, Identity::new(name)));
        }

        Ok(TrainedModel {
            recognizer: Self {
                face_size: FACE_SIZE,
                grid: GRID,
                labels,
            },
            labels: names.into_iter().collect(),
        })
    }

    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let json = fs::read_to_string(path).map_err(|e| ModelError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let model: Self = serde_json::from_str(&json).map_err(|e| ModelError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        model
            .check_layout()
            .map_err(|reason| ModelError::Incompatible {
                path: path.to_path_buf(),
                reason,
            })?;
        Ok(model)
    }

    pub fn save(&self, path: &Path) -> Result<(), ModelError> {
        let write_err = |e| ModelError::Write {
            path: path.to_path_buf(),
            source: e,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let json = serde_json::to_string(self).map_err(|e| write_err(std::io::Error::other(e)))?;
        fs::write(path, json).map_err(write_err)
    }

    pub fn label_count(&self) -> usize {
        self.labels.len()
    }

    /// Histograms are only comparable when extracted with the same face size
    /// and grid as the ones `predict` computes.
    fn check_layout(&self) -> Result<(), String> {
        if self.face_size != FACE_SIZE || self.grid != GRID {
            return Err(format!(
                "face size {} and grid {} (expected {FACE_SIZE} and {GRID})",
                self.face_size, self.grid
            ));
        }
        let bins = GRID * GRID * BINS;
        if let Some(label) = self.labels.iter().find(|l| l.histogram.len() != bins) {
            return Err(format!(
                "label {} has {} histogram bins (expected {bins})",
                label.label_id,
                label.histogram.len()
            ));
        }
        Ok(())
    }

    fn nearest(&self, histogram: &[f64]) -> Option<Prediction> {
        self.labels
            .iter()
            .map(|label| Prediction {
                label_id: label.label_id,
                confidence: chi_square(&label.histogram, histogram),
            })
            .min_by(|a, b| a.confidence.total_cmp(&b.confidence))
    }
}

impl FaceRecognizer for LbpFaceRecognizer {
    fn predict(&self, face: &Frame) -> Result<Prediction, Box<dyn std::error::Error>> {
        if face.width() == 0 || face.height() == 0 {
            return Err(ModelError::EmptyFace.into());
        }
        let gray = face.to_grayscale();
        let image = GrayImage::from_raw(gray.width(), gray.height(), gray.data().to_vec())
            .ok_or("Failed to create image from frame data")?;
        let histogram = lbp_histogram(&normalize_size(image));
        Ok(self.nearest(&histogram).ok_or(ModelError::Untrained)?)
    }
}

fn normalize_size(image: GrayImage) -> GrayImage {
    if image.width() == FACE_SIZE && image.height() == FACE_SIZE {
        image
    } else {
        image::imageops::resize(&image, FACE_SIZE, FACE_SIZE, FilterType::Triangle)
    }
}

/// Per-cell normalized LBP histograms, concatenated row by row.
fn lbp_histogram(image: &GrayImage) -> Vec<f64> {
    let (w, h) = image.dimensions();
    let cell_w = (w as usize / GRID).max(1);
    let cell_h = (h as usize / GRID).max(1);
    let mut hist = vec![0.0; GRID * GRID * BINS];

    for y in 1..h.saturating_sub(1) {
        for x in 1..w.saturating_sub(1) {
            let center = image.get_pixel(x, y)[0];
            let mut code = 0usize;
            for (bit, (dx, dy)) in NEIGHBOURS.iter().enumerate() {
                let nx = (x as i32 + dx) as u32;
                let ny = (y as i32 + dy) as u32;
                if image.get_pixel(nx, ny)[0] >= center {
                    code |= 1 << bit;
                }
            }
            let cx = (x as usize / cell_w).min(GRID - 1);
            let cy = (y as usize / cell_h).min(GRID - 1);
            hist[(cy * GRID + cx) * BINS + code] += 1.0;
        }
    }

    for cell in hist.chunks_mut(BINS) {
        let total: f64 = cell.iter().sum();
        if total > 0.0 {
            cell.iter_mut().for_each(|v| *v /= total);
        }
    }
    hist
}

fn chi_square(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .filter(|(x, y)| *x + *y > f64::EPSILON)
        .map(|(x, y)| (x - y).powi(2) / (x + y))
        .sum()
}

fn read_dir_sorted(dir: &Path) -> Result<Vec<PathBuf>, ModelError> {
    let entries = fs::read_dir(dir).map_err(|e| ModelError::Read {
        path: dir.to_path_buf(),
        source: e,
    })?;
    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .collect();
    paths.sort();
    Ok(paths)
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}
