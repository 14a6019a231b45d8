use std::fs;
use std::path::{Path, PathBuf};

use crate::detection::domain::face_detector::FaceDetector;
use crate::shared::frame::Frame;
use crate::shared::region::FaceRegion;

/// Replays detections recorded next to each frame image.
///
/// For frame `cameras/0/0001.png` the regions are read from
/// `cameras/0/0001.json`, a JSON array of `{"x", "y", "w", "h"}` objects.
/// Frames without a sidecar file have no faces.
pub struct SidecarFaceDetector {
    frame_paths: Vec<PathBuf>,
}

impl SidecarFaceDetector {
    /// `frame_paths[i]` is the image file of the frame with index `i`.
    pub fn new(frame_paths: Vec<PathBuf>) -> Self {
        Self { frame_paths }
    }

    fn sidecar_path(frame_path: &Path) -> PathBuf {
        frame_path.with_extension("json")
    }
}

impl FaceDetector for SidecarFaceDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<FaceRegion>, Box<dyn std::error::Error>> {
        let Some(frame_path) = self.frame_paths.get(frame.index()) else {
            return Err(format!("No frame file for frame index {}", frame.index()).into());
        };
        let sidecar = Self::sidecar_path(frame_path);
        if !sidecar.exists() {
            return Ok(Vec::new());
        }
        let json = fs::read_to_string(&sidecar)?;
        let regions: Vec<FaceRegion> = serde_json::from_str(&json)
            .map_err(|e| format!("Invalid detections in {}: {e}", sidecar.display()))?;
        log::debug!("Frame {}: {} faces", frame.index(), regions.len());
        Ok(regions)
    }
}
