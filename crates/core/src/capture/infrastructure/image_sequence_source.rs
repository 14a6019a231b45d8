use std::fs;
use std::path::{Path, PathBuf};

use crate::capture::domain::frame_source::FrameSource;
use crate::shared::constants::IMAGE_EXTENSIONS;
use crate::shared::frame::Frame;

/// Virtual camera backed by a directory of still images.
///
/// Frames are yielded in lexical file-name order; once every image has been
/// read the source stops yielding frames.
pub struct ImageSequenceSource {
    paths: Vec<PathBuf>,
    next: usize,
}

impl ImageSequenceSource {
    pub fn open(dir: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        if !dir.is_dir() {
            return Err(format!("Camera source not found: {}", dir.display()).into());
        }
        let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && is_image(p))
            .collect();
        paths.sort();
        log::info!("Opened {} with {} frames", dir.display(), paths.len());
        Ok(Self { paths, next: 0 })
    }

    /// Image file of every frame, indexed by frame index.
    pub fn frame_paths(&self) -> &[PathBuf] {
        &self.paths
    }
}

impl FrameSource for ImageSequenceSource {
    fn read(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
        let Some(path) = self.paths.get(self.next) else {
            return Ok(None);
        };
        let img = image::open(path)
            .map_err(|e| format!("Failed to decode frame {}: {e}", path.display()))?
            .to_rgb8();
        let (width, height) = img.dimensions();
        let frame = Frame::new(img.into_raw(), width, height, 3, self.next);
        self.next += 1;
        Ok(Some(frame))
    }

    fn release(&mut self) {
        self.next = self.paths.len();
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}
