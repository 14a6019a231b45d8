use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use crate::capture::domain::frame_source::FrameSource;
use crate::capture::domain::image_writer::ImageWriter;
use crate::dataset::dataset_directory::DatasetError;
use crate::dataset::unique_id::UniqueIdSequence;

/// Captures training images for one person: `count` frames, each saved as
/// `<unique id>.png` in the dataset folder, with a pause between shots.
pub struct CreateDatasetUseCase {
    source: Box<dyn FrameSource>,
    image_writer: Box<dyn ImageWriter>,
    ids: UniqueIdSequence,
    interval: Duration,
    on_progress: Option<Box<dyn Fn(usize, usize) + Send>>,
}

impl CreateDatasetUseCase {
    pub fn new(
        source: Box<dyn FrameSource>,
        image_writer: Box<dyn ImageWriter>,
        ids: UniqueIdSequence,
        interval: Duration,
        on_progress: Option<Box<dyn Fn(usize, usize) + Send>>,
    ) -> Self {
        Self {
            source,
            image_writer,
            ids,
            interval,
            on_progress,
        }
    }

    /// Returns the written image paths in capture order.
    ///
    /// A frame source that stops yielding frames is a hard failure; the
    /// source is released before returning in every case.
    pub fn execute(
        &mut self,
        dataset_dir: &Path,
        count: usize,
    ) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
        let result = self.capture(dataset_dir, count);
        self.source.release();
        result
    }

    fn capture(
        &mut self,
        dataset_dir: &Path,
        count: usize,
    ) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
        let mut written = Vec::with_capacity(count);
        for cnt in 0..count {
            let path = dataset_dir.join(format!("{}.png", self.ids.next_id()));
            let frame = self.source.read()?.ok_or(DatasetError::CameraFailed)?;
            log::info!("{cnt}/{count}: Capturing: {}", path.display());
            self.image_writer.write(&path, &frame)?;
            written.push(path);

            if let Some(ref callback) = self.on_progress {
                callback(cnt + 1, count);
            }
            if cnt + 1 < count && !self.interval.is_zero() {
                thread::sleep(self.interval);
            }
        }
        log::info!("Dataset created successfully!");
        Ok(written)
    }
}
