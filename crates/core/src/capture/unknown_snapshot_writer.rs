use std::path::PathBuf;

use thiserror::Error;

use crate::capture::domain::image_writer::ImageWriter;
use crate::shared::clock::Timestamp;
use crate::shared::frame::Frame;
use crate::shared::region::FaceRegion;

#[derive(Error, Debug, PartialEq)]
pub enum SnapshotError {
    #[error("face region {region:?} has no pixels inside the {width}x{height} frame")]
    EmptyRegion {
        region: FaceRegion,
        width: u32,
        height: u32,
    },
}

/// Saves the full frame and the face crop whenever an unrecognized face is
/// seen, so the "Unknown" visit can be reviewed later.
///
/// Files are `<stem>.png` and `<stem>_face.png`, where the stem is the
/// capture time as `<unix seconds>.<microseconds>`.
pub struct UnknownSnapshotWriter {
    dir: PathBuf,
    writer: Box<dyn ImageWriter>,
}

impl UnknownSnapshotWriter {
    pub fn new(dir: PathBuf, writer: Box<dyn ImageWriter>) -> Self {
        Self { dir, writer }
    }

    /// Writes both images and returns the stem that names them.
    ///
    /// A stem already taken on disk gets a `-1`, `-2`, ... suffix.
    pub fn capture(
        &self,
        frame: &Frame,
        region: &FaceRegion,
        now: Timestamp,
    ) -> Result<String, Box<dyn std::error::Error>> {
        let face = frame
            .crop(region)
            .ok_or(SnapshotError::EmptyRegion {
                region: *region,
                width: frame.width(),
                height: frame.height(),
            })?;

        let stem = self.free_stem(&timestamp_stem(now));
        self.writer.write(&self.dir.join(format!("{stem}.png")), frame)?;
        self.writer
            .write(&self.dir.join(format!("{stem}_face.png")), &face)?;
        log::debug!("Saved unknown snapshot {stem}");
        Ok(stem)
    }

    fn free_stem(&self, base: &str) -> String {
        let taken = |stem: &str| self.dir.join(format!("{stem}.png")).exists();
        if !taken(base) {
            return base.to_string();
        }
        (1..)
            .map(|n| format!("{base}-{n}"))
            .find(|stem| !taken(stem))
            .unwrap_or_else(|| base.to_string())
    }
}

pub fn timestamp_stem(now: Timestamp) -> String {
    format!("{}.{:06}", now.timestamp(), now.timestamp_subsec_micros())
}
