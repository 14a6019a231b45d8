use std::path::Path;

use crate::capture::domain::image_writer::ImageWriter;
use crate::shared::frame::Frame;

/// Writes RGB or grayscale frames using the `image` crate.
///
/// The format follows the file extension.
pub struct ImageFileWriter;

impl ImageFileWriter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ImageFileWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageWriter for ImageFileWriter {
    fn write(&self, path: &Path, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        // Ensure parent directory exists (infrastructure concern)
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let data = frame.data().to_vec();
        match frame.channels() {
            1 => image::GrayImage::from_raw(frame.width(), frame.height(), data)
                .ok_or("Failed to create image from frame data")?
                .save(path)?,
            3 => image::RgbImage::from_raw(frame.width(), frame.height(), data)
                .ok_or("Failed to create image from frame data")?
                .save(path)?,
            n => return Err(format!("Unsupported channel count: {n}").into()),
        }
        Ok(())
    }
}
