use ndarray::{s, ArrayView3};

use crate::shared::region::FaceRegion;

/// A single captured frame: contiguous bytes in row-major order, either RGB
/// (3 channels) or grayscale (1 channel).
///
/// `index` is the position of the frame within its source, starting at 0.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            index,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    /// Copies the pixels under `region`, clamped to the frame bounds.
    ///
    /// Returns `None` when nothing of the region lies inside the frame.
    pub fn crop(&self, region: &FaceRegion) -> Option<Frame> {
        let clamped = region.clamp_to(self.width, self.height)?;
        let x1 = clamped.x as usize;
        let y1 = clamped.y as usize;
        let x2 = x1 + clamped.width as usize;
        let y2 = y1 + clamped.height as usize;

        let view = self.as_ndarray();
        let data: Vec<u8> = view.slice(s![y1..y2, x1..x2, ..]).iter().copied().collect();
        Some(Frame::new(
            data,
            clamped.width as u32,
            clamped.height as u32,
            self.channels,
            self.index,
        ))
    }

    /// Single-channel copy using ITU-R BT.601 luma weights.
    ///
    /// Grayscale frames are returned as-is.
    pub fn to_grayscale(&self) -> Frame {
        if self.channels == 1 {
            return self.clone();
        }
        let channels = self.channels as usize;
        let data = self
            .data
            .chunks_exact(channels)
            .map(|px| {
                let luma = 0.299 * px[0] as f64 + 0.587 * px[1] as f64 + 0.114 * px[2] as f64;
                luma.round().min(255.0) as u8
            })
            .collect();
        Frame::new(data, self.width, self.height, 1, self.index)
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}
