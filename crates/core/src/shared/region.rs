use serde::{Deserialize, Serialize};

/// Face bounding box reported by a detector, in frame pixel coordinates.
///
/// Detectors may report boxes that extend past the frame edge; consumers
/// clamp with [`FaceRegion::clamp_to`] before touching pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceRegion {
    pub x: i32,
    pub y: i32,
    #[serde(alias = "w")]
    pub width: i32,
    #[serde(alias = "h")]
    pub height: i32,
}

impl FaceRegion {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn area(&self) -> i64 {
        self.width.max(0) as i64 * self.height.max(0) as i64
    }

    pub fn is_empty(&self) -> bool {
        self.area() == 0
    }

    /// Intersection with a `frame_width` x `frame_height` frame.
    ///
    /// Returns `None` when the intersection has zero area.
    pub fn clamp_to(&self, frame_width: u32, frame_height: u32) -> Option<FaceRegion> {
        let fw = frame_width as i64;
        let fh = frame_height as i64;
        let x1 = (self.x as i64).clamp(0, fw);
        let y1 = (self.y as i64).clamp(0, fh);
        let x2 = (self.x as i64 + self.width.max(0) as i64).clamp(0, fw);
        let y2 = (self.y as i64 + self.height.max(0) as i64).clamp(0, fh);

        if x2 <= x1 || y2 <= y1 {
            return None;
        }
        Some(FaceRegion::new(
            x1 as i32,
            y1 as i32,
            (x2 - x1) as i32,
            (y2 - y1) as i32,
        ))
    }
}
