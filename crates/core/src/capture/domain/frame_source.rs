use crate::shared::frame::Frame;

/// A camera-like source of frames.
///
/// `Ok(None)` means the device did not yield a frame. Callers decide whether
/// that ends the session or is a failure.
pub trait FrameSource: Send {
    fn read(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>>;

    /// Releases the underlying device.
    fn release(&mut self);
}
