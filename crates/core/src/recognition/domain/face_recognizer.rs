use crate::shared::frame::Frame;

/// Raw recognizer output for one face crop.
///
/// `confidence` follows the recognizer's distance convention: lower means a
/// closer match.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Prediction {
    pub label_id: i32,
    pub confidence: f64,
}

/// Domain interface for face recognition.
///
/// Receives a grayscale crop of a single face.
pub trait FaceRecognizer: Send {
    fn predict(&self, face: &Frame) -> Result<Prediction, Box<dyn std::error::Error>>;
}
