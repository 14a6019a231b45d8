use thiserror::Error;

use crate::recognition::domain::face_recognizer::Prediction;
use crate::recognition::domain::label_map::LabelMap;
use crate::shared::constants::{ACCEPTANCE_LOWER, ACCEPTANCE_UPPER};
use crate::shared::identity::Identity;

#[derive(Error, Debug, PartialEq)]
pub enum LabelError {
    #[error("recognizer returned label {label_id} which is missing from the label map (model and label map are out of sync)")]
    UnmappedLabel { label_id: i32 },
    #[error("invalid acceptance band [{lower}, {upper}]")]
    InvalidBand { lower: f64, upper: f64 },
}

/// Closed confidence range in which a recognizer match is trusted.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AcceptanceBand {
    lower: f64,
    upper: f64,
}

impl AcceptanceBand {
    pub fn new(lower: f64, upper: f64) -> Result<Self, LabelError> {
        if !lower.is_finite() || !upper.is_finite() || lower > upper {
            return Err(LabelError::InvalidBand { lower, upper });
        }
        Ok(Self { lower, upper })
    }

    /// Inclusive at both ends. NaN is never accepted.
    pub fn accepts(&self, confidence: f64) -> bool {
        self.lower <= confidence && confidence <= self.upper
    }

    pub fn lower(&self) -> f64 {
        self.lower
    }

    pub fn upper(&self) -> f64 {
        self.upper
    }
}

impl Default for AcceptanceBand {
    fn default() -> Self {
        Self {
            lower: ACCEPTANCE_LOWER,
            upper: ACCEPTANCE_UPPER,
        }
    }
}

/// Turns raw recognizer predictions into identities.
pub struct IdentityLabeler {
    labels: LabelMap,
    band: AcceptanceBand,
}

impl IdentityLabeler {
    pub fn new(labels: LabelMap, band: AcceptanceBand) -> Self {
        Self { labels, band }
    }

    /// Maps a prediction to its identity, or `"Unknown"` outside the band.
    ///
    /// An in-band label that the map does not know is an error, never a
    /// silent `"Unknown"`.
    pub fn label(&self, prediction: Prediction) -> Result<Identity, LabelError> {
        if !self.band.accepts(prediction.confidence) {
            return Ok(Identity::unknown());
        }
        self.labels
            .get(prediction.label_id)
            .cloned()
            .ok_or(LabelError::UnmappedLabel {
                label_id: prediction.label_id,
            })
    }

    pub fn band(&self) -> AcceptanceBand {
        self.band
    }
}
