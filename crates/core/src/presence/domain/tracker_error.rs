use thiserror::Error;

use crate::shared::clock::Timestamp;
use crate::shared::identity::Identity;

/// Invariant violations in presence tracking. These indicate caller misuse,
/// never detector noise.
#[derive(Error, Debug, PartialEq)]
pub enum TrackerError {
    #[error("no open visit to close for '{0}'")]
    NoOpenVisit(Identity),
    #[error("'{0}' already has an open visit")]
    VisitAlreadyOpen(Identity),
    #[error("frame timestamp {now} is earlier than the previous frame at {previous}")]
    ClockWentBackwards { previous: Timestamp, now: Timestamp },
}
