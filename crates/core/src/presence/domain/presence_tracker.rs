use std::collections::BTreeSet;

use crate::presence::domain::frame_observation::FrameObservation;
use crate::presence::domain::tracker_error::TrackerError;
use crate::presence::domain::visit_ledger::VisitLedger;
use crate::shared::clock::Timestamp;
use crate::shared::identity::Identity;

/// Identities whose visit opened or closed during one `observe` call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PresenceChange {
    pub opened: Vec<Identity>,
    pub closed: Vec<Identity>,
}

impl PresenceChange {
    pub fn is_empty(&self) -> bool {
        self.opened.is_empty() && self.closed.is_empty()
    }
}

/// Turns per-frame sightings into visit intervals by diffing each frame
/// against the previous one.
///
/// There is no grace period: an identity missing from a single frame ends its
/// visit, and reappearing starts a new one. All unknown faces share the one
/// `"Unknown"` identity, so a second stranger arriving while another is in
/// view extends the current Unknown visit instead of opening a new one.
#[derive(Debug, Default)]
pub struct PresenceTracker {
    active: BTreeSet<Identity>,
    ledger: VisitLedger,
    last_observed: Option<Timestamp>,
}

impl PresenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one frame.
    ///
    /// Newly seen identities open a visit starting at `now` (an Unknown visit
    /// carries the frame's snapshot, if any); identities no longer seen have
    /// their visit closed at `now`. An empty observation closes every visit.
    pub fn observe(
        &mut self,
        observation: &FrameObservation,
        now: Timestamp,
    ) -> Result<PresenceChange, TrackerError> {
        self.advance_clock(now)?;
        let mut change = PresenceChange::default();

        for identity in observation.identities() {
            if self.active.contains(identity) {
                continue;
            }
            let snapshot_ref = identity
                .is_unknown()
                .then(|| observation.snapshot_ref(identity).map(str::to_string))
                .flatten();
            self.ledger.open(identity, now, snapshot_ref)?;
            self.active.insert(identity.clone());
            change.opened.push(identity.clone());
        }

        let missing: Vec<Identity> = self
            .active
            .iter()
            .filter(|identity| !observation.contains(identity))
            .cloned()
            .collect();
        for identity in missing {
            self.ledger.close(&identity, now)?;
            self.active.remove(&identity);
            change.closed.push(identity);
        }

        Ok(change)
    }

    /// Closes every open visit at `now`, e.g. when the session ends.
    pub fn close_all(&mut self, now: Timestamp) -> Result<Vec<Identity>, TrackerError> {
        Ok(self.observe(&FrameObservation::new(), now)?.closed)
    }

    pub fn active(&self) -> &BTreeSet<Identity> {
        &self.active
    }

    pub fn is_active(&self, identity: &Identity) -> bool {
        self.active.contains(identity)
    }

    pub fn ledger(&self) -> &VisitLedger {
        &self.ledger
    }

    fn advance_clock(&mut self, now: Timestamp) -> Result<(), TrackerError> {
        if let Some(previous) = self.last_observed {
            if now < previous {
                return Err(TrackerError::ClockWentBackwards { previous, now });
            }
        }
        self.last_observed = Some(now);
        Ok(())
    }
}
