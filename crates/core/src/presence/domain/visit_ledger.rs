use std::collections::BTreeMap;

use crate::presence::domain::tracker_error::TrackerError;
use crate::presence::domain::visit_record::{VisitRecord, VisitRecordView};
use crate::shared::clock::Timestamp;
use crate::shared::identity::Identity;

#[derive(Debug, Default)]
struct IdentityLog {
    records: Vec<VisitRecord>,
    /// Bumped on every open or close.
    revision: u64,
}

impl IdentityLog {
    fn open_record_mut(&mut self) -> Option<&mut VisitRecord> {
        // Append-only with at most one open record, so it can only be last.
        self.records.last_mut().filter(|r| r.is_open())
    }
}

/// Append-only per-identity history of visits for one session.
///
/// Records are kept in chronological (insertion) order and are never
/// removed or reordered.
#[derive(Debug, Default)]
pub struct VisitLedger {
    entries: BTreeMap<Identity, IdentityLog>,
}

impl VisitLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn open(
        &mut self,
        identity: &Identity,
        start: Timestamp,
        snapshot_ref: Option<String>,
    ) -> Result<(), TrackerError> {
        let log = self.entries.entry(identity.clone()).or_default();
        if log.open_record_mut().is_some() {
            return Err(TrackerError::VisitAlreadyOpen(identity.clone()));
        }
        log.records.push(VisitRecord::open(start, snapshot_ref));
        log.revision += 1;
        Ok(())
    }

    pub(crate) fn close(&mut self, identity: &Identity, end: Timestamp) -> Result<(), TrackerError> {
        let log = self
            .entries
            .get_mut(identity)
            .ok_or_else(|| TrackerError::NoOpenVisit(identity.clone()))?;
        let record = log
            .open_record_mut()
            .ok_or_else(|| TrackerError::NoOpenVisit(identity.clone()))?;
        record.close(end);
        log.revision += 1;
        Ok(())
    }

    pub fn open_record(&self, identity: &Identity) -> Option<&VisitRecord> {
        self.records(identity).last().filter(|r| r.is_open())
    }

    pub fn records(&self, identity: &Identity) -> &[VisitRecord] {
        self.entries
            .get(identity)
            .map(|log| log.records.as_slice())
            .unwrap_or(&[])
    }

    /// Identities with at least one visit, in sorted order.
    pub fn identities(&self) -> impl Iterator<Item = &Identity> {
        self.entries.keys()
    }

    pub fn total_records(&self) -> usize {
        self.entries.values().map(|log| log.records.len()).sum()
    }

    /// Change counter for one identity's history; 0 if it has none.
    ///
    /// Two equal revisions mean the exported rows for that identity are
    /// identical.
    pub fn revision(&self, identity: &Identity) -> u64 {
        self.entries.get(identity).map_or(0, |log| log.revision)
    }

    /// Read-only projection of the whole ledger at call time.
    pub fn export(&self) -> BTreeMap<Identity, Vec<VisitRecordView>> {
        self.entries
            .iter()
            .map(|(identity, log)| {
                (
                    identity.clone(),
                    log.records.iter().map(VisitRecord::view).collect(),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, TimeZone};

    fn at(secs: i64) -> Timestamp {
        Local.timestamp_opt(secs, 0).unwrap()
    }

    fn alice() -> Identity {
        Identity::from("alice")
    }

    #[test]
    fn test_empty_ledger() {
        let ledger = VisitLedger::new();
        assert_eq!(ledger.total_records(), 0);
        assert!(ledger.records(&alice()).is_empty());
        assert!(ledger.open_record(&alice()).is_none());
        assert_eq!(ledger.revision(&alice()), 0);
        assert!(ledger.export().is_empty());
    }

    #[test]
    fn test_open_then_close() {
        let mut ledger = VisitLedger::new();
        ledger.open(&alice(), at(1), None).unwrap();
        assert_eq!(ledger.open_record(&alice()).unwrap().start(), at(1));

        ledger.close(&alice(), at(5)).unwrap();
        assert!(ledger.open_record(&alice()).is_none());
        assert_eq!(ledger.records(&alice())[0].end(), Some(at(5)));
        assert_eq!(ledger.revision(&alice()), 2);
    }

    #[test]
    fn test_second_open_while_open_is_rejected() {
        let mut ledger = VisitLedger::new();
        ledger.open(&alice(), at(1), None).unwrap();
        assert_eq!(
            ledger.open(&alice(), at(2), None),
            Err(TrackerError::VisitAlreadyOpen(alice()))
        );
        assert_eq!(ledger.records(&alice()).len(), 1);
    }

    #[test]
    fn test_close_without_open_is_rejected() {
        let mut ledger = VisitLedger::new();
        assert_eq!(
            ledger.close(&alice(), at(1)),
            Err(TrackerError::NoOpenVisit(alice()))
        );

        ledger.open(&alice(), at(1), None).unwrap();
        ledger.close(&alice(), at(2)).unwrap();
        assert_eq!(
            ledger.close(&alice(), at(3)),
            Err(TrackerError::NoOpenVisit(alice()))
        );
    }

    #[test]
    fn test_export_is_idempotent_and_ordered() {
        let mut ledger = VisitLedger::new();
        ledger.open(&Identity::from("bob"), at(1), None).unwrap();
        ledger.open(&alice(), at(2), None).unwrap();
        ledger.close(&alice(), at(3)).unwrap();
        ledger.open(&alice(), at(4), None).unwrap();

        let first = ledger.export();
        let second = ledger.export();
        assert_eq!(first, second);

        let names: Vec<&str> = first.keys().map(Identity::as_str).collect();
        assert_eq!(names, vec!["alice", "bob"]);
        let starts: Vec<_> = first[&alice()].iter().map(|v| v.start).collect();
        assert_eq!(starts, vec![at(2), at(4)]);
    }

    #[test]
    fn test_export_is_detached_from_later_changes() {
        let mut ledger = VisitLedger::new();
        ledger.open(&alice(), at(1), None).unwrap();
        let before = ledger.export();
        ledger.close(&alice(), at(2)).unwrap();
        assert_eq!(before[&alice()][0].end, None);
        assert_eq!(ledger.export()[&alice()][0].end, Some(at(2)));
    }
}
