use serde::Serialize;

use crate::shared::clock::Timestamp;

/// One contiguous visit of an identity.
///
/// `start` is fixed at creation; `end` is set once, when the identity leaves.
#[derive(Clone, Debug, PartialEq)]
pub struct VisitRecord {
    start: Timestamp,
    end: Option<Timestamp>,
    snapshot_ref: Option<String>,
}

impl VisitRecord {
    pub(crate) fn open(start: Timestamp, snapshot_ref: Option<String>) -> Self {
        Self {
            start,
            end: None,
            snapshot_ref,
        }
    }

    /// Only called on an open record; the ledger rejects closing twice.
    pub(crate) fn close(&mut self, end: Timestamp) {
        debug_assert!(self.is_open());
        self.end = Some(end);
    }

    pub fn start(&self) -> Timestamp {
        self.start
    }

    pub fn end(&self) -> Option<Timestamp> {
        self.end
    }

    pub fn snapshot_ref(&self) -> Option<&str> {
        self.snapshot_ref.as_deref()
    }

    pub fn is_open(&self) -> bool {
        self.end.is_none()
    }

    pub fn view(&self) -> VisitRecordView {
        VisitRecordView {
            start: self.start,
            end: self.end,
            snapshot_ref: self.snapshot_ref.clone(),
        }
    }
}

/// Detached, serializable copy of a [`VisitRecord`] for reporting.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct VisitRecordView {
    pub start: Timestamp,
    pub end: Option<Timestamp>,
    pub snapshot_ref: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, TimeZone};

    fn at(secs: i64) -> Timestamp {
        Local.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_new_record_is_open() {
        let record = VisitRecord::open(at(10), None);
        assert!(record.is_open());
        assert_eq!(record.start(), at(10));
        assert_eq!(record.end(), None);
    }

    #[test]
    fn test_close_sets_end() {
        let mut record = VisitRecord::open(at(10), Some("snap".to_string()));
        record.close(at(20));
        assert!(!record.is_open());
        assert_eq!(record.end(), Some(at(20)));
        assert_eq!(record.snapshot_ref(), Some("snap"));
    }

    #[test]
    fn test_view_copies_fields() {
        let mut record = VisitRecord::open(at(1), Some("s".to_string()));
        record.close(at(2));
        assert_eq!(
            record.view(),
            VisitRecordView {
                start: at(1),
                end: Some(at(2)),
                snapshot_ref: Some("s".to_string()),
            }
        );
    }
}
