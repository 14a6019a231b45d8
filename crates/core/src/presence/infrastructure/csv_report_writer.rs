use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::presence::domain::visit_ledger::VisitLedger;
use crate::presence::domain::visit_record::VisitRecordView;
use crate::shared::clock::Timestamp;
use crate::shared::identity::Identity;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

#[derive(Serialize)]
struct CsvRow {
    start: String,
    end: String,
    photo: String,
}

impl From<&VisitRecordView> for CsvRow {
    fn from(view: &VisitRecordView) -> Self {
        Self {
            start: format_timestamp(view.start),
            end: view.end.map(format_timestamp).unwrap_or_default(),
            photo: view.snapshot_ref.clone().unwrap_or_default(),
        }
    }
}

/// Writes one `<identity>.csv` per identity with columns `start,end,photo`.
///
/// Each file holds the identity's full history and is rewritten in place.
/// Identities whose history has not changed since the last call are skipped
/// unless their file has gone missing.
pub struct CsvReportWriter {
    dir: PathBuf,
    written_revisions: HashMap<Identity, u64>,
}

impl CsvReportWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            written_revisions: HashMap::new(),
        }
    }

    /// Brings the report files up to date with `ledger`; returns how many
    /// files were rewritten.
    pub fn write(&mut self, ledger: &VisitLedger) -> Result<usize, Box<dyn std::error::Error>> {
        fs::create_dir_all(&self.dir)?;
        let mut rewritten = 0;
        for identity in ledger.identities() {
            let revision = ledger.revision(identity);
            let path = self.report_path(identity);
            if self.written_revisions.get(identity) == Some(&revision) && path.is_file() {
                continue;
            }
            let views: Vec<VisitRecordView> =
                ledger.records(identity).iter().map(|r| r.view()).collect();
            write_rows(&path, &views)?;
            self.written_revisions.insert(identity.clone(), revision);
            rewritten += 1;
        }
        if rewritten > 0 {
            log::debug!("Rewrote {rewritten} report files in {}", self.dir.display());
        }
        Ok(rewritten)
    }

    pub fn report_path(&self, identity: &Identity) -> PathBuf {
        let file_name: String = identity
            .as_str()
            .chars()
            .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
            .collect();
        self.dir.join(format!("{file_name}.csv"))
    }
}

/// Overwrites `path` with a header and one row per visit.
pub fn write_rows(path: &Path, views: &[VisitRecordView]) -> Result<(), Box<dyn std::error::Error>> {
    let mut wtr = csv::Writer::from_path(path)?;
    if views.is_empty() {
        wtr.write_record(["start", "end", "photo"])?;
    }
    for view in views {
        wtr.serialize(CsvRow::from(view))?;
    }
    wtr.flush()?;
    Ok(())
}

fn format_timestamp(ts: Timestamp) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}
