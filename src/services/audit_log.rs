//! Audit log
//!
//! Collects per-hotel log rows and status counts for one form run. Download
//! tasks share one [`AuditLog`] through an `Arc`; the only mutation they get
//! is [`AuditLog::record`], which appends the row and bumps the counter under
//! a single lock.

use crate::error::{AppError, AppResult};
use crate::models::{LogRow, Status};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

pub const HOTEL_LOG_FILE: &str = "download_log.csv";

#[derive(Debug, Default)]
struct AuditState {
    rows: BTreeMap<String, Vec<LogRow>>,
    summary: BTreeMap<Status, usize>,
}

#[derive(Debug, Default)]
pub struct AuditLog {
    inner: Mutex<AuditState>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, AuditState> {
        // a panicked download task must not hide the rows already recorded
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Make sure `hotel` gets a log file even if it ends up with no rows
    pub fn register_hotel(&self, hotel: &str) {
        self.state().rows.entry(hotel.to_string()).or_default();
    }

    /// Append one row and count its status under one lock, so the counts
    /// always match the rows.
    ///
    /// # Parameters
    /// - `row`: filed under `row.hotel`, which need not be registered
    pub fn record(&self, row: LogRow) {
        let mut state = self.state();
        *state.summary.entry(row.status).or_insert(0) += 1;
        state.rows.entry(row.hotel.clone()).or_default().push(row);
    }

    /// Status counts so far
    pub fn summary(&self) -> BTreeMap<Status, usize> {
        self.state().summary.clone()
    }

    #[cfg(test)]
    pub(crate) fn rows_for(&self, hotel: &str) -> Vec<LogRow> {
        self.state().rows.get(hotel).cloned().unwrap_or_default()
    }

    /// Write `{market_root}/{hotel}/download_log.csv` for every registered hotel.
    ///
    /// # Returns
    /// Paths of the written files, in hotel order
    pub fn write_hotel_logs(&self, market_root: &Path) -> AppResult<Vec<PathBuf>> {
        let state = self.state();
        let mut paths = Vec::with_capacity(state.rows.len());

        for (hotel, rows) in &state.rows {
            let path = market_root.join(hotel).join(HOTEL_LOG_FILE);
            write_csv(&path, rows)?;
            paths.push(path);
        }

        Ok(paths)
    }

    /// Write `summary_{timestamp}.txt`: status counts, then the log paths
    pub fn write_summary(
        &self,
        market_root: &Path,
        log_paths: &[PathBuf],
        timestamp: &str,
    ) -> AppResult<PathBuf> {
        let path = market_root.join(format!("summary_{timestamp}.txt"));
        let text = render_summary(&self.summary(), log_paths);
        fs::write(&path, text).map_err(|e| AppError::write_failed(&path, e))?;
        Ok(path)
    }
}

fn write_csv(path: &Path, rows: &[LogRow]) -> AppResult<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(LogRow::HEADER)?;
    for row in rows {
        writer.write_record([
            row.hotel.as_str(),
            row.room.as_str(),
            row.filename.as_str(),
            row.status.as_str(),
        ])?;
    }
    writer.flush().map_err(|e| AppError::write_failed(path, e))?;
    Ok(())
}

fn render_summary(summary: &BTreeMap<Status, usize>, log_paths: &[PathBuf]) -> String {
    let mut out = String::from("=== Download result counts ===\n");
    for (status, count) in summary {
        let _ = writeln!(out, "{status}: {count}");
    }
    out.push_str("\n=== Per-hotel log locations ===\n");
    for path in log_paths {
        let _ = writeln!(out, "{}", path.display());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[test]
    fn test_record_counts_every_row() {
        let log = Arc::new(AuditLog::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let log = Arc::clone(&log);
                std::thread::spawn(move || {
                    let status = if i % 2 == 0 { Status::Downloaded } else { Status::Failed };
                    log.record(LogRow::new("H", "Suite", format!("{i}.jpg"), status));
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let summary = log.summary();
        assert_eq!(summary[&Status::Downloaded], 4);
        assert_eq!(summary[&Status::Failed], 4);
        assert_eq!(log.rows_for("H").len(), 8);
    }

    #[test]
    fn test_registered_hotel_gets_header_only_csv() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("Empty_Hotel")).unwrap();
        let log = AuditLog::new();
        log.register_hotel("Empty_Hotel");

        let paths = log.write_hotel_logs(tmp.path()).unwrap();

        assert_eq!(paths, vec![tmp.path().join("Empty_Hotel").join(HOTEL_LOG_FILE)]);
        let text = fs::read_to_string(&paths[0]).unwrap();
        assert_eq!(text, "Hotel,Room,Filename,Status\n");
    }

    #[test]
    fn test_csv_rows_and_summary_file() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("Grand")).unwrap();
        let log = AuditLog::new();
        log.record(LogRow::new("Grand", "Hotel_Images", "lobby, front.jpg", Status::Downloaded));
        log.record(LogRow::new("Grand", "RoomType_3", "N/A", Status::NoUploads));

        let paths = log.write_hotel_logs(tmp.path()).unwrap();
        let csv_text = fs::read_to_string(&paths[0]).unwrap();
        assert_eq!(
            csv_text,
            "Hotel,Room,Filename,Status\n\
             Grand,Hotel_Images,\"lobby, front.jpg\",DOWNLOADED\n\
             Grand,RoomType_3,N/A,NO_UPLOADS\n"
        );

        let summary_path = log.write_summary(tmp.path(), &paths, "20240101_120000").unwrap();
        assert_eq!(summary_path.file_name().unwrap(), "summary_20240101_120000.txt");
        let summary_text = fs::read_to_string(&summary_path).unwrap();
        assert_eq!(
            summary_text,
            format!(
                "=== Download result counts ===\nDOWNLOADED: 1\nNO_UPLOADS: 1\n\n=== Per-hotel log locations ===\n{}\n",
                paths[0].display()
            )
        );
    }
}
