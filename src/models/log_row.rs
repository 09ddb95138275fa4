use std::fmt;

/// Outcome of one download attempt (or of an empty room)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Status {
    Skipped,
    DryRun,
    Downloaded,
    Failed,
    NoUploads,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Skipped => "SKIPPED",
            Status::DryRun => "DRY_RUN",
            Status::Downloaded => "DOWNLOADED",
            Status::Failed => "FAILED",
            Status::NoUploads => "NO_UPLOADS",
        }
    }

    /// Console tag for the per-file log line
    pub fn indicator(self) -> &'static str {
        match self {
            Status::Downloaded => "OK",
            Status::Failed => "FAIL",
            _ => "SKIP",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of a hotel's `download_log.csv`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRow {
    pub hotel: String,
    pub room: String,
    pub filename: String,
    pub status: Status,
}

impl LogRow {
    pub const HEADER: [&'static str; 4] = ["Hotel", "Room", "Filename", "Status"];

    pub fn new(
        hotel: impl Into<String>,
        room: impl Into<String>,
        filename: impl Into<String>,
        status: Status,
    ) -> Self {
        Self {
            hotel: hotel.into(),
            room: room.into(),
            filename: filename.into(),
            status,
        }
    }
}
