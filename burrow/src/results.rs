use std::path::PathBuf;
use std::time::Duration;

/// Per-file outcome of a content check.
///
/// `Error` covers I/O failures, corrupt archives and malformed documents; a
/// single file's error never aborts the scan of the others. Cancellation is
/// not an error: a file whose check was cut short reports `NotFound`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStatus {
    Found,
    NotFound,
    Error,
}

/// One result per candidate file. The path always names the outer filesystem
/// file; a match anywhere inside an archive is reported against the
/// archive's own path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMatch {
    pub path: PathBuf,
    pub status: MatchStatus,
}

/// Terminal summary of a scan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanSummary {
    /// Number of candidate files whose content was checked
    pub files_scanned: usize,
    /// Wall-clock duration of the scan
    pub elapsed: Duration,
    /// True when the scan stopped early because cancellation was requested
    pub cancelled: bool,
}

/// Collected results of a scan: every per-file outcome, sorted by path, plus
/// the terminal summary.
#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    pub matches: Vec<FileMatch>,
    pub summary: ScanSummary,
}

impl ScanOutcome {
    /// Files whose content contained the search text
    pub fn found(&self) -> impl Iterator<Item = &FileMatch> {
        self.matches
            .iter()
            .filter(|m| m.status == MatchStatus::Found)
    }

    pub fn found_count(&self) -> usize {
        self.found().count()
    }

    /// Files that could not be read or parsed
    pub fn error_count(&self) -> usize {
        self.matches
            .iter()
            .filter(|m| m.status == MatchStatus::Error)
            .count()
    }
}
