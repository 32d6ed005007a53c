//! Directory traversal. Two modes share one contract: produce the sorted,
//! deduplicated list of files under a root whose names match at least one
//! outer glob.
//!
//! The serial mode is a plain depth-first recursion. The parallel mode is a
//! breadth-first, level-synchronized walk over a two-buffer frontier: every
//! directory of the current generation is processed concurrently, its
//! subdirectories feed the next generation, and the buffers swap at the
//! generation boundary. Recursion depth is bounded by the tree's real depth
//! rather than the call stack, and each directory is owned by exactly one
//! worker for its lifetime. The first generations near the root offer little
//! parallelism; that is accepted in exchange for not needing work stealing.
//!
//! Inaccessible directories and files are skipped silently in both modes.

use glob::Pattern;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

use crate::cancel::CancelToken;
use crate::errors::{SearchError, SearchResult};

/// Per-directory listing produced by one worker: matching files plus the
/// subdirectories that join the next frontier.
struct DirScan {
    files: Vec<PathBuf>,
    subdirs: Vec<PathBuf>,
}

fn scan_dir(dir: &Path, globs: &[Pattern], cancel: &CancelToken) -> DirScan {
    let mut scan = DirScan {
        files: Vec::new(),
        subdirs: Vec::new(),
    };

    if cancel.is_cancelled() {
        return scan;
    }

    // Unreadable directories are skipped, not reported
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return scan,
    };

    for entry in entries.flatten() {
        let file_type = match entry.file_type() {
            Ok(ft) => ft,
            Err(_) => continue,
        };

        if file_type.is_dir() {
            scan.subdirs.push(entry.path());
        } else if file_type.is_file() {
            if let Some(name) = entry.file_name().to_str() {
                if globs.iter().any(|g| g.matches(name)) {
                    scan.files.push(entry.path());
                }
            }
        }
    }

    scan
}

fn finalize(mut files: Vec<PathBuf>) -> Vec<PathBuf> {
    files.sort_unstable();
    files.dedup();
    files
}

/// Depth-first serial walk. Cancellation is checked once per directory; a
/// cancelled walk returns whatever it had collected so far.
pub fn find_files(root: &Path, globs: &[Pattern], cancel: &CancelToken) -> Vec<PathBuf> {
    let mut files = Vec::new();
    walk_serial(root, globs, cancel, &mut files);
    finalize(files)
}

fn walk_serial(dir: &Path, globs: &[Pattern], cancel: &CancelToken, out: &mut Vec<PathBuf>) {
    if cancel.is_cancelled() {
        return;
    }

    let scan = scan_dir(dir, globs, cancel);
    out.extend(scan.files);

    for sub in scan.subdirs {
        walk_serial(&sub, globs, cancel, out);
    }
}

/// Generation-based parallel walk. Falls back to the serial walk when the
/// requested degree is 1.
///
/// `progress`, when given, is invoked once per generation with the
/// cumulative count of directories handed to workers so far.
pub fn parallel_find_files(
    root: &Path,
    globs: &[Pattern],
    degree: usize,
    progress: Option<&(dyn Fn(usize) + Sync)>,
    cancel: &CancelToken,
) -> SearchResult<Vec<PathBuf>> {
    if degree <= 1 {
        return Ok(find_files(root, globs, cancel));
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(degree)
        .build()
        .map_err(|e| SearchError::thread_pool(e.to_string()))?;

    let mut current = vec![root.to_path_buf()];
    let mut next: Vec<PathBuf> = Vec::new();
    let mut files = Vec::new();
    let mut visited = 0usize;

    while !current.is_empty() {
        if cancel.is_cancelled() {
            break;
        }

        visited += current.len();
        if let Some(report) = progress {
            report(visited);
        }

        // One generation: every frontier directory is scanned concurrently,
        // each worker building local lists that are merged only here.
        let scans: Vec<DirScan> = pool.install(|| {
            current
                .par_iter()
                .map(|dir| scan_dir(dir, globs, cancel))
                .collect()
        });

        for scan in scans {
            files.extend(scan.files);
            next.extend(scan.subdirs);
        }

        if next.is_empty() {
            break;
        }

        current.clear();
        std::mem::swap(&mut current, &mut next);
    }

    Ok(finalize(files))
}
