//! Scan orchestration. A scan runs in two phases over one worker pool size:
//! discovery (glob-driven traversal producing the candidate list) and
//! matching (one content check per file). The phases are sequential with
//! respect to each other; each is data-parallel internally with no shared
//! per-item state.

use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread::JoinHandle;
use std::time::Instant;
use tracing::{debug, info};

use super::matcher::{check_file, SearchQuery};
use crate::cancel::CancelToken;
use crate::config::SearchRequest;
use crate::errors::{SearchError, SearchResult};
use crate::patterns::{compile_inner, compile_outer};
use crate::results::{FileMatch, ScanOutcome, ScanSummary};
use crate::walk::parallel_find_files;

/// Progress-callback stride for a scan of `count` files: every file below
/// 100, then roughly every 1% of the total, capped at 201 so very large
/// scans still update visibly.
pub fn progress_step(count: usize) -> usize {
    if count < 100 {
        return 1;
    }
    (count / 100).clamp(1, 201)
}

/// Runs a scan and collects every per-file result, sorted by path.
pub fn search(request: &SearchRequest, cancel: &CancelToken) -> SearchResult<ScanOutcome> {
    let collected = Mutex::new(Vec::new());
    let summary = search_with(
        request,
        cancel,
        |m| collected.lock().expect("results lock poisoned").push(m),
        None,
    )?;

    let mut matches = collected.into_inner().expect("results lock poisoned");
    matches.sort_unstable_by(|a, b| a.path.cmp(&b.path));
    Ok(ScanOutcome { matches, summary })
}

/// Runs a scan, streaming each per-file result to `on_result` as it is
/// produced. No ordering is guaranteed between concurrently completing
/// checks; callers needing a stable view should sort what they collect.
///
/// `progress`, when given, is invoked with a monotonically increasing
/// processed-file count, throttled by [`progress_step`] so reporting never
/// dominates scan cost.
///
/// Cancellation never surfaces as an error: the summary comes back with
/// `cancelled` set and whatever results were already delivered stand.
pub fn search_with<F>(
    request: &SearchRequest,
    cancel: &CancelToken,
    on_result: F,
    progress: Option<&(dyn Fn(usize) + Sync)>,
) -> SearchResult<ScanSummary>
where
    F: Fn(FileMatch) + Sync,
{
    let start = Instant::now();
    info!(
        "searching for {:?} under {}",
        request.search_text,
        request.root.display()
    );

    let raw_patterns = request.effective_patterns();
    let outer = compile_outer(&raw_patterns, request.inside_zips)?;
    let inner = compile_inner(&raw_patterns)?;
    let query = SearchQuery::new(request.search_text.clone(), request.case_mode());
    let degree = request.degree_of_parallelism();

    let files = parallel_find_files(&request.root, &outer, degree, None, cancel)?;
    debug!("discovered {} candidate files", files.len());

    let step = progress_step(files.len());
    let counter = AtomicUsize::new(0);

    let process = |path: &std::path::PathBuf| {
        let status = check_file(path, &query, &inner, cancel);
        on_result(FileMatch {
            path: path.clone(),
            status,
        });
        let done = counter.fetch_add(1, Ordering::Relaxed) + 1;
        if done % step == 0 {
            if let Some(report) = progress {
                report(done);
            }
        }
    };

    if degree <= 1 {
        for path in &files {
            if cancel.is_cancelled() {
                break;
            }
            process(path);
        }
    } else {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(degree)
            .build()
            .map_err(|e| SearchError::thread_pool(e.to_string()))?;
        pool.install(|| {
            files.par_iter().for_each(|path| {
                if cancel.is_cancelled() {
                    return;
                }
                process(path);
            });
        });
    }

    let summary = ScanSummary {
        files_scanned: counter.load(Ordering::Relaxed),
        elapsed: start.elapsed(),
        cancelled: cancel.is_cancelled(),
    };
    info!(
        "scan {}: {} files in {:?}",
        if summary.cancelled { "cancelled" } else { "complete" },
        summary.files_scanned,
        summary.elapsed
    );
    Ok(summary)
}

/// Runs a scan on a background thread, handing results back over an
/// unbounded channel. Any number of workers produce into the channel; the
/// caller is the single consumer. The receiver drains until the scan ends,
/// then the join handle yields the summary.
pub fn spawn_search(
    request: SearchRequest,
    cancel: CancelToken,
) -> (
    crossbeam_channel::Receiver<FileMatch>,
    JoinHandle<SearchResult<ScanSummary>>,
) {
    let (tx, rx) = crossbeam_channel::unbounded();
    let handle = std::thread::spawn(move || {
        search_with(
            &request,
            &cancel,
            move |m| {
                // a disconnected receiver just means the consumer went away
                let _ = tx.send(m);
            },
            None,
        )
    });
    (rx, handle)
}
