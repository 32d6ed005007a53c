//! Recursive descent into ZIP archives. Every entry is dispatched by name
//! suffix to the matching checker — nested ZIPs recurse with an incremented
//! depth, DOCX and PDF entries reuse the document checkers, everything else
//! is scanned as text when the inner patterns allow it. The walk
//! short-circuits on the first matching entry.

use std::io::{BufReader, Cursor, Read, Seek};
use tracing::debug;
use zip::ZipArchive;

use super::matcher::{docx_archive_contains, pdf_pages_contain, scan_lines, SearchQuery};
use crate::cancel::CancelToken;
use crate::errors::{SearchError, SearchResult};
use crate::patterns::ends_with_ignore_case;

/// Maximum ZIP-within-ZIP depth. Descent past this bound is refused and
/// treated as "nothing found" rather than an error, so archive-bomb style
/// nesting stays invisible to the caller.
pub const MAX_NESTING_DEPTH: usize = 10;

/// Scans every entry of an archive for the query, recursing into nested
/// archives with `depth + 1`.
///
/// Returns `Ok(true)` as soon as any entry matches, `Ok(false)` once all
/// entries are exhausted, the depth bound is hit, or cancellation is
/// requested. Read or parse failures bubble up and become the containing
/// file's `Error` status.
pub fn recursive_archive_check<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    query: &SearchQuery,
    inner_patterns: &[glob::Pattern],
    cancel: &CancelToken,
    depth: usize,
) -> SearchResult<bool> {
    if depth >= MAX_NESTING_DEPTH {
        debug!("maximum archive nesting depth ({MAX_NESTING_DEPTH}) reached, skipping");
        return Ok(false);
    }

    for index in 0..archive.len() {
        if cancel.is_cancelled() {
            return Ok(false);
        }

        let mut entry = archive
            .by_index(index)
            .map_err(|e| SearchError::archive(e.to_string()))?;
        let name = entry.name().to_string();

        // directory entries carry no content
        if name.ends_with('/') {
            continue;
        }

        let found = if ends_with_ignore_case(&name, ".zip") {
            let mut nested = open_nested(&mut entry)?;
            recursive_archive_check(&mut nested, query, inner_patterns, cancel, depth + 1)?
        } else if ends_with_ignore_case(&name, ".docx") {
            let mut nested = open_nested(&mut entry)?;
            docx_archive_contains(&mut nested, query)?
        } else if ends_with_ignore_case(&name, ".pdf") {
            let bytes = read_entry(&mut entry)?;
            let pages = pdf_extract::extract_text_from_mem_by_pages(&bytes)
                .map_err(|e| SearchError::pdf(e.to_string()))?;
            pdf_pages_contain(&pages, query, cancel)
        } else if matches_inner(&name, inner_patterns) {
            scan_lines(BufReader::new(entry), query)?
        } else {
            false
        };

        if found {
            return Ok(true);
        }
    }

    Ok(false)
}

/// Glob filtering applies to the entry's bare name, not its path inside the
/// archive; the `/` separators would defeat filename patterns.
fn matches_inner(name: &str, inner_patterns: &[glob::Pattern]) -> bool {
    let bare = name.rsplit('/').next().unwrap_or(name);
    inner_patterns.is_empty() || inner_patterns.iter().any(|p| p.matches(bare))
}

fn read_entry(entry: &mut impl Read) -> SearchResult<Vec<u8>> {
    let mut bytes = Vec::new();
    entry.read_to_end(&mut bytes)?;
    Ok(bytes)
}

/// Entry streams are not seekable, so a nested archive is drained to memory
/// before reopening. Bounded in practice by the nesting-depth guard.
fn open_nested(entry: &mut impl Read) -> SearchResult<ZipArchive<Cursor<Vec<u8>>>> {
    let bytes = read_entry(entry)?;
    ZipArchive::new(Cursor::new(bytes)).map_err(|e| SearchError::archive(e.to_string()))
}
