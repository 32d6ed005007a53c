//! Derives the two glob sets a scan works with: "outer" patterns select
//! files on disk during traversal, "inner" patterns select entry names
//! inside archives.

use glob::Pattern;

use crate::errors::{SearchError, SearchResult};

/// ASCII case-insensitive suffix test, safe on any UTF-8 name.
pub(crate) fn ends_with_ignore_case(name: &str, suffix: &str) -> bool {
    let Some(start) = name.len().checked_sub(suffix.len()) else {
        return false;
    };
    name.is_char_boundary(start) && name[start..].eq_ignore_ascii_case(suffix)
}

fn compile_one(pattern: &str) -> SearchResult<Pattern> {
    Pattern::new(pattern)
        .map_err(|e| SearchError::invalid_pattern(format!("{pattern}: {e}")))
}

/// Compiles the patterns applied to files found on disk.
///
/// Every raw pattern is kept. When `include_zips` is set and no pattern
/// already equals `*.zip` (case-insensitively), a synthetic `*.zip` is
/// appended so archives are picked up for inspection even though the user
/// asked for, say, `*.docx`.
pub fn compile_outer(patterns: &[String], include_zips: bool) -> SearchResult<Vec<Pattern>> {
    let mut globs = patterns
        .iter()
        .map(|p| compile_one(p))
        .collect::<SearchResult<Vec<_>>>()?;

    let has_zip = patterns.iter().any(|p| p.eq_ignore_ascii_case("*.zip"));
    if include_zips && !has_zip {
        globs.push(compile_one("*.zip")?);
    }

    Ok(globs)
}

/// Compiles the patterns applied to entry names inside archives.
///
/// Patterns ending in `.zip` (case-insensitively) are dropped: nested
/// archives are always recursed into, never filtered, so a zip-shaped inner
/// pattern could only ever exclude real content. An empty result means
/// "match every entry name".
pub fn compile_inner(patterns: &[String]) -> SearchResult<Vec<Pattern>> {
    patterns
        .iter()
        .filter(|p| !ends_with_ignore_case(p, ".zip"))
        .map(|p| compile_one(p))
        .collect()
}
