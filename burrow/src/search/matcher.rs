//! Per-file content matching. A file is classified into one of four kinds —
//! by extension first, then by magic number — and handed to the checker for
//! that kind. Checkers answer with `Ok(true)` (found), `Ok(false)` (not
//! found, including cancelled or depth-bounded checks) or an error, which
//! the dispatch boundary converts to `MatchStatus::Error`.

use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek};
use std::path::Path;
use tracing::debug;
use xml::reader::{EventReader, XmlEvent};
use zip::result::ZipError;
use zip::ZipArchive;

use super::archive::recursive_archive_check;
use crate::cancel::CancelToken;
use crate::config::CaseMode;
use crate::errors::{SearchError, SearchResult};
use crate::results::MatchStatus;

/// ZIP local-file-header magic number, used to catch misnamed archives
const ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];

const LINE_BUFFER_CAPACITY: usize = 256;

/// The search text with its comparison mode, case-folded once per scan so
/// per-line tests never re-fold the needle. An empty query matches nothing.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    text: String,
    folded: String,
    case: CaseMode,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>, case: CaseMode) -> Self {
        let text = text.into();
        let folded = text.to_lowercase();
        Self { text, folded, case }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// True when the text contains a space, which switches on whitespace
    /// normalization for extracted PDF page text.
    pub fn contains_space(&self) -> bool {
        self.text.contains(' ')
    }

    /// Substring test under the query's comparison mode
    pub fn matches(&self, candidate: &str) -> bool {
        if self.text.is_empty() {
            return false;
        }
        match self.case {
            CaseMode::Sensitive => candidate.contains(&self.text),
            CaseMode::Insensitive => candidate.to_lowercase().contains(&self.folded),
        }
    }
}

/// Format a candidate file is matched as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Docx,
    Pdf,
    Zip,
    PlainText,
}

/// Picks the matcher for a path: extension first, then the ZIP magic number
/// for misnamed or extension-less archives, plain text otherwise.
pub fn classify(path: &Path) -> FileKind {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("docx") => FileKind::Docx,
        Some(ext) if ext.eq_ignore_ascii_case("pdf") => FileKind::Pdf,
        Some(ext) if ext.eq_ignore_ascii_case("zip") => FileKind::Zip,
        _ => {
            if is_zip_archive(path) {
                FileKind::Zip
            } else {
                FileKind::PlainText
            }
        }
    }
}

/// Checks the first four bytes of a file against the ZIP magic number.
/// Unreadable files simply report false; the real error surfaces later when
/// the file is actually matched.
pub fn is_zip_archive(path: &Path) -> bool {
    let mut magic = [0u8; 4];
    match File::open(path).and_then(|mut f| f.read_exact(&mut magic)) {
        Ok(()) => magic == ZIP_MAGIC,
        Err(_) => false,
    }
}

/// Checks one candidate file for the search text.
///
/// This is the dispatch boundary of the error taxonomy: checker failures are
/// logged and folded into `MatchStatus::Error` here, so one unreadable file
/// never disturbs the rest of the scan.
pub fn check_file(
    path: &Path,
    query: &SearchQuery,
    inner_patterns: &[glob::Pattern],
    cancel: &CancelToken,
) -> MatchStatus {
    let outcome = match classify(path) {
        FileKind::Docx => docx_contains(path, query),
        FileKind::Pdf => pdf_contains(path, query, cancel),
        FileKind::Zip => zip_contains(path, query, inner_patterns, cancel),
        FileKind::PlainText => text_contains(path, query),
    };

    match outcome {
        Ok(true) => MatchStatus::Found,
        Ok(false) => MatchStatus::NotFound,
        Err(e) => {
            debug!("error checking {}: {e}", path.display());
            MatchStatus::Error
        }
    }
}

fn open_file(path: &Path) -> SearchResult<File> {
    File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => SearchError::file_not_found(path),
        _ => SearchError::Io(e),
    })
}

/// Line-oriented scan over any byte stream. Lines are decoded lossily so
/// stray binary content degrades to replacement characters instead of
/// aborting the file.
pub(crate) fn scan_lines(mut reader: impl BufRead, query: &SearchQuery) -> SearchResult<bool> {
    if query.is_empty() {
        return Ok(false);
    }

    let mut buf = Vec::with_capacity(LINE_BUFFER_CAPACITY);
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            return Ok(false);
        }
        let line = String::from_utf8_lossy(&buf);
        if query.matches(&line) {
            return Ok(true);
        }
    }
}

/// Plain-text checker: first matching line wins
pub fn text_contains(path: &Path, query: &SearchQuery) -> SearchResult<bool> {
    if query.is_empty() {
        return Ok(false);
    }
    let file = open_file(path)?;
    scan_lines(BufReader::new(file), query)
}

/// DOCX checker: the document body lives in the `word/document.xml` entry of
/// the archive. Each XML text node is tested independently, so a match split
/// across adjacent runs is not detected.
pub fn docx_contains(path: &Path, query: &SearchQuery) -> SearchResult<bool> {
    if query.is_empty() {
        return Ok(false);
    }
    let file = open_file(path)?;
    let mut archive =
        ZipArchive::new(file).map_err(|e| SearchError::archive(e.to_string()))?;
    docx_archive_contains(&mut archive, query)
}

/// DOCX body scan over an already-open archive, shared with the archive
/// walker for DOCX entries nested inside ZIPs. A missing document entry is
/// NotFound, not an error.
pub(crate) fn docx_archive_contains<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    query: &SearchQuery,
) -> SearchResult<bool> {
    let entry = match archive.by_name("word/document.xml") {
        Ok(entry) => entry,
        Err(ZipError::FileNotFound) => return Ok(false),
        Err(e) => return Err(SearchError::archive(e.to_string())),
    };
    xml_text_contains(entry, query)
}

fn xml_text_contains(reader: impl Read, query: &SearchQuery) -> SearchResult<bool> {
    let mut parser = EventReader::new(reader);
    loop {
        match parser
            .next()
            .map_err(|e| SearchError::document(e.to_string()))?
        {
            XmlEvent::Characters(text) => {
                if query.matches(&text) {
                    return Ok(true);
                }
            }
            XmlEvent::EndDocument => return Ok(false),
            _ => {}
        }
    }
}

/// PDF checker: page text is extracted up front, then scanned page by page
pub fn pdf_contains(path: &Path, query: &SearchQuery, cancel: &CancelToken) -> SearchResult<bool> {
    if query.is_empty() {
        return Ok(false);
    }
    let pages =
        pdf_extract::extract_text_by_pages(path).map_err(|e| SearchError::pdf(e.to_string()))?;
    Ok(pdf_pages_contain(&pages, query, cancel))
}

/// PDF page scan shared with the archive walker.
///
/// Extraction turns a single line of prose into several, so when the query
/// itself contains a space every whitespace run in the page text is collapsed
/// to one space before comparing. Space-free queries are compared verbatim.
pub(crate) fn pdf_pages_contain(pages: &[String], query: &SearchQuery, cancel: &CancelToken) -> bool {
    let normalize = query.contains_space();
    for page in pages {
        if cancel.is_cancelled() {
            return false;
        }
        if normalize {
            let collapsed = collapse_whitespace(page);
            if query.matches(&collapsed) {
                return true;
            }
        } else if query.matches(page) {
            return true;
        }
    }
    false
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// ZIP checker: hands the opened archive to the recursive walker
pub fn zip_contains(
    path: &Path,
    query: &SearchQuery,
    inner_patterns: &[glob::Pattern],
    cancel: &CancelToken,
) -> SearchResult<bool> {
    if query.is_empty() {
        return Ok(false);
    }
    let file = open_file(path)?;
    let mut archive =
        ZipArchive::new(file).map_err(|e| SearchError::archive(e.to_string()))?;
    recursive_archive_check(&mut archive, query, inner_patterns, cancel, 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use tempfile::tempdir;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn query(text: &str) -> SearchQuery {
        SearchQuery::new(text, CaseMode::Insensitive)
    }

    fn sensitive(text: &str) -> SearchQuery {
        SearchQuery::new(text, CaseMode::Sensitive)
    }

    fn docx_bytes(body_text: &str) -> Vec<u8> {
        let document = format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
             <w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
             <w:body><w:p><w:r><w:t>{body_text}</w:t></w:r></w:p></w:body></w:document>"
        );
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("word/document.xml", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(document.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_query_matching() {
        assert!(query("abc").matches("xxABCxx"));
        assert!(!sensitive("ABC").matches("xxabcxx"));
        assert!(sensitive("abc").matches("xxabcxx"));
        assert!(!query("abc").matches("ab c"));
    }

    #[test]
    fn test_empty_query_matches_nothing() {
        assert!(!query("").matches("anything"));
        assert!(query("").is_empty());
    }

    #[test]
    fn test_classify_by_extension() {
        assert_eq!(classify(Path::new("report.docx")), FileKind::Docx);
        assert_eq!(classify(Path::new("report.DOCX")), FileKind::Docx);
        assert_eq!(classify(Path::new("report.pdf")), FileKind::Pdf);
        assert_eq!(classify(Path::new("backup.Zip")), FileKind::Zip);
        assert_eq!(classify(Path::new("notes.txt")), FileKind::PlainText);
    }

    #[test]
    fn test_classify_by_magic_number() {
        let dir = tempdir().unwrap();

        let disguised = dir.path().join("archive.bin");
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("inner.txt", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"hello").unwrap();
        std::fs::write(&disguised, writer.finish().unwrap().into_inner()).unwrap();
        assert_eq!(classify(&disguised), FileKind::Zip);
        assert!(is_zip_archive(&disguised));

        let plain = dir.path().join("notes");
        std::fs::write(&plain, "just text").unwrap();
        assert_eq!(classify(&plain), FileKind::PlainText);
        assert!(!is_zip_archive(&plain));

        // too short to hold a magic number
        let stub = dir.path().join("stub");
        std::fs::write(&stub, "PK").unwrap();
        assert!(!is_zip_archive(&stub));
    }

    #[test]
    fn test_text_contains() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lines.txt");
        std::fs::write(&path, "first line\nsecond line\nthird line\n").unwrap();

        assert!(text_contains(&path, &query("second")).unwrap());
        assert!(text_contains(&path, &query("SECOND")).unwrap());
        assert!(!text_contains(&path, &sensitive("SECOND")).unwrap());
        assert!(!text_contains(&path, &query("fourth")).unwrap());
        assert!(!text_contains(&path, &query("")).unwrap());
    }

    #[test]
    fn test_text_contains_survives_binary_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mixed.bin");
        let mut bytes = vec![0u8, 159, 146, 150, b'\n'];
        bytes.extend_from_slice(b"needle in here\n");
        std::fs::write(&path, bytes).unwrap();

        assert!(text_contains(&path, &query("needle")).unwrap());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        let gone = dir.path().join("gone.txt");
        assert!(text_contains(&gone, &query("x")).is_err());
        assert_eq!(
            check_file(&gone, &query("x"), &[], &CancelToken::new()),
            MatchStatus::Error
        );
    }

    #[test]
    fn test_docx_contains() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("speech.docx");
        std::fs::write(&path, docx_bytes("the terrors of the earth")).unwrap();

        assert!(docx_contains(&path, &query("terrors of the earth")).unwrap());
        assert!(docx_contains(&path, &query("TERRORS")).unwrap());
        assert!(!docx_contains(&path, &sensitive("TERRORS")).unwrap());
        assert!(!docx_contains(&path, &query("dagger of the mind")).unwrap());
        assert!(!docx_contains(&path, &query("")).unwrap());
    }

    #[test]
    fn test_docx_without_document_entry_is_not_found() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("odd.docx");
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("word/styles.xml", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"<styles/>").unwrap();
        std::fs::write(&path, writer.finish().unwrap().into_inner()).unwrap();

        assert!(!docx_contains(&path, &query("anything")).unwrap());
    }

    #[test]
    fn test_corrupt_docx_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.docx");
        std::fs::write(&path, b"this is not a zip archive").unwrap();

        assert!(docx_contains(&path, &query("anything")).is_err());
        assert_eq!(
            check_file(&path, &query("anything"), &[], &CancelToken::new()),
            MatchStatus::Error
        );
    }

    #[test]
    fn test_pdf_pages_whitespace_normalization() {
        let pages = vec!["the quick brown\nfox jumps".to_string()];
        let cancel = CancelToken::new();

        // extraction broke the phrase across lines; a spaced query still hits
        assert!(pdf_pages_contain(&pages, &query("brown fox"), &cancel));
        // space-free queries are compared verbatim
        assert!(pdf_pages_contain(&pages, &query("fox"), &cancel));
        assert!(!pdf_pages_contain(&pages, &query("brownfox"), &cancel));
    }

    #[test]
    fn test_pdf_pages_short_circuit_and_cancel() {
        let pages = vec!["nothing here".to_string(), "the needle page".to_string()];
        let cancel = CancelToken::new();
        assert!(pdf_pages_contain(&pages, &query("needle"), &cancel));

        cancel.cancel();
        assert!(!pdf_pages_contain(&pages, &query("needle"), &cancel));
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("a  b\r\n\tc"), "a b c");
        assert_eq!(collapse_whitespace("  lead and trail  "), "lead and trail");
    }

    #[test]
    fn test_check_file_dispatch() {
        let dir = tempdir().unwrap();

        let txt = dir.path().join("a.txt");
        std::fs::write(&txt, "hello world\n").unwrap();
        assert_eq!(
            check_file(&txt, &query("hello"), &[], &CancelToken::new()),
            MatchStatus::Found
        );
        assert_eq!(
            check_file(&txt, &query("absent"), &[], &CancelToken::new()),
            MatchStatus::NotFound
        );

        let docx = dir.path().join("b.docx");
        std::fs::write(&docx, docx_bytes("hello world")).unwrap();
        assert_eq!(
            check_file(&docx, &query("hello"), &[], &CancelToken::new()),
            MatchStatus::Found
        );
    }
}
