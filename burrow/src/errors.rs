use std::path::PathBuf;
use thiserror::Error;

/// Result type for search operations
pub type SearchResult<T> = Result<T, SearchError>;

/// Errors that can occur during search operations
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
    #[error("Archive error: {0}")]
    Archive(String),
    #[error("Document error: {0}")]
    Document(String),
    #[error("PDF error: {0}")]
    Pdf(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Thread pool error: {0}")]
    ThreadPool(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SearchError {
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound(path.into())
    }

    pub fn invalid_pattern(pattern: impl Into<String>) -> Self {
        Self::InvalidPattern(pattern.into())
    }

    pub fn archive(msg: impl Into<String>) -> Self {
        Self::Archive(msg.into())
    }

    pub fn document(msg: impl Into<String>) -> Self {
        Self::Document(msg.into())
    }

    pub fn pdf(msg: impl Into<String>) -> Self {
        Self::Pdf(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn thread_pool(msg: impl Into<String>) -> Self {
        Self::ThreadPool(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_error_creation() {
        let err = SearchError::file_not_found(Path::new("test.txt"));
        assert!(matches!(err, SearchError::FileNotFound(_)));

        let err = SearchError::invalid_pattern("bad glob");
        assert!(matches!(err, SearchError::InvalidPattern(_)));

        let err = SearchError::archive("truncated central directory");
        assert!(matches!(err, SearchError::Archive(_)));

        let err = SearchError::config("missing field");
        assert!(matches!(err, SearchError::Config(_)));
    }

    #[test]
    fn test_error_messages() {
        let err = SearchError::invalid_pattern("[");
        assert_eq!(err.to_string(), "Invalid pattern: [");

        let err = SearchError::pdf("bad xref table");
        assert_eq!(err.to_string(), "PDF error: bad xref table");

        let err = SearchError::file_not_found("test.txt");
        assert_eq!(err.to_string(), "File not found: test.txt");
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: SearchError = io.into();
        assert!(matches!(err, SearchError::Io(_)));
    }
}
