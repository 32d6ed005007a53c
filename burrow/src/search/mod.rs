//! The search pipeline: discovery hands a candidate file list to per-file
//! content matching, and matching dispatches into archives as needed. See
//! [`engine`] for orchestration, [`matcher`] for format dispatch and the
//! per-format checkers, and [`archive`] for recursive ZIP descent.

pub mod archive;
pub mod engine;
pub mod matcher;

pub use archive::MAX_NESTING_DEPTH;
pub use engine::{progress_step, search, search_with, spawn_search};
pub use matcher::{check_file, classify, FileKind, SearchQuery};
