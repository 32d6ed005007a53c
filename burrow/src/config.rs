use config::{Config as ConfigBuilder, ConfigError, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// How the search text is compared against file content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseMode {
    /// Exact byte-for-byte comparison
    Sensitive,
    /// Case-folded comparison
    Insensitive,
}

/// A single search request: where to look, what to look for, and how.
///
/// Values can come from a YAML config file, from the command line, or both;
/// `merge_with_cli` applies the usual precedence (CLI wins). A request is
/// immutable once a scan starts.
///
/// Config file locations, in order of precedence:
/// 1. Custom file passed via `--config`
/// 2. Local `.burrow.yaml` in the current directory
/// 3. Global `<config-dir>/burrow/config.yaml`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Root directory to search from
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Filename glob patterns, e.g. `["*.txt", "*.md"]`.
    /// An empty list means "every file" (`*`).
    #[serde(default)]
    pub patterns: Vec<String>,

    /// Exact substring to look for inside matching files
    #[serde(default)]
    pub search_text: String,

    /// Compare case-sensitively instead of the default case-insensitive
    #[serde(default)]
    pub case_sensitive: bool,

    /// Look inside ZIP archives even when no `*.zip` pattern was given
    #[serde(default)]
    pub inside_zips: bool,

    /// Restrict the scan to a single worker thread
    #[serde(default)]
    pub one_thread: bool,

    /// Storage-medium hint: spinning disks get a lower fan-out
    #[serde(default = "default_solid_state")]
    pub solid_state: bool,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_solid_state() -> bool {
    true
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self {
            root: default_root(),
            patterns: Vec::new(),
            search_text: String::new(),
            case_sensitive: false,
            inside_zips: false,
            one_thread: false,
            solid_state: default_solid_state(),
            log_level: default_log_level(),
        }
    }
}

impl SearchRequest {
    /// The raw pattern list, with the empty list standing in for "everything"
    pub fn effective_patterns(&self) -> Vec<String> {
        if self.patterns.is_empty() {
            vec!["*".to_string()]
        } else {
            self.patterns.clone()
        }
    }

    pub fn case_mode(&self) -> CaseMode {
        if self.case_sensitive {
            CaseMode::Sensitive
        } else {
            CaseMode::Insensitive
        }
    }

    /// Worker-pool size for both the traversal and matching phases.
    ///
    /// Single-thread requests get 1. Otherwise the logical core count, halved
    /// (minimum 1) when the storage hint says spinning disk, since seeking
    /// media gain little from high fan-out.
    pub fn degree_of_parallelism(&self) -> usize {
        if self.one_thread {
            return 1;
        }
        let cores = num_cpus::get();
        if self.solid_state {
            cores
        } else {
            (cores / 2).max(1)
        }
    }

    /// Loads a request from the default config locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Loads a request, optionally from a specific file
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        let config_files = [
            // Global config
            dirs::config_dir().map(|p| p.join("burrow/config.yaml")),
            // Local config
            Some(PathBuf::from(".burrow.yaml")),
            // Custom config
            config_path.map(PathBuf::from),
        ];

        for path in config_files.iter().flatten() {
            if path.exists() {
                builder = builder.add_source(File::from(path.as_path()));
            }
        }

        builder.build()?.try_deserialize()
    }

    /// Merges CLI arguments over config-file values. CLI values win whenever
    /// they differ from their defaults; boolean flags can only switch a
    /// setting on (or, for `solid_state`, off).
    pub fn merge_with_cli(mut self, cli: SearchRequest) -> Self {
        if !cli.patterns.is_empty() {
            self.patterns = cli.patterns;
        }
        if cli.root != default_root() {
            self.root = cli.root;
        }
        if !cli.search_text.is_empty() {
            self.search_text = cli.search_text;
        }
        self.case_sensitive |= cli.case_sensitive;
        self.inside_zips |= cli.inside_zips;
        self.one_thread |= cli.one_thread;
        self.solid_state &= cli.solid_state;
        if cli.log_level != default_log_level() {
            self.log_level = cli.log_level;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_default_request() {
        let request = SearchRequest::default();
        assert_eq!(request.root, PathBuf::from("."));
        assert!(request.patterns.is_empty());
        assert_eq!(request.effective_patterns(), vec!["*".to_string()]);
        assert!(!request.case_sensitive);
        assert!(request.solid_state);
        assert_eq!(request.log_level, "warn");
    }

    #[test]
    fn test_case_mode() {
        let mut request = SearchRequest::default();
        assert_eq!(request.case_mode(), CaseMode::Insensitive);
        request.case_sensitive = true;
        assert_eq!(request.case_mode(), CaseMode::Sensitive);
    }

    #[test]
    fn test_degree_of_parallelism() {
        let mut request = SearchRequest::default();
        assert_eq!(request.degree_of_parallelism(), num_cpus::get());

        request.solid_state = false;
        assert_eq!(
            request.degree_of_parallelism(),
            (num_cpus::get() / 2).max(1)
        );

        request.one_thread = true;
        assert_eq!(request.degree_of_parallelism(), 1);
    }

    #[test]
    fn test_load_config_file() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.yaml");
        let config_content = r#"
            patterns: ["*.txt", "*.md"]
            root: "docs"
            search_text: "needle"
            case_sensitive: true
            inside_zips: true
            solid_state: false
            log_level: "debug"
        "#;

        let mut file = File::create(&config_path).unwrap();
        file.write_all(config_content.as_bytes()).unwrap();

        let request = SearchRequest::load_from(Some(&config_path)).unwrap();
        assert_eq!(request.patterns, vec!["*.txt", "*.md"]);
        assert_eq!(request.root, PathBuf::from("docs"));
        assert_eq!(request.search_text, "needle");
        assert!(request.case_sensitive);
        assert!(request.inside_zips);
        assert!(!request.solid_state);
        assert!(!request.one_thread);
        assert_eq!(request.log_level, "debug");
    }

    #[test]
    fn test_merge_with_cli() {
        let file_config = SearchRequest {
            root: PathBuf::from("docs"),
            patterns: vec!["*.txt".to_string()],
            search_text: "old".to_string(),
            inside_zips: true,
            solid_state: true,
            ..Default::default()
        };

        let cli_config = SearchRequest {
            root: PathBuf::from("notes"),
            patterns: Vec::new(),
            search_text: "new".to_string(),
            case_sensitive: true,
            solid_state: false,
            ..Default::default()
        };

        let merged = file_config.merge_with_cli(cli_config);
        assert_eq!(merged.root, PathBuf::from("notes")); // CLI value
        assert_eq!(merged.patterns, vec!["*.txt"]); // file value (CLI empty)
        assert_eq!(merged.search_text, "new"); // CLI value
        assert!(merged.case_sensitive); // CLI flag
        assert!(merged.inside_zips); // file flag survives
        assert!(!merged.solid_state); // CLI --hdd wins
    }

    #[test]
    fn test_invalid_config() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.yaml");
        let mut file = File::create(&config_path).unwrap();
        file.write_all(b"patterns: 123\nroot: []\n").unwrap();

        assert!(SearchRequest::load_from(Some(&config_path)).is_err());
    }
}
