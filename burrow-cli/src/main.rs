use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use colored::Colorize;
use indicatif::ProgressBar;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use burrow::{spawn_search, CancelToken, MatchStatus, SearchError, SearchRequest, SearchResult};

/// Search file contents recursively, including inside ZIP archives, DOCX
/// documents and PDF documents.
#[derive(Parser, Debug)]
#[command(name = "burrow", version, about)]
struct Cli {
    /// Text to search for
    #[arg(short, long)]
    search: String,

    /// Filename glob patterns, comma separated (defaults to "*")
    #[arg(short, long, value_delimiter = ',')]
    pattern: Vec<String>,

    /// Folder to start from
    #[arg(short, long, default_value = ".")]
    folder: PathBuf,

    /// Match case-sensitively
    #[arg(short, long)]
    case_sensitive: bool,

    /// Always look inside ZIP archives, even without a *.zip pattern
    #[arg(short = 'z', long)]
    inside_zips: bool,

    /// Use a single worker thread
    #[arg(short = 'o', long)]
    one_thread: bool,

    /// Tune for a spinning disk instead of an SSD
    #[arg(long)]
    hdd: bool,

    /// Suppress per-file error lines
    #[arg(long)]
    hide_errors: bool,

    /// Plain output: matching paths only, no spinner or summary
    #[arg(long)]
    raw: bool,

    /// Read settings from a specific config file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let request = build_request(&cli);
    init_logging(&request.log_level);
    debug!("merged request: {request:?}");

    match run(request, &cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", format!("error: {e}").red());
            ExitCode::from(2)
        }
    }
}

/// CLI flags merged over any config-file values; a broken config file is
/// reported and ignored rather than blocking the search.
fn build_request(cli: &Cli) -> SearchRequest {
    let from_cli = SearchRequest {
        root: cli.folder.clone(),
        patterns: cli.pattern.clone(),
        search_text: cli.search.clone(),
        case_sensitive: cli.case_sensitive,
        inside_zips: cli.inside_zips,
        one_thread: cli.one_thread,
        solid_state: !cli.hdd,
        log_level: cli.log_level.clone(),
    };

    match SearchRequest::load_from(cli.config.as_deref()) {
        Ok(file_config) => file_config.merge_with_cli(from_cli),
        Err(e) => {
            eprintln!("{}", format!("warning: config file ignored: {e}").yellow());
            from_cli
        }
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(request: SearchRequest, cli: &Cli) -> SearchResult<()> {
    let cancel = CancelToken::new();
    let (results, scan) = spawn_search(request, cancel);

    let spinner = if cli.raw {
        None
    } else {
        let pb = ProgressBar::new_spinner();
        pb.enable_steady_tick(Duration::from_millis(120));
        Some(pb)
    };

    // results go to stdout; the spinner redraws on stderr around them
    let emit = |line: String| match &spinner {
        Some(pb) => pb.suspend(|| println!("{line}")),
        None => println!("{line}"),
    };

    let mut checked = 0usize;
    for result in results.iter() {
        checked += 1;
        if let Some(pb) = &spinner {
            pb.set_message(format!("{checked} files checked"));
        }

        match result.status {
            MatchStatus::Found => {
                let path = result.path.display().to_string();
                if cli.raw {
                    emit(path);
                } else {
                    emit(path.green().to_string());
                }
            }
            MatchStatus::Error if !cli.hide_errors => {
                emit(format!("{}: {}", result.path.display(), "ERROR".red()));
            }
            _ => {}
        }
    }

    let summary = scan
        .join()
        .map_err(|_| SearchError::thread_pool("search worker panicked"))??;

    if let Some(pb) = &spinner {
        pb.finish_and_clear();
    }

    if !cli.raw {
        let state = if summary.cancelled { "cancelled" } else { "done" };
        let elapsed = Duration::from_millis(summary.elapsed.as_millis() as u64);
        println!(
            "{}",
            format!(
                "{state}: {} files checked in {}",
                summary.files_scanned,
                humantime::format_duration(elapsed)
            )
            .dimmed()
        );
    }

    Ok(())
}
