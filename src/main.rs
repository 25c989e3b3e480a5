use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use rayon::prelude::*;
use serde::Serialize;

use mdoutline::anchors::TocEntry;
use mdoutline::config::{Config, Overrides};
use mdoutline::read::{build_globset, collect_markdown_files, read_document};
use mdoutline::stats::{document_stats, DocumentStats};
use mdoutline::toc::{self, TocFormat};
use mdoutline::{extract_outline_with, toc_entries, OutlineError};

/// Fence-aware Markdown outlines: headings, anchors, reading time.
#[derive(Parser)]
#[command(name = "mdoutline", version, about)]
struct Cli {
    /// Files or directories. Reads stdin when empty.
    paths: Vec<PathBuf>,

    /// Output format.
    #[arg(short, long, value_enum)]
    format: Option<TocFormat>,

    /// Deepest heading level to include (1-4).
    #[arg(short = 'd', long, value_parser = clap::value_parser!(u8).range(1..=4))]
    max_depth: Option<u8>,

    /// Print raw slug ids instead of unique anchors.
    #[arg(long)]
    raw_ids: bool,

    /// Append word count, code blocks and reading time.
    #[arg(long)]
    stats: bool,

    /// Reading speed used for the time estimate.
    #[arg(long)]
    words_per_minute: Option<u32>,

    /// Include pattern for directory walks (repeatable). Default: *.md, *.mdx
    #[arg(short, long = "glob")]
    globs: Vec<String>,

    /// TOML config file. Falls back to $MDOUTLINE_CONFIG.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Run as MCP server (JSON-RPC on stdio).
    #[arg(long)]
    mcp: bool,

    /// Debug logging on stderr.
    #[arg(short, long)]
    verbose: bool,

    /// Print shell completions.
    #[arg(long, value_name = "SHELL")]
    completions: Option<clap_complete::Shell>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr only (stdout is for results and the MCP protocol)
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    if let Some(shell) = cli.completions {
        clap_complete::generate(shell, &mut Cli::command(), "mdoutline", &mut io::stdout());
        return ExitCode::SUCCESS;
    }

    let config = match Config::load(cli.config.as_deref()) {
        Ok(c) => c.apply(Overrides {
            max_depth: cli.max_depth,
            words_per_minute: cli.words_per_minute,
            format: cli.format,
            raw_ids: cli.raw_ids,
            globs: cli.globs.clone(),
        }),
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    if cli.mcp {
        return match mdoutline::mcp::run(&config) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("mcp server error: {e}");
                ExitCode::FAILURE
            }
        };
    }

    let result = if cli.paths.is_empty() {
        run_stdin(&config, cli.stats)
    } else {
        run_paths(&cli.paths, &config, cli.stats)
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// One processed document.
#[derive(Serialize)]
struct Report {
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<PathBuf>,
    headings: Vec<TocEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stats: Option<DocumentStats>,
    #[serde(skip)]
    doc_stats: DocumentStats,
}

fn build_report(path: Option<&Path>, markdown: &str, config: &Config, with_stats: bool) -> Report {
    let opts = config.outline_options();
    let headings = extract_outline_with(markdown, &opts);
    let doc_stats = document_stats(markdown, &opts, config.words_per_minute);
    Report {
        path: path.map(Path::to_path_buf),
        headings: toc_entries(&headings, config.raw_ids),
        stats: with_stats.then_some(doc_stats),
        doc_stats,
    }
}

/// Human-readable block for one document; json is handled by the caller.
fn render_report(report: &Report, format: TocFormat) -> String {
    let body = toc::render(&report.headings, format);
    let mut out = match &report.path {
        Some(p) => format!("{}\n\n{body}", toc::document_header(p, &report.doc_stats)),
        None => body,
    };
    if let Some(stats) = &report.stats {
        if !out.is_empty() {
            out.push_str("\n\n");
        }
        out.push_str(&toc::stats_footer(stats));
    }
    out
}

fn run_stdin(config: &Config, with_stats: bool) -> Result<bool, OutlineError> {
    let mut markdown = String::new();
    io::stdin()
        .read_to_string(&mut markdown)
        .map_err(|e| OutlineError::Io {
            path: PathBuf::from("<stdin>"),
            source: e,
        })?;

    let report = build_report(None, &markdown, config, with_stats);
    if config.format == TocFormat::Json {
        let json = match &report.stats {
            Some(_) => serde_json::to_string_pretty(&report),
            None => serde_json::to_string_pretty(&report.headings),
        };
        println!("{}", json.unwrap_or_default());
    } else {
        let out = render_report(&report, config.format);
        if !out.is_empty() {
            println!("{out}");
        }
    }
    Ok(true)
}

/// Returns `Ok(false)` when some files failed; their errors are already on stderr.
fn run_paths(paths: &[PathBuf], config: &Config, with_stats: bool) -> Result<bool, OutlineError> {
    let globs = build_globset(&config.globs)?;
    let files = collect_markdown_files(paths, &globs)?;
    log::debug!("processing {} files", files.len());

    let results: Vec<(PathBuf, Result<Report, OutlineError>)> = files
        .into_par_iter()
        .map(|path| {
            let report = read_document(&path)
                .map(|md| build_report(Some(&path), &md, config, with_stats));
            (path, report)
        })
        .collect();

    let mut ok = true;
    let mut reports = Vec::with_capacity(results.len());
    for (path, result) in results {
        match result {
            Ok(r) => reports.push(r),
            Err(e) => {
                log::debug!("failed on {}", path.display());
                eprintln!("error: {e}");
                ok = false;
            }
        }
    }

    if config.format == TocFormat::Json {
        println!(
            "{}",
            serde_json::to_string_pretty(&reports).unwrap_or_default()
        );
    } else {
        let blocks: Vec<String> = reports
            .iter()
            .map(|r| render_report(r, config.format))
            .collect();
        if !blocks.is_empty() {
            println!("{}", blocks.join("\n\n"));
        }
    }

    Ok(ok)
}
