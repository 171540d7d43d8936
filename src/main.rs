//! rpgledoc — extract documentation from `/** ... */` blocks in free-form RPG.
//!
//! Two modes:
//!
//! - **stdin mode**: `rpgledoc < calc.rpgle` prints one JSON report
//! - **file mode**: `rpgledoc -o docs/json src/*.rpgle` writes one report per file,
//!   or prints a JSON array of reports when `-o` is omitted

mod batch;
mod markers;
mod model;
mod parser;
mod reference;
mod report;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use report::{MarkerStyle, ReportOptions};
use std::collections::HashSet;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "rpgledoc",
    about = "Extract documentation comments from free-form RPG source files as JSON"
)]
struct Cli {
    /// Input files, directories or glob patterns. If omitted, reads from stdin.
    files: Vec<String>,

    /// Output directory; one <name>.json per input file
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Worker threads for scanning files (0 = one per CPU)
    #[arg(short = 'j', long, default_value_t = 0)]
    jobs: usize,

    /// How {@link} / {@code} markers in descriptions are exported
    #[arg(long, value_enum, default_value_t = MarkerStyle::Raw)]
    markers: MarkerStyle,

    /// Leave the raw source lines out of the report
    #[arg(long)]
    no_source: bool,

    /// Skip files that fail to read or scan instead of aborting
    #[arg(long)]
    keep_going: bool,

    /// File name used for reference identifiers in stdin mode
    #[arg(long, default_value = "stdin")]
    name: String,

    /// More log output (-v info, -vv debug, -vvv trace). RUST_LOG overrides.
    #[arg(short = 'v', long, action = ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short = 'q', long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    fn report_options(&self) -> ReportOptions {
        ReportOptions {
            markers: self.markers,
            include_source: !self.no_source,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    if cli.files.is_empty() {
        return stdin_mode(&cli);
    }

    file_mode(&cli)
}

/// Log to stderr; RUST_LOG takes precedence over -v / -q.
fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// stdin mode: scan stdin and print its report to stdout.
fn stdin_mode(cli: &Cli) -> Result<()> {
    let mut input = Vec::new();
    io::stdin()
        .read_to_end(&mut input)
        .context("failed to read stdin")?;

    let file = parser::parse_source(Path::new(&cli.name), &String::from_utf8_lossy(&input))
        .with_context(|| format!("failed to scan {}", cli.name))?;
    let report = report::build(&file, &cli.report_options())
        .with_context(|| format!("failed to interpret markers in {}", cli.name))?;
    print!("{}", report::to_json(&report)?);
    Ok(())
}

/// file mode: scan all inputs in parallel, then write or print the reports.
fn file_mode(cli: &Cli) -> Result<()> {
    let input_files = expand_globs(&cli.files)?;
    if input_files.is_empty() {
        anyhow::bail!("no input files");
    }
    info!(files = input_files.len(), "scanning");

    let mut files = Vec::with_capacity(input_files.len());
    for result in batch::scan_all(&input_files, cli.jobs)? {
        match result {
            Ok(file) => files.push(file),
            Err(e) if cli.keep_going => warn!("skipping: {:#}", anyhow::Error::new(e)),
            Err(e) => return Err(e.into()),
        }
    }

    for (id, sources) in reference::duplicates(&files) {
        warn!("reference {} is declared in more than one place: {}", id, sources.join(", "));
    }

    let opts = cli.report_options();
    let mut reports = Vec::with_capacity(files.len());
    for file in &files {
        let report = report::build(file, &opts)
            .with_context(|| format!("failed to interpret markers in {}", file.path.display()))?;
        reports.push(report);
    }

    let Some(output_dir) = cli.output.as_deref() else {
        print!("{}", report::to_json(&reports)?);
        return Ok(());
    };

    fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create output directory: {}", output_dir.display()))?;

    let mut written = HashSet::new();
    for report in &reports {
        if !written.insert(report.name) {
            warn!("{}: output {}.json already written, skipping", report.file, report.name);
            continue;
        }
        let out_path = output_dir.join(format!("{}.json", report.name));
        fs::write(&out_path, report::to_json(report)?)
            .with_context(|| format!("failed to write {}", out_path.display()))?;
        info!(path = %out_path.display(), entries = report.entries.len(), "written");
    }

    Ok(())
}

/// File extensions recognized as RPG source when scanning directories.
const SUPPORTED_EXTENSIONS: &[&str] = &["rpgle", "sqlrpgle", "rpgleinc", "rpginc"];

fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| SUPPORTED_EXTENSIONS.iter().any(|s| s.eq_ignore_ascii_case(ext)))
}

/// Expand glob patterns into a list of real file paths.
/// Also handles bare directory paths by scanning for supported file types.
fn expand_globs(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for pattern in patterns {
        let path = Path::new(pattern);
        if path.is_file() {
            files.push(path.to_path_buf());
            continue;
        }
        // Directories are scanned non-recursively
        if path.is_dir() {
            let entries = fs::read_dir(path)
                .with_context(|| format!("failed to read directory: {}", path.display()))?;
            for entry in entries.flatten() {
                let p = entry.path();
                if p.is_file() && is_supported(&p) {
                    files.push(p);
                }
            }
            continue;
        }
        let matches: Vec<_> = glob::glob(pattern)
            .with_context(|| format!("invalid glob pattern: {}", pattern))?
            .filter_map(|r| r.ok())
            .filter(|p| p.is_file())
            .collect();
        if matches.is_empty() {
            warn!("no files matched: {}", pattern);
        }
        files.extend(matches);
    }
    // Sort for deterministic output
    files.sort();
    files.dedup();
    Ok(files)
}
