use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{ArgAction, Args, Parser, Subcommand};
use glob::glob;
use pcapwalk_core::{
    CaptureError, CaptureSession, DecodeOptions, HeaderSummary, InputInfo, ListingFilter,
    summarize_capture,
};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (commit ",
    env!("PCAPWALK_BUILD_COMMIT"),
    ", built ",
    env!("PCAPWALK_BUILD_DATE"),
    ")"
);

#[derive(Parser, Debug)]
#[command(name = "pcapwalk")]
#[command(version, long_version = LONG_VERSION)]
#[command(
    about = "Streaming reader for classic PCAP capture files.",
    long_about = None,
    after_help = "Examples:\n  pcapwalk info capture.pcap\n  pcapwalk packets capture.pcap --stdout --limit 20\n  pcapwalk packets capture.pcap -o listing.json --max-len 100"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    decode: DecodeArgs,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Args, Debug)]
struct DecodeArgs {
    /// Reject zero snap length and records whose lengths contradict each other
    #[arg(long, global = true)]
    strict: bool,

    /// Treat nanosecond-resolution magic numbers as unknown
    #[arg(long, global = true)]
    no_nanosecond_magic: bool,
}

impl DecodeArgs {
    fn options(&self) -> DecodeOptions {
        DecodeOptions::default()
            .strict(self.strict)
            .nanosecond_magic(!self.no_nanosecond_magic)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the capture's global header as JSON.
    Info {
        /// Path to a .pcap file (a glob matching exactly one file is accepted)
        input: PathBuf,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },
    /// List packet metadata and capture totals as JSON.
    #[command(alias = "list")]
    Packets {
        /// Path to a .pcap file (a glob matching exactly one file is accepted)
        input: PathBuf,

        /// Output listing path (JSON)
        #[arg(short = 'o', long, required_unless_present = "stdout")]
        report: Option<PathBuf>,

        /// Write JSON listing to stdout
        #[arg(long, conflicts_with = "report")]
        stdout: bool,

        /// Keep at most N packet entries
        #[arg(long, value_name = "N")]
        limit: Option<usize>,

        /// Keep only packets whose payload is shorter than N bytes
        #[arg(long, value_name = "N")]
        max_len: Option<usize>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,

        /// Suppress non-error output
        #[arg(long)]
        quiet: bool,
    },
}

#[derive(Debug, Serialize)]
struct InfoReport {
    input: InputInfo,
    header: HeaderSummary,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let options = cli.decode.options();

    let result = match cli.command {
        Commands::Info { input, pretty } => cmd_info(&input, options, pretty),
        Commands::Packets {
            input,
            report,
            stdout,
            limit,
            max_len,
            pretty,
            quiet,
        } => cmd_packets(
            &input,
            options,
            report,
            stdout,
            ListingFilter { limit, max_len },
            pretty,
            quiet,
        ),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint: {}", hint);
            }
            ExitCode::from(2)
        }
    }
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with_writer(std::io::stderr)
        .init();
}

#[derive(Debug)]
struct CliError {
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(message: impl Into<String>, hint: Option<String>) -> Self {
        Self {
            message: message.into(),
            hint,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::new(format!("{:#}", err), None)
    }
}

impl From<CaptureError> for CliError {
    fn from(err: CaptureError) -> Self {
        let hint = match &err {
            CaptureError::FileNotFound { .. } => Some("check the path; expected a .pcap file"),
            CaptureError::HeaderInvalid { .. } => {
                Some("only classic pcap files are supported (not pcapng)")
            }
            CaptureError::VersionUnsupported { .. } => Some("only format version 2.4 is read"),
            CaptureError::RecordHeaderInvalid { .. } | CaptureError::PacketSizeMismatch { .. } => {
                Some("the capture appears truncated or corrupt")
            }
            _ => None,
        };
        CliError::new(err.to_string(), hint.map(str::to_string))
    }
}

fn open_session(input: &Path, options: DecodeOptions) -> Result<CaptureSession, CliError> {
    let resolved = resolve_input_path(input)?;
    validate_input_file(&resolved)?;
    let session = CaptureSession::with_options(&resolved, options)?;
    session.open();
    debug!(path = %resolved.display(), "input resolved");
    Ok(session)
}

fn cmd_info(input: &Path, options: DecodeOptions, pretty: bool) -> Result<(), CliError> {
    let session = open_session(input, options)?;
    let bytes = fs::metadata(session.path())
        .with_context(|| format!("Failed to read input file: {}", session.path().display()))?
        .len();
    let info = InfoReport {
        input: InputInfo {
            path: session.path().display().to_string(),
            bytes,
        },
        header: HeaderSummary::from_header(session.header()),
    };
    println!("{}", to_json(&info, pretty)?);
    Ok(())
}

fn cmd_packets(
    input: &Path,
    options: DecodeOptions,
    report: Option<PathBuf>,
    stdout: bool,
    filter: ListingFilter,
    pretty: bool,
    quiet: bool,
) -> Result<(), CliError> {
    let session = open_session(input, options)?;
    let report = if stdout {
        None
    } else {
        Some(report.ok_or_else(|| {
            CliError::new(
                "missing output path",
                Some("use -o/--report or --stdout".to_string()),
            )
        })?)
    };
    if let Some(report_path) = report.as_deref() {
        ensure_distinct_output(session.path(), report_path)?;
    }

    let listing = summarize_capture(&session, &filter)?;
    let json = to_json(&listing, pretty)?;

    let Some(report) = report else {
        println!("{}", json);
        return Ok(());
    };
    if let Some(parent) = report.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create output directory: {}", parent.display())
            })?;
        }
    }
    fs::write(&report, json)
        .with_context(|| format!("Failed to write listing: {}", report.display()))?;
    if !quiet {
        eprintln!(
            "OK: {} packets listed -> {}",
            listing.packets.len(),
            report.display()
        );
    }
    Ok(())
}

fn to_json<T: Serialize>(value: &T, pretty: bool) -> Result<String, CliError> {
    let json = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    json.context("JSON serialization failed").map_err(Into::into)
}

fn ensure_distinct_output(input: &Path, report: &Path) -> Result<(), CliError> {
    let input_abs = fs::canonicalize(input)
        .with_context(|| format!("Failed to resolve input path: {}", input.display()))?;
    let parent = match report.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let Ok(report_dir) = fs::canonicalize(parent) else {
        // Directory does not exist yet, so it cannot hold the input.
        return Ok(());
    };
    let Some(name) = report.file_name() else {
        return Err(CliError::new(
            format!("invalid output path: {}", report.display()),
            None,
        ));
    };
    if report_dir.join(name) == input_abs {
        return Err(CliError::new(
            format!("output path must differ from input: {}", report.display()),
            Some("choose a different output path".to_string()),
        ));
    }
    Ok(())
}

fn validate_input_file(input: &Path) -> Result<(), CliError> {
    if !input.exists() {
        return Err(CliError::new(
            format!("input file not found: {}", input.display()),
            Some("use a .pcap file".to_string()),
        ));
    }
    let ext = input
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    if ext != "pcap" {
        return Err(CliError::new(
            format!("unsupported input format '{}'", input.display()),
            Some("expected a .pcap file".to_string()),
        ));
    }
    Ok(())
}

fn resolve_input_path(input: &Path) -> Result<PathBuf, CliError> {
    let pattern = input.to_string_lossy();
    if !is_glob_pattern(&pattern) {
        return Ok(input.to_path_buf());
    }

    let mut matches = Vec::new();
    let paths = glob(&pattern).map_err(|err| {
        CliError::new(
            format!("invalid input pattern '{}'", pattern),
            Some(format!("pattern error: {}", err.msg)),
        )
    })?;
    for entry in paths {
        let path = entry.map_err(|err| {
            CliError::new(
                format!("invalid input pattern '{}'", pattern),
                Some(format!("pattern error: {}", err)),
            )
        })?;
        if path.is_file() {
            matches.push(path);
        }
    }

    match matches.len() {
        0 => Err(CliError::new(
            format!("no files match pattern '{}'", pattern),
            Some("check the path or quote the pattern; expected .pcap".to_string()),
        )),
        1 => Ok(matches.remove(0)),
        count => {
            let mut message = format!(
                "multiple files match pattern '{}' ({} matches); matches: ",
                pattern, count
            );
            message.push_str(
                &matches
                    .iter()
                    .take(3)
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
            );
            if count > 3 {
                message.push_str(", ...");
            }
            Err(CliError::new(
                message,
                Some("pass a single capture file, or run once per file".to_string()),
            ))
        }
    }
}

fn is_glob_pattern(input: &str) -> bool {
    input.contains('*') || input.contains('?') || input.contains('[')
}
