//! addcp - Dockerfile ADD/COPY
//!
//! Copies (and with `--unpack`, extracts) sources into a destination exactly
//! the way an image build places them, powered by addcopy.

use addcopy::{
    ActionKind, CancellationToken, CopyOptions, CopyReport, CopyStats, DEFAULT_INTERRUPT_LIMIT,
    Error as AddcopyError, ErrorCode, Interrupt, InterruptState, SourceAction, copy, create_spinner,
    parse_chown,
};
use clap::{ArgAction, Parser, ValueEnum};
use indicatif::ProgressBar;
use serde_json::{Value, json};
use std::env;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing_subscriber::{EnvFilter, fmt};

/// addcp - Dockerfile ADD/COPY semantics
///
/// Place SOURCE(s) under DEST the way `COPY`/`ADD` do: a trailing `/`,
/// several sources or a directory source make DEST a directory, and a
/// symlinked DEST is resolved inside --root.
///
/// Usage:
///   addcp SOURCE DEST
///   addcp SOURCE... DIRECTORY/
///   addcp --unpack ARCHIVE DIRECTORY
#[derive(Parser, Debug)]
#[command(name = "addcp", version, about, long_about = None)]
struct Args {
    /// Source path(s) followed by the destination
    #[arg(required = true, value_name = "SOURCE... DEST")]
    paths: Vec<PathBuf>,

    /// Extract recognized tar archives (plain, gzip, bzip2, xz) instead of copying them
    #[arg(long)]
    unpack: bool,

    /// Own everything written as USER[:GROUP] (names or numeric ids)
    #[arg(long, value_name = "USER[:GROUP]")]
    chown: Option<String>,

    /// Directory treated as `/` when following a symlinked destination
    /// (default: current directory)
    #[arg(long, value_name = "DIR")]
    root: Option<PathBuf>,

    /// Archive tool used for extraction
    #[arg(long = "tar", value_name = "PROGRAM", default_value = "tar")]
    tar_program: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value = "human")]
    output: OutputMode,

    /// Disable the spinner and the archive listing
    #[arg(short = 'q', long)]
    quiet: bool,

    /// Verbose output (-v for per-source lines and info logs, -vv for debug logs)
    #[arg(short = 'v', long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
enum OutputMode {
    Human,
    Json,
}

type CliResult<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
enum CliError {
    #[error("Missing destination operand after '{operand}'")]
    MissingDestinationOperand { operand: PathBuf },

    #[error("Invalid --chown '{spec}': {source}")]
    Chown { spec: String, source: AddcopyError },

    #[error("Failed to determine the current directory: {source}")]
    CurrentDir { source: io::Error },

    #[error("{0}")]
    Copy(#[from] AddcopyError),

    #[error("Failed to serialize JSON output: {source}")]
    JsonSerialize { source: serde_json::Error },
}

impl CliError {
    fn code(&self) -> ErrorCode {
        match self {
            Self::MissingDestinationOperand { .. } => ErrorCode::InvalidInput,
            Self::Chown { source, .. } | Self::Copy(source) => source.code(),
            Self::CurrentDir { source } => io_error_code(source),
            Self::JsonSerialize { .. } => ErrorCode::IoError,
        }
    }
}

fn io_error_code(error: &io::Error) -> ErrorCode {
    if error.kind() == io::ErrorKind::PermissionDenied {
        return ErrorCode::PermissionDenied;
    }
    ErrorCode::IoError
}

fn exit_code_for(code: ErrorCode) -> i32 {
    match code {
        ErrorCode::InvalidInput => 2,
        ErrorCode::Cancelled => 130,
        _ => 1,
    }
}

fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);
    tracing::debug!("Parsed CLI arguments: {:?}", args);

    if let Err(error) = run(&args) {
        let code = error.code();
        if args.output == OutputMode::Json {
            // stdout still gets a document so callers can always parse it
            let _ = print_json_value(&json!({
                "schema_version": "1.0",
                "status": "failed",
                "error_code": code.as_str(),
                "error_message": error.to_string(),
            }));
        }
        if code == ErrorCode::Cancelled {
            eprintln!("Cancelled. Entries written before the interrupt are kept.");
        } else {
            eprintln!("error[{}]: {}", code, error);
        }
        std::process::exit(exit_code_for(code));
    }
}

fn init_tracing(verbose: u8) {
    let log_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn run(args: &Args) -> CliResult<()> {
    if args.paths.len() < 2 {
        return Err(CliError::MissingDestinationOperand {
            operand: args.paths.first().cloned().unwrap_or_default(),
        });
    }

    let mut options = build_options(args)?;

    let token = CancellationToken::new();
    {
        let interrupts = InterruptState::new(token.clone());
        let installed = ctrlc::set_handler(move || match interrupts.record() {
            Interrupt::ForceExit { .. } => {
                eprintln!("\nForce quit.");
                std::process::exit(130);
            }
            Interrupt::Cancel { count } => {
                eprintln!(
                    "\nCancelling... ({count}/{DEFAULT_INTERRUPT_LIMIT}) press Ctrl+C again to abort immediately."
                );
            }
        });
        if let Err(e) = installed {
            tracing::warn!("Ctrl+C handler not installed, interrupts will not cancel: {e}");
        }
    }
    options = options.with_cancel_token(token);

    let pb: Option<ProgressBar> = if args.output == OutputMode::Human && !args.quiet {
        let sources = args.paths.len() - 1;
        let message = if sources == 1 {
            format!("Copying {}...", args.paths[0].display())
        } else {
            format!("Copying {} items...", sources)
        };
        Some(create_spinner(message))
    } else {
        None
    };

    let result = copy(&args.paths, &options);

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    let report = result?;
    match args.output {
        OutputMode::Human => print_report(&report, args.verbose > 0),
        OutputMode::Json => print_json_value(&report_to_json(&report))?,
    }
    Ok(())
}

fn build_options(args: &Args) -> CliResult<CopyOptions> {
    let root = match &args.root {
        Some(root) if root.is_absolute() => root.clone(),
        Some(root) => current_dir()?.join(root),
        None => current_dir()?,
    };

    let mut options = CopyOptions::default()
        .with_root(root)
        .with_tar_program(args.tar_program.clone());

    if args.unpack {
        options = options.with_unpack();
    }

    // Ownership is resolved before anything is written
    if let Some(spec) = &args.chown {
        let owner = parse_chown(spec).map_err(|source| CliError::Chown {
            spec: spec.clone(),
            source,
        })?;
        options = options.with_chown(owner);
    }

    // The archive listing goes to stdout, which belongs to the JSON document
    if args.quiet || args.output == OutputMode::Json {
        options = options.without_verbose_extract();
    }

    if !args.quiet && args.output == OutputMode::Human {
        options = options.with_warn_handler(|msg| {
            eprintln!("warning: {}", msg);
        });
    }

    Ok(options)
}

fn current_dir() -> CliResult<PathBuf> {
    env::current_dir().map_err(|source| CliError::CurrentDir { source })
}

fn print_report(report: &CopyReport, verbose: bool) {
    let totals = report.totals();
    let extracted = report.archives_extracted();

    if verbose {
        for action in &report.actions {
            println!("{}", describe_action(action));
        }
        println!("Completed in {:?}", report.duration);
        println!("  Files copied:   {}", totals.files_copied);
        println!("  Symlinks:       {}", totals.symlinks_copied);
        println!("  Hard links:     {}", totals.hardlinks_created);
        println!("  Special files:  {}", totals.special_files_created);
        println!("  Directories:    {}", totals.dirs_created);
        println!("  Archives:       {}", extracted);
        println!("  Total size:     {}", format_bytes(totals.bytes_copied));
        if totals.xattr_errors_ignored > 0 {
            println!("  Xattr errors:   {} (ignored)", totals.xattr_errors_ignored);
        }
        return;
    }

    let mut parts = vec![];
    if totals.files_copied > 0 {
        parts.push(format!("{} files", totals.files_copied));
    }
    if totals.symlinks_copied > 0 {
        parts.push(format!("{} symlinks", totals.symlinks_copied));
    }
    if totals.dirs_created > 0 {
        parts.push(format!("{} dirs", totals.dirs_created));
    }

    let copied = if parts.is_empty() {
        None
    } else {
        Some(format!(
            "Copied {} ({})",
            parts.join(", "),
            format_bytes(totals.bytes_copied)
        ))
    };
    let unpacked = (extracted > 0).then(|| {
        if extracted == 1 {
            "extracted 1 archive".to_owned()
        } else {
            format!("extracted {} archives", extracted)
        }
    });

    match (copied, unpacked) {
        (Some(copied), Some(unpacked)) => println!("{copied}, {unpacked}"),
        (Some(copied), None) => println!("{copied}"),
        (None, Some(unpacked)) => println!("Done, {unpacked}"),
        (None, None) => println!("Done"),
    }
}

fn describe_action(action: &SourceAction) -> String {
    match &action.kind {
        ActionKind::Copied { stats } => format!(
            "copied {} -> {} ({})",
            action.source.display(),
            action.destination.display(),
            format_bytes(stats.bytes_copied)
        ),
        ActionKind::Extracted { archive_type } => format!(
            "extracted {} ({}) -> {}",
            action.source.display(),
            archive_type,
            action.destination.display()
        ),
    }
}

fn report_to_json(report: &CopyReport) -> Value {
    let actions: Vec<Value> = report.actions.iter().map(action_to_json).collect();
    json!({
        "schema_version": "1.0",
        "status": "ok",
        "duration_ms": duration_ms(report),
        "archives_extracted": report.archives_extracted(),
        "totals": stats_to_json(&report.totals()),
        "actions": actions,
    })
}

fn action_to_json(action: &SourceAction) -> Value {
    let mut obj = serde_json::Map::new();
    obj.insert(
        "source".to_owned(),
        Value::String(display_path(&action.source)),
    );
    obj.insert(
        "destination".to_owned(),
        Value::String(display_path(&action.destination)),
    );

    match &action.kind {
        ActionKind::Copied { stats } => {
            obj.insert("action".to_owned(), Value::String("copied".to_owned()));
            obj.insert("stats".to_owned(), stats_to_json(stats));
        }
        ActionKind::Extracted { archive_type } => {
            obj.insert("action".to_owned(), Value::String("extracted".to_owned()));
            obj.insert(
                "archive_type".to_owned(),
                Value::String(archive_type.as_str().to_owned()),
            );
        }
    }

    Value::Object(obj)
}

fn stats_to_json(stats: &CopyStats) -> Value {
    json!({
        "files_copied": stats.files_copied,
        "symlinks_copied": stats.symlinks_copied,
        "hardlinks_created": stats.hardlinks_created,
        "special_files_created": stats.special_files_created,
        "dirs_created": stats.dirs_created,
        "bytes_copied": stats.bytes_copied,
        "xattr_errors_ignored": stats.xattr_errors_ignored,
    })
}

fn duration_ms(report: &CopyReport) -> u64 {
    u64::try_from(report.duration.as_millis()).unwrap_or(u64::MAX)
}

fn print_json_value(value: &Value) -> CliResult<()> {
    let serialized =
        serde_json::to_string(value).map_err(|source| CliError::JsonSerialize { source })?;
    println!("{serialized}");
    Ok(())
}

fn display_path(path: &Path) -> String {
    path.display().to_string()
}

fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
