use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use jed_validator::{DEFAULT_MAX_FILE_SIZE, FsSourceConfig, output};

use crate::logging::init_tracing;
use crate::server::{DEFAULT_MAX_BODY_BYTES, ServerConfig, serve};

#[derive(Parser, Debug)]
#[command(name = "jed", version, about = "Pre-upload checks for JEDEC fuse-map files")]
pub struct Cli {
    /// Verbosity level (-v for INFO, -vv for DEBUG)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check every fuse map under the given paths
    Validate(ValidateArgs),
    /// Check a single file, optionally under the name it will be uploaded as
    Check(CheckArgs),
    /// Run the HTTP check service
    Serve(ServeArgs),
}

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Files or directories to check
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Glob patterns to skip (repeatable)
    #[arg(long)]
    pub exclude: Vec<String>,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Largest file to read, in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_FILE_SIZE)]
    pub max_file_size: u64,

    /// Follow symbolic links while walking directories
    #[arg(long)]
    pub follow_links: bool,
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// File to read
    pub file: PathBuf,

    /// Name to check instead of the file's own name
    #[arg(long)]
    pub name: Option<String>,

    /// Largest file to read, in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_FILE_SIZE)]
    pub max_file_size: u64,
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(long, default_value_t = 8080)]
    pub port: u16,

    /// Largest request body, in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_BODY_BYTES)]
    pub max_body_bytes: usize,
}

/// Parse arguments and run the selected command.
///
/// # Errors
///
/// Returns an error for bad paths, unreadable files, or a server that
/// cannot bind. Rejected files are not errors; they give
/// `ExitCode::FAILURE`.
pub async fn run() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Validate(args) => run_validate(args, &mut std::io::stdout().lock()),
        Commands::Check(args) => run_check(&args, &mut std::io::stdout().lock()),
        Commands::Serve(args) => {
            let mut config = ServerConfig::default();
            config.host = args.host;
            config.port = args.port;
            config.max_body_bytes = args.max_body_bytes;
            config.verbose = cli.verbose;
            serve(&config).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// `jed validate`.
///
/// # Errors
///
/// Returns an error if no usable path was given or the report cannot be written.
pub fn run_validate(args: ValidateArgs, out: &mut dyn Write) -> anyhow::Result<ExitCode> {
    let mut config = FsSourceConfig::for_paths(args.paths);
    config.exclude = args.exclude;
    config.max_file_size = args.max_file_size;
    config.follow_links = args.follow_links;

    let report = jed_validator::validate_fs(&config)?;
    if args.json {
        output::write_json(&report, out)?;
    } else {
        output::write_human(&report, out)?;
    }
    Ok(exit_code(report.ok))
}

/// `jed check`.
///
/// # Errors
///
/// Returns an error if the file cannot be read as text or has no usable name.
pub fn run_check(args: &CheckArgs, out: &mut dyn Write) -> anyhow::Result<ExitCode> {
    let name = match &args.name {
        Some(name) => name.as_str(),
        None => jed_validator::candidate_name(&args.file)
            .map_err(|e| anyhow::anyhow!(e.message))?,
    };

    let verdict = jed_validator::validate_file_as(&args.file, name, args.max_file_size)
        .map_err(|e| anyhow::anyhow!(e.format_human_readable()))
        .with_context(|| format!("could not check {}", args.file.display()))?;

    let line = verdict.status_line();
    if !verdict.is_accepted() {
        writeln!(out, "{} {}", "\u{2717}".red(), line.red())?;
        return Ok(ExitCode::FAILURE);
    }
    writeln!(out, "{} {}", "\u{2713}".green(), line)?;
    Ok(ExitCode::SUCCESS)
}

fn exit_code(ok: bool) -> ExitCode {
    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
