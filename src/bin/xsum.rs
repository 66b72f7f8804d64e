//! # xsum CLI - Checksums for files and directories
//!
//! Command-line front end for the xsum library.
//!
//! ## Usage
//! ```bash
//! # Hash files into sidecar checksum files (foo.bin -> foo.bin.sha256)
//! xsum -s *.bin
//!
//! # Hash a directory tree into one aggregate file, paths relative to it
//! xsum -d -o sums.sha256 -z data data
//!
//! # Verify
//! xsum -c sums.sha256
//!
//! # Different algorithm, byte range only
//! xsum -A blake2b --start 0 --stop 4096 big.iso
//! ```
//!
//! Exit code is 1 when any item failed or mismatched, 0 otherwise.

use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;
use xsum::context::{create_context, hash_suffix, ALGORITHM_NAMES};
use xsum::resolver::{GlobMode, PathType};
use xsum::xsum::{OutputMode, XsumBuilder};
use xsum::Result;

/// Generate or check checksums for files and directories
#[derive(Parser)]
#[command(name = "xsum")]
#[command(version)]
#[command(about = "Generate or check checksums for files and directories")]
#[command(arg_required_else_help = true)]
struct Cli {
    /// Files, directories or glob patterns
    files: Vec<String>,

    /// Hash algorithm (see --list)
    #[arg(short = 'A', long, default_value = "sha256")]
    algo: String,

    /// List available algorithms and exit
    #[arg(long)]
    list: bool,

    /// Search data files automatically under FILES (default: .)
    #[arg(short, long)]
    auto: bool,

    /// Read checksum records from FILES and check them
    #[arg(short, long)]
    check: bool,

    /// Update mtime of checksum files to the newest referenced data file
    #[arg(short = 'y', long)]
    sync: bool,

    /// Glob mode: 0 = literal, 1 = `*` and `?` only, 2 = full globbing
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(0..=2))]
    glob: u8,

    /// File type filter: a = all, d = directories, f = files
    #[arg(short = 't', long = "type", default_value = "a", value_parser = ["a", "d", "f"])]
    file_type: String,

    /// Use paths relative to each file's own directory in records
    #[arg(short, long, conflicts_with = "root")]
    inplace: bool,

    /// Record paths relative to this root directory
    #[arg(short = 'z', long)]
    root: Option<PathBuf>,

    /// Write every record into this one aggregate file
    #[arg(short = 'o', long, conflicts_with_all = ["sep", "null"])]
    agg: Option<PathBuf>,

    /// Write one sidecar checksum file per source path
    #[arg(short, long, conflicts_with = "null")]
    sep: bool,

    /// Do not write checksum files (default)
    #[arg(short, long)]
    null: bool,

    /// Start offset of the hashed byte range
    #[arg(long)]
    start: Option<u64>,

    /// Stop offset of the hashed byte range
    #[arg(long)]
    stop: Option<u64>,

    /// Allow hashing directories (XOR of each contained file's checksum)
    #[arg(short, long)]
    dir: bool,

    /// Sidecar suffix (default: derived from the algorithm name)
    #[arg(long)]
    suffix: Option<String>,

    /// Do not echo hash lines and check results on stdout
    #[arg(long)]
    no_stdout: bool,

    /// Do not echo per-item errors on stderr
    #[arg(long)]
    no_stderr: bool,

    /// Do not draw per-file progress bars
    #[arg(long)]
    no_progress: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    // Set up logging
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .init();
    }

    // Disable colors if needed
    if std::env::var("NO_COLOR").is_ok() {
        colored::control::set_override(false);
    }

    match run(cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("{}: {}", "Error".red().bold(), e);
            std::process::exit(1);
        }
    }
}

/// Main command runner; returns whether every item passed
fn run(cli: Cli) -> Result<bool> {
    if cli.list {
        for name in ALGORITHM_NAMES {
            println!("{name}");
        }
        return Ok(true);
    }

    let ctx = create_context(&cli.algo)?;

    let glob_mode = match cli.glob {
        0 => GlobMode::Literal,
        2 => GlobMode::Extended,
        _ => GlobMode::Wildcard,
    };
    let file_type = match cli.file_type.as_str() {
        "d" => PathType::Dir,
        "f" => PathType::File,
        _ => PathType::Any,
    };
    let output = if let Some(path) = cli.agg {
        OutputMode::Aggregate(path)
    } else if cli.sep {
        OutputMode::Separate
    } else {
        OutputMode::Null
    };
    let suffix = cli.suffix.unwrap_or_else(|| hash_suffix(&cli.algo));

    let mut files = cli.files;
    if files.is_empty() && cli.auto {
        files.push(".".to_string());
    }

    let mut builder = XsumBuilder::new()
        .glob_mode(glob_mode)
        .file_type(file_type)
        .auto(cli.auto)
        .inplace(cli.inplace)
        .sync(cli.sync)
        .suffix(suffix)
        .output(output)
        .range(cli.start, cli.stop)
        .dir_ok(cli.dir)
        .progress(!cli.no_progress)
        .echo_stdout(!cli.no_stdout)
        .echo_stderr(!cli.no_stderr);
    if let Some(root) = cli.root {
        builder = builder.root(root);
    }

    let mut xsum = builder.build(ctx)?;
    let report = xsum.run(&files, cli.check)?;
    xsum.finish()?;
    Ok(report.ok())
}
