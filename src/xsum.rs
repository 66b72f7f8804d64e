//! Batch generate/check orchestration
//!
//! [`Xsum`] ties the path resolver, the hashing engine and the record codec
//! together into the two batch workflows:
//!
//! - **generate**: hash every resolved data path, hand each record to the
//!   configured [`Output`] sink and echo it on stdout
//! - **check**: read every resolved checksum file and verify each record
//!   against the file system
//!
//! Failures are isolated per item. A bad data file never aborts a generate
//! batch, and inside a check batch one checksum file's outcome never affects
//! the next. The single partial exception is a malformed record: there is no
//! way to resynchronize on the line grammar, so a parse failure abandons the
//! remainder of *that one checksum file* and the batch moves on.
//!
//! Instances are configured through [`XsumBuilder`] and are single-use per
//! invocation; nothing is shared across batches.
//!
//! ## Example
//!
//! ```rust,no_run
//! use xsum::context::create_context;
//! use xsum::xsum::{OutputMode, XsumBuilder};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let ctx = create_context("sha256")?;
//! let mut xsum = XsumBuilder::new()
//!     .output(OutputMode::Aggregate("sums.sha256".into()))
//!     .sync(true)
//!     .build(ctx)?;
//! let report = xsum.generate(&["data/*.bin".to_string()])?;
//! println!("{} hashed, {} errors", report.successes(), report.errors());
//! xsum.finish()?;
//! # Ok(())
//! # }
//! ```

use crate::codec::{check_hash_line, generate_hash_line, HashFileReader};
use crate::context::HashContext;
use crate::error::{Result, XsumError};
use crate::hasher::Hasher;
use crate::output::Output;
use crate::resolver::{self, GlobMode, PathType, ResolveOptions};
use colored::Colorize;
use filetime::FileTime;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Which sink a batch writes generated records to
#[derive(Debug, Clone, Default)]
pub enum OutputMode {
    /// Single file accumulating every record
    Aggregate(PathBuf),
    /// One sidecar file per source path
    Separate,
    /// No file output
    #[default]
    Null,
}

/// Outcome of one item in a batch
#[derive(Debug)]
pub enum Outcome {
    /// Item processed and (for check) digest matched
    Success(PathBuf),
    /// Digest mismatch for this data path
    Mismatch(PathBuf),
    /// Item failed; the message identifies the cause
    Error {
        /// The item the failure belongs to
        path: PathBuf,
        /// Rendered error
        message: String,
    },
}

/// Collected outcomes of one generate or check batch
#[derive(Debug, Default)]
pub struct Report {
    /// Per-item outcomes in processing order
    pub outcomes: Vec<Outcome>,
}

impl Report {
    /// Number of successful items
    pub fn successes(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, Outcome::Success(_)))
            .count()
    }

    /// Number of digest mismatches
    pub fn mismatches(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, Outcome::Mismatch(_)))
            .count()
    }

    /// Number of per-item errors
    pub fn errors(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, Outcome::Error { .. }))
            .count()
    }

    /// True when every item succeeded
    pub fn ok(&self) -> bool {
        self.mismatches() == 0 && self.errors() == 0
    }
}

/// Builder for [`Xsum`]
///
/// Mirrors the command-line surface: glob behavior, path-field format
/// (absolute, relative to a root, or relative to each file's own directory),
/// output sink, byte range, directory hashing and echo control.
#[derive(Debug, Clone)]
pub struct XsumBuilder {
    glob_mode: GlobMode,
    file_type: PathType,
    auto: bool,
    inplace: bool,
    root: Option<PathBuf>,
    sync: bool,
    suffix: String,
    output_mode: OutputMode,
    start: Option<u64>,
    stop: Option<u64>,
    dir_ok: bool,
    chunk_size: i64,
    progress: bool,
    echo_stdout: bool,
    echo_stderr: bool,
}

impl Default for XsumBuilder {
    fn default() -> Self {
        Self {
            glob_mode: GlobMode::Wildcard,
            file_type: PathType::Any,
            auto: false,
            inplace: false,
            root: None,
            sync: false,
            suffix: ".sha256".to_string(),
            output_mode: OutputMode::Null,
            start: None,
            stop: None,
            dir_ok: false,
            chunk_size: 0,
            progress: false,
            echo_stdout: true,
            echo_stderr: true,
        }
    }
}

impl XsumBuilder {
    /// Create a builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the glob mode used to resolve patterns
    pub fn glob_mode(mut self, mode: GlobMode) -> Self {
        self.glob_mode = mode;
        self
    }

    /// Set the type filter applied to resolved paths
    pub fn file_type(mut self, file_type: PathType) -> Self {
        self.file_type = file_type;
        self
    }

    /// Treat patterns as roots and discover data files automatically,
    /// skipping existing checksum files
    pub fn auto(mut self, auto: bool) -> Self {
        self.auto = auto;
        self
    }

    /// Write each record's path relative to its own directory
    pub fn inplace(mut self, inplace: bool) -> Self {
        self.inplace = inplace;
        self
    }

    /// Write record paths relative to this root directory
    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Sync checksum-file mtimes to the newest referenced data file
    pub fn sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }

    /// Sidecar suffix appended to source paths in separate-output mode
    pub fn suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    /// Select the output sink
    pub fn output(mut self, mode: OutputMode) -> Self {
        self.output_mode = mode;
        self
    }

    /// Hash only the byte range `[start, stop)` of each file
    pub fn range(mut self, start: Option<u64>, stop: Option<u64>) -> Self {
        self.start = start;
        self.stop = stop;
        self
    }

    /// Allow hashing directories (XOR aggregation over their contents)
    pub fn dir_ok(mut self, dir_ok: bool) -> Self {
        self.dir_ok = dir_ok;
        self
    }

    /// Read chunk size: `0` = 1 MiB default, negative = whole range at once
    pub fn chunk_size(mut self, chunk_size: i64) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Show a per-file progress bar on stderr
    pub fn progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// Echo hash lines and SUCCESS/FAILURE states on stdout
    pub fn echo_stdout(mut self, echo: bool) -> Self {
        self.echo_stdout = echo;
        self
    }

    /// Echo per-item errors on stderr
    pub fn echo_stderr(mut self, echo: bool) -> Self {
        self.echo_stderr = echo;
        self
    }

    /// Build an [`Xsum`] around a hash context prototype
    ///
    /// # Errors
    ///
    /// - [`XsumError::Internal`] if both `inplace` and `root` are set
    /// - [`XsumError::Io`] if the aggregate output file cannot be created
    pub fn build(self, ctx: Box<dyn HashContext>) -> Result<Xsum> {
        if self.inplace && self.root.is_some() {
            return Err(XsumError::internal(
                "inplace and root are mutually exclusive",
            ));
        }
        let output = match &self.output_mode {
            OutputMode::Aggregate(path) => Output::aggregate(path, self.sync)?,
            OutputMode::Separate => Output::separate(self.sync),
            OutputMode::Null => Output::null(),
        };
        let hasher = Hasher::new(ctx)
            .chunk_size(self.chunk_size)
            .progress(self.progress);
        Ok(Xsum {
            hasher,
            output,
            glob_mode: self.glob_mode,
            file_type: self.file_type,
            auto: self.auto,
            inplace: self.inplace,
            root: self.root,
            sync: self.sync,
            suffix: self.suffix,
            echo_stdout: self.echo_stdout,
            echo_stderr: self.echo_stderr,
            start: self.start,
            stop: self.stop,
            dir_ok: self.dir_ok,
        })
    }
}

/// One-shot batch runner for checksum generation and verification
pub struct Xsum {
    hasher: Hasher,
    output: Output,
    glob_mode: GlobMode,
    file_type: PathType,
    auto: bool,
    inplace: bool,
    root: Option<PathBuf>,
    sync: bool,
    suffix: String,
    echo_stdout: bool,
    echo_stderr: bool,
    start: Option<u64>,
    stop: Option<u64>,
    dir_ok: bool,
}

impl std::fmt::Debug for Xsum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Xsum")
            .field("glob_mode", &self.glob_mode)
            .field("file_type", &self.file_type)
            .field("auto", &self.auto)
            .field("inplace", &self.inplace)
            .field("root", &self.root)
            .field("sync", &self.sync)
            .field("suffix", &self.suffix)
            .field("echo_stdout", &self.echo_stdout)
            .field("echo_stderr", &self.echo_stderr)
            .field("start", &self.start)
            .field("stop", &self.stop)
            .field("dir_ok", &self.dir_ok)
            .finish_non_exhaustive()
    }
}

impl Xsum {
    /// Builder entry point
    pub fn builder() -> XsumBuilder {
        XsumBuilder::new()
    }

    /// Run one batch: check when `check` is true, generate otherwise
    pub fn run(&mut self, patterns: &[String], check: bool) -> Result<Report> {
        if check {
            self.check(patterns)
        } else {
            self.generate(patterns)
        }
    }

    /// Hash every resolved data path and emit one record each
    ///
    /// A failure on one path is echoed, recorded as [`Outcome::Error`] and
    /// the batch continues.
    pub fn generate(&mut self, patterns: &[String]) -> Result<Report> {
        let mut report = Report::default();
        for path in self.resolve(patterns)? {
            match self.generate_one(&path) {
                Ok(line) => {
                    if self.echo_stdout {
                        // The hash line carries its own newline.
                        print!("{line}");
                    }
                    report.outcomes.push(Outcome::Success(path));
                }
                Err(error) => {
                    self.echo_exception(&path, &error);
                    report.outcomes.push(Outcome::Error {
                        path,
                        message: error.to_string(),
                    });
                }
            }
        }
        Ok(report)
    }

    /// Verify every record of every resolved checksum file
    ///
    /// Per record: success and mismatch are recorded and processing
    /// continues; a malformed record aborts the remainder of that one
    /// checksum file, as does an I/O failure on a referenced data file.
    /// The batch then resumes with the next checksum file.
    pub fn check(&mut self, patterns: &[String]) -> Result<Report> {
        let mut report = Report::default();
        for hash_path in self.resolve(patterns)? {
            if let Err(error) = self.check_file(&hash_path, &mut report) {
                self.echo_exception(&hash_path, &error);
                report.outcomes.push(Outcome::Error {
                    path: hash_path,
                    message: error.to_string(),
                });
            }
        }
        Ok(report)
    }

    /// Close the output sink, applying any pending mtime sync
    pub fn finish(self) -> Result<()> {
        self.output.close()
    }

    fn resolve(&self, patterns: &[String]) -> Result<Vec<PathBuf>> {
        if self.auto {
            return Ok(resolver::auto_discover(patterns));
        }
        let options = ResolveOptions {
            mode: self.glob_mode,
            file_type: self.file_type,
            recursive: true,
            expand_user: true,
            expand_vars: true,
        };
        resolver::resolve(patterns, &options)
    }

    fn generate_one(&mut self, path: &Path) -> Result<String> {
        let root = self.line_root(path);
        let line = generate_hash_line(
            path,
            |p| self.hasher.hash(p, self.start, self.stop, self.dir_ok),
            root.as_deref(),
        )?;
        let hash_path = self.sidecar_path(path);
        self.output.dump(&line, &hash_path, path)?;
        Ok(line)
    }

    fn check_file(&self, hash_path: &Path, report: &mut Report) -> Result<()> {
        debug!("checking {:?}", hash_path);
        let root = self.line_root(hash_path);
        let mut reader = HashFileReader::open(hash_path)?;
        let mut max_mtime = FileTime::zero();
        let mut lineno = 0usize;

        while let Some(line) = reader.read_hash_line()? {
            lineno += 1;
            let result = check_hash_line(
                &line,
                |p| self.hasher.hash(p, self.start, self.stop, self.dir_ok),
                root.as_deref(),
            );
            match result {
                Ok(path) => {
                    if self.sync {
                        let mtime =
                            FileTime::from_last_modification_time(&fs::metadata(&path)?);
                        if mtime > max_mtime {
                            max_mtime = mtime;
                        }
                    }
                    if self.echo_stdout {
                        println!("{}", format!("[SUCCESS] {}", path.display()).green());
                    }
                    report.outcomes.push(Outcome::Success(path));
                }
                Err(XsumError::ParseHashLine(raw)) => {
                    // No resynchronization on the line grammar; give up on
                    // the rest of this checksum file.
                    return Err(XsumError::ParseHashFile { line: raw, lineno });
                }
                Err(XsumError::CheckHashLine { path, .. }) => {
                    if self.echo_stdout {
                        println!("{}", format!("[FAILURE] {}", path.display()).red());
                    }
                    report.outcomes.push(Outcome::Mismatch(path));
                }
                Err(other) => return Err(other),
            }
        }

        if self.sync && max_mtime != FileTime::zero() {
            filetime::set_file_mtime(hash_path, max_mtime)?;
        }
        Ok(())
    }

    /// Root directory the record path is written relative to, if any
    fn line_root(&self, path: &Path) -> Option<PathBuf> {
        if self.inplace {
            let parent = match path.parent() {
                Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
                _ => PathBuf::from("."),
            };
            return Some(parent);
        }
        self.root.clone()
    }

    fn sidecar_path(&self, path: &Path) -> PathBuf {
        let mut os = path.as_os_str().to_os_string();
        os.push(&self.suffix);
        PathBuf::from(os)
    }

    fn echo_exception(&self, path: &Path, error: &XsumError) {
        if !self.echo_stderr {
            return;
        }
        let message = match error {
            XsumError::ParseHashFile { line, lineno } => format!(
                "[ERROR] invalid hash {:?} in '{}' at record {}",
                line.trim_end(),
                path.display(),
                lineno
            ),
            _ => format!("[ERROR] {}\n\t{}", path.display(), error),
        };
        eprintln!("{}", message.red());
    }
}
