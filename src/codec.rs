//! Checksum record codec
//!
//! One record is one text line of the form `<hex-digest> *<path>`. The
//! asterisk separator (GNU coreutils "binary mode") is always emitted; on
//! input, two spaces or a single space are also accepted for compatibility
//! with records produced by other checksum tools.
//!
//! The path field supports three representations — absolute, relative, and
//! relative to a caller-supplied root directory — and is normalized on both
//! encode and decode, giving the round-trip invariant
//! `parse(format(hash, path)) == (hash, normalize(path))`.
//!
//! [`HashFileReader`] and [`HashFileWriter`] are thin scoped resources over
//! a checksum file: the reader is a forward-only record source that skips
//! blank lines and `#` comments, the writer appends one formatted record at
//! a time with no buffering beyond what the OS provides.
//!
//! ## Example
//!
//! ```rust
//! use xsum::codec::{format_hash_line, parse_hash_line};
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let line = format_hash_line("d41d8cd98f00b204e9800998ecf8427e", "foo.txt".as_ref(), None)?;
//! assert_eq!(line, "d41d8cd98f00b204e9800998ecf8427e *foo.txt\n");
//!
//! let (hash, path) = parse_hash_line(&line, None)?;
//! assert_eq!(hash, "d41d8cd98f00b204e9800998ecf8427e");
//! assert_eq!(path, PathBuf::from("foo.txt"));
//! # Ok(())
//! # }
//! ```

use crate::error::{Result, XsumError};
use crate::utils::{normalize_path, relative_to};
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Format a checksum record
///
/// With `root` given, the path field is rewritten relative to it. The path
/// is normalized either way and emitted with the ` *` separator and a
/// trailing newline.
///
/// # Errors
///
/// - [`XsumError::PathConversion`] if the path is not valid UTF-8
/// - [`XsumError::Internal`] if the path cannot be relativized to `root`
pub fn format_hash_line(hex_hash: &str, path: &Path, root: Option<&Path>) -> Result<String> {
    let path = match root {
        Some(root) => relative_to(path, root)?,
        None => normalize_path(path),
    };
    let path_str = path
        .to_str()
        .ok_or_else(|| XsumError::PathConversion(path.clone().into_os_string()))?;
    Ok(format!("{hex_hash} *{path_str}\n"))
}

/// Parse a checksum record into `(hex_hash, path)`
///
/// Accepts ` *`, two spaces, or one space as the separator. The hash field
/// must be a non-empty run of hex digits and the path field non-empty; a
/// record with a hash but no path is rejected. With `root` given, the path
/// is joined onto it. The result is normalized.
///
/// # Errors
///
/// [`XsumError::ParseHashLine`] carrying the raw line when it does not
/// match the record grammar.
pub fn parse_hash_line(line: &str, root: Option<&Path>) -> Result<(String, PathBuf)> {
    let trimmed = line.strip_suffix('\n').unwrap_or(line);
    let trimmed = trimmed.strip_suffix('\r').unwrap_or(trimmed);

    let hex_end = trimmed
        .find(|c: char| !c.is_ascii_hexdigit())
        .unwrap_or(trimmed.len());
    let (hex_hash, rest) = trimmed.split_at(hex_end);

    // Separator alternatives are tried longest-first so that " *x" is the
    // path "x", not "*x".
    let path_str = rest
        .strip_prefix(" *")
        .or_else(|| rest.strip_prefix("  "))
        .or_else(|| rest.strip_prefix(' '));

    let path_str = match path_str {
        Some(p) if !p.is_empty() && !hex_hash.is_empty() => p,
        _ => return Err(XsumError::ParseHashLine(line.to_string())),
    };

    let path = match root {
        Some(root) => root.join(path_str),
        None => PathBuf::from(path_str),
    };
    Ok((hex_hash.to_string(), normalize_path(&path)))
}

/// Hash a path and format the resulting record
pub fn generate_hash_line<F>(path: &Path, hash_fn: F, root: Option<&Path>) -> Result<String>
where
    F: FnOnce(&Path) -> Result<Vec<u8>>,
{
    let digest = hash_fn(path)?;
    format_hash_line(&hex::encode(digest), path, root)
}

/// Parse a record, recompute the digest, and compare
///
/// The comparison is constant-time over the digest bytes. On success the
/// resolved path is returned.
///
/// # Errors
///
/// - [`XsumError::ParseHashLine`] if the record is malformed
/// - [`XsumError::CheckHashLine`] on digest mismatch, carrying the line,
///   both hex digests, and the resolved path
/// - errors from `hash_fn` pass through
pub fn check_hash_line<F>(line: &str, hash_fn: F, root: Option<&Path>) -> Result<PathBuf>
where
    F: FnOnce(&Path) -> Result<Vec<u8>>,
{
    let (hex_hash, path) = parse_hash_line(line, root)?;
    let expected = hex::decode(&hex_hash)?;
    let actual = hash_fn(&path)?;
    if !constant_time_eq(&expected, &actual) {
        return Err(XsumError::CheckHashLine {
            line: line.to_string(),
            expected: hex_hash,
            path,
            actual: hex::encode(actual),
        });
    }
    Ok(path)
}

/// Compare two digests without early exit on the first differing byte
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b) {
        diff |= x ^ y;
    }
    diff == 0
}

/// Forward-only reader over a checksum file
///
/// Yields raw hash lines, skipping blank lines and lines starting with `#`.
/// Reaching end-of-file is final; reopen the file to read it again.
pub struct HashFileReader {
    name: PathBuf,
    reader: BufReader<File>,
}

impl HashFileReader {
    /// Open a checksum file for reading
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let name = path.as_ref().to_path_buf();
        let file = File::open(&name)?;
        Ok(Self {
            name,
            reader: BufReader::new(file),
        })
    }

    /// Path this reader was opened on
    pub fn name(&self) -> &Path {
        &self.name
    }

    /// Read the next record, or `None` at end of file
    pub fn read_hash_line(&mut self) -> Result<Option<String>> {
        loop {
            let mut line = String::new();
            if self.reader.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            if line.starts_with('#') || line.trim().is_empty() {
                continue;
            }
            return Ok(Some(line));
        }
    }

    /// Iterate over raw records
    pub fn records(self) -> Records {
        Records { reader: self }
    }

    /// Iterate over parsed `(hex_hash, path)` records
    pub fn entries(self, root: Option<PathBuf>) -> Entries {
        Entries {
            reader: self,
            root,
        }
    }
}

/// Iterator over the raw hash lines of a [`HashFileReader`]
pub struct Records {
    reader: HashFileReader,
}

impl Iterator for Records {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.reader.read_hash_line().transpose()
    }
}

/// Iterator over the parsed records of a [`HashFileReader`]
pub struct Entries {
    reader: HashFileReader,
    root: Option<PathBuf>,
}

impl Iterator for Entries {
    type Item = Result<(String, PathBuf)>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.reader.read_hash_line() {
            Ok(Some(line)) => Some(parse_hash_line(&line, self.root.as_deref())),
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

/// Append-only writer for checksum files
pub struct HashFileWriter {
    name: PathBuf,
    file: File,
}

impl HashFileWriter {
    /// Create (truncating) a checksum file for writing
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let name = path.as_ref().to_path_buf();
        let file = File::create(&name)?;
        Ok(Self { name, file })
    }

    /// Path this writer was opened on
    pub fn name(&self) -> &Path {
        &self.name
    }

    /// Write one formatted record; the line must carry its own newline
    pub fn write_hash_line(&mut self, hash_line: &str) -> Result<()> {
        self.file.write_all(hash_line.as_bytes())?;
        Ok(())
    }
}
