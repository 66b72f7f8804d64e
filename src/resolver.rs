//! Glob pattern resolution
//!
//! Expands file-system patterns into a stable, filtered, ordered list of
//! paths. Three escalating glob modes are supported:
//!
//! - [`GlobMode::Literal`]: the pattern is a path, taken as-is
//! - [`GlobMode::Wildcard`]: `*` and `?` only; every `[` is escaped before
//!   matching so bracket classes never activate and filenames containing a
//!   literal `[` cannot be misinterpreted
//! - [`GlobMode::Extended`]: full globbing including `[...]` classes
//!
//! Patterns may additionally have a leading `~` and `$VAR`/`${VAR}`
//! references expanded before matching. Unmatched patterns are not an error:
//! candidates that do not exist or do not pass the type filter are silently
//! dropped. The final list is ordered naturally (digit runs compared as
//! numbers, case-insensitive) with directories grouped before files, so
//! output is repeatable across runs despite OS-dependent enumeration order.

use crate::context;
use crate::error::Result;
use crate::utils::normalize_path;
use std::cmp::Ordering;
use std::iter::Peekable;
use std::path::{Path, PathBuf};
use std::str::Chars;
use tracing::debug;
use walkdir::WalkDir;

/// How much glob syntax is active in a pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GlobMode {
    /// No globbing; the pattern is a path
    Literal,
    /// `*` and `?` only; `[` is always literal
    #[default]
    Wildcard,
    /// Full globbing including `[...]` character classes
    Extended,
}

/// Which file-system entries survive the type filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PathType {
    /// Anything that exists
    #[default]
    Any,
    /// Directories only
    Dir,
    /// Regular files only
    File,
}

/// Options for [`resolve`]
#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    /// Glob mode
    pub mode: GlobMode,
    /// Type filter applied after expansion
    pub file_type: PathType,
    /// When true, `**` matches across directory boundaries; when false it
    /// collapses to `*`
    pub recursive: bool,
    /// Expand a leading `~` to the user's home directory
    pub expand_user: bool,
    /// Expand `$VAR` / `${VAR}` environment references
    pub expand_vars: bool,
}

/// Expand patterns into a filtered, naturally ordered path list
///
/// # Errors
///
/// Only pattern compilation can fail ([`glob::PatternError`], possible in
/// [`GlobMode::Extended`] with malformed class syntax). Candidates that
/// cannot be read are dropped, not reported.
pub fn resolve<S: AsRef<str>>(patterns: &[S], options: &ResolveOptions) -> Result<Vec<PathBuf>> {
    let mut candidates: Vec<PathBuf> = Vec::new();
    for pattern in patterns {
        let expanded = expand_pattern(pattern.as_ref(), options);
        match options.mode {
            GlobMode::Literal => candidates.push(PathBuf::from(&expanded)),
            GlobMode::Wildcard => glob_into(&expanded.replace('[', "[[]"), &mut candidates)?,
            GlobMode::Extended => glob_into(&expanded, &mut candidates)?,
        }
    }
    candidates.retain(|path| matches_type(path, options.file_type));
    debug!("resolved {} paths", candidates.len());
    Ok(sorted_paths(candidates))
}

/// Walk `roots` and yield every regular file that is not itself a checksum
/// file (judged by the registered sidecar suffixes, case-insensitively)
pub fn auto_discover<P: AsRef<Path>>(roots: &[P]) -> Vec<PathBuf> {
    let suffixes = context::hash_suffixes();
    let mut found = Vec::new();
    for root in roots {
        for entry in WalkDir::new(root).into_iter().filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_lowercase();
            if suffixes.iter().any(|suffix| name.ends_with(suffix.as_str())) {
                continue;
            }
            found.push(entry.into_path());
        }
    }
    sorted_paths(found)
}

/// Sort paths naturally, directories grouped before files
pub fn sorted_paths(paths: Vec<PathBuf>) -> Vec<PathBuf> {
    let (mut dirs, mut files): (Vec<PathBuf>, Vec<PathBuf>) =
        paths.into_iter().partition(|path| path.is_dir());
    dirs.sort_by(|a, b| natural_cmp(a, b));
    files.sort_by(|a, b| natural_cmp(a, b));
    dirs.extend(files);
    dirs
}

fn expand_pattern(pattern: &str, options: &ResolveOptions) -> String {
    let mut pattern = pattern.to_string();
    if options.expand_user {
        pattern = expand_user(&pattern);
    }
    if options.expand_vars {
        pattern = expand_vars(&pattern);
    }
    if !options.recursive && options.mode != GlobMode::Literal {
        // Non-recursive globbing treats ** like *.
        while pattern.contains("**") {
            pattern = pattern.replace("**", "*");
        }
    }
    normalize_path(Path::new(&pattern))
        .to_string_lossy()
        .into_owned()
}

fn glob_into(pattern: &str, out: &mut Vec<PathBuf>) -> Result<()> {
    let match_options = glob::MatchOptions {
        case_sensitive: true,
        require_literal_separator: false,
        // Wildcards never match hidden files.
        require_literal_leading_dot: true,
    };
    for entry in glob::glob_with(pattern, match_options)? {
        match entry {
            Ok(path) => out.push(path),
            // Unreadable candidates are dropped, same as non-matches.
            Err(_) => continue,
        }
    }
    Ok(())
}

fn matches_type(path: &Path, file_type: PathType) -> bool {
    match file_type {
        PathType::Any => path.exists(),
        PathType::Dir => path.is_dir(),
        PathType::File => path.is_file(),
    }
}

fn expand_user(path: &str) -> String {
    if let Some(home) = dirs::home_dir() {
        if path == "~" {
            return home.to_string_lossy().into_owned();
        }
        if let Some(rest) = path.strip_prefix("~/") {
            return home.join(rest).to_string_lossy().into_owned();
        }
    }
    path.to_string()
}

fn expand_vars(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut rest = path;
    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        if let Some(braced) = tail.strip_prefix("${") {
            if let Some(close) = braced.find('}') {
                match std::env::var(&braced[..close]) {
                    Ok(value) => out.push_str(&value),
                    // Unset variables stay as written.
                    Err(_) => out.push_str(&tail[..close + 3]),
                }
                rest = &braced[close + 1..];
            } else {
                out.push_str("${");
                rest = braced;
            }
            continue;
        }
        let name_len = tail[1..]
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(tail.len() - 1);
        if name_len == 0 {
            out.push('$');
            rest = &tail[1..];
            continue;
        }
        match std::env::var(&tail[1..1 + name_len]) {
            Ok(value) => out.push_str(&value),
            Err(_) => out.push_str(&tail[..1 + name_len]),
        }
        rest = &tail[1 + name_len..];
    }
    out.push_str(rest);
    out
}

/// Natural path ordering: digit runs compare as numbers, text folds case;
/// byte order breaks ties so the sort stays total
fn natural_cmp(a: &Path, b: &Path) -> Ordering {
    let a = a.to_string_lossy();
    let b = b.to_string_lossy();
    natural_str_cmp(&a, &b).then_with(|| a.cmp(&b))
}

fn natural_str_cmp(a: &str, b: &str) -> Ordering {
    let mut ai = a.chars().peekable();
    let mut bi = b.chars().peekable();
    loop {
        match (ai.peek().copied(), bi.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let na = take_number(&mut ai);
                let nb = take_number(&mut bi);
                // (digit count, digits) with leading zeros stripped orders
                // numerically without overflow concerns.
                match na.cmp(&nb) {
                    Ordering::Equal => {}
                    other => return other,
                }
            }
            (Some(x), Some(y)) => {
                match x.to_ascii_lowercase().cmp(&y.to_ascii_lowercase()) {
                    Ordering::Equal => {
                        ai.next();
                        bi.next();
                    }
                    other => return other,
                }
            }
        }
    }
}

fn take_number(iter: &mut Peekable<Chars>) -> (usize, String) {
    let mut digits = String::new();
    while let Some(c) = iter.peek().copied() {
        if !c.is_ascii_digit() {
            break;
        }
        digits.push(c);
        iter.next();
    }
    let trimmed = digits.trim_start_matches('0');
    (trimmed.len(), trimmed.to_string())
}
