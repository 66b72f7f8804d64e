//! # xsum - Checksums for files and directories
//!
//! A library and CLI for generating and verifying GNU-coreutils-style
//! checksum records, with two twists the classic tools lack: directories can
//! be hashed (via order-independent XOR aggregation of their contents) and
//! any byte range of a file can be hashed instead of the whole thing.
//!
//! ## Overview
//!
//! xsum works with flat text checksum files in which each record is one line:
//!
//! ```text
//! e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855 *foo.txt
//! ```
//!
//! The ` *` separator is always written; two spaces or one space are also
//! accepted when reading, for compatibility with records produced by other
//! checksum tools. Lines starting with `#` and blank lines are skipped.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use xsum::context::create_context;
//! use xsum::xsum::{OutputMode, XsumBuilder};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Hash every .bin file into one aggregate checksum file
//! let mut xsum = XsumBuilder::new()
//!     .output(OutputMode::Aggregate("sums.sha256".into()))
//!     .build(create_context("sha256")?)?;
//! let report = xsum.generate(&["data/*.bin".to_string()])?;
//! xsum.finish()?;
//!
//! // Later: verify the records
//! let mut xsum = XsumBuilder::new().build(create_context("sha256")?)?;
//! let report = xsum.check(&["sums.sha256".to_string()])?;
//! if !report.ok() {
//!     eprintln!("{} mismatches, {} errors", report.mismatches(), report.errors());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Key Concepts
//!
//! ### Hash contexts
//!
//! The hashing engine is polymorphic over the algorithm through the
//! [`context::HashContext`] capability trait. Nine algorithms ship in the
//! built-in registry ([`context::create_context`]), from SHA-2 and SHA-3 to
//! BLAKE2 and a CRC-32 accumulator; anything that can report its digest
//! size, accept updates, and clone itself can be plugged in.
//!
//! ### Directory digests
//!
//! A directory's digest is the byte-wise XOR of its children's digests.
//! Because XOR is commutative and associative, the digest does not depend on
//! the order the operating system enumerates directory entries in.
//!
//! ### Batches and error isolation
//!
//! [`xsum::Xsum`] drives generate and check batches over a resolved path
//! set. One bad file never aborts a batch: every item's outcome is recorded
//! individually and reported at the end. The single exception is a malformed
//! record inside a checksum file, which abandons the remainder of that one
//! file (there is no way to resynchronize on the line grammar).
//!
//! ### Output sinks
//!
//! Generated records can go to a single aggregate file, to one sidecar file
//! per source (`foo.txt` -> `foo.txt.sha256`), or nowhere but the console.
//! Optionally the checksum artifact's mtime is synced to the newest mtime of
//! the data it describes, so its apparent freshness tracks its inputs.
//!
//! ## Module Organization
//!
//! - [`context`]: hash algorithm capability trait, adapters and registry
//! - [`hasher`]: chunked hashing engine with ranges and directory digests
//! - [`codec`]: checksum record format/parse and file reader/writer
//! - [`resolver`]: glob pattern resolution, filtering and ordering
//! - [`output`]: output sinks and mtime sync
//! - [`xsum`]: batch orchestration, builder, outcomes
//! - [`error`]: error types and handling

pub mod codec;
pub mod context;
pub mod error;
pub mod hasher;
pub mod output;
pub mod resolver;
pub mod xsum;

mod utils;

// Re-export main types for convenience
pub use codec::{HashFileReader, HashFileWriter};
pub use context::{create_context, Crc32, DigestContext, HashContext, ALGORITHM_NAMES};
pub use error::{Result, XsumError};
pub use hasher::Hasher;
pub use output::Output;
pub use xsum::{Outcome, OutputMode, Report, Xsum, XsumBuilder};

#[cfg(test)]
mod tests;
