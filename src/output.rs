//! Output sinks for generated checksum records
//!
//! A batch writes records to exactly one sink, opened before the batch and
//! closed after it:
//!
//! - [`Output::Aggregate`]: one persistent checksum file accumulating every
//!   record of the batch
//! - [`Output::Separate`]: one sidecar file per source path, named by the
//!   caller (source path + suffix)
//! - [`Output::Null`]: no file output; records only go to the console echo
//!
//! With sync enabled, a sink carries the newest modification time observed
//! among its source files forward onto the written checksum file, so the
//! artifact's apparent freshness tracks its inputs.

use crate::codec::HashFileWriter;
use crate::error::Result;
use filetime::FileTime;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Destination for generated hash lines
pub enum Output {
    /// Single persistent file accumulating every record
    Aggregate {
        /// Writer over the aggregate file
        writer: HashFileWriter,
        /// Sync the aggregate's mtime to the newest source on close
        sync: bool,
        /// Newest source mtime seen so far
        max_mtime: FileTime,
    },
    /// One sidecar checksum file per source path
    Separate {
        /// Sync each sidecar's mtime to its source
        sync: bool,
    },
    /// Console echo only
    Null,
}

impl Output {
    /// Open an aggregate sink writing to `path`
    pub fn aggregate(path: impl AsRef<Path>, sync: bool) -> Result<Self> {
        Ok(Output::Aggregate {
            writer: HashFileWriter::create(path)?,
            sync,
            max_mtime: FileTime::zero(),
        })
    }

    /// Create a separate (sidecar-per-source) sink
    pub fn separate(sync: bool) -> Self {
        Output::Separate { sync }
    }

    /// Create a sink that writes nothing
    pub fn null() -> Self {
        Output::Null
    }

    /// Hand one record to the sink
    ///
    /// `hash_path` is the sidecar destination for this record (only used by
    /// [`Output::Separate`]); `source` is the data path the record describes.
    pub fn dump(&mut self, hash_line: &str, hash_path: &Path, source: &Path) -> Result<()> {
        match self {
            Output::Aggregate {
                writer,
                sync,
                max_mtime,
            } => {
                writer.write_hash_line(hash_line)?;
                if *sync {
                    let mtime = FileTime::from_last_modification_time(&fs::metadata(source)?);
                    if mtime > *max_mtime {
                        *max_mtime = mtime;
                    }
                }
            }
            Output::Separate { sync } => {
                let mut writer = HashFileWriter::create(hash_path)?;
                writer.write_hash_line(hash_line)?;
                drop(writer);
                if *sync {
                    let mtime = FileTime::from_last_modification_time(&fs::metadata(source)?);
                    filetime::set_file_mtime(hash_path, mtime)?;
                }
            }
            Output::Null => {}
        }
        Ok(())
    }

    /// Close the sink, applying any pending mtime sync
    pub fn close(self) -> Result<()> {
        if let Output::Aggregate {
            writer,
            sync,
            max_mtime,
        } = self
        {
            let name = writer.name().to_path_buf();
            drop(writer);
            if sync && max_mtime != FileTime::zero() {
                debug!("syncing {:?} mtime to {}", name, max_mtime);
                filetime::set_file_mtime(&name, max_mtime)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_aggregate_accumulates_records() {
        let dir = TempDir::new().unwrap();
        let agg = dir.path().join("all.sha256");
        let src = dir.path().join("src.txt");
        fs::write(&src, b"x").unwrap();

        let mut output = Output::aggregate(&agg, false).unwrap();
        output.dump("ff *a\n", Path::new("unused"), &src).unwrap();
        output.dump("ee *b\n", Path::new("unused"), &src).unwrap();
        output.close().unwrap();

        assert_eq!(fs::read_to_string(&agg).unwrap(), "ff *a\nee *b\n");
    }

    #[test]
    fn test_aggregate_sync_tracks_newest_source() {
        let dir = TempDir::new().unwrap();
        let agg = dir.path().join("all.sha256");
        let old = dir.path().join("old.txt");
        let new = dir.path().join("new.txt");
        fs::write(&old, b"x").unwrap();
        fs::write(&new, b"y").unwrap();
        filetime::set_file_mtime(&old, FileTime::from_unix_time(1_000_000, 0)).unwrap();
        filetime::set_file_mtime(&new, FileTime::from_unix_time(2_000_000, 0)).unwrap();

        let mut output = Output::aggregate(&agg, true).unwrap();
        output.dump("ff *old\n", Path::new("unused"), &old).unwrap();
        output.dump("ee *new\n", Path::new("unused"), &new).unwrap();
        output.close().unwrap();

        let mtime = FileTime::from_last_modification_time(&fs::metadata(&agg).unwrap());
        assert_eq!(mtime.unix_seconds(), 2_000_000);
    }

    #[test]
    fn test_separate_writes_sidecar_and_syncs() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src.txt");
        let sidecar = dir.path().join("src.txt.sha256");
        fs::write(&src, b"x").unwrap();
        filetime::set_file_mtime(&src, FileTime::from_unix_time(1_500_000, 0)).unwrap();

        let mut output = Output::separate(true);
        output.dump("ff *src.txt\n", &sidecar, &src).unwrap();
        output.close().unwrap();

        assert_eq!(fs::read_to_string(&sidecar).unwrap(), "ff *src.txt\n");
        let mtime = FileTime::from_last_modification_time(&fs::metadata(&sidecar).unwrap());
        assert_eq!(mtime.unix_seconds(), 1_500_000);
    }

    #[test]
    fn test_null_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let sidecar = dir.path().join("src.txt.sha256");
        let src = dir.path().join("src.txt");
        fs::write(&src, b"x").unwrap();

        let mut output = Output::null();
        output.dump("ff *src.txt\n", &sidecar, &src).unwrap();
        output.close().unwrap();

        assert!(!sidecar.exists());
    }
}
