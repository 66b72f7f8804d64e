//! End-to-end tests for the public xsum API

use std::fs;
use tempfile::TempDir;
use xsum::codec::{check_hash_line, format_hash_line, generate_hash_line, parse_hash_line};
use xsum::context::{create_context, HashContext};
use xsum::hasher::Hasher;
use xsum::xsum::{OutputMode, XsumBuilder};
use xsum::{Result, XsumError};

const SHA256_EMPTY: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

fn sha256_of(path: &std::path::Path) -> Result<Vec<u8>> {
    Hasher::new(create_context("sha256")?).hash(path, None, None, false)
}

#[test]
fn test_empty_file_sha256_line_is_bit_exact() {
    let dir = TempDir::new().unwrap();
    let foo = dir.path().join("foo.txt");
    fs::write(&foo, b"").unwrap();

    let line = generate_hash_line(&foo, sha256_of, Some(dir.path())).unwrap();
    assert_eq!(line, format!("{SHA256_EMPTY} *foo.txt\n"));

    // Checking the exact line against the unmodified file succeeds
    let path = check_hash_line(&line, sha256_of, Some(dir.path())).unwrap();
    assert!(path.ends_with("foo.txt"));

    // A one-byte change makes the same line fail
    fs::write(&foo, b"x").unwrap();
    let err = check_hash_line(&line, sha256_of, Some(dir.path())).unwrap_err();
    assert!(err.is_mismatch());
}

#[test]
fn test_tampered_hex_digit_is_always_detected() {
    let dir = TempDir::new().unwrap();
    let foo = dir.path().join("foo.txt");
    fs::write(&foo, b"payload").unwrap();

    let line = generate_hash_line(&foo, sha256_of, Some(dir.path())).unwrap();
    let (hash, _) = parse_hash_line(&line, None).unwrap();

    for index in 0..hash.len() {
        let mut tampered: Vec<char> = hash.chars().collect();
        tampered[index] = if tampered[index] == '0' { '1' } else { '0' };
        let tampered_hash: String = tampered.into_iter().collect();
        let tampered_line = line.replacen(&hash, &tampered_hash, 1);
        let err = check_hash_line(&tampered_line, sha256_of, Some(dir.path())).unwrap_err();
        assert!(err.is_mismatch(), "digit {index} not detected");
    }
}

#[test]
fn test_directory_aggregation_example() {
    // A directory with fileA (digest X) and fileB (digest Y) hashes to
    // X XOR Y, byte-wise, under a 16-byte digest.
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("fileA"), b"contents of A").unwrap();
    fs::write(dir.path().join("fileB"), b"contents of B").unwrap();

    let hasher = Hasher::new(create_context("md5").unwrap());
    let x = hasher
        .hash(&dir.path().join("fileA"), None, None, false)
        .unwrap();
    let y = hasher
        .hash(&dir.path().join("fileB"), None, None, false)
        .unwrap();
    assert_eq!(x.len(), 16);

    let expected: Vec<u8> = x.iter().zip(&y).map(|(a, b)| a ^ b).collect();
    let digest = hasher.hash(dir.path(), None, None, true).unwrap();
    assert_eq!(digest, expected);
}

#[test]
fn test_separator_compatibility_on_input() {
    let dir = TempDir::new().unwrap();
    let foo = dir.path().join("foo.txt");
    fs::write(&foo, b"").unwrap();

    for sep in [" *", "  ", " "] {
        let line = format!("{SHA256_EMPTY}{sep}foo.txt\n");
        let path = check_hash_line(&line, sha256_of, Some(dir.path())).unwrap();
        assert!(path.ends_with("foo.txt"), "separator {sep:?}");
    }
}

#[test]
fn test_generate_with_sidecars_and_sync() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("data.bin");
    fs::write(&data, b"12345").unwrap();
    filetime::set_file_mtime(&data, filetime::FileTime::from_unix_time(1_600_000, 0)).unwrap();

    let mut xsum = XsumBuilder::new()
        .echo_stdout(false)
        .echo_stderr(false)
        .output(OutputMode::Separate)
        .suffix(".sha256")
        .inplace(true)
        .sync(true)
        .build(create_context("sha256").unwrap())
        .unwrap();
    let pattern = data.to_string_lossy().into_owned();
    let report = xsum.generate(&[pattern]).unwrap();
    assert!(report.ok());
    xsum.finish().unwrap();

    let sidecar = dir.path().join("data.bin.sha256");
    assert!(sidecar.exists());
    let mtime =
        filetime::FileTime::from_last_modification_time(&fs::metadata(&sidecar).unwrap());
    assert_eq!(mtime.unix_seconds(), 1_600_000);

    // The sidecar checks out against its own directory
    let mut xsum = XsumBuilder::new()
        .echo_stdout(false)
        .echo_stderr(false)
        .inplace(true)
        .build(create_context("sha256").unwrap())
        .unwrap();
    let report = xsum
        .check(&[sidecar.to_string_lossy().into_owned()])
        .unwrap();
    assert!(report.ok());
    assert_eq!(report.successes(), 1);
}

#[test]
fn test_auto_discovery_skips_existing_checksum_files() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("keep.bin"), b"data").unwrap();
    fs::write(dir.path().join("keep.bin.sha256"), b"stale").unwrap();
    fs::create_dir(dir.path().join("nested")).unwrap();
    fs::write(dir.path().join("nested/other.bin"), b"more").unwrap();

    let mut xsum = XsumBuilder::new()
        .echo_stdout(false)
        .echo_stderr(false)
        .auto(true)
        .build(create_context("sha256").unwrap())
        .unwrap();
    let report = xsum
        .generate(&[dir.path().to_string_lossy().into_owned()])
        .unwrap();
    assert!(report.ok());
    assert_eq!(report.successes(), 2);
}

#[test]
fn test_byte_range_changes_the_digest() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("data.bin");
    fs::write(&data, b"0123456789").unwrap();

    let hasher = Hasher::new(create_context("sha256").unwrap());
    let whole = hasher.hash(&data, None, None, false).unwrap();
    let head = hasher.hash(&data, Some(0), Some(5), false).unwrap();
    let tail = hasher.hash(&data, Some(5), None, false).unwrap();
    assert_ne!(whole, head);
    assert_ne!(head, tail);

    let mut oneshot = create_context("sha256").unwrap();
    oneshot.update(b"01234");
    assert_eq!(head, oneshot.digest());
}

#[test]
fn test_directory_without_dir_flag_is_an_isolated_error() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();
    fs::write(dir.path().join("file.txt"), b"ok").unwrap();

    let mut xsum = XsumBuilder::new()
        .echo_stdout(false)
        .echo_stderr(false)
        .build(create_context("sha256").unwrap())
        .unwrap();
    let pattern = dir.path().join("*").to_string_lossy().into_owned();
    let report = xsum.generate(&[pattern]).unwrap();
    assert_eq!(report.successes(), 1);
    assert_eq!(report.errors(), 1);
}

#[test]
fn test_format_root_relativization_round_trip() {
    let line = format_hash_line("ff00", std::path::Path::new("/base/sub/x.bin"), Some(std::path::Path::new("/base"))).unwrap();
    assert_eq!(line, "ff00 *sub/x.bin\n");
    let (hash, path) = parse_hash_line(&line, Some(std::path::Path::new("/base"))).unwrap();
    assert_eq!(hash, "ff00");
    assert_eq!(path, std::path::PathBuf::from("/base/sub/x.bin"));
}

#[test]
fn test_unknown_algorithm_is_reported() {
    assert!(matches!(
        create_context("whirlpool-9000"),
        Err(XsumError::UnknownAlgorithm(_))
    ));
}
