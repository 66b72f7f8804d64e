//! Integration tests for xsum
//!
//! End-to-end tests driving the full generate/check workflow through the
//! public API.

#[cfg(test)]
mod integration_tests {
    use crate::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_basic_workflow() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("readme.txt"), "# My Project").unwrap();
        fs::write(dir.path().join("main.txt"), "fn main() {}").unwrap();
        let agg = dir.path().join("sums.sha256");
        let data_pattern = dir.path().join("*.txt").to_string_lossy().into_owned();

        // Generate into an aggregate checksum file
        let mut xsum = XsumBuilder::new()
            .echo_stdout(false)
            .echo_stderr(false)
            .root(dir.path())
            .output(OutputMode::Aggregate(agg.clone()))
            .build(create_context("sha256").unwrap())
            .unwrap();
        let report = xsum.generate(&[data_pattern.clone()]).unwrap();
        assert!(report.ok());
        assert_eq!(report.successes(), 2);
        xsum.finish().unwrap();

        // Both records are present and check out
        let content = fs::read_to_string(&agg).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(content.contains(" *main.txt"));
        assert!(content.contains(" *readme.txt"));

        let mut xsum = XsumBuilder::new()
            .echo_stdout(false)
            .echo_stderr(false)
            .root(dir.path())
            .build(create_context("sha256").unwrap())
            .unwrap();
        let report = xsum.check(&[agg.to_string_lossy().into_owned()]).unwrap();
        assert!(report.ok());
        assert_eq!(report.successes(), 2);

        // Modify one file: its record must now fail, the other still passes
        fs::write(dir.path().join("main.txt"), "fn main() { panic!() }").unwrap();
        let mut xsum = XsumBuilder::new()
            .echo_stdout(false)
            .echo_stderr(false)
            .root(dir.path())
            .build(create_context("sha256").unwrap())
            .unwrap();
        let report = xsum.check(&[agg.to_string_lossy().into_owned()]).unwrap();
        assert_eq!(report.successes(), 1);
        assert_eq!(report.mismatches(), 1);
    }
}
