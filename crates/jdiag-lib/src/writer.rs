//! Result persistence
//!
//! Maps a completed diagnostic to its destination path and writes the
//! captured bytes verbatim. Files are named
//! `{namespace}_{pod}_{YYYYMMDD-HHMM}_{suffix}`; both diagnostics of one
//! pod share the timestamp captured when its collection began, so the
//! scheme is unique within a run.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::debug;

use crate::error::DiagError;
use crate::models::{CommandResult, DiagnosticKind, Target};

pub struct ResultWriter {
    output_dir: PathBuf,
}

impl ResultWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Destination path for one (target, kind) pair.
    pub fn destination(
        &self,
        target: &Target,
        timestamp: &DateTime<Local>,
        kind: DiagnosticKind,
    ) -> PathBuf {
        self.output_dir.join(format!(
            "{}_{}_{}_{}",
            target.namespace,
            target.pod,
            timestamp.format("%Y%m%d-%H%M"),
            kind.file_suffix()
        ))
    }

    /// Write a completed result, overwriting any existing file at the
    /// destination. The bytes land in a temporary sibling first and are
    /// renamed into place, so a crash mid-write never leaves a partial
    /// file under the final name.
    pub fn write(&self, result: &CommandResult) -> Result<PathBuf, DiagError> {
        let path = self.destination(
            &result.invocation.target,
            &result.timestamp,
            result.invocation.kind,
        );
        let tmp = tmp_path(&path);

        fs::write(&tmp, &result.output).map_err(|source| DiagError::Write {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &path).map_err(|source| DiagError::Write {
            path: path.clone(),
            source,
        })?;

        debug!(path = %path.display(), bytes = result.output.len(), "wrote diagnostic");
        Ok(path)
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CommandInvocation;
    use chrono::TimeZone;

    fn result_at_noon(kind: DiagnosticKind, output: &[u8]) -> CommandResult {
        CommandResult {
            invocation: CommandInvocation {
                target: Target::new("ns", "demo", "app"),
                kind,
                hint: None,
            },
            output: output.to_vec(),
            timestamp: Local.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_destination_naming() {
        let writer = ResultWriter::new("/tmp/out");
        let target = Target::new("ns", "demo", "app");
        let timestamp = Local.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();

        assert_eq!(
            writer.destination(&target, &timestamp, DiagnosticKind::ThreadDump),
            PathBuf::from("/tmp/out/ns_demo_20240101-1200_threaddump.out")
        );
        assert_eq!(
            writer.destination(&target, &timestamp, DiagnosticKind::ClassHistogram),
            PathBuf::from("/tmp/out/ns_demo_20240101-1200_histogram.txt")
        );
    }

    #[test]
    fn test_write_exact_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ResultWriter::new(dir.path());

        let result = result_at_noon(DiagnosticKind::ThreadDump, b"Full thread dump...");
        let path = writer.write(&result).unwrap();

        assert_eq!(
            path.file_name().unwrap(),
            "ns_demo_20240101-1200_threaddump.out"
        );
        assert_eq!(fs::read(&path).unwrap(), b"Full thread dump...");
    }

    #[test]
    fn test_write_overwrites_existing() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ResultWriter::new(dir.path());

        let first = result_at_noon(DiagnosticKind::ClassHistogram, b"old");
        let second = result_at_noon(DiagnosticKind::ClassHistogram, b"new histogram");
        let path = writer.write(&first).unwrap();
        assert_eq!(writer.write(&second).unwrap(), path);

        assert_eq!(fs::read(&path).unwrap(), b"new histogram");
    }

    #[test]
    fn test_write_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ResultWriter::new(dir.path());

        writer
            .write(&result_at_noon(DiagnosticKind::ThreadDump, b"dump"))
            .unwrap();

        let entries: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_write_missing_directory_fails() {
        let writer = ResultWriter::new("/nonexistent/output/dir");
        let err = writer
            .write(&result_at_noon(DiagnosticKind::ThreadDump, b"dump"))
            .unwrap_err();
        assert_eq!(err.kind(), "WriteError");
    }
}
