//! Core data model for the diagnostics pipeline

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::error::DiagError;

/// A resolved (namespace, pod, container) triple to diagnose.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Target {
    pub namespace: String,
    pub pod: String,
    pub container: String,
}

impl Target {
    pub fn new(
        namespace: impl Into<String>,
        pod: impl Into<String>,
        container: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            pod: pod.into(),
            container: container.into(),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}[{}]", self.namespace, self.pod, self.container)
    }
}

/// The diagnostic to collect from a JVM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticKind {
    ThreadDump,
    ClassHistogram,
}

impl DiagnosticKind {
    /// Both diagnostics, in collection order.
    pub const ALL: [DiagnosticKind; 2] = [DiagnosticKind::ThreadDump, DiagnosticKind::ClassHistogram];

    /// The jcmd subcommand that produces this diagnostic.
    pub fn jcmd_subcommand(&self) -> &'static str {
        match self {
            DiagnosticKind::ThreadDump => "Thread.print",
            DiagnosticKind::ClassHistogram => "GC.class_histogram",
        }
    }

    /// Suffix of the output file this diagnostic is saved under.
    pub fn file_suffix(&self) -> &'static str {
        match self {
            DiagnosticKind::ThreadDump => "threaddump.out",
            DiagnosticKind::ClassHistogram => "histogram.txt",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticKind::ThreadDump => write!(f, "thread dump"),
            DiagnosticKind::ClassHistogram => write!(f, "class histogram"),
        }
    }
}

/// Substring of the JVM main class, used to pick the process when a
/// container runs more than one JVM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessHint(String);

impl ProcessHint {
    pub fn new(hint: impl Into<String>) -> Self {
        Self(hint.into())
    }

    pub fn matches(&self, command_line: &str) -> bool {
        command_line.contains(&self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One remote diagnostic command against one target.
#[derive(Debug, Clone)]
pub struct CommandInvocation {
    pub target: Target,
    pub kind: DiagnosticKind,
    pub hint: Option<ProcessHint>,
}

/// Captured output of a successfully completed diagnostic command.
///
/// The timestamp is captured once per target, before its first command,
/// so both diagnostics of one pod land under the same stamp.
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub invocation: CommandInvocation,
    pub output: Vec<u8>,
    pub timestamp: DateTime<Local>,
}

/// Outcome of one (target, kind) pair, or of a failed resolution.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Written { path: PathBuf },
    Failed { error: String, message: String },
}

/// One line of the run summary.
#[derive(Debug, Clone, Serialize)]
pub struct RunRecord {
    pub namespace: String,
    pub pod: String,
    /// None when resolution failed before a container was picked.
    pub container: Option<String>,
    /// None for resolution failures, which precede any command.
    pub kind: Option<DiagnosticKind>,
    pub outcome: Outcome,
}

/// Accumulated result of a collection run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub total_targets: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub records: Vec<RunRecord>,
}

impl RunSummary {
    pub fn new(total_targets: usize) -> Self {
        Self {
            total_targets,
            ..Self::default()
        }
    }

    /// Record a written diagnostic file.
    pub fn record_success(&mut self, target: &Target, kind: DiagnosticKind, path: PathBuf) {
        self.succeeded += 1;
        self.records.push(RunRecord {
            namespace: target.namespace.clone(),
            pod: target.pod.clone(),
            container: Some(target.container.clone()),
            kind: Some(kind),
            outcome: Outcome::Written { path },
        });
    }

    /// Record a failed command for a resolved target.
    pub fn record_failure(&mut self, target: &Target, kind: DiagnosticKind, error: &DiagError) {
        self.failed += 1;
        self.records.push(RunRecord {
            namespace: target.namespace.clone(),
            pod: target.pod.clone(),
            container: Some(target.container.clone()),
            kind: Some(kind),
            outcome: Outcome::Failed {
                error: error.kind().to_string(),
                message: error.to_string(),
            },
        });
    }

    /// Record a pod whose resolution failed before any command ran.
    pub fn record_resolution_failure(&mut self, namespace: &str, pod: &str, error: &DiagError) {
        self.failed += 1;
        self.records.push(RunRecord {
            namespace: namespace.to_string(),
            pod: pod.to_string(),
            container: None,
            kind: None,
            outcome: Outcome::Failed {
                error: error.kind().to_string(),
                message: error.to_string(),
            },
        });
    }

    /// True only when every target produced every diagnostic.
    ///
    /// This drives the process exit status: a partial failure is still a
    /// failed run, since the operator asked for a complete snapshot.
    pub fn fully_succeeded(&self) -> bool {
        self.failed == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_display() {
        let target = Target::new("prod", "svc-1", "app");
        assert_eq!(target.to_string(), "prod/svc-1[app]");
    }

    #[test]
    fn test_kind_file_suffixes() {
        assert_eq!(DiagnosticKind::ThreadDump.file_suffix(), "threaddump.out");
        assert_eq!(DiagnosticKind::ClassHistogram.file_suffix(), "histogram.txt");
    }

    #[test]
    fn test_kind_jcmd_subcommands() {
        assert_eq!(DiagnosticKind::ThreadDump.jcmd_subcommand(), "Thread.print");
        assert_eq!(
            DiagnosticKind::ClassHistogram.jcmd_subcommand(),
            "GC.class_histogram"
        );
    }

    #[test]
    fn test_hint_matches_substring() {
        let hint = ProcessHint::new("Bootstrap");
        assert!(hint.matches("12345 com.example.Bootstrap --port 8080"));
        assert!(!hint.matches("12345 org.apache.catalina.startup.Main"));
    }

    #[test]
    fn test_summary_counts() {
        let target = Target::new("prod", "svc-1", "app");
        let mut summary = RunSummary::new(2);

        summary.record_success(&target, DiagnosticKind::ThreadDump, "a.out".into());
        summary.record_success(&target, DiagnosticKind::ClassHistogram, "b.txt".into());
        assert!(summary.fully_succeeded());

        summary.record_resolution_failure(
            "prod",
            "svc-2",
            &DiagError::AmbiguousContainer {
                pod: "svc-2".to_string(),
                count: 2,
            },
        );
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 1);
        assert!(!summary.fully_succeeded());
    }

    #[test]
    fn test_resolution_failure_has_no_kind() {
        let mut summary = RunSummary::new(1);
        summary.record_resolution_failure(
            "prod",
            "svc-2",
            &DiagError::AmbiguousContainer {
                pod: "svc-2".to_string(),
                count: 2,
            },
        );

        let record = &summary.records[0];
        assert!(record.kind.is_none());
        assert!(record.container.is_none());
        match &record.outcome {
            Outcome::Failed { error, .. } => assert_eq!(error, "AmbiguousContainer"),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
}
