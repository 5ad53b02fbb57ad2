//! Error taxonomy for the diagnostics pipeline

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while resolving targets, executing remote commands,
/// and writing results.
#[derive(Debug, Error)]
pub enum DiagError {
    #[error("no pod selected; pass --pod or --label")]
    AmbiguousSelection,

    #[error("no pods in namespace '{namespace}' match label '{label}'")]
    NoMatchingPods { namespace: String, label: String },

    #[error("pod '{pod}' not found in namespace '{namespace}'")]
    TargetNotFound { namespace: String, pod: String },

    #[error("pod '{pod}' has {count} containers; pass --container to pick one")]
    AmbiguousContainer { pod: String, count: usize },

    #[error("container '{container}' not found on pod '{pod}'")]
    ContainerNotFound { pod: String, container: String },

    #[error("no JVM process found{}", hint_suffix(.hint))]
    ProcessNotFound { hint: Option<String> },

    #[error("{count} JVM processes matched{}; narrow with --main", hint_suffix(.hint))]
    AmbiguousProcess { count: usize, hint: Option<String> },

    #[error("exec on {target} failed{}: {message}", exit_suffix(.exit_code))]
    Exec {
        target: String,
        exit_code: Option<i32>,
        message: String,
    },

    #[error("exec on {target} did not complete within {seconds}s")]
    Timeout { target: String, seconds: u64 },

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cluster api error: {0}")]
    Cluster(String),
}

impl DiagError {
    /// Short variant name, used when reporting outcomes per target.
    pub fn kind(&self) -> &'static str {
        match self {
            DiagError::AmbiguousSelection => "AmbiguousSelection",
            DiagError::NoMatchingPods { .. } => "NoMatchingPods",
            DiagError::TargetNotFound { .. } => "TargetNotFound",
            DiagError::AmbiguousContainer { .. } => "AmbiguousContainer",
            DiagError::ContainerNotFound { .. } => "ContainerNotFound",
            DiagError::ProcessNotFound { .. } => "ProcessNotFound",
            DiagError::AmbiguousProcess { .. } => "AmbiguousProcess",
            DiagError::Exec { .. } => "ExecError",
            DiagError::Timeout { .. } => "Timeout",
            DiagError::Write { .. } => "WriteError",
            DiagError::Cluster(_) => "ClusterError",
        }
    }
}

fn hint_suffix(hint: &Option<String>) -> String {
    match hint {
        Some(h) => format!(" for hint '{h}'"),
        None => String::new(),
    }
}

fn exit_suffix(exit_code: &Option<i32>) -> String {
    match exit_code {
        Some(code) => format!(" with exit code {code}"),
        None => String::new(),
    }
}
