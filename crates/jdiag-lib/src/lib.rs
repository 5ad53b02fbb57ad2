//! Library for collecting JVM diagnostics from Kubernetes pods
//!
//! This crate provides the whole collection pipeline:
//! - Target resolution from namespace/label/pod/container selectors
//! - JVM process discovery and jcmd command construction
//! - Remote command execution over the pod exec channel
//! - Timestamped result files
//! - Run orchestration with per-target failure isolation

pub mod cluster;
pub mod command;
pub mod error;
pub mod exec;
pub mod models;
pub mod orchestrator;
pub mod resolver;
pub mod writer;

#[cfg(test)]
mod testutil;

pub use cluster::{ClusterClient, ExecOutput, KubeClient, PodInfo};
pub use error::DiagError;
pub use exec::{ExecConfig, ExecRunner};
pub use models::{
    CommandInvocation, CommandResult, DiagnosticKind, Outcome, ProcessHint, RunRecord, RunSummary,
    Target,
};
pub use orchestrator::CollectionOrchestrator;
pub use resolver::{PodResolution, Selector, TargetResolver};
pub use writer::ResultWriter;
