//! Collection orchestration
//!
//! Drives the pipeline: resolve targets, discover the JVM pid in each,
//! run both diagnostics, write successes, tally everything into a
//! [`RunSummary`]. A failure anywhere in one target never aborts the
//! others; only listing-level errors end the run early.

use chrono::Local;
use tracing::{info, warn};

use crate::cluster::ClusterClient;
use crate::command::{diagnostic_command, find_jvm_pid, jvm_list_command};
use crate::error::DiagError;
use crate::exec::{ExecConfig, ExecRunner};
use crate::models::{
    CommandInvocation, CommandResult, DiagnosticKind, ProcessHint, RunSummary, Target,
};
use crate::resolver::TargetResolver;
use crate::writer::ResultWriter;

pub struct CollectionOrchestrator<'a> {
    client: &'a dyn ClusterClient,
    resolver: TargetResolver,
    writer: ResultWriter,
    exec_config: ExecConfig,
    hint: Option<ProcessHint>,
}

impl<'a> CollectionOrchestrator<'a> {
    pub fn new(
        client: &'a dyn ClusterClient,
        resolver: TargetResolver,
        writer: ResultWriter,
        exec_config: ExecConfig,
        hint: Option<ProcessHint>,
    ) -> Self {
        Self {
            client,
            resolver,
            writer,
            exec_config,
            hint,
        }
    }

    /// Run the whole collection. Targets are processed sequentially; the
    /// returned summary carries one record per (target, diagnostic) plus
    /// one per failed resolution.
    pub async fn run(&self) -> Result<RunSummary, DiagError> {
        let resolutions = self.resolver.resolve(self.client).await?;
        let mut summary = RunSummary::new(resolutions.len());
        let runner = ExecRunner::new(self.client, self.exec_config.clone());

        for resolution in resolutions {
            match resolution.target {
                Ok(target) => self.collect_target(&runner, &target, &mut summary).await,
                Err(error) => {
                    warn!(pod = %resolution.pod, error = %error, "target resolution failed");
                    summary.record_resolution_failure(
                        self.resolver.namespace(),
                        &resolution.pod,
                        &error,
                    );
                }
            }
        }

        info!(
            targets = summary.total_targets,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "collection finished"
        );
        Ok(summary)
    }

    async fn collect_target(
        &self,
        runner: &ExecRunner<'_>,
        target: &Target,
        summary: &mut RunSummary,
    ) {
        // Captured once here so both diagnostics of this pod share the
        // same filename stamp.
        let timestamp = Local::now();

        let pid = match self.discover_pid(runner, target).await {
            Ok(pid) => pid,
            Err(error) => {
                warn!(error = %error, "JVM discovery failed on {target}");
                for kind in DiagnosticKind::ALL {
                    summary.record_failure(target, kind, &error);
                }
                return;
            }
        };
        info!(pid = %pid, "collecting diagnostics from {target}");

        for kind in DiagnosticKind::ALL {
            let outcome = runner.run(target, &diagnostic_command(kind, &pid)).await;
            match outcome {
                Ok(output) => {
                    let result = CommandResult {
                        invocation: CommandInvocation {
                            target: target.clone(),
                            kind,
                            hint: self.hint.clone(),
                        },
                        output,
                        timestamp,
                    };
                    match self.writer.write(&result) {
                        Ok(path) => {
                            info!(path = %path.display(), "saved {kind} from {target}");
                            summary.record_success(target, kind, path);
                        }
                        Err(error) => {
                            warn!(error = %error, "failed to save {kind} from {target}");
                            summary.record_failure(target, kind, &error);
                        }
                    }
                }
                Err(error) => {
                    warn!(error = %error, "{kind} failed on {target}");
                    summary.record_failure(target, kind, &error);
                }
            }
        }
    }

    async fn discover_pid(
        &self,
        runner: &ExecRunner<'_>,
        target: &Target,
    ) -> Result<String, DiagError> {
        let listing = runner.run(target, &jvm_list_command()).await?;
        find_jvm_pid(&String::from_utf8_lossy(&listing), self.hint.as_ref())
    }
}
