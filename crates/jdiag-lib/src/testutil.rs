//! Shared test fake for the cluster client

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::cluster::{ClusterClient, ExecOutput, PodInfo};
use crate::error::DiagError;
use crate::models::Target;

/// In-memory [`ClusterClient`] with scripted exec behavior.
///
/// Exec dispatches on command shape: `jcmd -l` returns the configured JVM
/// listing for the pod, `jcmd <pid> <subcommand>` returns the configured
/// diagnostic output. Every exec is recorded for assertions.
pub(crate) struct FakeClusterClient {
    namespace: String,
    pods: Vec<PodInfo>,
    jcmd_listings: HashMap<String, String>,
    diagnostic_outputs: HashMap<(String, String), Vec<u8>>,
    exec_failures: HashMap<String, (i32, String)>,
    exec_delay: Option<Duration>,
    pub exec_log: Mutex<Vec<(String, Vec<String>)>>,
}

impl FakeClusterClient {
    pub fn new(namespace: impl Into<String>, pods: Vec<PodInfo>) -> Self {
        Self {
            namespace: namespace.into(),
            pods,
            jcmd_listings: HashMap::new(),
            diagnostic_outputs: HashMap::new(),
            exec_failures: HashMap::new(),
            exec_delay: None,
            exec_log: Mutex::new(Vec::new()),
        }
    }

    /// Stdout of `jcmd -l` inside the given pod.
    pub fn with_jcmd_listing(mut self, pod: &str, listing: &str) -> Self {
        self.jcmd_listings.insert(pod.to_string(), listing.to_string());
        self
    }

    /// Stdout of `jcmd <pid> <subcommand>` inside the given pod.
    pub fn with_diagnostic_output(mut self, pod: &str, subcommand: &str, output: &[u8]) -> Self {
        self.diagnostic_outputs
            .insert((pod.to_string(), subcommand.to_string()), output.to_vec());
        self
    }

    /// Make every exec against the given pod fail with this exit code.
    pub fn with_exec_failure(mut self, pod: &str, exit_code: i32, stderr: &str) -> Self {
        self.exec_failures
            .insert(pod.to_string(), (exit_code, stderr.to_string()));
        self
    }

    /// Delay every exec, for deadline tests.
    pub fn with_exec_delay(mut self, delay: Duration) -> Self {
        self.exec_delay = Some(delay);
        self
    }

    pub fn execs_for(&self, pod: &str) -> usize {
        self.exec_log
            .lock()
            .unwrap()
            .iter()
            .filter(|(p, _)| p == pod)
            .count()
    }
}

#[async_trait]
impl ClusterClient for FakeClusterClient {
    async fn list_pods(
        &self,
        namespace: &str,
        _label_selector: Option<&str>,
    ) -> Result<Vec<PodInfo>, DiagError> {
        if namespace != self.namespace {
            return Ok(Vec::new());
        }
        Ok(self.pods.clone())
    }

    async fn get_pod(&self, namespace: &str, name: &str) -> Result<Option<PodInfo>, DiagError> {
        if namespace != self.namespace {
            return Ok(None);
        }
        Ok(self.pods.iter().find(|p| p.name == name).cloned())
    }

    async fn exec(&self, target: &Target, command: &[String]) -> Result<ExecOutput, DiagError> {
        self.exec_log
            .lock()
            .unwrap()
            .push((target.pod.clone(), command.to_vec()));

        if let Some(delay) = self.exec_delay {
            tokio::time::sleep(delay).await;
        }

        if let Some((exit_code, stderr)) = self.exec_failures.get(&target.pod) {
            return Ok(ExecOutput {
                stdout: Vec::new(),
                stderr: stderr.clone().into_bytes(),
                exit_code: *exit_code,
            });
        }

        match command {
            [jcmd, flag] if jcmd == "jcmd" && flag == "-l" => {
                let listing = self
                    .jcmd_listings
                    .get(&target.pod)
                    .cloned()
                    .unwrap_or_default();
                Ok(ExecOutput {
                    stdout: listing.into_bytes(),
                    stderr: Vec::new(),
                    exit_code: 0,
                })
            }
            [jcmd, _pid, subcommand] if jcmd == "jcmd" => {
                match self
                    .diagnostic_outputs
                    .get(&(target.pod.clone(), subcommand.clone()))
                {
                    Some(output) => Ok(ExecOutput {
                        stdout: output.clone(),
                        stderr: Vec::new(),
                        exit_code: 0,
                    }),
                    None => Ok(ExecOutput {
                        stdout: Vec::new(),
                        stderr: format!("{subcommand} not scripted").into_bytes(),
                        exit_code: 1,
                    }),
                }
            }
            other => Err(DiagError::Exec {
                target: target.to_string(),
                exit_code: None,
                message: format!("unexpected command: {other:?}"),
            }),
        }
    }
}
