//! Remote command execution
//!
//! One attempt per command, bounded by a deadline. Success means exit
//! code zero; everything else (non-zero exit, channel failure, elapsed
//! deadline) is a failure carrying whatever the remote side reported.

use std::time::Duration;

use tokio::time::timeout;
use tracing::debug;

use crate::cluster::ClusterClient;
use crate::error::DiagError;
use crate::models::Target;

/// Execution settings shared by all commands of a run.
#[derive(Debug, Clone)]
pub struct ExecConfig {
    /// Deadline for a single remote command.
    pub timeout: Duration,
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
        }
    }
}

/// Runs one remote command against one target.
pub struct ExecRunner<'a> {
    client: &'a dyn ClusterClient,
    config: ExecConfig,
}

impl<'a> ExecRunner<'a> {
    pub fn new(client: &'a dyn ClusterClient, config: ExecConfig) -> Self {
        Self { client, config }
    }

    /// Execute the command and return its captured stdout. No retries;
    /// no local side effects.
    pub async fn run(&self, target: &Target, command: &[String]) -> Result<Vec<u8>, DiagError> {
        debug!(command = ?command, "running remote command on {target}");

        let output = timeout(self.config.timeout, self.client.exec(target, command))
            .await
            .map_err(|_| DiagError::Timeout {
                target: target.to_string(),
                seconds: self.config.timeout.as_secs(),
            })??;

        if output.exit_code != 0 {
            return Err(DiagError::Exec {
                target: target.to_string(),
                exit_code: Some(output.exit_code),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        debug!(bytes = output.stdout.len(), "remote command on {target} completed");
        Ok(output.stdout)
    }
}
