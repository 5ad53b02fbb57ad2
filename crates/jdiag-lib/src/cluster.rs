//! Cluster access behind a narrow trait
//!
//! The pipeline only ever talks to the cluster through [`ClusterClient`],
//! so resolution and orchestration can be tested against a fake without a
//! live API server. [`KubeClient`] is the production implementation.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Status;
use kube::api::{Api, AttachParams, ListParams};
use tokio::io::AsyncReadExt;
use tracing::debug;

use crate::error::DiagError;
use crate::models::Target;

/// The slice of pod state the pipeline needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodInfo {
    pub name: String,
    pub containers: Vec<String>,
    pub running: bool,
}

/// Captured streams and exit code of one remote command.
#[derive(Debug, Clone, Default)]
pub struct ExecOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub exit_code: i32,
}

/// Minimal cluster operations used by the pipeline.
#[async_trait]
pub trait ClusterClient: Send + Sync {
    /// List pods in a namespace, optionally filtered by label selector.
    /// Order is the cluster listing order.
    async fn list_pods(
        &self,
        namespace: &str,
        label_selector: Option<&str>,
    ) -> Result<Vec<PodInfo>, DiagError>;

    /// Fetch a single pod; `None` if it does not exist.
    async fn get_pod(&self, namespace: &str, name: &str) -> Result<Option<PodInfo>, DiagError>;

    /// Run a command inside the target container and capture its output.
    /// Exactly one attempt; fails if the pod is not running.
    async fn exec(&self, target: &Target, command: &[String]) -> Result<ExecOutput, DiagError>;
}

/// [`ClusterClient`] backed by the Kubernetes API.
pub struct KubeClient {
    client: kube::Client,
}

impl KubeClient {
    pub fn new(client: kube::Client) -> Self {
        Self { client }
    }

    fn pods(&self, namespace: &str) -> Api<Pod> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait]
impl ClusterClient for KubeClient {
    async fn list_pods(
        &self,
        namespace: &str,
        label_selector: Option<&str>,
    ) -> Result<Vec<PodInfo>, DiagError> {
        let mut params = ListParams::default();
        if let Some(selector) = label_selector {
            params = params.labels(selector);
        }

        let pods = self
            .pods(namespace)
            .list(&params)
            .await
            .map_err(|e| DiagError::Cluster(e.to_string()))?;

        Ok(pods.items.iter().map(pod_info).collect())
    }

    async fn get_pod(&self, namespace: &str, name: &str) -> Result<Option<PodInfo>, DiagError> {
        let pod = self
            .pods(namespace)
            .get_opt(name)
            .await
            .map_err(|e| DiagError::Cluster(e.to_string()))?;

        Ok(pod.as_ref().map(pod_info))
    }

    async fn exec(&self, target: &Target, command: &[String]) -> Result<ExecOutput, DiagError> {
        let api = self.pods(&target.namespace);

        // Refuse to attach to a pod that is not running, so the failure is
        // explicit instead of a websocket error from the API server.
        let pod = api
            .get_opt(&target.pod)
            .await
            .map_err(|e| DiagError::Cluster(e.to_string()))?
            .ok_or_else(|| DiagError::TargetNotFound {
                namespace: target.namespace.clone(),
                pod: target.pod.clone(),
            })?;
        if !pod_info(&pod).running {
            return Err(DiagError::Exec {
                target: target.to_string(),
                exit_code: None,
                message: format!("pod '{}' is not in a running phase", target.pod),
            });
        }

        let params = AttachParams::default()
            .container(target.container.as_str())
            .stdin(false)
            .stdout(true)
            .stderr(true);

        let mut attached = api
            .exec(&target.pod, command.to_vec(), &params)
            .await
            .map_err(|e| DiagError::Exec {
                target: target.to_string(),
                exit_code: None,
                message: e.to_string(),
            })?;

        let mut stdout_stream = attached.stdout().ok_or_else(|| DiagError::Exec {
            target: target.to_string(),
            exit_code: None,
            message: "exec channel has no stdout stream".to_string(),
        })?;
        let mut stderr_stream = attached.stderr().ok_or_else(|| DiagError::Exec {
            target: target.to_string(),
            exit_code: None,
            message: "exec channel has no stderr stream".to_string(),
        })?;

        // Thread dumps run to megabytes; the streams are drained
        // incrementally into growable buffers.
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let (out_read, err_read) = tokio::join!(
            stdout_stream.read_to_end(&mut stdout),
            stderr_stream.read_to_end(&mut stderr),
        );
        out_read.map_err(|e| DiagError::Exec {
            target: target.to_string(),
            exit_code: None,
            message: format!("reading exec stdout: {e}"),
        })?;
        err_read.map_err(|e| DiagError::Exec {
            target: target.to_string(),
            exit_code: None,
            message: format!("reading exec stderr: {e}"),
        })?;

        let status = match attached.take_status() {
            Some(status) => status.await,
            None => None,
        };
        let exit_code = exit_code_from_status(status.as_ref());

        if let Err(e) = attached.join().await {
            debug!(error = %e, "exec channel on {target} closed uncleanly");
        }

        Ok(ExecOutput {
            stdout,
            stderr,
            exit_code,
        })
    }
}

fn pod_info(pod: &Pod) -> PodInfo {
    let containers = pod
        .spec
        .as_ref()
        .map(|spec| spec.containers.iter().map(|c| c.name.clone()).collect())
        .unwrap_or_default();
    let running = pod
        .status
        .as_ref()
        .and_then(|status| status.phase.as_deref())
        == Some("Running");

    PodInfo {
        name: pod.metadata.name.clone().unwrap_or_default(),
        containers,
        running,
    }
}

/// Extract the process exit code from the exec status frame.
///
/// A missing frame is treated as success: the API server only omits it
/// when the stream closed after a clean zero-exit run.
fn exit_code_from_status(status: Option<&Status>) -> i32 {
    let Some(status) = status else {
        return 0;
    };
    if status.status.as_deref() == Some("Success") {
        return 0;
    }

    status
        .details
        .as_ref()
        .and_then(|details| details.causes.as_ref())
        .and_then(|causes| {
            causes
                .iter()
                .find(|cause| cause.reason.as_deref() == Some("ExitCode"))
        })
        .and_then(|cause| cause.message.as_deref())
        .and_then(|code| code.parse().ok())
        .unwrap_or(1)
}
