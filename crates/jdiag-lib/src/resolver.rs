//! Target resolution
//!
//! Turns user selectors (namespace + pod name or label selector, plus an
//! optional container name) into concrete [`Target`]s. A pod whose
//! container cannot be resolved is recorded as failed without blocking
//! the other pods in the run.

use tracing::debug;

use crate::cluster::{ClusterClient, PodInfo};
use crate::error::DiagError;
use crate::models::Target;

/// How pods are selected within the namespace, validated once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    ByPod(String),
    ByLabel(String),
}

impl Selector {
    /// Build a selector from the CLI flags. A pod name takes precedence
    /// over a label; neither is an error, since a bare namespace selects
    /// nothing.
    pub fn from_flags(pod: Option<String>, label: Option<String>) -> Result<Self, DiagError> {
        match (pod, label) {
            (Some(pod), _) => Ok(Selector::ByPod(pod)),
            (None, Some(label)) => Ok(Selector::ByLabel(label)),
            (None, None) => Err(DiagError::AmbiguousSelection),
        }
    }
}

/// Resolution outcome for one selected pod.
#[derive(Debug)]
pub struct PodResolution {
    pub pod: String,
    pub target: Result<Target, DiagError>,
}

/// Resolves selectors into the ordered set of targets to diagnose.
pub struct TargetResolver {
    namespace: String,
    selector: Selector,
    container: Option<String>,
}

impl TargetResolver {
    pub fn new(
        namespace: impl Into<String>,
        selector: Selector,
        container: Option<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            selector,
            container,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Resolve the selector into per-pod outcomes, in cluster listing
    /// order. Errors returned here (listing failure, empty label match)
    /// abort the run; per-pod failures are carried in the outcomes.
    pub async fn resolve(
        &self,
        client: &dyn ClusterClient,
    ) -> Result<Vec<PodResolution>, DiagError> {
        match &self.selector {
            Selector::ByPod(name) => {
                let resolution = match client.get_pod(&self.namespace, name).await? {
                    Some(pod) => self.resolution_for(pod),
                    None => PodResolution {
                        pod: name.clone(),
                        target: Err(DiagError::TargetNotFound {
                            namespace: self.namespace.clone(),
                            pod: name.clone(),
                        }),
                    },
                };
                Ok(vec![resolution])
            }
            Selector::ByLabel(label) => {
                let pods = client.list_pods(&self.namespace, Some(label)).await?;
                if pods.is_empty() {
                    return Err(DiagError::NoMatchingPods {
                        namespace: self.namespace.clone(),
                        label: label.clone(),
                    });
                }
                Ok(pods.into_iter().map(|pod| self.resolution_for(pod)).collect())
            }
        }
    }

    fn resolution_for(&self, pod: PodInfo) -> PodResolution {
        let target = self
            .resolve_container(&pod)
            .map(|container| Target::new(self.namespace.as_str(), pod.name.as_str(), container));
        if let Ok(target) = &target {
            debug!("resolved target {target}");
        }
        PodResolution {
            pod: pod.name,
            target,
        }
    }

    fn resolve_container(&self, pod: &PodInfo) -> Result<String, DiagError> {
        match self.container.as_deref() {
            Some(requested) => {
                if pod.containers.iter().any(|c| c == requested) {
                    Ok(requested.to_string())
                } else {
                    Err(DiagError::ContainerNotFound {
                        pod: pod.name.clone(),
                        container: requested.to_string(),
                    })
                }
            }
            None => match pod.containers.as_slice() {
                [only] => Ok(only.clone()),
                several => Err(DiagError::AmbiguousContainer {
                    pod: pod.name.clone(),
                    count: several.len(),
                }),
            },
        }
    }
}
