use std::fmt;

use k8s_openapi::api::core::v1::Pod;
use kube::ResourceExt;

/// Identity of a pod: namespace plus name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PodRef {
    pub name: String,
    pub namespace: String,
}

impl From<&Pod> for PodRef {
    fn from(pod: &Pod) -> Self {
        Self {
            name: pod.name_any(),
            namespace: pod.namespace().unwrap_or_default(),
        }
    }
}

impl fmt::Display for PodRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventKind {
    Added,
    /// The previous state of an updated pod.
    Updated,
    /// The current state of an updated pod.
    New,
    Deleted,
}

impl EventKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Added => "Pod added",
            Self::Updated => "Pod updated",
            Self::New => "New Pod",
            Self::Deleted => "Pod deleted",
        }
    }
}

/// One printed line of the pod event stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventLine {
    pub kind: EventKind,
    pub pod: PodRef,
}

impl fmt::Display for EventLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.label(), self.pod)
    }
}

/// A cached pod as shown by `list`.
#[derive(Clone, Debug)]
pub struct PodSummary {
    pub pod: PodRef,
    pub phase: String,
    pub node: String,
}

impl From<&Pod> for PodSummary {
    fn from(pod: &Pod) -> Self {
        let phase = pod
            .status
            .as_ref()
            .and_then(|s| s.phase.clone())
            .unwrap_or_else(|| "Unknown".to_string());
        let node = pod
            .spec
            .as_ref()
            .and_then(|s| s.node_name.clone())
            .unwrap_or_else(|| "<none>".to_string());
        Self {
            pod: PodRef::from(pod),
            phase,
            node,
        }
    }
}
