use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while connecting to the cluster or preparing a watch.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to read kubeconfig file {}: {source}", path.display())]
    KubeconfigRead {
        path: PathBuf,
        #[source]
        source: kube::config::KubeconfigError,
    },
    #[error("Failed to create config from kubeconfig {}: {source}", path.display())]
    KubeconfigLoad {
        path: PathBuf,
        #[source]
        source: kube::config::KubeconfigError,
    },
    #[error("Failed to infer cluster configuration: {0}")]
    InferConfig(#[from] kube::config::InferConfigError),
    #[error("Failed to create Kubernetes client: {0}")]
    Client(#[from] kube::Error),
    #[error("Invalid pod filter {pattern:?}: {source}")]
    InvalidFilter {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
