//! Watch Kubernetes objects through shared informers.

pub mod error;
pub mod informer;
pub mod k8s;
pub mod logging;
pub mod models;
pub mod printer;
