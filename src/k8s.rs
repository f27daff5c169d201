use std::ffi::OsString;
use std::path::PathBuf;

use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use tracing::debug;

use crate::error::{Error, Result};

/// Install the rustls crypto provider. Safe to call more than once.
pub fn install_crypto_provider() {
    // Err only means a provider is already installed.
    let _ = rustls::crypto::ring::default_provider().install_default();
}

/// Build the cluster connection configuration.
///
/// With an explicit kubeconfig path the file is read as-is; otherwise the
/// configuration is inferred (in-cluster service account, then `$KUBECONFIG`
/// or `~/.kube/config`).
pub async fn load_config(kubeconfig: Option<PathBuf>, context: Option<String>) -> Result<Config> {
    let options = KubeConfigOptions {
        context,
        ..KubeConfigOptions::default()
    };

    match kubeconfig {
        Some(path) => {
            let kubeconfig = Kubeconfig::read_from(&path).map_err(|source| Error::KubeconfigRead {
                path: path.clone(),
                source,
            })?;
            let config = Config::from_custom_kubeconfig(kubeconfig, &options)
                .await
                .map_err(|source| Error::KubeconfigLoad {
                    path: path.clone(),
                    source,
                })?;
            debug!(path = %path.display(), cluster_url = %config.cluster_url, "loaded kubeconfig");
            Ok(config)
        }
        None if options.context.is_some() => {
            let config = Config::from_kubeconfig(&options)
                .await
                .map_err(|source| Error::KubeconfigLoad {
                    path: default_kubeconfig_path(std::env::var_os("KUBECONFIG")),
                    source,
                })?;
            Ok(config)
        }
        None => Ok(Config::infer().await?),
    }
}

/// The kubeconfig kube reads when no path is given, for error messages.
fn default_kubeconfig_path(env: Option<OsString>) -> PathBuf {
    env.filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("~/.kube/config"))
}

/// Create a typed API client for the cluster.
pub async fn connect(kubeconfig: Option<PathBuf>, context: Option<String>) -> Result<Client> {
    install_crypto_provider();
    let config = load_config(kubeconfig, context).await?;
    Ok(Client::try_from(config)?)
}

/// A client pointing nowhere, for tests that never issue a request.
#[cfg(test)]
pub(crate) fn offline_client() -> Client {
    install_crypto_provider();
    let config = Config::new("http://127.0.0.1:9".parse().unwrap());
    Client::try_from(config).unwrap()
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[tokio::test]
    async fn missing_kubeconfig_names_the_path() {
        let path = PathBuf::from("/nonexistent/kubeconfig");
        let err = load_config(Some(path.clone()), None).await.unwrap_err();

        match &err {
            Error::KubeconfigRead { path: reported, .. } => assert_eq!(reported, &path),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains("/nonexistent/kubeconfig"));
    }

    #[tokio::test]
    async fn malformed_kubeconfig_names_the_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "clusters: [this is: not valid").unwrap();

        let err = load_config(Some(file.path().to_path_buf()), None)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::KubeconfigRead { .. } | Error::KubeconfigLoad { .. }));
        assert!(err.to_string().contains(&file.path().display().to_string()));
    }

    #[test]
    fn default_path_follows_kubeconfig_env() {
        assert_eq!(
            default_kubeconfig_path(Some(OsString::from("/etc/kube/admin.conf"))),
            PathBuf::from("/etc/kube/admin.conf")
        );
        assert_eq!(default_kubeconfig_path(Some(OsString::new())), PathBuf::from("~/.kube/config"));
        assert_eq!(default_kubeconfig_path(None), PathBuf::from("~/.kube/config"));
    }
}
