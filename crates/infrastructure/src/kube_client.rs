use std::path::PathBuf;

use cfgsweep_core::{AppError, AppResult};
use kube::Client;
use kube::config::{Config, KubeConfigOptions, Kubeconfig};
use tracing::info;

/// How to locate credentials for the cluster.
#[derive(Debug, Clone, Default)]
pub struct KubeConnectOptions {
    /// Explicit kubeconfig path; in-cluster credentials are used when absent.
    pub kubeconfig: Option<PathBuf>,
    /// Context to select from the kubeconfig.
    pub context: Option<String>,
}

/// Builds a shared API client from a kubeconfig file or in-cluster credentials.
pub async fn connect(options: &KubeConnectOptions) -> AppResult<Client> {
    let config = match &options.kubeconfig {
        Some(path) => {
            let kubeconfig = Kubeconfig::read_from(path).map_err(|error| {
                AppError::Configuration(format!(
                    "failed to read kubeconfig '{}': {error}",
                    path.display()
                ))
            })?;
            let config_options = KubeConfigOptions {
                context: options.context.clone(),
                ..KubeConfigOptions::default()
            };

            info!(
                kubeconfig = %path.display(),
                context = options.context.as_deref().unwrap_or("<current>"),
                "using kubeconfig credentials"
            );
            Config::from_custom_kubeconfig(kubeconfig, &config_options)
                .await
                .map_err(|error| {
                    AppError::Configuration(format!(
                        "failed to load kubeconfig '{}': {error}",
                        path.display()
                    ))
                })?
        }
        None => {
            if options.context.is_some() {
                return Err(AppError::Configuration(
                    "a kubeconfig context requires a kubeconfig path".to_owned(),
                ));
            }

            info!("using in-cluster credentials");
            Config::incluster().map_err(|error| {
                AppError::Configuration(format!(
                    "no kubeconfig given and in-cluster credentials are unavailable: {error}"
                ))
            })?
        }
    };

    Client::try_from(config).map_err(|error| {
        AppError::Configuration(format!("failed to build cluster client: {error}"))
    })
}
