// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Cluster client creation from provider configuration

use crate::config::ProviderConfig;
use crate::error::{ProviderError, Result};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config as KConfig};
use std::path::Path;
use tracing::{debug, info, instrument};

/// Create a Kubernetes client as described by the provider configuration.
///
/// An explicit kubeconfig path (and optional context) wins; otherwise the
/// client configuration is inferred from `KUBECONFIG`, `~/.kube/config` or
/// the in-cluster service account.
#[instrument(skip(config), fields(kubeconfig = ?config.kubeconfig, context = ?config.context))]
pub async fn create_client(config: &ProviderConfig) -> Result<Client> {
    let client_config = match &config.kubeconfig {
        Some(path) => load_kubeconfig(path, config.context.clone()).await?,
        None if config.context.is_some() => {
            let kubeconfig = Kubeconfig::read().map_err(|e| {
                ProviderError::KubeconfigError(format!("Failed to read kubeconfig: {}", e))
            })?;
            from_kubeconfig(kubeconfig, config.context.clone()).await?
        }
        None => {
            debug!("No kubeconfig configured, inferring client configuration");
            KConfig::infer().await.map_err(|e| {
                ProviderError::KubeconfigError(format!("Failed to infer config: {}", e))
            })?
        }
    };

    info!("Using cluster {}", client_config.cluster_url);

    Client::try_from(client_config)
        .map_err(|e| ProviderError::KubeconfigError(format!("Failed to create client: {}", e)))
}

async fn load_kubeconfig(path: &Path, context: Option<String>) -> Result<KConfig> {
    let kubeconfig = Kubeconfig::read_from(path).map_err(|e| {
        ProviderError::KubeconfigError(format!(
            "Failed to read kubeconfig {}: {}",
            path.display(),
            e
        ))
    })?;
    from_kubeconfig(kubeconfig, context).await
}

async fn from_kubeconfig(kubeconfig: Kubeconfig, context: Option<String>) -> Result<KConfig> {
    let options = KubeConfigOptions {
        context,
        ..Default::default()
    };

    KConfig::from_custom_kubeconfig(kubeconfig, &options)
        .await
        .map_err(|e| ProviderError::KubeconfigError(format!("Failed to create config: {}", e)))
}
