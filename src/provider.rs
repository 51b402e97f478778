// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Provider configuration and the registry of resources, data sources and manifests

use crate::config::ProviderConfig;
use crate::constants::DEFAULT_FIELD_MANAGER;
use crate::error::{ProviderError, Result};
use crate::kubernetes::create_client;
use crate::lifecycle::{DataSourceAdapter, ManifestDataSource, ResourceAdapter};
use crate::schema::Schema;
use crate::types::{lookup, lookup_manifest, registry};
use kube::{api::DynamicObject, Client};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{info, instrument};

/// Shared with every adapter once the provider is configured
#[derive(Clone)]
pub struct ProviderData {
    /// Absent in offline mode
    pub client: Option<Client>,
    pub offline: bool,
    pub field_manager: String,
    pub force_conflicts: bool,
}

impl ProviderData {
    pub fn offline() -> Self {
        Self {
            client: None,
            offline: true,
            field_manager: DEFAULT_FIELD_MANAGER.to_string(),
            force_conflicts: false,
        }
    }

    fn from_config(client: Option<Client>, config: &ProviderConfig) -> Self {
        Self {
            client,
            offline: config.offline,
            field_manager: config
                .field_manager
                .clone()
                .unwrap_or_else(|| DEFAULT_FIELD_MANAGER.to_string()),
            force_conflicts: config.force_conflicts.unwrap_or(false),
        }
    }
}

/// Every schema the provider serves, keyed by type name
#[derive(Debug, Serialize)]
pub struct ProviderSchemas {
    pub resources: BTreeMap<String, Schema>,
    pub data_sources: BTreeMap<String, Schema>,
    pub manifests: BTreeMap<String, Schema>,
}

pub struct Provider {
    data: ProviderData,
}

impl Provider {
    /// Configure the provider, connecting to a cluster unless it is offline.
    #[instrument(skip(config), fields(offline = config.offline))]
    pub async fn configure(config: &ProviderConfig) -> Result<Self> {
        if config.offline {
            info!("Running offline, only manifests are available");
            return Ok(Self {
                data: ProviderData::from_config(None, config),
            });
        }

        let client = create_client(config).await?;
        Ok(Self::with_client(client, config))
    }

    /// A provider that never contacts a cluster
    pub fn offline() -> Self {
        Self {
            data: ProviderData::offline(),
        }
    }

    pub fn with_client(client: Client, config: &ProviderConfig) -> Self {
        Self {
            data: ProviderData::from_config(Some(client), config),
        }
    }

    pub fn data(&self) -> &ProviderData {
        &self.data
    }

    /// A configured resource adapter for `type_name`
    pub fn resource(&self, type_name: &str) -> Result<ResourceAdapter> {
        let kind = lookup(type_name).ok_or_else(|| ProviderError::UnknownType(type_name.to_string()))?;
        let mut adapter = ResourceAdapter::new(kind);
        adapter.configure(&self.data)?;
        Ok(adapter)
    }

    /// A configured data source for `type_name`
    pub fn data_source(&self, type_name: &str) -> Result<DataSourceAdapter> {
        let kind = lookup(type_name).ok_or_else(|| ProviderError::UnknownType(type_name.to_string()))?;
        let mut adapter = DataSourceAdapter::new(kind);
        adapter.configure(&self.data)?;
        Ok(adapter)
    }

    /// The manifest data source for `<type>_manifest`. Works offline.
    pub fn manifest(&self, type_name: &str) -> Result<ManifestDataSource> {
        lookup_manifest(type_name)
            .map(ManifestDataSource::new)
            .ok_or_else(|| ProviderError::UnknownType(type_name.to_string()))
    }

    pub fn schemas() -> ProviderSchemas {
        let mut schemas = ProviderSchemas {
            resources: BTreeMap::new(),
            data_sources: BTreeMap::new(),
            manifests: BTreeMap::new(),
        };

        for kind in registry() {
            let resource = ResourceAdapter::<DynamicObject>::new(kind);
            let data_source = DataSourceAdapter::<DynamicObject>::new(kind);
            let manifest = ManifestDataSource::<DynamicObject>::new(kind);

            schemas
                .resources
                .insert(resource.type_name().to_string(), resource.schema());
            schemas
                .data_sources
                .insert(data_source.type_name().to_string(), data_source.schema());
            schemas.manifests.insert(manifest.type_name(), manifest.schema());
        }
        schemas
    }
}
