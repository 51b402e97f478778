// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Manifest rendering without a cluster

use super::model::{apply_body, object_key};
use crate::error::{ProviderError, Result};
use crate::schema::{manifest_schema, Schema};
use crate::types::KindInfo;
use kube::api::DynamicObject;
use kube::Resource;
use serde::Serialize;
use std::marker::PhantomData;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ManifestModel<K> {
    pub id: String,
    pub object: K,
    pub yaml: String,
}

pub struct ManifestDataSource<K = DynamicObject> {
    kind: &'static KindInfo,
    _object: PhantomData<fn() -> K>,
}

impl<K: Resource + Serialize> ManifestDataSource<K> {
    pub fn new(kind: &'static KindInfo) -> Self {
        Self {
            kind,
            _object: PhantomData,
        }
    }

    pub fn type_name(&self) -> String {
        self.kind.manifest_type_name()
    }

    pub fn schema(&self) -> Schema {
        manifest_schema(self.kind)
    }

    /// Render the object as the YAML document that would be applied
    pub fn read(&self, object: K) -> Result<ManifestModel<K>> {
        let key = object_key(self.kind, object.meta())?;
        let body = apply_body(self.kind, &object)?;
        let yaml = serde_yaml::to_string(&body).map_err(|source| ProviderError::YamlMarshalError {
            kind: self.kind.kind().to_string(),
            source,
        })?;

        Ok(ManifestModel {
            id: key.id(),
            object,
            yaml,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::hnc::{HNCConfiguration, HNCConfigurationSpec, ResourceSpec, SyncMode};
    use crate::types::lookup;

    fn source() -> ManifestDataSource<HNCConfiguration> {
        ManifestDataSource::new(lookup("k8s_hnc_x_k8s_io_hnc_configuration_v1alpha2").unwrap())
    }

    #[test]
    fn test_renders_yaml() {
        let config = HNCConfiguration::new(
            "config",
            HNCConfigurationSpec {
                resources: Some(vec![ResourceSpec {
                    group: None,
                    mode: Some(SyncMode::Propagate),
                    resource: "secrets".to_string(),
                }]),
            },
        );

        let manifest = source().read(config).unwrap();

        assert_eq!(manifest.id, "config");
        assert_eq!(
            manifest.yaml,
            "apiVersion: hnc.x-k8s.io/v1alpha2\n\
             kind: HNCConfiguration\n\
             metadata:\n  name: config\n\
             spec:\n  resources:\n  - mode: Propagate\n    resource: secrets\n"
        );
    }

    #[test]
    fn test_manifest_type_name() {
        assert_eq!(source().type_name(), "k8s_hnc_x_k8s_io_hnc_configuration_v1alpha2_manifest");
    }

    #[test]
    fn test_unnamed_manifest_is_rejected() {
        let config = HNCConfiguration {
            metadata: Default::default(),
            spec: HNCConfigurationSpec::default(),
        };
        assert!(matches!(source().read(config), Err(ProviderError::Validation(_))));
    }
}
