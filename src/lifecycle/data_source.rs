// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Read-only lookup of an existing object

use super::model::{object_key, stored_object};
use crate::error::{ProviderError, Result};
use crate::kubernetes::DynamicApi;
use crate::provider::ProviderData;
use crate::schema::{data_source_schema, Schema};
use crate::types::KindInfo;
use kube::api::{DynamicObject, ObjectMeta};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use tracing::{debug, instrument};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DataSourceModel<K> {
    pub id: String,
    pub object: K,
}

pub struct DataSourceAdapter<K = DynamicObject> {
    kind: &'static KindInfo,
    api: Option<DynamicApi>,
    _object: PhantomData<fn() -> K>,
}

impl<K: DeserializeOwned> DataSourceAdapter<K> {
    pub fn new(kind: &'static KindInfo) -> Self {
        Self {
            kind,
            api: None,
            _object: PhantomData,
        }
    }

    pub fn type_name(&self) -> &str {
        &self.kind.type_name
    }

    pub fn schema(&self) -> Schema {
        data_source_schema(self.kind)
    }

    pub fn configure(&mut self, data: &ProviderData) -> Result<()> {
        if data.offline {
            return Err(ProviderError::OfflineMode(self.kind.type_name.clone()));
        }
        let client = data.client.clone().ok_or(ProviderError::Unconfigured)?;
        self.api = Some(DynamicApi::new(client, self.kind.resource.clone()));
        Ok(())
    }

    /// Look up the object named by `metadata`. A data source must resolve, so
    /// a missing object is an error.
    #[instrument(skip(self, metadata), fields(type_name = %self.kind.type_name))]
    pub async fn read(&self, metadata: &ObjectMeta) -> Result<DataSourceModel<K>> {
        let api = self.api.as_ref().ok_or(ProviderError::Unconfigured)?;
        let key = object_key(self.kind, metadata)?;

        let live = api.get(&key).await?.ok_or_else(|| ProviderError::NotFound(key.clone()))?;
        debug!("Read {}", key);

        Ok(DataSourceModel {
            id: key.id(),
            object: stored_object(self.kind, live)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{object_with, MockService};
    use crate::types::coordination::Lease;
    use crate::types::lookup;
    use serde_json::json;

    const LEASE: &str = "k8s_coordination_k8s_io_lease_v1";
    const PATH: &str = "/apis/coordination.k8s.io/v1/namespaces/kube-system/leases/scheduler";

    fn metadata(name: &str) -> ObjectMeta {
        ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some("kube-system".to_string()),
            ..Default::default()
        }
    }

    fn adapter(mock: &MockService) -> DataSourceAdapter<Lease> {
        let mut adapter = DataSourceAdapter::new(lookup(LEASE).unwrap());
        adapter
            .configure(&ProviderData {
                client: Some(mock.clone().into_client()),
                offline: false,
                field_manager: "crd-provider".to_string(),
                force_conflicts: false,
            })
            .unwrap();
        adapter
    }

    #[tokio::test]
    async fn test_read_existing_lease() {
        let lease = object_with(
            "coordination.k8s.io/v1",
            "Lease",
            Some("kube-system"),
            "scheduler",
            json!({ "spec": { "holderIdentity": "node-a", "renewTime": "2026-01-02T03:04:05.000000Z" } }),
        );
        let mock = MockService::new().on_get(PATH, 200, &lease.to_string());

        let model = adapter(&mock).read(&metadata("scheduler")).await.unwrap();
        assert_eq!(model.id, "kube-system/scheduler");
        assert_eq!(model.object.spec.holder_identity.as_deref(), Some("node-a"));
    }

    #[tokio::test]
    async fn test_missing_lease_is_an_error() {
        let mock = MockService::new();
        let err = adapter(&mock).read(&metadata("scheduler")).await.unwrap_err();
        assert!(matches!(err, ProviderError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_empty_name_is_rejected_locally() {
        let mock = MockService::new();
        assert!(adapter(&mock).read(&metadata("")).await.is_err());
        assert!(mock.requests().is_empty());
    }

    #[test]
    fn test_offline_configure_fails() {
        let mut adapter: DataSourceAdapter<Lease> = DataSourceAdapter::new(lookup(LEASE).unwrap());
        let err = adapter.configure(&ProviderData::offline()).unwrap_err();
        assert!(matches!(err, ProviderError::OfflineMode(_)));
    }
}
