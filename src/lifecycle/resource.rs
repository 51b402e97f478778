// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Generic lifecycle of a managed object: apply, read, delete and import

use super::model::{
    apply_body, object_key, parse_import_id, stored_object, InstanceState, LifecycleOptions,
    ResourceModel,
};
use super::wait::{wait_for_delete, wait_for_upsert, Condition};
use crate::error::{Diagnostic, ProviderError, Result};
use crate::kubernetes::{DynamicApi, ObjectKey};
use crate::provider::ProviderData;
use crate::schema::{resource_schema, Schema};
use crate::types::KindInfo;
use kube::api::{DynamicObject, PatchParams};
use kube::Resource;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;
use std::marker::PhantomData;
use tracing::{debug, info, instrument, warn};

/// Outcome of a create or update
#[derive(Clone, Debug)]
pub struct Applied<K> {
    pub model: ResourceModel<K>,
    pub state: InstanceState,
    /// Non-fatal problems, such as a wait condition that timed out
    pub warnings: Vec<Diagnostic>,
}

/// Adapter for one kind. `K` is the typed model, or `DynamicObject` when the
/// object is only known as JSON.
pub struct ResourceAdapter<K = DynamicObject> {
    kind: &'static KindInfo,
    api: Option<DynamicApi>,
    field_manager: String,
    force_conflicts: bool,
    _object: PhantomData<fn() -> K>,
}

impl<K> ResourceAdapter<K>
where
    K: Resource + Serialize + DeserializeOwned + Clone + Debug,
{
    pub fn new(kind: &'static KindInfo) -> Self {
        Self {
            kind,
            api: None,
            field_manager: String::new(),
            force_conflicts: false,
            _object: PhantomData,
        }
    }

    pub fn type_name(&self) -> &str {
        &self.kind.type_name
    }

    pub fn schema(&self) -> Schema {
        resource_schema(self.kind)
    }

    /// Take the shared client and defaults. Offline providers cannot manage objects.
    pub fn configure(&mut self, data: &ProviderData) -> Result<()> {
        if data.offline {
            return Err(ProviderError::OfflineMode(self.kind.type_name.clone()));
        }
        let client = data.client.clone().ok_or(ProviderError::Unconfigured)?;

        self.api = Some(DynamicApi::new(client, self.kind.resource.clone()));
        self.field_manager = data.field_manager.clone();
        self.force_conflicts = data.force_conflicts;
        Ok(())
    }

    fn api(&self) -> Result<&DynamicApi> {
        self.api.as_ref().ok_or(ProviderError::Unconfigured)
    }

    fn patch_params(&self, lifecycle: &LifecycleOptions) -> PatchParams {
        let manager = lifecycle
            .field_manager
            .as_deref()
            .unwrap_or(&self.field_manager);
        let params = PatchParams::apply(manager).validation_strict();
        if lifecycle.force_conflicts.unwrap_or(self.force_conflicts) {
            params.force()
        } else {
            params
        }
    }

    #[instrument(skip(self, model), fields(type_name = %self.kind.type_name))]
    pub async fn create(&self, model: ResourceModel<K>) -> Result<Applied<K>> {
        let mut applied = self.apply(model).await?;
        applied.model.id = Some(object_key(self.kind, applied.model.object.meta())?.id());
        Ok(applied)
    }

    #[instrument(skip(self, model), fields(type_name = %self.kind.type_name))]
    pub async fn update(&self, model: ResourceModel<K>) -> Result<Applied<K>> {
        self.apply(model).await
    }

    async fn apply(&self, model: ResourceModel<K>) -> Result<Applied<K>> {
        let api = self.api()?;
        let key = object_key(self.kind, model.object.meta())?;
        let conditions = model
            .lifecycle
            .wait_for_upsert
            .iter()
            .map(Condition::compile)
            .collect::<Result<Vec<_>>>()?;
        let body = apply_body(self.kind, &model.object)?;
        let params = self.patch_params(&model.lifecycle);

        transition(&key, InstanceState::Unmanaged, InstanceState::Applying);
        let applied = match api.apply(&key, &body, &params).await {
            Ok(applied) => applied,
            Err(e) => {
                transition(&key, InstanceState::Applying, InstanceState::Failed);
                return Err(e);
            }
        };
        let object: K = stored_object(self.kind, applied)?;

        let mut warnings = Vec::new();
        let state = match wait_for_upsert(api, &key, &conditions).await {
            Ok(()) => InstanceState::Ready,
            Err(e) if e.is_wait_timeout() => {
                warn!("{}", e);
                warnings.extend(e.diagnostics());
                InstanceState::TimedOut
            }
            Err(e) => {
                transition(&key, InstanceState::Applying, InstanceState::Failed);
                return Err(e);
            }
        };
        transition(&key, InstanceState::Applying, state);

        Ok(Applied {
            model: ResourceModel {
                id: model.id,
                lifecycle: model.lifecycle,
                object,
            },
            state,
            warnings,
        })
    }

    /// Refresh the model from the cluster. `None` means the object is gone
    /// and should be dropped from state.
    #[instrument(skip(self, model), fields(type_name = %self.kind.type_name))]
    pub async fn read(&self, model: &ResourceModel<K>) -> Result<Option<ResourceModel<K>>> {
        let key = object_key(self.kind, model.object.meta())?;
        self.read_key(&key, model.lifecycle.clone()).await
    }

    async fn read_key(
        &self,
        key: &ObjectKey,
        lifecycle: LifecycleOptions,
    ) -> Result<Option<ResourceModel<K>>> {
        let Some(live) = self.api()?.get(key).await? else {
            info!("{} no longer exists, removing it from state", key);
            return Ok(None);
        };

        Ok(Some(ResourceModel {
            id: Some(key.id()),
            lifecycle,
            object: stored_object(self.kind, live)?,
        }))
    }

    #[instrument(skip(self, model), fields(type_name = %self.kind.type_name))]
    pub async fn delete(&self, model: &ResourceModel<K>) -> Result<()> {
        let api = self.api()?;
        let key = object_key(self.kind, model.object.meta())?;
        let propagation = model.lifecycle.deletion_propagation.map(Into::into);

        transition(&key, InstanceState::Ready, InstanceState::Deleting);
        let existed = match api.delete(&key, propagation).await {
            Ok(existed) => existed,
            Err(e) => {
                transition(&key, InstanceState::Deleting, InstanceState::Failed);
                return Err(e);
            }
        };

        if let (true, Some(wait)) = (existed, &model.lifecycle.wait_for_delete) {
            if let Err(e) = wait_for_delete(api, &key, wait).await {
                let state = if e.is_wait_timeout() {
                    InstanceState::TimedOut
                } else {
                    InstanceState::Failed
                };
                transition(&key, InstanceState::Deleting, state);
                return Err(e);
            }
        }
        transition(&key, InstanceState::Deleting, InstanceState::Deleted);
        Ok(())
    }

    /// Adopt an existing object by id
    #[instrument(skip(self), fields(type_name = %self.kind.type_name))]
    pub async fn import(&self, id: &str) -> Result<ResourceModel<K>> {
        let key = parse_import_id(self.kind, id)?;
        self.read_key(&key, LifecycleOptions::default())
            .await?
            .ok_or(ProviderError::ImportNotFound(key))
    }
}

fn transition(key: &ObjectKey, from: InstanceState, to: InstanceState) {
    match to {
        InstanceState::Failed | InstanceState::TimedOut => warn!("{}: {} -> {}", key, from, to),
        InstanceState::Ready | InstanceState::Deleted => info!("{}: {} -> {}", key, from, to),
        _ => debug!("{}: {} -> {}", key, from, to),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::model::{DeletionPropagation, WaitForDelete, WaitForUpsert};
    use crate::test_utils::{object_with, status_json, MockService};
    use crate::types::gatekeeper::{ExternalDataProvider, ProviderSpec};
    use crate::types::lookup;
    use crate::types::s3::{Bucket, BucketSpec};
    use kube::Client;
    use serde_json::json;

    const BUCKET: &str = "k8s_s3_services_k8s_aws_bucket_v1alpha1";
    const PATH: &str = "/apis/s3.services.k8s.aws/v1alpha1/namespaces/team-a/buckets/logs";
    const PROVIDER_PATH: &str = "/apis/externaldata.gatekeeper.sh/v1beta1/providers/inventory";

    fn data(client: Client) -> ProviderData {
        ProviderData {
            client: Some(client),
            offline: false,
            field_manager: "crd-provider".to_string(),
            force_conflicts: false,
        }
    }

    fn adapter<K>(type_name: &str, mock: &MockService) -> ResourceAdapter<K>
    where
        K: Resource + Serialize + DeserializeOwned + Clone + Debug,
    {
        let mut adapter = ResourceAdapter::new(lookup(type_name).unwrap());
        adapter.configure(&data(mock.clone().into_client())).unwrap();
        adapter
    }

    fn bucket(name: &str) -> ResourceModel<Bucket> {
        let mut bucket = Bucket::new(
            name,
            BucketSpec {
                name: name.to_string(),
                ..Default::default()
            },
        );
        bucket.metadata.namespace = Some("team-a".to_string());
        ResourceModel::new(bucket)
    }

    fn server_bucket(extra: serde_json::Value) -> String {
        object_with("s3.services.k8s.aws/v1alpha1", "Bucket", Some("team-a"), "logs", extra).to_string()
    }

    #[tokio::test]
    async fn test_create_applies_and_stamps_id() {
        let response = server_bucket(json!({
            "spec": { "name": "logs", "acl": "private" },
            "status": { "conditions": [] },
        }));
        let mock = MockService::new().on_patch(PATH, 200, &response);
        let adapter: ResourceAdapter<Bucket> = adapter(BUCKET, &mock);

        let applied = adapter.create(bucket("logs")).await.unwrap();

        assert_eq!(applied.state, InstanceState::Ready);
        assert!(applied.warnings.is_empty());
        assert_eq!(applied.model.id.as_deref(), Some("team-a/logs"));
        assert_eq!(applied.model.object.spec.acl.as_deref(), Some("private"));
        assert_eq!(applied.model.object.metadata.uid, None);

        let requests = mock.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, "PATCH");
        assert!(requests[0].query.contains("fieldManager=crd-provider"));
        assert!(requests[0].query.contains("fieldValidation=Strict"));
        assert!(!requests[0].query.contains("force=true"));
        let body: serde_json::Value = serde_json::from_str(&requests[0].body).unwrap();
        assert_eq!(body["apiVersion"], "s3.services.k8s.aws/v1alpha1");
        assert_eq!(body["kind"], "Bucket");
    }

    #[tokio::test]
    async fn test_instance_settings_override_provider_defaults() {
        let mock = MockService::new().on_patch(PATH, 200, &server_bucket(json!({ "spec": { "name": "logs" } })));
        let adapter: ResourceAdapter<Bucket> = adapter(BUCKET, &mock);
        let model = bucket("logs").with_lifecycle(LifecycleOptions {
            field_manager: Some("platform".to_string()),
            force_conflicts: Some(true),
            ..Default::default()
        });

        adapter.update(model).await.unwrap();

        let query = &mock.requests()[0].query;
        assert!(query.contains("fieldManager=platform"));
        assert!(query.contains("force=true"));
    }

    #[tokio::test]
    async fn test_update_keeps_id_unset() {
        let mock = MockService::new().on_patch(PATH, 200, &server_bucket(json!({ "spec": { "name": "logs" } })));
        let adapter: ResourceAdapter<Bucket> = adapter(BUCKET, &mock);

        let applied = adapter.update(bucket("logs")).await.unwrap();
        assert_eq!(applied.model.id, None);
    }

    #[tokio::test]
    async fn test_invalid_metadata_never_reaches_cluster() {
        let mock = MockService::new();
        let adapter: ResourceAdapter<Bucket> = adapter(BUCKET, &mock);

        let mut unnamed = bucket("logs");
        unnamed.object.metadata.name = None;
        let err = adapter.create(unnamed).await.unwrap_err();
        assert_eq!(err.diagnostics()[0].detail, "attribute \"name\" is required");

        let err = adapter.create(bucket("")).await.unwrap_err();
        assert_eq!(err.diagnostics()[0].summary, "Invalid Attribute Value Length");

        assert!(mock.requests().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_jsonpath_fails_before_patch() {
        let mock = MockService::new();
        let adapter: ResourceAdapter<Bucket> = adapter(BUCKET, &mock);
        let model = bucket("logs").with_lifecycle(LifecycleOptions {
            wait_for_upsert: vec![WaitForUpsert::new("{.status[}", None)],
            ..Default::default()
        });

        let err = adapter.create(model).await.unwrap_err();
        assert!(matches!(err, ProviderError::InvalidJsonPath { .. }));
        assert!(mock.requests().is_empty());
    }

    #[tokio::test]
    async fn test_patch_failure_is_reported() {
        let mock = MockService::new().on_patch(PATH, 422, &status_json(422, "Invalid", "spec.name: Required"));
        let adapter: ResourceAdapter<Bucket> = adapter(BUCKET, &mock);

        let err = adapter.create(bucket("logs")).await.unwrap_err();
        assert!(matches!(err, ProviderError::PatchError { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_timeout_is_a_warning() {
        let response = server_bucket(json!({ "spec": { "name": "logs" } }));
        let mock = MockService::new()
            .on_patch(PATH, 200, &response)
            .on_get(PATH, 200, &response);
        let adapter: ResourceAdapter<Bucket> = adapter(BUCKET, &mock);
        let model = bucket("logs").with_lifecycle(LifecycleOptions {
            wait_for_upsert: vec![WaitForUpsert {
                timeout: 2,
                poll_interval: 1,
                ..WaitForUpsert::new("{.status.ackResourceMetadata.arn}", None)
            }],
            ..Default::default()
        });

        let applied = adapter.create(model).await.unwrap();

        assert_eq!(applied.state, InstanceState::TimedOut);
        assert_eq!(applied.warnings.len(), 1);
        assert_eq!(applied.warnings[0].summary, "Wait timeout exceeded");
        assert_eq!(applied.model.id.as_deref(), Some("team-a/logs"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_upsert_succeeds() {
        let response = server_bucket(json!({ "spec": { "name": "logs" } }));
        let ready = server_bucket(json!({
            "spec": { "name": "logs" },
            "status": { "conditions": [ { "type": "ACK.ResourceSynced", "status": "True" } ] },
        }));
        let mock = MockService::new()
            .on_patch(PATH, 200, &response)
            .on_get(PATH, 200, &response)
            .on_get(PATH, 200, &ready);
        let adapter: ResourceAdapter<Bucket> = adapter(BUCKET, &mock);
        let model = bucket("logs").with_lifecycle(LifecycleOptions {
            wait_for_upsert: vec![WaitForUpsert::new(
                "{.status.conditions[?(@.type=='ACK.ResourceSynced')].status}",
                Some("True"),
            )],
            ..Default::default()
        });

        let applied = adapter.create(model).await.unwrap();
        assert_eq!(applied.state, InstanceState::Ready);
        assert_eq!(mock.count("GET", PATH), 2);
    }

    #[tokio::test]
    async fn test_read_missing_object_is_none() {
        let mock = MockService::new();
        let adapter: ResourceAdapter<Bucket> = adapter(BUCKET, &mock);
        assert!(adapter.read(&bucket("logs")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_read_refreshes_from_cluster() {
        let mock = MockService::new().on_get(
            PATH,
            200,
            &server_bucket(json!({ "spec": { "name": "logs", "acl": "public-read" } })),
        );
        let adapter: ResourceAdapter<Bucket> = adapter(BUCKET, &mock);

        let model = adapter.read(&bucket("logs")).await.unwrap().unwrap();
        assert_eq!(model.object.spec.acl.as_deref(), Some("public-read"));
        assert_eq!(model.id.as_deref(), Some("team-a/logs"));
    }

    #[tokio::test]
    async fn test_read_server_error() {
        let mock = MockService::new().on_get(PATH, 403, &status_json(403, "Forbidden", "denied"));
        let adapter: ResourceAdapter<Bucket> = adapter(BUCKET, &mock);
        let err = adapter.read(&bucket("logs")).await.unwrap_err();
        assert!(matches!(err, ProviderError::GetResourceError { .. }));
    }

    #[tokio::test]
    async fn test_delete_not_found_succeeds() {
        let mock = MockService::new();
        let adapter: ResourceAdapter<Bucket> = adapter(BUCKET, &mock);
        let model = bucket("logs").with_lifecycle(LifecycleOptions {
            wait_for_delete: Some(WaitForDelete::default()),
            ..Default::default()
        });

        adapter.delete(&model).await.unwrap();
        assert_eq!(mock.count("DELETE", PATH), 1);
        assert_eq!(mock.count("GET", PATH), 0);
    }

    #[tokio::test]
    async fn test_delete_with_zero_timeout_checks_once() {
        let mock = MockService::new()
            .on_delete(PATH, 200, &status_json(200, "", "deleted"))
            .on_get(PATH, 200, &server_bucket(json!({ "spec": { "name": "logs" } })));
        let adapter: ResourceAdapter<Bucket> = adapter(BUCKET, &mock);
        let model = bucket("logs").with_lifecycle(LifecycleOptions {
            deletion_propagation: Some(DeletionPropagation::Background),
            wait_for_delete: Some(WaitForDelete { timeout: 0, poll_interval: 5 }),
            ..Default::default()
        });

        adapter.delete(&model).await.unwrap();
        assert_eq!(mock.count("GET", PATH), 1);
        assert!(mock.requests()[0].body.contains("\"propagationPolicy\":\"Background\""));
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_wait_timeout_is_returned() {
        let mock = MockService::new()
            .on_delete(PATH, 200, &status_json(200, "", "deleted"))
            .on_get(PATH, 200, &server_bucket(json!({ "spec": { "name": "logs" } })));
        let adapter: ResourceAdapter<Bucket> = adapter(BUCKET, &mock);
        let model = bucket("logs").with_lifecycle(LifecycleOptions {
            wait_for_delete: Some(WaitForDelete { timeout: 2, poll_interval: 1 }),
            ..Default::default()
        });

        let err = adapter.delete(&model).await.unwrap_err();
        assert!(err.is_wait_timeout());
        assert_eq!(mock.count("GET", PATH), 3);
    }

    #[tokio::test]
    async fn test_import_rejects_invalid_names() {
        let mock = MockService::new();
        let adapter: ResourceAdapter<Bucket> = adapter(BUCKET, &mock);

        let err = adapter.import("team-a/Bad Name").await.unwrap_err();
        assert!(matches!(err, ProviderError::Validation(_)));
        assert!(mock.requests().is_empty());
    }

    #[tokio::test]
    async fn test_delete_failure_is_reported() {
        let mock = MockService::new().on_delete(PATH, 500, &status_json(500, "InternalError", "boom"));
        let adapter: ResourceAdapter<Bucket> = adapter(BUCKET, &mock);
        let err = adapter.delete(&bucket("logs")).await.unwrap_err();
        assert!(matches!(err, ProviderError::DeleteError { .. }));
    }

    #[tokio::test]
    async fn test_import_cluster_scoped() {
        let response = object_with(
            "externaldata.gatekeeper.sh/v1beta1",
            "Provider",
            None,
            "inventory",
            json!({ "spec": { "url": "https://inventory.svc", "timeout": 3 } }),
        );
        let mock = MockService::new().on_get(PROVIDER_PATH, 200, &response.to_string());
        let adapter: ResourceAdapter<ExternalDataProvider> =
            adapter("k8s_externaldata_gatekeeper_sh_provider_v1beta1", &mock);

        let model = adapter.import("inventory").await.unwrap();
        assert_eq!(model.id.as_deref(), Some("inventory"));
        assert_eq!(
            model.object.spec,
            ProviderSpec {
                url: Some("https://inventory.svc".to_string()),
                timeout: Some(3),
                ca_bundle: None,
            }
        );
    }

    #[tokio::test]
    async fn test_import_errors() {
        let mock = MockService::new();
        let adapter: ResourceAdapter<Bucket> = adapter(BUCKET, &mock);

        let err = adapter.import("logs").await.unwrap_err();
        assert!(matches!(err, ProviderError::InvalidImportId { .. }));
        assert!(mock.requests().is_empty());

        let err = adapter.import("team-a/logs").await.unwrap_err();
        assert!(matches!(err, ProviderError::ImportNotFound(ref key) if key.id() == "team-a/logs"));
    }

    #[tokio::test]
    async fn test_dynamic_object_model() {
        let response = server_bucket(json!({ "spec": { "name": "logs" } }));
        let mock = MockService::new().on_patch(PATH, 200, &response);
        let adapter: ResourceAdapter = adapter(BUCKET, &mock);
        let kind = lookup(BUCKET).unwrap();

        let mut object = DynamicObject::new("logs", &kind.resource).within("team-a");
        object.data = json!({ "spec": { "name": "logs" } });

        let applied = adapter.create(ResourceModel::new(object)).await.unwrap();
        assert_eq!(applied.model.id.as_deref(), Some("team-a/logs"));
        assert_eq!(applied.model.object.data["spec"]["name"], "logs");
    }

    #[test]
    fn test_configure_offline_fails() {
        let mut adapter: ResourceAdapter<Bucket> = ResourceAdapter::new(lookup(BUCKET).unwrap());
        let err = adapter.configure(&ProviderData::offline()).unwrap_err();
        assert!(matches!(err, ProviderError::OfflineMode(ref t) if t == BUCKET));
    }

    #[tokio::test]
    async fn test_unconfigured_adapter_fails() {
        let adapter: ResourceAdapter<Bucket> = ResourceAdapter::new(lookup(BUCKET).unwrap());
        let err = adapter.create(bucket("logs")).await.unwrap_err();
        assert!(matches!(err, ProviderError::Unconfigured));
    }
}
