// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Models handed to the lifecycle adapters and the JSON shaping shared by them

use crate::constants::wait;
use crate::error::{Diagnostic, ProviderError, Result};
use crate::kubernetes::ObjectKey;
use crate::schema::validators::{
    validate_annotations, validate_label, validate_length_at_least, validate_name,
    validate_namespace,
};
use crate::types::KindInfo;
use kube::api::{ObjectMeta, PropagationPolicy};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Metadata fields kept from the server's copy of an object
const KEPT_METADATA: &[&str] = &["name", "namespace", "labels", "annotations"];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeletionPropagation {
    Orphan,
    Background,
    Foreground,
}

impl From<DeletionPropagation> for PropagationPolicy {
    fn from(value: DeletionPropagation) -> Self {
        match value {
            DeletionPropagation::Orphan => PropagationPolicy::Orphan,
            DeletionPropagation::Background => PropagationPolicy::Background,
            DeletionPropagation::Foreground => PropagationPolicy::Foreground,
        }
    }
}

fn upsert_timeout() -> u64 {
    wait::UPSERT_TIMEOUT_SECS
}

fn delete_timeout() -> u64 {
    wait::DELETE_TIMEOUT_SECS
}

fn poll_interval() -> u64 {
    wait::POLL_INTERVAL_SECS
}

/// A condition to reach after apply. Durations are whole seconds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitForUpsert {
    pub jsonpath: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default = "upsert_timeout")]
    pub timeout: u64,
    #[serde(default = "poll_interval")]
    pub poll_interval: u64,
}

impl WaitForUpsert {
    pub fn new(jsonpath: impl Into<String>, value: Option<&str>) -> Self {
        Self {
            jsonpath: jsonpath.into(),
            value: value.map(str::to_string),
            timeout: wait::UPSERT_TIMEOUT_SECS,
            poll_interval: wait::POLL_INTERVAL_SECS,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitForDelete {
    #[serde(default = "delete_timeout")]
    pub timeout: u64,
    #[serde(default = "poll_interval")]
    pub poll_interval: u64,
}

impl Default for WaitForDelete {
    fn default() -> Self {
        Self {
            timeout: wait::DELETE_TIMEOUT_SECS,
            poll_interval: wait::POLL_INTERVAL_SECS,
        }
    }
}

/// Per-instance settings that steer apply, delete and waiting
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_manager: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub force_conflicts: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deletion_propagation: Option<DeletionPropagation>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub wait_for_upsert: Vec<WaitForUpsert>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wait_for_delete: Option<WaitForDelete>,
}

impl LifecycleOptions {
    /// Pick the lifecycle attributes out of a configuration object; other keys are ignored.
    pub fn from_config(config: &Value) -> Result<Self> {
        serde_json::from_value(config.clone()).map_err(|source| ProviderError::JsonUnmarshalError {
            kind: "lifecycle options".to_string(),
            source,
        })
    }
}

/// Managed object plus the settings that drive its lifecycle
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResourceModel<K> {
    /// `namespace/name` or `name`, set on create and import
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(flatten)]
    pub lifecycle: LifecycleOptions,
    pub object: K,
}

impl<K> ResourceModel<K> {
    pub fn new(object: K) -> Self {
        Self {
            id: None,
            lifecycle: LifecycleOptions::default(),
            object,
        }
    }

    pub fn with_lifecycle(mut self, lifecycle: LifecycleOptions) -> Self {
        self.lifecycle = lifecycle;
        self
    }
}

/// Where a managed instance is in its lifecycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InstanceState {
    Unmanaged,
    Applying,
    Ready,
    /// Applied, but a wait condition was not reached in time
    TimedOut,
    Failed,
    Deleting,
    Deleted,
}

impl fmt::Display for InstanceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InstanceState::Unmanaged => "unmanaged",
            InstanceState::Applying => "applying",
            InstanceState::Ready => "ready",
            InstanceState::TimedOut => "timed out",
            InstanceState::Failed => "failed",
            InstanceState::Deleting => "deleting",
            InstanceState::Deleted => "deleted",
        };
        f.write_str(s)
    }
}

fn required(path: &str, name: &str) -> Diagnostic {
    Diagnostic::error(
        "Missing required argument",
        format!("attribute \"{}\" is required", name),
    )
    .at(path)
}

/// Validate the identifying metadata of an object and build its key.
///
/// Nothing is sent to the cluster for an object that fails here.
pub fn object_key(kind: &KindInfo, meta: &ObjectMeta) -> Result<ObjectKey> {
    let mut diagnostics = Vec::new();

    match meta.name.as_deref() {
        None => diagnostics.push(required("metadata.name", "name")),
        Some("") => diagnostics.extend(validate_length_at_least("metadata.name", "", 1)),
        Some(name) => diagnostics.extend(validate_name("metadata.name", name)),
    }

    match (kind.namespaced, meta.namespace.as_deref()) {
        (true, None) => diagnostics.push(required("metadata.namespace", "namespace")),
        (true, Some("")) => {
            diagnostics.extend(validate_length_at_least("metadata.namespace", "", 1))
        }
        (true, Some(ns)) => diagnostics.extend(validate_namespace("metadata.namespace", ns)),
        (false, Some(_)) => diagnostics.push(
            Diagnostic::error(
                "Unsupported argument",
                format!("{} is cluster-scoped and has no namespace", kind.kind()),
            )
            .at("metadata.namespace"),
        ),
        (false, None) => {}
    }

    for (key, value) in meta.labels.iter().flatten() {
        diagnostics.extend(validate_label("metadata.labels", key, value));
    }
    if let Some(annotations) = &meta.annotations {
        let pairs: Vec<(&str, &str)> = annotations
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        diagnostics.extend(validate_annotations("metadata.annotations", &pairs));
    }

    if !diagnostics.is_empty() {
        return Err(ProviderError::Validation(diagnostics));
    }

    let name = meta.name.as_deref().unwrap_or_default();
    Ok(kind.key(meta.namespace.as_deref(), name))
}

/// Parse an import id: `namespace/name` for namespaced kinds, `name` otherwise
pub fn parse_import_id(kind: &KindInfo, id: &str) -> Result<ObjectKey> {
    let invalid = |expected| ProviderError::InvalidImportId {
        id: id.to_string(),
        expected,
    };

    let (namespace, name) = if kind.namespaced {
        match id.split('/').collect::<Vec<_>>().as_slice() {
            [ns, name] if !ns.is_empty() && !name.is_empty() => (Some(*ns), *name),
            _ => return Err(invalid("'namespace/name'")),
        }
    } else if id.is_empty() || id.contains('/') {
        return Err(invalid("'name'"));
    } else {
        (None, id)
    };

    let meta = ObjectMeta {
        name: Some(name.to_string()),
        namespace: namespace.map(str::to_string),
        ..Default::default()
    };
    object_key(kind, &meta)
}

/// Server-side apply body: typed model with `apiVersion`/`kind` stamped and
/// only user-owned metadata, without nulls
pub fn apply_body<K: Serialize>(kind: &KindInfo, object: &K) -> Result<Value> {
    let mut value = serde_json::to_value(object).map_err(|source| ProviderError::JsonMarshalError {
        kind: kind.kind().to_string(),
        source,
    })?;

    if let Some(map) = value.as_object_mut() {
        map.insert("apiVersion".to_string(), kind.api_version().into());
        map.insert("kind".to_string(), kind.kind().into());
        shape(map);
    }
    prune_nulls(&mut value);
    Ok(value)
}

/// Turn an object returned by the server into the model's object type,
/// keeping the authoritative metadata and spec and dropping status.
pub fn stored_object<K: DeserializeOwned>(kind: &KindInfo, mut value: Value) -> Result<K> {
    if let Some(map) = value.as_object_mut() {
        shape(map);
    }
    serde_json::from_value(value).map_err(|source| ProviderError::JsonUnmarshalError {
        kind: kind.kind().to_string(),
        source,
    })
}

fn shape(object: &mut Map<String, Value>) {
    object.remove("status");
    if let Some(Value::Object(metadata)) = object.get_mut("metadata") {
        metadata.retain(|k, _| KEPT_METADATA.contains(&k.as_str()));
    }
}

pub(crate) fn prune_nulls(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|_, v| !v.is_null());
            map.values_mut().for_each(prune_nulls);
        }
        Value::Array(items) => items.iter_mut().for_each(prune_nulls),
        _ => {}
    }
}
