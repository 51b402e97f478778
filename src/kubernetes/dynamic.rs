// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Untyped access to any registered kind through `Api<DynamicObject>`

use crate::error::{ProviderError, Result};
use kube::{
    api::{ApiResource, DeleteParams, DynamicObject, Patch, PatchParams, PropagationPolicy},
    Api, Client,
};
use serde_json::Value;
use std::fmt;
use tracing::{debug, instrument};

/// Identity of a single object: kind plus namespace/name
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectKey {
    pub kind: String,
    pub namespace: Option<String>,
    pub name: String,
}

impl ObjectKey {
    pub fn new(kind: &str, namespace: Option<&str>, name: &str) -> Self {
        Self {
            kind: kind.to_string(),
            namespace: namespace.map(str::to_string),
            name: name.to_string(),
        }
    }

    /// State id: `namespace/name` for namespaced objects, `name` otherwise
    pub fn id(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{}/{}", ns, self.name),
            None => self.name.clone(),
        }
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.id())
    }
}

pub fn is_not_found(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(e) if e.code == 404)
}

/// Get/apply/delete against one group-version-resource
#[derive(Clone)]
pub struct DynamicApi {
    client: Client,
    resource: ApiResource,
}

impl DynamicApi {
    pub fn new(client: Client, resource: ApiResource) -> Self {
        Self { client, resource }
    }

    fn api(&self, namespace: Option<&str>) -> Api<DynamicObject> {
        match namespace {
            Some(ns) => Api::namespaced_with(self.client.clone(), ns, &self.resource),
            None => Api::all_with(self.client.clone(), &self.resource),
        }
    }

    /// Fetch the live object, `None` when it does not exist
    #[instrument(skip(self), fields(key = %key))]
    pub async fn get(&self, key: &ObjectKey) -> Result<Option<Value>> {
        match self.api(key.namespace.as_deref()).get(&key.name).await {
            Ok(obj) => to_value(key, &obj).map(Some),
            Err(e) if is_not_found(&e) => {
                debug!("{} not found", key);
                Ok(None)
            }
            Err(source) => Err(ProviderError::GetResourceError {
                key: key.clone(),
                source,
            }),
        }
    }

    /// Server-side apply `body` and return the object the server stored
    #[instrument(skip(self, body, params), fields(key = %key, field_manager = ?params.field_manager, force = params.force))]
    pub async fn apply(&self, key: &ObjectKey, body: &Value, params: &PatchParams) -> Result<Value> {
        let applied = self
            .api(key.namespace.as_deref())
            .patch(&key.name, params, &Patch::Apply(body))
            .await
            .map_err(|source| ProviderError::PatchError {
                key: key.clone(),
                source,
            })?;
        to_value(key, &applied)
    }

    /// Delete the object. Returns `false` if it was already gone.
    #[instrument(skip(self), fields(key = %key))]
    pub async fn delete(
        &self,
        key: &ObjectKey,
        propagation_policy: Option<PropagationPolicy>,
    ) -> Result<bool> {
        let params = DeleteParams {
            propagation_policy,
            ..Default::default()
        };

        match self.api(key.namespace.as_deref()).delete(&key.name, &params).await {
            Ok(_) => Ok(true),
            Err(e) if is_not_found(&e) => {
                debug!("{} already deleted", key);
                Ok(false)
            }
            Err(source) => Err(ProviderError::DeleteError {
                key: key.clone(),
                source,
            }),
        }
    }
}

fn to_value(key: &ObjectKey, obj: &DynamicObject) -> Result<Value> {
    serde_json::to_value(obj).map_err(|source| ProviderError::JsonMarshalError {
        kind: key.kind.clone(),
        source,
    })
}
