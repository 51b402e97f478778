// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! YAML declarations: a `type` plus the configuration attributes of one instance

use crate::error::{ProviderError, Result};
use crate::lifecycle::{LifecycleOptions, ResourceModel};
use crate::schema::{manifest_schema, resource_schema, Schema};
use crate::types::{lookup, lookup_manifest, KindInfo};
use anyhow::Context;
use kube::api::DynamicObject;
use serde::Deserialize;
use serde_json::Value;

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Declaration {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(flatten)]
    pub config: serde_json::Map<String, Value>,
}

impl Declaration {
    /// Parse every document of a multi-document YAML stream
    pub fn parse_all(input: &str) -> anyhow::Result<Vec<Declaration>> {
        serde_yaml::Deserializer::from_str(input)
            .enumerate()
            .map(|(i, document)| {
                Declaration::deserialize(document)
                    .with_context(|| format!("document {} is not a valid declaration", i + 1))
            })
            .collect()
    }

    /// The registered kind and the schema this declaration is checked against:
    /// the resource schema for a resource type, the manifest schema for a
    /// `<type>_manifest` type.
    pub fn schema(&self) -> Result<(&'static KindInfo, Schema)> {
        match (lookup(&self.type_name), lookup_manifest(&self.type_name)) {
            (Some(kind), _) => Ok((kind, resource_schema(kind))),
            (None, Some(kind)) => Ok((kind, manifest_schema(kind))),
            (None, None) => Err(ProviderError::UnknownType(self.type_name.clone())),
        }
    }

    pub fn config(&self) -> Value {
        Value::Object(self.config.clone())
    }

    /// Check the configuration against `schema`
    pub fn validate(&self, schema: &Schema) -> Result<()> {
        let diagnostics = schema.validate_config(&self.config());
        if diagnostics.is_empty() {
            Ok(())
        } else {
            Err(ProviderError::Validation(diagnostics))
        }
    }

    /// The Kubernetes object this declaration describes
    pub fn object(&self, kind: &KindInfo, schema: &Schema) -> Result<DynamicObject> {
        self.validate(schema)?;

        let mut object = schema.config_to_object(&self.config());
        if let Some(map) = object.as_object_mut() {
            map.insert("apiVersion".to_string(), kind.api_version().into());
            map.insert("kind".to_string(), kind.kind().into());
        }
        serde_json::from_value(object).map_err(|source| ProviderError::JsonUnmarshalError {
            kind: kind.kind().to_string(),
            source,
        })
    }

    pub fn resource_model(&self, kind: &KindInfo, schema: &Schema) -> Result<ResourceModel<DynamicObject>> {
        let object = self.object(kind, schema)?;
        let lifecycle = LifecycleOptions::from_config(&self.config())?;
        Ok(ResourceModel::new(object).with_lifecycle(lifecycle))
    }
}

/// Configuration-shaped state of an object, the way it would be recorded after apply
pub fn state(schema: &Schema, id: Option<&str>, lifecycle: &LifecycleOptions, object: &DynamicObject) -> Result<Value> {
    let json = serde_json::to_value(object).map_err(|source| ProviderError::JsonMarshalError {
        kind: object.types.as_ref().map(|t| t.kind.clone()).unwrap_or_default(),
        source,
    })?;

    let options = serde_json::to_value(lifecycle).map_err(|source| ProviderError::JsonMarshalError {
        kind: "lifecycle options".to_string(),
        source,
    })?;

    let mut state = schema.object_to_config(&json);
    if let Some(map) = state.as_object_mut() {
        if let Some(id) = id {
            map.insert("id".to_string(), id.into());
        }
        if let Value::Object(options) = options {
            map.extend(options);
        }
    }
    Ok(state)
}
