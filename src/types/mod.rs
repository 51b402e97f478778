// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Registered custom resource kinds and the table describing them.

pub mod coordination;
pub mod formats;
pub mod gatekeeper;
pub mod hnc;
pub mod monitoring;
pub mod s3;

use crate::constants::{MANIFEST_SUFFIX, TYPE_PREFIX};
use crate::kubernetes::ObjectKey;
use crate::schema::snake_case;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::{
    CustomResourceDefinition, JSONSchemaProps,
};
use kube::{api::ApiResource, CustomResourceExt, Resource};
use std::sync::LazyLock;

/// Everything the generic adapters need to know about one kind
#[derive(Clone, Debug)]
pub struct KindInfo {
    /// `k8s_<group>_<kind>_<version>`
    pub type_name: String,
    pub resource: ApiResource,
    pub namespaced: bool,
    pub description: &'static str,
    crd: fn() -> CustomResourceDefinition,
}

impl KindInfo {
    pub fn of<K>(description: &'static str) -> Self
    where
        K: Resource<DynamicType = ()> + CustomResourceExt,
    {
        let resource = ApiResource::erase::<K>(&());
        Self {
            type_name: type_name(&resource),
            namespaced: K::crd().spec.scope == "Namespaced",
            resource,
            description,
            crd: K::crd,
        }
    }

    pub fn kind(&self) -> &str {
        &self.resource.kind
    }

    pub fn api_version(&self) -> &str {
        &self.resource.api_version
    }

    pub fn manifest_type_name(&self) -> String {
        format!("{}{}", self.type_name, MANIFEST_SUFFIX)
    }

    pub fn crd(&self) -> CustomResourceDefinition {
        (self.crd)()
    }

    /// The `spec` property of the served version's OpenAPI schema
    pub fn spec_schema(&self) -> Option<JSONSchemaProps> {
        self.crd()
            .spec
            .versions
            .into_iter()
            .find(|v| v.name == self.resource.version)?
            .schema?
            .open_api_v3_schema?
            .properties?
            .remove("spec")
    }

    /// Whether the CRD lists `spec` as a required property
    pub fn spec_required(&self) -> bool {
        self.crd()
            .spec
            .versions
            .into_iter()
            .find(|v| v.name == self.resource.version)
            .and_then(|v| v.schema?.open_api_v3_schema?.required)
            .is_some_and(|required| required.iter().any(|r| r == "spec"))
    }

    pub fn key(&self, namespace: Option<&str>, name: &str) -> ObjectKey {
        ObjectKey::new(self.kind(), namespace, name)
    }
}

fn type_name(resource: &ApiResource) -> String {
    format!(
        "{}_{}_{}_{}",
        TYPE_PREFIX,
        snake_case(&resource.group),
        snake_case(&resource.kind),
        resource.version
    )
}

static REGISTRY: LazyLock<Vec<KindInfo>> = LazyLock::new(|| {
    let mut kinds = vec![
        KindInfo::of::<coordination::Lease>(coordination::LEASE_DESCRIPTION),
        KindInfo::of::<gatekeeper::ExternalDataProvider>(gatekeeper::PROVIDER_DESCRIPTION),
        KindInfo::of::<hnc::HierarchyConfiguration>(hnc::HIERARCHY_CONFIGURATION_DESCRIPTION),
        KindInfo::of::<hnc::HNCConfiguration>(hnc::HNC_CONFIGURATION_DESCRIPTION),
        KindInfo::of::<monitoring::ServiceMonitor>(monitoring::SERVICE_MONITOR_DESCRIPTION),
        KindInfo::of::<s3::Bucket>(s3::BUCKET_DESCRIPTION),
    ];
    kinds.sort_by(|a, b| a.type_name.cmp(&b.type_name));
    kinds
});

/// All registered kinds, ordered by type name
pub fn registry() -> &'static [KindInfo] {
    &REGISTRY
}

pub fn lookup(type_name: &str) -> Option<&'static KindInfo> {
    REGISTRY.iter().find(|k| k.type_name == type_name)
}

pub fn lookup_manifest(type_name: &str) -> Option<&'static KindInfo> {
    type_name.strip_suffix(MANIFEST_SUFFIX).and_then(lookup)
}
