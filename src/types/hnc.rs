// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Hierarchical Namespace Controller kinds (hnc.x-k8s.io)

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const HIERARCHY_CONFIGURATION_DESCRIPTION: &str =
    "Hierarchy is the Schema for the hierarchies API";
pub const HNC_CONFIGURATION_DESCRIPTION: &str =
    "HNCConfiguration is a cluster-wide configuration for HNC as a whole.";

/// HierarchySpec defines the desired state of Hierarchy
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[kube(
    group = "hnc.x-k8s.io",
    version = "v1alpha2",
    kind = "HierarchyConfiguration",
    plural = "hierarchyconfigurations",
    namespaced,
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct HierarchyConfigurationSpec {
    /// AllowCascadingDeletion indicates if the subnamespaces of this namespace are allowed
    /// to cascading delete.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_cascading_deletion: Option<bool>,
    /// Parent indicates the parent of this namespace, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

/// HNCConfigurationSpec defines the desired state of HNC configuration.
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[kube(
    group = "hnc.x-k8s.io",
    version = "v1alpha2",
    kind = "HNCConfiguration",
    plural = "hncconfigurations",
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct HNCConfigurationSpec {
    /// Resources defines the cluster-wide settings for resource synchronization.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<Vec<ResourceSpec>>,
}

/// ResourceSpec defines the desired synchronization state of a specific resource.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSpec {
    /// Group of the resource defined below. This is used to unambiguously identify
    /// the resource. It may be omitted for core resources (e.g. "secrets").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Synchronization mode of the kind. If the field is empty, it will be treated
    /// as "Propagate".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<SyncMode>,
    /// Resource to be configured.
    pub resource: String,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, JsonSchema)]
pub enum SyncMode {
    Propagate,
    Ignore,
    Remove,
    AllowPropagate,
}
