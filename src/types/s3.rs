// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! AWS Controllers for Kubernetes: S3 (s3.services.k8s.aws)

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const BUCKET_DESCRIPTION: &str =
    "In terms of implementation, a Bucket is a resource. An Amazon S3 bucket name is \
     globally unique, and the namespace is shared by all Amazon Web Services accounts.";

/// BucketSpec defines the desired state of Bucket.
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[kube(
    group = "s3.services.k8s.aws",
    version = "v1alpha1",
    kind = "Bucket",
    plural = "buckets",
    namespaced,
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct BucketSpec {
    /// The canned ACL to apply to the bucket.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acl: Option<String>,
    /// The configuration information for the bucket.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_bucket_configuration: Option<CreateBucketConfiguration>,
    /// The name of the bucket to create.
    pub name: String,
    /// Specifies whether you want S3 Object Lock to be enabled for the new bucket.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_lock_enabled_for_bucket: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tagging: Option<Tagging>,
    /// Describes the versioning state of an Amazon S3 bucket.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub versioning: Option<VersioningConfiguration>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBucketConfiguration {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_constraint: Option<String>,
}

/// Container for TagSet elements.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Tagging {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_set: Option<Vec<Tag>>,
}

/// A container of a key value name pair.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
pub struct Tag {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VersioningConfiguration {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mfa_delete: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}
