// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Gatekeeper admission webhook external data providers (externaldata.gatekeeper.sh)

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::formats::{byte_string, integer_at_least_zero};

pub const PROVIDER_DESCRIPTION: &str = "Provider is the Schema for the Provider API";

/// Spec defines the Provider specifications.
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[kube(
    group = "externaldata.gatekeeper.sh",
    version = "v1beta1",
    kind = "Provider",
    root = "ExternalDataProvider",
    plural = "providers",
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSpec {
    /// CABundle is a base64-encoded string that contains the TLS CA bundle in PEM
    /// format. It is used to verify the signature of the provider's certificate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(schema_with = "byte_string")]
    pub ca_bundle: Option<String>,
    /// Timeout is the timeout when querying the provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(schema_with = "integer_at_least_zero")]
    pub timeout: Option<i64>,
    /// URL is the url for the provider. URL is prefixed with https://.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}
