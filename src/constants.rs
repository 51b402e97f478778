// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Field manager used for server-side apply when neither the instance nor the provider sets one
pub const DEFAULT_FIELD_MANAGER: &str = "crd-provider";

/// Prefix of every registered type name
pub const TYPE_PREFIX: &str = "k8s";

/// Suffix appended to a type name for its manifest data source
pub const MANIFEST_SUFFIX: &str = "_manifest";

/// Wait loop defaults, in seconds
pub mod wait {
    pub const UPSERT_TIMEOUT_SECS: u64 = 30;
    pub const DELETE_TIMEOUT_SECS: u64 = 30;
    pub const POLL_INTERVAL_SECS: u64 = 5;
    /// Upper bound accepted for any wait timeout or poll interval
    pub const MAX_SECS: u64 = 24 * 60 * 60;
}

/// Environment variables read by `ProviderConfig::from_env`
pub mod env {
    pub const OFFLINE: &str = "CRD_PROVIDER_OFFLINE";
    pub const FIELD_MANAGER: &str = "CRD_PROVIDER_FIELD_MANAGER";
    pub const FORCE_CONFLICTS: &str = "CRD_PROVIDER_FORCE_CONFLICTS";
    pub const KUBECONFIG: &str = "CRD_PROVIDER_KUBECONFIG";
    pub const CONTEXT: &str = "CRD_PROVIDER_CONTEXT";
}
