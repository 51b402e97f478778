// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::env as keys;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

/// Provider configuration, either from environment variables or a `provider:` block
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProviderConfig {
    /// Never contact a cluster; only manifest data sources work
    pub offline: bool,
    /// Provider-wide field manager for server-side apply
    pub field_manager: Option<String>,
    /// Provider-wide default for forcing field ownership conflicts
    pub force_conflicts: Option<bool>,
    pub kubeconfig: Option<PathBuf>,
    pub context: Option<String>,
}

impl ProviderConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let offline = lookup(keys::OFFLINE)
            .map(|v| v.parse::<bool>())
            .transpose()
            .with_context(|| format!("{} must be true or false", keys::OFFLINE))?
            .unwrap_or(false);
        let force_conflicts = lookup(keys::FORCE_CONFLICTS)
            .map(|v| v.parse::<bool>())
            .transpose()
            .with_context(|| format!("{} must be true or false", keys::FORCE_CONFLICTS))?;

        Ok(ProviderConfig {
            offline,
            field_manager: lookup(keys::FIELD_MANAGER).filter(|v| !v.is_empty()),
            force_conflicts,
            kubeconfig: lookup(keys::KUBECONFIG).filter(|v| !v.is_empty()).map(PathBuf::from),
            context: lookup(keys::CONTEXT).filter(|v| !v.is_empty()),
        })
    }
}
