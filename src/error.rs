// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::kubernetes::ObjectKey;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("configuration is invalid: {}", summarize(.0))]
    Validation(Vec<Diagnostic>),

    #[error("unable to GET {key}: {source}")]
    GetResourceError {
        key: ObjectKey,
        #[source]
        source: kube::Error,
    },

    #[error("unable to PATCH {key}: {source}")]
    PatchError {
        key: ObjectKey,
        #[source]
        source: kube::Error,
    },

    #[error("unable to DELETE {key}: {source}")]
    DeleteError {
        key: ObjectKey,
        #[source]
        source: kube::Error,
    },

    #[error("unable to marshal {kind} to JSON: {source}")]
    JsonMarshalError {
        kind: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unable to unmarshal {kind} from JSON: {source}")]
    JsonUnmarshalError {
        kind: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unable to marshal {kind} to YAML: {source}")]
    YamlMarshalError {
        kind: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("timed out after {timeout:?} waiting for {key} to {target}")]
    WaitTimeoutExceeded {
        key: ObjectKey,
        target: String,
        timeout: Duration,
    },

    #[error("invalid JSONPath expression {expression:?}: {reason}")]
    InvalidJsonPath { expression: String, reason: String },

    #[error("invalid import id {id:?}: expected {expected}")]
    InvalidImportId { id: String, expected: &'static str },

    #[error("cannot import {0}: it does not exist")]
    ImportNotFound(ObjectKey),

    #[error("{0} not found")]
    NotFound(ObjectKey),

    #[error("provider is running in offline mode, {0} cannot reach a cluster")]
    OfflineMode(String),

    #[error("provider has not been configured with a cluster client")]
    Unconfigured,

    #[error("unknown type {0:?}")]
    UnknownType(String),

    #[error("Failed to load kubeconfig: {0}")]
    KubeconfigError(String),
}

pub type Result<T> = std::result::Result<T, ProviderError>;

fn summarize(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(|d| d.detail.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// A user-facing report of a failed or degraded operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub summary: String,
    pub detail: String,
    /// Dotted attribute path the diagnostic refers to, when there is one
    pub attribute: Option<String>,
}

impl Diagnostic {
    pub fn error(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            summary: summary.into(),
            detail: detail.into(),
            attribute: None,
        }
    }

    pub fn warning(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(summary, detail)
        }
    }

    pub fn at(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Error => "Error",
            Severity::Warning => "Warning",
        };
        match &self.attribute {
            Some(attr) => write!(f, "{}: {} ({}): {}", level, self.summary, attr, self.detail),
            None => write!(f, "{}: {}: {}", level, self.summary, self.detail),
        }
    }
}

impl ProviderError {
    pub fn is_wait_timeout(&self) -> bool {
        matches!(self, ProviderError::WaitTimeoutExceeded { .. })
    }

    /// Convert into the diagnostics reported to the caller.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        let summary = match self {
            ProviderError::Validation(diagnostics) => return diagnostics.clone(),
            ProviderError::GetResourceError { .. } => "Unable to GET resource",
            ProviderError::PatchError { .. } => "Unable to PATCH resource",
            ProviderError::DeleteError { .. } => "Unable to DELETE resource",
            ProviderError::JsonMarshalError { .. } => "Unable to marshal JSON",
            ProviderError::JsonUnmarshalError { .. } => "Unable to unmarshal JSON",
            ProviderError::YamlMarshalError { .. } => "Unable to marshal YAML",
            ProviderError::WaitTimeoutExceeded { .. } => {
                return vec![Diagnostic::warning("Wait timeout exceeded", self.to_string())];
            }
            ProviderError::InvalidJsonPath { .. } => "Invalid JSONPath",
            ProviderError::InvalidImportId { .. } => "Invalid import id",
            ProviderError::ImportNotFound(_) => "Resource to import not found",
            ProviderError::NotFound(_) => "Resource not found",
            ProviderError::OfflineMode(_) => "Provider in offline mode",
            ProviderError::Unconfigured => "Unconfigured provider",
            ProviderError::UnknownType(_) => "Unknown type",
            ProviderError::KubeconfigError(_) => "Unable to load kubeconfig",
        };

        let detail = match self {
            ProviderError::JsonMarshalError { .. }
            | ProviderError::JsonUnmarshalError { .. }
            | ProviderError::YamlMarshalError { .. } => format!(
                "An unexpected error occurred while converting the resource. \
                 Please report this issue to the provider developers.\n\nError: {}",
                self
            ),
            _ => self.to_string(),
        };

        vec![Diagnostic::error(summary, detail)]
    }
}
