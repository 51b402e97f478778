// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Attribute validators: Kubernetes naming rules, encodings and formats

use crate::error::Diagnostic;
use base64::Engine;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::sync::LazyLock;

use super::AttributeType;

const DNS1123_LABEL_MAX: usize = 63;
const DNS1123_SUBDOMAIN_MAX: usize = 253;
const QUALIFIED_NAME_MAX: usize = 63;
const LABEL_VALUE_MAX: usize = 63;
const ANNOTATIONS_TOTAL_MAX: usize = 256 * 1024;

static DNS1123_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?$").unwrap());
static DNS1123_SUBDOMAIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?(\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*$").unwrap()
});
static QUALIFIED_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z0-9][-A-Za-z0-9_.]*)?[A-Za-z0-9]$").unwrap());

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", content = "arg", rename_all = "snake_case")]
pub enum Validator {
    /// String length in characters must be at least this
    LengthAtLeast(usize),
    /// Integer must be at least this
    AtLeast(i64),
    /// Integer must be at most this
    AtMost(i64),
    /// Object name: DNS-1123 subdomain
    Name,
    /// Namespace name: DNS-1123 label
    Namespace,
    /// Label keys and values
    Labels,
    /// Annotation keys and total size
    Annotations,
    /// Standard base64 encoding
    Base64,
    /// RFC 3339 timestamp
    DateTime,
    OneOf(Vec<String>),
}

impl Validator {
    /// Whether this validator can be attached to an attribute of the given type
    pub fn applies_to(&self, kind: &AttributeType) -> bool {
        match self {
            Validator::AtLeast(_) | Validator::AtMost(_) => matches!(kind, AttributeType::Int64),
            Validator::Labels | Validator::Annotations => {
                matches!(kind, AttributeType::Map(elem) if **elem == AttributeType::String)
            }
            _ => matches!(kind, AttributeType::String),
        }
    }

    /// Validate a present, correctly typed value at `path`
    pub fn validate(&self, path: &str, value: &Value) -> Vec<Diagnostic> {
        let diagnostic = match (self, value) {
            (Validator::LengthAtLeast(min), Value::String(s)) => validate_length_at_least(path, s, *min),
            (Validator::AtLeast(min), Value::Number(n)) => match n.as_i64() {
                Some(v) if v >= *min => None,
                _ => Some(invalid(
                    path,
                    format!("Attribute {} value must be at least {}, got: {}", path, min, n),
                )),
            },
            (Validator::AtMost(max), Value::Number(n)) => match n.as_i64() {
                Some(v) if v <= *max => None,
                _ => Some(invalid(
                    path,
                    format!("Attribute {} value must be at most {}, got: {}", path, max, n),
                )),
            },
            (Validator::Name, Value::String(s)) => validate_name(path, s),
            (Validator::Namespace, Value::String(s)) => validate_namespace(path, s),
            (Validator::Base64, Value::String(s)) => validate_base64(path, s),
            (Validator::DateTime, Value::String(s)) => validate_date_time(path, s),
            (Validator::OneOf(allowed), Value::String(s)) => {
                if allowed.iter().any(|a| a == s) {
                    None
                } else {
                    Some(invalid(
                        path,
                        format!(
                            "Attribute {} value must be one of: {:?}, got: {:?}",
                            path, allowed, s
                        ),
                    ))
                }
            }
            (Validator::Labels, Value::Object(map)) => {
                return map
                    .iter()
                    .flat_map(|(k, v)| validate_label(path, k, v.as_str().unwrap_or_default()))
                    .collect();
            }
            (Validator::Annotations, Value::Object(map)) => {
                let pairs: Vec<(&str, &str)> = map
                    .iter()
                    .map(|(k, v)| (k.as_str(), v.as_str().unwrap_or_default()))
                    .collect();
                return validate_annotations(path, &pairs);
            }
            _ => None,
        };
        diagnostic.into_iter().collect()
    }
}

fn invalid(path: &str, detail: String) -> Diagnostic {
    Diagnostic::error("Invalid Attribute Value", detail).at(path)
}

pub fn validate_length_at_least(path: &str, value: &str, min: usize) -> Option<Diagnostic> {
    let len = value.chars().count();
    (len < min).then(|| {
        Diagnostic::error(
            "Invalid Attribute Value Length",
            format!(
                "Attribute {} string length must be at least {}, got: {}",
                path, min, len
            ),
        )
        .at(path)
    })
}

pub fn validate_name(path: &str, value: &str) -> Option<Diagnostic> {
    if value.len() <= DNS1123_SUBDOMAIN_MAX && DNS1123_SUBDOMAIN.is_match(value) {
        return None;
    }
    Some(invalid(
        path,
        format!(
            "{:?} is not a valid name: it must consist of lowercase alphanumeric characters, '-' or '.', \
             start and end with an alphanumeric character and be at most {} characters",
            value, DNS1123_SUBDOMAIN_MAX
        ),
    ))
}

pub fn validate_namespace(path: &str, value: &str) -> Option<Diagnostic> {
    if value.len() <= DNS1123_LABEL_MAX && DNS1123_LABEL.is_match(value) {
        return None;
    }
    Some(invalid(
        path,
        format!(
            "{:?} is not a valid namespace: it must consist of lowercase alphanumeric characters or '-', \
             start and end with an alphanumeric character and be at most {} characters",
            value, DNS1123_LABEL_MAX
        ),
    ))
}

/// `prefix/name` or `name`, as used by label and annotation keys
fn is_qualified_name(key: &str) -> bool {
    let (prefix, name) = match key.split_once('/') {
        Some((prefix, name)) => (Some(prefix), name),
        None => (None, key),
    };

    let prefix_ok = prefix.map_or(true, |p| {
        !p.is_empty() && p.len() <= DNS1123_SUBDOMAIN_MAX && DNS1123_SUBDOMAIN.is_match(p)
    });
    prefix_ok && name.len() <= QUALIFIED_NAME_MAX && QUALIFIED_NAME.is_match(name)
}

pub fn validate_label(path: &str, key: &str, value: &str) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    if !is_qualified_name(key) {
        diagnostics.push(invalid(path, format!("{:?} is not a valid label key", key)));
    }
    let value_ok =
        value.is_empty() || (value.len() <= LABEL_VALUE_MAX && QUALIFIED_NAME.is_match(value));
    if !value_ok {
        diagnostics.push(invalid(
            path,
            format!("{:?} is not a valid value for label {:?}", value, key),
        ));
    }
    diagnostics
}

pub fn validate_annotations(path: &str, annotations: &[(&str, &str)]) -> Vec<Diagnostic> {
    let mut diagnostics: Vec<Diagnostic> = annotations
        .iter()
        .filter(|(key, _)| !is_qualified_name(key))
        .map(|(key, _)| invalid(path, format!("{:?} is not a valid annotation key", key)))
        .collect();

    let total: usize = annotations.iter().map(|(k, v)| k.len() + v.len()).sum();
    if total > ANNOTATIONS_TOTAL_MAX {
        diagnostics.push(invalid(
            path,
            format!(
                "annotations are {} bytes in total, at most {} bytes are allowed",
                total, ANNOTATIONS_TOTAL_MAX
            ),
        ));
    }
    diagnostics
}

pub fn validate_base64(path: &str, value: &str) -> Option<Diagnostic> {
    base64::engine::general_purpose::STANDARD
        .decode(value)
        .err()
        .map(|e| invalid(path, format!("{:?} is not valid base64: {}", value, e)))
}

pub fn validate_date_time(path: &str, value: &str) -> Option<Diagnostic> {
    chrono::DateTime::parse_from_rfc3339(value)
        .err()
        .map(|e| invalid(path, format!("{:?} is not an RFC 3339 date-time: {}", value, e)))
}
