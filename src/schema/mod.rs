// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Declared configuration surface of resources and data sources.
//!
//! A `Schema` is a tree of attributes. Attributes that mirror a field of the
//! Kubernetes object remember its JSON name, which drives the conversion
//! between the snake_case configuration and the camelCase object.

pub mod builder;
pub mod validators;

pub use builder::{data_source_schema, manifest_schema, resource_schema};
pub use validators::Validator;

use crate::error::Diagnostic;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Names a host configuration language reserves at the top level of a block
const RESERVED_ROOT_NAMES: &[&str] = &[
    "connection",
    "count",
    "depends_on",
    "for_each",
    "lifecycle",
    "provider",
    "provisioner",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Presence {
    Required,
    Optional,
    Computed,
    /// May be configured, otherwise the server supplies a value
    OptionalComputed,
}

impl Presence {
    pub fn is_configurable(self) -> bool {
        !matches!(self, Presence::Computed)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", content = "of", rename_all = "snake_case")]
pub enum AttributeType {
    String,
    Bool,
    Int64,
    Float64,
    Dynamic,
    Map(Box<AttributeType>),
    List(Box<AttributeType>),
    Object(BTreeMap<String, Attribute>),
    ListNested(BTreeMap<String, Attribute>),
}

impl AttributeType {
    fn nested(&self) -> Option<&BTreeMap<String, Attribute>> {
        match self {
            AttributeType::Object(attrs) | AttributeType::ListNested(attrs) => Some(attrs),
            _ => None,
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            AttributeType::String => "string",
            AttributeType::Bool => "bool",
            AttributeType::Int64 => "number",
            AttributeType::Float64 => "number",
            AttributeType::Dynamic => "dynamic",
            AttributeType::Map(_) => "map",
            AttributeType::List(_) | AttributeType::ListNested(_) => "list",
            AttributeType::Object(_) => "object",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Attribute {
    pub description: String,
    pub presence: Presence,
    #[serde(flatten)]
    pub kind: AttributeType,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub validators: Vec<Validator>,
    /// Key of this attribute in the Kubernetes object, if it maps onto one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_name: Option<String>,
}

impl Attribute {
    pub fn new(kind: AttributeType, presence: Presence, description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            presence,
            kind,
            validators: Vec::new(),
            json_name: None,
        }
    }

    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validators.push(validator);
        self
    }

    pub fn json(mut self, name: &str) -> Self {
        self.json_name = Some(name.to_string());
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Schema {
    pub description: String,
    pub attributes: BTreeMap<String, Attribute>,
}

impl Schema {
    /// Check the schema is well formed. Returns every problem found.
    pub fn validate_implementation(&self) -> Result<(), Vec<String>> {
        let mut problems = Vec::new();

        for name in self.attributes.keys() {
            if RESERVED_ROOT_NAMES.contains(&name.as_str()) {
                problems.push(format!("{}: reserved root attribute name", name));
            }
        }
        check_attributes("", &self.attributes, false, &mut problems);

        if problems.is_empty() {
            Ok(())
        } else {
            Err(problems)
        }
    }

    /// Validate a configuration object, returning diagnostics for every problem.
    pub fn validate_config(&self, config: &Value) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        match config.as_object() {
            Some(map) => check_config("", &self.attributes, map, &mut diagnostics),
            None => diagnostics.push(Diagnostic::error(
                "Invalid configuration",
                "configuration must be an object",
            )),
        }
        diagnostics
    }

    /// Build the Kubernetes JSON object described by a configuration.
    pub fn config_to_object(&self, config: &Value) -> Value {
        Value::Object(convert(&self.attributes, config, Direction::ToObject))
    }

    /// Build the configuration-shaped state of a Kubernetes JSON object.
    /// Fields without an attribute (status, server metadata) are dropped.
    pub fn object_to_config(&self, object: &Value) -> Value {
        Value::Object(convert(&self.attributes, object, Direction::ToConfig))
    }
}

fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}

fn is_valid_attribute_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_lowercase() || c == '_')
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

fn check_attributes(
    prefix: &str,
    attributes: &BTreeMap<String, Attribute>,
    parent_computed: bool,
    problems: &mut Vec<String>,
) {
    for (name, attr) in attributes {
        let path = join(prefix, name);

        if !is_valid_attribute_name(name) {
            problems.push(format!("{}: attribute names must match [a-z_][a-z0-9_]*", path));
        }
        if parent_computed && attr.presence != Presence::Computed {
            problems.push(format!(
                "{}: attributes nested in a computed attribute must be computed",
                path
            ));
        }
        for validator in &attr.validators {
            if !validator.applies_to(&attr.kind) {
                problems.push(format!(
                    "{}: validator {:?} does not apply to a {} attribute",
                    path,
                    validator,
                    attr.kind.type_name()
                ));
            }
        }

        if let AttributeType::Map(element) | AttributeType::List(element) = &attr.kind {
            let mut element = element.as_ref();
            while let AttributeType::Map(inner) | AttributeType::List(inner) = element {
                element = inner;
            }
            if element.nested().is_some() {
                problems.push(format!(
                    "{}: nested attributes cannot be used as collection elements",
                    path
                ));
            }
        }

        if let Some(nested) = attr.kind.nested() {
            if nested.is_empty() {
                problems.push(format!("{}: nested attribute must declare attributes", path));
            }
            check_attributes(
                &path,
                nested,
                parent_computed || attr.presence == Presence::Computed,
                problems,
            );
        }
    }
}

fn check_config(
    prefix: &str,
    attributes: &BTreeMap<String, Attribute>,
    config: &Map<String, Value>,
    diagnostics: &mut Vec<Diagnostic>,
) {
    for key in config.keys() {
        if !attributes.contains_key(key) {
            diagnostics.push(
                Diagnostic::error(
                    "Unsupported argument",
                    format!("An argument named \"{}\" is not expected here.", key),
                )
                .at(join(prefix, key)),
            );
        }
    }

    for (name, attr) in attributes {
        let path = join(prefix, name);
        let value = config.get(name).filter(|v| !v.is_null());

        let Some(value) = value else {
            if attr.presence == Presence::Required {
                diagnostics.push(
                    Diagnostic::error(
                        "Missing required argument",
                        format!("attribute \"{}\" is required", name),
                    )
                    .at(path),
                );
            }
            continue;
        };

        if !attr.presence.is_configurable() {
            diagnostics.push(
                Diagnostic::error(
                    "Invalid configuration",
                    format!("attribute \"{}\" is computed and cannot be configured", name),
                )
                .at(path),
            );
            continue;
        }

        check_value(&path, &attr.kind, value, diagnostics);
        for validator in &attr.validators {
            if type_matches(&attr.kind, value) {
                diagnostics.extend(validator.validate(&path, value));
            }
        }
    }
}

fn type_matches(kind: &AttributeType, value: &Value) -> bool {
    match kind {
        AttributeType::String => value.is_string(),
        AttributeType::Bool => value.is_boolean(),
        AttributeType::Int64 => value.is_i64() || value.is_u64(),
        AttributeType::Float64 => value.is_number(),
        AttributeType::Dynamic => true,
        AttributeType::Map(_) | AttributeType::Object(_) => value.is_object(),
        AttributeType::List(_) | AttributeType::ListNested(_) => value.is_array(),
    }
}

fn check_value(path: &str, kind: &AttributeType, value: &Value, diagnostics: &mut Vec<Diagnostic>) {
    if !type_matches(kind, value) {
        diagnostics.push(
            Diagnostic::error(
                "Incorrect attribute value type",
                format!("Attribute {} must be a {}", path, kind.type_name()),
            )
            .at(path),
        );
        return;
    }

    match (kind, value) {
        (AttributeType::Map(elem), Value::Object(map)) => {
            for (k, v) in map {
                check_value(&format!("{}[{:?}]", path, k), elem, v, diagnostics);
            }
        }
        (AttributeType::List(elem), Value::Array(items)) => {
            for (i, v) in items.iter().enumerate() {
                check_value(&format!("{}[{}]", path, i), elem, v, diagnostics);
            }
        }
        (AttributeType::Object(attrs), Value::Object(map)) => {
            check_config(path, attrs, map, diagnostics);
        }
        (AttributeType::ListNested(attrs), Value::Array(items)) => {
            for (i, item) in items.iter().enumerate() {
                let item_path = format!("{}[{}]", path, i);
                match item.as_object() {
                    Some(map) => check_config(&item_path, attrs, map, diagnostics),
                    None => diagnostics.push(
                        Diagnostic::error(
                            "Incorrect attribute value type",
                            format!("Attribute {} must be an object", item_path),
                        )
                        .at(item_path),
                    ),
                }
            }
        }
        _ => {}
    }
}

#[derive(Clone, Copy)]
enum Direction {
    ToObject,
    ToConfig,
}

fn convert(attributes: &BTreeMap<String, Attribute>, source: &Value, direction: Direction) -> Map<String, Value> {
    let mut out = Map::new();
    for (name, attr) in attributes {
        let Some(json_name) = attr.json_name.as_deref() else {
            continue;
        };
        let (from, to) = match direction {
            Direction::ToObject => (name.as_str(), json_name),
            Direction::ToConfig => (json_name, name.as_str()),
        };
        let Some(value) = source.get(from).filter(|v| !v.is_null()) else {
            continue;
        };

        let converted = match (&attr.kind, value) {
            (AttributeType::Object(nested), Value::Object(_)) => {
                Value::Object(convert(nested, value, direction))
            }
            (AttributeType::ListNested(nested), Value::Array(items)) => Value::Array(
                items
                    .iter()
                    .map(|item| Value::Object(convert(nested, item, direction)))
                    .collect(),
            ),
            _ => value.clone(),
        };
        out.insert(to.to_string(), converted);
    }
    out
}

/// `allowCascadingDeletion` → `allow_cascading_deletion`, `HNCConfiguration` → `hnc_configuration`
pub fn snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c.is_ascii_uppercase() {
            let prev = i.checked_sub(1).map(|p| chars[p]);
            let next = chars.get(i + 1);
            let boundary = match prev {
                Some(p) if p.is_ascii_lowercase() || p.is_ascii_digit() => true,
                Some(p) if p.is_ascii_uppercase() => next.is_some_and(|n| n.is_ascii_lowercase()),
                _ => false,
            };
            if boundary && !out.ends_with('_') {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else if c.is_ascii_alphanumeric() {
            out.push(c);
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }

    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}
