// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! OpenAPI formats schemars cannot infer from the Rust type

use schemars::gen::SchemaGenerator;
use schemars::schema::{InstanceType, NumberValidation, Schema, SchemaObject};

/// base64-encoded string (`format: byte`)
pub fn byte_string(_: &mut SchemaGenerator) -> Schema {
    formatted("byte", InstanceType::String)
}

/// RFC 3339 timestamp (`format: date-time`)
pub fn date_time(_: &mut SchemaGenerator) -> Schema {
    formatted("date-time", InstanceType::String)
}

pub fn integer_at_least_zero(_: &mut SchemaGenerator) -> Schema {
    let mut schema = SchemaObject {
        instance_type: Some(InstanceType::Integer.into()),
        format: Some("int64".to_string()),
        number: Some(Box::new(NumberValidation {
            minimum: Some(0.0),
            ..Default::default()
        })),
        ..Default::default()
    };
    schema.extensions.insert("nullable".to_string(), true.into());
    Schema::Object(schema)
}

fn formatted(format: &str, instance_type: InstanceType) -> Schema {
    let mut schema = SchemaObject {
        instance_type: Some(instance_type.into()),
        format: Some(format.to_string()),
        ..Default::default()
    };
    schema.extensions.insert("nullable".to_string(), true.into());
    Schema::Object(schema)
}
