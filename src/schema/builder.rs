// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Schema construction from a kind's CRD.
//!
//! Resources, data sources and manifests share the `metadata` and `spec`
//! trees; they differ in which parts are configurable and in the extra
//! attributes around them.

use super::{snake_case, Attribute, AttributeType, Presence, Schema, Validator};
use crate::constants::wait;
use crate::types::KindInfo;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::{
    JSONSchemaProps, JSONSchemaPropsOrArray, JSONSchemaPropsOrBool,
};
use std::collections::BTreeMap;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Flavor {
    Resource,
    DataSource,
    Manifest,
}

pub fn resource_schema(kind: &KindInfo) -> Schema {
    let mut attributes = common_attributes(kind, Flavor::Resource);
    attributes.extend(lifecycle_attributes());
    Schema {
        description: kind.description.to_string(),
        attributes,
    }
}

pub fn data_source_schema(kind: &KindInfo) -> Schema {
    Schema {
        description: kind.description.to_string(),
        attributes: common_attributes(kind, Flavor::DataSource),
    }
}

pub fn manifest_schema(kind: &KindInfo) -> Schema {
    let mut attributes = common_attributes(kind, Flavor::Manifest);
    attributes.insert(
        "yaml".to_string(),
        Attribute::new(
            AttributeType::String,
            Presence::Computed,
            "The generated manifest in YAML format.",
        ),
    );
    Schema {
        description: kind.description.to_string(),
        attributes,
    }
}

fn common_attributes(kind: &KindInfo, flavor: Flavor) -> BTreeMap<String, Attribute> {
    let id_description = if kind.namespaced {
        "Contains the value 'metadata.namespace/metadata.name'."
    } else {
        "Contains the value 'metadata.name'."
    };

    let mut attributes = BTreeMap::from([
        (
            "id".to_string(),
            Attribute::new(AttributeType::String, Presence::Computed, id_description),
        ),
        (
            "api_version".to_string(),
            Attribute::new(
                AttributeType::String,
                Presence::Computed,
                "The API group and version of the object.",
            )
            .json("apiVersion"),
        ),
        (
            "kind".to_string(),
            Attribute::new(AttributeType::String, Presence::Computed, "The kind of the object.")
                .json("kind"),
        ),
        ("metadata".to_string(), metadata_attribute(kind, flavor)),
    ]);

    if let Some(spec) = kind.spec_schema() {
        let presence = match flavor {
            Flavor::DataSource => Presence::Computed,
            _ if kind.spec_required() => Presence::Required,
            _ => Presence::Optional,
        };
        attributes.insert(
            "spec".to_string(),
            from_props(&spec, presence, flavor == Flavor::DataSource).json("spec"),
        );
    }

    attributes
}

fn metadata_attribute(kind: &KindInfo, flavor: Flavor) -> Attribute {
    let string_map = || AttributeType::Map(Box::new(AttributeType::String));
    let map_presence = if flavor == Flavor::DataSource {
        Presence::Computed
    } else {
        Presence::Optional
    };

    let mut nested = BTreeMap::from([
        (
            "name".to_string(),
            Attribute::new(
                AttributeType::String,
                Presence::Required,
                "Unique identifier for this object within its namespace or cluster.",
            )
            .with_validator(Validator::LengthAtLeast(1))
            .with_validator(Validator::Name)
            .json("name"),
        ),
        (
            "labels".to_string(),
            Attribute::new(
                string_map(),
                map_presence,
                "Map of string keys and values that can be used to organize and categorize objects.",
            )
            .with_validator(Validator::Labels)
            .json("labels"),
        ),
        (
            "annotations".to_string(),
            Attribute::new(
                string_map(),
                map_presence,
                "Unstructured key value map stored with a resource that may be set by external tools.",
            )
            .with_validator(Validator::Annotations)
            .json("annotations"),
        ),
    ]);

    if kind.namespaced {
        nested.insert(
            "namespace".to_string(),
            Attribute::new(
                AttributeType::String,
                Presence::Required,
                "Namespace the object belongs to.",
            )
            .with_validator(Validator::LengthAtLeast(1))
            .with_validator(Validator::Namespace)
            .json("namespace"),
        );
    }

    if flavor == Flavor::DataSource {
        for attr in nested.values_mut() {
            if attr.presence == Presence::Computed {
                attr.validators.clear();
            }
        }
    }

    Attribute::new(
        AttributeType::Object(nested),
        Presence::Required,
        "Data that helps uniquely identify the object.",
    )
    .json("metadata")
}

fn lifecycle_attributes() -> BTreeMap<String, Attribute> {
    let seconds = |description: &str| {
        Attribute::new(AttributeType::Int64, Presence::Optional, description)
            .with_validator(Validator::AtLeast(0))
            .with_validator(Validator::AtMost(wait::MAX_SECS as i64))
    };

    let wait_for_upsert = BTreeMap::from([
        (
            "jsonpath".to_string(),
            Attribute::new(
                AttributeType::String,
                Presence::Required,
                "Relaxed JSONPath expression to use.",
            )
            .with_validator(Validator::LengthAtLeast(1)),
        ),
        (
            "value".to_string(),
            Attribute::new(
                AttributeType::String,
                Presence::Optional,
                "Expected value of the JSONPath. When omitted any non-empty value is accepted.",
            ),
        ),
        (
            "timeout".to_string(),
            seconds(&format!(
                "Seconds to wait for the condition, {} by default. 0 checks once.",
                wait::UPSERT_TIMEOUT_SECS
            )),
        ),
        (
            "poll_interval".to_string(),
            seconds(&format!(
                "Seconds between checks, {} by default.",
                wait::POLL_INTERVAL_SECS
            )),
        ),
    ]);

    let wait_for_delete = BTreeMap::from([
        (
            "timeout".to_string(),
            seconds(&format!(
                "Seconds to wait for the object to disappear, {} by default. 0 checks once.",
                wait::DELETE_TIMEOUT_SECS
            )),
        ),
        (
            "poll_interval".to_string(),
            seconds(&format!(
                "Seconds between checks, {} by default.",
                wait::POLL_INTERVAL_SECS
            )),
        ),
    ]);

    BTreeMap::from([
        (
            "field_manager".to_string(),
            Attribute::new(
                AttributeType::String,
                Presence::Optional,
                "The name of the manager used to track field ownership.",
            )
            .with_validator(Validator::LengthAtLeast(1)),
        ),
        (
            "force_conflicts".to_string(),
            Attribute::new(
                AttributeType::Bool,
                Presence::Optional,
                "If true, server-side apply will force the changes against conflicts.",
            ),
        ),
        (
            "deletion_propagation".to_string(),
            Attribute::new(
                AttributeType::String,
                Presence::Optional,
                "Decides if a deletion will propagate to the dependents of the object, and how the \
                 garbage collector will handle the propagation.",
            )
            .with_validator(Validator::OneOf(vec![
                "Orphan".to_string(),
                "Background".to_string(),
                "Foreground".to_string(),
            ])),
        ),
        (
            "wait_for_upsert".to_string(),
            Attribute::new(
                AttributeType::ListNested(wait_for_upsert),
                Presence::Optional,
                "Wait for the given conditions after the object has been applied.",
            ),
        ),
        (
            "wait_for_delete".to_string(),
            Attribute::new(
                AttributeType::Object(wait_for_delete),
                Presence::Optional,
                "Wait until the object has been removed from the cluster.",
            ),
        ),
    ])
}

/// Convert one OpenAPI property. `computed` forces every descendant to computed.
fn from_props(props: &JSONSchemaProps, presence: Presence, computed: bool) -> Attribute {
    let description = props.description.clone().unwrap_or_default();
    let kind = attribute_type(props, computed);
    let mut attr = Attribute::new(kind, presence, description);

    if computed {
        return attr;
    }

    match (&attr.kind, props.format.as_deref()) {
        (AttributeType::String, Some("byte")) => attr.validators.push(Validator::Base64),
        (AttributeType::String, Some("date-time")) => attr.validators.push(Validator::DateTime),
        _ => {}
    }
    if attr.kind == AttributeType::String {
        if let Some(values) = &props.enum_ {
            let allowed: Vec<String> = values
                .iter()
                .filter_map(|v| v.0.as_str().map(str::to_string))
                .collect();
            if !allowed.is_empty() {
                attr.validators.push(Validator::OneOf(allowed));
            }
        }
    }
    if attr.kind == AttributeType::Int64 {
        if let Some(min) = props.minimum {
            attr.validators.push(Validator::AtLeast(min.ceil() as i64));
        }
    }

    attr
}

fn nested_attributes(props: &JSONSchemaProps, computed: bool) -> BTreeMap<String, Attribute> {
    let required = props.required.clone().unwrap_or_default();
    props
        .properties
        .iter()
        .flatten()
        .map(|(json_name, child)| {
            let presence = if computed {
                Presence::Computed
            } else if required.contains(json_name) {
                Presence::Required
            } else if child.default.is_some() {
                // the API server fills it in when left out
                Presence::OptionalComputed
            } else {
                Presence::Optional
            };
            (
                snake_case(json_name),
                from_props(child, presence, computed).json(json_name),
            )
        })
        .collect()
}

fn attribute_type(props: &JSONSchemaProps, computed: bool) -> AttributeType {
    if props.x_kubernetes_int_or_string == Some(true) {
        return AttributeType::String;
    }

    match props.type_.as_deref() {
        Some("string") => AttributeType::String,
        Some("boolean") => AttributeType::Bool,
        Some("integer") => AttributeType::Int64,
        Some("number") => AttributeType::Float64,
        Some("array") => match &props.items {
            Some(JSONSchemaPropsOrArray::Schema(items)) => match attribute_type(items, computed) {
                AttributeType::Object(_) => {
                    AttributeType::ListNested(nested_attributes(items, computed))
                }
                element => AttributeType::List(Box::new(element)),
            },
            _ => AttributeType::List(Box::new(AttributeType::Dynamic)),
        },
        Some("object") => {
            let has_properties = props.properties.as_ref().is_some_and(|p| !p.is_empty());
            if has_properties {
                AttributeType::Object(nested_attributes(props, computed))
            } else {
                match &props.additional_properties {
                    Some(JSONSchemaPropsOrBool::Schema(values)) => {
                        match attribute_type(values, computed) {
                            AttributeType::Object(_) | AttributeType::ListNested(_) => {
                                AttributeType::Map(Box::new(AttributeType::Dynamic))
                            }
                            element => AttributeType::Map(Box::new(element)),
                        }
                    }
                    _ => AttributeType::Dynamic,
                }
            }
        }
        _ => AttributeType::Dynamic,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{lookup, registry};

    fn kind(name: &str) -> &'static KindInfo {
        lookup(name).unwrap()
    }

    fn nested<'a>(attr: &'a Attribute, name: &str) -> &'a Attribute {
        match &attr.kind {
            AttributeType::Object(attrs) | AttributeType::ListNested(attrs) => &attrs[name],
            other => panic!("{:?} has no nested attributes", other),
        }
    }

    #[test]
    fn test_every_schema_passes_implementation_checks() {
        for kind in registry() {
            for schema in [resource_schema(kind), data_source_schema(kind), manifest_schema(kind)] {
                assert_eq!(
                    schema.validate_implementation(),
                    Ok(()),
                    "{} schema is malformed",
                    kind.type_name
                );
            }
        }
    }

    #[test]
    fn test_resource_schema_shape() {
        let schema = resource_schema(kind("k8s_s3_services_k8s_aws_bucket_v1alpha1"));
        let attrs = &schema.attributes;

        for name in ["id", "api_version", "kind", "metadata", "spec", "field_manager",
            "force_conflicts", "deletion_propagation", "wait_for_upsert", "wait_for_delete"]
        {
            assert!(attrs.contains_key(name), "missing {}", name);
        }

        let spec = &attrs["spec"];
        assert_eq!(spec.presence, Presence::Required);
        assert_eq!(nested(spec, "name").presence, Presence::Required);
        assert_eq!(nested(spec, "acl").presence, Presence::Optional);

        let tag_set = nested(nested(spec, "tagging"), "tag_set");
        assert_eq!(tag_set.json_name.as_deref(), Some("tagSet"));
        assert!(matches!(tag_set.kind, AttributeType::ListNested(_)));
    }

    #[test]
    fn test_namespace_only_for_namespaced_kinds() {
        let bucket = resource_schema(kind("k8s_s3_services_k8s_aws_bucket_v1alpha1"));
        assert_eq!(nested(&bucket.attributes["metadata"], "namespace").presence, Presence::Required);

        let config = resource_schema(kind("k8s_hnc_x_k8s_io_hnc_configuration_v1alpha2"));
        match &config.attributes["metadata"].kind {
            AttributeType::Object(attrs) => assert!(!attrs.contains_key("namespace")),
            other => panic!("unexpected metadata type {:?}", other),
        }
    }

    #[test]
    fn test_formats_become_validators() {
        let provider = resource_schema(kind("k8s_externaldata_gatekeeper_sh_provider_v1beta1"));
        let spec = &provider.attributes["spec"];
        assert_eq!(nested(spec, "ca_bundle").validators, vec![Validator::Base64]);
        assert_eq!(nested(spec, "timeout").validators, vec![Validator::AtLeast(0)]);

        let lease = resource_schema(kind("k8s_coordination_k8s_io_lease_v1"));
        let renew_time = nested(&lease.attributes["spec"], "renew_time");
        assert_eq!(renew_time.validators, vec![Validator::DateTime]);
        assert_eq!(renew_time.json_name.as_deref(), Some("renewTime"));
    }

    #[test]
    fn test_wait_seconds_are_bounded() {
        let schema = resource_schema(kind("k8s_coordination_k8s_io_lease_v1"));
        let timeout = &schema.attributes["wait_for_delete"];
        assert_eq!(
            nested(timeout, "timeout").validators,
            vec![Validator::AtLeast(0), Validator::AtMost(wait::MAX_SECS as i64)]
        );

        let config = serde_json::json!({
            "metadata": { "name": "leader", "namespace": "team-a" },
            "spec": {},
            "wait_for_delete": { "timeout": u64::MAX },
            "wait_for_upsert": [ { "jsonpath": "{.spec.holderIdentity}", "timeout": wait::MAX_SECS + 1 } ],
        });
        let details: Vec<String> = schema
            .validate_config(&config)
            .into_iter()
            .map(|d| d.detail)
            .collect();
        assert_eq!(details.len(), 3, "{:?}", details);
        assert!(details.iter().any(|d| d.starts_with("Attribute wait_for_delete.timeout value must be at least 0")));
        assert!(details.iter().any(|d| d.starts_with("Attribute wait_for_delete.timeout value must be at most")));
        assert!(details.iter().any(|d| d.starts_with("Attribute wait_for_upsert[0].timeout value must be at most")));
    }

    #[test]
    fn test_defaulted_properties_are_optional_computed() {
        let props: JSONSchemaProps = serde_json::from_value(serde_json::json!({
            "type": "object",
            "required": ["url"],
            "properties": {
                "url": { "type": "string" },
                "scheme": { "type": "string", "default": "http" },
                "interval": { "type": "string" },
            },
        }))
        .unwrap();

        let attr = from_props(&props, Presence::Optional, false);
        assert_eq!(nested(&attr, "url").presence, Presence::Required);
        assert_eq!(nested(&attr, "scheme").presence, Presence::OptionalComputed);
        assert_eq!(nested(&attr, "interval").presence, Presence::Optional);

        let computed = from_props(&props, Presence::Computed, true);
        assert_eq!(nested(&computed, "scheme").presence, Presence::Computed);
    }

    #[test]
    fn test_enums_become_one_of() {
        let config = resource_schema(kind("k8s_hnc_x_k8s_io_hnc_configuration_v1alpha2"));
        let mode = nested(nested(&config.attributes["spec"], "resources"), "mode");
        assert_eq!(
            mode.validators,
            vec![Validator::OneOf(vec![
                "Propagate".to_string(),
                "Ignore".to_string(),
                "Remove".to_string(),
                "AllowPropagate".to_string(),
            ])]
        );
    }

    #[test]
    fn test_string_maps() {
        let monitor = resource_schema(kind("k8s_monitoring_coreos_com_service_monitor_v1"));
        let match_labels = nested(nested(&monitor.attributes["spec"], "selector"), "match_labels");
        assert_eq!(match_labels.kind, AttributeType::Map(Box::new(AttributeType::String)));
    }

    #[test]
    fn test_data_source_spec_is_computed() {
        let schema = data_source_schema(kind("k8s_s3_services_k8s_aws_bucket_v1alpha1"));
        let spec = &schema.attributes["spec"];
        assert_eq!(spec.presence, Presence::Computed);
        assert_eq!(nested(spec, "name").presence, Presence::Computed);
        assert!(nested(spec, "name").validators.is_empty());
        assert!(!schema.attributes.contains_key("wait_for_upsert"));

        let metadata = &schema.attributes["metadata"];
        assert_eq!(nested(metadata, "name").presence, Presence::Required);
        assert_eq!(nested(metadata, "labels").presence, Presence::Computed);
    }

    #[test]
    fn test_manifest_schema_has_yaml() {
        let schema = manifest_schema(kind("k8s_coordination_k8s_io_lease_v1"));
        assert_eq!(schema.attributes["yaml"].presence, Presence::Computed);
        assert!(!schema.attributes.contains_key("force_conflicts"));
        assert_eq!(schema.attributes["spec"].presence, Presence::Required);
    }
}
