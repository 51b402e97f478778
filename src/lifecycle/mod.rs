// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kind-agnostic adapters between declared configuration and cluster objects

pub mod data_source;
pub mod jsonpath;
pub mod manifest;
pub mod model;
pub mod resource;
pub mod wait;

pub use data_source::{DataSourceAdapter, DataSourceModel};
pub use jsonpath::JsonPath;
pub use manifest::{ManifestDataSource, ManifestModel};
pub use model::{
    DeletionPropagation, InstanceState, LifecycleOptions, ResourceModel, WaitForDelete,
    WaitForUpsert,
};
pub use resource::{Applied, ResourceAdapter};
