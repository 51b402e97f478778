// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use kube::api::ObjectMeta;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crd_provider::config::ProviderConfig;
use crd_provider::constants::MANIFEST_SUFFIX;
use crd_provider::declaration::{state, Declaration};
use crd_provider::error::{Diagnostic, ProviderError, Severity};
use crd_provider::lifecycle::model::parse_import_id;
use crd_provider::lifecycle::LifecycleOptions;
use crd_provider::provider::Provider;
use crd_provider::types::lookup;

#[derive(Parser)]
#[command(name = "crd-provider", version, about = "Manage Kubernetes custom resources declaratively")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print every resource, data source and manifest schema as JSON
    Schema,
    /// Validate declarations without contacting a cluster
    Validate { file: PathBuf },
    /// Render declarations as YAML manifests without contacting a cluster
    Manifest { file: PathBuf },
    /// Create or update the declared objects
    Apply { file: PathBuf },
    /// Look up an existing object by `name` or `namespace/name`
    Read { type_name: String, id: String },
    /// Adopt an existing object and print its state
    Import { type_name: String, id: String },
    /// Delete the declared objects, last declared first
    Destroy { file: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Schema => print_json(&Provider::schemas()),
        Command::Validate { file } => validate(&file),
        Command::Manifest { file } => manifest(&file),
        Command::Apply { file } => apply(&file).await,
        Command::Read { type_name, id } => read(&type_name, &id).await,
        Command::Import { type_name, id } => import(&type_name, &id).await,
        Command::Destroy { file } => destroy(&file).await,
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn load(file: &Path) -> Result<Vec<Declaration>> {
    let input = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    Declaration::parse_all(&input).with_context(|| format!("Failed to parse {}", file.display()))
}

async fn connect() -> Result<Provider> {
    let config = ProviderConfig::from_env()?;
    Ok(Provider::configure(&config).await?)
}

fn report(diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        match diagnostic.severity {
            Severity::Error => eprintln!("{}", diagnostic),
            Severity::Warning => warn!("{}", diagnostic),
        }
    }
}

/// Print the diagnostics of an error and turn it into a failure for `what`
fn fail(what: &str, err: ProviderError) -> anyhow::Error {
    report(&err.diagnostics());
    anyhow::Error::new(err).context(what.to_string())
}

fn validate(file: &Path) -> Result<()> {
    let mut failed = 0;
    for declaration in load(file)? {
        let checked = declaration
            .schema()
            .and_then(|(_, schema)| declaration.validate(&schema));
        if let Err(err) = checked {
            report(&err.diagnostics());
            failed += 1;
        }
    }

    if failed > 0 {
        bail!("{} declaration(s) in {} are invalid", failed, file.display());
    }
    info!("{} is valid", file.display());
    Ok(())
}

fn manifest(file: &Path) -> Result<()> {
    let provider = Provider::offline();
    let mut documents = Vec::new();

    for declaration in load(file)? {
        let type_name = match declaration.type_name.strip_suffix(MANIFEST_SUFFIX) {
            Some(_) => declaration.type_name.clone(),
            None => format!("{}{}", declaration.type_name, MANIFEST_SUFFIX),
        };
        let source = provider.manifest(&type_name).map_err(|e| fail(&type_name, e))?;
        let (kind, schema) = declaration.schema().map_err(|e| fail(&type_name, e))?;
        let object = declaration.object(kind, &schema).map_err(|e| fail(&type_name, e))?;
        let rendered = source.read(object).map_err(|e| fail(&type_name, e))?;
        documents.push(rendered.yaml);
    }

    print!("{}", documents.join("---\n"));
    Ok(())
}

async fn apply(file: &Path) -> Result<()> {
    let declarations = load(file)?;
    let provider = connect().await?;
    let mut states = Vec::new();

    for declaration in declarations {
        let type_name = declaration.type_name.as_str();
        let adapter = provider.resource(type_name).map_err(|e| fail(type_name, e))?;
        let kind = lookup(type_name).context("resource type disappeared from the registry")?;
        let schema = adapter.schema();
        let model = declaration
            .resource_model(kind, &schema)
            .map_err(|e| fail(type_name, e))?;

        let applied = match adapter.read(&model).await.map_err(|e| fail(type_name, e))? {
            Some(existing) => {
                let mut applied = adapter.update(model).await.map_err(|e| fail(type_name, e))?;
                applied.model.id = existing.id;
                applied
            }
            None => adapter.create(model).await.map_err(|e| fail(type_name, e))?,
        };
        report(&applied.warnings);

        let id = applied.model.id.as_deref();
        info!("{} {} is {}", type_name, id.unwrap_or_default(), applied.state);
        states.push(state(&schema, id, &applied.model.lifecycle, &applied.model.object)?);
    }

    print_json(&states)
}

async fn read(type_name: &str, id: &str) -> Result<()> {
    let kind = lookup(type_name).ok_or_else(|| fail(type_name, ProviderError::UnknownType(type_name.to_string())))?;
    let key = parse_import_id(kind, id).map_err(|e| fail(type_name, e))?;
    let provider = connect().await?;
    let source = provider.data_source(type_name).map_err(|e| fail(type_name, e))?;

    let metadata = ObjectMeta {
        name: Some(key.name),
        namespace: key.namespace,
        ..Default::default()
    };
    let model = source.read(&metadata).await.map_err(|e| fail(type_name, e))?;
    print_json(&state(
        &source.schema(),
        Some(&model.id),
        &LifecycleOptions::default(),
        &model.object,
    )?)
}

async fn import(type_name: &str, id: &str) -> Result<()> {
    let provider = connect().await?;
    let adapter = provider.resource(type_name).map_err(|e| fail(type_name, e))?;
    let model = adapter.import(id).await.map_err(|e| fail(type_name, e))?;
    print_json(&state(
        &adapter.schema(),
        model.id.as_deref(),
        &model.lifecycle,
        &model.object,
    )?)
}

async fn destroy(file: &Path) -> Result<()> {
    let declarations = load(file)?;
    let provider = connect().await?;

    for declaration in declarations.iter().rev() {
        let type_name = declaration.type_name.as_str();
        let adapter = provider.resource(type_name).map_err(|e| fail(type_name, e))?;
        let kind = lookup(type_name).context("resource type disappeared from the registry")?;
        let model = declaration
            .resource_model(kind, &adapter.schema())
            .map_err(|e| fail(type_name, e))?;

        match adapter.delete(&model).await {
            Ok(()) => {}
            Err(e) if e.is_wait_timeout() => report(&e.diagnostics()),
            Err(e) => return Err(fail(type_name, e)),
        }
    }
    Ok(())
}
