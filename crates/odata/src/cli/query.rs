//! Query and get command implementation

use super::output;
use crate::{InMemoryProvider, JsonWriter, ODataError, QueryOptions, Schema, Service};
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;

/// Configuration for the query and get commands
pub struct QueryConfig {
    pub schema: PathBuf,
    pub data: PathBuf,
    pub entity_set: String,
    /// Key literal for a single read; `None` queries the whole set
    pub key: Option<String>,
    pub options: QueryOptions,
    pub pretty: bool,
    pub output_file: Option<PathBuf>,
}

/// Run a query and write the response
///
/// A request that fails inside the service still produces a response body:
/// the error envelope is written in place of the payload before the command
/// reports failure.
pub fn query(config: QueryConfig) -> Result<()> {
    let service = load(&config)?;
    match respond(&service, &config) {
        Ok(body) => output::write_output(&body, config.output_file.as_deref()),
        Err(error) => {
            let envelope = output::format_json(&error.to_envelope(), config.pretty)?;
            output::write_output(&envelope, config.output_file.as_deref())?;
            let status = error.status();
            Err(anyhow::Error::new(error).context(format!("Request failed with status {}", status)))
        }
    }
}

/// Run a query and return the response body
pub fn run(config: &QueryConfig) -> Result<String> {
    let service = load(config)?;
    Ok(respond(&service, config)?)
}

fn load(config: &QueryConfig) -> Result<Service<InMemoryProvider>> {
    let schema = Schema::from_file(&config.schema)
        .with_context(|| format!("Failed to load schema: {}", config.schema.display()))?;
    let schema = Arc::new(schema);
    let provider = InMemoryProvider::from_file(schema.clone(), &config.data)
        .with_context(|| format!("Failed to load data: {}", config.data.display()))?;
    log::debug!("Loaded {} and {}", config.schema.display(), config.data.display());
    Ok(Service::new(schema, provider))
}

fn respond(service: &Service<InMemoryProvider>, config: &QueryConfig) -> Result<String, ODataError> {
    let mut writer = if config.pretty {
        JsonWriter::pretty(Vec::new())
    } else {
        JsonWriter::buffer()
    };
    match &config.key {
        Some(key) => service.read_literal(&config.entity_set, key, &config.options, &mut writer)?,
        None => {
            let count = service.query(&config.entity_set, &config.options, &mut writer)?;
            log::debug!("Wrote {} entities of {}", count, config.entity_set);
        }
    }
    Ok(writer.as_str().to_string())
}
