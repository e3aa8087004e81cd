//! Serial-prefix to model mapping
//!
//! The first four characters of a device serial select the model under test.
//! Edits persist by rewriting the whole configuration file; unrelated keys
//! are preserved because the raw JSON object is kept alongside the mapping.
//! Single-process, single-writer. Concurrent writers are not supported.
//!
//! Edit operations return display-ready status strings (`"added"`,
//! `"error: prefix exists"`, ...) so a UI can show them without any error
//! handling of its own.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::info;

use crate::config::ConfigLoader;
use crate::errors::StationError;
use crate::filesys::File;

/// Length of the serial prefix used as the lookup key
pub const PREFIX_LEN: usize = 4;

/// Manages the `serialMapping` section of the station configuration
pub struct MappingManager {
    config_path: PathBuf,
    config: Map<String, Value>,
    mapping: BTreeMap<String, String>,
}

impl MappingManager {
    /// Load the mapping from the configuration file at `config_path`
    pub async fn load(config_path: impl Into<PathBuf>) -> Result<Self, StationError> {
        let config_path = config_path.into();
        let config = ConfigLoader::new(&config_path).load().await?;
        let mapping = mapping_section(&config)?;
        Ok(Self {
            config_path,
            config,
            mapping,
        })
    }

    /// Re-read the configuration file, replacing the in-memory mapping
    pub async fn reload(&mut self) -> Result<(), StationError> {
        self.config = ConfigLoader::new(&self.config_path).load().await?;
        self.mapping = mapping_section(&self.config)?;
        Ok(())
    }

    /// Configuration file backing this mapping
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Current prefix -> model mapping
    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.mapping
    }

    /// Model name for `serial`, keyed on its first four characters.
    ///
    /// An empty or too-short serial, or an unmapped prefix, yields `unknown`.
    pub fn select(&self, serial: &str, unknown: Option<&str>) -> Option<String> {
        if serial.is_empty() {
            return unknown.map(String::from);
        }
        let prefix: String = serial.chars().take(PREFIX_LEN).collect();
        self.mapping
            .get(&prefix)
            .cloned()
            .or_else(|| unknown.map(String::from))
    }

    /// Add a new prefix; fails with `"error: prefix exists"` when present
    pub async fn add_mapping(&mut self, prefix: &str, model: &str) -> String {
        if self.mapping.contains_key(prefix) {
            return "error: prefix exists".to_string();
        }
        self.mapping.insert(prefix.to_string(), model.to_string());
        match self.persist().await {
            Ok(()) => {
                info!("Mapping {} -> {} added", prefix, model);
                "added".to_string()
            }
            Err(e) => format!("error: {}", e),
        }
    }

    /// Replace the model for an existing prefix
    pub async fn update_mapping(&mut self, prefix: &str, model: &str) -> String {
        if !self.mapping.contains_key(prefix) {
            return "error: prefix not found".to_string();
        }
        self.mapping.insert(prefix.to_string(), model.to_string());
        match self.persist().await {
            Ok(()) => "updated".to_string(),
            Err(e) => format!("error: {}", e),
        }
    }

    /// Remove an existing prefix
    pub async fn remove_mapping(&mut self, prefix: &str) -> String {
        if self.mapping.remove(prefix).is_none() {
            return "error: prefix not found".to_string();
        }
        match self.persist().await {
            Ok(()) => "removed".to_string(),
            Err(e) => format!("error: {}", e),
        }
    }

    /// Whole-file rewrite of the configuration with the current mapping.
    ///
    /// Goes through a temp-file rename so a crash mid-write cannot truncate
    /// the config.
    async fn persist(&mut self) -> Result<(), StationError> {
        self.config.insert(
            "serialMapping".to_string(),
            serde_json::to_value(&self.mapping)?,
        );
        let contents = serde_json::to_string_pretty(&self.config)?;
        File::new(&self.config_path)
            .write_atomic(contents.as_bytes())
            .await
    }
}

fn mapping_section(config: &Map<String, Value>) -> Result<BTreeMap<String, String>, StationError> {
    match config.get("serialMapping") {
        None => Ok(BTreeMap::new()),
        Some(value) => serde_json::from_value(value.clone()).map_err(|_| {
            StationError::Config("'serialMapping' section must be an object of strings".to_string())
        }),
    }
}
