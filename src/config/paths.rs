//! Working-directory resolution from the `paths` config section

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::errors::StationError;
use crate::filesys::Dir;

/// Resolves named directories from configuration.
///
/// Every directory is created when the resolver is built, so later capture
/// and log writes never race directory creation.
#[derive(Debug, Clone)]
pub struct PathResolver {
    paths: HashMap<String, Dir>,
}

impl PathResolver {
    /// Build a resolver from the `paths` section of `config`.
    ///
    /// When `base` is given, every configured path is resolved relative to it.
    /// A missing section yields an empty resolver; a section that is not an
    /// object of strings is a configuration error.
    pub async fn from_config(
        config: &Map<String, Value>,
        base: Option<&Path>,
    ) -> Result<Self, StationError> {
        let section = config
            .get("paths")
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new()));

        let raw: HashMap<String, String> = serde_json::from_value(section).map_err(|_| {
            StationError::Config("'paths' section must be an object of strings".to_string())
        })?;

        let mut paths = HashMap::new();
        for (name, value) in raw {
            let mut path = PathBuf::from(value);
            if let Some(base) = base {
                path = base.join(path);
            }
            let dir = Dir::new(path);
            dir.create().await?;
            paths.insert(name, dir);
        }

        Ok(Self { paths })
    }

    /// Look up a configured directory by name
    pub fn get(&self, name: &str) -> Option<&Dir> {
        self.paths.get(name)
    }

    /// Look up a directory, falling back to `default` (created on demand)
    pub async fn get_or(&self, name: &str, default: impl Into<PathBuf>) -> Result<Dir, StationError> {
        if let Some(dir) = self.paths.get(name) {
            return Ok(dir.clone());
        }
        let dir = Dir::new(default);
        dir.create().await?;
        Ok(dir)
    }

    /// All resolved directories
    pub fn as_map(&self) -> &HashMap<String, Dir> {
        &self.paths
    }
}
