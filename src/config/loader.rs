//! Configuration file loading

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::StationError;
use crate::filesys::File;
use crate::logs::LogLevel;

/// Loads the station configuration file into a raw JSON object
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    path: PathBuf,
}

impl ConfigLoader {
    /// Create a loader for `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the configuration file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load and parse the configuration file.
    ///
    /// Fails when the file is missing, is not valid JSON, or the top level
    /// is not a JSON object.
    pub async fn load(&self) -> Result<Map<String, Value>, StationError> {
        let file = File::new(&self.path);
        if !file.exists().await {
            return Err(StationError::Config(format!(
                "config file not found: {}",
                self.path.display()
            )));
        }

        let value: Value = file.read_json().await?;
        match value {
            Value::Object(map) => Ok(map),
            _ => Err(StationError::Config(
                "top-level configuration must be a JSON object".to_string(),
            )),
        }
    }
}

/// Scanner port settings (`scanner` section)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerSettings {
    /// Serial port used in COM mode (e.g. `COM3`, `/dev/ttyUSB0`)
    #[serde(default)]
    pub port: Option<String>,

    /// Baud rate for the COM scanner
    #[serde(default = "default_baudrate")]
    pub baudrate: u32,
}

fn default_baudrate() -> u32 {
    9600
}

impl Default for ScannerSettings {
    fn default() -> Self {
        Self {
            port: None,
            baudrate: default_baudrate(),
        }
    }
}

/// Scalar settings read from the top level of the configuration file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneralSettings {
    /// Diagnostic log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Reconnect disconnected cameras opportunistically during status checks
    #[serde(default)]
    pub auto_reconnect: bool,

    /// Barcode scanner port settings
    #[serde(default)]
    pub scanner: ScannerSettings,
}

/// Extract the scalar settings from a loaded configuration object.
///
/// Unknown keys (`cameras`, `paths`, ...) are ignored here; their sections
/// have dedicated parsers.
pub fn general_settings(config: &Map<String, Value>) -> Result<GeneralSettings, StationError> {
    let settings = serde_json::from_value(Value::Object(config.clone()))?;
    Ok(settings)
}
