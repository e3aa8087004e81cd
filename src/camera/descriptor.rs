//! Camera descriptors parsed from the `cameras` config section

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::StationError;

/// Camera fleet size limits
pub const MIN_CAMERAS: usize = 1;
pub const MAX_CAMERAS: usize = 6;

/// Camera transport type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraKind {
    /// Locally attached camera, addressed by device path
    Usb,

    /// Keyence network camera, addressed by ip/port
    Keyence,

    /// Unrecognized type string; always rejected by validation
    #[serde(other)]
    Unknown,
}

/// A camera entry from the configuration file.
///
/// The transport-specific fields stay optional at parse time so that
/// validation can report which field is missing instead of failing inside
/// the deserializer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraDescriptor {
    /// Unique, stable camera id
    pub id: u32,

    /// Display name
    #[serde(default)]
    pub name: String,

    /// Transport type
    #[serde(rename = "type")]
    pub kind: CameraKind,

    /// Device path (usb)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<PathBuf>,

    /// Network address (keyence)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,

    /// Network port (keyence)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

/// Parse the `cameras` section of a loaded configuration object.
///
/// A missing section parses as an empty list (which then fails validation);
/// a section that is not a list is a configuration error.
pub fn load_descriptors(config: &Map<String, Value>) -> Result<Vec<CameraDescriptor>, StationError> {
    let section = match config.get("cameras") {
        Some(value) => value.clone(),
        None => return Ok(Vec::new()),
    };

    if !section.is_array() {
        return Err(StationError::Config(
            "'cameras' section must be a list".to_string(),
        ));
    }

    let descriptors = serde_json::from_value(section)?;
    Ok(descriptors)
}

/// Validate a single descriptor's transport fields
pub fn validate_descriptor(descriptor: &CameraDescriptor) -> Result<(), StationError> {
    match descriptor.kind {
        CameraKind::Usb => {
            if descriptor.device.is_none() {
                return Err(StationError::Validation(format!(
                    "usb camera {} missing 'device' field",
                    descriptor.id
                )));
            }
        }
        CameraKind::Keyence => {
            if descriptor.ip.is_none() || descriptor.port.is_none() {
                return Err(StationError::Validation(format!(
                    "keyence camera {} requires 'ip' and 'port'",
                    descriptor.id
                )));
            }
        }
        CameraKind::Unknown => {
            return Err(StationError::Validation(format!(
                "unknown camera type for camera {}",
                descriptor.id
            )));
        }
    }
    Ok(())
}

/// Validate a full descriptor list: fleet size bounds plus per-entry fields
pub fn validate(descriptors: &[CameraDescriptor]) -> Result<(), StationError> {
    if !(MIN_CAMERAS..=MAX_CAMERAS).contains(&descriptors.len()) {
        return Err(StationError::Validation(format!(
            "camera list must contain between {} and {} entries, got {}",
            MIN_CAMERAS,
            MAX_CAMERAS,
            descriptors.len()
        )));
    }
    for descriptor in descriptors {
        validate_descriptor(descriptor)?;
    }
    Ok(())
}

/// Configuration-level status heuristic result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigStatus {
    Connected,
    #[serde(rename = "not found")]
    NotFound,
    Online,
    Offline,
    Unknown,
}

impl fmt::Display for ConfigStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConfigStatus::Connected => "connected",
            ConfigStatus::NotFound => "not found",
            ConfigStatus::Online => "online",
            ConfigStatus::Offline => "offline",
            ConfigStatus::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Configuration-level status heuristic.
///
/// This is a placeholder, not a health check: usb only checks that the
/// device path exists, keyence only checks that ip and port are present.
pub fn config_status(descriptor: &CameraDescriptor) -> ConfigStatus {
    match descriptor.kind {
        CameraKind::Usb => match &descriptor.device {
            Some(device) if device.exists() => ConfigStatus::Connected,
            _ => ConfigStatus::NotFound,
        },
        CameraKind::Keyence => {
            if descriptor.ip.is_some() && descriptor.port.is_some() {
                ConfigStatus::Online
            } else {
                ConfigStatus::Offline
            }
        }
        CameraKind::Unknown => ConfigStatus::Unknown,
    }
}
