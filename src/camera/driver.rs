//! Mock camera transport drivers
//!
//! The drivers implement the capability set `{connect, disconnect, capture}`
//! behind [`CameraDriver`] so a real transport can replace a mock without
//! touching the fleet manager. The usb mock treats "device path exists" as
//! connected; the keyence mock accepts every connect without opening a
//! socket. Captures write a small stand-in `.jpg` into the artifact
//! directory.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::fs;
use uuid::Uuid;

use crate::errors::StationError;

/// Runtime connection state of a camera
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkState {
    Disconnected,
    Connected,
}

impl std::fmt::Display for LinkState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LinkState::Disconnected => f.write_str("disconnected"),
            LinkState::Connected => f.write_str("connected"),
        }
    }
}

/// Replacement endpoint parameters for a camera reset.
///
/// Only the fields relevant to the camera's transport are applied; the rest
/// are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EndpointParams {
    pub device: Option<PathBuf>,
    pub ip: Option<String>,
    pub port: Option<u16>,
}

/// Transport capability set for one camera
#[async_trait]
pub trait CameraDriver: Send {
    /// Attempt to connect; returns the resulting success flag
    async fn connect(&mut self) -> bool;

    /// Disconnect; always leaves the camera in disconnected state
    async fn disconnect(&mut self) -> bool;

    /// Capture one image into `artifact_dir`.
    ///
    /// Fails when the camera is not connected.
    async fn capture(&mut self, artifact_dir: &Path) -> Result<PathBuf, StationError>;

    /// Apply replacement endpoint parameters (used by reset)
    fn apply(&mut self, params: &EndpointParams);

    /// Current connection state
    fn state(&self) -> LinkState;
}

async fn write_mock_frame(
    artifact_dir: &Path,
    prefix: &str,
    payload: &[u8],
) -> Result<PathBuf, StationError> {
    fs::create_dir_all(artifact_dir).await?;
    let path = artifact_dir.join(format!("{}_{}.jpg", prefix, Uuid::new_v4()));
    fs::write(&path, payload).await?;
    Ok(path)
}

/// Mock usb camera driver
#[derive(Debug)]
pub struct UsbCamera {
    device: PathBuf,
    state: LinkState,
}

impl UsbCamera {
    pub fn new(device: impl Into<PathBuf>) -> Self {
        Self {
            device: device.into(),
            state: LinkState::Disconnected,
        }
    }

    pub fn device(&self) -> &Path {
        &self.device
    }
}

#[async_trait]
impl CameraDriver for UsbCamera {
    async fn connect(&mut self) -> bool {
        // Stand-in for a real device open: the path existing counts as
        // reachable.
        self.state = if fs::metadata(&self.device).await.is_ok() {
            LinkState::Connected
        } else {
            LinkState::Disconnected
        };
        self.state == LinkState::Connected
    }

    async fn disconnect(&mut self) -> bool {
        self.state = LinkState::Disconnected;
        true
    }

    async fn capture(&mut self, artifact_dir: &Path) -> Result<PathBuf, StationError> {
        if self.state != LinkState::Connected {
            return Err(StationError::Camera("camera not connected".to_string()));
        }
        write_mock_frame(artifact_dir, "usb", b"usb image").await
    }

    fn apply(&mut self, params: &EndpointParams) {
        if let Some(device) = &params.device {
            self.device = device.clone();
        }
    }

    fn state(&self) -> LinkState {
        self.state
    }
}

/// Mock Keyence network camera driver
#[derive(Debug)]
pub struct KeyenceCamera {
    ip: String,
    port: u16,
    state: LinkState,
}

impl KeyenceCamera {
    pub fn new(ip: impl Into<String>, port: u16) -> Self {
        Self {
            ip: ip.into(),
            port,
            state: LinkState::Disconnected,
        }
    }

    pub fn endpoint(&self) -> (&str, u16) {
        (&self.ip, self.port)
    }
}

#[async_trait]
impl CameraDriver for KeyenceCamera {
    async fn connect(&mut self) -> bool {
        // A real implementation would open a TCP socket to ip:port here.
        self.state = LinkState::Connected;
        true
    }

    async fn disconnect(&mut self) -> bool {
        self.state = LinkState::Disconnected;
        true
    }

    async fn capture(&mut self, artifact_dir: &Path) -> Result<PathBuf, StationError> {
        if self.state != LinkState::Connected {
            return Err(StationError::Camera("camera not connected".to_string()));
        }
        write_mock_frame(artifact_dir, "keyence", b"keyence image").await
    }

    fn apply(&mut self, params: &EndpointParams) {
        if let Some(ip) = &params.ip {
            self.ip = ip.clone();
        }
        if let Some(port) = params.port {
            self.port = port;
        }
    }

    fn state(&self) -> LinkState {
        self.state
    }
}
