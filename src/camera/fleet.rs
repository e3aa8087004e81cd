//! Camera fleet manager
//!
//! Owns one handle per configured camera and drives the per-camera state
//! machine (disconnected <-> connected). Captures fan out one task per
//! camera; a failing camera is logged and reported as `None` in the result
//! map without aborting its siblings.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Local};
use futures::future::join_all;
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::camera::artifact;
use crate::camera::descriptor::{
    load_descriptors, validate, validate_descriptor, CameraDescriptor, CameraKind,
};
use crate::camera::driver::{
    CameraDriver, EndpointParams, KeyenceCamera, LinkState, UsbCamera,
};
use crate::errors::StationError;

/// Runtime handle for one camera: descriptor, transport driver and the most
/// recent capture artifact.
pub struct CameraHandle {
    descriptor: CameraDescriptor,
    driver: Box<dyn CameraDriver>,
    last_image: Option<PathBuf>,
}

impl CameraHandle {
    fn new(descriptor: CameraDescriptor) -> Result<Self, StationError> {
        let driver = build_driver(&descriptor)?;
        Ok(Self {
            descriptor,
            driver,
            last_image: None,
        })
    }

    pub fn descriptor(&self) -> &CameraDescriptor {
        &self.descriptor
    }

    pub fn state(&self) -> LinkState {
        self.driver.state()
    }

    pub fn last_image(&self) -> Option<&Path> {
        self.last_image.as_deref()
    }

    async fn connect(&mut self) -> bool {
        self.driver.connect().await
    }

    async fn disconnect(&mut self) -> bool {
        self.driver.disconnect().await
    }

    async fn reconnect(&mut self) -> bool {
        self.driver.disconnect().await;
        self.driver.connect().await
    }

    /// Disconnect, swap endpoint parameters, reconnect.
    ///
    /// The descriptor is updated alongside the driver so config-level status
    /// checks see the new endpoint.
    async fn reset(&mut self, params: &EndpointParams) -> bool {
        self.driver.disconnect().await;
        self.driver.apply(params);

        match self.descriptor.kind {
            CameraKind::Usb => {
                if let Some(device) = &params.device {
                    self.descriptor.device = Some(device.clone());
                }
            }
            CameraKind::Keyence => {
                if let Some(ip) = &params.ip {
                    self.descriptor.ip = Some(ip.clone());
                }
                if let Some(port) = params.port {
                    self.descriptor.port = Some(port);
                }
            }
            CameraKind::Unknown => {}
        }

        self.driver.connect().await
    }

    async fn capture(&mut self, artifact_dir: &Path) -> Result<PathBuf, StationError> {
        let path = self.driver.capture(artifact_dir).await?;
        self.last_image = Some(path.clone());
        Ok(path)
    }
}

fn build_driver(descriptor: &CameraDescriptor) -> Result<Box<dyn CameraDriver>, StationError> {
    validate_descriptor(descriptor)?;
    let driver: Box<dyn CameraDriver> = match descriptor.kind {
        CameraKind::Usb => Box::new(UsbCamera::new(
            descriptor.device.clone().unwrap_or_default(),
        )),
        CameraKind::Keyence => Box::new(KeyenceCamera::new(
            descriptor.ip.clone().unwrap_or_default(),
            descriptor.port.unwrap_or_default(),
        )),
        CameraKind::Unknown => {
            return Err(StationError::Validation(format!(
                "unknown camera type for camera {}",
                descriptor.id
            )))
        }
    };
    Ok(driver)
}

/// Status report entry for one camera
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CameraStatus {
    pub id: u32,
    pub status: LinkState,
}

struct FleetSlot {
    id: u32,
    handle: Arc<Mutex<CameraHandle>>,
}

/// Manages the configured set of cameras.
///
/// Each handle is mutated only by operations addressed to its id; the slot
/// list itself is mutated (add/remove) only from the controlling task, never
/// concurrently with a capture fan-out.
pub struct FleetManager {
    slots: Vec<FleetSlot>,
    auto_reconnect: bool,
    artifact_dir: PathBuf,
}

impl FleetManager {
    /// Build a fleet from validated descriptors
    pub fn new(
        descriptors: Vec<CameraDescriptor>,
        auto_reconnect: bool,
        artifact_dir: impl Into<PathBuf>,
    ) -> Result<Self, StationError> {
        validate(&descriptors)?;

        let mut slots = Vec::with_capacity(descriptors.len());
        for descriptor in descriptors {
            let id = descriptor.id;
            if slots.iter().any(|slot: &FleetSlot| slot.id == id) {
                return Err(StationError::Validation(format!(
                    "duplicate camera id {}",
                    id
                )));
            }
            slots.push(FleetSlot {
                id,
                handle: Arc::new(Mutex::new(CameraHandle::new(descriptor)?)),
            });
        }

        Ok(Self {
            slots,
            auto_reconnect,
            artifact_dir: artifact_dir.into(),
        })
    }

    /// Build a fleet from a loaded configuration object
    pub fn from_config(
        config: &Map<String, Value>,
        artifact_dir: impl Into<PathBuf>,
    ) -> Result<Self, StationError> {
        let descriptors = load_descriptors(config)?;
        let auto_reconnect = config
            .get("autoReconnect")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        Self::new(descriptors, auto_reconnect, artifact_dir)
    }

    /// Number of cameras in the fleet
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Camera ids in configuration order
    pub fn ids(&self) -> Vec<u32> {
        self.slots.iter().map(|slot| slot.id).collect()
    }

    fn find(&self, id: u32) -> Result<Arc<Mutex<CameraHandle>>, StationError> {
        self.slots
            .iter()
            .find(|slot| slot.id == id)
            .map(|slot| Arc::clone(&slot.handle))
            .ok_or_else(|| StationError::NotFound(format!("camera {} not found", id)))
    }

    /// Connect every camera sequentially; failures are logged, not raised
    pub async fn connect_all(&self) {
        for slot in &self.slots {
            let mut handle = slot.handle.lock().await;
            if handle.connect().await {
                debug!("Camera {} connected", slot.id);
            } else {
                error!("Failed to connect camera {}", slot.id);
            }
        }
    }

    /// Disconnect every camera sequentially
    pub async fn disconnect_all(&self) {
        for slot in &self.slots {
            slot.handle.lock().await.disconnect().await;
        }
    }

    /// Connect one camera by id
    pub async fn connect_one(&self, id: u32) -> Result<bool, StationError> {
        let handle = self.find(id)?;
        let mut handle = handle.lock().await;
        Ok(handle.connect().await)
    }

    /// Disconnect one camera by id
    pub async fn disconnect_one(&self, id: u32) -> Result<bool, StationError> {
        let handle = self.find(id)?;
        let mut handle = handle.lock().await;
        Ok(handle.disconnect().await)
    }

    /// Disconnect then connect one camera by id
    pub async fn reconnect_one(&self, id: u32) -> Result<bool, StationError> {
        let handle = self.find(id)?;
        let mut handle = handle.lock().await;
        Ok(handle.reconnect().await)
    }

    /// Disconnect, apply new endpoint parameters, reconnect
    pub async fn reset_one(&self, id: u32, params: EndpointParams) -> Result<bool, StationError> {
        let handle = self.find(id)?;
        let mut handle = handle.lock().await;
        Ok(handle.reset(&params).await)
    }

    /// Validate and append a new camera.
    ///
    /// Returns a display-ready status string rather than an error so callers
    /// can surface it directly.
    pub async fn add_camera(&mut self, descriptor: CameraDescriptor) -> String {
        if self.slots.iter().any(|slot| slot.id == descriptor.id) {
            return format!("error: duplicate camera id {}", descriptor.id);
        }
        if self.slots.len() >= crate::camera::descriptor::MAX_CAMERAS {
            return format!(
                "error: fleet is full ({} cameras)",
                crate::camera::descriptor::MAX_CAMERAS
            );
        }
        match CameraHandle::new(descriptor) {
            Ok(handle) => {
                let id = handle.descriptor().id;
                self.slots.push(FleetSlot {
                    id,
                    handle: Arc::new(Mutex::new(handle)),
                });
                info!("Camera {} added to fleet", id);
                "added".to_string()
            }
            Err(e) => format!("error: {}", e),
        }
    }

    /// Remove a camera by id; returns a display-ready status string
    pub async fn remove_camera(&mut self, id: u32) -> String {
        let before = self.slots.len();
        self.slots.retain(|slot| slot.id != id);
        if self.slots.len() == before {
            return "error: camera not found".to_string();
        }
        info!("Camera {} removed from fleet", id);
        "removed".to_string()
    }

    /// Report status for every camera.
    ///
    /// When auto-reconnect is enabled, a disconnected camera gets one inline
    /// reconnect attempt (sequentially, in fleet order) before its status is
    /// reported; a failed attempt is logged, never raised.
    pub async fn status_all(&self) -> Vec<CameraStatus> {
        let mut statuses = Vec::with_capacity(self.slots.len());
        for slot in &self.slots {
            let mut handle = slot.handle.lock().await;
            if handle.state() != LinkState::Connected && self.auto_reconnect {
                if !handle.connect().await {
                    error!("Failed to connect camera {}", slot.id);
                }
            }
            statuses.push(CameraStatus {
                id: slot.id,
                status: handle.state(),
            });
        }
        statuses
    }

    /// Capture from one camera or from the whole fleet.
    ///
    /// With `cam_id = None` every camera gets its own capture task; per-task
    /// failures are logged and recorded as `None` under the failing camera's
    /// id. The result map is assembled from completed tasks only, so sibling
    /// captures never see each other's state.
    pub async fn capture(
        &self,
        cam_id: Option<u32>,
    ) -> Result<HashMap<u32, Option<PathBuf>>, StationError> {
        let targets: Vec<(u32, Arc<Mutex<CameraHandle>>)> = match cam_id {
            Some(id) => vec![(id, self.find(id)?)],
            None => self
                .slots
                .iter()
                .map(|slot| (slot.id, Arc::clone(&slot.handle)))
                .collect(),
        };

        let tasks: Vec<_> = targets
            .into_iter()
            .map(|(id, handle)| {
                let artifact_dir = self.artifact_dir.clone();
                tokio::spawn(async move {
                    let mut handle = handle.lock().await;
                    match handle.capture(&artifact_dir).await {
                        Ok(path) => (id, Some(path)),
                        Err(e) => {
                            error!("Failed to capture image from camera {}: {}", id, e);
                            (id, None)
                        }
                    }
                })
            })
            .collect();

        let mut results = HashMap::new();
        for joined in join_all(tasks).await {
            match joined {
                Ok((id, outcome)) => {
                    results.insert(id, outcome);
                }
                Err(e) => {
                    // A panicking capture task loses its id attribution; the
                    // mock drivers never panic, so surface it loudly.
                    error!("Capture task failed to join: {}", e);
                }
            }
        }
        Ok(results)
    }

    /// Path of the most recent capture for `id`, if any
    pub async fn latest_image(&self, id: u32) -> Result<Option<PathBuf>, StationError> {
        let handle = self.find(id)?;
        let handle = handle.lock().await;
        Ok(handle.last_image().map(Path::to_path_buf))
    }

    /// Decode the most recent capture for `id` into pixel data
    pub async fn latest_pixels(
        &self,
        id: u32,
    ) -> Result<Option<image::DynamicImage>, StationError> {
        match self.latest_image(id).await? {
            Some(path) => Ok(Some(image::open(path)?)),
            None => Ok(None),
        }
    }

    /// Copy the most recent capture for `id` into `dest_dir`, named
    /// `{serial}_{status}_{timestamp}` (absent components omitted) with the
    /// original extension preserved.
    ///
    /// Fails when no capture has happened yet.
    pub async fn save_latest_image(
        &self,
        id: u32,
        dest_dir: &Path,
        serial: Option<&str>,
        status: Option<&str>,
        timestamp: Option<DateTime<Local>>,
    ) -> Result<PathBuf, StationError> {
        let handle = self.find(id)?;
        let handle = handle.lock().await;
        let source = handle.last_image().ok_or_else(|| {
            StationError::Camera(format!("no image captured yet for camera {}", id))
        })?;

        let extension = source
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("jpg");
        let stem = artifact::artifact_stem(serial, status, timestamp.unwrap_or_else(Local::now));

        tokio::fs::create_dir_all(dest_dir).await?;
        let dest = artifact::unique_path(dest_dir, &stem, extension);
        tokio::fs::copy(source, &dest).await?;
        debug!("Saved capture for camera {} to {}", id, dest.display());
        Ok(dest)
    }
}
