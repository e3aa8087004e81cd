//! Station controller
//!
//! Wires the camera fleet, input manager, event log and serial mapping
//! together: a serial comes in, the model is selected, every camera
//! captures, and successful artifacts are filed under the results directory
//! named by serial and model.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::{error, info};

use crate::camera::FleetManager;
use crate::config::{general_settings, ConfigLoader, PathResolver};
use crate::errors::StationError;
use crate::eventlog::EventLogger;
use crate::filesys::Dir;
use crate::mapping::MappingManager;
use crate::scanner::InputManager;

/// Fallback model label when the serial prefix is unmapped
const UNKNOWN_MODEL: &str = "unknown";

/// Connects operator input to the camera fleet and the event log
pub struct StationController {
    fleet: FleetManager,
    input: InputManager,
    events: EventLogger,
    mapping: MappingManager,
    results_dir: Dir,
}

impl StationController {
    /// Build a controller from the configuration file at `config_path`.
    ///
    /// Resolves (and creates) the working directories, constructs the fleet
    /// from the `cameras` section and opens the event append-log.
    pub async fn init(config_path: &Path) -> Result<Self, StationError> {
        let config = ConfigLoader::new(config_path).load().await?;
        let settings = general_settings(&config)?;
        let paths = PathResolver::from_config(&config, None).await?;

        let captures_dir = paths.get_or("captures", "captures").await?;
        let results_dir = paths.get_or("results", "results").await?;
        let logs_dir = paths.get_or("logs", "logs").await?;

        let fleet = FleetManager::from_config(&config, captures_dir.path())?;
        let events = EventLogger::new(logs_dir.file("events.log").path()).await?;
        let mapping = MappingManager::load(config_path).await?;
        let input = InputManager::new(settings.scanner.port.clone(), settings.scanner.baudrate);

        Ok(Self {
            fleet,
            input,
            events,
            mapping,
            results_dir,
        })
    }

    pub fn fleet(&self) -> &FleetManager {
        &self.fleet
    }

    pub fn fleet_mut(&mut self) -> &mut FleetManager {
        &mut self.fleet
    }

    pub fn mapping(&self) -> &MappingManager {
        &self.mapping
    }

    pub fn mapping_mut(&mut self) -> &mut MappingManager {
        &mut self.mapping
    }

    pub fn events(&self) -> &EventLogger {
        &self.events
    }

    pub fn input_mut(&mut self) -> &mut InputManager {
        &mut self.input
    }

    /// Connect the fleet and record the startup event
    pub async fn startup(&mut self) -> Result<(), StationError> {
        self.fleet.connect_all().await;
        let statuses = self.fleet.status_all().await;
        let mut metadata = Map::new();
        metadata.insert("cameras".to_string(), serde_json::to_value(&statuses)?);
        self.events
            .log_event("startup", "station started", Some(metadata))
            .await?;
        Ok(())
    }

    /// Handle one serial: select the model, capture from every camera, file
    /// successful artifacts, and log each step.
    ///
    /// Returns the per-camera capture map (`None` marks a failed camera).
    pub async fn process_serial(
        &mut self,
        serial: &str,
    ) -> Result<HashMap<u32, Option<PathBuf>>, StationError> {
        let model = self
            .mapping
            .select(serial, Some(UNKNOWN_MODEL))
            .unwrap_or_else(|| UNKNOWN_MODEL.to_string());
        info!("Serial {} mapped to model {}", serial, model);

        let mut metadata = Map::new();
        metadata.insert("serial".to_string(), Value::String(serial.to_string()));
        metadata.insert("model".to_string(), Value::String(model.clone()));
        self.events
            .log_event("serial", &format!("serial {} accepted", serial), Some(metadata))
            .await?;

        let results = self.fleet.capture(None).await?;
        for (id, outcome) in &results {
            match outcome {
                Some(_) => {
                    match self
                        .fleet
                        .save_latest_image(
                            *id,
                            self.results_dir.path(),
                            Some(serial),
                            Some(&model),
                            None,
                        )
                        .await
                    {
                        Ok(saved) => {
                            let mut metadata = Map::new();
                            metadata.insert(
                                "artifact".to_string(),
                                Value::String(saved.display().to_string()),
                            );
                            self.events
                                .log_event(
                                    "capture",
                                    &format!("camera {} captured", id),
                                    Some(metadata),
                                )
                                .await?;
                        }
                        Err(e) => {
                            error!("Failed to save capture from camera {}: {}", id, e);
                            self.events
                                .log_event(
                                    "capture_error",
                                    &format!("camera {} save failed: {}", id, e),
                                    None,
                                )
                                .await?;
                        }
                    }
                }
                None => {
                    self.events
                        .log_event(
                            "capture_failed",
                            &format!("camera {} capture failed", id),
                            None,
                        )
                        .await?;
                }
            }
        }

        Ok(results)
    }

    /// Read serials from the active input source until it closes.
    ///
    /// The scanner read blocks until end-of-line (operator-paced), so it runs
    /// via `block_in_place` to keep the runtime workers free.
    pub async fn serve(&mut self) -> Result<(), StationError> {
        loop {
            let serial = tokio::task::block_in_place(|| self.input.read_serial("Enter serial: "))?;
            if let Err(e) = self.process_serial(&serial).await {
                error!("Failed to process serial {}: {}", serial, e);
            }
        }
    }

    /// Record the shutdown event and disconnect the fleet
    pub async fn shutdown(&mut self) -> Result<(), StationError> {
        self.events.log_event("shutdown", "station stopping", None).await?;
        self.fleet.disconnect_all().await;
        self.input.close();
        Ok(())
    }
}
