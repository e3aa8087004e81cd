//! Camera fleet management
//!
//! Descriptors are parsed and validated from configuration, wrapped in mock
//! transport drivers (USB path check, Keyence network stub) and owned by the
//! [`fleet::FleetManager`], which runs captures concurrently across cameras.

pub mod artifact;
pub mod descriptor;
pub mod driver;
pub mod fleet;

pub use descriptor::{load_descriptors, validate, CameraDescriptor, CameraKind, ConfigStatus};
pub use driver::{CameraDriver, EndpointParams, LinkState};
pub use fleet::{CameraStatus, FleetManager};
