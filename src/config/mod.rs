//! Station configuration
//!
//! The station reads a single JSON file with the top-level keys `cameras`,
//! `serialMapping`, `autoReconnect`, `paths` and `scanner`. The file is kept
//! as a raw JSON object so editors such as the mapping manager can rewrite it
//! without dropping keys they do not own.

pub mod loader;
pub mod paths;

pub use loader::{general_settings, ConfigLoader, GeneralSettings, ScannerSettings};
pub use paths::PathResolver;
