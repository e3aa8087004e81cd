//! Station Agent Library
//!
//! Core modules for the inspection-station control agent: camera fleet
//! management, serial/model mapping, operator input and event logging.

pub mod app;
pub mod camera;
pub mod config;
pub mod errors;
pub mod eventlog;
pub mod filesys;
pub mod logs;
pub mod mapping;
pub mod scanner;
