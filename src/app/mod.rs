//! Application wiring

pub mod controller;
pub mod run;

pub use controller::StationController;
pub use run::run;
