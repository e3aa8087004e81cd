//! Async filesystem primitives shared by config, event log and capture code

pub mod dir;
pub mod file;

pub use dir::Dir;
pub use file::File;
