//! PlugScan - plugin archive discovery and type registry

pub mod config;
pub mod error;
pub mod plugins;

pub use config::ProfileConfig;
pub use error::{PlugError, ResolutionError, Result};
