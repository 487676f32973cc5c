//! Core types and configuration for micwatch.
//!
//! This crate provides platform-agnostic types that are shared by the
//! record sources, the monitor and the output sinks.

mod config;
mod event;
mod state;

pub use config::{Config, ConfigManager, OutputFormat, ParseFormatError};
pub use event::{EventKind, StateEvent};
pub use state::{MARKER_RUNNING, MARKER_STOPPED, MicState};

/// Application name
pub const APP_NAME: &str = "micwatch";

/// Default log level
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Environment variable holding the tracing filter
pub const LOG_ENV: &str = "MICWATCH_LOG";
