// Re-export from sub-crates
pub use micwatch_core::{
    APP_NAME, Config, ConfigManager, DEFAULT_LOG_LEVEL, EventKind, LOG_ENV,
    MicState, OutputFormat, StateEvent,
};
pub use micwatch_source::{
    Category, SourceError, UsageRecord, UsageRecordSource, default_source,
};

pub mod cli;
pub mod monitor;
pub mod sink;

pub use monitor::{Monitor, reduce};
pub use sink::{EventSink, SinkError, StreamSink};

// Version from this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
