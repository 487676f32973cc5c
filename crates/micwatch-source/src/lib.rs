//! Per-application microphone usage records for micwatch.
//!
//! This crate provides a trait-based abstraction over the platform store that
//! remembers which applications captured audio and when they stopped. The
//! monitor only ever sees [`UsageRecord`] snapshots, so it can be driven by
//! fake sources in tests.

#[cfg(windows)]
mod consent_store;
#[cfg(target_os = "macos")]
mod core_audio;

use std::fmt;
use std::io;

#[cfg(windows)]
pub use consent_store::ConsentStoreSource;
#[cfg(target_os = "macos")]
pub use core_audio::CoreAudioSource;
use thiserror::Error;
use tracing::{debug, trace};

/// Stop-time value meaning the application has not stopped capturing.
pub const ACTIVE_SENTINEL: u64 = 0;

/// Name of the sub-store holding conventional desktop applications.
pub const NON_PACKAGED: &str = "NonPackaged";

/// Errors that can occur while reading usage records.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("{category} records are unavailable: {source}")]
    CategoryUnavailable {
        category: Category,
        #[source]
        source: io::Error,
    },

    #[error("usage record for {identity} is unreadable: {source}")]
    EntryUnreadable {
        identity: String,
        #[source]
        source: io::Error,
    },

    #[error("microphone consent store is unavailable: {0}")]
    StoreUnavailable(#[source] io::Error),

    #[error("no default input device")]
    NoInputDevice,

    #[error("CoreAudio query for {operation} failed with status {status}")]
    CoreAudio { operation: &'static str, status: i32 },

    #[error("no microphone usage source for platform {0}")]
    Unsupported(&'static str),
}

/// Result type for record source operations.
pub type Result<T> = std::result::Result<T, SourceError>;

/// Which part of the consent store a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Conventional desktop applications
    NonPackaged,
    /// Packaged or sandboxed applications
    Packaged,
    /// A whole audio input device rather than one application
    InputDevice,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::NonPackaged => f.write_str("non-packaged"),
            Category::Packaged => f.write_str("packaged"),
            Category::InputDevice => f.write_str("input-device"),
        }
    }
}

/// One application's most recent microphone session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageRecord {
    /// Opaque application identity, kept for attribution
    pub identity: String,
    pub category: Category,
    /// When capture stopped. `Some(0)` means still capturing, `None` means
    /// no stop marker could be read.
    pub end_timestamp: Option<u64>,
}

impl UsageRecord {
    pub fn new(identity: impl Into<String>, category: Category, end_timestamp: Option<u64>) -> Self {
        Self {
            identity: identity.into(),
            category,
            end_timestamp,
        }
    }

    /// Build a record from the outcome of reading its stop-time value.
    ///
    /// A missing or unreadable value yields a record without a stop marker,
    /// which never counts as active.
    pub fn from_stop_value(
        identity: impl Into<String>,
        category: Category,
        value: io::Result<u64>,
    ) -> Self {
        let identity = identity.into();
        let end_timestamp = match value {
            Ok(stop) => Some(stop),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                let error = SourceError::EntryUnreadable {
                    identity: identity.clone(),
                    source: e,
                };
                trace!(%error, "treating entry as inactive");
                None
            }
        };
        Self {
            identity,
            category,
            end_timestamp,
        }
    }

    /// Record for an input device that is either running or not.
    ///
    /// A device has no stop time, so an idle device carries no marker.
    pub fn input_device(device: u32, running: bool) -> Self {
        Self {
            identity: format!("input-device-{}", device),
            category: Category::InputDevice,
            end_timestamp: running.then_some(ACTIVE_SENTINEL),
        }
    }

    /// True if the record says capture is ongoing.
    pub fn is_active(&self) -> bool {
        self.end_timestamp == Some(ACTIVE_SENTINEL)
    }
}

/// Whether a direct child of the consent store is a packaged application.
pub fn is_packaged_entry(name: &str) -> bool {
    name != NON_PACKAGED
}

/// Decode a stop-time value stored as a little-endian DWORD or QWORD.
pub fn decode_stop_value(bytes: &[u8]) -> io::Result<u64> {
    match *bytes {
        [a, b, c, d] => Ok(u32::from_le_bytes([a, b, c, d]).into()),
        [a, b, c, d, e, f, g, h] => Ok(u64::from_le_bytes([a, b, c, d, e, f, g, h])),
        _ => Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("stop time has {} bytes, expected 4 or 8", bytes.len()),
        )),
    }
}

/// Read one record per entry name accepted by `filter`.
///
/// An enumeration error ends the walk, records read before it are kept.
pub fn collect_entries<N, F, R>(
    names: N,
    category: Category,
    filter: F,
    mut read_stop: R,
) -> Vec<UsageRecord>
where
    N: IntoIterator<Item = io::Result<String>>,
    F: Fn(&str) -> bool,
    R: FnMut(&str) -> io::Result<u64>,
{
    let mut records = Vec::new();
    for name in names {
        let name = match name {
            Ok(name) => name,
            Err(e) => {
                trace!(%category, error = %e, "stopped enumerating entries");
                break;
            }
        };
        if !filter(&name) {
            continue;
        }
        let value = read_stop(&name);
        records.push(UsageRecord::from_stop_value(name, category, value));
    }
    records
}

/// Join the records of independently read categories.
///
/// An unavailable category contributes no records and does not affect the
/// others.
pub fn merge_categories<I>(parts: I) -> Vec<UsageRecord>
where
    I: IntoIterator<Item = Result<Vec<UsageRecord>>>,
{
    let mut records = Vec::new();
    for part in parts {
        match part {
            Ok(found) => records.extend(found),
            Err(error) => debug!(%error, "skipping category"),
        }
    }
    records
}

/// A queryable store of per-application usage records.
///
/// Implement this trait to add new platforms. Snapshots must be cheap enough
/// to take once per poll interval indefinitely, and every OS handle acquired
/// during a snapshot must be released before it returns.
pub trait UsageRecordSource {
    /// Read the current set of records. No ordering is guaranteed.
    fn snapshot(&mut self) -> Result<Vec<UsageRecord>>;

    /// Verify the store can be opened at all. Called once at startup.
    fn check_available(&mut self) -> Result<()> {
        Ok(())
    }

    /// Returns the name of this source for logging/debugging.
    fn name(&self) -> &str;
}

impl<T: UsageRecordSource + ?Sized> UsageRecordSource for Box<T> {
    fn snapshot(&mut self) -> Result<Vec<UsageRecord>> {
        (**self).snapshot()
    }

    fn check_available(&mut self) -> Result<()> {
        (**self).check_available()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// The record source for the current platform.
#[cfg(windows)]
pub fn default_source() -> Result<Box<dyn UsageRecordSource>> {
    Ok(Box::new(ConsentStoreSource::new()))
}

/// The record source for the current platform.
#[cfg(target_os = "macos")]
pub fn default_source() -> Result<Box<dyn UsageRecordSource>> {
    Ok(Box::new(CoreAudioSource::new()))
}

/// The record source for the current platform.
#[cfg(not(any(windows, target_os = "macos")))]
pub fn default_source() -> Result<Box<dyn UsageRecordSource>> {
    Err(SourceError::Unsupported(std::env::consts::OS))
}
