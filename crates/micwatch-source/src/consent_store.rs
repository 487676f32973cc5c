//! Windows capability consent store.
//!
//! Windows records microphone sessions under
//! `HKCU\...\CapabilityAccessManager\ConsentStore\microphone`. Desktop
//! applications live below the `NonPackaged` sub-key, every other direct
//! child is a packaged application. Each application key carries a
//! `LastUsedTimeStop` integer which is zero while capture is ongoing.

use std::io;

use winreg::RegKey;
use winreg::enums::{HKEY_CURRENT_USER, KEY_READ, RegType};

use crate::{
    Category, NON_PACKAGED, Result, SourceError, UsageRecord, UsageRecordSource,
    collect_entries, decode_stop_value, is_packaged_entry, merge_categories,
};

const CONSENT_STORE_PATH: &str =
    r"Software\Microsoft\Windows\CurrentVersion\CapabilityAccessManager\ConsentStore\microphone";
const LAST_USED_STOP: &str = "LastUsedTimeStop";

/// Reads usage records from the current user's consent store.
///
/// Keys are opened fresh on every snapshot and dropped before it returns.
pub struct ConsentStoreSource {
    path: String,
}

impl ConsentStoreSource {
    pub fn new() -> Self {
        Self::with_path(CONSENT_STORE_PATH)
    }

    /// Read a different store below HKCU, e.g. another capability.
    pub fn with_path(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    fn open(&self, path: &str, category: Category) -> Result<RegKey> {
        RegKey::predef(HKEY_CURRENT_USER)
            .open_subkey_with_flags(path, KEY_READ)
            .map_err(|source| SourceError::CategoryUnavailable { category, source })
    }

    fn non_packaged(&self) -> Result<Vec<UsageRecord>> {
        let path = format!(r"{}\{}", self.path, NON_PACKAGED);
        let key = self.open(&path, Category::NonPackaged)?;
        Ok(read_entries(&key, Category::NonPackaged, |_| true))
    }

    fn packaged(&self) -> Result<Vec<UsageRecord>> {
        let key = self.open(&self.path, Category::Packaged)?;
        Ok(read_entries(&key, Category::Packaged, is_packaged_entry))
    }
}

impl Default for ConsentStoreSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Read the stop marker of every child key accepted by `filter`.
fn read_entries(
    parent: &RegKey,
    category: Category,
    filter: impl Fn(&str) -> bool,
) -> Vec<UsageRecord> {
    collect_entries(parent.enum_keys(), category, filter, |name| {
        let app = parent.open_subkey_with_flags(name, KEY_READ)?;
        read_stop_time(&app)
    })
}

/// Read `LastUsedTimeStop`, stored as either a DWORD or a QWORD.
fn read_stop_time(app: &RegKey) -> io::Result<u64> {
    let raw = app.get_raw_value(LAST_USED_STOP)?;
    match raw.vtype {
        RegType::REG_DWORD | RegType::REG_QWORD => decode_stop_value(&raw.bytes),
        other => Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("unexpected value type {:?}", other),
        )),
    }
}

impl UsageRecordSource for ConsentStoreSource {
    fn snapshot(&mut self) -> Result<Vec<UsageRecord>> {
        Ok(merge_categories([self.non_packaged(), self.packaged()]))
    }

    fn check_available(&mut self) -> Result<()> {
        RegKey::predef(HKEY_CURRENT_USER)
            .open_subkey_with_flags(&self.path, KEY_READ)
            .map(drop)
            .map_err(SourceError::StoreUnavailable)
    }

    fn name(&self) -> &str {
        "windows-consent-store"
    }
}
