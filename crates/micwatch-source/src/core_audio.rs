//! macOS CoreAudio input device state.
//!
//! CoreAudio does not attribute capture to applications. It does expose
//! whether the default input device is running in any process, which is
//! reported as a single device record. The default device is resolved again
//! on every snapshot so switching microphones is followed.

use std::mem;
use std::ptr;

use coreaudio_sys::{
    AudioDeviceID, AudioObjectGetPropertyData, AudioObjectID, AudioObjectPropertyAddress,
    AudioObjectPropertySelector, kAudioDevicePropertyDeviceIsRunningSomewhere,
    kAudioHardwarePropertyDefaultInputDevice, kAudioObjectPropertyScopeGlobal,
    kAudioObjectSystemObject,
};
use tracing::debug;

use crate::{Result, SourceError, UsageRecord, UsageRecordSource};

/// `kAudioObjectPropertyElementMain`
const ELEMENT_MAIN: u32 = 0;

/// `kAudioObjectUnknown`
const UNKNOWN_OBJECT: AudioObjectID = 0;

/// Reads the running state of the default input device.
#[derive(Debug, Default)]
pub struct CoreAudioSource {
    device: Option<AudioDeviceID>,
}

impl CoreAudioSource {
    pub fn new() -> Self {
        Self::default()
    }

    fn default_input_device(&mut self) -> Result<AudioDeviceID> {
        let device = get_u32(
            kAudioObjectSystemObject,
            kAudioHardwarePropertyDefaultInputDevice,
            "default input device",
        )?;
        if device == UNKNOWN_OBJECT {
            return Err(SourceError::NoInputDevice);
        }
        if self.device.replace(device) != Some(device) {
            debug!(device, "default input device changed");
        }
        Ok(device)
    }
}

/// Read a 32-bit global property of a CoreAudio object.
fn get_u32(
    object: AudioObjectID,
    selector: AudioObjectPropertySelector,
    operation: &'static str,
) -> Result<u32> {
    let address = AudioObjectPropertyAddress {
        mSelector: selector,
        mScope: kAudioObjectPropertyScopeGlobal,
        mElement: ELEMENT_MAIN,
    };
    let mut value: u32 = 0;
    let mut size = mem::size_of::<u32>() as u32;

    // SAFETY: `value` outlives the call and `size` is its exact size in bytes.
    let status = unsafe {
        AudioObjectGetPropertyData(
            object,
            &address,
            0,
            ptr::null(),
            &mut size,
            (&mut value as *mut u32).cast(),
        )
    };
    if status != 0 {
        return Err(SourceError::CoreAudio { operation, status });
    }
    Ok(value)
}

impl UsageRecordSource for CoreAudioSource {
    fn snapshot(&mut self) -> Result<Vec<UsageRecord>> {
        let device = self.default_input_device()?;
        let running = get_u32(
            device,
            kAudioDevicePropertyDeviceIsRunningSomewhere,
            "device running state",
        )?;
        Ok(vec![UsageRecord::input_device(device, running != 0)])
    }

    fn check_available(&mut self) -> Result<()> {
        self.default_input_device().map(drop)
    }

    fn name(&self) -> &str {
        "macos-core-audio"
    }
}
