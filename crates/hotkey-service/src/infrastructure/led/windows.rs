//! Vendor WMI LED controller.
//!
//! Invokes `SetFeature(featuretype)` on the first `LENOVO_UTILITY_DATA`
//! instance in `root\WMI`.

use windows::core::{BSTR, PCWSTR, VARIANT};
use windows::Win32::System::Wmi::{IWbemClassObject, WBEM_GENERIC_FLAG_TYPE};

use super::{mic_feature_code, speaker_feature_code};
use crate::application::audio_sync::{LedController, LedError};
use crate::infrastructure::wmi::{get_property, WmiConnection, VENDOR_NAMESPACE};

const DATA_CLASS: &str = "LENOVO_UTILITY_DATA";
const SET_FEATURE: &str = "SetFeature";

/// Drives the mute LEDs through the vendor WMI method.
pub struct WmiLedController {
    connection: WmiConnection,
}

impl WmiLedController {
    /// Connects to the vendor namespace.
    pub fn connect() -> Result<Self, LedError> {
        let connection = WmiConnection::connect(VENDOR_NAMESPACE)
            .map_err(|e| LedError::Unavailable(e.to_string()))?;
        Ok(Self { connection })
    }

    fn set_feature(&self, code: u32) -> Result<(), LedError> {
        let services = self.connection.services();
        let instance = self
            .connection
            .query_first(&format!("SELECT * FROM {DATA_CLASS}"))
            .map_err(platform)?
            .ok_or_else(|| LedError::Unavailable(format!("no {DATA_CLASS} instance")))?;
        let path = BSTR::try_from(&get_property(&instance, "__PATH").map_err(platform)?)
            .map_err(platform)?;

        unsafe {
            let mut class: Option<IWbemClassObject> = None;
            services
                .GetObject(
                    &BSTR::from(DATA_CLASS),
                    WBEM_GENERIC_FLAG_TYPE(0),
                    None,
                    Some(&mut class),
                    None,
                )
                .map_err(platform)?;
            let class = class.ok_or_else(|| LedError::Unavailable(format!("no {DATA_CLASS} class")))?;

            let method = wide(SET_FEATURE);
            let mut in_signature: Option<IWbemClassObject> = None;
            class
                .GetMethod(PCWSTR(method.as_ptr()), 0, &mut in_signature, std::ptr::null_mut())
                .map_err(platform)?;
            let in_signature = in_signature
                .ok_or_else(|| LedError::Platform(format!("{SET_FEATURE} takes no input")))?;
            let params = in_signature.SpawnInstance(0).map_err(platform)?;

            let name = wide("featuretype");
            params
                .Put(PCWSTR(name.as_ptr()), 0, &VARIANT::from(code), 0)
                .map_err(platform)?;

            services
                .ExecMethod(
                    &path,
                    &BSTR::from(SET_FEATURE),
                    WBEM_GENERIC_FLAG_TYPE(0),
                    None,
                    &params,
                    None,
                    None,
                )
                .map_err(platform)?;
        }
        Ok(())
    }
}

impl LedController for WmiLedController {
    fn set_mic_led(&self, muted: bool) -> Result<(), LedError> {
        self.set_feature(mic_feature_code(muted))
    }

    fn set_speaker_led(&self, muted: bool) -> Result<(), LedError> {
        self.set_feature(speaker_feature_code(muted))
    }
}

fn wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

fn platform(e: windows::core::Error) -> LedError {
    LedError::Platform(e.to_string())
}
