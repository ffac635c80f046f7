//! WASAPI audio endpoints.
//!
//! Binds the default communications microphone (`eCapture`/`eCommunications`)
//! or the default console speaker (`eRender`/`eConsole`) through
//! `IAudioEndpointVolume`, and forwards `OnNotify` callbacks to subscribers.
//!
//! The endpoint is resolved once, when the service starts.  Changing the
//! default device afterwards requires a restart.

use std::sync::Mutex;

use tracing::debug;
use windows::core::implement;
use windows::Win32::Foundation::BOOL;
use windows::Win32::Media::Audio::Endpoints::{
    IAudioEndpointVolume, IAudioEndpointVolumeCallback, IAudioEndpointVolumeCallback_Impl,
};
use windows::Win32::Media::Audio::{
    eCapture, eCommunications, eConsole, eRender, EDataFlow, ERole, IMMDeviceEnumerator,
    MMDeviceEnumerator, AUDIO_VOLUME_NOTIFICATION_DATA,
};
use windows::Win32::System::Com::{
    CoCreateInstance, CoInitializeEx, CLSCTX_ALL, COINIT_MULTITHREADED,
};

use crate::application::audio_sync::{AudioEndpoint, AudioError, MuteCallback};

/// A default audio endpoint controlled through `IAudioEndpointVolume`.
pub struct WasapiEndpoint {
    volume: IAudioEndpointVolume,
    callbacks: Mutex<Vec<IAudioEndpointVolumeCallback>>,
    label: &'static str,
}

// SAFETY: COM is initialised in the multithreaded apartment before the
// interface is created, so it may be used from any thread.
unsafe impl Send for WasapiEndpoint {}
unsafe impl Sync for WasapiEndpoint {}

impl WasapiEndpoint {
    /// Opens the default communications capture device.
    pub fn default_microphone() -> Result<Self, AudioError> {
        Self::open(eCapture, eCommunications, "microphone")
    }

    /// Opens the default console render device.
    pub fn default_speaker() -> Result<Self, AudioError> {
        Self::open(eRender, eConsole, "speaker")
    }

    fn open(flow: EDataFlow, role: ERole, label: &'static str) -> Result<Self, AudioError> {
        unsafe {
            let _ = CoInitializeEx(None, COINIT_MULTITHREADED);

            let enumerator: IMMDeviceEnumerator =
                CoCreateInstance(&MMDeviceEnumerator, None, CLSCTX_ALL).map_err(platform)?;
            let device = enumerator
                .GetDefaultAudioEndpoint(flow, role)
                .map_err(|e| AudioError::Unavailable(format!("default {label}: {e}")))?;
            let volume: IAudioEndpointVolume =
                device.Activate(CLSCTX_ALL, None).map_err(platform)?;

            debug!(device = label, "bound default audio endpoint");
            Ok(Self {
                volume,
                callbacks: Mutex::new(Vec::new()),
                label,
            })
        }
    }
}

impl AudioEndpoint for WasapiEndpoint {
    fn is_muted(&self) -> Result<bool, AudioError> {
        let muted = unsafe { self.volume.GetMute() }.map_err(platform)?;
        Ok(muted.as_bool())
    }

    fn set_muted(&self, muted: bool) -> Result<(), AudioError> {
        unsafe { self.volume.SetMute(BOOL::from(muted), std::ptr::null()) }.map_err(platform)
    }

    fn subscribe(&self, on_change: MuteCallback) -> Result<(), AudioError> {
        let callback: IAudioEndpointVolumeCallback = MuteNotifier { on_change }.into();
        unsafe { self.volume.RegisterControlChangeNotify(&callback) }.map_err(platform)?;
        self.callbacks
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(callback);
        debug!(device = self.label, "subscribed to mute notifications");
        Ok(())
    }
}

impl Drop for WasapiEndpoint {
    fn drop(&mut self) {
        let callbacks = self.callbacks.get_mut().unwrap_or_else(|e| e.into_inner());
        for callback in callbacks.drain(..) {
            let _ = unsafe { self.volume.UnregisterControlChangeNotify(&callback) };
        }
    }
}

#[implement(IAudioEndpointVolumeCallback)]
struct MuteNotifier {
    on_change: MuteCallback,
}

impl IAudioEndpointVolumeCallback_Impl for MuteNotifier_Impl {
    fn OnNotify(&self, pnotify: *mut AUDIO_VOLUME_NOTIFICATION_DATA) -> windows::core::Result<()> {
        // SAFETY: the pointer is valid for the duration of the callback.
        if let Some(data) = unsafe { pnotify.as_ref() } {
            (self.on_change)(data.bMuted.as_bool());
        }
        Ok(())
    }
}

fn platform(e: windows::core::Error) -> AudioError {
    AudioError::Platform(e.to_string())
}
