//! Firmware hotkey events from the vendor WMI class.
//!
//! Subscribes to `SELECT * FROM LENOVO_UTILITY_EVENT` in `root\WMI` and
//! forwards each event's `PressTypeDataVal` as a keycode.  WMI delivery is
//! blocking, so the subscription runs on a dedicated thread that polls for
//! cancellation between one-second waits.  A failed wait pauses before the
//! next one, and repeated failures rebuild the subscription.

use std::thread;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use ::windows::Win32::System::Wmi::IEnumWbemClassObject;

use super::{
    pause_unless_cancelled, EventSourceError, KeyEventSource, WaitFailures, WaitRecovery,
    WAIT_RETRY_DELAY,
};
use crate::infrastructure::wmi::{get_property, next_object, WmiConnection, VENDOR_NAMESPACE};

const EVENT_QUERY: &str = "SELECT * FROM LENOVO_UTILITY_EVENT";
const KEY_CODE_PROPERTY: &str = "PressTypeDataVal";
const POLL_TIMEOUT_MS: i32 = 1000;

/// Opens the vendor namespace and subscribes to its hotkey events.
fn subscribe() -> ::windows::core::Result<(WmiConnection, IEnumWbemClassObject)> {
    let wmi = WmiConnection::connect(VENDOR_NAMESPACE)?;
    let events = wmi.subscribe(EVENT_QUERY)?;
    Ok((wmi, events))
}

/// Hardware hotkey source backed by WMI event notifications.
#[derive(Debug, Default)]
pub struct WmiEventSource;

impl KeyEventSource for WmiEventSource {
    fn start(
        self: Box<Self>,
        tx: mpsc::Sender<u32>,
        cancel: CancellationToken,
    ) -> Result<(), EventSourceError> {
        // The thread reports whether the subscription succeeded before we return.
        let (ready_tx, ready_rx) = std::sync::mpsc::channel();

        thread::Builder::new()
            .name("wmi-hotkey-events".into())
            .spawn(move || {
                let mut subscription = match subscribe() {
                    Ok(subscription) => {
                        let _ = ready_tx.send(Ok(()));
                        Some(subscription)
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e.to_string()));
                        return;
                    }
                };
                info!("subscribed to firmware hotkey events");
                let mut failures = WaitFailures::default();

                while !cancel.is_cancelled() {
                    let Some((_wmi, events)) = subscription.as_ref() else {
                        match subscribe() {
                            Ok(fresh) => {
                                info!("resubscribed to firmware hotkey events");
                                subscription = Some(fresh);
                            }
                            Err(e) => {
                                warn!("hotkey event resubscribe failed: {e}");
                                if !pause_unless_cancelled(WAIT_RETRY_DELAY, &cancel) {
                                    break;
                                }
                            }
                        }
                        continue;
                    };
                    let event = match next_object(events, POLL_TIMEOUT_MS) {
                        Ok(Some(event)) => {
                            failures.reset();
                            event
                        }
                        Ok(None) => {
                            failures.reset();
                            continue;
                        }
                        Err(e) => {
                            warn!("hotkey event wait failed: {e}");
                            let recovery = failures.record();
                            if matches!(recovery, WaitRecovery::Resubscribe(_)) {
                                subscription = None;
                            }
                            if !pause_unless_cancelled(recovery.delay(), &cancel) {
                                break;
                            }
                            continue;
                        }
                    };
                    let key_code = get_property(&event, KEY_CODE_PROPERTY)
                        .ok()
                        .and_then(|value| u32::try_from(&value).ok());
                    match key_code {
                        Some(code) => {
                            if tx.blocking_send(code).is_err() {
                                break;
                            }
                        }
                        None => debug!("hotkey event without a keycode"),
                    }
                }
                debug!("firmware hotkey event thread stopped");
            })?;

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(()),
            Ok(Err(reason)) => Err(EventSourceError::Subscribe(reason)),
            Err(_) => Err(EventSourceError::Subscribe("event thread exited".into())),
        }
    }
}
