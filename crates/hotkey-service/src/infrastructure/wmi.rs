//! Minimal WMI client over the `windows` crate.
//!
//! The vendor firmware exposes both the hotkey event class and the LED
//! control method through WMI in the `root\WMI` namespace.  This module holds
//! the COM plumbing shared by the event source and the LED controller.

use windows::core::{BSTR, PCWSTR, VARIANT};
use windows::Win32::System::Com::{
    CoCreateInstance, CoInitializeEx, CoInitializeSecurity, CoSetProxyBlanket, CLSCTX_INPROC_SERVER,
    COINIT_MULTITHREADED, EOAC_NONE, RPC_C_AUTHN_LEVEL_CALL, RPC_C_AUTHN_LEVEL_DEFAULT,
    RPC_C_IMP_LEVEL_IMPERSONATE,
};
use windows::Win32::System::Rpc::{RPC_C_AUTHN_WINNT, RPC_C_AUTHZ_NONE};
use windows::Win32::System::Wmi::{
    IEnumWbemClassObject, IWbemClassObject, IWbemLocator, IWbemServices, WbemLocator,
    WBEM_FLAG_FORWARD_ONLY, WBEM_FLAG_RETURN_IMMEDIATELY, WBEM_INFINITE,
};

/// Namespace that hosts the vendor classes.
pub const VENDOR_NAMESPACE: &str = r"root\WMI";

/// A connected `IWbemServices` proxy.
pub struct WmiConnection {
    services: IWbemServices,
}

// SAFETY: created after joining the multithreaded apartment.
unsafe impl Send for WmiConnection {}
unsafe impl Sync for WmiConnection {}

impl WmiConnection {
    /// Joins the MTA and connects to `namespace`.
    pub fn connect(namespace: &str) -> windows::core::Result<Self> {
        unsafe {
            let _ = CoInitializeEx(None, COINIT_MULTITHREADED);
            // Fails with RPC_E_TOO_LATE once any COM call has run; that is fine.
            let _ = CoInitializeSecurity(
                None,
                -1,
                None,
                None,
                RPC_C_AUTHN_LEVEL_DEFAULT,
                RPC_C_IMP_LEVEL_IMPERSONATE,
                None,
                EOAC_NONE,
                None,
            );

            let locator: IWbemLocator = CoCreateInstance(&WbemLocator, None, CLSCTX_INPROC_SERVER)?;
            let services = locator.ConnectServer(
                &BSTR::from(namespace),
                &BSTR::new(),
                &BSTR::new(),
                &BSTR::new(),
                0,
                &BSTR::new(),
                None,
            )?;
            CoSetProxyBlanket(
                &services,
                RPC_C_AUTHN_WINNT,
                RPC_C_AUTHZ_NONE,
                PCWSTR::null(),
                RPC_C_AUTHN_LEVEL_CALL,
                RPC_C_IMP_LEVEL_IMPERSONATE,
                None,
                EOAC_NONE,
            )?;
            Ok(Self { services })
        }
    }

    pub fn services(&self) -> &IWbemServices {
        &self.services
    }

    /// Runs a WQL query and returns the first object, if any.
    pub fn query_first(&self, wql: &str) -> windows::core::Result<Option<IWbemClassObject>> {
        unsafe {
            let rows = self.services.ExecQuery(
                &BSTR::from("WQL"),
                &BSTR::from(wql),
                WBEM_FLAG_FORWARD_ONLY | WBEM_FLAG_RETURN_IMMEDIATELY,
                None,
            )?;
            next_object(&rows, WBEM_INFINITE.0)
        }
    }

    /// Subscribes to an event query; events are pulled with [`next_object`].
    pub fn subscribe(&self, wql: &str) -> windows::core::Result<IEnumWbemClassObject> {
        unsafe {
            self.services.ExecNotificationQuery(
                &BSTR::from("WQL"),
                &BSTR::from(wql),
                WBEM_FLAG_FORWARD_ONLY | WBEM_FLAG_RETURN_IMMEDIATELY,
                None,
            )
        }
    }
}

/// Pulls one object from an enumerator, waiting at most `timeout_ms`.
/// Returns `Ok(None)` on timeout or end of enumeration.
pub fn next_object(
    rows: &IEnumWbemClassObject,
    timeout_ms: i32,
) -> windows::core::Result<Option<IWbemClassObject>> {
    let mut row = [None; 1];
    let mut returned = 0u32;
    unsafe { rows.Next(timeout_ms, &mut row, &mut returned) }.ok()?;
    if returned == 0 {
        return Ok(None);
    }
    Ok(row[0].take())
}

/// Reads a property from a WMI object.
pub fn get_property(object: &IWbemClassObject, name: &str) -> windows::core::Result<VARIANT> {
    let wide: Vec<u16> = name.encode_utf16().chain(std::iter::once(0)).collect();
    let mut value = VARIANT::default();
    unsafe { object.Get(PCWSTR(wide.as_ptr()), 0, &mut value, None, None)? };
    Ok(value)
}
