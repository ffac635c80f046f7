//! Security descriptor for the agent's named pipe.
//!
//! The DACL is protected (no inherited entries) and grants `GENERIC_ALL` to
//! exactly two identities:
//!
//! ```text
//! D:P(A;;GA;;;SY)(A;;GA;;;<SID of the user running the agent>)
//! ```
//!
//! Everyone else, including other interactive users and unelevated
//! processes of other accounts, is denied by omission.

use std::ffi::c_void;

use windows::core::{HSTRING, PWSTR};
use windows::Win32::Foundation::{CloseHandle, LocalFree, HANDLE, HLOCAL};
use windows::Win32::Security::Authorization::{
    ConvertSidToStringSidW, ConvertStringSecurityDescriptorToSecurityDescriptorW, SDDL_REVISION_1,
};
use windows::Win32::Security::{
    GetTokenInformation, TokenUser, PSECURITY_DESCRIPTOR, SECURITY_ATTRIBUTES, TOKEN_QUERY,
    TOKEN_USER,
};
use windows::Win32::System::Threading::{GetCurrentProcess, OpenProcessToken};

use super::EndpointError;

/// An owned security descriptor, freed on drop.
pub(crate) struct PipeSecurity {
    descriptor: PSECURITY_DESCRIPTOR,
}

// The descriptor is immutable after creation and only read by the kernel.
unsafe impl Send for PipeSecurity {}
unsafe impl Sync for PipeSecurity {}

impl PipeSecurity {
    /// Builds the descriptor for the current user and SYSTEM.
    pub(crate) fn for_current_user() -> Result<Self, EndpointError> {
        let sid = current_user_sid()?;
        let sddl = format!("D:P(A;;GA;;;SY)(A;;GA;;;{sid})");

        let mut descriptor = PSECURITY_DESCRIPTOR::default();
        // SAFETY: `descriptor` receives a LocalAlloc'd buffer owned by `Self`.
        unsafe {
            ConvertStringSecurityDescriptorToSecurityDescriptorW(
                &HSTRING::from(sddl.as_str()),
                SDDL_REVISION_1,
                &mut descriptor,
                None,
            )
        }
        .map_err(|e| EndpointError::Security(format!("invalid pipe DACL {sddl:?}: {e}")))?;

        Ok(Self { descriptor })
    }

    /// Attributes to pass to `CreateNamedPipeW`.  Valid while `self` lives.
    pub(crate) fn attributes(&self) -> SECURITY_ATTRIBUTES {
        SECURITY_ATTRIBUTES {
            nLength: std::mem::size_of::<SECURITY_ATTRIBUTES>() as u32,
            lpSecurityDescriptor: self.descriptor.0,
            bInheritHandle: false.into(),
        }
    }
}

impl Drop for PipeSecurity {
    fn drop(&mut self) {
        if !self.descriptor.0.is_null() {
            // SAFETY: allocated by ConvertStringSecurityDescriptorToSecurityDescriptorW.
            unsafe {
                let _ = LocalFree(HLOCAL(self.descriptor.0));
            }
        }
    }
}

/// String SID (`S-1-5-21-...`) of the user that owns this process.
fn current_user_sid() -> Result<String, EndpointError> {
    let security = |what: &str, e: windows::core::Error| EndpointError::Security(format!("{what}: {e}"));

    unsafe {
        let mut token = HANDLE::default();
        OpenProcessToken(GetCurrentProcess(), TOKEN_QUERY, &mut token)
            .map_err(|e| security("OpenProcessToken", e))?;

        // First call reports the buffer size; its error is expected.
        let mut size = 0u32;
        let _ = GetTokenInformation(token, TokenUser, None, 0, &mut size);
        let mut buffer = vec![0u8; size as usize];
        let info = GetTokenInformation(
            token,
            TokenUser,
            Some(buffer.as_mut_ptr() as *mut c_void),
            size,
            &mut size,
        );
        let _ = CloseHandle(token);
        info.map_err(|e| security("GetTokenInformation", e))?;

        let user = &*(buffer.as_ptr() as *const TOKEN_USER);
        let mut sid_string = PWSTR::null();
        ConvertSidToStringSidW(user.User.Sid, &mut sid_string)
            .map_err(|e| security("ConvertSidToStringSidW", e))?;

        let sid = sid_string.to_string();
        let _ = LocalFree(HLOCAL(sid_string.0 as *mut c_void));
        sid.map_err(|e| EndpointError::Security(format!("SID is not valid UTF-16: {e}")))
    }
}
