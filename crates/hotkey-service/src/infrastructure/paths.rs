//! Location of the hotkey map for the active user.
//!
//! The service runs as a system account, so its own profile directory is the
//! wrong place to look.  On Windows the config file lives in the profile of
//! the user logged on at the physical console:
//!
//! ```text
//! <profile>\AppData\Local\HotkeyBridge\hotkey_map.json
//! ```
//!
//! When no console user can be resolved (e.g. when the binary is started by
//! hand during development), `%LOCALAPPDATA%` of the current process is used.
//! On Linux the file lives in `$XDG_CONFIG_HOME/hotkey-bridge/` or
//! `~/.config/hotkey-bridge/`.

use std::path::PathBuf;

/// File name written by the editing GUI.
pub const CONFIG_FILE_NAME: &str = "hotkey_map.json";

/// Resolves the config file path for the active user.
///
/// Returns `None` when no base directory can be determined from the
/// environment; the caller should then require `--config`.
pub fn default_config_path() -> Option<PathBuf> {
    platform_config_dir().map(|dir| dir.join(CONFIG_FILE_NAME))
}

fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        console_user_profile()
            .map(|p| p.join("AppData").join("Local"))
            .or_else(|| std::env::var_os("LOCALAPPDATA").map(PathBuf::from))
            .map(|p| p.join("HotkeyBridge"))
    }

    #[cfg(not(target_os = "windows"))]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("hotkey-bridge"))
    }
}

/// Profile directory of the user attached to the physical console session.
///
/// Requires the `SeTcbPrivilege` held by services running as LocalSystem.
#[cfg(target_os = "windows")]
fn console_user_profile() -> Option<PathBuf> {
    use windows::core::PWSTR;
    use windows::Win32::Foundation::{CloseHandle, HANDLE};
    use windows::Win32::System::RemoteDesktop::{WTSGetActiveConsoleSessionId, WTSQueryUserToken};
    use windows::Win32::UI::Shell::GetUserProfileDirectoryW;

    const NO_SESSION: u32 = 0xFFFF_FFFF;

    unsafe {
        let session = WTSGetActiveConsoleSessionId();
        if session == NO_SESSION {
            tracing::debug!("no active console session");
            return None;
        }

        let mut token = HANDLE::default();
        if let Err(e) = WTSQueryUserToken(session, &mut token) {
            tracing::debug!(session, "could not query console user token: {e}");
            return None;
        }

        let mut size = 260u32;
        let mut buffer = vec![0u16; size as usize];
        let result = GetUserProfileDirectoryW(token, PWSTR(buffer.as_mut_ptr()), &mut size);
        let _ = CloseHandle(token);
        if let Err(e) = result {
            tracing::debug!(session, "could not resolve console user profile: {e}");
            return None;
        }

        let len = buffer.iter().position(|&c| c == 0).unwrap_or(buffer.len());
        Some(PathBuf::from(String::from_utf16_lossy(&buffer[..len])))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
