//! Program launcher.
//!
//! A launch target is one string from the hotkey map, e.g.
//! `"notepad C:\notes\todo.txt"`.  It is split at the first space into a
//! program and a raw argument string.  A target that starts with a space, or
//! has no space at all, is treated as a program name on its own.
//!
//! On Windows the program is opened with `ShellExecuteW`, so registered
//! application names and URIs like `ms-settings:` resolve the same way they
//! do from the Run dialog.  Elsewhere the program is spawned directly and
//! the arguments are split on whitespace.  Neither path goes through a
//! command interpreter, so `&`, `|` and `^` in a target are plain text.

use std::io;

use tracing::{debug, info};

use crate::application::dispatch::{AppLauncher, ExecutionError};

/// Splits a launch target into `(program, arguments)`.
pub fn split_launch_target(target: &str) -> (&str, Option<&str>) {
    match target.find(' ') {
        Some(index) if index > 0 => (&target[..index], Some(&target[index + 1..])),
        _ => (target, None),
    }
}

/// Starts programs through the platform shell.
#[derive(Debug, Default, Clone, Copy)]
pub struct ShellLauncher;

impl ShellLauncher {
    pub fn new() -> Self {
        Self
    }

    #[cfg(target_os = "windows")]
    fn start(program: &str, args: Option<&str>) -> io::Result<()> {
        use windows::core::{w, HSTRING, PCWSTR};
        use windows::Win32::Foundation::HWND;
        use windows::Win32::UI::Shell::ShellExecuteW;
        use windows::Win32::UI::WindowsAndMessaging::SW_SHOWNORMAL;

        let file = HSTRING::from(program);
        let params = args.map(HSTRING::from);
        let params = params
            .as_ref()
            .map_or(PCWSTR::null(), |p| PCWSTR(p.as_ptr()));

        // Values above 32 mean success; anything else is a legacy error code.
        let result = unsafe {
            ShellExecuteW(
                HWND::default(),
                w!("open"),
                PCWSTR(file.as_ptr()),
                params,
                PCWSTR::null(),
                SW_SHOWNORMAL,
            )
        };
        if result.0 as usize > 32 {
            info!(program, "launched");
            Ok(())
        } else {
            Err(io::Error::last_os_error())
        }
    }

    #[cfg(not(target_os = "windows"))]
    fn start(program: &str, args: Option<&str>) -> io::Result<()> {
        let mut command = std::process::Command::new(program);
        if let Some(args) = args {
            command.args(args.split_whitespace());
        }
        let child = command.spawn()?;
        info!(program, pid = child.id(), "launched");
        reap(child);
        Ok(())
    }
}

impl AppLauncher for ShellLauncher {
    fn launch(&self, target: &str) -> Result<(), ExecutionError> {
        let (program, args) = split_launch_target(target);
        debug!(program, args = args.unwrap_or(""), "launching");

        Self::start(program, args).map_err(|source| ExecutionError::Launch {
            target: target.to_string(),
            source,
        })
    }
}

/// Waits for the child on a background thread so it does not linger as a
/// zombie.  The agent never looks at the exit status.
#[cfg(not(target_os = "windows"))]
fn reap(mut child: std::process::Child) {
    std::thread::spawn(move || {
        let _ = child.wait();
    });
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_program_and_arguments_at_first_space() {
        assert_eq!(
            split_launch_target("notepad C:\\notes\\todo list.txt"),
            ("notepad", Some("C:\\notes\\todo list.txt"))
        );
    }

    #[test]
    fn test_split_without_space_is_program_only() {
        assert_eq!(split_launch_target("calc"), ("calc", None));
    }

    #[test]
    fn test_split_leading_space_keeps_whole_target() {
        assert_eq!(split_launch_target(" Phone Link"), (" Phone Link", None));
    }

    #[test]
    fn test_split_trailing_space_gives_empty_arguments() {
        assert_eq!(split_launch_target("calc "), ("calc", Some("")));
    }

    #[cfg(unix)]
    #[test]
    fn test_launch_missing_program_reports_launch_error() {
        // Arrange
        let launcher = ShellLauncher::new();

        // Act
        let result = launcher.launch("definitely-not-a-real-program-4f1c --flag");

        // Assert
        match result {
            Err(ExecutionError::Launch { target, .. }) => {
                assert_eq!(target, "definitely-not-a-real-program-4f1c --flag")
            }
            other => panic!("expected launch error, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_launch_existing_program_succeeds() {
        let launcher = ShellLauncher::new();
        assert!(launcher.launch("true --ignored").is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn test_shell_metacharacters_are_passed_literally() {
        // Arrange
        let dir = std::env::temp_dir().join(format!("hotkey-launch-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let literal = dir.join("a|b&c");

        // Act
        ShellLauncher::new()
            .launch(&format!("touch {}", literal.display()))
            .unwrap();

        // Assert: touch got one argument; nothing ran `b` or `c`.
        for _ in 0..200 {
            if literal.exists() {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(10));
        }
        assert!(literal.exists());
        assert!(!dir.join("a").exists());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
