//! Executors for the three command verbs.
//!
//! | verb        | Windows              | elsewhere        |
//! |-------------|----------------------|------------------|
//! | `launch`    | [`ShellLauncher`]    | [`ShellLauncher`]|
//! | `sendkeys`  | `SendInputInjector`  | [`DryRunInjector`] |
//! | `show_icon` | [`LogNotifier`]      | [`LogNotifier`]  |

pub mod keystroke;
pub mod launcher;
pub mod mock;
pub mod notifier;

pub use keystroke::DryRunInjector;
#[cfg(target_os = "windows")]
pub use keystroke::SendInputInjector;
pub use launcher::{split_launch_target, ShellLauncher};
pub use notifier::LogNotifier;
