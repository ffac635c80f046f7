//! Line protocol between the service and the agent.
//!
//! Wire format, one command per line:
//!
//! ```text
//! launch::<target>
//! sendkeys::<modifiersCsv>::<key>
//! show_icon::<iconName>::<theme>
//! ```
//!
//! Fields are joined by the literal two-character [`DELIMITER`] and each line
//! ends with `\n`.  Arguments are not escaped; values that would break the
//! framing are refused by [`Command::encode_line`] and rejected earlier, when
//! the configuration is loaded (see [`is_wire_safe`]).

pub mod codec;
pub mod command;

pub use codec::ProtocolError;
pub use command::Command;

/// Field separator used on the wire.
pub const DELIMITER: &str = "::";

/// Name of the local endpoint the agent listens on and the service dials.
pub const ENDPOINT_NAME: &str = "HotkeyBridgePipe";

/// Platform default endpoint address.
///
/// A named pipe on Windows; a Unix domain socket path elsewhere.
pub fn default_endpoint() -> String {
    if cfg!(windows) {
        format!(r"\\.\pipe\{ENDPOINT_NAME}")
    } else {
        std::env::temp_dir()
            .join("hotkey-bridge.sock")
            .to_string_lossy()
            .into_owned()
    }
}

/// Returns `true` if `value` can be carried as one argument without
/// desynchronising the split on [`DELIMITER`].
///
/// `last` is `true` for the final argument of a line.  Any other argument must
/// not end with `:`, since it would merge with the following delimiter.
pub fn is_wire_safe(value: &str, last: bool) -> bool {
    if value.contains(DELIMITER) || value.contains('\n') || value.contains('\r') {
        return false;
    }
    last || !value.ends_with(':')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_wire_safe_accepts_single_colons() {
        assert!(is_wire_safe("explorer.exe shell:appsFolder", true));
        assert!(is_wire_safe("C:", true));
    }

    #[test]
    fn test_is_wire_safe_rejects_delimiter_and_newlines() {
        assert!(!is_wire_safe("a::b", true));
        assert!(!is_wire_safe("line\nbreak", true));
        assert!(!is_wire_safe("carriage\r", true));
    }

    #[test]
    fn test_default_endpoint_names_the_pipe_or_socket() {
        let endpoint = default_endpoint();
        if cfg!(windows) {
            assert_eq!(endpoint, r"\\.\pipe\HotkeyBridgePipe");
        } else {
            assert!(endpoint.ends_with("hotkey-bridge.sock"));
        }
    }

    #[test]
    fn test_is_wire_safe_rejects_trailing_colon_before_delimiter() {
        assert!(!is_wire_safe("icon:", false));
    }
}
