//! The [`Command`] type: one unit of work sent from the service to the agent.

use std::collections::BTreeSet;

use crate::config::{modifiers_csv, Modifier, Theme};

/// Verb names as they appear on the wire.
pub mod verbs {
    pub const LAUNCH: &str = "launch";
    pub const SENDKEYS: &str = "sendkeys";
    pub const SHOW_ICON: &str = "show_icon";
}

/// A command for the interactive agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Start an application.  `target` may contain spaces; splitting it into
    /// program and arguments is the agent's concern.
    Launch { target: String },
    /// Inject a key combination.
    SendKeys {
        modifiers: BTreeSet<Modifier>,
        key: String,
    },
    /// Show a transient on-screen confirmation icon.
    ShowIcon { icon: String, theme: Theme },
}

impl Command {
    pub fn launch(target: impl Into<String>) -> Self {
        Command::Launch {
            target: target.into(),
        }
    }

    pub fn send_keys(modifiers: impl IntoIterator<Item = Modifier>, key: impl Into<String>) -> Self {
        Command::SendKeys {
            modifiers: modifiers.into_iter().collect(),
            key: key.into(),
        }
    }

    pub fn show_icon(icon: impl Into<String>, theme: Theme) -> Self {
        Command::ShowIcon {
            icon: icon.into(),
            theme,
        }
    }

    /// The wire verb.
    pub fn verb(&self) -> &'static str {
        match self {
            Command::Launch { .. } => verbs::LAUNCH,
            Command::SendKeys { .. } => verbs::SENDKEYS,
            Command::ShowIcon { .. } => verbs::SHOW_ICON,
        }
    }

    /// Positional arguments in wire order.
    pub fn args(&self) -> Vec<String> {
        match self {
            Command::Launch { target } => vec![target.clone()],
            Command::SendKeys { modifiers, key } => vec![modifiers_csv(modifiers), key.clone()],
            Command::ShowIcon { icon, theme } => vec![icon.clone(), theme.as_str().to_string()],
        }
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.verb())?;
        for arg in self.args() {
            write!(f, "{}{}", super::DELIMITER, arg)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_launch_verb_and_args() {
        let cmd = Command::launch("notepad");
        assert_eq!(cmd.verb(), "launch");
        assert_eq!(cmd.args(), vec!["notepad".to_string()]);
    }

    #[test]
    fn test_sendkeys_args_use_fixed_modifier_order() {
        let cmd = Command::send_keys([Modifier::Alt, Modifier::Control], "a");
        assert_eq!(cmd.args(), vec!["control,alt".to_string(), "a".to_string()]);
    }

    #[test]
    fn test_sendkeys_without_modifiers_has_empty_csv() {
        let cmd = Command::send_keys([], "f5");
        assert_eq!(cmd.args(), vec![String::new(), "f5".to_string()]);
    }

    #[test]
    fn test_display_matches_wire_text() {
        let cmd = Command::show_icon("gear", Theme::Dark);
        assert_eq!(cmd.to_string(), "show_icon::gear::dark");
    }
}
