//! Text codec for [`Command`] lines.
//!
//! Encoding joins the verb and its arguments with `::` and appends `\n`.
//! Decoding splits on `::`, matches the verb, and checks the argument count
//! exactly.  A rejected line is reported as a [`ProtocolError`]; the caller
//! decides whether to drop it (the agent always does).

use std::collections::BTreeSet;

use thiserror::Error;

use super::command::{verbs, Command};
use super::{is_wire_safe, DELIMITER};
use crate::config::{Modifier, Theme};

/// Errors that can occur while encoding or decoding a command line.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// The line was empty or whitespace only.
    #[error("empty command line")]
    Empty,

    /// The verb is not part of the vocabulary.
    #[error("unknown verb: {0:?}")]
    UnknownVerb(String),

    /// The verb is known but was given the wrong number of arguments.
    #[error("{verb} expects {expected} argument(s), got {actual}")]
    WrongArity {
        verb: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A required argument was empty.
    #[error("{verb}: argument {index} must not be empty")]
    EmptyArgument { verb: &'static str, index: usize },

    /// The modifier list contained an unrecognised name.
    #[error("unknown modifier: {0:?}")]
    UnknownModifier(String),

    /// An argument would break the `::`-delimited framing.
    #[error("{verb}: argument {index} cannot be carried on the wire")]
    DelimiterInArgument { verb: &'static str, index: usize },
}

impl Command {
    /// Encodes the command as one newline-terminated line.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::DelimiterInArgument`] if an argument contains
    /// the delimiter or a line break.
    pub fn encode_line(&self) -> Result<String, ProtocolError> {
        let verb = self.verb();
        let args = self.args();
        let count = args.len();

        let mut line = String::from(verb);
        for (index, arg) in args.iter().enumerate() {
            if !is_wire_safe(arg, index + 1 == count) {
                return Err(ProtocolError::DelimiterInArgument { verb, index });
            }
            line.push_str(DELIMITER);
            line.push_str(arg);
        }
        line.push('\n');
        Ok(line)
    }

    /// Parses one line (with or without its terminator) into a command.
    ///
    /// # Errors
    ///
    /// Returns a [`ProtocolError`] for empty lines, unknown verbs, wrong
    /// argument counts, empty required arguments and unknown modifiers.
    pub fn parse_line(line: &str) -> Result<Command, ProtocolError> {
        let line = line.trim_end_matches(['\n', '\r']);
        if line.trim().is_empty() {
            return Err(ProtocolError::Empty);
        }

        let mut parts = line.split(DELIMITER);
        let verb = parts.next().unwrap_or_default();
        let args: Vec<&str> = parts.collect();

        match verb {
            verbs::LAUNCH => {
                let [target] = exact::<1>(verbs::LAUNCH, &args)?;
                non_empty(verbs::LAUNCH, 0, target)?;
                Ok(Command::launch(target))
            }
            verbs::SENDKEYS => {
                let [csv, key] = exact::<2>(verbs::SENDKEYS, &args)?;
                non_empty(verbs::SENDKEYS, 1, key)?;
                let modifiers = parse_modifiers(csv)?;
                Ok(Command::SendKeys {
                    modifiers,
                    key: key.to_string(),
                })
            }
            verbs::SHOW_ICON => {
                let [icon, theme] = exact::<2>(verbs::SHOW_ICON, &args)?;
                non_empty(verbs::SHOW_ICON, 0, icon)?;
                Ok(Command::show_icon(icon, Theme::parse_lenient(theme)))
            }
            other => Err(ProtocolError::UnknownVerb(other.to_string())),
        }
    }
}

fn exact<'a, const N: usize>(
    verb: &'static str,
    args: &[&'a str],
) -> Result<[&'a str; N], ProtocolError> {
    <[&str; N]>::try_from(args).map_err(|_| ProtocolError::WrongArity {
        verb,
        expected: N,
        actual: args.len(),
    })
}

fn non_empty(verb: &'static str, index: usize, value: &str) -> Result<(), ProtocolError> {
    if value.is_empty() {
        return Err(ProtocolError::EmptyArgument { verb, index });
    }
    Ok(())
}

fn parse_modifiers(csv: &str) -> Result<BTreeSet<Modifier>, ProtocolError> {
    csv.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| {
            Modifier::from_name(name).ok_or_else(|| ProtocolError::UnknownModifier(name.to_string()))
        })
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
