//! Raw on-disk shape of a mapping and its conversion to the typed model.
//!
//! `Payload` is a plain string for `launch` and `special`, and an object
//! `{ "Modifiers": [...], "Key": "..." }` for `sendkeys`.  The conversion in
//! `From<RawMapping> for HotkeyMapping` is the single place where that
//! variant field is interpreted.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use super::{HotkeyMapping, KeyCombo, MappingAction, Modifier, SpecialAction};
use crate::protocol::is_wire_safe;

fn default_action() -> String {
    "Unassigned".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct RawMapping {
    #[serde(rename = "KeyCode", alias = "keyCode", default)]
    key_code: u32,
    #[serde(rename = "Description", alias = "description", default)]
    description: String,
    #[serde(rename = "Action", alias = "action", default = "default_action")]
    action: String,
    #[serde(
        rename = "Payload",
        alias = "payload",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    payload: Option<Value>,
    #[serde(rename = "ShowPopup", alias = "showPopup", default)]
    show_popup: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawKeyCombo {
    #[serde(rename = "Modifiers", alias = "modifiers", default)]
    modifiers: Vec<String>,
    #[serde(rename = "Key", alias = "key", default)]
    key: String,
}

impl From<RawMapping> for HotkeyMapping {
    fn from(raw: RawMapping) -> Self {
        let action = match interpret_action(&raw.action, raw.payload, raw.key_code) {
            Ok(action) => action,
            Err(reason) => {
                warn!(
                    key_code = raw.key_code,
                    action = %raw.action,
                    "mapping downgraded to unassigned: {reason}"
                );
                MappingAction::Unassigned
            }
        };

        HotkeyMapping {
            key_code: raw.key_code,
            description: raw.description,
            action,
            show_popup: raw.show_popup,
        }
    }
}

impl From<HotkeyMapping> for RawMapping {
    fn from(mapping: HotkeyMapping) -> Self {
        let action = mapping.action.name().to_string();
        let payload = match mapping.action {
            MappingAction::Unassigned => None,
            MappingAction::Launch(target) => Some(Value::String(target)),
            MappingAction::Special(special) => Some(Value::String(special.id().to_string())),
            MappingAction::SendKeys(combo) => {
                let raw = RawKeyCombo {
                    modifiers: combo
                        .modifiers
                        .iter()
                        .map(|m| m.as_str().to_string())
                        .collect(),
                    key: combo.key,
                };
                serde_json::to_value(raw).ok()
            }
        };

        RawMapping {
            key_code: mapping.key_code,
            description: mapping.description,
            action,
            payload,
            show_popup: mapping.show_popup,
        }
    }
}

fn interpret_action(
    action: &str,
    payload: Option<Value>,
    key_code: u32,
) -> Result<MappingAction, String> {
    match action.trim().to_ascii_lowercase().as_str() {
        "launch" => {
            let target = string_payload(payload)?;
            if !is_wire_safe(&target, true) {
                return Err("launch target contains '::' or a line break".into());
            }
            Ok(MappingAction::Launch(target))
        }
        "special" => {
            let id = string_payload(payload)?;
            if !is_wire_safe(&id, false) {
                return Err("special identifier cannot be carried on the wire".into());
            }
            Ok(MappingAction::Special(SpecialAction::from_id(&id)))
        }
        "sendkeys" => {
            let value = payload.ok_or("sendkeys mapping has no payload")?;
            if !value.is_object() {
                return Err("sendkeys payload must be an object".into());
            }
            let raw: RawKeyCombo = serde_json::from_value(value)
                .map_err(|e| format!("invalid sendkeys payload: {e}"))?;
            if !is_wire_safe(&raw.key, true) {
                return Err("sendkeys key contains '::' or a line break".into());
            }

            let mut combo = KeyCombo {
                key: raw.key,
                ..KeyCombo::default()
            };
            for name in raw.modifiers.iter().filter(|n| !n.trim().is_empty()) {
                match Modifier::from_name(name) {
                    Some(m) => {
                        combo.modifiers.insert(m);
                    }
                    None => warn!(key_code, modifier = %name, "ignoring unknown modifier"),
                }
            }
            Ok(MappingAction::SendKeys(combo))
        }
        _ => Ok(MappingAction::Unassigned),
    }
}

fn string_payload(payload: Option<Value>) -> Result<String, String> {
    match payload {
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(format!("expected a string payload, got {other}")),
        None => Err("missing payload".into()),
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{AppConfig, KeyCombo, MappingAction, Modifier, SpecialAction};

    fn single(json_mapping: &str) -> MappingAction {
        let doc = format!(r#"{{ "Mappings": [ {json_mapping} ] }}"#);
        let cfg = AppConfig::from_json_str(&doc).expect("parse");
        cfg.mappings[0].action.clone()
    }

    #[test]
    fn test_launch_with_object_payload_is_downgraded() {
        let action = single(r#"{ "KeyCode": 1, "Action": "launch", "Payload": { "Key": "x" } }"#);
        assert_eq!(action, MappingAction::Unassigned);
    }

    #[test]
    fn test_launch_without_payload_is_downgraded() {
        let action = single(r#"{ "KeyCode": 1, "Action": "launch" }"#);
        assert_eq!(action, MappingAction::Unassigned);
    }

    #[test]
    fn test_launch_target_with_delimiter_is_downgraded() {
        let action = single(r#"{ "KeyCode": 1, "Action": "launch", "Payload": "a::b" }"#);
        assert_eq!(action, MappingAction::Unassigned);
    }

    #[test]
    fn test_launch_target_with_spaces_is_kept_verbatim() {
        let action = single(
            r#"{ "KeyCode": 72, "Action": "Launch", "Payload": "explorer.exe shell:appsFolder\\App" }"#,
        );
        assert_eq!(
            action,
            MappingAction::Launch("explorer.exe shell:appsFolder\\App".into())
        );
    }

    #[test]
    fn test_sendkeys_with_string_payload_is_downgraded() {
        let action = single(r#"{ "KeyCode": 3, "Action": "sendkeys", "Payload": "ctrl+c" }"#);
        assert_eq!(action, MappingAction::Unassigned);
    }

    #[test]
    fn test_sendkeys_drops_unknown_modifiers() {
        let action = single(
            r#"{ "KeyCode": 3, "Action": "sendkeys",
                 "Payload": { "Modifiers": ["alt", "hyper", "", "control"], "Key": "a" } }"#,
        );
        assert_eq!(
            action,
            MappingAction::SendKeys(KeyCombo::new([Modifier::Control, Modifier::Alt], "a"))
        );
    }

    #[test]
    fn test_special_other_identifier_passes_through() {
        let action = single(r#"{ "KeyCode": 67, "Action": "special", "Payload": "kb_backlight_high" }"#);
        assert_eq!(
            action,
            MappingAction::Special(SpecialAction::Other("kb_backlight_high".into()))
        );
    }

    #[test]
    fn test_special_identifier_with_trailing_colon_is_downgraded() {
        let action = single(r#"{ "KeyCode": 67, "Action": "special", "Payload": "icon:" }"#);
        assert_eq!(action, MappingAction::Unassigned);
    }

    #[test]
    fn test_not_assigned_action_is_unassigned() {
        let action = single(r#"{ "KeyCode": 9, "Action": "Not Assigned", "Payload": "ignored" }"#);
        assert_eq!(action, MappingAction::Unassigned);
    }

    #[test]
    fn test_bad_mapping_does_not_affect_neighbours() {
        // Arrange
        let json = r#"{ "Mappings": [
            { "KeyCode": 1, "Action": "launch", "Payload": 17 },
            { "KeyCode": 2, "Action": "launch", "Payload": "calc" }
        ] }"#;

        // Act
        let cfg = AppConfig::from_json_str(json).expect("parse");

        // Assert
        assert_eq!(cfg.mappings[0].action, MappingAction::Unassigned);
        assert_eq!(cfg.mappings[1].action, MappingAction::Launch("calc".into()));
    }
}
