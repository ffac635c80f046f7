//! Built-in profile shipped for first-run setups.

use super::{AppConfig, HotkeyMapping, MappingAction, SpecialAction, Theme, UserProfile};

/// Name of the built-in profile.
pub const DEFAULT_PROFILE_NAME: &str = "Lenovo Yoga Slim 7x";

fn launch(key_code: u32, description: &str, target: &str) -> HotkeyMapping {
    HotkeyMapping {
        key_code,
        description: description.to_string(),
        action: MappingAction::Launch(target.to_string()),
        show_popup: false,
    }
}

fn special(key_code: u32, description: &str, id: &str) -> HotkeyMapping {
    HotkeyMapping {
        key_code,
        description: description.to_string(),
        action: MappingAction::Special(SpecialAction::from_id(id)),
        show_popup: true,
    }
}

/// Mappings for the keys found on the built-in profile's keyboard.
pub fn default_mappings() -> Vec<HotkeyMapping> {
    vec![
        launch(1, "Insert / Star", "notepad"),
        launch(
            72,
            "F11 / Phone Link",
            "explorer.exe shell:appsFolder\\Microsoft.YourPhone_8wekyb3d8bbwe!App",
        ),
        special(62, "Toggle Microphone", "toggle_mic_mute"),
        special(2, "Function Lock On", "fn_lock_on"),
        special(3, "Function Lock Off", "fn_lock_off"),
        special(12, "Camera On", "camera_on"),
        special(13, "Camera Off", "camera_off"),
        special(64, "Keyboard Backlight Off", "kb_backlight_off"),
        special(67, "Keyboard Backlight High", "kb_backlight_high"),
        special(65, "Keyboard Backlight Low", "kb_backlight_low"),
        special(66, "Keyboard Backlight Auto", "kb_backlight_auto"),
    ]
}

/// Profiles offered by the editing GUI when none are stored.
pub fn default_profiles() -> Vec<UserProfile> {
    vec![UserProfile {
        name: DEFAULT_PROFILE_NAME.to_string(),
        config: AppConfig {
            theme: Theme::Dark,
            mappings: default_mappings(),
            profiles: Vec::new(),
        },
    }]
}

/// Config written by `--init-config`: the built-in profile, active and stored.
pub fn starter_config() -> AppConfig {
    AppConfig {
        theme: Theme::Dark,
        mappings: default_mappings(),
        profiles: default_profiles(),
    }
}
