//! Key names to Windows virtual-key codes.
//!
//! The hotkey map names keys the way a person would type them (`"t"`,
//! `"f5"`, `"pgup"`).  Lookup ignores case and surrounding whitespace.
//!
//! # Chord order
//!
//! A chord is pressed the way a person presses it:
//!
//! ```text
//! modifiers down (in order) → key down → key up → modifiers up (reverse order)
//! ```

use std::collections::BTreeSet;

use hotkey_core::Modifier;

use super::dispatch::ExecutionError;

pub const VK_BACK: u16 = 0x08;
pub const VK_TAB: u16 = 0x09;
pub const VK_RETURN: u16 = 0x0D;
pub const VK_SHIFT: u16 = 0x10;
pub const VK_CONTROL: u16 = 0x11;
pub const VK_MENU: u16 = 0x12;
pub const VK_ESCAPE: u16 = 0x1B;
pub const VK_SPACE: u16 = 0x20;
pub const VK_PRIOR: u16 = 0x21;
pub const VK_NEXT: u16 = 0x22;
pub const VK_END: u16 = 0x23;
pub const VK_HOME: u16 = 0x24;
pub const VK_LEFT: u16 = 0x25;
pub const VK_UP: u16 = 0x26;
pub const VK_RIGHT: u16 = 0x27;
pub const VK_DOWN: u16 = 0x28;
pub const VK_INSERT: u16 = 0x2D;
pub const VK_DELETE: u16 = 0x2E;
pub const VK_LWIN: u16 = 0x5B;
pub const VK_F1: u16 = 0x70;

/// One key transition sent to the OS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyStroke {
    pub vk: u16,
    pub key_up: bool,
}

impl KeyStroke {
    pub fn down(vk: u16) -> Self {
        Self { vk, key_up: false }
    }

    pub fn up(vk: u16) -> Self {
        Self { vk, key_up: true }
    }
}

/// Virtual-key code of a modifier.
pub fn modifier_vk(modifier: Modifier) -> u16 {
    match modifier {
        Modifier::Control => VK_CONTROL,
        Modifier::Alt => VK_MENU,
        Modifier::Shift => VK_SHIFT,
        Modifier::Win => VK_LWIN,
    }
}

/// Looks up the virtual-key code for a key name.
pub fn virtual_key_for(name: &str) -> Option<u16> {
    let name = name.trim().to_ascii_lowercase();

    // Single letters and digits map to their uppercase ASCII code.
    if let [c] = name.as_bytes() {
        if c.is_ascii_alphanumeric() {
            return Some(u16::from(c.to_ascii_uppercase()));
        }
    }

    if let Some(n) = name.strip_prefix('f').and_then(|n| n.parse::<u16>().ok()) {
        return (1..=12).contains(&n).then(|| VK_F1 + n - 1);
    }

    let vk = match name.as_str() {
        "control" | "ctrl" => VK_CONTROL,
        "alt" => VK_MENU,
        "shift" => VK_SHIFT,
        "win" | "windows" => VK_LWIN,
        "enter" | "return" => VK_RETURN,
        "tab" => VK_TAB,
        "escape" | "esc" => VK_ESCAPE,
        "space" => VK_SPACE,
        "backspace" => VK_BACK,
        "delete" | "del" => VK_DELETE,
        "home" => VK_HOME,
        "end" => VK_END,
        "pageup" | "pgup" => VK_PRIOR,
        "pagedown" | "pgdn" => VK_NEXT,
        "insert" | "ins" => VK_INSERT,
        "left" => VK_LEFT,
        "up" => VK_UP,
        "right" => VK_RIGHT,
        "down" => VK_DOWN,
        _ => return None,
    };
    Some(vk)
}

/// Builds the keystroke sequence for a chord.
///
/// # Errors
///
/// Returns [`ExecutionError::UnknownKey`] if `key` is not in the table.
pub fn chord_sequence(
    modifiers: &BTreeSet<Modifier>,
    key: &str,
) -> Result<Vec<KeyStroke>, ExecutionError> {
    let main = virtual_key_for(key).ok_or_else(|| ExecutionError::UnknownKey(key.to_string()))?;
    let held: Vec<u16> = modifiers.iter().map(|m| modifier_vk(*m)).collect();

    let mut strokes = Vec::with_capacity(held.len() * 2 + 2);
    strokes.extend(held.iter().copied().map(KeyStroke::down));
    strokes.push(KeyStroke::down(main));
    strokes.push(KeyStroke::up(main));
    strokes.extend(held.iter().rev().copied().map(KeyStroke::up));
    Ok(strokes)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
