//! Button-to-chord mapping and modifier flag handling.
//!
//! Flag values match CGEventFlags so a `ModifierSet` can be handed to the
//! event system without translation.

use std::fmt;

// Standard modifier flags from CGEvent
pub const CG_EVENT_FLAG_MASK_SHIFT: u64 = 0x00020000;
pub const CG_EVENT_FLAG_MASK_CONTROL: u64 = 0x00040000;
pub const CG_EVENT_FLAG_MASK_ALTERNATE: u64 = 0x00080000;
pub const CG_EVENT_FLAG_MASK_COMMAND: u64 = 0x00100000;

/// Bits that count as a held modifier. Caps Lock, fn and the left/right
/// device bits are not carried into synthesized chords.
const MODIFIER_MASK: u64 = CG_EVENT_FLAG_MASK_SHIFT
    | CG_EVENT_FLAG_MASK_CONTROL
    | CG_EVENT_FLAG_MASK_ALTERNATE
    | CG_EVENT_FLAG_MASK_COMMAND;

/// Virtual key codes (kVK_ANSI_*) from HIToolbox Events.h
pub const KEY_CODE_LEFT_BRACKET: u16 = 0x21;
pub const KEY_CODE_RIGHT_BRACKET: u16 = 0x1E;

/// Mouse button numbers as reported in kCGMouseEventButtonNumber
pub const BUTTON_MIDDLE: i64 = 2;
pub const BUTTON_BACK: i64 = 3;
pub const BUTTON_FORWARD: i64 = 4;

/// A set of Shift/Option/Control/Command modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModifierSet(u64);

impl ModifierSet {
    pub const SHIFT: Self = Self(CG_EVENT_FLAG_MASK_SHIFT);
    pub const CONTROL: Self = Self(CG_EVENT_FLAG_MASK_CONTROL);
    pub const OPTION: Self = Self(CG_EVENT_FLAG_MASK_ALTERNATE);
    pub const COMMAND: Self = Self(CG_EVENT_FLAG_MASK_COMMAND);

    pub const fn empty() -> Self {
        Self(0)
    }

    /// Extract the modifier set from raw CGEventFlags bits, dropping
    /// everything that is not one of the four chord modifiers.
    pub const fn from_cg_flags(flags_raw: u64) -> Self {
        Self(flags_raw & MODIFIER_MASK)
    }

    pub const fn bits(self) -> u64 {
        self.0
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for ModifierSet {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl fmt::Display for ModifierSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = [
            (Self::CONTROL, "Control"),
            (Self::OPTION, "Option"),
            (Self::SHIFT, "Shift"),
            (Self::COMMAND, "Command"),
        ];
        if self.is_empty() {
            return f.write_str("none");
        }
        let mut first = true;
        for (flag, name) in names {
            if self.contains(flag) {
                if !first {
                    f.write_str("+")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}

/// A keyboard shortcut: one key plus the modifiers it requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyChord {
    pub key_code: u16,
    pub modifiers: ModifierSet,
}

impl KeyChord {
    pub const fn new(key_code: u16, modifiers: ModifierSet) -> Self {
        Self {
            key_code,
            modifiers,
        }
    }

    /// Modifiers to put on the synthesized event: whatever the user is
    /// physically holding plus what the chord requires.
    pub fn modifiers_with(&self, held: ModifierSet) -> ModifierSet {
        held | self.modifiers
    }
}

impl fmt::Display for KeyChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}+{}", self.modifiers, key_name(self.key_code))
    }
}

/// Human-readable name for the key codes this tool emits
pub fn key_name(key_code: u16) -> String {
    match key_code {
        KEY_CODE_LEFT_BRACKET => "[".to_string(),
        KEY_CODE_RIGHT_BRACKET => "]".to_string(),
        _ => format!("Key({})", key_code),
    }
}

/// Fixed table from auxiliary mouse button number to keyboard chord.
///
/// There is no mutation path: the table is built once and only read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonMapping {
    entries: [(i64, KeyChord); 2],
}

impl ButtonMapping {
    /// Back -> Command+[ and Forward -> Command+]
    pub const fn standard() -> Self {
        Self {
            entries: [
                (
                    BUTTON_BACK,
                    KeyChord::new(KEY_CODE_LEFT_BRACKET, ModifierSet::COMMAND),
                ),
                (
                    BUTTON_FORWARD,
                    KeyChord::new(KEY_CODE_RIGHT_BRACKET, ModifierSet::COMMAND),
                ),
            ],
        }
    }

    /// Look up the chord for a button, if the button is mapped
    pub fn chord_for(&self, button: i64) -> Option<KeyChord> {
        self.iter()
            .find(|(b, _)| *b == button)
            .map(|(_, chord)| chord)
    }

    pub fn iter(&self) -> impl Iterator<Item = (i64, KeyChord)> + '_ {
        self.entries.iter().copied()
    }
}

#[cfg(test)]
#[path = "mapping_test.rs"]
mod tests;
