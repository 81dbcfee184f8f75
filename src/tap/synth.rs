//! Synthetic keyboard events and live modifier state via Core Graphics.

use super::capture::enable_tap;
use crate::error::SynthesisError;
use crate::remap::{KeyStroke, ModifierSet, TapHandle, TapHost};
use core_graphics::event::{CGEvent, CGEventFlags, CGEventTapLocation};
use core_graphics::event_source::{CGEventSource, CGEventSourceStateID};

/// kCGEventSourceStateCombinedSessionState
const COMBINED_SESSION_STATE: i32 = 0;

#[link(name = "CoreGraphics", kind = "framework")]
extern "C" {
    fn CGEventSourceFlagsState(state_id: i32) -> u64;
}

/// `TapHost` backed by the current login session
#[derive(Debug, Default, Clone, Copy)]
pub struct SessionHost;

impl TapHost for SessionHost {
    fn enable_tap(&self, handle: TapHandle) {
        enable_tap(handle, true);
    }

    fn held_modifiers(&self) -> ModifierSet {
        // SAFETY: pure query of session state, no pointers involved
        let flags = unsafe { CGEventSourceFlagsState(COMBINED_SESSION_STATE) };
        ModifierSet::from_cg_flags(flags)
    }

    fn post_key(&self, stroke: KeyStroke) -> Result<(), SynthesisError> {
        // Must not be an anonymous (Private) source; some consumers reject those
        let source = CGEventSource::new(CGEventSourceStateID::CombinedSessionState)
            .map_err(|_| SynthesisError::SourceUnavailable)?;

        let event = CGEvent::new_keyboard_event(source, stroke.key_code, stroke.pressed)
            .map_err(|_| SynthesisError::EventCreation {
                key_code: stroke.key_code,
            })?;

        event.set_flags(CGEventFlags::from_bits_truncate(stroke.modifiers.bits()));
        event.post(CGEventTapLocation::HID);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remap::mapping::KEY_CODE_LEFT_BRACKET;

    #[test]
    fn test_held_modifiers_only_reports_chord_modifiers() {
        let held = SessionHost.held_modifiers();
        let all =
            ModifierSet::SHIFT | ModifierSet::CONTROL | ModifierSet::OPTION | ModifierSet::COMMAND;
        assert_eq!(held.bits() & !all.bits(), 0);
    }

    /// Posts a real Command+[ to the focused application.
    ///
    /// Ignored by default because it requires:
    /// - macOS with Accessibility permissions granted
    /// - An active display session
    #[test]
    #[ignore] // Requires display and Accessibility permissions
    fn test_post_key_integration() {
        let down = KeyStroke {
            key_code: KEY_CODE_LEFT_BRACKET,
            pressed: true,
            modifiers: ModifierSet::COMMAND,
        };
        let up = KeyStroke {
            pressed: false,
            ..down
        };
        assert!(SessionHost.post_key(down).is_ok());
        assert!(SessionHost.post_key(up).is_ok());
    }
}
