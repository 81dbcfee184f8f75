//! Per-event decision logic for the tap callback.
//!
//! `handle_event` is a plain function of the classified event, the mapping
//! table, the tap state and a `TapHost`. All OS marshaling stays in the
//! `tap` module, so everything here runs against mocks in tests.

use super::lifecycle::{TapHandle, TapLifecycle, TapState};
use super::mapping::{ButtonMapping, KeyChord, ModifierSet};
use crate::error::SynthesisError;

// CGEventType values
pub const EVENT_TYPE_OTHER_MOUSE_DOWN: u32 = 25;
pub const EVENT_TYPE_OTHER_MOUSE_UP: u32 = 26;
pub const EVENT_TYPE_TAP_DISABLED_BY_TIMEOUT: u32 = 0xFFFF_FFFE;
pub const EVENT_TYPE_TAP_DISABLED_BY_USER_INPUT: u32 = 0xFFFF_FFFF;

/// Events of interest: press and release of the "other" mouse buttons.
/// The two tap-disabled notifications are delivered regardless of the mask.
pub const fn event_mask() -> u64 {
    (1 << EVENT_TYPE_OTHER_MOUSE_DOWN) | (1 << EVENT_TYPE_OTHER_MOUSE_UP)
}

/// An event as seen by the tap callback, after classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapEvent {
    /// The OS disabled the tap because a callback ran too long
    TapDisabledByTimeout,
    /// The OS disabled the tap because secure input (e.g. a password field) is active
    TapDisabledBySecureInput,
    OtherMouseDown { button: i64 },
    OtherMouseUp { button: i64 },
    /// Anything else; only reachable if the mask lets it through
    Other { event_type: u32 },
}

impl TapEvent {
    /// Classify a raw CGEventType. `button` is only called for mouse button
    /// events, so the button field is never read from an event that lacks it.
    pub fn classify<F: FnOnce() -> i64>(event_type: u32, button: F) -> Self {
        match event_type {
            EVENT_TYPE_TAP_DISABLED_BY_TIMEOUT => TapEvent::TapDisabledByTimeout,
            EVENT_TYPE_TAP_DISABLED_BY_USER_INPUT => TapEvent::TapDisabledBySecureInput,
            EVENT_TYPE_OTHER_MOUSE_DOWN => TapEvent::OtherMouseDown { button: button() },
            EVENT_TYPE_OTHER_MOUSE_UP => TapEvent::OtherMouseUp { button: button() },
            other => TapEvent::Other { event_type: other },
        }
    }
}

/// What happens to the original event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Deliver the original event unchanged
    PassThrough,
    /// Drop the original; a synthetic keyboard event was posted in its place
    Suppress,
    /// The tap was re-enabled after a timeout; deliver the original unchanged
    PassThroughAfterRecovery,
}

impl Disposition {
    pub fn delivers_original(self) -> bool {
        !matches!(self, Disposition::Suppress)
    }
}

/// A synthetic key press or release
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyStroke {
    pub key_code: u16,
    pub pressed: bool,
    pub modifiers: ModifierSet,
}

impl KeyStroke {
    pub fn for_chord(chord: KeyChord, pressed: bool, held: ModifierSet) -> Self {
        Self {
            key_code: chord.key_code,
            pressed,
            modifiers: chord.modifiers_with(held),
        }
    }
}

/// OS operations the engine needs while handling an event
pub trait TapHost {
    /// Re-enable a tap the OS disabled
    fn enable_tap(&self, handle: TapHandle);

    /// Modifiers the user is holding right now. Must be read fresh on every call.
    fn held_modifiers(&self) -> ModifierSet;

    /// Build and post a keyboard event at the HID level
    fn post_key(&self, stroke: KeyStroke) -> Result<(), SynthesisError>;
}

/// Decide the fate of one event delivered to the tap.
pub fn handle_event<H: TapHost>(
    event: TapEvent,
    mapping: &ButtonMapping,
    state: &TapState,
    host: &H,
) -> Disposition {
    match event {
        TapEvent::TapDisabledByTimeout => recover_from_timeout(state, host),
        TapEvent::TapDisabledBySecureInput => {
            // Never re-enable here. The OS lifts the restriction itself.
            if state.mark_disabled_by_secure_input() {
                crate::warn!("Event tap disabled by secure input; waiting for the OS to lift it");
            }
            Disposition::PassThrough
        }
        TapEvent::OtherMouseDown { button } => {
            note_delivery_resumed(state);
            remap_button(button, true, mapping, host)
        }
        TapEvent::OtherMouseUp { button } => {
            note_delivery_resumed(state);
            remap_button(button, false, mapping, host)
        }
        TapEvent::Other { event_type } => {
            note_delivery_resumed(state);
            crate::trace!("Passing through unexpected event type {}", event_type);
            Disposition::PassThrough
        }
    }
}

fn recover_from_timeout<H: TapHost>(state: &TapState, host: &H) -> Disposition {
    state.mark_disabled_by_timeout();
    match state.handle() {
        Some(handle) => {
            host.enable_tap(handle);
            state.mark_active();
            crate::info!("Event tap disabled by timeout; re-enabled");
            Disposition::PassThroughAfterRecovery
        }
        None => {
            crate::warn!(
                "Event tap timeout reported with no live tap (state: {:?})",
                state.lifecycle()
            );
            Disposition::PassThrough
        }
    }
}

/// A normal event after a secure-input disablement means the OS is
/// delivering to the tap again.
fn note_delivery_resumed(state: &TapState) {
    if state.lifecycle() == TapLifecycle::DisabledBySecureInput && state.mark_active() {
        crate::info!("Secure input lifted; event tap active again");
    }
}

fn remap_button<H: TapHost>(
    button: i64,
    pressed: bool,
    mapping: &ButtonMapping,
    host: &H,
) -> Disposition {
    let Some(chord) = mapping.chord_for(button) else {
        return Disposition::PassThrough;
    };

    let stroke = KeyStroke::for_chord(chord, pressed, host.held_modifiers());
    match host.post_key(stroke) {
        Ok(()) => {
            crate::debug!(
                "Button {} {} -> {} (modifiers: {})",
                button,
                if pressed { "down" } else { "up" },
                chord,
                stroke.modifiers
            );
            Disposition::Suppress
        }
        Err(e) => {
            crate::error!(
                "Failed to synthesize {} for button {}: {}; passing the original through",
                chord,
                button,
                e
            );
            Disposition::PassThrough
        }
    }
}

#[cfg(test)]
#[path = "engine_test.rs"]
mod tests;
