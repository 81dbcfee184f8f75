// CGEventTap-based mouse button interception for macOS
//
// This module is the only place that talks to Core Graphics:
// - `capture`: tap creation, the raw callback and the run loop
// - `synth`: synthetic keyboard events and live modifier state
// - `permissions`: the Accessibility permission check
//
// CGEventTap requires Accessibility permission (System Settings > Privacy & Security > Accessibility)

mod capture;
mod permissions;
mod synth;

pub use capture::{release_tap, CGEventTapBackend};
pub use permissions::check_accessibility_permission;
pub use synth::SessionHost;
