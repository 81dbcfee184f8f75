// Mouse button remapping: the mapping table, the tap state and the
// per-event engine, plus the startup sequence that gates installation on
// the Accessibility permission.
//
// Requires Accessibility permission (System Settings > Privacy & Security > Accessibility)

pub mod engine;
pub mod lifecycle;
pub mod mapping;

pub use engine::{handle_event, Disposition, KeyStroke, TapEvent, TapHost};
pub use lifecycle::{TapHandle, TapLifecycle, TapState};
pub use mapping::{ButtonMapping, KeyChord, ModifierSet};

use crate::error::RemapError;
use std::sync::Arc;

/// Platform side of startup (allows mocking in tests)
pub trait TapBackend {
    /// Whether this process may observe and post system-wide input events
    fn is_process_trusted(&self) -> bool;

    /// Create the tap, attach it to the current run loop and service events
    /// until the process exits. Returns early only on failure or when the
    /// run loop stops without a shutdown request.
    fn install_and_run(
        &self,
        mapping: ButtonMapping,
        state: Arc<TapState>,
    ) -> Result<(), RemapError>;
}

/// Check permission, then install the tap and run.
///
/// The permission check is advisory: the OS enforces it again when the tap
/// is created, so `install_and_run` still reports creation failure.
pub fn start<B: TapBackend>(backend: &B, state: Arc<TapState>) -> Result<(), RemapError> {
    let trusted = backend.is_process_trusted();
    crate::info!("Accessibility permission check: {}", trusted);
    if !trusted {
        return Err(RemapError::PermissionDenied {
            binary: current_binary(),
        });
    }

    backend.install_and_run(ButtonMapping::standard(), state)
}

/// Path of the running executable, for remediation messages
pub fn current_binary() -> String {
    std::env::current_exe()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| env!("CARGO_PKG_NAME").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct MockBackend {
        trusted: bool,
        install_result: fn() -> Result<(), RemapError>,
        install_calls: Cell<usize>,
    }

    impl MockBackend {
        fn new(trusted: bool) -> Self {
            Self {
                trusted,
                install_result: || Ok(()),
                install_calls: Cell::new(0),
            }
        }
    }

    impl TapBackend for MockBackend {
        fn is_process_trusted(&self) -> bool {
            self.trusted
        }

        fn install_and_run(
            &self,
            mapping: ButtonMapping,
            _state: Arc<TapState>,
        ) -> Result<(), RemapError> {
            assert_eq!(mapping, ButtonMapping::standard());
            self.install_calls.set(self.install_calls.get() + 1);
            (self.install_result)()
        }
    }

    #[test]
    fn test_permission_denied_skips_tap_creation() {
        let backend = MockBackend::new(false);
        let result = start(&backend, Arc::new(TapState::new()));

        assert_eq!(backend.install_calls.get(), 0);
        let error = result.unwrap_err();
        assert!(matches!(error, RemapError::PermissionDenied { .. }));
        assert_ne!(error.exit_code(), 0);
    }

    #[test]
    fn test_permission_granted_installs_once() {
        let backend = MockBackend::new(true);
        assert!(start(&backend, Arc::new(TapState::new())).is_ok());
        assert_eq!(backend.install_calls.get(), 1);
    }

    #[test]
    fn test_hook_creation_failure_is_reported() {
        let backend = MockBackend {
            install_result: || Err(RemapError::HookCreationFailed),
            ..MockBackend::new(true)
        };
        let result = start(&backend, Arc::new(TapState::new()));
        assert!(matches!(result, Err(RemapError::HookCreationFailed)));
        assert_eq!(backend.install_calls.get(), 1);
    }

    #[test]
    fn test_current_binary_is_not_empty() {
        assert!(!current_binary().is_empty());
    }
}
