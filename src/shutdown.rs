// Shutdown coordination module
// Tears the event tap down on SIGINT/SIGTERM and exits without further cleanup

use crate::error::RemapError;
use crate::remap::{TapHandle, TapLifecycle, TapState};
use std::io::Write;
use std::sync::Arc;

const SHUTDOWN_NOTICE: &[u8] = b"navbuttons: shutting down\n";

/// Register the interrupt/termination handler for the given tap.
///
/// The handler disables and invalidates the tap, prints a fixed notice and
/// exits with status 0. It never waits on the run loop.
pub fn install_handler(state: Arc<TapState>) -> Result<(), RemapError> {
    ctrlc::set_handler(move || {
        teardown(&state);
        let _ = std::io::stderr().write_all(SHUTDOWN_NOTICE);
        std::process::exit(0);
    })
    .map_err(|e| RemapError::SignalHandler(e.to_string()))
}

/// Whether the termination handler has taken the tap down. Once true the
/// handler's exit is the only one: other threads must not clean up or return.
pub fn handler_owns_exit(state: &TapState) -> bool {
    state.lifecycle() == TapLifecycle::TornDown
}

/// Block the calling thread until the termination handler exits the process
pub fn park_until_exit() -> ! {
    loop {
        std::thread::park();
    }
}

/// Release the tap, if one is live. Idempotent.
pub fn teardown(state: &TapState) -> bool {
    teardown_with(state, release_tap)
}

/// Teardown with an explicit release operation
pub fn teardown_with<F: FnOnce(TapHandle)>(state: &TapState, release: F) -> bool {
    state.teardown(release)
}

#[cfg(target_os = "macos")]
fn release_tap(handle: TapHandle) {
    crate::tap::release_tap(handle);
}

#[cfg(not(target_os = "macos"))]
fn release_tap(_handle: TapHandle) {}

#[cfg(test)]
#[path = "shutdown_test.rs"]
mod tests;
