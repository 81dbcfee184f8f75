//! Ownership and lifecycle of the event tap handle.
//!
//! The handle is written once by installation and released once by teardown.
//! Everything else only reads it. Both the tap callback and the termination
//! handler reach it through a shared `TapState`, so all fields are atomics:
//! teardown must stay allocation-free and must never wait on the callback.

use std::ffi::c_void;
use std::ptr;
use std::sync::atomic::{AtomicPtr, AtomicU8, Ordering};

/// Lifecycle of the system-wide event tap.
///
/// ```text
/// Uninitialized -> Active <-> DisabledByTimeout
///                  Active <-> DisabledBySecureInput   (lifted by the OS only)
///                  any live state -> TornDown        (terminal)
/// Uninitialized -> Failed                            (terminal)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapLifecycle {
    Uninitialized,
    Active,
    DisabledByTimeout,
    DisabledBySecureInput,
    Failed,
    TornDown,
}

impl TapLifecycle {
    const fn to_raw(self) -> u8 {
        match self {
            TapLifecycle::Uninitialized => 0,
            TapLifecycle::Active => 1,
            TapLifecycle::DisabledByTimeout => 2,
            TapLifecycle::DisabledBySecureInput => 3,
            TapLifecycle::Failed => 4,
            TapLifecycle::TornDown => 5,
        }
    }

    const fn from_raw(raw: u8) -> Self {
        match raw {
            1 => TapLifecycle::Active,
            2 => TapLifecycle::DisabledByTimeout,
            3 => TapLifecycle::DisabledBySecureInput,
            4 => TapLifecycle::Failed,
            5 => TapLifecycle::TornDown,
            _ => TapLifecycle::Uninitialized,
        }
    }

    /// Whether a handle exists for this state
    pub const fn is_live(self) -> bool {
        matches!(
            self,
            TapLifecycle::Active
                | TapLifecycle::DisabledByTimeout
                | TapLifecycle::DisabledBySecureInput
        )
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, TapLifecycle::Failed | TapLifecycle::TornDown)
    }
}

/// Opaque OS handle for the installed tap (a CFMachPortRef on macOS).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TapHandle(*mut c_void);

impl TapHandle {
    /// Wrap a raw handle. Returns None for a null pointer.
    pub fn from_raw(raw: *mut c_void) -> Option<Self> {
        if raw.is_null() {
            None
        } else {
            Some(Self(raw))
        }
    }

    pub fn as_raw(self) -> *mut c_void {
        self.0
    }
}

/// Shared slot holding the tap handle and its lifecycle state.
#[derive(Debug)]
pub struct TapState {
    handle: AtomicPtr<c_void>,
    phase: AtomicU8,
}

impl TapState {
    pub const fn new() -> Self {
        Self {
            handle: AtomicPtr::new(ptr::null_mut()),
            phase: AtomicU8::new(TapLifecycle::Uninitialized.to_raw()),
        }
    }

    pub fn lifecycle(&self) -> TapLifecycle {
        TapLifecycle::from_raw(self.phase.load(Ordering::SeqCst))
    }

    /// The handle, if the tap has been created and not yet torn down
    pub fn handle(&self) -> Option<TapHandle> {
        if !self.lifecycle().is_live() {
            return None;
        }
        TapHandle::from_raw(self.handle.load(Ordering::SeqCst))
    }

    /// Record a freshly created tap. Only the first call from
    /// `Uninitialized` succeeds; the handle is never replaced.
    pub fn activate(&self, handle: TapHandle) -> bool {
        if self.lifecycle() != TapLifecycle::Uninitialized {
            return false;
        }
        self.handle.store(handle.as_raw(), Ordering::SeqCst);
        if self.transition(&[TapLifecycle::Uninitialized], TapLifecycle::Active) {
            true
        } else {
            self.handle.store(ptr::null_mut(), Ordering::SeqCst);
            false
        }
    }

    /// Record that tap creation never succeeded
    pub fn mark_failed(&self) -> bool {
        self.transition(&[TapLifecycle::Uninitialized], TapLifecycle::Failed)
    }

    pub(crate) fn mark_disabled_by_timeout(&self) -> bool {
        self.transition(
            &[
                TapLifecycle::Active,
                TapLifecycle::DisabledByTimeout,
                TapLifecycle::DisabledBySecureInput,
            ],
            TapLifecycle::DisabledByTimeout,
        )
    }

    pub(crate) fn mark_disabled_by_secure_input(&self) -> bool {
        self.transition(
            &[TapLifecycle::Active, TapLifecycle::DisabledByTimeout],
            TapLifecycle::DisabledBySecureInput,
        )
    }

    /// Back to `Active` from either disabled state
    pub(crate) fn mark_active(&self) -> bool {
        self.transition(
            &[
                TapLifecycle::DisabledByTimeout,
                TapLifecycle::DisabledBySecureInput,
            ],
            TapLifecycle::Active,
        )
    }

    /// Move to `TornDown` and hand the handle to `release` exactly once.
    ///
    /// Safe to call from the termination handler: atomics only, no locks,
    /// no allocation. Returns false if there was no live tap to release.
    pub fn teardown<F: FnOnce(TapHandle)>(&self, release: F) -> bool {
        let previous = TapLifecycle::from_raw(
            self.phase
                .swap(TapLifecycle::TornDown.to_raw(), Ordering::SeqCst),
        );
        if previous.is_terminal() {
            // Nothing leaves a terminal state, so restoring it cannot race
            self.phase.store(previous.to_raw(), Ordering::SeqCst);
            return false;
        }
        let raw = self.handle.swap(ptr::null_mut(), Ordering::SeqCst);
        match TapHandle::from_raw(raw) {
            Some(handle) if previous.is_live() => {
                release(handle);
                true
            }
            _ => false,
        }
    }

    fn transition(&self, from: &[TapLifecycle], to: TapLifecycle) -> bool {
        let mut current = self.phase.load(Ordering::SeqCst);
        loop {
            if !from.contains(&TapLifecycle::from_raw(current)) {
                return false;
            }
            match self.phase.compare_exchange(
                current,
                to.to_raw(),
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }
}

impl Default for TapState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "lifecycle_test.rs"]
mod tests;
