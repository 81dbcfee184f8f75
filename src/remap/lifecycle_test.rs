// Tests for the tap handle lifecycle
// Test code is excluded from coverage since we measure production code coverage
#![cfg_attr(coverage_nightly, coverage(off))]

use super::*;
use std::cell::Cell;

fn fake_handle(addr: usize) -> TapHandle {
    TapHandle::from_raw(addr as *mut c_void).unwrap()
}

#[test]
fn test_new_state_is_uninitialized_without_handle() {
    let state = TapState::new();
    assert_eq!(state.lifecycle(), TapLifecycle::Uninitialized);
    assert!(state.handle().is_none());
}

#[test]
fn test_null_handle_is_rejected() {
    assert!(TapHandle::from_raw(ptr::null_mut()).is_none());
}

#[test]
fn test_activate_stores_handle_once() {
    let state = TapState::new();
    assert!(state.activate(fake_handle(0x1000)));
    assert_eq!(state.lifecycle(), TapLifecycle::Active);
    assert_eq!(state.handle(), Some(fake_handle(0x1000)));

    // Second activation must not replace the handle
    assert!(!state.activate(fake_handle(0x2000)));
    assert_eq!(state.handle(), Some(fake_handle(0x1000)));
}

#[test]
fn test_timeout_cycle_is_repeatable() {
    let state = TapState::new();
    state.activate(fake_handle(0x1000));

    for _ in 0..5 {
        assert!(state.mark_disabled_by_timeout());
        assert_eq!(state.lifecycle(), TapLifecycle::DisabledByTimeout);
        assert!(state.handle().is_some());
        assert!(state.mark_active());
        assert_eq!(state.lifecycle(), TapLifecycle::Active);
    }
}

#[test]
fn test_secure_input_cycle() {
    let state = TapState::new();
    state.activate(fake_handle(0x1000));

    assert!(state.mark_disabled_by_secure_input());
    assert_eq!(state.lifecycle(), TapLifecycle::DisabledBySecureInput);
    // Handle stays reachable while disabled
    assert!(state.handle().is_some());

    assert!(state.mark_active());
    assert_eq!(state.lifecycle(), TapLifecycle::Active);
}

#[test]
fn test_mark_active_from_active_is_noop() {
    let state = TapState::new();
    state.activate(fake_handle(0x1000));
    assert!(!state.mark_active());
    assert_eq!(state.lifecycle(), TapLifecycle::Active);
}

#[test]
fn test_disable_transitions_require_a_live_tap() {
    let state = TapState::new();
    assert!(!state.mark_disabled_by_timeout());
    assert!(!state.mark_disabled_by_secure_input());
    assert_eq!(state.lifecycle(), TapLifecycle::Uninitialized);
}

#[test]
fn test_teardown_releases_handle_exactly_once() {
    let state = TapState::new();
    state.activate(fake_handle(0x1000));

    let released = Cell::new(0);
    assert!(state.teardown(|h| {
        assert_eq!(h, fake_handle(0x1000));
        released.set(released.get() + 1);
    }));
    assert_eq!(state.lifecycle(), TapLifecycle::TornDown);
    assert!(state.handle().is_none());

    assert!(!state.teardown(|_| released.set(released.get() + 1)));
    assert_eq!(released.get(), 1);
}

#[test]
fn test_teardown_from_disabled_state_still_releases() {
    let state = TapState::new();
    state.activate(fake_handle(0x1000));
    state.mark_disabled_by_secure_input();

    let released = Cell::new(false);
    assert!(state.teardown(|_| released.set(true)));
    assert!(released.get());
}

#[test]
fn test_torn_down_is_terminal() {
    let state = TapState::new();
    state.activate(fake_handle(0x1000));
    state.teardown(|_| {});

    assert!(!state.mark_active());
    assert!(!state.mark_disabled_by_timeout());
    assert!(!state.mark_disabled_by_secure_input());
    assert!(!state.activate(fake_handle(0x2000)));
    assert_eq!(state.lifecycle(), TapLifecycle::TornDown);
    assert!(state.lifecycle().is_terminal());
}

#[test]
fn test_teardown_before_install_has_nothing_to_release() {
    let state = TapState::new();
    let released = Cell::new(false);
    assert!(!state.teardown(|_| released.set(true)));
    assert!(!released.get());
    // A tap created after teardown started must not become active
    assert!(!state.activate(fake_handle(0x1000)));
}

#[test]
fn test_failed_is_terminal_and_survives_teardown() {
    let state = TapState::new();
    assert!(state.mark_failed());
    assert_eq!(state.lifecycle(), TapLifecycle::Failed);
    assert!(!state.activate(fake_handle(0x1000)));

    assert!(!state.teardown(|_| panic!("nothing to release")));
    assert_eq!(state.lifecycle(), TapLifecycle::Failed);
}

#[test]
fn test_is_live() {
    assert!(TapLifecycle::Active.is_live());
    assert!(TapLifecycle::DisabledByTimeout.is_live());
    assert!(TapLifecycle::DisabledBySecureInput.is_live());
    assert!(!TapLifecycle::Uninitialized.is_live());
    assert!(!TapLifecycle::Failed.is_live());
    assert!(!TapLifecycle::TornDown.is_live());
}
