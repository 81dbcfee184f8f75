// Test code is excluded from coverage since we measure production code coverage
#![cfg_attr(coverage_nightly, coverage(off))]

use super::*;
use crate::remap::TapLifecycle;
use std::cell::Cell;
use std::ffi::c_void;

#[test]
fn test_teardown_without_tap_is_noop() {
    let state = TapState::new();
    assert!(!teardown(&state));
    assert_eq!(state.lifecycle(), TapLifecycle::TornDown);
}

#[test]
fn test_teardown_releases_live_tap_once() {
    let state = TapState::new();
    state.activate(TapHandle::from_raw(0x1000 as *mut c_void).unwrap());

    let releases = Cell::new(0);
    assert!(teardown_with(&state, |_| releases.set(releases.get() + 1)));
    assert!(!teardown_with(&state, |_| releases.set(releases.get() + 1)));

    assert_eq!(releases.get(), 1);
    assert_eq!(state.lifecycle(), TapLifecycle::TornDown);
    assert!(state.handle().is_none());
}

#[test]
fn test_shutdown_notice_is_single_line() {
    assert!(SHUTDOWN_NOTICE.ends_with(b"\n"));
    assert_eq!(SHUTDOWN_NOTICE.iter().filter(|&&b| b == b'\n').count(), 1);
}

#[test]
fn test_handler_owns_exit_once_tap_is_torn_down() {
    let state = TapState::new();
    state.activate(TapHandle::from_raw(0x1000 as *mut c_void).unwrap());
    assert!(!handler_owns_exit(&state));

    teardown_with(&state, |_| {});
    assert!(handler_owns_exit(&state));
}

#[test]
fn test_run_loop_may_return_when_not_torn_down() {
    let state = TapState::new();
    state.activate(TapHandle::from_raw(0x1000 as *mut c_void).unwrap());
    state.mark_disabled_by_timeout();
    assert!(!handler_owns_exit(&state));

    let failed = TapState::new();
    failed.mark_failed();
    assert!(!handler_owns_exit(&failed));
}

#[test]
fn test_handler_owns_exit_when_shutdown_precedes_install() {
    let state = TapState::new();
    teardown_with(&state, |_| panic!("nothing to release"));
    assert!(!state.activate(TapHandle::from_raw(0x1000 as *mut c_void).unwrap()));
    assert!(handler_owns_exit(&state));
}
