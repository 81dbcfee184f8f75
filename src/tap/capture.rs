//! CGEventTap installation, callback trampoline and run loop.

use super::permissions::check_accessibility_permission;
use super::synth::SessionHost;
use crate::error::RemapError;
use crate::shutdown;
use crate::remap::engine::event_mask;
use crate::remap::{
    handle_event, ButtonMapping, Disposition, TapBackend, TapEvent, TapHandle, TapState,
};
use core_foundation::base::TCFType;
use core_foundation::mach_port::{CFMachPort, CFMachPortRef};
use core_foundation::runloop::{kCFRunLoopCommonModes, CFRunLoop};
use core_graphics::event::{
    CGEvent, CGEventTapLocation, CGEventTapOptions, CGEventTapPlacement, CGEventTapProxy,
    EventField,
};
use foreign_types::ForeignType;
use std::ffi::c_void;
use std::mem::ManuallyDrop;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// CGEventMask type for raw FFI
type CGEventMask = u64;

/// Internal callback type for raw FFI. The event type is taken as a plain
/// u32 because the tap-disabled notifications are out-of-band values.
type CGEventTapCallBackInternal = unsafe extern "C" fn(
    proxy: CGEventTapProxy,
    event_type: u32,
    event: *mut c_void,
    user_info: *mut c_void,
) -> *mut c_void;

#[link(name = "CoreGraphics", kind = "framework")]
extern "C" {
    fn CGEventTapCreate(
        tap: CGEventTapLocation,
        place: CGEventTapPlacement,
        options: CGEventTapOptions,
        events_of_interest: CGEventMask,
        callback: CGEventTapCallBackInternal,
        user_info: *mut c_void,
    ) -> CFMachPortRef;

    fn CGEventTapEnable(tap: CFMachPortRef, enable: bool);
}

#[link(name = "CoreFoundation", kind = "framework")]
extern "C" {
    fn CFMachPortInvalidate(port: CFMachPortRef);
}

/// Callbacks slower than this risk the OS disabling the tap
const SLOW_CALLBACK: Duration = Duration::from_millis(10);

/// Turn an installed tap on or off
pub fn enable_tap(handle: TapHandle, enable: bool) {
    // SAFETY: handles only come from a successful CGEventTapCreate and are
    // cleared from TapState before the port is invalidated
    unsafe { CGEventTapEnable(handle.as_raw() as CFMachPortRef, enable) }
}

/// Disable and invalidate the tap. Called once, from `TapState::teardown`.
pub fn release_tap(handle: TapHandle) {
    let port = handle.as_raw() as CFMachPortRef;
    // SAFETY: see enable_tap; teardown hands each handle out exactly once
    unsafe {
        CGEventTapEnable(port, false);
        CFMachPortInvalidate(port);
    }
}

/// Everything the callback needs, reached through the tap's user_info pointer
struct TapContext {
    mapping: ButtonMapping,
    state: Arc<TapState>,
    host: SessionHost,
}

/// Event tap backend for macOS
#[derive(Debug, Default)]
pub struct CGEventTapBackend;

impl TapBackend for CGEventTapBackend {
    fn is_process_trusted(&self) -> bool {
        check_accessibility_permission()
    }

    fn install_and_run(
        &self,
        mapping: ButtonMapping,
        state: Arc<TapState>,
    ) -> Result<(), RemapError> {
        let context = Box::into_raw(Box::new(TapContext {
            mapping,
            state: state.clone(),
            host: SessionHost,
        }));

        // HID level, ahead of every other tap, observe-and-modify
        let event_tap_ref = unsafe {
            CGEventTapCreate(
                CGEventTapLocation::HID,
                CGEventTapPlacement::HeadInsertEventTap,
                CGEventTapOptions::Default,
                event_mask(),
                tap_callback,
                context as *mut c_void,
            )
        };

        let Some(handle) = TapHandle::from_raw(event_tap_ref as *mut c_void) else {
            // SAFETY: the tap was never created, so nothing else holds the context
            unsafe {
                drop(Box::from_raw(context));
            }
            state.mark_failed();
            return Err(RemapError::HookCreationFailed);
        };

        let mach_port = unsafe { CFMachPort::wrap_under_create_rule(event_tap_ref) };

        let Ok(run_loop_source) = mach_port.create_runloop_source(0) else {
            release_tap(handle);
            // SAFETY: the port is invalidated, so the callback can no longer run
            unsafe {
                drop(Box::from_raw(context));
            }
            state.mark_failed();
            return Err(RemapError::RunLoopSourceCreationFailed);
        };

        if !state.activate(handle) {
            // Shutdown started while the tap was being created
            release_tap(handle);
            unsafe {
                drop(Box::from_raw(context));
            }
            shutdown::park_until_exit();
        }

        let run_loop = CFRunLoop::get_current();
        run_loop.add_source(&run_loop_source, unsafe { kCFRunLoopCommonModes });
        enable_tap(handle, true);

        crate::info!("Event tap installed; remapping mouse Back/Forward buttons");

        // Runs until the port is invalidated or the process exits
        CFRunLoop::run_current();

        if shutdown::handler_owns_exit(&state) {
            // Invalidation by the handler stopped the loop; it exits the process
            shutdown::park_until_exit();
        }

        run_loop.remove_source(&run_loop_source, unsafe { kCFRunLoopCommonModes });
        state.teardown(release_tap);

        // SAFETY: the run loop has stopped and the port is invalidated
        unsafe {
            drop(Box::from_raw(context));
        }

        crate::info!("Event tap stopped");
        Ok(())
    }
}

/// Read the button number from a mouse event
///
/// # Safety
/// `event_ref` must be a valid CGEventRef owned by the caller.
unsafe fn button_number(event_ref: *mut c_void) -> i64 {
    // The OS owns the event; never release it here
    let event = ManuallyDrop::new(CGEvent::from_ptr(event_ref as *mut _));
    event.get_integer_value_field(EventField::MOUSE_EVENT_BUTTON_NUMBER)
}

/// Raw CGEventTap callback
///
/// Returns:
/// - Event pointer: passes the original event through to other applications
/// - null_mut(): suppresses the event (requires Default tap options)
unsafe extern "C" fn tap_callback(
    _proxy: CGEventTapProxy,
    event_type: u32,
    event_ref: *mut c_void,
    user_info: *mut c_void,
) -> *mut c_void {
    if user_info.is_null() || event_ref.is_null() {
        return event_ref;
    }
    let context = &*(user_info as *const TapContext);

    let start = Instant::now();

    // A panic must never unwind into CoreGraphics; fall back to passing the event on
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let event = TapEvent::classify(event_type, || button_number(event_ref));
        handle_event(event, &context.mapping, &context.state, &context.host)
    }));

    let disposition = result.unwrap_or_else(|e| {
        crate::error!("Event tap callback panicked: {:?}", e);
        Disposition::PassThrough
    });

    let elapsed = start.elapsed();
    if elapsed > SLOW_CALLBACK {
        crate::warn!(
            "Event tap callback took {:?}; the OS may disable the tap",
            elapsed
        );
    }

    if disposition.delivers_original() {
        event_ref
    } else {
        std::ptr::null_mut()
    }
}
