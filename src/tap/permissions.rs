// Accessibility permission check for macOS
// CGEventTap in observe-and-modify mode requires Accessibility permission

// FFI bindings for Accessibility permission checking
#[link(name = "ApplicationServices", kind = "framework")]
extern "C" {
    /// Check if the current process has Accessibility permission
    /// Returns true if the process is trusted (has Accessibility permission)
    fn AXIsProcessTrusted() -> bool;
}

/// Check if this process has Accessibility permission
///
/// Returns true if Accessibility is enabled for this binary in System Settings.
pub fn check_accessibility_permission() -> bool {
    // SAFETY: AXIsProcessTrusted takes no arguments and only reads permission state
    unsafe { AXIsProcessTrusted() }
}
