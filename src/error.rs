//! Error types for startup, synthesis and installation.

use std::path::PathBuf;

/// Fatal conditions that stop the tool. Each one maps to exit status 1 and
/// carries a concrete remediation step for the user.
#[derive(Debug, thiserror::Error)]
pub enum RemapError {
    #[error("Accessibility permission is not granted for {binary}")]
    PermissionDenied { binary: String },

    #[error("Failed to create the event tap")]
    HookCreationFailed,

    #[error("Failed to create a run loop source for the event tap")]
    RunLoopSourceCreationFailed,

    #[error("Mouse button remapping is only supported on macOS")]
    Unsupported,

    #[error("Failed to install signal handler: {0}")]
    SignalHandler(String),

    #[error(transparent)]
    Install(#[from] InstallError),
}

impl RemapError {
    /// What the user should do about it
    pub fn remediation(&self) -> String {
        match self {
            RemapError::PermissionDenied { binary } => format!(
                "Open System Settings > Privacy & Security > Accessibility and enable {}, then run it again.",
                binary
            ),
            RemapError::HookCreationFailed => "Make sure Accessibility permission is granted, run as your normal user (not root or sudo), and check for another process that already remaps mouse buttons.".to_string(),
            RemapError::RunLoopSourceCreationFailed => {
                "Restart the tool; if it keeps failing, log out and back in.".to_string()
            }
            RemapError::Unsupported => "Run this tool on macOS.".to_string(),
            RemapError::SignalHandler(_) => {
                "Check for another component that already installed a Ctrl+C handler.".to_string()
            }
            RemapError::Install(e) => e.remediation(),
        }
    }

    pub fn exit_code(&self) -> i32 {
        1
    }
}

/// Failure to build or post a synthetic keyboard event. Never fatal: the
/// original mouse event is delivered instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SynthesisError {
    #[error("Failed to create event source")]
    SourceUnavailable,

    #[error("Failed to create keyboard event for key code {key_code}")]
    EventCreation { key_code: u16 },
}

/// Errors from installing or removing the background agent.
#[derive(Debug, thiserror::Error)]
pub enum InstallError {
    #[error("Could not determine the home directory")]
    HomeDirectory,

    #[error("Could not determine the path of the running executable: {0}")]
    CurrentExe(#[source] std::io::Error),

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("launchctl {} failed: {status}", args.join(" "))]
    ServiceManager { args: Vec<String>, status: String },
}

impl InstallError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        InstallError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn remediation(&self) -> String {
        match self {
            InstallError::HomeDirectory => "Set the HOME environment variable.".to_string(),
            InstallError::CurrentExe(_) => {
                "Run the installer from the binary itself, not through a symlink that was removed."
                    .to_string()
            }
            InstallError::Io { path, .. } => format!(
                "Check that you own {} and that it is writable.",
                path.display()
            ),
            InstallError::ServiceManager { .. } => {
                "Run `launchctl print gui/$(id -u)` to inspect the agent state.".to_string()
            }
        }
    }
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
