//! Registration with launchd.

use crate::error::InstallError;
use std::process::Command;

/// Trait for the service manager (allows mocking in tests)
pub trait ServiceManager {
    /// Run one service manager subcommand with the given arguments
    fn run(&self, args: &[&str]) -> Result<(), InstallError>;
}

/// `launchctl`, invoked directly with an argument vector (never through a shell)
#[derive(Debug, Default)]
pub struct Launchctl;

impl ServiceManager for Launchctl {
    fn run(&self, args: &[&str]) -> Result<(), InstallError> {
        crate::debug!("Running launchctl {:?}", args);
        let status = Command::new("/bin/launchctl")
            .args(args)
            .status()
            .map_err(|e| InstallError::ServiceManager {
                args: to_owned(args),
                status: e.to_string(),
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(InstallError::ServiceManager {
                args: to_owned(args),
                status: status.to_string(),
            })
        }
    }
}

fn to_owned(args: &[&str]) -> Vec<String> {
    args.iter().map(|a| a.to_string()).collect()
}

/// launchd domain for the logged-in user's GUI session
#[cfg(unix)]
pub fn current_gui_domain() -> String {
    // SAFETY: getuid never fails and has no side effects
    let uid = unsafe { libc::getuid() };
    gui_domain(uid)
}

pub fn gui_domain(uid: u32) -> String {
    format!("gui/{}", uid)
}
