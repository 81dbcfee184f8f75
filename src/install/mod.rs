// Login agent installation
// Copies the binary to a fixed location, writes a launchd agent descriptor
// and registers it with launchd for the current user.

pub mod launchctl;
pub mod plist;

pub use launchctl::{Launchctl, ServiceManager};

use crate::error::{InstallError, RemapError};
use plist::AgentDescriptor;
use std::fs;
use std::path::{Path, PathBuf};

/// launchd label for the agent
pub const AGENT_LABEL: &str = "com.navbuttons.agent";

const BINARY_NAME: &str = "navbuttons";

/// Filesystem layout of an installation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallPaths {
    pub binary: PathBuf,
    pub agent_plist: PathBuf,
    pub log_dir: PathBuf,
    pub stdout_log: PathBuf,
    pub stderr_log: PathBuf,
}

impl InstallPaths {
    /// Layout relative to a home directory
    pub fn under(home: &Path) -> Self {
        let log_dir = home.join("Library").join("Logs").join(BINARY_NAME);
        Self {
            binary: home.join(".local").join("bin").join(BINARY_NAME),
            agent_plist: home
                .join("Library")
                .join("LaunchAgents")
                .join(format!("{}.plist", AGENT_LABEL)),
            stdout_log: log_dir.join(format!("{}.out.log", BINARY_NAME)),
            stderr_log: log_dir.join(format!("{}.err.log", BINARY_NAME)),
            log_dir,
        }
    }

    pub fn for_current_user() -> Result<Self, InstallError> {
        dirs::home_dir()
            .map(|home| Self::under(&home))
            .ok_or(InstallError::HomeDirectory)
    }

    pub fn descriptor(&self) -> AgentDescriptor<'_> {
        AgentDescriptor {
            label: AGENT_LABEL,
            program: &self.binary,
            stdout_path: &self.stdout_log,
            stderr_path: &self.stderr_log,
        }
    }
}

/// Install the agent for the logged-in user
#[cfg(target_os = "macos")]
pub fn install() -> Result<(), RemapError> {
    let paths = InstallPaths::for_current_user()?;
    let current_exe = std::env::current_exe().map_err(InstallError::CurrentExe)?;
    let domain = launchctl::current_gui_domain();

    install_with(&paths, &current_exe, &domain, &Launchctl)?;

    println!("Installed {}", paths.binary.display());
    println!("Agent: {}", paths.agent_plist.display());
    println!("Logs: {}", paths.log_dir.display());
    println!(
        "Grant Accessibility to {} in System Settings > Privacy & Security > Accessibility.",
        paths.binary.display()
    );
    Ok(())
}

#[cfg(not(target_os = "macos"))]
pub fn install() -> Result<(), RemapError> {
    Err(RemapError::Unsupported)
}

/// Remove the agent for the logged-in user
#[cfg(target_os = "macos")]
pub fn uninstall() -> Result<(), RemapError> {
    let paths = InstallPaths::for_current_user()?;
    let domain = launchctl::current_gui_domain();

    uninstall_with(&paths, &domain, &Launchctl)?;

    println!("Uninstalled {}", AGENT_LABEL);
    Ok(())
}

#[cfg(not(target_os = "macos"))]
pub fn uninstall() -> Result<(), RemapError> {
    Err(RemapError::Unsupported)
}

/// Copy `current_exe` into place, write the descriptor and (re)load the agent.
pub fn install_with<S: ServiceManager>(
    paths: &InstallPaths,
    current_exe: &Path,
    domain: &str,
    manager: &S,
) -> Result<(), InstallError> {
    for dir in [paths.binary.parent(), paths.agent_plist.parent()]
        .into_iter()
        .flatten()
    {
        fs::create_dir_all(dir).map_err(|e| InstallError::io(dir, e))?;
    }
    create_private_dir(&paths.log_dir)?;

    copy_binary(current_exe, &paths.binary)?;

    fs::write(&paths.agent_plist, paths.descriptor().to_plist())
        .map_err(|e| InstallError::io(&paths.agent_plist, e))?;
    crate::info!("Wrote agent descriptor {}", paths.agent_plist.display());

    // Drop a stale registration from an earlier install
    let service = service_target(domain);
    if let Err(e) = manager.run(&["bootout", &service]) {
        crate::debug!("No previous agent to unload: {}", e);
    }

    let plist = paths.agent_plist.to_string_lossy();
    manager.run(&["bootstrap", domain, &plist])?;
    crate::info!("Agent {} loaded into {}", AGENT_LABEL, domain);
    Ok(())
}

/// Unload the agent and remove the descriptor and binary. Missing files are fine.
pub fn uninstall_with<S: ServiceManager>(
    paths: &InstallPaths,
    domain: &str,
    manager: &S,
) -> Result<(), InstallError> {
    if let Err(e) = manager.run(&["bootout", &service_target(domain)]) {
        crate::debug!("Agent was not loaded: {}", e);
    }

    remove_if_exists(&paths.agent_plist)?;
    remove_if_exists(&paths.binary)?;
    Ok(())
}

fn service_target(domain: &str) -> String {
    format!("{}/{}", domain, AGENT_LABEL)
}

fn copy_binary(from: &Path, to: &Path) -> Result<(), InstallError> {
    if is_same_file(from, to) {
        crate::debug!("{} is already installed in place", to.display());
        return Ok(());
    }

    // Unlink first: rewriting a binary in place invalidates its code signature
    // for any process still running it.
    remove_if_exists(to)?;
    fs::copy(from, to).map_err(|e| InstallError::io(to, e))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(to, fs::Permissions::from_mode(0o755))
            .map_err(|e| InstallError::io(to, e))?;
    }

    crate::info!("Copied {} to {}", from.display(), to.display());
    Ok(())
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Create a directory only the current user can write to
fn create_private_dir(dir: &Path) -> Result<(), InstallError> {
    fs::create_dir_all(dir).map_err(|e| InstallError::io(dir, e))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(dir, fs::Permissions::from_mode(0o700))
            .map_err(|e| InstallError::io(dir, e))?;
    }
    Ok(())
}

fn remove_if_exists(path: &Path) -> Result<(), InstallError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(InstallError::io(path, e)),
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
