// navbuttons: remap mouse Back/Forward buttons to Command+[ / Command+] on macOS

// Enable coverage attribute on nightly for explicit exclusions
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod cli;
pub mod error;
pub mod install;
pub mod remap;
pub mod shutdown;

#[cfg(target_os = "macos")]
pub mod tap;

use cli::{Action, Cli};
use error::RemapError;
use remap::TapState;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

// Re-export log macros for use throughout the crate
pub use tracing::{debug, error, info, trace, warn};

/// Application entry point. Returns the process exit status.
/// Note: This function cannot be unit tested as it installs a system-wide tap.
#[cfg_attr(coverage_nightly, coverage(off))]
pub fn run() -> i32 {
    let cli = Cli::parse_args();
    init_logging(cli.verbose);

    let result = match cli.action() {
        Action::Run => run_foreground(),
        Action::Install => install::install(),
        Action::Uninstall => install::uninstall(),
    };

    match result {
        Ok(()) => 0,
        Err(e) => {
            report(&e);
            e.exit_code()
        }
    }
}

/// Logging goes to stderr. Quiet by default, `--verbose` enables diagnostics,
/// and RUST_LOG overrides both.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Print a fatal error and its remediation to stderr
fn report(e: &RemapError) {
    eprintln!("error: {}", e);
    eprintln!("{}", e.remediation());
}

#[cfg_attr(coverage_nightly, coverage(off))]
fn run_foreground() -> Result<(), RemapError> {
    let state = Arc::new(TapState::new());
    shutdown::install_handler(state.clone())?;
    start_platform(state)
}

#[cfg(target_os = "macos")]
fn start_platform(state: Arc<TapState>) -> Result<(), RemapError> {
    remap::start(&tap::CGEventTapBackend, state)
}

#[cfg(not(target_os = "macos"))]
fn start_platform(_state: Arc<TapState>) -> Result<(), RemapError> {
    Err(RemapError::Unsupported)
}
