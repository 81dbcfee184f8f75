//! Command-line interface.

use clap::Parser;

/// Remap mouse Back/Forward buttons to Command+[ and Command+]
#[derive(Debug, Parser)]
#[command(name = "navbuttons", version, about)]
#[command(
    long_about = "Remap mouse Back/Forward buttons to Command+[ and Command+].\n\n\
    Runs in the foreground until interrupted. Requires Accessibility permission \
    (System Settings > Privacy & Security > Accessibility)."
)]
pub struct Cli {
    /// Log diagnostics to stderr
    #[arg(short, long)]
    pub verbose: bool,

    /// Install as a login agent that starts automatically
    #[arg(long, conflicts_with = "uninstall")]
    pub install: bool,

    /// Remove the login agent
    #[arg(long)]
    pub uninstall: bool,
}

/// What to do for this invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Run,
    Install,
    Uninstall,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn action(&self) -> Action {
        if self.install {
            Action::Install
        } else if self.uninstall {
            Action::Uninstall
        } else {
            Action::Run
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn test_no_flags_runs_in_foreground() {
        let cli = Cli::try_parse_from(["navbuttons"]).unwrap();
        assert_eq!(cli.action(), Action::Run);
        assert!(!cli.verbose);
    }

    #[test]
    fn test_verbose_short_and_long() {
        assert!(Cli::try_parse_from(["navbuttons", "-v"]).unwrap().verbose);
        assert!(Cli::try_parse_from(["navbuttons", "--verbose"]).unwrap().verbose);
    }

    #[test]
    fn test_install_and_uninstall() {
        let cli = Cli::try_parse_from(["navbuttons", "--install"]).unwrap();
        assert_eq!(cli.action(), Action::Install);

        let cli = Cli::try_parse_from(["navbuttons", "--uninstall", "-v"]).unwrap();
        assert_eq!(cli.action(), Action::Uninstall);
        assert!(cli.verbose);
    }

    #[test]
    fn test_install_conflicts_with_uninstall() {
        let err = Cli::try_parse_from(["navbuttons", "--install", "--uninstall"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_help_is_reported_as_display_help() {
        let err = Cli::try_parse_from(["navbuttons", "--help"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
        assert_eq!(err.exit_code(), 0);
    }

    #[test]
    fn test_unknown_flag_is_rejected() {
        let err = Cli::try_parse_from(["navbuttons", "--bogus"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
    }
}
