// src/system/shell.rs

use crate::{
    SessionExit,
    system::{executor, pty, rc_file, resolver},
};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Everything that can go wrong while launching a shell session.
#[derive(Error, Debug)]
pub enum ShellError {
    #[error("Shell '{shell}' could not be started: {source}")]
    Spawn {
        shell: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("Could not install the terminal resize handler: {0}")]
    SignalSetup(#[source] std::io::Error),
    #[error("Could not prepare startup file '{path}': {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Command '{command}' could not be executed: {source}")]
    UnknownShell {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Shell command could not be parsed: {0}")]
    CommandParse(String),
    #[error("No shell command specified to run.")]
    EmptyCommand,
    #[error("Could not determine the home directory.")]
    HomeDirNotFound,
    #[error("Pseudo-terminal error: {0}")]
    Pty(#[source] anyhow::Error),
}

/// A shell family that knows how to activate an environment.
///
/// Identifiers outside the known set are kept verbatim in [`ShellKind::Raw`]
/// and run as a command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellKind {
    /// `cmd.exe`, activated with `/k activate.bat`.
    Cmd,
    /// Windows PowerShell, activated with `-NoExit -File activate.ps1`.
    PowerShell,
    /// bash in a PTY, activated by sourcing `activate`.
    Bash,
    /// zsh in a PTY, activated by sourcing `activate`.
    Zsh,
    /// fish in a PTY, activated by sourcing `activate.fish`.
    Fish,
    /// xonsh, activated through a rewritten `.xonshrc`.
    Xonsh,
    /// Any other command line, executed as-is.
    Raw(String),
}

impl ShellKind {
    /// Maps an identifier to its shell family. Matching is exact and case-sensitive.
    pub fn from_name(name: &str) -> Self {
        match name {
            "cmd" => Self::Cmd,
            "powershell" | "ps" => Self::PowerShell,
            "bash" => Self::Bash,
            "zsh" => Self::Zsh,
            "fish" => Self::Fish,
            "xonsh" => Self::Xonsh,
            other => Self::Raw(other.to_string()),
        }
    }

    /// Launches the shell with the environment in `activation_dir` active and
    /// blocks until the user leaves it.
    ///
    /// `shell_path` replaces the family's default executable name; it is
    /// ignored for [`ShellKind::Raw`], whose command line already names a program.
    pub fn launch(
        &self,
        activation_dir: &Path,
        shell_path: Option<&Path>,
    ) -> Result<SessionExit, ShellError> {
        log::debug!(
            "Launching {:?} for '{}' (override: {:?})",
            self,
            activation_dir.display(),
            shell_path
        );
        match self {
            Self::Cmd => executor::cmd_shell(activation_dir, shell_path),
            Self::PowerShell => executor::powershell(activation_dir, shell_path),
            Self::Bash => pty::run_interactive(pty::PtyShell::Bash, activation_dir, shell_path),
            Self::Zsh => pty::run_interactive(pty::PtyShell::Zsh, activation_dir, shell_path),
            Self::Fish => pty::run_interactive(pty::PtyShell::Fish, activation_dir, shell_path),
            Self::Xonsh => rc_file::xonsh_shell(activation_dir, shell_path),
            Self::Raw(command_line) => executor::raw_shell(command_line),
        }
    }
}

/// Resolves the shell to use and runs it against `activation_dir`.
///
/// This is a thin dispatcher: whatever the chosen launcher returns is the result.
pub fn run_shell(
    activation_dir: &Path,
    explicit_shell: Option<&str>,
) -> Result<SessionExit, ShellError> {
    let selection = resolver::default_shell_selection(explicit_shell);
    ShellKind::from_name(&selection.name).launch(activation_dir, selection.path.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_names_map_to_their_family() {
        assert_eq!(ShellKind::from_name("cmd"), ShellKind::Cmd);
        assert_eq!(ShellKind::from_name("powershell"), ShellKind::PowerShell);
        assert_eq!(ShellKind::from_name("bash"), ShellKind::Bash);
        assert_eq!(ShellKind::from_name("zsh"), ShellKind::Zsh);
        assert_eq!(ShellKind::from_name("fish"), ShellKind::Fish);
        assert_eq!(ShellKind::from_name("xonsh"), ShellKind::Xonsh);
    }

    #[test]
    fn test_ps_is_an_alias_of_powershell() {
        assert_eq!(ShellKind::from_name("ps"), ShellKind::from_name("powershell"));
    }

    #[test]
    fn test_no_collisions_between_distinct_families() {
        let names = ["cmd", "powershell", "bash", "zsh", "fish", "xonsh"];
        for (i, a) in names.iter().enumerate() {
            for b in names.iter().skip(i + 1) {
                assert_ne!(ShellKind::from_name(a), ShellKind::from_name(b), "{a} vs {b}");
            }
        }
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        assert_eq!(ShellKind::from_name("Bash"), ShellKind::Raw("Bash".to_string()));
        assert_eq!(ShellKind::from_name("PS"), ShellKind::Raw("PS".to_string()));
    }

    #[test]
    fn test_unknown_identifier_is_kept_verbatim() {
        assert_eq!(
            ShellKind::from_name("foo --bar"),
            ShellKind::Raw("foo --bar".to_string())
        );
    }
}
