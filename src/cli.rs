// src/cli.rs

//! Command-line arguments of the `envshell` binary.

use clap::Parser;
use std::path::PathBuf;

/// envshell: Open an interactive shell with a virtual environment activated.
///
/// The shell is chosen, in order, from `--shell`, the `shell` key of the
/// settings file, the `SHELL` environment variable, or the platform default
/// (`cmd` on Windows, `bash` elsewhere).
///
/// Known shells: cmd, powershell (or ps), bash, zsh, fish, xonsh. Any other
/// value is run verbatim as a command line.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(disable_help_subcommand = true)]
pub struct Cli {
    /// The environment's script directory (the one holding `activate`,
    /// `activate.bat`, `activate.ps1`, `activate.fish`).
    pub activation_dir: PathBuf,

    /// The shell to launch, overriding settings and the login shell.
    #[arg(long, short)]
    pub shell: Option<String>,

    /// Print the shell that would be launched and exit.
    #[arg(long)]
    pub which: bool,
}
