// src/bin/envshell.rs

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use colored::*;
use envshell::{cli::Cli, run_shell, system::resolver};
use std::path::PathBuf;

/// The main entry point of the `envshell` application.
/// It sets up logging, parses arguments, runs the session and turns its
/// result into the process exit code.
fn main() {
    env_logger::init();

    match run_cli(Cli::parse()) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("\n{}: {:#}", "Error".red().bold(), e);
            std::process::exit(1);
        }
    }
}

/// Resolves the activation directory and the shell, then hands over to the launcher.
fn run_cli(cli: Cli) -> Result<i32> {
    log::debug!("CLI args parsed: {:?}", cli);

    let activation_dir = resolve_activation_dir(&cli.activation_dir)?;

    if cli.which {
        let selection = resolver::default_shell_selection(cli.shell.as_deref());
        match &selection.path {
            Some(path) => println!("{} ({})", selection.name, path.display()),
            None => println!("{}", selection.name),
        }
        return Ok(0);
    }

    let exit = run_shell(&activation_dir, cli.shell.as_deref())
        .context("Could not open a shell session")?;

    // A shell killed by a signal reports no code; treat it as a plain failure.
    Ok(exit.unwrap_or(1))
}

/// Expands `~` and canonicalizes the directory, without Windows `\\?\` prefixes.
fn resolve_activation_dir(raw: &std::path::Path) -> Result<PathBuf> {
    let raw_str = raw.to_string_lossy();
    let expanded = PathBuf::from(shellexpand::tilde(&raw_str).as_ref());
    let dir = dunce::canonicalize(&expanded)
        .with_context(|| format!("Activation directory '{}' not found", expanded.display()))?;
    if !dir.is_dir() {
        return Err(anyhow!(
            "Activation directory '{}' is not a directory",
            dir.display()
        ));
    }
    Ok(dir)
}
