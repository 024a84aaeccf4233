// src/system/executor.rs

use crate::{
    SessionExit,
    constants::{ACTIVATE_BAT, ACTIVATE_PS1},
    system::{interrupt, shell::ShellError},
};
use std::ffi::OsString;
use std::path::Path;
use std::process::{Command as StdCommand, Stdio};

/// Runs `cmd.exe`, which stays open after `activate.bat` thanks to `/k`.
pub fn cmd_shell(
    activation_dir: &Path,
    shell_path: Option<&Path>,
) -> Result<SessionExit, ShellError> {
    let program = program_or(shell_path, "cmd");
    let args = vec![
        OsString::from("/k"),
        activation_dir.join(ACTIVATE_BAT).into_os_string(),
    ];
    run_attached(program, args)
}

/// Runs PowerShell, which stays open after `activate.ps1` thanks to `-NoExit`.
pub fn powershell(
    activation_dir: &Path,
    shell_path: Option<&Path>,
) -> Result<SessionExit, ShellError> {
    let program = program_or(shell_path, "powershell");
    let mut args: Vec<OsString> = ["-executionpolicy", "bypass", "-NoExit", "-NoLogo", "-File"]
        .into_iter()
        .map(OsString::from)
        .collect();
    args.push(activation_dir.join(ACTIVATE_PS1).into_os_string());
    run_attached(program, args)
}

/// Runs an unrecognized shell identifier as a command line.
pub fn raw_shell(command_line: &str) -> Result<SessionExit, ShellError> {
    let (program, args) = split_command_line(command_line)?;
    log::debug!("Running unrecognized shell '{}' with args {:?}", program, args);

    let mut command = StdCommand::new(&program);
    command
        .args(&args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());
    let status = interrupt::status_shielded(&mut command).map_err(|e| {
        ShellError::UnknownShell {
            command: command_line.trim().to_string(),
            source: e,
        }
    })?;
    Ok(status.code())
}

/// Splits a command line the way a POSIX shell would, into the program and its arguments.
pub fn split_command_line(command_line: &str) -> Result<(String, Vec<String>), ShellError> {
    let trimmed = command_line.trim();
    if trimmed.is_empty() {
        return Err(ShellError::EmptyCommand);
    }

    let mut parts = shlex::split(trimmed)
        .ok_or_else(|| ShellError::CommandParse(trimmed.to_string()))?
        .into_iter();
    let program = parts.next().ok_or(ShellError::EmptyCommand)?;
    Ok((program, parts.collect()))
}

fn program_or(shell_path: Option<&Path>, default: &str) -> OsString {
    shell_path.map_or_else(|| OsString::from(default), |p| p.as_os_str().to_owned())
}

/// Spawns `program` on the caller's console and waits for it.
///
/// Ctrl-C belongs to the shell for the duration; envshell itself ignores it.
fn run_attached(program: OsString, args: Vec<OsString>) -> Result<SessionExit, ShellError> {
    log::debug!("Spawning {:?} with args {:?}", program, args);
    let mut command = StdCommand::new(&program);
    command
        .args(&args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());
    let status = interrupt::status_shielded(&mut command).map_err(|e| ShellError::Spawn {
        shell: program.to_string_lossy().into_owned(),
        source: e.into(),
    })?;

    if !status.success() {
        log::debug!("Shell exited with code: {:?}", status.code());
    }
    Ok(status.code())
}
