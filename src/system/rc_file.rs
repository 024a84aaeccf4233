// src/system/rc_file.rs

use crate::{
    SessionExit,
    constants::{RC_SCRATCH_PREFIX, XONSH_PROMPT_FIELD, XONSH_RC_FILENAME},
    system::{interrupt::InterruptShield, shell::ShellError},
};
use scopeguard::guard;
use std::fs;
use std::io;
use std::path::Path;
use std::process::{Command as StdCommand, Stdio};

/// Runs xonsh with a startup file that shows the environment name in the prompt.
///
/// The user's `~/.xonshrc` is moved aside for the duration of the session and
/// put back afterwards, whatever happens in between.
pub fn xonsh_shell(
    activation_dir: &Path,
    shell_path: Option<&Path>,
) -> Result<SessionExit, ShellError> {
    let home = dirs::home_dir().ok_or(ShellError::HomeDirNotFound)?;
    xonsh_shell_with_rc(activation_dir, shell_path, &home.join(XONSH_RC_FILENAME))
}

/// The name shown in the prompt: the directory containing the activation directory.
///
/// `.../envs/myenv/bin` gives `myenv`.
pub fn env_name(activation_dir: &Path) -> String {
    activation_dir
        .parent()
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Builds the temporary startup file: the original content followed by the prompt injection.
pub fn synthesize_rc(original: &[u8], env_name: &str) -> Vec<u8> {
    let mut content = original.to_vec();
    content.extend_from_slice(
        format!("\n$PROMPT_FIELDS[\"{XONSH_PROMPT_FIELD}\"] = \"({env_name})\"\n").as_bytes(),
    );
    content
}

/// Runs xonsh against a rewritten copy of the startup file at `rc_path`.
///
/// The scratch directory is created next to `rc_path` so relocating the
/// original is a rename on the same filesystem. The original is back in place
/// when this returns, on success, on error, on unwind and after Ctrl-C.
///
/// A startup file that cannot be found (including a dangling symlink) is left
/// untouched and the session starts with only the prompt line.
pub fn xonsh_shell_with_rc(
    activation_dir: &Path,
    shell_path: Option<&Path>,
    rc_path: &Path,
) -> Result<SessionExit, ShellError> {
    // Dropped last: nothing may interrupt us between moving the file and restoring it.
    let _shield = InterruptShield::engage();

    let rc_dir = rc_path.parent().unwrap_or_else(|| Path::new("."));
    let scratch = tempfile::Builder::new()
        .prefix(RC_SCRATCH_PREFIX)
        .tempdir_in(rc_dir)
        .map_err(config_io(rc_dir))?;

    // Read before moving, so a relative symlink still resolves.
    let original = match fs::read(rc_path) {
        Ok(bytes) => Some(bytes),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::debug!("No usable '{}' to carry over", rc_path.display());
            None
        }
        Err(e) => return Err(config_io(rc_path)(e)),
    };

    let stashed = if original.is_some() {
        let stash = scratch.path().join(XONSH_RC_FILENAME);
        fs::rename(rc_path, &stash).map_err(config_io(rc_path))?;
        log::debug!("Moved '{}' aside to '{}'", rc_path.display(), stash.display());
        Some(stash)
    } else {
        None
    };

    // Declared after `scratch`, so it runs before the directory is deleted.
    let _restore = guard(stashed, |stashed| restore(stashed.as_deref(), rc_path));

    let content = synthesize_rc(
        original.as_deref().unwrap_or_default(),
        &env_name(activation_dir),
    );
    let new_rc = scratch.path().join("envshell.xonshrc");
    fs::write(&new_rc, content).map_err(config_io(&new_rc))?;

    let program = shell_path.unwrap_or_else(|| Path::new("xonsh"));
    log::debug!("Spawning {} --rc {}", program.display(), new_rc.display());
    let status = StdCommand::new(program)
        .arg("--rc")
        .arg(&new_rc)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .map_err(|e| ShellError::Spawn {
            shell: program.display().to_string(),
            source: e.into(),
        })?;
    Ok(status.code())
}

fn config_io(path: &Path) -> impl FnOnce(io::Error) -> ShellError {
    let path = path.to_path_buf();
    move |source| ShellError::ConfigIo { path, source }
}

/// Puts the relocated startup file back. Best effort: failures are logged with
/// the location of the surviving copy.
fn restore(stashed: Option<&Path>, rc_path: &Path) {
    let Some(stash) = stashed else {
        return;
    };
    match fs::rename(stash, rc_path) {
        Ok(()) => log::debug!("Restored '{}'", rc_path.display()),
        Err(e) => {
            // The scratch directory is about to be deleted; copying keeps the content alive.
            match fs::copy(stash, rc_path) {
                Ok(_) => log::warn!(
                    "Could not move '{}' back ({}); restored it by copy.",
                    rc_path.display(),
                    e
                ),
                Err(copy_err) => log::error!(
                    "Could not restore '{}' from '{}': {}, {}",
                    rc_path.display(),
                    stash.display(),
                    e,
                    copy_err
                ),
            }
        }
    }
}
