// src/system/resolver.rs

use crate::{
    config::Settings,
    constants::{DEFAULT_SHELL_UNIX, DEFAULT_SHELL_WINDOWS, LOGIN_SHELL_VAR},
};
use std::env;
use std::path::{Path, PathBuf};

/// The shell chosen for a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellSelection {
    /// The shell identifier, looked up in the launcher table.
    pub name: String,
    /// Executable to run instead of the family's default name.
    pub path: Option<PathBuf>,
}

impl ShellSelection {
    fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: None,
        }
    }
}

/// Picks the shell, in priority order:
///
/// 1. `explicit`, used verbatim;
/// 2. the configured setting (only looked up when 1 is absent);
/// 3. the login shell path: its file name is the identifier, and the full path
///    is kept as the executable override;
/// 4. the platform default.
///
/// Empty strings count as absent at every step.
pub fn resolve_shell<S, L>(explicit: Option<&str>, settings: S, login_shell: L) -> ShellSelection
where
    S: FnOnce() -> Option<String>,
    L: FnOnce() -> Option<PathBuf>,
{
    if let Some(name) = explicit.filter(|s| !s.is_empty()) {
        return ShellSelection::named(name);
    }

    if let Some(name) = settings().filter(|s| !s.is_empty()) {
        log::debug!("Using shell '{}' from settings.", name);
        return ShellSelection::named(name);
    }

    if let Some(path) = login_shell().filter(|p| !p.as_os_str().is_empty())
        && let Some(name) = shell_name_from_path(&path)
    {
        log::debug!("Using login shell '{}' ({}).", name, path.display());
        return ShellSelection {
            name,
            path: Some(path),
        };
    }

    ShellSelection::named(default_shell_name())
}

/// [`resolve_shell`] wired to the settings file and the `SHELL` variable.
pub fn default_shell_selection(explicit: Option<&str>) -> ShellSelection {
    resolve_shell(
        explicit,
        || match Settings::load() {
            Ok(settings) => settings.shell,
            Err(e) => {
                log::warn!("Ignoring settings: {}", e);
                None
            }
        },
        || env::var_os(LOGIN_SHELL_VAR).map(PathBuf::from),
    )
}

/// The identifier for a shell executable path: its file name without `.exe`.
fn shell_name_from_path(path: &Path) -> Option<String> {
    let file_name = path.file_name()?.to_string_lossy();
    // ASCII lowercasing keeps byte offsets, so the length applies to the original.
    let stem_len = file_name
        .to_ascii_lowercase()
        .strip_suffix(".exe")
        .map_or(file_name.len(), str::len);
    let name = file_name.get(..stem_len)?;
    (!name.is_empty()).then(|| name.to_string())
}

/// The shell used when nothing else selects one.
pub fn default_shell_name() -> &'static str {
    if cfg!(target_os = "windows") {
        DEFAULT_SHELL_WINDOWS
    } else {
        DEFAULT_SHELL_UNIX
    }
}
