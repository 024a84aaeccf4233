// src/constants.rs

//! File names, defaults and environment variable names shared across the crate.

/// Activation script sourced by bash and zsh (inside the activation directory).
pub const ACTIVATE_POSIX: &str = "activate";

/// Activation script run by `cmd.exe`.
pub const ACTIVATE_BAT: &str = "activate.bat";

/// Activation script run by PowerShell.
pub const ACTIVATE_PS1: &str = "activate.ps1";

/// Activation script sourced by fish.
pub const ACTIVATE_FISH: &str = "activate.fish";

/// The shell used when nothing else selects one, on Windows.
pub const DEFAULT_SHELL_WINDOWS: &str = "cmd";

/// The shell used when nothing else selects one, everywhere else.
pub const DEFAULT_SHELL_UNIX: &str = "bash";

/// The environment variable naming the user's login shell.
pub const LOGIN_SHELL_VAR: &str = "SHELL";

/// The name of xonsh's per-user startup file (in the home directory).
pub const XONSH_RC_FILENAME: &str = ".xonshrc";

/// The xonsh prompt field that displays the environment name.
pub const XONSH_PROMPT_FIELD: &str = "env_name";

/// Prefix of the scratch directory holding the relocated xonsh startup file.
pub const RC_SCRATCH_PREFIX: &str = ".envshell-rc-";

/// The name of the directory holding envshell settings (in the system config dir).
pub const CONFIG_DIR_NAME: &str = "envshell";

/// The name of the settings file (inside the config directory).
pub const SETTINGS_FILENAME: &str = "settings.toml";

/// Environment variable that points at an alternative settings file.
pub const SETTINGS_PATH_VAR: &str = "ENVSHELL_CONFIG";

/// Terminal height used when the real one cannot be determined.
pub const FALLBACK_ROWS: u16 = 24;

/// Terminal width used when the real one cannot be determined.
pub const FALLBACK_COLS: u16 = 80;
