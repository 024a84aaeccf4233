//! # System Interaction Layer
//!
//! Everything that touches processes, terminals and the user's startup files.
//!
//! ## Modules
//!
//! - **`shell`**: The launcher table. Maps a shell identifier to a [`shell::ShellKind`]
//!   and dispatches to the matching launcher.
//! - **`resolver`**: Decides which shell to run from an explicit choice, the user's
//!   settings, the login shell, or the platform default.
//! - **`executor`**: Console launchers for `cmd` and PowerShell, which stay open on
//!   their own after running the activation script, and the raw-command fallback.
//! - **`pty`**: Interactive bash/zsh/fish sessions driven through a pseudo-terminal,
//!   with terminal resizes forwarded for the lifetime of the session.
//! - **`rc_file`**: The xonsh launcher, which swaps in a temporary startup file and
//!   always puts the user's own file back.
//! - **`terminal`**: Terminal size probing and raw-mode handling.
//! - **`interrupt`**: Keeps envshell from dying on Ctrl-C while a shell runs on the
//!   same console, so cleanup still happens.

pub mod executor;
pub mod interrupt;
pub mod pty;
pub mod rc_file;
pub mod resolver;
pub mod shell;
pub mod terminal;
