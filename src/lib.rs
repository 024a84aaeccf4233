//! Launch an interactive shell with a virtual environment already activated.

pub mod cli;
pub mod config;
pub mod constants;
pub mod system;

/// The exit code of a finished shell session.
///
/// `None` when the shell was terminated without reporting a code (e.g. killed by a signal).
pub type SessionExit = Option<i32>;

pub use system::resolver::{ShellSelection, resolve_shell};
pub use system::shell::{ShellError, ShellKind, run_shell};
