// src/system/terminal.rs

use crate::constants::{FALLBACK_COLS, FALLBACK_ROWS};
use crossterm::terminal;
use portable_pty::PtySize;
use std::env;
use std::io::{self, IsTerminal};

/// The dimensions of a terminal, in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalSize {
    /// Number of rows (lines).
    pub rows: u16,
    /// Number of columns.
    pub cols: u16,
}

impl TerminalSize {
    /// The size assumed when no terminal can be queried.
    pub const FALLBACK: Self = Self {
        rows: FALLBACK_ROWS,
        cols: FALLBACK_COLS,
    };

    /// Converts to the representation used by the PTY layer.
    pub fn to_pty_size(self) -> PtySize {
        PtySize {
            rows: self.rows,
            cols: self.cols,
            pixel_width: 0,
            pixel_height: 0,
        }
    }
}

impl Default for TerminalSize {
    fn default() -> Self {
        Self::FALLBACK
    }
}

/// Returns the current size of the controlling terminal.
///
/// `COLUMNS` and `LINES` win when both hold positive integers, then the OS is
/// asked, and finally [`TerminalSize::FALLBACK`] is used. Never fails.
pub fn dimensions() -> TerminalSize {
    let from_env = parse_env_size(
        env::var("LINES").ok().as_deref(),
        env::var("COLUMNS").ok().as_deref(),
    );
    let from_os = || terminal::size().ok().map(|(cols, rows)| (rows, cols));
    pick_dimensions(from_env, from_os)
}

fn parse_env_size(lines: Option<&str>, columns: Option<&str>) -> Option<TerminalSize> {
    let rows = lines?.trim().parse::<u16>().ok().filter(|v| *v > 0)?;
    let cols = columns?.trim().parse::<u16>().ok().filter(|v| *v > 0)?;
    Some(TerminalSize { rows, cols })
}

fn pick_dimensions(
    from_env: Option<TerminalSize>,
    from_os: impl FnOnce() -> Option<(u16, u16)>,
) -> TerminalSize {
    if let Some(size) = from_env {
        return size;
    }
    match from_os() {
        // Some platforms report 0x0 for a detached console.
        Some((rows, cols)) if rows > 0 && cols > 0 => TerminalSize { rows, cols },
        _ => TerminalSize::FALLBACK,
    }
}

/// Puts the controlling terminal into raw mode for as long as it is alive.
///
/// Created through [`RawModeGuard::for_stdin_if_tty`], which is a no-op when
/// stdin is not a terminal (pipes, CI, tests).
#[derive(Debug)]
pub struct RawModeGuard {
    active: bool,
}

impl RawModeGuard {
    /// Enables raw mode if stdin is a terminal.
    pub fn for_stdin_if_tty() -> io::Result<Self> {
        if !io::stdin().is_terminal() {
            return Ok(Self { active: false });
        }
        terminal::enable_raw_mode()?;
        Ok(Self { active: true })
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if self.active
            && let Err(e) = terminal::disable_raw_mode()
        {
            log::warn!("Failed to restore terminal mode: {}", e);
        }
    }
}
