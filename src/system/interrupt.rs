// src/system/interrupt.rs

//! Keeps envshell alive while a shell owns the console.
//!
//! Ctrl-C is delivered to every process attached to the terminal, envshell
//! included. While an [`InterruptShield`] is held, SIGINT (and SIGQUIT on Unix)
//! are absorbed so the session's cleanup still runs once the shell exits.
//! Without a shield the signals keep their default effect, like `system(3)`.

use signal_hook::flag;
use std::ffi::c_int;
use std::io;
use std::process::{Command as StdCommand, ExitStatus};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

#[cfg(unix)]
const SHIELDED_SIGNALS: &[c_int] = &[signal_hook::consts::SIGINT, signal_hook::consts::SIGQUIT];
#[cfg(not(unix))]
const SHIELDED_SIGNALS: &[c_int] = &[signal_hook::consts::SIGINT];

/// Process-wide handlers, installed on first use.
struct Handlers {
    /// When set, a delivered signal runs its default action.
    pass_through: Arc<AtomicBool>,
    /// Number of live shields.
    depth: Mutex<usize>,
}

static HANDLERS: OnceLock<Option<Handlers>> = OnceLock::new();

fn handlers() -> Option<&'static Handlers> {
    HANDLERS
        .get_or_init(|| {
            let pass_through = Arc::new(AtomicBool::new(true));
            for &signal in SHIELDED_SIGNALS {
                if let Err(e) = flag::register_conditional_default(signal, Arc::clone(&pass_through))
                {
                    log::warn!("Could not install interrupt handler for signal {}: {}", signal, e);
                    return None;
                }
            }
            Some(Handlers {
                pass_through,
                depth: Mutex::new(0),
            })
        })
        .as_ref()
}

/// Absorbs terminal interrupts in this process until dropped.
///
/// Shields nest; the default behavior comes back when the last one is dropped.
/// Child processes are unaffected: handlers are reset to the default on `exec`.
#[derive(Debug)]
#[must_use = "interrupts are only absorbed while the shield is alive"]
pub struct InterruptShield {
    engaged: bool,
}

impl InterruptShield {
    /// Starts absorbing interrupts. If the handlers cannot be installed the
    /// shield is inert and a warning has been logged.
    pub fn engage() -> Self {
        let Some(handlers) = handlers() else {
            return Self { engaged: false };
        };
        let mut depth = handlers.depth.lock().unwrap_or_else(PoisonError::into_inner);
        *depth += 1;
        handlers.pass_through.store(false, Ordering::SeqCst);
        Self { engaged: true }
    }
}

impl Drop for InterruptShield {
    fn drop(&mut self) {
        if !self.engaged {
            return;
        }
        if let Some(handlers) = handlers() {
            let mut depth = handlers.depth.lock().unwrap_or_else(PoisonError::into_inner);
            *depth = depth.saturating_sub(1);
            if *depth == 0 {
                handlers.pass_through.store(true, Ordering::SeqCst);
            }
        }
    }
}

/// Runs `command` to completion with interrupts absorbed in this process.
pub fn status_shielded(command: &mut StdCommand) -> io::Result<ExitStatus> {
    let _shield = InterruptShield::engage();
    command.status()
}
