// src/system/pty.rs

//! Interactive sessions for POSIX-style shells.
//!
//! bash, zsh and fish have no "run this file and stay open" flag that keeps
//! their own startup files working, so the shell is started interactively in a
//! pseudo-terminal and the activation command is typed into it. The user's
//! terminal is then wired straight through to the PTY until the shell exits.

use crate::{
    SessionExit,
    constants::{ACTIVATE_FISH, ACTIVATE_POSIX},
    system::{
        shell::ShellError,
        terminal::{self, RawModeGuard, TerminalSize},
    },
};
use portable_pty::{
    Child, ChildKiller, CommandBuilder, MasterPty, PtySystem, SlavePty, native_pty_system,
};
use std::env;
use std::ffi::OsString;
use std::io::{self, Read, Write};
use std::path::Path;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// The master side of the session's PTY, shared with the resize watcher.
type SharedMaster = Mutex<Box<dyn MasterPty + Send>>;

/// End-of-transmission, sent to the shell when our own stdin is exhausted.
const EOT: u8 = 0x04;

/// How long output is still copied after the shell exits. Background jobs can
/// keep the PTY open indefinitely.
const OUTPUT_DRAIN_TIMEOUT: Duration = Duration::from_millis(250);

/// The shells driven through a pseudo-terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PtyShell {
    /// GNU bash.
    Bash,
    /// Z shell.
    Zsh,
    /// fish.
    Fish,
}

impl PtyShell {
    /// Executable name used when no override path is given.
    pub fn default_program(self) -> &'static str {
        match self {
            Self::Bash => "bash",
            Self::Zsh => "zsh",
            Self::Fish => "fish",
        }
    }

    /// The line typed into the shell to activate the environment.
    pub fn activation_line(self, activation_dir: &Path) -> String {
        match self {
            Self::Bash | Self::Zsh => format!(
                "source \"{}\"\n",
                activation_dir.join(ACTIVATE_POSIX).display()
            ),
            Self::Fish => format!(". \"{}\"\n", activation_dir.join(ACTIVATE_FISH).display()),
        }
    }
}

/// Something whose terminal dimensions can be changed.
pub trait ResizeTarget {
    /// Applies `size` to the target.
    fn apply_size(&self, size: TerminalSize) -> anyhow::Result<()>;
}

impl ResizeTarget for SharedMaster {
    fn apply_size(&self, size: TerminalSize) -> anyhow::Result<()> {
        let master = self
            .lock()
            .map_err(|_| anyhow::anyhow!("PTY master lock poisoned"))?;
        master.resize(size.to_pty_size())
    }
}

/// Re-reads the terminal size through `probe` and applies it to `target`.
///
/// Returns the size that was read. A failed resize is logged and otherwise
/// ignored: the session must survive it.
pub fn forward_resize<T>(target: &T, probe: impl Fn() -> TerminalSize) -> TerminalSize
where
    T: ResizeTarget + ?Sized,
{
    let size = probe();
    if let Err(e) = target.apply_size(size) {
        log::warn!("Failed to resize PTY to {}x{}: {}", size.cols, size.rows, e);
    }
    size
}

/// Runs `shell` inside a PTY with the environment in `activation_dir` activated.
///
/// Blocks until the shell exits and returns its exit code.
pub fn run_interactive(
    shell: PtyShell,
    activation_dir: &Path,
    shell_path: Option<&Path>,
) -> Result<SessionExit, ShellError> {
    let program = shell_path.map_or_else(
        || OsString::from(shell.default_program()),
        |p| p.as_os_str().to_owned(),
    );
    let size = terminal::dimensions();
    log::debug!(
        "Opening {}x{} PTY for {:?}",
        size.cols,
        size.rows,
        program
    );

    let pair = native_pty_system()
        .openpty(size.to_pty_size())
        .map_err(ShellError::Pty)?;
    let mut writer = pair.master.take_writer().map_err(ShellError::Pty)?;
    let reader = pair.master.try_clone_reader().map_err(ShellError::Pty)?;

    let mut cmd = CommandBuilder::new(&program);
    cmd.arg("-i");
    if let Ok(cwd) = env::current_dir() {
        cmd.cwd(cwd);
    }
    let mut child = pair
        .slave
        .spawn_command(cmd)
        .map_err(|e| ShellError::Spawn {
            shell: program.to_string_lossy().into_owned(),
            source: e,
        })?;

    // Written while our slave handle is still open: a shell that exits at once
    // would otherwise turn this write into EIO.
    let line = shell.activation_line(activation_dir);
    if let Err(e) = writer.write_all(line.as_bytes()).and_then(|()| writer.flush()) {
        if let Err(kill_err) = child.kill() {
            log::warn!("Failed to stop shell after activation error: {}", kill_err);
        }
        child.wait().ok();
        return Err(ShellError::Pty(e.into()));
    }
    // Only the child may hold the slave, otherwise the output pump never sees EOF.
    drop(pair.slave);

    let master: Arc<SharedMaster> = Arc::new(Mutex::new(pair.master));
    let watcher = install_resize_watcher(&master)
        .map_err(|e| log::warn!("{}. The session keeps its initial size.", e))
        .ok();

    let raw_guard = RawModeGuard::for_stdin_if_tty()
        .map_err(|e| log::warn!("Could not switch terminal to raw mode: {}", e))
        .ok();
    spawn_input_pump(writer);
    let output = OutputPump::spawn(reader, io::stdout());

    let status = child.wait();

    drop(watcher);
    // ConPTY only closes the output pipe once the pseudo console is gone.
    drop(master);
    if let Some(output) = output {
        output.finish(OUTPUT_DRAIN_TIMEOUT);
    }
    drop(raw_guard);

    let status = status.map_err(|e| ShellError::Pty(e.into()))?;
    log::debug!("Interactive shell finished: {:?}", status);
    Ok(exit_code(&status))
}

/// Maps a PTY exit status to a session exit code; `None` when a signal ended the shell.
///
/// Codes above `i32::MAX` (Windows NTSTATUS values) wrap to negative numbers,
/// matching `std::process::ExitStatus::code`.
#[allow(clippy::cast_possible_wrap)]
fn exit_code(status: &portable_pty::ExitStatus) -> SessionExit {
    if status.signal().is_some() {
        return None;
    }
    Some(status.exit_code() as i32)
}

/// Copies the user's keystrokes into the PTY.
///
/// The thread is detached: a blocking read on stdin cannot be interrupted, and
/// it ends on its own at the next keystroke once the PTY is gone.
fn spawn_input_pump(mut writer: Box<dyn Write + Send>) {
    let spawned = thread::Builder::new()
        .name("envshell-stdin".to_string())
        .spawn(move || {
            let mut stdin = io::stdin();
            let mut buf = [0u8; 4096];
            loop {
                let chunk = match stdin.read(&mut buf) {
                    Ok(0) => {
                        if let Err(e) = writer.write_all(&[EOT]).and_then(|()| writer.flush()) {
                            log::debug!("Could not send end of input to the shell: {}", e);
                        }
                        break;
                    }
                    Ok(n) => buf.get(..n).unwrap_or_default(),
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(_) => break,
                };
                if writer.write_all(chunk).and_then(|()| writer.flush()).is_err() {
                    break;
                }
            }
        });
    if let Err(e) = spawned {
        log::warn!("Could not forward input to the shell: {}", e);
    }
}

/// Copies everything the shell prints to a sink until the PTY closes.
struct OutputPump {
    handle: JoinHandle<()>,
    /// Disconnects when the copy loop ends.
    done: Receiver<()>,
}

impl OutputPump {
    fn spawn<W>(mut reader: Box<dyn Read + Send>, mut sink: W) -> Option<Self>
    where
        W: Write + Send + 'static,
    {
        let (done_tx, done) = mpsc::channel::<()>();
        let spawned = thread::Builder::new()
            .name("envshell-stdout".to_string())
            .spawn(move || {
                let _done = done_tx;
                let mut buf = [0u8; 8192];
                loop {
                    let chunk = match reader.read(&mut buf) {
                        Ok(0) => break,
                        Ok(n) => buf.get(..n).unwrap_or_default(),
                        Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                        // EIO once the last slave handle is closed.
                        Err(_) => break,
                    };
                    if sink.write_all(chunk).and_then(|()| sink.flush()).is_err() {
                        break;
                    }
                }
            });
        match spawned {
            Ok(handle) => Some(Self { handle, done }),
            Err(e) => {
                log::warn!("Could not forward shell output: {}", e);
                None
            }
        }
    }

    /// Waits up to `timeout` for the remaining output. A pump still blocked
    /// after that (the PTY is held by a leftover background job) is detached.
    fn finish(self, timeout: Duration) {
        match self.done.recv_timeout(timeout) {
            Err(RecvTimeoutError::Timeout) => {
                log::debug!("PTY still open after the shell exited; leaving its output behind.");
            }
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                if self.handle.join().is_err() {
                    log::warn!("PTY output thread panicked.");
                }
            }
        }
    }
}

#[cfg(unix)]
fn install_resize_watcher(
    master: &Arc<SharedMaster>,
) -> Result<watcher::ResizeWatcher, ShellError> {
    watcher::ResizeWatcher::install(Arc::clone(master))
}

#[cfg(not(unix))]
fn install_resize_watcher(_master: &Arc<SharedMaster>) -> Result<(), ShellError> {
    Err(ShellError::SignalSetup(io::Error::new(
        io::ErrorKind::Unsupported,
        "resize notifications are only available on Unix",
    )))
}

#[cfg(unix)]
mod watcher {
    use super::{ResizeTarget, forward_resize};
    use crate::system::{shell::ShellError, terminal};
    use signal_hook::{consts::SIGWINCH, iterator::Handle, iterator::Signals};
    use std::sync::Arc;
    use std::thread::{self, JoinHandle};

    /// Forwards SIGWINCH to a PTY for the lifetime of one session.
    ///
    /// The signal subscription is closed and the thread joined on drop.
    #[derive(Debug)]
    pub(super) struct ResizeWatcher {
        handle: Handle,
        thread: Option<JoinHandle<()>>,
    }

    impl ResizeWatcher {
        pub(super) fn install<T>(target: Arc<T>) -> Result<Self, ShellError>
        where
            T: ResizeTarget + Send + Sync + ?Sized + 'static,
        {
            let mut signals = Signals::new([SIGWINCH]).map_err(ShellError::SignalSetup)?;
            let handle = signals.handle();
            let thread = thread::Builder::new()
                .name("envshell-resize".to_string())
                .spawn(move || {
                    for _ in signals.forever() {
                        let size = forward_resize(&*target, terminal::dimensions);
                        log::debug!("Terminal resized to {}x{}", size.cols, size.rows);
                    }
                })
                .map_err(ShellError::SignalSetup)?;
            Ok(Self {
                handle,
                thread: Some(thread),
            })
        }
    }

    impl Drop for ResizeWatcher {
        fn drop(&mut self) {
            self.handle.close();
            if let Some(thread) = self.thread.take()
                && thread.join().is_err()
            {
                log::warn!("Resize watcher thread panicked.");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    #[derive(Default)]
    struct RecordingTarget {
        applied: RefCell<Vec<TerminalSize>>,
    }

    impl ResizeTarget for RecordingTarget {
        fn apply_size(&self, size: TerminalSize) -> anyhow::Result<()> {
            self.applied.borrow_mut().push(size);
            Ok(())
        }
    }

    struct FailingTarget;

    impl ResizeTarget for FailingTarget {
        fn apply_size(&self, _size: TerminalSize) -> anyhow::Result<()> {
            Err(anyhow::anyhow!("no pty"))
        }
    }

    #[test]
    fn test_activation_lines() {
        let dir = Path::new("/envs/myenv/bin");
        assert_eq!(
            PtyShell::Bash.activation_line(dir),
            "source \"/envs/myenv/bin/activate\"\n"
        );
        assert_eq!(
            PtyShell::Zsh.activation_line(dir),
            "source \"/envs/myenv/bin/activate\"\n"
        );
        assert_eq!(
            PtyShell::Fish.activation_line(dir),
            ". \"/envs/myenv/bin/activate.fish\"\n"
        );
    }

    #[test]
    fn test_default_programs() {
        assert_eq!(PtyShell::Bash.default_program(), "bash");
        assert_eq!(PtyShell::Zsh.default_program(), "zsh");
        assert_eq!(PtyShell::Fish.default_program(), "fish");
    }

    #[test]
    fn test_consecutive_resizes_apply_the_latest_size() {
        let target = RecordingTarget::default();
        let sizes = [
            TerminalSize { rows: 30, cols: 100 },
            TerminalSize { rows: 50, cols: 160 },
        ];
        let call = Cell::new(0usize);
        let probe = || {
            let size = sizes[call.get()];
            call.set(call.get() + 1);
            size
        };

        forward_resize(&target, probe);
        assert_eq!(target.applied.borrow().last(), Some(&sizes[0]));

        forward_resize(&target, probe);
        assert_eq!(target.applied.borrow().last(), Some(&sizes[1]));
        assert_eq!(target.applied.borrow().len(), 2);
    }

    #[test]
    fn test_failed_resize_does_not_panic() {
        let size = forward_resize(&FailingTarget, || TerminalSize { rows: 5, cols: 6 });
        assert_eq!(size, TerminalSize { rows: 5, cols: 6 });
    }

    #[cfg(unix)]
    #[test]
    fn test_resize_reaches_a_real_pty() {
        let pair = native_pty_system()
            .openpty(TerminalSize::FALLBACK.to_pty_size())
            .unwrap();
        let master: SharedMaster = Mutex::new(pair.master);

        forward_resize(&master, || TerminalSize { rows: 40, cols: 120 });
        let size = master.lock().unwrap().get_size().unwrap();
        assert_eq!((size.rows, size.cols), (40, 120));

        forward_resize(&master, || TerminalSize { rows: 12, cols: 70 });
        let size = master.lock().unwrap().get_size().unwrap();
        assert_eq!((size.rows, size.cols), (12, 70));
    }

    #[test]
    fn test_exit_code_mapping() {
        let ok = portable_pty::ExitStatus::with_exit_code(3);
        assert_eq!(exit_code(&ok), Some(3));

        let killed = portable_pty::ExitStatus::with_signal("Killed");
        assert_eq!(exit_code(&killed), None);

        // STATUS_CONTROL_C_EXIT
        let ntstatus = portable_pty::ExitStatus::with_exit_code(0xC000_013A);
        assert_eq!(exit_code(&ntstatus), Some(-1_073_741_510));
    }

    /// A reader that never returns, like a PTY a background job still holds.
    struct StuckReader(Receiver<()>);

    impl Read for StuckReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            self.0.recv().ok();
            Ok(0)
        }
    }

    #[derive(Clone, Default)]
    struct SharedSink(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_output_pump_copies_until_eof() {
        let sink = SharedSink::default();
        let reader = Box::new(io::Cursor::new(b"hello from the shell".to_vec()));
        let pump = OutputPump::spawn(reader, sink.clone()).unwrap();

        pump.finish(Duration::from_secs(5));
        assert_eq!(sink.0.lock().unwrap().as_slice(), b"hello from the shell");
    }

    #[test]
    fn test_output_pump_gives_up_on_a_held_pty() {
        let (_keep_open, rx) = mpsc::channel::<()>();
        let reader = Box::new(StuckReader(rx));
        let pump = OutputPump::spawn(reader, SharedSink::default()).unwrap();

        let started = std::time::Instant::now();
        pump.finish(Duration::from_millis(50));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_missing_shell_is_a_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("no-such-shell");
        let result = run_interactive(PtyShell::Bash, dir.path(), Some(&missing));
        assert!(matches!(result, Err(ShellError::Spawn { .. })));
    }
}
