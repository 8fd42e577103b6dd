//! Ownership of the running llama-server child process.
//!
//! At most one server is tracked. [`ServerSupervisor::poll`] is non-blocking
//! and is meant to be called every [`POLL_INTERVAL`](crate::constants::POLL_INTERVAL)
//! from the front end's loop; it reports an exit exactly once. Stopped
//! children are kept until a later poll reaps them.

use crate::server::command::BuiltCommand;
use crate::server::external::new_console;
use anyhow::{Context, Result};
use std::fmt;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Returned by [`ServerSupervisor::launch`] when a server is already tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlreadyRunning {
    /// Process id of the tracked server
    pub pid: u32,
}

impl fmt::Display for AlreadyRunning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "A server is already running (pid {})", self.pid)
    }
}

impl std::error::Error for AlreadyRunning {}

/// How a tracked server ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerExit {
    /// Process id the server had
    pub pid: u32,
    /// Exit status, `None` when it could not be determined
    pub status: Option<ExitStatus>,
    /// Time between launch and the exit being observed
    pub uptime: Duration,
}

impl ServerExit {
    /// Returns true for a zero exit status.
    #[must_use]
    pub fn success(&self) -> bool {
        self.status.is_some_and(|status| status.success())
    }
}

impl fmt::Display for ServerExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let seconds = self.uptime.as_secs();
        match self.status {
            Some(status) => write!(
                f,
                "Server (pid {}) exited with {status} after {seconds}s",
                self.pid
            ),
            None => write!(
                f,
                "Server (pid {}) is no longer reachable after {seconds}s",
                self.pid
            ),
        }
    }
}

struct RunningServer {
    child: Child,
    started: Instant,
}

/// Tracks the single server process.
#[derive(Default)]
pub struct ServerSupervisor {
    running: Option<RunningServer>,
    stopped: Vec<Child>,
}

impl ServerSupervisor {
    /// Creates an idle supervisor.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts the server in `working_dir` and returns its pid.
    ///
    /// Fails with [`AlreadyRunning`] while a server is tracked; a spawn
    /// failure leaves the supervisor idle.
    pub fn launch(&mut self, command: &BuiltCommand, working_dir: &Path) -> Result<u32> {
        if let Some(pid) = self.pid() {
            return Err(AlreadyRunning { pid }.into());
        }

        let mut process = Command::new(command.program());
        process
            .args(command.args())
            .env_clear()
            .envs(command.environment())
            .current_dir(working_dir)
            .stdin(Stdio::null());
        new_console(&mut process);

        let child = process
            .spawn()
            .with_context(|| format!("Failed to start {}", command.program()))?;
        let pid = child.id();
        info!("Started {} (pid {pid})", command.program());

        self.running = Some(RunningServer {
            child,
            started: Instant::now(),
        });
        Ok(pid)
    }

    /// Stops any tracked server, then launches `command`.
    pub fn replace(&mut self, command: &BuiltCommand, working_dir: &Path) -> Result<u32> {
        self.stop();
        self.launch(command, working_dir)
    }

    /// Checks whether the tracked server has exited.
    ///
    /// Returns the exit once and clears the tracked handle. A failed status
    /// query counts as an exit.
    pub fn poll(&mut self) -> Option<ServerExit> {
        self.reap_stopped();
        let server = self.running.as_mut()?;
        let status = match server.child.try_wait() {
            Ok(None) => return None,
            Ok(Some(status)) => Some(status),
            Err(e) => {
                warn!("Lost track of server (pid {}): {e}", server.child.id());
                None
            }
        };

        let server = self.running.take()?;
        let exit = ServerExit {
            pid: server.child.id(),
            status,
            uptime: server.started.elapsed(),
        };
        info!("{exit}");
        Some(exit)
    }

    /// Requests termination and forgets the server without waiting.
    ///
    /// Returns false when nothing was running.
    pub fn stop(&mut self) -> bool {
        let Some(mut server) = self.running.take() else {
            return false;
        };

        let pid = server.child.id();
        match terminate(&mut server.child) {
            Ok(()) => info!("Stop requested for server (pid {pid})"),
            Err(e) => warn!("Failed to stop server (pid {pid}): {e:#}"),
        }
        self.stopped.push(server.child);
        self.reap_stopped();
        true
    }

    /// Collects the exit status of stopped children that have terminated.
    fn reap_stopped(&mut self) {
        self.stopped.retain_mut(|child| match child.try_wait() {
            Ok(None) => true,
            Ok(Some(status)) => {
                debug!("Reaped stopped server (pid {}): {status}", child.id());
                false
            }
            Err(e) => {
                warn!("Dropping stopped server (pid {}): {e}", child.id());
                false
            }
        });
    }

    /// Returns true while a server is tracked.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Pid of the tracked server.
    #[must_use]
    pub fn pid(&self) -> Option<u32> {
        self.running.as_ref().map(|server| server.child.id())
    }

    /// Time since the tracked server was launched.
    #[must_use]
    pub fn uptime(&self) -> Option<Duration> {
        self.running.as_ref().map(|server| server.started.elapsed())
    }
}

#[cfg(unix)]
fn terminate(child: &mut Child) -> Result<()> {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    let pid = i32::try_from(child.id()).context("Process id out of range")?;
    kill(Pid::from_raw(pid), Signal::SIGTERM).context("Failed to send SIGTERM")
}

#[cfg(not(unix))]
fn terminate(child: &mut Child) -> Result<()> {
    child.kill().context("Failed to terminate process")
}
