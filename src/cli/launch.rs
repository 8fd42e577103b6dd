//! Server launch and interactive supervision.
//!
//! Without `--detach` the command stays in the foreground, polls the server
//! once per tick, and reads control commands from stdin on a helper thread.

use crate::app::AppPaths;
use crate::cli::common::{CliError, CliResult, FormArgs};
use crate::cli::preview::{prepare, PreparedLaunch};
use crate::cli::style::StatusPalette;
use crate::constants::POLL_INTERVAL;
use crate::server::external::{chat_port, open_chat};
use crate::server::{AlreadyRunning, ServerSupervisor, ShellStyle};
use clap::Args;
use std::io::BufRead;
use std::str::FromStr;
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError};
use std::thread;
use tracing::warn;

/// Launch llama-server and supervise it
#[derive(Args, Debug)]
pub struct LaunchArgs {
    #[command(flatten)]
    form: FormArgs,

    /// Start the server and exit immediately instead of supervising it
    #[arg(long)]
    detach: bool,

    /// Open the chat page once the server has started
    #[arg(long)]
    open_chat: bool,
}

/// Control commands accepted on stdin while supervising.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    /// Stop the server and exit
    Stop,
    /// Stop the server and start it again with freshly loaded documents
    Restart,
    /// Open the chat page
    Open,
    /// Print pid and uptime
    Status,
    /// List the commands
    Help,
}

impl FromStr for ControlCommand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "stop" | "quit" | "q" => Ok(Self::Stop),
            "restart" | "r" => Ok(Self::Restart),
            "open" | "chat" | "o" => Ok(Self::Open),
            "status" | "s" => Ok(Self::Status),
            "help" | "h" | "?" => Ok(Self::Help),
            other => Err(format!("Unknown command '{other}' (type 'help')")),
        }
    }
}

const CONTROL_HELP: &str = "Commands: stop, restart, open, status, help";

impl LaunchArgs {
    /// Execute launch command
    pub fn execute(&self, paths: &AppPaths) -> CliResult<()> {
        let palette = StatusPalette::from_theme(paths.theme().theme());
        let prepared = self.prepare_valid(paths)?;
        let mut supervisor = ServerSupervisor::new();

        start(&mut supervisor, &prepared, false)?;
        println!(
            "{}",
            palette.running(&format!(
                "Server running (pid {})",
                supervisor.pid().unwrap_or_default()
            ))
        );

        let mut port = chat_port(prepared.form.values());
        if self.open_chat {
            open_chat_or_warn(port);
        }

        if self.detach {
            return Ok(());
        }

        println!("{CONTROL_HELP}");
        let commands = spawn_stdin_reader();
        let mut stdin_open = true;

        loop {
            let line = if stdin_open {
                match commands.recv_timeout(POLL_INTERVAL) {
                    Ok(line) => Some(line),
                    Err(RecvTimeoutError::Timeout) => None,
                    Err(RecvTimeoutError::Disconnected) => {
                        stdin_open = false;
                        None
                    }
                }
            } else {
                thread::sleep(POLL_INTERVAL);
                None
            };

            if let Some(line) = line.filter(|line| !line.trim().is_empty()) {
                match line.parse::<ControlCommand>() {
                    Ok(ControlCommand::Stop) => {
                        supervisor.stop();
                        println!("{}", palette.stopped("Server stopped"));
                        return Ok(());
                    }
                    Ok(ControlCommand::Restart) => {
                        let restarted = self.prepare_valid(paths).and_then(|prepared| {
                            start(&mut supervisor, &prepared, true).map(|()| prepared)
                        });
                        match restarted {
                            Ok(prepared) => {
                                port = chat_port(prepared.form.values());
                                println!(
                                    "{}",
                                    palette.running(&format!(
                                        "Server restarted (pid {})",
                                        supervisor.pid().unwrap_or_default()
                                    ))
                                );
                            }
                            // The old server is gone once replace has started
                            Err(e) if !supervisor.is_running() => return Err(e),
                            Err(e) => eprintln!("Error: {e}"),
                        }
                    }
                    Ok(ControlCommand::Open) => open_chat_or_warn(port),
                    Ok(ControlCommand::Status) => match (supervisor.pid(), supervisor.uptime()) {
                        (Some(pid), Some(uptime)) => println!(
                            "{}",
                            palette.running(&format!(
                                "Server running (pid {pid}, up {}s)",
                                uptime.as_secs()
                            ))
                        ),
                        _ => println!("{}", palette.stopped("Server not running")),
                    },
                    Ok(ControlCommand::Help) => println!("{CONTROL_HELP}"),
                    Err(message) => eprintln!("{message}"),
                }
            }

            if let Some(exit) = supervisor.poll() {
                println!("{}", palette.stopped(&exit.to_string()));
                if exit.success() {
                    return Ok(());
                }
                return Err(CliError::launch(exit.to_string()));
            }
        }
    }

    fn prepare_valid(&self, paths: &AppPaths) -> CliResult<PreparedLaunch> {
        let prepared = prepare(paths, &self.form)?;
        if let Some(projector) = &prepared.cleared_mmproj {
            warn!("Dropped projector '{projector}': not next to the selected model");
        }
        prepared
            .form
            .validate_launch()
            .map_err(|e| CliError::validation(e.to_string()))?;
        Ok(prepared)
    }
}

fn start(
    supervisor: &mut ServerSupervisor,
    prepared: &PreparedLaunch,
    replace: bool,
) -> CliResult<()> {
    println!("{}", prepared.command.display_string(ShellStyle::native()));

    let working_dir = prepared.context.server_dir();
    let result = if replace {
        supervisor.replace(&prepared.command, working_dir)
    } else {
        supervisor.launch(&prepared.command, working_dir)
    };

    result.map(|_| ()).map_err(|e| {
        if e.is::<AlreadyRunning>() {
            CliError::validation(e.to_string())
        } else {
            CliError::launch(format!("{e:#}"))
        }
    })
}

fn open_chat_or_warn(port: u16) {
    match open_chat(port) {
        Ok(url) => println!("Opened {url}"),
        Err(e) => eprintln!("Warning: {e:#}"),
    }
}

fn spawn_stdin_reader() -> Receiver<String> {
    let (sender, receiver) = channel();
    thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else {
                break;
            };
            if sender.send(line).is_err() {
                break;
            }
        }
    });
    receiver
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_command_parsing() {
        assert_eq!("stop".parse::<ControlCommand>(), Ok(ControlCommand::Stop));
        assert_eq!(" Restart ".parse::<ControlCommand>(), Ok(ControlCommand::Restart));
        assert_eq!("o".parse::<ControlCommand>(), Ok(ControlCommand::Open));
        assert_eq!("status".parse::<ControlCommand>(), Ok(ControlCommand::Status));
        assert_eq!("?".parse::<ControlCommand>(), Ok(ControlCommand::Help));
        assert!("launch".parse::<ControlCommand>().is_err());
    }
}
