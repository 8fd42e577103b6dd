//! Helper programs started next to the server.

use crate::constants::{DEFAULT_PORT, GPU_MONITOR_COMMAND};
use crate::models::{keys, ParameterValues};
use anyhow::{Context, Result};
use std::process::{Child, Command};
use tracing::info;

/// Chat page served by llama-server on `port`.
#[must_use]
pub fn chat_url(port: u16) -> String {
    format!("http://localhost:{port}")
}

/// Port from form values, falling back to the default for missing or
/// out-of-range values.
#[must_use]
pub fn chat_port(values: &ParameterValues) -> u16 {
    values
        .integer(keys::PORT)
        .and_then(|port| u16::try_from(port).ok())
        .filter(|port| *port != 0)
        .unwrap_or(DEFAULT_PORT)
}

/// Opens the chat page in the default browser.
///
/// Returns the URL that was opened.
pub fn open_chat(port: u16) -> Result<String> {
    let url = chat_url(port);
    open::that(&url).with_context(|| format!("Failed to open {url} in the browser"))?;
    info!("Opened {url}");
    Ok(url)
}

/// Starts the GPU monitor in its own console.
pub fn monitor_gpu() -> Result<Child> {
    let (program, args) = GPU_MONITOR_COMMAND;
    let mut command = Command::new(program);
    command.args(args);
    new_console(&mut command);

    let child = command
        .spawn()
        .with_context(|| format!("Failed to start {program} (is the NVIDIA driver installed?)"))?;
    info!("Started {program} (pid {})", child.id());
    Ok(child)
}

/// Detaches the child into a new console window on Windows.
#[cfg(windows)]
pub(crate) fn new_console(command: &mut Command) {
    use std::os::windows::process::CommandExt;

    const CREATE_NEW_CONSOLE: u32 = 0x0000_0010;
    command.creation_flags(CREATE_NEW_CONSOLE);
}

/// Consoles are a Windows concept; the child shares the terminal elsewhere.
#[cfg(not(windows))]
pub(crate) fn new_console(_command: &mut Command) {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_chat_url() {
        assert_eq!(chat_url(8080), "http://localhost:8080");
        assert_eq!(chat_url(9001), "http://localhost:9001");
    }

    #[test]
    fn test_chat_port_from_values() {
        let mut values = ParameterValues::new();
        assert_eq!(chat_port(&values), DEFAULT_PORT);

        values.set("port", json!("8181"));
        assert_eq!(chat_port(&values), 8181);

        values.set("port", json!(70000));
        assert_eq!(chat_port(&values), DEFAULT_PORT);

        values.set("port", json!(0));
        assert_eq!(chat_port(&values), DEFAULT_PORT);
    }
}
