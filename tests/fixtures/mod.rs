//! Shared test fixtures for E2E CLI tests.
#![allow(dead_code)] // Not every test file uses every fixture

use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::io::Write;
use std::process::{Child, Command, Output, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;

/// Path to the llama-launcher binary
pub fn launcher_bin() -> &'static str {
    env!("CARGO_BIN_EXE_llama-launcher")
}

/// An isolated config directory plus a server directory holding a models tree.
pub struct TestEnv {
    pub config: TempDir,
    pub server: TempDir,
}

impl TestEnv {
    /// Creates empty directories and points the settings at them.
    pub fn new() -> Self {
        let env = Self {
            config: TempDir::new().expect("Failed to create config dir"),
            server: TempDir::new().expect("Failed to create server dir"),
        };
        fs::create_dir_all(env.models_dir()).expect("Failed to create models dir");
        env.write_document(
            "settings.json",
            &json!({
                "server_dir": env.server.path(),
                "models_dir": env.models_dir(),
            }),
        );
        env
    }

    /// Models directory inside the server directory.
    pub fn models_dir(&self) -> PathBuf {
        self.server.path().join("models")
    }

    /// Creates a model (or projector) file at a `/`-separated relative path.
    pub fn touch_model(&self, relative: &str) -> PathBuf {
        let path = relative
            .split('/')
            .fold(self.models_dir(), |path, part| path.join(part));
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"GGUF").unwrap();
        path
    }

    /// Writes a JSON document into the config directory.
    pub fn write_document(&self, name: &str, value: &Value) {
        fs::write(
            self.config.path().join(name),
            serde_json::to_string_pretty(value).unwrap(),
        )
        .unwrap();
    }

    /// Reads a JSON document from the config directory.
    pub fn read_document(&self, name: &str) -> Value {
        let raw = fs::read_to_string(self.config.path().join(name))
            .unwrap_or_else(|e| panic!("Failed to read {name}: {e}"));
        serde_json::from_str(&raw).unwrap()
    }

    /// Command with the isolated config directory.
    pub fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(launcher_bin());
        cmd.env("LLAMA_LAUNCHER_CONFIG_DIR", self.config.path())
            .env_remove("RUST_LOG")
            .stdin(Stdio::null())
            .args(args);
        cmd
    }

    /// Runs a command to completion.
    pub fn run(&self, args: &[&str]) -> Output {
        self.command(args)
            .output()
            .expect("Failed to execute command")
    }

    /// Runs a command that must succeed and parses its stdout as JSON.
    pub fn run_json(&self, args: &[&str]) -> Value {
        let output = self.run(args);
        assert_success(&output, args);
        serde_json::from_slice(&output.stdout).unwrap_or_else(|e| {
            panic!(
                "Output of {args:?} is not JSON ({e}): {}",
                String::from_utf8_lossy(&output.stdout)
            )
        })
    }

    /// Starts a command with piped stdin for interactive control.
    pub fn spawn_interactive(&self, args: &[&str]) -> Child {
        self.command(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("Failed to spawn command")
    }

    /// Waits until `name` in the server directory has at least `count` lines.
    pub fn wait_for_lines(&self, name: &str, count: usize) {
        let path = self.server.path().join(name);
        let deadline = Instant::now() + Duration::from_secs(10);
        loop {
            let lines = fs::read_to_string(&path).map_or(0, |raw| raw.lines().count());
            if lines >= count {
                return;
            }
            assert!(Instant::now() < deadline, "{name} never reached {count} line(s)");
            thread::sleep(Duration::from_millis(50));
        }
    }

    /// Installs an executable script as the server binary (unix only).
    #[cfg(unix)]
    pub fn install_server_script(&self, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = self.server.path().join("llama-server");
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    /// Server directory path.
    pub fn server_dir(&self) -> &Path {
        self.server.path()
    }
}

/// Asserts a zero exit code, printing stderr otherwise.
pub fn assert_success(output: &Output, args: &[&str]) {
    assert_eq!(
        output.status.code(),
        Some(0),
        "{args:?} should succeed. stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

/// Sends one control line to an interactive command.
pub fn send_line(child: &mut Child, line: &str) {
    let stdin = child.stdin.as_mut().expect("stdin is not piped");
    writeln!(stdin, "{line}").expect("Failed to write to stdin");
    stdin.flush().expect("Failed to flush stdin");
}

/// Stdout as text.
pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// Stderr as text.
pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// Position of `flag` in a JSON argv array.
pub fn flag_value<'a>(argv: &'a Value, flag: &str) -> Option<&'a str> {
    let argv = argv.as_array()?;
    let index = argv.iter().position(|arg| arg == flag)?;
    argv.get(index + 1)?.as_str()
}

/// Returns true when `flag` appears in a JSON argv array.
pub fn has_flag(argv: &Value, flag: &str) -> bool {
    argv.as_array()
        .is_some_and(|argv| argv.iter().any(|arg| arg == flag))
}
