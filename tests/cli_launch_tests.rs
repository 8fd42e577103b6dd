//! End-to-end tests for `llama-launcher launch` and helpers around it.

mod fixtures;
use fixtures::*;

#[test]
fn test_launch_without_model_is_validation_error() {
    let env = TestEnv::new();
    let output = env.run(&["launch"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("No model selected"));
}

#[test]
fn test_launch_missing_executable_is_launch_error() {
    let env = TestEnv::new();
    env.touch_model("model.gguf");

    let output = env.run(&["launch", "--model", "model.gguf"]);
    assert_eq!(output.status.code(), Some(3));
    assert!(stderr(&output).contains("Failed to start"));
}

#[cfg(unix)]
#[test]
fn test_launch_supervises_until_exit() {
    let env = TestEnv::new();
    env.touch_model("model.gguf");
    env.install_server_script(r#"printf '%s\n' "$@" > launched-args.txt"#);

    let args = ["launch", "--model", "model.gguf", "--set", "port=8123"];
    let output = env.run(&args);
    assert_success(&output, &args);

    // The server runs in its own directory
    let recorded = std::fs::read_to_string(env.server_dir().join("launched-args.txt")).unwrap();
    let recorded: Vec<&str> = recorded.lines().collect();
    let port = recorded.iter().position(|arg| *arg == "--port").unwrap();
    assert_eq!(recorded[port + 1], "8123");
    assert!(recorded.contains(&"-m"));
    assert!(stdout(&output).contains("exited"));
}

#[cfg(unix)]
#[test]
fn test_launch_reports_failed_exit() {
    let env = TestEnv::new();
    env.touch_model("model.gguf");
    env.install_server_script("exit 7");

    let output = env.run(&["launch", "--model", "model.gguf"]);
    assert_eq!(output.status.code(), Some(3));
}

#[cfg(unix)]
#[test]
fn test_launch_passes_reasoning_effort_environment() {
    let env = TestEnv::new();
    env.touch_model("model.gguf");
    env.install_server_script(r#"printf '%s' "$LLAMA_CHAT_TEMPLATE_KWARGS" > kwargs.txt"#);

    let args = ["launch", "-m", "model.gguf", "--set", "reasoning-effort=low"];
    assert_success(&env.run(&args), &args);

    let kwargs = std::fs::read_to_string(env.server_dir().join("kwargs.txt")).unwrap();
    assert_eq!(kwargs, r#"{"reasoning_effort":"low"}"#);
}

#[cfg(unix)]
#[test]
fn test_launch_detach_returns_immediately() {
    let env = TestEnv::new();
    env.touch_model("model.gguf");
    // Release the inherited output pipes so the test does not wait for the sleeper
    env.install_server_script("exec >/dev/null 2>&1\nsleep 5");

    let started = std::time::Instant::now();
    let output = env.run(&["launch", "-m", "model.gguf", "--detach"]);
    assert_success(&output, &["launch", "--detach"]);
    assert!(stdout(&output).contains("Server running (pid"));
    assert!(started.elapsed() < std::time::Duration::from_secs(4));
}

#[cfg(unix)]
const LONG_RUNNING_SERVER: &str = "echo started >> launches.txt\nexec >/dev/null 2>&1\nexec sleep 30";

#[cfg(unix)]
#[test]
fn test_launch_stop_command_ends_supervision() {
    let env = TestEnv::new();
    env.touch_model("model.gguf");
    env.install_server_script(LONG_RUNNING_SERVER);

    let mut child = env.spawn_interactive(&["launch", "-m", "model.gguf"]);
    env.wait_for_lines("launches.txt", 1);
    send_line(&mut child, "stop");
    drop(child.stdin.take());

    let output = child.wait_with_output().unwrap();
    assert_success(&output, &["launch", "stop"]);
    assert!(stdout(&output).contains("Server stopped"));
}

#[cfg(unix)]
#[test]
fn test_launch_restart_command_starts_new_server() {
    let env = TestEnv::new();
    env.touch_model("model.gguf");
    env.install_server_script(LONG_RUNNING_SERVER);

    let mut child = env.spawn_interactive(&["launch", "-m", "model.gguf"]);
    env.wait_for_lines("launches.txt", 1);
    send_line(&mut child, "restart");
    env.wait_for_lines("launches.txt", 2);
    send_line(&mut child, "stop");
    drop(child.stdin.take());

    let output = child.wait_with_output().unwrap();
    assert_success(&output, &["launch", "restart"]);
    assert!(stdout(&output).contains("Server restarted (pid"));
    assert!(stdout(&output).contains("Server stopped"));
}

#[cfg(unix)]
#[test]
fn test_launch_failed_restart_keeps_server() {
    let env = TestEnv::new();
    env.touch_model("model.gguf");
    env.install_server_script(LONG_RUNNING_SERVER);
    let args = ["profile", "create", "Fast", "-m", "model.gguf"];
    assert_success(&env.run(&args), &args);

    let mut child = env.spawn_interactive(&["launch", "-p", "Fast"]);
    env.wait_for_lines("launches.txt", 1);
    // The rebuilt form can no longer find its profile
    env.write_document("profiles.json", &serde_json::json!({}));
    send_line(&mut child, "restart");
    send_line(&mut child, "status");
    send_line(&mut child, "stop");
    drop(child.stdin.take());

    let output = child.wait_with_output().unwrap();
    assert_success(&output, &["launch", "failed restart"]);
    assert!(stderr(&output).contains("Profile 'Fast' not found"));
    // Status reports the original server with its uptime
    assert!(stdout(&output).contains(", up "));
    assert!(!stdout(&output).contains("Server restarted"));
    assert!(stdout(&output).contains("Server stopped"));

    let launches = std::fs::read_to_string(env.server_dir().join("launches.txt")).unwrap();
    assert_eq!(launches.lines().count(), 1);
}
