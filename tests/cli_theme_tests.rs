//! End-to-end tests for `llama-launcher theme` commands.

use serde_json::json;

mod fixtures;
use fixtures::*;

#[test]
fn test_theme_show_defaults() {
    let env = TestEnv::new();
    let theme = env.run_json(&["theme", "show", "--json"]);

    assert_eq!(theme["colors"]["window_bg"], "#1e1e2e");
    assert_eq!(theme["colors"]["stop_btn_bg"], "#f38ba8");
    assert_eq!(theme["fonts"]["family"], "Segoe UI");
    assert_eq!(theme["sizes"]["btn_padding"], "8px 16px");
}

#[test]
fn test_theme_partial_document_is_backfilled() {
    let env = TestEnv::new();
    env.write_document("theme.json", &json!({"colors": {"text": "#ffffff"}}));

    let theme = env.run_json(&["theme", "show", "--json"]);
    assert_eq!(theme["colors"]["text"], "#ffffff");
    assert_eq!(theme["colors"]["button_bg"], "#89b4fa");
    assert_eq!(theme["fonts"]["size"], "14px");
}

#[test]
fn test_theme_set_and_reset() {
    let env = TestEnv::new();
    let args = ["theme", "set", "colors.window_bg", "#000000"];
    assert_success(&env.run(&args), &args);
    assert_eq!(env.read_document("theme.json")["colors"]["window_bg"], "#000000");

    assert_success(&env.run(&["theme", "reset"]), &["theme", "reset"]);
    assert_eq!(env.read_document("theme.json")["colors"]["window_bg"], "#1e1e2e");
}

#[test]
fn test_theme_set_rejects_unknown_section() {
    let env = TestEnv::new();
    let output = env.run(&["theme", "set", "borders.width", "2px"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Unknown theme section"));
}
