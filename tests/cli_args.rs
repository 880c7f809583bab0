//! Integration tests for CLI argument handling and the REPL binary
//!
//! Tests flag validation and drives the REPL through stdin with commands that
//! never touch the network.

use std::io::Write;
use std::process::{Command, Output, Stdio};

/// Helper to run the CLI with given args and capture output
fn run_cli(args: &[&str]) -> Output {
    run_cli_with_input(args, "")
}

/// Helper to run the CLI with given args, feeding `input` on stdin
fn run_cli_with_input(args: &[&str], input: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_pokedex"))
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to execute pokedex");

    child
        .stdin
        .take()
        .expect("stdin should be piped")
        .write_all(input.as_bytes())
        .expect("Failed to write stdin");

    child.wait_with_output().expect("Failed to wait for pokedex")
}

#[test]
fn test_help_flag_exits_successfully() {
    let output = run_cli(&["--help"]);
    assert!(
        output.status.success(),
        "Expected --help to exit successfully"
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("pokedex"), "Help should mention pokedex");
    assert!(
        stdout.contains("cache-interval"),
        "Help should mention --cache-interval flag"
    );
}

#[test]
fn test_zero_interval_prints_error_and_exits() {
    let output = run_cli(&["--cache-interval", "0"]);
    assert!(!output.status.success(), "Expected zero interval to fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Invalid cache interval"),
        "Should print error message about the interval: {}",
        stderr
    );
}

#[test]
fn test_missing_config_file_prints_error_and_exits() {
    let output = run_cli(&["--config", "/nonexistent/pokedex/config.json"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to read config file"), "{}", stderr);
}

#[test]
fn test_repl_help_then_exit() {
    let output = run_cli_with_input(&[], "help\nexit\n");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Pokedex > "));
    assert!(stdout.contains("Welcome to the Pokedex!"));
    assert!(stdout.contains("Closing the Pokedex... Goodbye!"));
}

#[test]
fn test_repl_unknown_command_and_end_of_input() {
    let output = run_cli_with_input(&["--cache-interval", "5"], "teleport\ncache\n");
    assert!(output.status.success(), "End of input should exit cleanly");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Unknown command"));
    assert!(stdout.contains("Cached responses: 0 (swept every 5s)"));
}

#[test]
fn test_repl_failed_command_reports_on_stderr() {
    // Nothing listens on the discard port, so the request fails immediately
    let output = run_cli_with_input(
        &["--base-url", "http://127.0.0.1:9/api/v2"],
        "map\nexit\n",
    );
    assert!(output.status.success(), "A failed command must not end the session");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Error executing command \"map\""),
        "Should report the failing command: {}",
        stderr
    );
}

#[cfg(test)]
mod unit_tests {
    //! Unit tests for CLI parsing that don't require running the binary

    use clap::Parser;
    use pokedex::cli::{Cli, StartupConfig};
    use pokedex::config::FileConfig;
    use std::time::Duration;

    #[test]
    fn test_cli_no_args() {
        let cli = Cli::parse_from(["pokedex"]);
        assert!(cli.cache_interval.is_none());
        assert!(!cli.verbose);
    }

    #[test]
    fn test_cli_interval_flag() {
        let cli = Cli::parse_from(["pokedex", "--cache-interval", "120"]);
        let config = StartupConfig::merge(&cli, &FileConfig::default()).unwrap();
        assert_eq!(config.cache_interval, Duration::from_secs(120));
    }

    #[test]
    fn test_startup_config_from_cli_with_config_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"page_size": 7, "catch_difficulty": 10}"#).unwrap();

        let cli = Cli::parse_from(["pokedex", "--config", path.to_str().unwrap()]);
        let config = StartupConfig::from_cli(&cli).unwrap();

        assert_eq!(config.page_size, 7);
        assert_eq!(config.catch_difficulty, 10);
        assert_eq!(config.cache_interval, Duration::from_secs(60));
    }
}
