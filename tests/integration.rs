//! Integration tests for unilist.
//!
//! These tests exercise the compiled binary directly and never touch the
//! network: `check` parses rules locally, and `generate` is only run against
//! configs with no enabled sources.

use std::path::PathBuf;
use std::process::Command;

/// Helper to get the path to the compiled binary
fn get_binary_path() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // Remove test binary name
    path.pop(); // Remove deps directory
    path.push("unilist");
    path
}

/// Run unilist command and return output
fn run_unilist(args: &[&str]) -> std::process::Output {
    let binary = get_binary_path();
    Command::new(&binary)
        .args(args)
        .output()
        .expect("Failed to execute unilist")
}

#[test]
fn test_version_command() {
    let output = run_unilist(&["version"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("unilist"));
}

#[test]
fn test_help_command() {
    let output = run_unilist(&["--help"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("generate"));
    assert!(stdout.contains("check"));
}

#[test]
fn test_check_network_rule() {
    let output = run_unilist(&["check", "||ads.example.com^$third-party"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("network"), "got: {}", stdout);
    // third-party is an alias for 3p
    assert!(stdout.contains("$3p"), "got: {}", stdout);
}

#[test]
fn test_check_cosmetic_rule() {
    let output = run_unilist(&["check", "example.com##.banner"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("cosmetic"), "got: {}", stdout);
    assert!(stdout.contains("example.com##.banner"), "got: {}", stdout);
}

#[test]
fn test_check_hosts_dialect() {
    let output = run_unilist(&[
        "check",
        "0.0.0.0 ads.example.com",
        "--dialect",
        "hosts",
    ]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("||ads.example.com^"), "got: {}", stdout);
}

#[test]
fn test_check_rejected_rule() {
    let output = run_unilist(&["check", "##[unbalanced"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("REJECTED"), "got: {}", stdout);
}

#[test]
fn test_check_invalid_dialect() {
    let output = run_unilist(&["check", "||a.example^", "--dialect", "bogus"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Unknown dialect"), "got: {}", stderr);
}

#[test]
fn test_stats_without_state() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("sources.json");
    let output = run_unilist(&["--config", config.to_str().unwrap(), "stats"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Last update: never"), "got: {}", stdout);
}

#[test]
fn test_clean_cache_without_cache() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("sources.json");
    let output = run_unilist(&["--config", config.to_str().unwrap(), "clean-cache"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Removed 0"), "got: {}", stdout);
}

#[test]
fn test_generate_with_no_enabled_sources() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("sources.json");
    std::fs::write(
        &config_path,
        r#"{
            "sources": [
                {
                    "name": "disabled-source",
                    "type": "ublock",
                    "url": "https://example.com/list.txt",
                    "enabled": false
                }
            ]
        }"#,
    )
    .unwrap();

    let output = run_unilist(&[
        "--config",
        config_path.to_str().unwrap(),
        "generate",
        "--dry-run",
    ]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("No sources enabled"), "got: {}", stdout);
}

#[test]
fn test_generate_missing_config() {
    let output = run_unilist(&["--config", "/nonexistent/sources.json", "generate"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to load config"), "got: {}", stderr);
}

#[test]
fn test_generate_rejects_http_source() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("sources.json");
    std::fs::write(
        &config_path,
        r#"{
            "sources": [
                {
                    "name": "insecure",
                    "type": "ublock",
                    "url": "http://example.com/list.txt"
                }
            ]
        }"#,
    )
    .unwrap();

    let output = run_unilist(&[
        "--config",
        config_path.to_str().unwrap(),
        "generate",
        "--dry-run",
    ]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("HTTPS"), "got: {}", stderr);
}

#[test]
fn test_invalid_command() {
    let output = run_unilist(&["nonexistent-command"]);
    assert!(!output.status.success(), "Invalid command should fail");
}

#[test]
fn test_quiet_flag_suppresses_info() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("sources.json");
    let output = run_unilist(&["--config", config.to_str().unwrap(), "-q", "clean-cache"]);
    assert!(output.status.success());
}
