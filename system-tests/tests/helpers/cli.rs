// system-tests/tests/helpers/cli.rs
// ============================================================================
// Module: CLI Helpers
// Description: Shared helpers for locating and invoking the table-probe CLI.
// Purpose: Provide consistent CLI binary resolution across system-test suites.
// Dependencies: std::process, std::path
// ============================================================================

//! Helpers for invoking the table-probe CLI in system-tests.

use std::path::Path;
use std::path::PathBuf;
use std::process::Command;
use std::process::Output;
use std::sync::OnceLock;

use system_tests::config::SystemTestEnv;

/// Binary name produced by the `table-probe-cli` package.
const BINARY_NAME: &str = "table-probe";

/// Locates the table-probe CLI binary, building it if necessary.
pub fn cli_binary() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("CARGO_BIN_EXE_table-probe") {
        let candidate = PathBuf::from(path);
        if candidate.exists() {
            return Some(candidate);
        }
    }
    build_cli_binary().map_or_else(|_| resolve_cli_from_current_exe(), Some)
}

/// Runs the CLI with arguments inside `dir` and returns the process output.
///
/// `TABLE_PROBE_CONFIG` and the system-test variables are cleared so the
/// child only sees the config it is given.
pub fn run_cli(binary: &Path, dir: &Path, args: &[&str]) -> Result<Output, String> {
    Command::new(binary)
        .args(args)
        .current_dir(dir)
        .env_remove("TABLE_PROBE_CONFIG")
        .env_remove(SystemTestEnv::TargetUrl.as_str())
        .output()
        .map_err(|err| format!("run {BINARY_NAME} failed: {err}"))
}

/// Returns stdout as lossy UTF-8.
pub fn stdout_text(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// Returns stderr as lossy UTF-8.
pub fn stderr_text(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn resolve_cli_from_current_exe() -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    let profile_dir = exe.parent()?.parent()?;
    let candidate = profile_dir.join(format!("{BINARY_NAME}{}", exe_suffix()));
    if candidate.exists() { Some(candidate) } else { None }
}

fn target_dir_from_current_exe() -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    let profile_dir = exe.parent()?.parent()?;
    profile_dir.parent().map(PathBuf::from)
}

fn build_cli_binary() -> Result<PathBuf, String> {
    static BUILD_RESULT: OnceLock<Result<PathBuf, String>> = OnceLock::new();
    let result = BUILD_RESULT.get_or_init(|| {
        let Some(target_dir) = target_dir_from_current_exe() else {
            return Err("unable to resolve target dir from current exe".to_string());
        };
        let output = Command::new("cargo")
            .args(["build", "-p", "table-probe-cli", "--bin", BINARY_NAME, "--target-dir"])
            .arg(&target_dir)
            .output()
            .map_err(|err| format!("spawn cargo build failed: {err}"))?;
        if !output.status.success() {
            return Err(format!(
                "cargo build table-probe-cli failed: {}",
                String::from_utf8_lossy(&output.stderr)
            ));
        }
        resolve_cli_from_target_dir(&target_dir)
            .ok_or_else(|| format!("{BINARY_NAME} binary not found after build"))
    });
    result.clone()
}

fn resolve_cli_from_target_dir(target_dir: &Path) -> Option<PathBuf> {
    let profile_dir = target_dir.join("debug");
    let candidate = profile_dir.join(format!("{BINARY_NAME}{}", exe_suffix()));
    if candidate.exists() { Some(candidate) } else { None }
}

const fn exe_suffix() -> &'static str {
    if cfg!(windows) { ".exe" } else { "" }
}
