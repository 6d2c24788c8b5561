/*
[INPUT]:  Binary invocations with flags, config files and piped stdin
[OUTPUT]: Exit status and stream separation checks
[POS]:    Integration test layer - process boundary
[UPDATE]: When changing CLI flags or startup validation
*/

use std::io::Write;
use std::process::{Command, Output, Stdio};

const BTC_SUBSCRIPTION: &str = r#"{"jsonrpc":"2.0","id":1,"method":"public/subscribe","params":{"channels":["book.BTC-PERPETUAL.100ms"]}}"#;

fn binary() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_deribit-book-stream"));
    command.arg("--log-level").arg("error");
    command
}

fn run_with_stdin(mut command: Command, stdin: &[u8]) -> Output {
    let mut child = command
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to start deribit-book-stream binary");
    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(stdin)
        .expect("write stdin");
    child.wait_with_output().expect("wait for binary")
}

#[test]
fn dry_run_prints_subscription_on_stdout() {
    let output = binary()
        .args(["--instrument", "BTC-PERPETUAL", "--dry-run"])
        .output()
        .expect("Failed to start deribit-book-stream binary");

    assert!(
        output.status.success(),
        "Process exited with non-zero status: {}\nStderr: {}",
        output.status,
        String::from_utf8_lossy(&output.stderr)
    );
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), BTC_SUBSCRIPTION);
}

#[test]
fn dry_run_reads_instrument_from_piped_stdin() {
    let mut command = binary();
    command.arg("--dry-run");
    let output = run_with_stdin(command, b"  BTC-PERPETUAL  \n");

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), BTC_SUBSCRIPTION);
}

#[test]
fn empty_stdin_is_fatal() {
    let mut command = binary();
    command.arg("--dry-run");
    let output = run_with_stdin(command, b"\n");

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Instrument name cannot be empty"), "{stderr}");
}

#[test]
fn blank_instrument_flag_is_fatal() {
    let output = binary()
        .args(["--instrument", "   ", "--dry-run"])
        .output()
        .expect("Failed to start deribit-book-stream binary");

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Instrument name cannot be empty"));
}

#[test]
fn config_file_supplies_instrument() {
    let config_path = format!("{}/examples/testnet.yaml", env!("CARGO_MANIFEST_DIR"));
    let output = binary()
        .args(["--config", &config_path, "--dry-run"])
        .output()
        .expect("Failed to start deribit-book-stream binary");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("book.ETH-PERPETUAL.100ms"), "{stdout}");
}

#[test]
fn invalid_port_is_fatal() {
    let output = binary()
        .args(["--instrument", "BTC-PERPETUAL", "--port", "0", "--dry-run"])
        .output()
        .expect("Failed to start deribit-book-stream binary");

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("port must be non-zero"));
}

#[test]
fn missing_config_file_is_fatal() {
    let output = binary()
        .args(["--config", "/nonexistent/deribit-book.yaml", "--dry-run"])
        .output()
        .expect("Failed to start deribit-book-stream binary");

    assert!(!output.status.success());
}
