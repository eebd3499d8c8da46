//! Running `dok` with a stdout nobody reads anymore.
#![cfg(unix)]
use std::process::{Command, Stdio};

#[test]
fn exit_cleanly_when_stdout_reader_is_gone() {
    let (reader, writer) = std::io::pipe().unwrap();
    drop(reader);
    let child = Command::new(env!("CARGO_BIN_EXE_dok"))
        .arg("--help")
        .env("DOK_CONFIG", "/nonexistent/dok/config.toml")
        .stdin(Stdio::null())
        .stdout(writer)
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    let output = child.wait_with_output().unwrap();
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!stderr.contains("panicked"), "stderr: {}", stderr);
    assert_eq!(output.status.code(), Some(0));
}
