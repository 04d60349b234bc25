//! Operator interrupt tests
//!
//! These tests run the real `archstrap` binary and verify that SIGINT ends
//! either phase with status 1 while it waits at a prompt, before any command
//! has been issued.

use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::{Duration, Instant};

use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;

const TIMEOUT: Duration = Duration::from_secs(10);

/// Helper: Forward everything the child prints on stdout to a channel
fn forward_stdout(child: &mut Child) -> Receiver<Vec<u8>> {
    let mut stdout = child.stdout.take().expect("stdout should be piped");
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let mut buf = [0u8; 512];
        loop {
            match stdout.read(&mut buf) {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    if tx.send(buf[..n].to_vec()).is_err() {
                        break;
                    }
                }
            }
        }
    });

    rx
}

/// Helper: Collect output until `marker` has been printed
fn wait_for_output(rx: &Receiver<Vec<u8>>, output: &mut Vec<u8>, marker: &str) {
    let deadline = Instant::now() + TIMEOUT;
    while !String::from_utf8_lossy(output).contains(marker) {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match rx.recv_timeout(remaining) {
            Ok(chunk) => output.extend(chunk),
            Err(_) => panic!(
                "{:?} never appeared; output so far: {}",
                marker,
                String::from_utf8_lossy(output)
            ),
        }
    }
}

/// Helper: Wait for the child to exit, killing it on timeout
fn wait_with_timeout(child: &mut Child) -> ExitStatus {
    let deadline = Instant::now() + TIMEOUT;
    while Instant::now() < deadline {
        if let Some(status) = child.try_wait().expect("try_wait should succeed") {
            return status;
        }
        thread::sleep(Duration::from_millis(20));
    }
    let _ = child.kill();
    panic!("installer did not exit after SIGINT");
}

/// Start a phase, wait for `prompt`, send SIGINT and return the exit status
/// with everything printed on stdout.
fn interrupt_at_prompt(phase: &str, prompt: &str) -> (ExitStatus, String) {
    let mut child = Command::new(env!("CARGO_BIN_EXE_archstrap"))
        .args(["--skip-preflight", phase])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("Failed to spawn archstrap");

    // Held open so the prompt blocks instead of seeing end of input
    let _stdin = child.stdin.take();
    let rx = forward_stdout(&mut child);

    let mut output = Vec::new();
    wait_for_output(&rx, &mut output, prompt);

    kill(Pid::from_raw(child.id() as i32), Signal::SIGINT).expect("SIGINT should be delivered");
    let status = wait_with_timeout(&mut child);

    // The channel disconnects once the child's stdout closes
    while let Ok(chunk) = rx.recv_timeout(TIMEOUT) {
        output.extend(chunk);
    }

    (status, String::from_utf8_lossy(&output).into_owned())
}

#[test]
fn test_sigint_at_confirmation_exits_with_status_1() {
    let (status, output) = interrupt_at_prompt("bootstrap", "Confirm installation?");

    assert_eq!(status.code(), Some(1), "output: {}", output);
    assert!(output.contains("Installation interrupted."), "output: {}", output);
    assert!(!output.contains("Stopping Reflector"));
}

#[test]
fn test_sigint_at_hostname_prompt_exits_with_status_1() {
    let (status, output) = interrupt_at_prompt("configure", "hostname of this computer");

    assert_eq!(status.code(), Some(1), "output: {}", output);
    assert!(output.contains("Installation interrupted."), "output: {}", output);
    assert!(!output.contains("Creating admin user"));
}
