//! Live named-pipe round-trips between client and server endpoints.
//!
//! Each test builds its pipes inside a tempdir owned by the test user,
//! runs the server (or a stand-in for the in-container supervisor) on a
//! helper thread, and drives the client from the test thread.

#![cfg(target_os = "linux")]
#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use quickbox_common::error::QbError;
use quickbox_transport::{collect, CommandPipe, StatusFiles, FRAME_SENTINEL};

fn owned_by_me(path: &Path, prefix: &Path) -> CommandPipe {
    CommandPipe::for_user(
        path,
        prefix,
        nix::unistd::getuid().as_raw(),
        nix::unistd::getgid().as_raw(),
    )
}

fn spawn_server(path: PathBuf) -> thread::JoinHandle<quickbox_common::error::Result<()>> {
    thread::spawn(move || CommandPipe::new(&path).run_server())
}

/// Lets the server finish one read window before the next frame opens
/// the pipe again.
fn settle() {
    thread::sleep(Duration::from_millis(50));
}

#[test]
fn alive_then_exit_stops_the_server() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("cmd");
    let pipe = owned_by_me(&path, dir.path());
    pipe.create().expect("create fifo");

    let server = spawn_server(path);
    pipe.wait_until_alive().expect("alive frame");
    settle();
    pipe.request_shutdown().expect("exit frame");

    server.join().expect("join").expect("server exits cleanly");
    // A liveness probe allocates no status artifacts.
    assert!(!dir.path().join("tmp").exists());
}

#[test]
fn restart_keeps_the_server_serving() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("cmd");
    let pipe = owned_by_me(&path, dir.path());
    pipe.create().expect("create fifo");

    let server = spawn_server(path);
    pipe.request_restart().expect("restart frame");
    settle();
    pipe.wait_until_alive().expect("alive after restart");
    settle();
    pipe.request_shutdown().expect("exit frame");

    server.join().expect("join").expect("server exits cleanly");
}

#[test]
fn nonblocking_client_reports_contention() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("cmd");
    let pipe = owned_by_me(&path, dir.path());
    pipe.create().expect("create fifo");

    // Keep a read end open so writers never block on open.
    let _drain = OpenOptions::new()
        .read(true)
        .custom_flags(nix::libc::O_NONBLOCK)
        .open(&path)
        .expect("nonblocking reader");

    // A competing client already holds the frame lock.
    let holder = OpenOptions::new()
        .write(true)
        .open(&path)
        .expect("holder open");
    nix::fcntl::flock(
        holder.as_raw_fd(),
        nix::fcntl::FlockArg::LockExclusiveNonblock,
    )
    .expect("holder lock");

    let mut contender = owned_by_me(&path, dir.path());
    contender.client_nonblocking = true;
    let err = contender.wait_until_alive().unwrap_err();
    assert!(matches!(err, QbError::LockContended));
}

#[test]
fn second_server_on_the_same_pipe_is_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("cmd");
    let pipe = owned_by_me(&path, dir.path());
    pipe.create().expect("create fifo");

    let first = spawn_server(path.clone());
    // Give the first server time to take the daemon lock.
    settle();

    let second = CommandPipe::new(&path);
    let err = second.run_server().unwrap_err();
    assert!(matches!(err, QbError::LockContended));

    pipe.request_shutdown().expect("exit frame");
    first.join().expect("join").expect("first server exits");
}

#[test]
fn blocked_execute_round_trip() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::create_dir(dir.path().join("tmp")).expect("tmp dir");
    let path = dir.path().join("cmd");
    let pipe = owned_by_me(&path, dir.path());
    pipe.create().expect("create fifo");

    // Stand-in for the in-container supervisor: read one frame, then
    // report termination on the status pipe named in it.
    let frame_path = path.clone();
    let prefix = dir.path().to_path_buf();
    let supervisor = thread::spawn(move || {
        let file = File::open(&frame_path).expect("open command pipe");
        let lines: Vec<String> = BufReader::new(file)
            .lines()
            .map(|l| l.expect("line"))
            .take_while(|l| l != FRAME_SENTINEL)
            .collect();

        let mut status = None;
        let mut stdout = None;
        let mut tokens = lines.iter();
        while let Some(token) = tokens.next() {
            match token.as_str() {
                "-s" => status = tokens.next().cloned(),
                "-o" => stdout = tokens.next().cloned(),
                "-e" => drop(tokens.next()),
                _ => {}
            }
        }
        let on_host = |container: &str| prefix.join(container.trim_start_matches('/'));

        let stdout = on_host(&stdout.expect("frame names a stdout file"));
        std::fs::write(stdout, b"hello\n").expect("write stdout capture");

        let status = on_host(&status.expect("frame names a status pipe"));
        let mut status = OpenOptions::new()
            .write(true)
            .open(status)
            .expect("open status pipe");
        status
            .write_all(b"pid 4321\nexit 0\n")
            .expect("write status records");
    });

    let args = vec!["/bin/echo".to_string(), "hello".to_string()];
    let result = pipe.execute_blocking(&args).expect("blocked execute");
    supervisor.join().expect("join supervisor");

    assert_eq!(result.stdout, b"hello\n");
    assert_eq!(result.stderr, b"");
    assert!(result.signal_codes.is_empty());
    assert_eq!(result.exit_code, 0);
    assert_eq!(result.pid, 4321);

    // The status round-trip removes its temporary directory.
    let leftovers: Vec<_> = std::fs::read_dir(dir.path().join("tmp"))
        .expect("read tmp")
        .collect();
    assert!(leftovers.is_empty());
}

#[test]
fn client_refuses_a_regular_file_at_the_pipe_path() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("cmd");
    std::fs::write(&path, b"not a pipe").expect("write");

    let pipe = owned_by_me(&path, dir.path());
    let err = pipe.wait_until_alive().unwrap_err();
    assert!(matches!(err, QbError::NotAFifo { .. }));
}

#[test]
fn server_refuses_a_regular_file_at_the_pipe_path() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("cmd");
    std::fs::write(&path, b"not a pipe").expect("write");

    let server = CommandPipe::new(&path);
    let err = server.run_server().unwrap_err();
    assert!(matches!(err, QbError::NotAFifo { .. }));
}

#[test]
fn status_collect_applies_signal_records() {
    let dir = tempfile::tempdir().expect("tempdir");
    let status = dir.path().join("status");
    nix::unistd::mkfifo(&status, nix::sys::stat::Mode::from_bits_truncate(0o660))
        .expect("mkfifo");

    let writer_path = status.clone();
    let writer = thread::spawn(move || {
        let mut file = OpenOptions::new()
            .write(true)
            .open(&writer_path)
            .expect("open status");
        file.write_all(b"stop 19\ncont 18\nkill 9\n")
            .expect("write records");
    });

    let result = collect(&StatusFiles {
        status,
        stdout: None,
        stderr: None,
    })
    .expect("collect");
    writer.join().expect("join writer");

    assert_eq!(result.signal_codes, vec![19, 18, 9]);
    assert_eq!(result.exit_code, -1);
    assert_eq!(result.pid, 0);
}

#[test]
fn status_collect_surfaces_supervisor_errors() {
    let dir = tempfile::tempdir().expect("tempdir");
    let status = dir.path().join("status");
    nix::unistd::mkfifo(&status, nix::sys::stat::Mode::from_bits_truncate(0o660))
        .expect("mkfifo");

    let writer_path = status.clone();
    let writer = thread::spawn(move || {
        let mut file = OpenOptions::new()
            .write(true)
            .open(&writer_path)
            .expect("open status");
        file.write_all(b"err\n").expect("write record");
    });

    let err = collect(&StatusFiles {
        status,
        stdout: None,
        stderr: None,
    })
    .unwrap_err();
    writer.join().expect("join writer");
    assert!(matches!(err, QbError::Status { .. }));
}
