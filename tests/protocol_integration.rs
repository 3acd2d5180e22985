//! Protocol integration tests.
//!
//! A scripted console task plays the remote device on the far side of an
//! in-memory duplex pipe.

use std::time::Duration;

use tokio::io::{duplex, AsyncReadExt, AsyncWriteExt, DuplexStream};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use serial_exec::{
    Command, CommandRunner, Executor, ExecutorOptions, SerialExecError, SessionInitializer,
    ShellStream,
};

/// Reply the console sends once it has received a given input.
struct Step {
    after: &'static [u8],
    reply: &'static [u8],
}

/// Spawn a console that greets with `banner` and answers each step in order.
///
/// Returns everything it received once the local side closes.
fn scripted_console(
    mut remote: DuplexStream,
    banner: &'static [u8],
    steps: Vec<Step>,
) -> JoinHandle<Vec<u8>> {
    tokio::spawn(async move {
        remote.write_all(banner).await.unwrap();

        let mut received = Vec::new();
        let mut consumed = 0;
        let mut steps = steps.into_iter();
        let mut pending = steps.next();
        let mut buf = [0u8; 512];

        loop {
            let n = match remote.read(&mut buf).await {
                Ok(0) | Err(_) => break,
                Ok(n) => n,
            };
            received.extend_from_slice(&buf[..n]);

            while let Some(step) = pending.as_ref() {
                let window = &received[consumed..];
                let Some(pos) = find(window, step.after) else {
                    break;
                };
                consumed += pos + step.after.len();
                if remote.write_all(step.reply).await.is_err() {
                    return received;
                }
                pending = steps.next();
            }
        }
        received
    })
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

const LOGIN_BANNER: &[u8] = b"\r\nDebian GNU/Linux 12 box ttyS0\r\n\r\nbox login: ";
const ROOT_PROMPT: &[u8] = b"\x1b[?2004h\x1b[01;32mroot@box\x1b[00m:~# ";

fn fast_options() -> ExecutorOptions {
    ExecutorOptions {
        init_interval: Duration::from_millis(100),
        ..ExecutorOptions::default()
    }
}

#[tokio::test(start_paused = true)]
async fn test_login_then_root_prompt() {
    let (local, remote) = duplex(8192);
    let console = scripted_console(
        remote,
        LOGIN_BANNER,
        vec![Step {
            after: b"root\r",
            reply: ROOT_PROMPT,
        }],
    );

    let mut stream = ShellStream::new(local);
    let start = Instant::now();
    SessionInitializer::new().ready(&mut stream).await.unwrap();
    assert!(start.elapsed() < Duration::from_secs(10));

    stream.close().await.unwrap();
    let received = console.await.unwrap();
    assert_eq!(received, b"\rroot\r");
}

#[tokio::test(start_paused = true)]
async fn test_full_exchange_after_login() {
    let (local, remote) = duplex(8192);
    let console = scripted_console(
        remote,
        LOGIN_BANNER,
        vec![
            Step {
                after: b"root\r",
                reply: ROOT_PROMPT,
            },
            Step {
                after: b"ls -la & wait \r",
                reply: b"ls -la & wait\r\n[1] 1234\r\nfile1.txt\r\nfile2.txt\r\n[1]+  Done               ls -la & wait\r\nroot@box:~# ",
            },
        ],
    );

    let output = Executor::new(fast_options())
        .execute_on(local, &Command::new("ls -la"))
        .await
        .unwrap();
    assert_eq!(output, "file1.txt\nfile2.txt");

    let received = console.await.unwrap();
    assert_eq!(received, b"\rroot\rls -la & wait \r");
}

#[tokio::test(start_paused = true)]
async fn test_remote_failure_carries_output() {
    let (local, remote) = duplex(8192);
    let _console = scripted_console(
        remote,
        b"root@box:~# ",
        vec![Step {
            after: b"catg /etc/hostname & wait \r",
            reply: b"catg /etc/hostname & wait\r\n[1] 77\r\n-bash: catg: command not found\r\n[1]+  Done(127)               catg /etc/hostname\r\n",
        }],
    );

    let err = Executor::new(fast_options())
        .execute_on(local, &Command::new("catg /etc/hostname"))
        .await
        .unwrap_err();

    match err {
        SerialExecError::RemoteCommandFailed { output, exit_code } => {
            assert_eq!(output, "-bash: catg: command not found");
            assert_eq!(exit_code, Some(127));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_timeout_sends_kill_before_close() {
    let (local, remote) = duplex(8192);
    let console = scripted_console(
        remote,
        b"root@box:~# ",
        vec![Step {
            after: b"sleep 5 & wait \r",
            reply: b"sleep 5 & wait\r\n[1] 5678\r\n",
        }],
    );

    let command = Command::new("sleep 5").timeout(Duration::from_secs(2));
    let err = Executor::new(fast_options())
        .execute_on(local, &command)
        .await
        .unwrap_err();
    assert!(matches!(err, SerialExecError::CommandTimeout { .. }));
    assert_eq!(err.output(), Some("sleep 5 & wait\n[1] 5678"));

    let received = String::from_utf8(console.await.unwrap()).unwrap();
    assert!(received.ends_with("sleep 5 & wait \rkill -9 5678\r\r"));
}

#[tokio::test(start_paused = true)]
async fn test_marker_on_output_line() {
    let (local, remote) = duplex(8192);
    let _console = scripted_console(
        remote,
        b"root@box:~# ",
        vec![Step {
            after: b"printf hi & wait \r",
            reply: b"printf hi & wait\r\n[1] 50\r\nhi[1]+  Done                    printf hi\r\n",
        }],
    );

    let output = Executor::new(fast_options())
        .execute_on(local, &Command::new("printf hi"))
        .await
        .unwrap();
    assert_eq!(output, "hi");
}

#[tokio::test(start_paused = true)]
async fn test_unreachable_console_fails_init() {
    let (local, _remote) = duplex(8192);

    let start = Instant::now();
    let err = Executor::default()
        .execute_on(local, &Command::new("uptime"))
        .await
        .unwrap_err();

    assert!(matches!(err, SerialExecError::InitTimeout { attempts: 10 }));
    assert!(start.elapsed() >= Duration::from_secs(10));
}

#[tokio::test(start_paused = true)]
async fn test_reused_session() {
    let (local, remote) = duplex(8192);
    let console = scripted_console(
        remote,
        b"root@box:~# ",
        vec![
            Step {
                after: b"hostname & wait \r",
                reply: b"hostname & wait\r\n[1] 3\r\nbox\r\n[1]+  Done                    hostname\r\n",
            },
            Step {
                after: b"\r",
                reply: b"root@box:~# ",
            },
            Step {
                after: b"whoami & wait \r",
                reply: b"whoami & wait\r\n[1] 4\r\nroot\r\n[1]+  Done                    whoami\r\n",
            },
        ],
    );

    let mut stream = ShellStream::new(local);
    let initializer = SessionInitializer::new().interval(Duration::from_millis(100));
    let runner = CommandRunner::new();

    initializer.ready(&mut stream).await.unwrap();
    assert_eq!(runner.run_in_session(&mut stream, "hostname").await.unwrap(), "box");

    initializer.ready(&mut stream).await.unwrap();
    assert_eq!(runner.run(stream, "whoami").await.unwrap(), "root");

    let received = console.await.unwrap();
    assert!(received.ends_with(b"whoami & wait \r"));
}
