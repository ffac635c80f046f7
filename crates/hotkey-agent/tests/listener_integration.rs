//! Integration tests for the agent's accept/read/dispatch loop.
//!
//! Connections are scripted with `tokio_test::io::Builder` and handed to the
//! listener through `MockAcceptor`; executors are `MockExecutor` recorders.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use hotkey_agent::application::dispatch::{
    AppLauncher, CommandDispatcher, KeystrokeInjector, Notifier,
};
use hotkey_agent::infrastructure::executors::mock::MockExecutor;
use hotkey_agent::infrastructure::listener::mock::{MockAccept, MockAcceptor, MockAcceptorHandle};
use hotkey_agent::infrastructure::listener::{CommandListener, ListenerConfig};
use tokio::task::JoinHandle;
use tokio_test::io::Builder;
use tokio_util::sync::CancellationToken;

// ── Helpers ───────────────────────────────────────────────────────────────────

fn connection(lines: &[&[u8]]) -> MockAccept {
    let mut builder = Builder::new();
    for line in lines {
        builder.read(line);
    }
    MockAccept::Connect(Box::new(builder.build()))
}

fn start(executor: &Arc<MockExecutor>) -> (MockAcceptorHandle, CancellationToken, JoinHandle<()>) {
    let (acceptor, handle) = MockAcceptor::new();
    let dispatcher = Arc::new(CommandDispatcher::new(
        Arc::clone(executor) as Arc<dyn AppLauncher>,
        Arc::clone(executor) as Arc<dyn KeystrokeInjector>,
        Arc::clone(executor) as Arc<dyn Notifier>,
    ));
    let cancel = CancellationToken::new();
    let listener = CommandListener::new(acceptor, dispatcher, ListenerConfig::default());
    let task = tokio::spawn(listener.run(cancel.clone()));
    (handle, cancel, task)
}

/// Upper bound for the polling helpers.  Well above the 5 s retry delay so
/// paused-clock tests can step through a backoff.
const WAIT_BUDGET: Duration = Duration::from_secs(30);

/// Polls `done` every 10 ms until it holds or `WAIT_BUDGET` runs out.
async fn poll_until(mut done: impl FnMut() -> bool) -> bool {
    tokio::time::timeout(WAIT_BUDGET, async {
        while !done() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .is_ok()
}

/// Polls until the executor has recorded `n` calls.
async fn wait_for_calls(executor: &MockExecutor, n: usize) {
    let reached = poll_until(|| executor.calls().len() >= n).await;
    assert!(reached, "expected {n} calls, got {:?}", executor.calls());
}

/// Polls until the acceptor has been called `n` times.
async fn wait_for_accepts(handle: &MockAcceptorHandle, n: usize) {
    let reached = poll_until(|| handle.accepts().len() >= n).await;
    assert!(reached, "expected {n} accepts, got {}", handle.accepts().len());
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_unknown_verb_is_skipped_and_next_line_runs() {
    // Arrange
    let executor = Arc::new(MockExecutor::new());
    let (handle, cancel, task) = start(&executor);

    // Act
    handle.push(connection(&[b"reboot::now\n", b"show_icon::gear::dark\n"]));
    wait_for_calls(&executor, 1).await;

    // Assert
    assert_eq!(executor.calls(), vec!["show_icon:gear:dark"]);
    cancel.cancel();
    task.await.unwrap();
}

#[tokio::test]
async fn test_lines_split_across_reads_are_reassembled() {
    let executor = Arc::new(MockExecutor::new());
    let (handle, cancel, task) = start(&executor);

    handle.push(connection(&[b"launch::note", b"pad\nsendkeys::", b"alt::f4\n"]));
    wait_for_calls(&executor, 2).await;

    assert_eq!(executor.calls(), vec!["launch:notepad", "sendkeys:alt+f4"]);
    cancel.cancel();
    task.await.unwrap();
}

#[tokio::test]
async fn test_failing_executor_does_not_end_session() {
    // Arrange
    let executor = Arc::new(MockExecutor::failing());
    let (handle, cancel, task) = start(&executor);

    // Act
    handle.push(connection(&[
        b"launch::missing\n",
        b"sendkeys::control::t\n",
        b"show_icon::gear::light\n",
    ]));
    wait_for_calls(&executor, 3).await;

    // Assert: all three lines reached an executor.
    assert_eq!(
        executor.calls(),
        vec!["launch:missing", "sendkeys:control+t", "show_icon:gear:light"]
    );
    cancel.cancel();
    task.await.unwrap();
}

#[tokio::test]
async fn test_panicking_executor_does_not_end_session() {
    let executor = Arc::new(MockExecutor::panicking());
    let (handle, cancel, task) = start(&executor);

    handle.push(connection(&[b"launch::a\n", b"launch::b\n"]));
    wait_for_calls(&executor, 2).await;

    assert_eq!(executor.calls(), vec!["launch:a", "launch:b"]);
    cancel.cancel();
    task.await.unwrap();
}

#[tokio::test]
async fn test_listener_accepts_again_after_peer_closes() {
    // Arrange
    let executor = Arc::new(MockExecutor::new());
    let (handle, cancel, task) = start(&executor);

    // Act: two consecutive sessions.
    handle.push(connection(&[b"launch::first\n"]));
    handle.push(connection(&[b"launch::second\n"]));
    wait_for_calls(&executor, 2).await;

    // Assert
    assert_eq!(executor.calls(), vec!["launch:first", "launch:second"]);
    wait_for_accepts(&handle, 3).await;
    cancel.cancel();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_read_error_waits_five_seconds_before_accepting() {
    // Arrange
    let executor = Arc::new(MockExecutor::new());
    let (handle, cancel, task) = start(&executor);
    let broken = Builder::new()
        .read(b"launch::calc\n")
        .read_error(io::Error::new(io::ErrorKind::BrokenPipe, "pipe broken"))
        .build();
    handle.push(MockAccept::Connect(Box::new(broken)));

    // Act
    wait_for_calls(&executor, 1).await;
    wait_for_accepts(&handle, 2).await;

    // Assert
    let accepts = handle.accepts();
    assert!(accepts[1] - accepts[0] >= Duration::from_secs(5));
    cancel.cancel();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_accept_failure_waits_but_rejected_peer_does_not() {
    // Arrange
    let executor = Arc::new(MockExecutor::new());
    let (handle, cancel, task) = start(&executor);
    handle.push(MockAccept::Fail);
    handle.push(MockAccept::Reject);

    // Act
    wait_for_accepts(&handle, 3).await;

    // Assert
    let accepts = handle.accepts();
    assert!(accepts[1] - accepts[0] >= Duration::from_secs(5));
    assert!(accepts[2] - accepts[1] < Duration::from_secs(1));
    cancel.cancel();
    task.await.unwrap();
}

#[tokio::test]
async fn test_cancel_stops_listener_mid_accept() {
    let executor = Arc::new(MockExecutor::new());
    let (handle, cancel, task) = start(&executor);
    wait_for_accepts(&handle, 1).await;

    cancel.cancel();

    tokio::time::timeout(Duration::from_secs(1), task)
        .await
        .expect("listener did not stop")
        .unwrap();
}
