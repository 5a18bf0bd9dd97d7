// ── Listener tasks and their cancellation handles ──
//
// Every provider listener is a stream drained by its own tokio task.
// The task checks its token before each delivery, so nothing is handed
// on once the handle is cancelled; exiting drops the stream, which
// detaches the provider-side listener.

use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};

use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::trace;

/// Cancellation handle for one listener task.
///
/// Cancelling is idempotent and also happens on drop.
#[derive(Debug)]
pub struct ListenerHandle {
    token: CancellationToken,
    cancelled: AtomicBool,
    task: JoinHandle<()>,
}

impl ListenerHandle {
    /// Stop deliveries. Returns `true` only for the call that actually
    /// cancelled; later calls are no-ops.
    pub fn cancel(&self) -> bool {
        if self.cancelled.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.token.cancel();
        true
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Whether the task has exited (cancelled, or the stream ended).
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// A token that fires when this handle is cancelled.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Drain `stream` on a new task, passing each item to `deliver` until
/// the handle is cancelled, the stream ends, or `deliver` breaks.
pub fn spawn_listener<T, F>(
    name: &'static str,
    mut stream: BoxStream<'static, T>,
    mut deliver: F,
) -> ListenerHandle
where
    T: Send + 'static,
    F: FnMut(T) -> ControlFlow<()> + Send + 'static,
{
    let token = CancellationToken::new();
    let task_token = token.clone();

    let task = tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                () = task_token.cancelled() => break,
                item = stream.next() => {
                    let Some(item) = item else {
                        trace!(listener = name, "stream ended");
                        break;
                    };
                    if task_token.is_cancelled() {
                        break;
                    }
                    if deliver(item).is_break() {
                        break;
                    }
                }
            }
        }
        trace!(listener = name, "listener task exiting");
    });

    ListenerHandle {
        token,
        cancelled: AtomicBool::new(false),
        task,
    }
}
