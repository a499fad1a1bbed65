use std::future::Future;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

/// Owner of a background polling task. Results arrive through
/// [`next`](Self::next); the task ends on [`stop`](Self::stop) or when the
/// handle is dropped.
pub struct PollHandle<T> {
    rx: mpsc::Receiver<T>,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

/// Runs `fetch` every `interval`, the first time immediately. A fetch or a
/// delivery still pending at shutdown is cancelled.
pub fn spawn_poller<T, F, Fut>(interval: Duration, mut fetch: F) -> PollHandle<T>
where
    T: Send + 'static,
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = T> + Send,
{
    let (tx, rx) = mpsc::channel(1);
    let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        let mut ticker = time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown_rx => break,
                _ = ticker.tick() => {}
            }
            let value = tokio::select! {
                biased;
                _ = &mut shutdown_rx => break,
                value = fetch() => value,
            };
            let sent = tokio::select! {
                biased;
                _ = &mut shutdown_rx => break,
                sent = tx.send(value) => sent,
            };
            if sent.is_err() {
                break;
            }
        }
        tracing::debug!("poller stopped");
    });

    PollHandle {
        rx,
        shutdown: Some(shutdown_tx),
        task: Some(task),
    }
}

impl<T> PollHandle<T> {
    /// Waits for the next result; `None` once the task has ended.
    pub async fn next(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// Signals the task and waits for it to finish.
    pub async fn stop(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                tracing::warn!("poller task ended abnormally: {}", err);
            }
        }
    }
}

impl<T> Drop for PollHandle<T> {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    fn counting(calls: &Arc<AtomicUsize>) -> impl FnMut() -> std::future::Ready<usize> {
        let calls = Arc::clone(calls);
        move || std::future::ready(calls.fetch_add(1, Ordering::SeqCst) + 1)
    }

    #[tokio::test]
    async fn delivers_each_tick_in_order() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut handle = spawn_poller(Duration::from_millis(5), counting(&calls));

        assert_eq!(handle.next().await, Some(1));
        assert_eq!(handle.next().await, Some(2));
        assert_eq!(handle.next().await, Some(3));
        handle.stop().await;
    }

    #[tokio::test]
    async fn no_fetches_after_stop() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut handle = spawn_poller(Duration::from_millis(5), counting(&calls));
        handle.next().await;
        handle.stop().await;

        let seen = calls.load(Ordering::SeqCst);
        time::sleep(Duration::from_millis(40)).await;
        assert_eq!(calls.load(Ordering::SeqCst), seen);
    }

    #[tokio::test]
    async fn dropping_the_handle_ends_the_task() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut handle = spawn_poller(Duration::from_millis(5), counting(&calls));
        handle.next().await;
        drop(handle);

        time::sleep(Duration::from_millis(10)).await;
        let seen = calls.load(Ordering::SeqCst);
        time::sleep(Duration::from_millis(40)).await;
        assert_eq!(calls.load(Ordering::SeqCst), seen);
    }
}
