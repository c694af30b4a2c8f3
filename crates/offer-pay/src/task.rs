//! Thin wrapper for spawning controller tasks

use std::future::Future;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Spawns `future` on `handle` and drops it as soon as `cancel` fires
///
/// The handle resolves to `None` when the task was cancelled.
pub fn spawn_cancellable<F>(
    handle: &Handle,
    cancel: CancellationToken,
    future: F,
) -> JoinHandle<Option<F::Output>>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    handle.spawn(async move {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            output = future => Some(output),
        }
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_completes_when_not_cancelled() {
        let cancel = CancellationToken::new();
        let handle = spawn_cancellable(&Handle::current(), cancel, async { 42 });

        assert_eq!(handle.await.unwrap(), Some(42));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_drops_future() {
        let cancel = CancellationToken::new();
        let handle = spawn_cancellable(&Handle::current(), cancel.clone(), async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            42
        });

        cancel.cancel();

        assert_eq!(handle.await.unwrap(), None);
    }
}
