//! Quiet-period timer for search-as-you-type

use std::future::Future;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Runs a job once no newer job has been scheduled for `delay`.
///
/// Scheduling aborts the previously pending job, so only the latest one fires.
pub struct Debouncer {
    delay: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Mutex::new(None),
        }
    }

    pub async fn schedule<F>(&self, job: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut pending = self.pending.lock().await;
        if let Some(handle) = pending.take() {
            handle.abort();
        }

        // deadline is fixed now, not when the task is first polled
        let quiet = tokio::time::sleep(self.delay);
        *pending = Some(tokio::spawn(async move {
            quiet.await;
            job.await;
        }));
    }

    /// Drop the pending job, if any
    pub async fn cancel(&self) {
        if let Some(handle) = self.pending.lock().await.take() {
            handle.abort();
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.get_mut().take() {
            handle.abort();
        }
    }
}
