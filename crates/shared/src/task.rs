use std::{
    future::Future,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use tokio::task::JoinHandle;

/// Identifies one scheduling of a [`DebouncedTask`]. Becomes stale as soon as
/// the task is rescheduled or cancelled.
#[derive(Debug, Clone)]
pub struct Generation {
    current: Arc<AtomicU64>,
    mine: u64,
}

impl Generation {
    pub fn id(&self) -> u64 {
        self.mine
    }

    pub fn is_current(&self) -> bool {
        self.current.load(Ordering::SeqCst) == self.mine
    }
}

/// Debounce with cancel-on-supersede: each `schedule` cancels the previous
/// pending (or in-flight) run before arming a new one.
#[derive(Debug, Default)]
pub struct DebouncedTask {
    generation: Arc<AtomicU64>,
    handle: Option<JoinHandle<()>>,
}

impl DebouncedTask {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule<F, Fut>(&mut self, delay: Duration, work: F) -> Generation
    where
        F: FnOnce(Generation) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let token = self.cancel();
        let task_token = token.clone();
        self.handle = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if !task_token.is_current() {
                return;
            }
            work(task_token).await;
        }));
        token
    }

    /// Aborts the pending run, if any, and invalidates every outstanding
    /// [`Generation`].
    pub fn cancel(&mut self) -> Generation {
        let mine = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
        Generation {
            current: Arc::clone(&self.generation),
            mine,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Takes the pending run out of the debouncer without cancelling it.
    pub fn take_handle(&mut self) -> Option<JoinHandle<()>> {
        self.handle.take()
    }
}

impl Drop for DebouncedTask {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn only_the_latest_schedule_runs() {
        let runs = Arc::new(Mutex::new(Vec::new()));
        let mut task = DebouncedTask::new();

        for value in 1..=3 {
            let runs = Arc::clone(&runs);
            task.schedule(Duration::from_millis(300), move |_| async move {
                runs.lock().expect("runs").push(value);
            });
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        tokio::time::sleep(Duration::from_millis(500)).await;

        assert_eq!(*runs.lock().expect("runs"), vec![3]);
        assert!(!task.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_invalidates_outstanding_generation() {
        let mut task = DebouncedTask::new();
        let token = task.schedule(Duration::from_secs(1), |_| async {});
        assert!(token.is_current());
        let next = task.cancel();
        assert!(!token.is_current());
        assert!(next.is_current());
        assert!(next.id() > token.id());
    }
}
