use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::Thread;

/// Cancellation signal owned by a single timer. Only that timer's worker ever
/// observes it, so stopping one timer cannot interfere with another.
#[derive(Debug, Default)]
pub(crate) struct CancelSignal {
    cancelled: AtomicBool,

    /// Thread to unpark when cancelling, so a worker parked between samples
    /// notices right away instead of after its park timeout.
    worker: Mutex<Option<Thread>>,
}

impl CancelSignal {
    pub(crate) fn clear(&self) {
        self.cancelled.store(false, Ordering::Release);
    }

    pub(crate) fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);

        if let Some(thread) = self.worker.lock().as_ref() {
            thread.unpark();
        }
    }

    #[inline(always)]
    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    pub(crate) fn register_worker(&self, thread: Thread) {
        self.worker.lock().replace(thread);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::{Duration, Instant};

    #[test]
    fn test_cancel_and_clear() {
        let signal = CancelSignal::default();
        assert!(!signal.is_cancelled());

        signal.cancel();
        assert!(signal.is_cancelled());

        signal.clear();
        assert!(!signal.is_cancelled());
    }

    #[test]
    fn test_cancel_unparks_registered_worker() -> anyhow::Result<()> {
        let signal = Arc::new(CancelSignal::default());

        let handle = {
            let signal = signal.clone();
            thread::Builder::new().spawn(move || {
                let start = Instant::now();
                while !signal.is_cancelled() {
                    thread::park_timeout(Duration::from_secs(30));
                }
                start.elapsed()
            })?
        };
        signal.register_worker(handle.thread().clone());

        thread::sleep(Duration::from_millis(10));
        signal.cancel();

        let waited = handle
            .join()
            .map_err(|_| anyhow::anyhow!("worker panicked"))?;
        assert!(waited < Duration::from_secs(5));
        Ok(())
    }
}
