use crate::timer::CancelSignal;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// State shared between a `Timer` and its worker.
///
/// The worker only writes while the controller considers the timer running;
/// the controller writes only after the worker has been joined or before it
/// is spawned.
#[derive(Debug, Default)]
pub(crate) struct Shared {
    /// Microseconds.
    pub(crate) elapsed: AtomicU64,

    /// Set only when the deadline passed, never on cancellation.
    pub(crate) expired: AtomicBool,

    pub(crate) started: AtomicBool,

    pub(crate) cancel: CancelSignal,
}

impl Shared {
    #[inline(always)]
    pub(crate) fn elapsed(&self) -> u64 {
        self.elapsed.load(Ordering::Acquire)
    }

    #[inline(always)]
    pub(crate) fn expired(&self) -> bool {
        self.expired.load(Ordering::Acquire)
    }

    #[inline(always)]
    pub(crate) fn started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    /// Clears run results ahead of a new run or after a reset.
    pub(crate) fn clear_run(&self) {
        self.elapsed.store(0, Ordering::Release);
        self.expired.store(false, Ordering::Release);
    }

    /// `expired` is published last: whoever observes it also observes the
    /// final `elapsed` and `started`.
    pub(crate) fn mark_expired(&self, duration: u64) {
        self.elapsed.store(duration, Ordering::Release);
        self.started.store(false, Ordering::Release);
        self.expired.store(true, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use static_assertions::assert_impl_all;

    assert_impl_all!(Shared: Send, Sync);

    #[test]
    fn test_mark_expired_then_clear() {
        let shared = Shared::default();
        shared.started.store(true, Ordering::Release);
        shared.elapsed.store(12, Ordering::Release);

        shared.mark_expired(50);
        assert_eq!(shared.elapsed(), 50);
        assert!(shared.expired());
        assert!(!shared.started());

        shared.clear_run();
        assert_eq!(shared.elapsed(), 0);
        assert!(!shared.expired());
    }
}
