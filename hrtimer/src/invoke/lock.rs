use parking_lot::{Mutex, MutexGuard};
use std::sync::{Arc, LazyLock};

static HOST_LOCK: LazyLock<ExecutionLock> = LazyLock::new(ExecutionLock::new);

/// Lock serializing entry into host code from timer threads.
///
/// Every timer shares [`ExecutionLock::global`] unless configured otherwise.
/// Host code must not hold this lock while calling `stop` or `reset`: the join
/// would wait on a worker that is itself waiting for the lock.
#[derive(Debug, Clone, Default)]
pub struct ExecutionLock(Arc<Mutex<()>>);

impl ExecutionLock {
    /// A private lock, independent from the process-wide one.
    pub fn new() -> Self {
        ExecutionLock(Arc::new(Mutex::new(())))
    }

    /// The process-wide host lock.
    pub fn global() -> Self {
        HOST_LOCK.clone()
    }

    pub fn acquire(&self) -> MutexGuard<'_, ()> {
        self.0.lock()
    }

    pub fn is_locked(&self) -> bool {
        self.0.is_locked()
    }

    pub fn ptr_eq(&self, other: &ExecutionLock) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use static_assertions::assert_impl_all;

    assert_impl_all!(ExecutionLock: Send, Sync, Clone);

    #[test]
    fn test_global_is_shared() {
        assert!(ExecutionLock::global().ptr_eq(&ExecutionLock::global()));
        assert!(!ExecutionLock::new().ptr_eq(&ExecutionLock::global()));
    }

    #[test]
    fn test_acquire_release() {
        let lock = ExecutionLock::new();
        {
            let _guard = lock.acquire();
            assert!(lock.is_locked());
        }
        assert!(!lock.is_locked());
    }
}
