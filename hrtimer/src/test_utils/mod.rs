use crate::errors::CallbackError;
use crate::invoke::Callable;
use std::time::{Duration, Instant};

// Exports
mod spy;
pub(crate) use spy::{Call, SpyCallback};

pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::TRACE)
        .try_init();
}

pub(crate) fn failing_callable(msg: &'static str) -> Callable {
    Callable::new(move |_, _| Err(CallbackError::failed(msg)))
}

pub(crate) fn panicking_callable() -> Callable {
    Callable::new(|_, _| panic!("callback exploded"))
}

/// Spins until `cond` holds or `timeout` passes. Returns the final value of
/// `cond`.
pub(crate) fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;

    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_micros(100));
    }

    cond()
}
