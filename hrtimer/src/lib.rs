//! One-shot timers with microsecond resolution.
//!
//! Every running [`Timer`] owns a dedicated thread that samples a
//! high-resolution clock in a tight loop and invokes the stored callback once
//! the deadline passes, unless the timer is stopped first.

pub mod clock;
#[cfg(unix)]
pub use clock::MonotonicClock;
pub use clock::{Clock, PlatformClock, ReferencePoint, SyncedClock};

mod errors;
pub use errors::{CallbackError, TimerError};

pub mod invoke;
pub use invoke::{Callable, ExecutionLock, Kwargs, Value};

pub mod timer;
pub use timer::{Builder, PollStrategy, Timer, TimerSnapshot, live_workers};

mod utils;

#[cfg(test)]
mod test_utils;

/// Crate version, exposed for host bindings.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
