use crate::errors::TimerError;
use crate::invoke::{Callable, Kwargs, Value};
use crate::timer::Shared;
use crate::timer::builder::{Builder, TimerConfig};
use crate::timer::worker::Worker;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::thread;
use std::time::Duration;

/// A one-shot timer that invokes its callback from a dedicated thread once
/// `duration` microseconds have elapsed since [`Timer::start`].
///
/// All operations take `&self` and are serialized internally, so a `Timer` can
/// be shared between threads. Dropping a running timer cancels and joins its
/// worker.
pub struct Timer {
    cfg: TimerConfig,

    shared: Arc<Shared>,

    /// Present while running, or after a natural expiry until the next
    /// `start`/`stop`/`reset` cleans it up. The mutex also serializes every
    /// state transition.
    worker: Mutex<Option<WorkerHandle>>,
}

#[derive(Debug)]
struct WorkerHandle {
    name: String,
    handle: thread::JoinHandle<()>,
}

impl WorkerHandle {
    fn join(self) -> Result<(), TimerError> {
        let WorkerHandle { name, handle } = self;
        handle.join().map_err(|_| TimerError::Join { thread: name })
    }
}

/// Point-in-time copy of a timer's observable attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerSnapshot {
    pub duration: u64,
    pub elapsed: u64,
    pub expired: bool,
    pub running: bool,
}

impl Timer {
    pub fn new(duration_us: u64, callable: Callable) -> Timer {
        Builder::new(duration_us, callable).build()
    }

    pub fn builder(duration_us: u64, callable: Callable) -> Builder {
        Builder::new(duration_us, callable)
    }

    /// Fails with [`TimerError::DurationOverflow`] if `duration` does not fit
    /// a `u64` microsecond count.
    pub fn with_duration(duration: Duration, callable: Callable) -> Result<Timer, TimerError> {
        Ok(Builder::from_duration(duration, callable)?.build())
    }

    /// Builds a timer from host call arguments: `(duration, callback, *args)`
    /// plus keyword arguments. Everything after the callback, and every
    /// keyword argument, is forwarded verbatim to the callback.
    pub fn from_host_args(args: Vec<Value>, kwargs: Kwargs) -> Result<Timer, TimerError> {
        let got = args.len();
        let mut args = args.into_iter();

        let (Some(duration), Some(callback)) = (args.next(), args.next()) else {
            return Err(TimerError::MissingArguments { got });
        };

        let duration = duration.as_int().ok_or(TimerError::InvalidDuration)?;
        let duration =
            u64::try_from(duration).map_err(|_| TimerError::DurationOverflow(duration))?;

        let callable = match callback {
            Value::Callable(callable) => callable,
            _ => return Err(TimerError::NotCallable),
        };

        Ok(Builder::new(duration, callable).args(args).kwargs(kwargs).build())
    }

    pub(crate) fn from_config(cfg: TimerConfig) -> Timer {
        Timer {
            cfg,
            shared: Arc::new(Shared::default()),
            worker: Mutex::new(None),
        }
    }

    /// Arms the timer. A no-op while already running.
    ///
    /// Resets `elapsed` and `expired`, establishes a fresh clock reference and
    /// spawns the worker thread.
    pub fn start(&self) -> Result<(), TimerError> {
        let mut worker = self.worker.lock();

        if self.shared.started() {
            return Ok(());
        }

        // The previous run expired on its own; its thread is done or about to be.
        if let Some(prev) = worker.take() {
            prev.join()?;
        }

        self.shared.cancel.clear();
        self.shared.clear_run();

        let reference = self.cfg.clock.synchronize();
        let run = Worker::new(&self.cfg, self.shared.clone(), reference);

        let name = self.cfg.thread_name.0();
        let mut builder = thread::Builder::new().name(name.clone());
        if let Some(stack_size) = self.cfg.thread_stack_size {
            builder = builder.stack_size(stack_size);
        }

        // Must be visible before the worker exists: a short enough deadline can
        // expire, and clear it, before `spawn` even returns.
        self.shared.started.store(true, Ordering::Release);

        let handle = builder
            .spawn(move || {
                run.run();
            })
            .map_err(|e| {
                self.shared.started.store(false, Ordering::Release);
                TimerError::Spawn(e)
            })?;

        self.shared.cancel.register_worker(handle.thread().clone());
        tracing::debug!(thread = %name, duration_us = self.cfg.duration, "timer started");

        *worker = Some(WorkerHandle { name, handle });
        Ok(())
    }

    /// Stops a running timer and returns the elapsed microseconds.
    ///
    /// Blocks until the worker has observed the cancellation, or until its
    /// callback returns if the deadline had already passed. Not running: just
    /// returns the current `elapsed`.
    pub fn stop(&self) -> Result<u64, TimerError> {
        let mut worker = self.worker.lock();

        if !self.shared.started() {
            return Ok(self.shared.elapsed());
        }

        self.shared.cancel.cancel();

        // On failure the handle is gone but `started` stays set, so a retry
        // finishes the transition.
        if let Some(handle) = worker.take() {
            handle.join()?;
        }

        self.shared.started.store(false, Ordering::Release);
        tracing::debug!(elapsed_us = self.shared.elapsed(), "timer stopped");

        Ok(self.shared.elapsed())
    }

    /// Cancels and joins any outstanding worker, then clears `running`,
    /// `expired` and `elapsed`.
    pub fn reset(&self) -> Result<(), TimerError> {
        let mut worker = self.worker.lock();

        if let Some(handle) = worker.take() {
            self.shared.cancel.cancel();
            handle.join()?;
        }

        self.shared.started.store(false, Ordering::Release);
        self.shared.clear_run();

        tracing::debug!("timer reset");
        Ok(())
    }

    /// Microseconds. Updated continuously while running.
    pub fn elapsed(&self) -> u64 {
        self.shared.elapsed()
    }

    /// True only when the callback fired because the deadline passed.
    pub fn expired(&self) -> bool {
        self.shared.expired()
    }

    pub fn running(&self) -> bool {
        self.shared.started()
    }

    /// Microseconds.
    pub fn duration(&self) -> u64 {
        self.cfg.duration
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            duration: self.cfg.duration,
            elapsed: self.elapsed(),
            expired: self.expired(),
            running: self.running(),
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        if let Some(handle) = self.worker.get_mut().take() {
            self.shared.cancel.cancel();

            if let Err(e) = handle.join() {
                tracing::error!(error = %e, "timer worker did not exit cleanly");
            }
        }
    }
}

impl fmt::Display for Timer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<Timer at {:p} duration={}, expired={}, started={}>",
            self,
            self.cfg.duration,
            self.expired(),
            self.running()
        )
    }
}

impl fmt::Debug for Timer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timer")
            .field("cfg", &self.cfg)
            .field("shared", &self.shared)
            .finish_non_exhaustive()
    }
}
