use crate::clock::{Clock, PlatformClock};
use crate::errors::TimerError;
use crate::invoke::{Callable, ExecutionLock, Kwargs, Value};
use crate::timer::Timer;
use crate::utils::{ThreadNameFn, default_thread_name_fn};
use std::fmt;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// What the worker does between two clock samples.
///
/// `Spin` gives the lowest expiry latency and jitter at the cost of a full
/// core per running timer. The other strategies trade latency for CPU.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PollStrategy {
    /// Busy-poll with a CPU spin hint.
    #[default]
    Spin,

    /// Give up the time slice between samples.
    Yield,

    /// Park for at most the given interval between samples. Stopping the
    /// timer unparks the worker, so only expiry latency is affected.
    Park(Duration),
}

impl PollStrategy {
    #[inline(always)]
    pub(crate) fn idle(&self) {
        match self {
            PollStrategy::Spin => std::hint::spin_loop(),
            PollStrategy::Yield => thread::yield_now(),
            PollStrategy::Park(interval) => thread::park_timeout(*interval),
        }
    }
}

/// Configures and creates a [`Timer`].
pub struct Builder {
    /// Microseconds.
    duration: u64,

    callable: Callable,

    /// Forwarded verbatim to the callback.
    args: Vec<Value>,
    kwargs: Kwargs,

    poll_strategy: PollStrategy,

    /// Name fn used for worker threads.
    thread_name: ThreadNameFn,

    /// Stack size used for worker threads.
    thread_stack_size: Option<usize>,

    /// Lock taken around each callback invocation. `None` disables locking.
    execution_lock: Option<ExecutionLock>,

    clock: Arc<dyn Clock>,
}

impl Builder {
    pub fn new(duration_us: u64, callable: Callable) -> Self {
        Self {
            duration: duration_us,
            callable,
            args: Vec::new(),
            kwargs: Kwargs::new(),
            poll_strategy: PollStrategy::default(),
            thread_name: default_thread_name_fn(),
            thread_stack_size: None,
            execution_lock: Some(ExecutionLock::global()),
            clock: Arc::new(PlatformClock::default()),
        }
    }

    /// Like [`Builder::new`] but from a `Duration`, which may not fit in a
    /// `u64` microsecond count.
    pub fn from_duration(duration: Duration, callable: Callable) -> Result<Self, TimerError> {
        let micros = duration.as_micros();
        let duration_us =
            u64::try_from(micros).map_err(|_| TimerError::DurationOverflow(micros as i128))?;

        Ok(Self::new(duration_us, callable))
    }

    /// Appends positional arguments for the callback.
    pub fn args<I, V>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn arg(mut self, arg: impl Into<Value>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn kwargs(mut self, kwargs: Kwargs) -> Self {
        self.kwargs.extend(kwargs);
        self
    }

    pub fn kwarg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.kwargs.insert(key.into(), value.into());
        self
    }

    /// # Panics
    ///
    /// Panics if a `Park` interval of zero is given.
    #[track_caller]
    pub fn poll_strategy(mut self, strategy: PollStrategy) -> Self {
        if let PollStrategy::Park(interval) = strategy {
            assert!(!interval.is_zero(), "park interval must be greater than 0");
        }
        self.poll_strategy = strategy;
        self
    }

    /// Sets the name of worker threads. The default name is "hrtimer-{N}".
    pub fn thread_name(mut self, val: impl Into<String>) -> Self {
        let val = val.into();
        self.thread_name = ThreadNameFn(Arc::new(move || val.clone()));
        self
    }

    /// Sets a function used to generate worker thread names, called once per
    /// `start`.
    pub fn thread_name_fn<F>(mut self, f: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        self.thread_name = ThreadNameFn(Arc::new(f));
        self
    }

    /// Sets the stack size (in bytes) for worker threads.
    ///
    /// The actual stack size may be greater than this value if the platform
    /// specifies minimal stack size.
    #[track_caller]
    pub fn thread_stack_size(mut self, val: usize) -> Self {
        assert!(val > 0, "thread_stack_size must be greater than 0");
        self.thread_stack_size = Some(val);
        self
    }

    /// Replaces the process-wide host lock with `lock`.
    pub fn execution_lock(mut self, lock: ExecutionLock) -> Self {
        self.execution_lock = Some(lock);
        self
    }

    /// Invokes the callback without taking any lock. Only sound if the
    /// callback does not touch state shared with other threads.
    pub fn without_execution_lock(mut self) -> Self {
        self.execution_lock = None;
        self
    }

    pub fn clock(mut self, clock: impl Clock) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn build(self) -> Timer {
        Timer::from_config(self.into())
    }
}

impl fmt::Debug for Builder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builder")
            .field("duration", &self.duration)
            .field("args", &self.args)
            .field("kwargs", &self.kwargs)
            .field("poll_strategy", &self.poll_strategy)
            .field("thread_stack_size", &self.thread_stack_size)
            .field("execution_lock", &self.execution_lock.is_some())
            .finish_non_exhaustive()
    }
}

/// Immutable configuration of a timer, exported from the builder.
#[derive(Clone)]
pub(crate) struct TimerConfig {
    pub(crate) duration: u64,
    pub(crate) callable: Callable,
    pub(crate) args: Arc<[Value]>,
    pub(crate) kwargs: Arc<Kwargs>,
    pub(crate) poll_strategy: PollStrategy,
    pub(crate) thread_name: ThreadNameFn,
    pub(crate) thread_stack_size: Option<usize>,
    pub(crate) execution_lock: Option<ExecutionLock>,
    pub(crate) clock: Arc<dyn Clock>,
}

impl From<Builder> for TimerConfig {
    fn from(builder: Builder) -> Self {
        TimerConfig {
            duration: builder.duration,
            callable: builder.callable,
            args: builder.args.into(),
            kwargs: Arc::new(builder.kwargs),
            poll_strategy: builder.poll_strategy,
            thread_name: builder.thread_name,
            thread_stack_size: builder.thread_stack_size,
            execution_lock: builder.execution_lock,
            clock: builder.clock,
        }
    }
}

impl fmt::Debug for TimerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerConfig")
            .field("duration", &self.duration)
            .field("args", &self.args)
            .field("kwargs", &self.kwargs)
            .field("poll_strategy", &self.poll_strategy)
            .field("thread_name", &self.thread_name)
            .field("thread_stack_size", &self.thread_stack_size)
            .field("execution_lock", &self.execution_lock)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use static_assertions::assert_impl_all;

    assert_impl_all!(TimerConfig: Send, Sync, Clone);
    assert_impl_all!(Builder: Send);

    fn noop() -> Callable {
        Callable::from_fn(|| {})
    }

    #[test]
    fn test_builder_defaults() {
        let cfg: TimerConfig = Builder::new(10, noop()).into();

        assert_eq!(cfg.duration, 10);
        assert!(cfg.args.is_empty());
        assert!(cfg.kwargs.is_empty());
        assert_eq!(cfg.poll_strategy, PollStrategy::Spin);
        assert!(cfg.thread_stack_size.is_none());
        assert!(
            cfg.execution_lock
                .as_ref()
                .is_some_and(|l| l.ptr_eq(&ExecutionLock::global()))
        );
        assert!(cfg.thread_name.0().starts_with("hrtimer-"));
    }

    #[test]
    fn test_builder_arguments() {
        let cfg: TimerConfig = Builder::new(10, noop())
            .args([1, 2])
            .arg("three")
            .kwarg("a", true)
            .kwargs(Kwargs::from([("b".to_string(), Value::from(2.5))]))
            .into();

        assert_eq!(
            &*cfg.args,
            &[Value::from(1), Value::from(2), Value::from("three")]
        );
        assert_eq!(cfg.kwargs.get("a"), Some(&Value::Bool(true)));
        assert_eq!(cfg.kwargs.get("b"), Some(&Value::Float(2.5)));
    }

    #[test]
    fn test_builder_thread_options() {
        let cfg: TimerConfig = Builder::new(10, noop())
            .thread_name("custom")
            .thread_stack_size(256 * 1024)
            .poll_strategy(PollStrategy::Park(Duration::from_micros(50)))
            .without_execution_lock()
            .into();

        assert_eq!(cfg.thread_name.0(), "custom");
        assert_eq!(cfg.thread_stack_size, Some(256 * 1024));
        assert_eq!(
            cfg.poll_strategy,
            PollStrategy::Park(Duration::from_micros(50))
        );
        assert!(cfg.execution_lock.is_none());
    }

    #[test]
    fn test_from_duration() -> Result<(), TimerError> {
        let builder = Builder::from_duration(Duration::from_millis(50), noop())?;
        assert_eq!(builder.duration, 50_000);

        let err = Builder::from_duration(Duration::MAX, noop()).unwrap_err();
        assert!(matches!(err, TimerError::DurationOverflow(_)));
        Ok(())
    }

    #[test]
    #[should_panic(expected = "park interval must be greater than 0")]
    fn test_zero_park_interval_panics() {
        let _ = Builder::new(10, noop()).poll_strategy(PollStrategy::Park(Duration::ZERO));
    }
}
