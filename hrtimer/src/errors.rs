use std::io;

/// Errors surfaced synchronously to the caller of a [`crate::Timer`] operation.
#[derive(thiserror::Error, Debug)]
pub enum TimerError {
    /// The host supplied fewer than the two mandatory positional arguments
    /// (duration and callback).
    #[error("Timer takes at least 2 arguments ({got} given)")]
    MissingArguments { got: usize },

    #[error("callback parameter must be callable")]
    NotCallable,

    /// The duration argument is not an integer.
    #[error("duration must be an integer number of microseconds")]
    InvalidDuration,

    /// The duration does not fit an unsigned 64-bit microsecond count.
    #[error("duration {0} is out of range for an unsigned 64-bit microsecond count")]
    DurationOverflow(i128),

    #[error("unable to spawn timer thread: {0}")]
    Spawn(#[source] io::Error),

    /// The worker thread could not be joined. The controller keeps its
    /// `running` state so the operation can be retried.
    #[error("error stopping timer thread {thread}")]
    Join { thread: String },
}

impl TimerError {
    /// Whether the error was raised while validating constructor arguments.
    pub fn is_construction(&self) -> bool {
        matches!(
            self,
            TimerError::MissingArguments { .. }
                | TimerError::NotCallable
                | TimerError::InvalidDuration
                | TimerError::DurationOverflow(_)
        )
    }
}

/// Failure of a single callback invocation. These never reach the caller of
/// `start`/`stop`/`reset`; the worker reports and drops them.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CallbackError {
    #[error("Unable to call callback: {0}")]
    Failed(String),

    #[error("callback panicked: {0}")]
    Panicked(String),
}

impl CallbackError {
    pub fn failed(msg: impl Into<String>) -> Self {
        CallbackError::Failed(msg.into())
    }
}

impl From<anyhow::Error> for CallbackError {
    fn from(e: anyhow::Error) -> Self {
        CallbackError::Failed(format!("{e:#}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use rstest::rstest;

    #[rstest]
    #[case::missing(TimerError::MissingArguments { got: 1 }, true)]
    #[case::not_callable(TimerError::NotCallable, true)]
    #[case::invalid(TimerError::InvalidDuration, true)]
    #[case::overflow(TimerError::DurationOverflow(-1), true)]
    #[case::join(TimerError::Join { thread: "hrtimer-0".into() }, false)]
    #[case::spawn(TimerError::Spawn(io::Error::other("boom")), false)]
    fn test_is_construction(#[case] err: TimerError, #[case] expected: bool) {
        assert_eq!(err.is_construction(), expected);
    }

    #[test]
    fn test_callback_error_from_anyhow_keeps_context() {
        let err = anyhow!("inner").context("outer");
        assert_eq!(
            CallbackError::from(err),
            CallbackError::Failed("outer: inner".to_string())
        );
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            TimerError::MissingArguments { got: 0 }.to_string(),
            "Timer takes at least 2 arguments (0 given)"
        );
        assert_eq!(
            TimerError::NotCallable.to_string(),
            "callback parameter must be callable"
        );
    }
}
