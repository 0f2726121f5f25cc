use crate::clock::{Clock, ReferencePoint};
use crate::invoke::{CallbackInvoker, Invocation};
use crate::timer::builder::TimerConfig;
use crate::timer::{PollStrategy, Shared, Ticker, TickerData, TickerEvents};
use crate::utils::ScopeGuard;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

static LIVE_WORKERS: AtomicUsize = AtomicUsize::new(0);

/// Number of timer threads currently alive in the process.
pub fn live_workers() -> usize {
    LIVE_WORKERS.load(Ordering::Acquire)
}

/// How a worker run ended. Exactly one of the two, once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    Expired,
    Cancelled { elapsed: u64 },
}

/// Body of a timer thread: polls the clock until the deadline passes or the
/// timer is cancelled.
#[derive(Debug)]
pub(crate) struct Worker {
    poll: PollState,

    ticker: Ticker,

    poll_strategy: PollStrategy,

    invoker: CallbackInvoker,

    /// Taken on expiry, so the callback cannot run twice.
    invocation: Option<Invocation>,
}

impl Worker {
    pub(crate) fn new(cfg: &TimerConfig, shared: Arc<Shared>, reference: ReferencePoint) -> Self {
        Self {
            poll: PollState {
                shared,
                clock: cfg.clock.clone(),
                reference,
                duration: cfg.duration,
                last_elapsed: 0,
            },
            ticker: Ticker::new(),
            poll_strategy: cfg.poll_strategy,
            invoker: CallbackInvoker::new(cfg.execution_lock.clone()),
            invocation: Some(Invocation {
                callable: cfg.callable.clone(),
                args: cfg.args.clone(),
                kwargs: cfg.kwargs.clone(),
            }),
        }
    }

    pub(crate) fn run(mut self) -> Outcome {
        LIVE_WORKERS.fetch_add(1, Ordering::AcqRel);
        let _live = ScopeGuard::new(|| {
            LIVE_WORKERS.fetch_sub(1, Ordering::AcqRel);
        });

        let outcome = 'poll: loop {
            let events = self.ticker.tick(&mut self.poll);

            if let ControlFlow::Break(outcome) = self.process_ticker_events(events) {
                break 'poll outcome;
            }

            self.poll_strategy.idle();
        };

        tracing::trace!(
            ?outcome,
            iterations = self.ticker.ticks(),
            "timer worker exiting"
        );
        outcome
    }

    #[inline(always)]
    fn process_ticker_events(&mut self, events: TickerEvents) -> ControlFlow<Outcome> {
        // Expiry wins over a cancellation observed in the same iteration: the
        // deadline had already passed when the flag was read.
        if events.contains(TickerEvents::EXPIRED) {
            self.expire();
            ControlFlow::Break(Outcome::Expired)
        } else if events.contains(TickerEvents::CANCELLED) {
            let elapsed = self.poll.last_elapsed;
            self.poll.shared.elapsed.store(elapsed, Ordering::Release);
            ControlFlow::Break(Outcome::Cancelled { elapsed })
        } else {
            ControlFlow::Continue(())
        }
    }

    fn expire(&mut self) {
        let shared = &self.poll.shared;
        // Report the duration, not the overshoot, so callers can tell an
        // expiry apart from a stop.
        shared.elapsed.store(self.poll.duration, Ordering::Release);

        if let Some(invocation) = self.invocation.take() {
            // Failures were reported by the invoker; nothing reaches the
            // controller.
            let _ = self.invoker.invoke(invocation);
        }

        shared.mark_expired(self.poll.duration);
    }
}

/// Per-iteration sampling state.
struct PollState {
    shared: Arc<Shared>,
    clock: Arc<dyn Clock>,
    reference: ReferencePoint,
    duration: u64,
    last_elapsed: u64,
}

impl std::fmt::Debug for PollState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollState")
            .field("reference", &self.reference)
            .field("duration", &self.duration)
            .field("last_elapsed", &self.last_elapsed)
            .finish_non_exhaustive()
    }
}

impl TickerData for PollState {
    #[inline(always)]
    fn update_and_check(&mut self) -> TickerEvents {
        let elapsed = self.clock.elapsed_since(&self.reference);

        if elapsed > self.duration {
            return TickerEvents::EXPIRED;
        }

        self.last_elapsed = elapsed;
        self.shared.elapsed.store(elapsed, Ordering::Relaxed);

        if self.shared.cancel.is_cancelled() {
            TickerEvents::CANCELLED
        } else {
            TickerEvents::empty()
        }
    }
}
