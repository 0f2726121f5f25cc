use bitflags::bitflags;

#[derive(Debug, Default)]
pub(crate) struct Ticker {
    tick: u64,
}

impl Ticker {
    pub(crate) fn new() -> Self {
        Self { tick: 0 }
    }

    #[inline(always)]
    pub(crate) fn tick<T: TickerData>(&mut self, data: &mut T) -> TickerEvents {
        self.tick = self.tick.wrapping_add(1);
        data.update_and_check()
    }

    pub(crate) fn ticks(&self) -> u64 {
        self.tick
    }
}

/// Implemented by the worker's poll state. One call per loop iteration:
/// sample, publish, and report what the loop must do next. The ticker only
/// counts iterations.
pub(crate) trait TickerData {
    fn update_and_check(&mut self) -> TickerEvents;
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub(crate) struct TickerEvents: u8 {
        /// The deadline has passed.
        const EXPIRED = 1;

        /// The controller asked the worker to stop.
        const CANCELLED = 1 << 1;
    }
}
