use crate::clock::{Clock, ReferencePoint, ticks_to_micros};
use std::time::{Instant, SystemTime};

/// Upper bound on wall-clock reads while waiting for a tick edge. Real wall
/// clocks tick every ~15ms at worst; a frozen one must not hang `start()`.
const MAX_SYNC_SPINS: usize = 1 << 24;

/// A wall-clock source, typically with coarse granularity.
pub trait WallClock: Send + Sync + 'static {
    fn now(&self) -> SystemTime;
}

/// A high-resolution tick counter with a fixed frequency (ticks per second).
pub trait Counter: Send + Sync + 'static {
    fn ticks(&self) -> u64;

    fn frequency(&self) -> u64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemWallClock;

impl WallClock for SystemWallClock {
    #[inline(always)]
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Nanosecond counter anchored at construction.
#[derive(Debug, Clone, Copy)]
pub struct InstantCounter {
    anchor: Instant,
}

impl InstantCounter {
    pub fn new() -> Self {
        Self {
            anchor: Instant::now(),
        }
    }
}

impl Default for InstantCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl Counter for InstantCounter {
    #[inline(always)]
    fn ticks(&self) -> u64 {
        u64::try_from(self.anchor.elapsed().as_nanos()).unwrap_or(u64::MAX)
    }

    fn frequency(&self) -> u64 {
        1_000_000_000
    }
}

/// Clock that pairs a coarse wall clock with a high-resolution counter.
///
/// `synchronize` spins on the wall clock until it observes a transition and
/// snapshots the counter right after, so the offset between the two is bounded
/// by one wall-clock tick. Elapsed time is then measured purely on the counter.
#[derive(Debug, Default, Clone, Copy)]
pub struct SyncedClock<W = SystemWallClock, C = InstantCounter> {
    wall: W,
    counter: C,
}

impl<W: WallClock, C: Counter> SyncedClock<W, C> {
    pub fn new(wall: W, counter: C) -> Self {
        Self { wall, counter }
    }
}

impl<W: WallClock, C: Counter> Clock for SyncedClock<W, C> {
    fn synchronize(&self) -> ReferencePoint {
        let before = self.wall.now();

        let mut reference = ReferencePoint {
            wall: before,
            counter: self.counter.ticks(),
        };

        for _ in 0..MAX_SYNC_SPINS {
            let now = self.wall.now();
            // The thread can be switched out between these two reads; the
            // resulting skew is rare and bounded by a scheduler quantum.
            let counter = self.counter.ticks();

            if now != before {
                return ReferencePoint { wall: now, counter };
            }

            reference.counter = counter;
            std::hint::spin_loop();
        }

        tracing::warn!(
            spins = MAX_SYNC_SPINS,
            "wall clock did not advance while synchronizing, using last sample"
        );
        reference
    }

    #[inline(always)]
    fn elapsed_since(&self, reference: &ReferencePoint) -> u64 {
        let ticks = self.counter.ticks().saturating_sub(reference.counter);
        ticks_to_micros(ticks, self.counter.frequency())
    }
}
