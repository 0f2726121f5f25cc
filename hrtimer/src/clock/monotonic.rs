use crate::clock::{Clock, ReferencePoint, synced::Counter, ticks_to_micros};
use std::time::SystemTime;

const NANOS_PER_SEC: u64 = 1_000_000_000;

/// `CLOCK_MONOTONIC` read straight through `clock_gettime`.
///
/// The counter is already monotonic and nanosecond based, so `synchronize`
/// only snapshots it next to the wall clock, without the edge-catching loop.
#[derive(Debug, Default, Clone, Copy)]
pub struct MonotonicClock;

impl MonotonicClock {
    #[inline(always)]
    fn read_nanos() -> u64 {
        let mut ts = libc::timespec {
            tv_sec: 0,
            tv_nsec: 0,
        };

        // Safety: `ts` is a valid, writable timespec and CLOCK_MONOTONIC is
        // supported on every unix target we build for.
        let ret = unsafe { libc::clock_gettime(libc::CLOCK_MONOTONIC, &mut ts) };
        debug_assert_eq!(ret, 0, "clock_gettime(CLOCK_MONOTONIC) failed");

        (ts.tv_sec as u64)
            .saturating_mul(NANOS_PER_SEC)
            .saturating_add(ts.tv_nsec as u64)
    }
}

impl Counter for MonotonicClock {
    #[inline(always)]
    fn ticks(&self) -> u64 {
        Self::read_nanos()
    }

    fn frequency(&self) -> u64 {
        NANOS_PER_SEC
    }
}

impl Clock for MonotonicClock {
    fn synchronize(&self) -> ReferencePoint {
        ReferencePoint {
            wall: SystemTime::now(),
            counter: Self::read_nanos(),
        }
    }

    #[inline(always)]
    fn elapsed_since(&self, reference: &ReferencePoint) -> u64 {
        let ticks = Self::read_nanos().saturating_sub(reference.counter);
        ticks_to_micros(ticks, NANOS_PER_SEC)
    }
}
