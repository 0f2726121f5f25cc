use std::time::{Duration, SystemTime};

#[cfg(unix)]
mod monotonic;
#[cfg(unix)]
pub use monotonic::MonotonicClock;

mod synced;
pub use synced::{Counter, InstantCounter, SyncedClock, SystemWallClock, WallClock};

/// The clock used by timers unless the builder is given another one.
///
/// Unix targets expose a native monotonic counter, so no synchronization
/// against the wall clock is needed. Everywhere else we catch the wall-clock
/// edge and measure from there.
#[cfg(unix)]
pub type PlatformClock = MonotonicClock;

#[cfg(not(unix))]
pub type PlatformClock = SyncedClock;

const MICROS_PER_SEC: u128 = 1_000_000;

/// A synchronization point: wall-clock time paired with the raw counter value
/// read at (as close as possible to) the same instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferencePoint {
    pub wall: SystemTime,
    pub counter: u64,
}

/// Source of elapsed microseconds relative to a [`ReferencePoint`].
pub trait Clock: Send + Sync + 'static {
    /// Establishes a new reference point. Called once per timer run.
    fn synchronize(&self) -> ReferencePoint;

    /// Microseconds elapsed since `reference` was established. Never
    /// decreases for a given reference.
    fn elapsed_since(&self, reference: &ReferencePoint) -> u64;

    /// Absolute wall time derived from the reference and the counter delta.
    fn now(&self, reference: &ReferencePoint) -> SystemTime {
        reference.wall + Duration::from_micros(self.elapsed_since(reference))
    }
}

/// Converts a counter delta into microseconds.
///
/// Integer math in 128 bits, so a nanosecond counter does not lose precision
/// the way the `ticks as f64 / freq * 1e6` formulation does for long runs.
#[inline(always)]
pub(crate) fn ticks_to_micros(ticks: u64, frequency: u64) -> u64 {
    debug_assert!(frequency > 0, "counter frequency must be non-zero");
    let micros = (ticks as u128 * MICROS_PER_SEC) / frequency.max(1) as u128;
    u64::try_from(micros).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use static_assertions::assert_impl_all;

    assert_impl_all!(PlatformClock: Clock, Send, Sync);
    assert_impl_all!(ReferencePoint: Send, Sync, Copy);

    #[rstest]
    #[case::nanos(1_500, 1_000_000_000, 1)]
    #[case::nanos_exact(2_000_000, 1_000_000_000, 2_000)]
    #[case::micros(42, 1_000_000, 42)]
    #[case::qpc_10mhz(10_000_000, 10_000_000, 1_000_000)]
    #[case::zero(0, 3_579_545, 0)]
    #[case::huge(u64::MAX, 1, u64::MAX)]
    fn test_ticks_to_micros(#[case] ticks: u64, #[case] freq: u64, #[case] expected: u64) {
        assert_eq!(ticks_to_micros(ticks, freq), expected);
    }

    #[test]
    fn test_platform_clock_now_tracks_reference() {
        let clock = PlatformClock::default();
        let reference = clock.synchronize();

        std::thread::sleep(Duration::from_millis(2));

        let now = clock.now(&reference);
        let delta = now
            .duration_since(reference.wall)
            .expect("now precedes reference");
        assert!(delta >= Duration::from_millis(2));
    }
}
