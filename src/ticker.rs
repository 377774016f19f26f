use std::time::{Duration, Instant};

use crate::time::not_happening;
use crate::EwlrError;

/// Smallest step of `Instant`.
const RESOLUTION: Duration = Duration::from_nanos(1);

/// Sans-IO tick scheduler.
///
/// Keeps the last tick boundary and tells how many ticks are due whenever time moves on.
/// Boundaries stay on multiples of the tick interval from the start, regardless of how
/// irregularly [`handle_timeout`][Self::handle_timeout] is called. One ticker can drive
/// any number of [`RateEstimator`][crate::RateEstimator] sharing the same interval.
///
/// ```
/// # use std::time::{Duration, Instant};
/// # use ewlr::{RateEstimator, Ticker};
/// let start = Instant::now();
/// let mut ticker = Ticker::new(Duration::from_secs(1), start).unwrap();
/// let mut estimator = RateEstimator::default();
///
/// estimator.update(10, 1).unwrap();
///
/// // The loop would wait until ticker.poll_timeout()
/// let now = start + Duration::from_millis(2500);
/// let ticks = ticker.handle_timeout(now);
/// assert_eq!(ticks, 2);
///
/// estimator.tick_many(ticks);
/// assert_eq!(ticker.last_tick(), start + Duration::from_secs(2));
/// ```
#[derive(Debug, Clone)]
pub struct Ticker {
    tick_interval: Duration,
    last_tick: Instant,
}

impl Ticker {
    /// Creates a ticker with the first interval starting at `now`.
    ///
    /// Fails with [`EwlrError::InvalidConfiguration`] if `tick_interval` is zero.
    pub fn new(tick_interval: Duration, now: Instant) -> Result<Self, EwlrError> {
        if tick_interval.is_zero() {
            return Err(EwlrError::InvalidConfiguration(
                "tick_interval must be greater than zero".into(),
            ));
        }

        Ok(Ticker {
            tick_interval,
            last_tick: now,
        })
    }

    /// Move time forward to `now` and return the number of ticks that are due.
    ///
    /// A tick is due once time has moved past the end of an interval. The count is the
    /// number of whole intervals passed, the part of an interval left over carries over
    /// to the next call.
    pub fn handle_timeout(&mut self, now: Instant) -> u64 {
        if now < self.last_tick {
            warn!("Time went backwards from last tick");
            return 0;
        }

        let age = now - self.last_tick;

        if age <= self.tick_interval {
            return 0;
        }

        let age_nanos = age.as_nanos();
        let interval_nanos = self.tick_interval.as_nanos();

        let ticks = age_nanos / interval_nanos;
        let remainder = duration_from_nanos(age_nanos % interval_nanos);

        self.last_tick = now - remainder;

        let ticks = u64::try_from(ticks).unwrap_or(u64::MAX);
        trace!("Catch up {} ticks", ticks);

        ticks
    }

    /// The earliest time at which [`handle_timeout`][Self::handle_timeout] returns a
    /// tick.
    ///
    /// For intervals too long for `Instant` to represent the end of, this is a time far
    /// in the future.
    pub fn poll_timeout(&self) -> Instant {
        self.last_tick
            .checked_add(self.tick_interval)
            .and_then(|t| t.checked_add(RESOLUTION))
            .unwrap_or_else(not_happening)
    }

    /// Start of the current interval.
    pub fn last_tick(&self) -> Instant {
        self.last_tick
    }

    /// Length of each interval.
    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }
}

/// `Duration::from_nanos` for values beyond `u64`. The value must fit in a `Duration`.
fn duration_from_nanos(nanos: u128) -> Duration {
    const NANOS_PER_SEC: u128 = 1_000_000_000;

    let secs = u64::try_from(nanos / NANOS_PER_SEC).unwrap_or(u64::MAX);
    let subsec = (nanos % NANOS_PER_SEC) as u32;

    Duration::new(secs, subsec)
}
