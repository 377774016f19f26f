use std::time::{Duration, Instant};

use once_cell::sync::Lazy;

use serde::{Deserialize, Serialize};

// Fixed on first use. All millisecond timestamps from now_millis() are relative to this.
static BEGINNING_OF_TIME: Lazy<Instant> = Lazy::new(Instant::now);

pub(crate) fn not_happening() -> Instant {
    const YEARS_100: Duration = Duration::from_secs(60 * 60 * 24 * 365 * 100);
    static FUTURE: Lazy<Instant> = Lazy::new(|| Instant::now() + YEARS_100);
    *FUTURE
}

/// Milliseconds elapsed on the monotonic clock, for example `109.372263`.
///
/// The origin is arbitrary but fixed for the lifetime of the process, which makes the
/// value usable as the `last_tick`/`now` arguments of [`ticks_needed_since`]. Unlike
/// wall clock time this never goes backwards.
pub fn now_millis() -> f64 {
    let origin = *BEGINNING_OF_TIME;
    Instant::now()
        .saturating_duration_since(origin)
        .as_secs_f64()
        * 1000.0
}

/// Result of catching up with elapsed time.
///
/// The caller runs [`RateEstimator::tick`][crate::RateEstimator::tick] `required_ticks`
/// times (or [`RateEstimator::catch_up`][crate::RateEstimator::catch_up] once) and keeps
/// `new_last_tick` as the reference for the next call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CatchUp {
    /// Start of the current, not yet complete, interval in milliseconds.
    pub new_last_tick: f64,
    /// Number of whole intervals that passed.
    pub required_ticks: u64,
}

/// Works out how many ticks are due since `last_tick`.
///
/// All arguments are in milliseconds. Returns `None` when no more than one
/// `tick_interval` has passed, which also covers time going backwards, or if the
/// arguments don't make sense (NaN, infinite times, non-positive or infinite interval).
///
/// The tick count is rounded down. The fraction of an interval left over is not lost,
/// `new_last_tick` is placed on the last interval boundary before `now` so that the
/// remainder is counted by a later call.
///
/// ```
/// # use ewlr::ticks_needed_since;
/// let c = ticks_needed_since(0.0, 1000.0, 2500.0).unwrap();
/// assert_eq!(c.required_ticks, 2);
/// assert_eq!(c.new_last_tick, 2000.0);
///
/// assert!(ticks_needed_since(0.0, 1000.0, 500.0).is_none());
/// ```
pub fn ticks_needed_since(last_tick: f64, tick_interval: f64, now: f64) -> Option<CatchUp> {
    if !(tick_interval > 0.0 && tick_interval.is_finite()) {
        trace!("Ignore catch up with tick interval: {}", tick_interval);
        return None;
    }

    let age = now - last_tick;

    // Also false for NaN.
    if !(age > tick_interval && age.is_finite()) {
        return None;
    }

    let remainder = age % tick_interval;

    // Count from the same boundary that new_last_tick lands on. A plain floor of
    // age / tick_interval can round up past it for intervals like 1000.0 / 60.0.
    let required_ticks = ((age - remainder) / tick_interval).round() as u64;

    Some(CatchUp {
        new_last_tick: now - remainder,
        required_ticks,
    })
}

/// Same as [`ticks_needed_since`] using [`now_millis`] as the current time.
pub fn ticks_needed(last_tick: f64, tick_interval: f64) -> Option<CatchUp> {
    ticks_needed_since(last_tick, tick_interval, now_millis())
}
