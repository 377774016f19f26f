//! Exponentially weighted event rate and loss rate.
//!
//! This crate estimates how many events per unit of time go through something, and what
//! fraction of them are lost, typically packets over a network link. The estimate is an
//! exponentially weighted moving average, so no history of samples is kept. Recent
//! intervals weigh more than old ones, and how fast old intervals are forgotten is set by
//! a time period.
//!
//! It is a [Sans I/O][sansio] implementation. There are no threads, timers or clocks
//! inside the estimator. Time only moves when the caller says so by calling
//! [`RateEstimator::tick`].
//!
//! # Usage
//!
//! Events (and losses) are recorded as they happen. Every tick interval the recorded
//! counts are folded into the smoothed estimates.
//!
//! ```
//! # use ewlr::RateEstimator;
//! let mut estimator = RateEstimator::default();
//!
//! // Success
//! estimator.record();
//!
//! // Failure
//! estimator.update(1, 1).unwrap();
//!
//! // 1000 events with 20% loss
//! estimator.update(1000, 200).unwrap();
//!
//! // Nothing happens until the estimator ticks.
//! assert_eq!(estimator.rate().rate, 0.0);
//!
//! estimator.tick();
//!
//! let rate = estimator.rate();
//! assert!((rate.loss_rate - 201.0 / 2002.0).abs() < 1e-9);
//! ```
//!
//! ## Ticking
//!
//! Each tick is assumed to be one tick interval. To keep the estimate honest when the
//! driving loop wakes up late, the caller works out how many intervals actually passed
//! and runs that many ticks. [`ticks_needed_since`] does this for millisecond
//! timestamps, such as the ones from [`now_millis`].
//!
//! ```
//! # use ewlr::{now_millis, ticks_needed_since, RateEstimator};
//! let mut estimator = RateEstimator::default();
//! let mut last_tick = now_millis();
//!
//! estimator.update(10, 1).unwrap();
//!
//! // Later...
//! let now = last_tick + 3200.0;
//!
//! if let Some(catch_up) = ticks_needed_since(last_tick, 1000.0, now) {
//!     assert_eq!(catch_up.required_ticks, 3);
//!     estimator.catch_up(&catch_up);
//!     last_tick = catch_up.new_last_tick;
//! }
//! ```
//!
//! The same thing over [`Instant`][std::time::Instant] is done by a [`Ticker`], which
//! also says when the next tick is due.
//!
//! ```
//! # use std::time::{Duration, Instant};
//! # use ewlr::{RateEstimator, Ticker};
//! let mut ticker = Ticker::new(Duration::from_secs(1), Instant::now()).unwrap();
//! let mut estimator = RateEstimator::default();
//!
//! loop {
//!     let timeout = ticker.poll_timeout();
//!
//!     // Wait for events until timeout, recording them in the estimator.
//!     # let now = timeout;
//!
//!     let ticks = ticker.handle_timeout(now);
//!     estimator.tick_many(ticks);
//!
//!     let rate = estimator.rate();
//!     println!("{} events/s, {:.1}% loss", rate.per_second(), rate.loss_rate * 100.0);
//!     # break;
//! }
//! ```
//!
//! ## Reading the loss rate
//!
//! [`Rate::loss_rate`] is only meaningful while [`Rate::rate`] is not negligible. A rate of
//! 13 events per second means the loss rate probably reflects current conditions. A rate
//! that has decayed to `1e-30` means nothing has been seen in a long time, and the loss
//! rate is whatever it was back then.
//!
//! # Configuration
//!
//! The time period and tick interval default to 1 second each. Use [`EwlrConfig`] to
//! change them.
//!
//! ```
//! # use std::time::Duration;
//! # use ewlr::EwlrConfig;
//! let estimator = EwlrConfig::new()
//!     .set_time_period(Duration::from_secs(30))
//!     .set_tick_interval(Duration::from_millis(100))
//!     .build()
//!     .unwrap();
//!
//! assert!(estimator.alpha() < 0.01);
//! ```
//!
//! [sansio]: https://sans-io.readthedocs.io

#![allow(clippy::manual_range_contains)]
#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod config;
pub use config::EwlrConfig;

mod error;
pub use error::EwlrError;

mod estimator;
pub use estimator::{Rate, RateEstimator};

mod ticker;
pub use ticker::Ticker;

mod time;
pub use time::{now_millis, ticks_needed, ticks_needed_since, CatchUp};
