use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{CatchUp, EwlrConfig, EwlrError};

/// Exponentially weighted event rate and loss rate.
///
/// Events are recorded with [`update`][Self::update] and folded into the smoothed
/// estimates once per [`tick`][Self::tick]. Each tick stands for one
/// `tick_interval` of elapsed time. The estimator never looks at a clock, use
/// [`ticks_needed_since`][crate::ticks_needed_since] or [`Ticker`][crate::Ticker]
/// to work out when to tick.
///
/// No samples are kept, the state is a handful of numbers.
#[derive(Debug, Clone)]
pub struct RateEstimator {
    time_period: Duration,
    tick_interval: Duration,

    /// tick_interval in milliseconds, the unit of all rates.
    tick_interval_ms: f64,

    alpha: f64,

    /// Accumulated since last tick.
    count: u64,
    lost: u64,

    /// Events per millisecond.
    rate: f64,
    /// Lost events per millisecond.
    loss_rate: f64,
}

/// Snapshot of the smoothed estimates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rate {
    /// Smoothed number of events per millisecond.
    ///
    /// A tiny rate means few or no events have been seen for a while, in which case
    /// `loss_rate` says little about current conditions.
    pub rate: f64,

    /// Fraction of events lost, `0.0..=1.0`.
    pub loss_rate: f64,
}

impl Rate {
    /// The smoothed number of events per second.
    pub fn per_second(&self) -> f64 {
        self.rate * 1000.0
    }
}

impl Default for RateEstimator {
    fn default() -> Self {
        // The defaults are non-zero, no validation needed.
        let config = EwlrConfig::default();
        let alpha = config.smoothing_factor();
        Self::with_alpha(config, alpha)
    }
}

impl RateEstimator {
    /// Creates a new estimator.
    ///
    /// Fails with [`EwlrError::InvalidConfiguration`] if the time period or tick
    /// interval is zero.
    pub fn new(config: EwlrConfig) -> Result<Self, EwlrError> {
        let alpha = config.alpha()?;

        debug!(
            "New rate estimator time_period: {:?} tick_interval: {:?} alpha: {}",
            config.time_period, config.tick_interval, alpha
        );

        Ok(Self::with_alpha(config, alpha))
    }

    fn with_alpha(config: EwlrConfig, alpha: f64) -> Self {
        RateEstimator {
            time_period: config.time_period,
            tick_interval: config.tick_interval,
            tick_interval_ms: config.tick_interval.as_secs_f64() * 1000.0,
            alpha,
            count: 0,
            lost: 0,
            rate: 0.0,
            loss_rate: 0.0,
        }
    }

    /// Record `n` events of which `lost` were lost.
    ///
    /// The estimates don't change until the next [`tick`][Self::tick]. Fails with
    /// [`EwlrError::InvalidArgument`] if `lost` is greater than `n`, in which case
    /// nothing is recorded.
    pub fn update(&mut self, n: u64, lost: u64) -> Result<(), EwlrError> {
        if lost > n {
            return Err(EwlrError::InvalidArgument { events: n, lost });
        }

        self.count = self.count.saturating_add(n);
        self.lost = self.lost.saturating_add(lost);

        Ok(())
    }

    /// Record one successful event.
    pub fn record(&mut self) {
        self.count = self.count.saturating_add(1);
    }

    /// Record one lost event.
    pub fn record_lost(&mut self) {
        self.count = self.count.saturating_add(1);
        self.lost = self.lost.saturating_add(1);
    }

    /// Advance the estimates by one tick interval.
    ///
    /// Everything recorded since the previous tick is taken as having happened during
    /// this interval.
    pub fn tick(&mut self) {
        let instant_rate = self.count as f64 / self.tick_interval_ms;
        let instant_loss_rate = self.lost as f64 / self.tick_interval_ms;

        self.count = 0;
        self.lost = 0;

        self.rate += self.alpha * (instant_rate - self.rate);
        self.loss_rate += self.alpha * (instant_loss_rate - self.loss_rate);

        trace!(
            "Tick instant_rate: {} rate: {} loss_rate: {}",
            instant_rate,
            self.rate,
            self.loss_rate
        );
    }

    /// Advance the estimates by `n` tick intervals.
    ///
    /// Same as calling [`tick`][Self::tick] `n` times, but doesn't loop. Only the
    /// first tick sees the recorded events, the rest decay the estimates.
    pub fn tick_many(&mut self, n: u64) {
        if n == 0 {
            return;
        }

        self.tick();

        if n == 1 {
            return;
        }

        let decay = (1.0 - self.alpha).powf((n - 1) as f64);

        self.rate *= decay;
        self.loss_rate *= decay;

        trace!(
            "Decay {} ticks rate: {} loss_rate: {}",
            n - 1,
            self.rate,
            self.loss_rate
        );
    }

    /// Run the ticks of a [`CatchUp`].
    pub fn catch_up(&mut self, catch_up: &CatchUp) {
        self.tick_many(catch_up.required_ticks);
    }

    /// Current smoothed rates.
    ///
    /// The loss rate is 0 while the event rate is 0.
    pub fn rate(&self) -> Rate {
        let loss_rate = if self.rate == 0.0 {
            0.0
        } else {
            // Loss can never exceed the events, but rounding might nudge it.
            (self.loss_rate / self.rate).clamp(0.0, 1.0)
        };

        Rate {
            rate: self.rate,
            loss_rate,
        }
    }

    /// The smoothing factor applied each tick, `0.0 < alpha <= 1.0`.
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// The smoothing time constant.
    pub fn time_period(&self) -> Duration {
        self.time_period
    }

    /// The time each tick represents.
    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// Events recorded since the last tick.
    pub fn pending_events(&self) -> u64 {
        self.count
    }

    /// Lost events recorded since the last tick.
    pub fn pending_lost(&self) -> u64 {
        self.lost
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn assert_close(a: f64, b: f64) {
        let tolerance = 1e-12 * a.abs().max(b.abs()).max(1.0);
        assert!((a - b).abs() <= tolerance, "{} != {}", a, b);
    }

    #[test]
    fn default_matches_config() {
        let a = RateEstimator::default();
        let b = RateEstimator::new(EwlrConfig::default()).unwrap();

        assert_eq!(a.alpha(), b.alpha());
        assert_eq!(a.alpha(), EwlrConfig::default().alpha().unwrap());
        // Equal period and interval.
        assert!((a.alpha() - (1.0 - (-1.0_f64).exp())).abs() < 1e-12);
        assert_eq!(a.time_period(), Duration::from_millis(1000));
        assert_eq!(a.tick_interval(), Duration::from_millis(1000));
        assert_eq!(a.rate(), Rate::default());
    }

    #[test]
    fn first_tick() {
        let mut e = RateEstimator::default();

        e.record();
        e.update(1, 1).unwrap();
        e.update(1000, 200).unwrap();
        e.tick();

        let alpha = e.alpha();
        let r = e.rate();

        assert_close(r.rate, alpha * (2002.0 / 1000.0));
        assert_close(r.loss_rate, 201.0 / 2002.0);
        assert_close(r.per_second(), alpha * 2002.0);
    }

    #[test]
    fn lost_exceeds_events() {
        let mut e = RateEstimator::default();
        e.update(5, 2).unwrap();

        let err = e.update(1, 2).unwrap_err();
        assert_eq!(err, EwlrError::InvalidArgument { events: 1, lost: 2 });

        // Nothing recorded by the failed call.
        assert_eq!(e.pending_events(), 5);
        assert_eq!(e.pending_lost(), 2);
    }

    #[test]
    fn update_order_independent() {
        let mut a = RateEstimator::default();
        a.update(3, 0).unwrap();
        a.update(2, 1).unwrap();

        let mut b = RateEstimator::default();
        b.update(2, 1).unwrap();
        b.update(3, 0).unwrap();

        assert_eq!(a.pending_events(), b.pending_events());
        assert_eq!(a.pending_lost(), b.pending_lost());
        assert_eq!(a.pending_events(), 5);
        assert_eq!(a.pending_lost(), 1);

        a.tick();
        b.tick();
        assert_eq!(a.rate(), b.rate());
    }

    #[test]
    fn rate_is_idempotent() {
        let mut e = RateEstimator::default();
        e.update(10, 3).unwrap();
        e.tick();

        let r1 = e.rate();
        let r2 = e.rate();
        let r3 = e.rate();
        assert_eq!(r1, r2);
        assert_eq!(r2, r3);
    }

    #[test]
    fn tick_resets_accumulators() {
        let mut e = RateEstimator::default();
        e.update(10, 3).unwrap();
        e.tick();

        assert_eq!(e.pending_events(), 0);
        assert_eq!(e.pending_lost(), 0);

        let before = e.rate();
        e.update(1000, 1000).unwrap();
        assert_eq!(e.rate(), before);
    }

    #[test]
    fn no_tick_no_change() {
        let mut e = RateEstimator::default();
        e.update(100, 50).unwrap();
        assert_eq!(e.rate(), Rate::default());
    }

    #[test]
    fn converges() {
        let mut e = RateEstimator::default();

        for _ in 0..100 {
            e.record();
            e.tick();
        }

        let r = e.rate();
        assert!((r.rate - 1.0 / 1000.0).abs() < 1e-9, "rate: {}", r.rate);
        assert_eq!(r.loss_rate, 0.0);
    }

    #[test]
    fn converges_to_loss() {
        let mut e = RateEstimator::default();

        for _ in 0..100 {
            e.update(10, 2).unwrap();
            e.tick();
        }

        let r = e.rate();
        assert!((r.rate - 10.0 / 1000.0).abs() < 1e-9);
        assert!((r.loss_rate - 0.2).abs() < 1e-9);
    }

    #[test]
    fn decays_without_events() {
        let mut e = RateEstimator::default();
        e.update(100, 10).unwrap();
        e.tick();

        let start = e.rate();

        for _ in 0..10 {
            e.tick();
        }

        let r = e.rate();
        assert!(r.rate < start.rate);
        assert!(r.rate > 0.0);
        // Loss decays at the same pace as the rate.
        assert_close(r.loss_rate, start.loss_rate);
    }

    #[test]
    fn tick_many_matches_loop() {
        let config = EwlrConfig::new()
            .set_time_period(Duration::from_secs(5))
            .set_tick_interval(Duration::from_millis(200));

        for n in [0, 1, 2, 7, 50] {
            let mut a = config.build().unwrap();
            let mut b = config.build().unwrap();

            for e in [&mut a, &mut b] {
                e.update(40, 4).unwrap();
                e.tick();
                e.update(17, 9).unwrap();
            }

            a.tick_many(n);
            for _ in 0..n {
                b.tick();
            }

            assert_close(a.rate().rate, b.rate().rate);
            assert_close(a.rate().loss_rate, b.rate().loss_rate);
            assert_eq!(a.pending_events(), b.pending_events());
        }
    }

    #[test]
    fn catch_up_runs_ticks() {
        let mut a = RateEstimator::default();
        let mut b = RateEstimator::default();

        a.update(10, 1).unwrap();
        b.update(10, 1).unwrap();

        let c = crate::ticks_needed_since(0.0, 1000.0, 3200.0).unwrap();
        a.catch_up(&c);

        for _ in 0..3 {
            b.tick();
        }

        assert_close(a.rate().rate, b.rate().rate);
    }

    #[test]
    fn loss_rate_bounded() {
        let mut rng = fastrand::Rng::with_seed(42);
        let mut e = EwlrConfig::new()
            .set_time_period(Duration::from_millis(3000))
            .set_tick_interval(Duration::from_millis(100))
            .build()
            .unwrap();

        for _ in 0..2000 {
            let updates = rng.usize(0..4);
            for _ in 0..updates {
                let n = rng.u64(0..1000);
                let lost = rng.u64(0..=n);
                e.update(n, lost).unwrap();
            }

            e.tick_many(rng.u64(0..3));

            let r = e.rate();
            assert!((0.0..=1.0).contains(&r.loss_rate), "{:?}", r);
            assert!(r.rate >= 0.0);
        }
    }

    #[test]
    fn all_lost() {
        let mut e = RateEstimator::default();

        for _ in 0..10 {
            e.record_lost();
            e.tick();
        }

        assert_eq!(e.rate().loss_rate, 1.0);
    }

    #[test]
    fn saturating_counts() {
        let mut e = RateEstimator::default();
        e.update(u64::MAX, 0).unwrap();
        e.update(u64::MAX, u64::MAX).unwrap();

        assert_eq!(e.pending_events(), u64::MAX);
        assert_eq!(e.pending_lost(), u64::MAX);

        e.tick();
        assert_eq!(e.rate().loss_rate, 1.0);
    }
}
