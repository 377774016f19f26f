use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{EwlrError, RateEstimator};

const DEFAULT_TIME_PERIOD: Duration = Duration::from_millis(1000);
const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(1000);

/// Configuration for a [`RateEstimator`].
///
/// ```
/// # use std::time::Duration;
/// # use ewlr::EwlrConfig;
/// let mut estimator = EwlrConfig::new()
///     .set_time_period(Duration::from_secs(10))
///     .set_tick_interval(Duration::from_millis(500))
///     .build()
///     .unwrap();
///
/// estimator.record();
/// estimator.tick();
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EwlrConfig {
    pub(crate) time_period: Duration,
    pub(crate) tick_interval: Duration,
}

impl Default for EwlrConfig {
    fn default() -> Self {
        Self {
            time_period: DEFAULT_TIME_PERIOD,
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }
}

impl EwlrConfig {
    /// Creates a new default config.
    pub fn new() -> Self {
        EwlrConfig::default()
    }

    /// The smoothing time constant.
    ///
    /// ```
    /// # use std::time::Duration;
    /// # use ewlr::EwlrConfig;
    /// let config = EwlrConfig::new();
    ///
    /// // Defaults to 1 second.
    /// assert_eq!(config.time_period(), Duration::from_secs(1));
    /// ```
    pub fn time_period(&self) -> Duration {
        self.time_period
    }

    /// Set the smoothing time constant.
    ///
    /// The longer the period, the slower the estimate reacts to new samples.
    /// Must be non-zero.
    pub fn set_time_period(mut self, time_period: Duration) -> Self {
        self.time_period = time_period;
        self
    }

    /// The time each call to [`RateEstimator::tick`] represents.
    ///
    /// ```
    /// # use std::time::Duration;
    /// # use ewlr::EwlrConfig;
    /// let config = EwlrConfig::new();
    ///
    /// // Defaults to 1 second.
    /// assert_eq!(config.tick_interval(), Duration::from_secs(1));
    /// ```
    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// Set the time each call to [`RateEstimator::tick`] represents.
    ///
    /// Must be non-zero.
    pub fn set_tick_interval(mut self, tick_interval: Duration) -> Self {
        self.tick_interval = tick_interval;
        self
    }

    /// Validate the config and create the estimator.
    pub fn build(self) -> Result<RateEstimator, EwlrError> {
        RateEstimator::new(self)
    }

    /// Smoothing factor `1 - exp(-tick_interval / time_period)`, not validated.
    pub(crate) fn smoothing_factor(&self) -> f64 {
        let ratio = self.tick_interval.as_secs_f64() / self.time_period.as_secs_f64();

        // exp_m1 keeps precision when the ratio is tiny.
        -(-ratio).exp_m1()
    }

    /// Validated [`smoothing_factor`][Self::smoothing_factor].
    pub(crate) fn alpha(&self) -> Result<f64, EwlrError> {
        if self.time_period.is_zero() {
            return Err(EwlrError::InvalidConfiguration(
                "time_period must be greater than zero".into(),
            ));
        }

        if self.tick_interval.is_zero() {
            return Err(EwlrError::InvalidConfiguration(
                "tick_interval must be greater than zero".into(),
            ));
        }

        let alpha = self.smoothing_factor();

        if !(alpha > 0.0 && alpha <= 1.0) {
            return Err(EwlrError::InvalidConfiguration(format!(
                "smoothing factor {} out of range for tick_interval {:?} and time_period {:?}",
                alpha, self.tick_interval, self.time_period
            )));
        }

        Ok(alpha)
    }
}
