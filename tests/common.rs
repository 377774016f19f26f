#![allow(unused)]
use std::sync::Once;
use std::time::{Duration, Instant};

use ewlr::{RateEstimator, Ticker};

pub fn init_log() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

    static START: Once = Once::new();

    START.call_once(|| {
        tracing_subscriber::registry()
            .with(fmt::layer())
            .with(env_filter)
            .init();
    });
}

/// A link where every packet is lost with a fixed probability.
pub struct TestLink {
    pub rng: fastrand::Rng,
    pub probability: f32,
    pub start: Instant,
    pub now: Instant,
    pub ticker: Ticker,
    pub estimator: RateEstimator,
}

impl TestLink {
    pub fn new(estimator: RateEstimator, probability: f32, seed: u64) -> Self {
        let start = Instant::now();
        let ticker = Ticker::new(estimator.tick_interval(), start).unwrap();

        TestLink {
            rng: fastrand::Rng::with_seed(seed),
            probability,
            start,
            now: start,
            ticker,
            estimator,
        }
    }

    /// Send `packets` evenly spread over `duration`, ticking the estimator as time passes.
    pub fn send(&mut self, packets: u64, duration: Duration) {
        let step = duration / packets.max(1) as u32;

        for _ in 0..packets {
            self.now += step;
            self.progress();

            if self.rng.f32() < self.probability {
                self.estimator.record_lost();
            } else {
                self.estimator.record();
            }
        }
    }

    /// Let time pass without any packets.
    pub fn idle(&mut self, duration: Duration) {
        self.now += duration;
        self.progress();
    }

    pub fn progress(&mut self) {
        let ticks = self.ticker.handle_timeout(self.now);
        self.estimator.tick_many(ticks);
    }

    pub fn duration(&self) -> Duration {
        self.now - self.start
    }
}
