//! Type-state builder for `ControlLoop`.
//!
//! `build()` only exists once a counter, a store and a sink have been
//! supplied, so a half-wired loop does not compile.

use dro_traits::clock::{Clock, MonotonicClock};
use dro_traits::{AttributeSink, CalibrationStore, Counter};

use crate::config::{CalibrationDefaults, LoopCfg};
use crate::core::DroCore;
use crate::dispatch::Dispatcher;
use crate::error::{BuildError, Result};
use crate::position::PositionModel;
use crate::queue::{EventSender, event_queue};
use crate::runner::{ControlLoop, LoopStats};

/// Placeholder for a collaborator not yet supplied.
pub struct Missing;

pub struct LoopBuilder<C, St, Sk> {
    counter: C,
    store: St,
    sink: Sk,
    cfg: LoopCfg,
    defaults: CalibrationDefaults,
    clock: Option<Box<dyn Clock>>,
}

impl Default for LoopBuilder<Missing, Missing, Missing> {
    fn default() -> Self {
        Self::new()
    }
}

impl LoopBuilder<Missing, Missing, Missing> {
    pub fn new() -> Self {
        Self {
            counter: Missing,
            store: Missing,
            sink: Missing,
            cfg: LoopCfg::default(),
            defaults: CalibrationDefaults::default(),
            clock: None,
        }
    }
}

impl<C, St, Sk> LoopBuilder<C, St, Sk> {
    pub fn with_counter<C2: Counter>(self, counter: C2) -> LoopBuilder<C2, St, Sk> {
        LoopBuilder {
            counter,
            store: self.store,
            sink: self.sink,
            cfg: self.cfg,
            defaults: self.defaults,
            clock: self.clock,
        }
    }

    pub fn with_store<St2: CalibrationStore>(self, store: St2) -> LoopBuilder<C, St2, Sk> {
        LoopBuilder {
            counter: self.counter,
            store,
            sink: self.sink,
            cfg: self.cfg,
            defaults: self.defaults,
            clock: self.clock,
        }
    }

    pub fn with_sink<Sk2: AttributeSink>(self, sink: Sk2) -> LoopBuilder<C, St, Sk2> {
        LoopBuilder {
            counter: self.counter,
            store: self.store,
            sink,
            cfg: self.cfg,
            defaults: self.defaults,
            clock: self.clock,
        }
    }

    pub fn with_config(mut self, cfg: LoopCfg) -> Self {
        self.cfg = cfg;
        self
    }

    pub fn with_calibration(mut self, defaults: CalibrationDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Inject a clock (tests use `ManualClock` to avoid real sleeps).
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Box::new(clock));
        self
    }
}

impl<C: Counter, St: CalibrationStore, Sk: AttributeSink> LoopBuilder<C, St, Sk> {
    /// Validate, load calibration, publish initial values, and hand back the
    /// loop plus the producer side of its event queue.
    pub fn build(self) -> Result<(ControlLoop<C, St, Sk>, EventSender)> {
        if self.cfg.sample_rate_hz == 0 {
            return Err(BuildError::InvalidConfig("sample_rate_hz must be > 0").into());
        }
        if self.cfg.queue_capacity == 0 {
            return Err(BuildError::InvalidConfig("queue_capacity must be > 0").into());
        }
        if self.defaults.numerator == 0 {
            return Err(BuildError::InvalidConfig("default numerator must be > 0").into());
        }
        if self.defaults.denominator == 0 {
            return Err(BuildError::InvalidConfig("default denominator must be > 0").into());
        }

        let model = PositionModel::with_scale(self.defaults.numerator, self.defaults.denominator);
        let mut core = DroCore::new(model, self.store, self.sink);
        if self.cfg.load_calibration {
            let report = core.load_calibration();
            tracing::debug!(?report, "calibration load");
        } else {
            core.publish_all();
        }

        let (tx, rx) = event_queue(self.cfg.queue_capacity);
        let period = self.cfg.period();
        tracing::info!(
            numerator = core.model().numerator(),
            denominator = core.model().denominator(),
            period_us = period.as_micros() as u64,
            "readout loop built"
        );
        let lp = ControlLoop {
            counter: self.counter,
            core,
            events: rx,
            dispatcher: Dispatcher::new(),
            clock: self.clock.unwrap_or_else(|| Box::new(MonotonicClock::new())),
            period,
            last_count: None,
            counter_failing: false,
            stats: LoopStats::default(),
        };
        Ok((lp, tx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{MemoryStore, NullSink, SeqCounter};

    #[test]
    fn zero_rate_is_rejected() {
        let err = LoopBuilder::new()
            .with_counter(SeqCounter::new([0]))
            .with_store(MemoryStore::zeroed())
            .with_sink(NullSink)
            .with_config(LoopCfg {
                sample_rate_hz: 0,
                ..LoopCfg::default()
            })
            .build()
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BuildError>(),
            Some(BuildError::InvalidConfig(msg)) if msg.contains("sample_rate_hz")
        ));
    }

    #[test]
    fn defaults_apply_when_load_is_disabled() {
        let (lp, _tx) = LoopBuilder::new()
            .with_counter(SeqCounter::new([0]))
            .with_store(MemoryStore::zeroed())
            .with_sink(NullSink)
            .with_config(LoopCfg {
                load_calibration: false,
                ..LoopCfg::default()
            })
            .with_calibration(CalibrationDefaults {
                numerator: 5,
                denominator: 8,
            })
            .build()
            .unwrap();
        assert_eq!(lp.core().model().numerator(), 5);
        assert_eq!(lp.core().model().denominator(), 8);
        assert_eq!(lp.core().store().writes(), 0);
    }

    #[test]
    fn built_loop_debug_shows_core_and_stats() {
        let (lp, _tx) = LoopBuilder::new()
            .with_counter(SeqCounter::new([0]))
            .with_store(MemoryStore::zeroed())
            .with_sink(NullSink)
            .build()
            .unwrap();
        let s = format!("{lp:?}");
        assert!(s.starts_with("ControlLoop"), "{s}");
        assert!(s.contains("DroCore"), "{s}");
        assert!(s.contains("stats"), "{s}");
    }
}
