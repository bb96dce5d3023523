//! The cooperative readout loop.
//!
//! Each iteration (a) polls the counter and updates the model only when the
//! count moved, (b) drains queued transport events through the dispatcher,
//! (c) sleeps for the loop period. Nothing here blocks except that sleep.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use dro_traits::{AttributeSink, CalibrationStore, Clock, Counter};

use crate::core::DroCore;
use crate::dispatch::{Dispatched, Dispatcher};
use crate::error::{DroError, Result};
use crate::hw_error::{Source, map_hw_error};
use crate::queue::EventReceiver;

/// Counters accumulated over the life of a loop.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoopStats {
    pub iterations: u64,
    /// Samples that differed from the previous one and reached `update`.
    pub updates: u64,
    pub counter_errors: u64,
    pub events: u64,
    pub writes_applied: u64,
    /// Calibration writes refused by the model.
    pub writes_rejected: u64,
    /// Writes that failed to decode or addressed an unknown/read-only attribute.
    pub writes_invalid: u64,
}

pub struct ControlLoop<C, St, Sk>
where
    C: Counter,
    St: CalibrationStore,
    Sk: AttributeSink,
{
    pub(crate) counter: C,
    pub(crate) core: DroCore<St, Sk>,
    pub(crate) events: EventReceiver,
    pub(crate) dispatcher: Dispatcher,
    pub(crate) clock: Box<dyn Clock>,
    pub(crate) period: Duration,
    pub(crate) last_count: Option<i32>,
    pub(crate) counter_failing: bool,
    pub(crate) stats: LoopStats,
}

impl<C, St, Sk> std::fmt::Debug for ControlLoop<C, St, Sk>
where
    C: Counter,
    St: CalibrationStore,
    Sk: AttributeSink,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlLoop")
            .field("core", &self.core)
            .field("period", &self.period)
            .field("last_count", &self.last_count)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl<C, St, Sk> ControlLoop<C, St, Sk>
where
    C: Counter,
    St: CalibrationStore,
    Sk: AttributeSink,
{
    /// One pass: sample, then drain events. Does not sleep.
    pub fn step(&mut self) {
        self.stats.iterations += 1;
        self.sample();
        self.drain_events();
    }

    fn sample(&mut self) {
        let read = self.counter.read();
        if read.is_ok() && self.counter_failing {
            self.counter_failing = false;
            tracing::info!("counter reads recovered");
        }
        match read {
            Ok(count) if self.last_count == Some(count) => {}
            Ok(count) => {
                self.last_count = Some(count);
                let position = self.core.update(count);
                self.stats.updates += 1;
                tracing::trace!(count, position, "counter moved");
            }
            Err(e) => {
                self.stats.counter_errors += 1;
                let err = map_hw_error(Source::Counter, e.as_ref());
                if self.counter_failing {
                    tracing::debug!(error = %err, "counter still failing");
                } else {
                    self.counter_failing = true;
                    tracing::warn!(error = %err, "counter read failed; keeping last position");
                }
            }
        }
    }

    fn drain_events(&mut self) {
        for ev in self.events.drain() {
            self.stats.events += 1;
            match self.dispatcher.handle_event(&mut self.core, &ev) {
                Ok(Some(d)) if d.is_applied() => self.stats.writes_applied += 1,
                Ok(Some(_)) => self.stats.writes_rejected += 1,
                Ok(None) => {}
                Err(_) => self.stats.writes_invalid += 1,
            }
        }
    }

    /// Run `iterations` steps, sleeping one period after each.
    pub fn run_for(&mut self, iterations: u64) -> LoopStats {
        for _ in 0..iterations {
            self.step();
            self.clock.sleep(self.period);
        }
        self.stats
    }

    /// Run until `shutdown` is set; checked once per iteration.
    pub fn run_until(&mut self, shutdown: &AtomicBool) -> LoopStats {
        tracing::info!(period_us = self.period.as_micros() as u64, "readout loop start");
        while !shutdown.load(Ordering::Relaxed) {
            self.step();
            self.clock.sleep(self.period);
        }
        tracing::info!(iterations = self.stats.iterations, "readout loop stop");
        self.stats
    }

    /// Zero the hardware counter and re-read it on the next step.
    pub fn clear_counter(&mut self) -> Result<()> {
        self.counter
            .clear()
            .map_err(|e| eyre::Report::new(map_hw_error(Source::Counter, e.as_ref())))?;
        self.last_count = None;
        tracing::info!("counter cleared");
        Ok(())
    }

    /// Apply a write directly, bypassing the queue (for the loop's own thread).
    pub fn dispatch(
        &mut self,
        handle: u8,
        payload: &[u8],
    ) -> std::result::Result<Dispatched, DroError> {
        self.dispatcher.dispatch(&mut self.core, handle, payload)
    }

    pub fn core(&self) -> &DroCore<St, Sk> {
        &self.core
    }

    pub fn core_mut(&mut self) -> &mut DroCore<St, Sk> {
        &mut self.core
    }

    pub fn stats(&self) -> LoopStats {
        self.stats
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn into_core(self) -> DroCore<St, Sk> {
        self.core
    }
}
