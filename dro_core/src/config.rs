//! Runtime configuration for the readout loop.
//!
//! Separate from the TOML schema in `dro_config`; see `conversions`.

use std::time::Duration;

/// Control-loop pacing and queue sizing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopCfg {
    /// Counter polls per second; drives the sleep between iterations.
    pub sample_rate_hz: u32,
    /// Inbound event queue capacity.
    pub queue_capacity: usize,
    /// Load numerator/denominator from the store at build time.
    pub load_calibration: bool,
}

impl Default for LoopCfg {
    fn default() -> Self {
        Self {
            sample_rate_hz: 200,
            queue_capacity: 64,
            load_calibration: true,
        }
    }
}

impl LoopCfg {
    /// Sleep between iterations; zero rate is clamped to 1 Hz.
    pub fn period(&self) -> Duration {
        Duration::from_micros((1_000_000 / u64::from(self.sample_rate_hz.max(1))).max(1))
    }
}

/// Scale fraction used before (or instead of) the stored calibration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalibrationDefaults {
    pub numerator: u16,
    pub denominator: u16,
}

impl Default for CalibrationDefaults {
    fn default() -> Self {
        Self {
            numerator: 1,
            denominator: 1,
        }
    }
}
