//! Conversions from the TOML schema (`dro_config`) into runtime config.

use crate::config::{CalibrationDefaults, LoopCfg};

impl From<&dro_config::Config> for LoopCfg {
    fn from(c: &dro_config::Config) -> Self {
        Self {
            sample_rate_hz: c.runner.sample_rate_hz,
            queue_capacity: c.runner.queue_capacity,
            load_calibration: c.calibration.load_from_store,
        }
    }
}

impl From<&dro_config::CalibrationCfg> for CalibrationDefaults {
    fn from(c: &dro_config::CalibrationCfg) -> Self {
        Self {
            numerator: c.numerator,
            denominator: c.denominator,
        }
    }
}
