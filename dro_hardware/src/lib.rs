//! Counter, NVM and transport adapters for the readout.
//!
//! Everything here is reachable without hardware except the LS7366R
//! driver, which needs the `hardware` feature (rppal SPI on Linux).

pub mod error;
#[cfg(feature = "hardware")]
pub mod ls7366;
pub mod store;
pub mod util;

use dro_traits::{AttributeSink, BoxError, Counter};

pub use store::FileStore;

/// Software counter: advances by `step` on every read.
#[derive(Debug, Clone)]
pub struct SimulatedCounter {
    value: i32,
    step: i32,
}

impl SimulatedCounter {
    pub fn new(start: i32, step: i32) -> Self {
        Self { value: start, step }
    }

    pub fn value(&self) -> i32 {
        self.value
    }
}

impl Counter for SimulatedCounter {
    fn read(&mut self) -> Result<i32, BoxError> {
        self.value = self.value.wrapping_add(self.step);
        tracing::trace!(count = self.value, "simulated count");
        Ok(self.value)
    }

    fn clear(&mut self) -> Result<(), BoxError> {
        self.value = 0;
        Ok(())
    }
}

/// Attribute sink with no radio behind it: values go to the log.
#[derive(Debug, Default)]
pub struct LogSink {
    published: u64,
}

impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn published(&self) -> u64 {
        self.published
    }
}

impl AttributeSink for LogSink {
    fn set_value(&mut self, handle: u8, bytes: &[u8]) -> Result<(), BoxError> {
        self.published += 1;
        tracing::debug!(handle, ?bytes, "attribute value");
        Ok(())
    }
}

#[cfg(feature = "hardware")]
pub mod hardware {
    pub use crate::ls7366::{HardwareCounter, Ls7366};
}
