pub mod clock;

pub use clock::{Clock, ManualClock, MonotonicClock};

/// Error type crossing collaborator boundaries.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Quadrature counter polled once per loop iteration.
pub trait Counter {
    fn read(&mut self) -> Result<i32, BoxError>;

    /// Reset the hardware count to zero.
    fn clear(&mut self) -> Result<(), BoxError> {
        Err("counter does not support clear".into())
    }
}

/// Offset-addressed non-volatile store holding 32-bit calibration slots.
///
/// `read` returns `Ok(None)` when the slot has no value at all; a fresh
/// device typically reads back `Some(0)` instead.
pub trait CalibrationStore {
    fn read(&mut self, offset: u16) -> Result<Option<i32>, BoxError>;
    fn write(&mut self, offset: u16, value: i32) -> Result<(), BoxError>;
}

/// Outbound half of the attribute transport.
///
/// `handle` is the attribute's numeric identifier; `bytes` is the encoded
/// little-endian value.
pub trait AttributeSink {
    fn set_value(&mut self, handle: u8, bytes: &[u8]) -> Result<(), BoxError>;
}

impl<T: Counter + ?Sized> Counter for Box<T> {
    fn read(&mut self) -> Result<i32, BoxError> {
        (**self).read()
    }

    fn clear(&mut self) -> Result<(), BoxError> {
        (**self).clear()
    }
}

impl<T: CalibrationStore + ?Sized> CalibrationStore for Box<T> {
    fn read(&mut self, offset: u16) -> Result<Option<i32>, BoxError> {
        (**self).read(offset)
    }

    fn write(&mut self, offset: u16, value: i32) -> Result<(), BoxError> {
        (**self).write(offset, value)
    }
}

impl<T: AttributeSink + ?Sized> AttributeSink for Box<T> {
    fn set_value(&mut self, handle: u8, bytes: &[u8]) -> Result<(), BoxError> {
        (**self).set_value(handle, bytes)
    }
}

impl<T: CalibrationStore + ?Sized> CalibrationStore for &mut T {
    fn read(&mut self, offset: u16) -> Result<Option<i32>, BoxError> {
        (**self).read(offset)
    }

    fn write(&mut self, offset: u16, value: i32) -> Result<(), BoxError> {
        (**self).write(offset, value)
    }
}

impl<T: AttributeSink + ?Sized> AttributeSink for &mut T {
    fn set_value(&mut self, handle: u8, bytes: &[u8]) -> Result<(), BoxError> {
        (**self).set_value(handle, bytes)
    }
}
