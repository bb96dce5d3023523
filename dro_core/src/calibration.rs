//! Calibration persistence contract.
//!
//! Numerator and denominator each occupy a 32-bit slot of the store. A slot
//! reading back zero (or anything outside `1..=u16::MAX`) is uninitialised:
//! the in-memory default is written back rather than adopted.

use dro_traits::CalibrationStore;

use crate::error::DroError;
use crate::hw_error::{Source, map_hw_error};
use crate::position::PositionModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationSlot {
    Numerator,
    Denominator,
}

impl CalibrationSlot {
    pub const ALL: [CalibrationSlot; 2] = [CalibrationSlot::Numerator, CalibrationSlot::Denominator];

    #[inline]
    pub const fn offset(self) -> u16 {
        match self {
            CalibrationSlot::Numerator => 0,
            CalibrationSlot::Denominator => 4,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            CalibrationSlot::Numerator => "numerator",
            CalibrationSlot::Denominator => "denominator",
        }
    }

    fn current(self, model: &PositionModel) -> u16 {
        match self {
            CalibrationSlot::Numerator => model.numerator(),
            CalibrationSlot::Denominator => model.denominator(),
        }
    }
}

/// What happened to one slot during startup load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotLoad {
    /// A valid stored value was adopted.
    Loaded(u16),
    /// Slot was uninitialised; the default was written back.
    Initialised(u16),
    /// Slot was uninitialised and the write-back failed; default kept.
    InitialiseFailed(DroError),
    /// Store holds nothing for this slot; default kept.
    Missing,
    /// Store read failed; default kept.
    ReadFailed(DroError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub numerator: SlotLoad,
    pub denominator: SlotLoad,
}

/// Read both slots into `model`. Never fails: every problem degrades to
/// keeping the current value and is reported per slot.
pub fn load_calibration<S: CalibrationStore + ?Sized>(
    model: &mut PositionModel,
    store: &mut S,
) -> LoadReport {
    let numerator = load_slot(model, store, CalibrationSlot::Numerator);
    let denominator = load_slot(model, store, CalibrationSlot::Denominator);
    LoadReport {
        numerator,
        denominator,
    }
}

fn load_slot<S: CalibrationStore + ?Sized>(
    model: &mut PositionModel,
    store: &mut S,
    slot: CalibrationSlot,
) -> SlotLoad {
    let stored = match store.read(slot.offset()) {
        Ok(v) => v,
        Err(e) => {
            let err = map_hw_error(Source::Store, e.as_ref());
            tracing::warn!(slot = slot.name(), error = %err, "calibration read failed; keeping default");
            return SlotLoad::ReadFailed(err);
        }
    };
    let Some(raw) = stored else {
        tracing::warn!(slot = slot.name(), "calibration slot empty; keeping default");
        return SlotLoad::Missing;
    };

    match u16::try_from(raw) {
        Ok(v) if v > 0 => {
            let _ = match slot {
                CalibrationSlot::Numerator => model.set_numerator(v),
                CalibrationSlot::Denominator => model.set_denominator(v),
            };
            tracing::info!(slot = slot.name(), value = v, "calibration loaded");
            SlotLoad::Loaded(v)
        }
        _ => {
            let default = slot.current(model);
            if raw != 0 {
                tracing::warn!(slot = slot.name(), stored = raw, "stored calibration out of range");
            }
            match persist(store, slot, default) {
                Ok(()) => {
                    tracing::info!(slot = slot.name(), value = default, "calibration slot initialised");
                    SlotLoad::Initialised(default)
                }
                Err(err) => SlotLoad::InitialiseFailed(err),
            }
        }
    }
}

/// Write one slot through to the store. Failures are logged and returned;
/// the caller's in-memory value stays authoritative either way.
pub fn persist<S: CalibrationStore + ?Sized>(
    store: &mut S,
    slot: CalibrationSlot,
    value: u16,
) -> Result<(), DroError> {
    store
        .write(slot.offset(), i32::from(value))
        .map_err(|e| {
            let err = map_hw_error(Source::Store, e.as_ref());
            tracing::warn!(slot = slot.name(), value, error = %err, "calibration write failed");
            err
        })
}
