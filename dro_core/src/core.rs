//! `DroCore`: the position model wired to its store and attribute sink.
//!
//! Every mutator here runs the model transition, writes calibration through
//! to the store, and republishes whichever attributes changed. Store and
//! sink failures are logged and never roll back the in-memory state.

use dro_traits::{AttributeSink, CalibrationStore};

use crate::attribute::AttributeValue;
use crate::calibration::{self, CalibrationSlot, LoadReport};
use crate::hw_error::{Source, map_hw_error};
use crate::position::{Direction, Outcome, PositionModel};

pub struct DroCore<St: CalibrationStore, Sk: AttributeSink> {
    model: PositionModel,
    store: St,
    sink: Sk,
}

impl<St: CalibrationStore, Sk: AttributeSink> std::fmt::Debug for DroCore<St, Sk> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DroCore")
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl<St: CalibrationStore, Sk: AttributeSink> DroCore<St, Sk> {
    pub fn new(model: PositionModel, store: St, sink: Sk) -> Self {
        Self { model, store, sink }
    }

    /// Pull numerator and denominator from the store, then publish the
    /// resulting state.
    pub fn load_calibration(&mut self) -> LoadReport {
        let report = calibration::load_calibration(&mut self.model, &mut self.store);
        self.publish_all();
        report
    }

    /// Push every readable attribute so remote reads see current values.
    pub fn publish_all(&mut self) {
        self.publish(AttributeValue::Position(self.model.position()));
        self.publish(AttributeValue::Numerator(self.model.numerator()));
        self.publish(AttributeValue::Denominator(self.model.denominator()));
        self.publish(AttributeValue::ReverseDirection(
            self.model.direction().is_reversed(),
        ));
    }

    #[inline]
    pub fn update(&mut self, raw_count: i32) -> i32 {
        let p = self.model.update(raw_count);
        self.publish(AttributeValue::Position(p));
        p
    }

    pub fn set_position(&mut self, p: i32) -> i32 {
        let pos = self.model.set_position(p);
        tracing::info!(position = pos, offset = self.model.offset(), "position re-anchored");
        self.publish(AttributeValue::Position(pos));
        pos
    }

    pub fn set_numerator(&mut self, n: u16) -> Outcome {
        let outcome = self.model.set_numerator(n);
        if outcome.is_applied() {
            self.calibration_changed(CalibrationSlot::Numerator, n);
        }
        outcome
    }

    pub fn set_denominator(&mut self, d: u16) -> Outcome {
        let outcome = self.model.set_denominator(d);
        if outcome.is_applied() {
            self.calibration_changed(CalibrationSlot::Denominator, d);
        }
        outcome
    }

    pub fn toggle_direction(&mut self) -> Direction {
        let dir = self.model.toggle_direction();
        tracing::info!(reversed = dir.is_reversed(), "direction toggled");
        self.publish(AttributeValue::ReverseDirection(dir.is_reversed()));
        self.publish(AttributeValue::Position(self.model.position()));
        dir
    }

    fn calibration_changed(&mut self, slot: CalibrationSlot, value: u16) {
        tracing::info!(slot = slot.name(), value, "calibration updated");
        // Logged inside persist; the in-memory value stands regardless.
        let _ = calibration::persist(&mut self.store, slot, value);
        self.publish(match slot {
            CalibrationSlot::Numerator => AttributeValue::Numerator(value),
            CalibrationSlot::Denominator => AttributeValue::Denominator(value),
        });
        self.publish(AttributeValue::Position(self.model.position()));
    }

    fn publish(&mut self, value: AttributeValue) {
        let id = value.id();
        let payload = value.encode();
        match self.sink.set_value(id.handle(), payload.as_bytes()) {
            Ok(()) => tracing::trace!(attribute = id.name(), value = ?value, "published"),
            Err(e) => {
                let err = map_hw_error(Source::Transport, e.as_ref());
                tracing::warn!(attribute = id.name(), error = %err, "publish failed");
            }
        }
    }

    #[inline]
    pub fn model(&self) -> &PositionModel {
        &self.model
    }

    pub fn store(&self) -> &St {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut St {
        &mut self.store
    }

    pub fn sink(&self) -> &Sk {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut Sk {
        &mut self.sink
    }

    pub fn into_parts(self) -> (PositionModel, St, Sk) {
        (self.model, self.store, self.sink)
    }
}
