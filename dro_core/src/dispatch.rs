//! Stateless router from inbound attribute writes to `DroCore` mutators.

use dro_traits::{AttributeSink, CalibrationStore};

use crate::attribute::{
    ATTRIBUTES, AttributeDescriptor, AttributeId, AttributeValue, AttributeWrite, Payload,
    decode_write,
};
use crate::core::DroCore;
use crate::error::DroError;
use crate::position::{Direction, Outcome};
use crate::queue::TransportEvent;

/// What a successfully decoded write did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatched {
    Numerator(Outcome),
    Denominator(Outcome),
    Direction(Direction),
    Position(i32),
}

impl Dispatched {
    /// False only for calibration writes the model refused.
    pub fn is_applied(self) -> bool {
        match self {
            Dispatched::Numerator(o) | Dispatched::Denominator(o) => o.is_applied(),
            Dispatched::Direction(_) | Dispatched::Position(_) => true,
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Dispatcher;

impl Dispatcher {
    pub fn new() -> Self {
        Self
    }

    pub fn table(&self) -> &'static [AttributeDescriptor] {
        &ATTRIBUTES
    }

    /// Decode `payload` for `handle` and invoke exactly one mutator.
    ///
    /// Unknown handles, read-only targets and malformed payloads return an
    /// error and leave the core untouched.
    pub fn dispatch<St, Sk>(
        &self,
        core: &mut DroCore<St, Sk>,
        handle: u8,
        payload: &[u8],
    ) -> Result<Dispatched, DroError>
    where
        St: CalibrationStore,
        Sk: AttributeSink,
    {
        let write = AttributeId::try_from(handle)
            .and_then(|id| decode_write(id, payload))
            .inspect_err(|e| {
                tracing::warn!(handle, len = payload.len(), error = %e, "write ignored");
            })?;
        Ok(self.apply(core, write))
    }

    /// Apply an already decoded write.
    pub fn apply<St, Sk>(&self, core: &mut DroCore<St, Sk>, write: AttributeWrite) -> Dispatched
    where
        St: CalibrationStore,
        Sk: AttributeSink,
    {
        tracing::debug!(attribute = write.id().name(), write = ?write, "dispatch");
        match write {
            AttributeWrite::Numerator(n) => Dispatched::Numerator(core.set_numerator(n)),
            AttributeWrite::Denominator(d) => Dispatched::Denominator(core.set_denominator(d)),
            // Any write toggles; the written value is not a target state.
            AttributeWrite::ReverseDirection(_) => Dispatched::Direction(core.toggle_direction()),
            AttributeWrite::SetPosition(p) => Dispatched::Position(core.set_position(p)),
        }
    }

    /// Route one transport event. Connection changes are acknowledged only.
    pub fn handle_event<St, Sk>(
        &self,
        core: &mut DroCore<St, Sk>,
        event: &TransportEvent,
    ) -> Result<Option<Dispatched>, DroError>
    where
        St: CalibrationStore,
        Sk: AttributeSink,
    {
        match event {
            TransportEvent::Connected => {
                tracing::info!("remote connected");
                Ok(None)
            }
            TransportEvent::Disconnected => {
                tracing::info!("remote disconnected");
                Ok(None)
            }
            TransportEvent::Write { handle, payload } => {
                self.dispatch(core, *handle, payload).map(Some)
            }
        }
    }

    /// Serve a remote read. `None` for unknown or write-only attributes.
    pub fn read<St, Sk>(&self, core: &DroCore<St, Sk>, handle: u8) -> Option<Payload>
    where
        St: CalibrationStore,
        Sk: AttributeSink,
    {
        let id = AttributeId::try_from(handle).ok()?;
        if !id.descriptor().access.read {
            return None;
        }
        let m = core.model();
        let value = match id {
            AttributeId::Position => AttributeValue::Position(m.position()),
            AttributeId::Numerator => AttributeValue::Numerator(m.numerator()),
            AttributeId::Denominator => AttributeValue::Denominator(m.denominator()),
            AttributeId::ReverseDirection => {
                AttributeValue::ReverseDirection(m.direction().is_reversed())
            }
            AttributeId::SetPosition => return None,
        };
        Some(value.encode())
    }
}
