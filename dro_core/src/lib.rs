#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Position-tracking core for a quadrature-encoder digital readout.
//!
//! Hardware-independent. The counter, the calibration store and the
//! attribute transport are reached only through `dro_traits`.
//!
//! ## Architecture
//!
//! - **Model**: raw count to scaled, direction-corrected, re-zeroable
//!   position (`position`)
//! - **Attributes**: the remote-facing table, wire encoding and write
//!   decoding (`attribute`)
//! - **Calibration**: persisting and reloading the scale fraction
//!   (`calibration`)
//! - **Core**: model plus store plus sink; every mutation persists and
//!   publishes what changed (`core`)
//! - **Dispatch**: inbound writes to exactly one mutator (`dispatch`)
//! - **Loop**: poll, drain the event queue, sleep (`runner`, `builder`)
//!
//! ## Arithmetic
//!
//! `position = sign * raw * numerator / denominator + offset`, evaluated in
//! `i64` with truncation toward zero and saturated to `i32`. See
//! `fixed_point`.

pub mod attribute;
pub mod builder;
pub mod calibration;
pub mod config;
pub mod conversions;
pub mod core;
pub mod dispatch;
pub mod error;
pub mod fixed_point;
pub mod hw_error;
pub mod mocks;
pub mod position;
pub mod queue;
pub mod runner;

pub use crate::attribute::{
    ATTRIBUTES, AttributeDescriptor, AttributeId, AttributeValue, AttributeWrite, Payload,
    SERVICE_UUID, decode_write, format_uuid,
};
pub use crate::builder::LoopBuilder;
pub use crate::calibration::{CalibrationSlot, LoadReport, SlotLoad};
pub use crate::config::{CalibrationDefaults, LoopCfg};
pub use crate::core::DroCore;
pub use crate::dispatch::{Dispatched, Dispatcher};
pub use crate::error::{BuildError, DroError, Report, Result};
pub use crate::position::{Direction, Outcome, PositionModel, Rejection};
pub use crate::queue::{EventReceiver, EventSender, TransportEvent, event_queue};
pub use crate::runner::{ControlLoop, LoopStats};
