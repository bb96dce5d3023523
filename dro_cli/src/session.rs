//! Hardware assembly and the command bodies behind `run`, `show` and `write`.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use dro_config::{Config, CounterKind, ScriptRow};
use dro_core::calibration::CalibrationSlot;
use dro_core::error::Result as CoreResult;
use dro_core::mocks::MemoryStore;
use dro_core::{
    AttributeId, AttributeWrite, CalibrationDefaults, Dispatched, Dispatcher, DroCore, DroError,
    LoopBuilder, LoopCfg, LoopStats, Outcome, PositionModel, TransportEvent,
};
use dro_hardware::{FileStore, LogSink, SimulatedCounter};
use dro_traits::{CalibrationStore, Counter};
use eyre::WrapErr;

/// Active model state, as printed by every command.
#[derive(Debug, Clone, Copy)]
pub struct Snapshot {
    pub position: i32,
    pub numerator: u16,
    pub denominator: u16,
    pub reversed: bool,
    pub offset: i64,
}

impl From<&PositionModel> for Snapshot {
    fn from(m: &PositionModel) -> Self {
        Self {
            position: m.position(),
            numerator: m.numerator(),
            denominator: m.denominator(),
            reversed: m.direction().is_reversed(),
            offset: m.offset(),
        }
    }
}

impl Snapshot {
    pub fn to_json(self) -> serde_json::Value {
        serde_json::json!({
            "position": self.position,
            "numerator": self.numerator,
            "denominator": self.denominator,
            "reversed": self.reversed,
            "offset": self.offset,
        })
    }
}

impl std::fmt::Display for Snapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "position={} numerator={} denominator={} reversed={} offset={}",
            self.position, self.numerator, self.denominator, self.reversed, self.offset
        )
    }
}

pub fn stats_json(s: &LoopStats) -> serde_json::Value {
    serde_json::json!({
        "iterations": s.iterations,
        "updates": s.updates,
        "counter_errors": s.counter_errors,
        "events": s.events,
        "writes_applied": s.writes_applied,
        "writes_rejected": s.writes_rejected,
        "writes_invalid": s.writes_invalid,
    })
}

pub fn make_counter(cfg: &Config) -> eyre::Result<Box<dyn Counter>> {
    match cfg.counter.kind {
        CounterKind::Simulated => Ok(Box::new(SimulatedCounter::new(
            cfg.counter.sim_start,
            cfg.counter.sim_step,
        ))),
        #[cfg(feature = "hardware")]
        CounterKind::Ls7366 => {
            let hw = dro_hardware::hardware::HardwareCounter::try_new(
                cfg.hardware.spi_bus,
                cfg.hardware.slave_select,
                cfg.hardware.spi_clock_hz,
            )
            .wrap_err("open ls7366")?;
            Ok(Box::new(hw))
        }
        #[cfg(not(feature = "hardware"))]
        CounterKind::Ls7366 => {
            eyre::bail!("counter.kind = \"ls7366\" requires building with --features hardware")
        }
    }
}

pub fn open_store(cfg: &Config) -> eyre::Result<FileStore> {
    FileStore::open(&cfg.store.path, cfg.store.size)
        .wrap_err_with(|| format!("open nvm image {}", cfg.store.path))
}

/// Resolve every script row into a transport event up front, so a typo
/// fails before the loop starts rather than halfway through.
fn script_events(rows: &[ScriptRow]) -> eyre::Result<Vec<(u64, TransportEvent)>> {
    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            let id: AttributeId = row
                .attribute
                .parse()
                .map_err(|e: String| eyre::eyre!("script row {}: {e}", i + 2))?;
            let write = AttributeWrite::parse(id, &row.value)
                .wrap_err_with(|| format!("script row {}", i + 2))?;
            Ok((
                row.tick,
                TransportEvent::write(id.handle(), write.encode().as_bytes()),
            ))
        })
        .collect()
}

pub struct RunOptions<'a> {
    pub iterations: Option<u64>,
    pub script: Option<&'a Path>,
    pub clear_counter: bool,
}

pub fn run(
    cfg: &Config,
    counter: impl Counter,
    opts: &RunOptions<'_>,
    shutdown: Arc<AtomicBool>,
) -> CoreResult<(Snapshot, LoopStats)> {
    let script = match opts.script {
        Some(path) => script_events(&dro_config::load_write_script(path)?)?,
        None => Vec::new(),
    };

    let loop_cfg: LoopCfg = cfg.into();
    let defaults: CalibrationDefaults = (&cfg.calibration).into();
    let (mut lp, tx) = LoopBuilder::new()
        .with_counter(counter)
        .with_store(open_store(cfg)?)
        .with_sink(LogSink::new())
        .with_config(loop_cfg)
        .with_calibration(defaults)
        .build()?;

    if opts.clear_counter {
        lp.clear_counter()?;
    }

    let stats = if script.is_empty() && opts.iterations.is_none() {
        lp.run_until(&shutdown)
    } else {
        let mut pending = script.into_iter().peekable();
        let mut tick = 0u64;
        while !shutdown.load(Ordering::Relaxed) && opts.iterations.is_none_or(|n| tick < n) {
            while let Some((_, ev)) = pending.next_if(|(at, _)| *at <= tick) {
                tx.push(ev);
            }
            lp.run_for(1);
            tick += 1;
        }
        lp.stats()
    };

    Ok((Snapshot::from(lp.core().model()), stats))
}

/// Stored slot contents next to what a fresh start would adopt.
#[derive(Debug, Clone, Copy)]
pub struct ShowReport {
    pub stored_numerator: i32,
    pub stored_denominator: i32,
    pub active: Snapshot,
}

/// Read the calibration without touching the image: the load runs against an
/// in-memory copy so uninitialised slots are not written back.
pub fn show(cfg: &Config) -> eyre::Result<ShowReport> {
    let mut store = open_store(cfg)?;
    let mut copy = MemoryStore::empty();
    let mut stored = [0i32; 2];
    for (slot, out) in CalibrationSlot::ALL.into_iter().zip(stored.iter_mut()) {
        let v = store
            .read(slot.offset())
            .map_err(|e| DroError::Store(e.to_string()))?
            .unwrap_or(0);
        copy.put(slot.offset(), v);
        *out = v;
    }

    let defaults: CalibrationDefaults = (&cfg.calibration).into();
    let mut model = PositionModel::with_scale(defaults.numerator, defaults.denominator);
    if cfg.calibration.load_from_store {
        let report = dro_core::calibration::load_calibration(&mut model, &mut copy);
        tracing::debug!(?report, "calibration preview");
    }
    Ok(ShowReport {
        stored_numerator: stored[0],
        stored_denominator: stored[1],
        active: Snapshot::from(&model),
    })
}

/// Decode and apply one write as if it had arrived from the remote peer.
pub fn write(cfg: &Config, attribute: &str, value: &str) -> CoreResult<(Dispatched, Snapshot)> {
    let id: AttributeId = attribute.parse().map_err(|e: String| eyre::eyre!(e))?;
    let write = AttributeWrite::parse(id, value)?;
    let payload = write.encode();

    let defaults: CalibrationDefaults = (&cfg.calibration).into();
    let mut core = DroCore::new(
        PositionModel::with_scale(defaults.numerator, defaults.denominator),
        open_store(cfg)?,
        LogSink::new(),
    );
    if cfg.calibration.load_from_store {
        core.load_calibration();
    }

    let done = Dispatcher::new().dispatch(&mut core, id.handle(), payload.as_bytes())?;
    match done {
        Dispatched::Numerator(Outcome::Rejected(r))
        | Dispatched::Denominator(Outcome::Rejected(r)) => {
            Err(DroError::InvalidCalibration(r.to_string()).into())
        }
        _ => Ok((done, Snapshot::from(core.model()))),
    }
}

/// Open the counter and store, take one sample, and report.
pub fn self_check(cfg: &Config) -> eyre::Result<(i32, usize)> {
    let mut counter = make_counter(cfg)?;
    let count = counter
        .read()
        .map_err(|e| DroError::Counter(e.to_string()))
        .wrap_err("counter read")?;
    let store = open_store(cfg)?;
    Ok((count, store.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(tick: u64, attribute: &str, value: &str) -> ScriptRow {
        ScriptRow {
            tick,
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    #[test]
    fn script_rows_become_encoded_writes() {
        let evs = script_events(&[row(3, "numerator", "2"), row(4, "set-position", "-5")]).unwrap();
        assert_eq!(evs[0], (3, TransportEvent::write(2, vec![2u8, 0])));
        assert_eq!(
            evs[1],
            (4, TransportEvent::write(5, (-5i32).to_le_bytes().to_vec()))
        );
    }

    #[test]
    fn script_with_unknown_attribute_fails_early() {
        let err = script_events(&[row(0, "speed", "1")]).unwrap_err();
        assert!(format!("{err}").contains("unknown attribute"));
    }

    #[test]
    fn snapshot_line_is_stable() {
        let mut m = PositionModel::with_scale(2, 1);
        m.update(10);
        assert_eq!(
            Snapshot::from(&m).to_string(),
            "position=20 numerator=2 denominator=1 reversed=false offset=0"
        );
    }
}
