#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema and write-script parsing for the readout.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - The write-script CSV loader enforces headers and tick ordering so a
//!   simulated session replays remote writes deterministically.
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Device {
    /// Advertised device name.
    pub name: String,
}

impl Default for Device {
    fn default() -> Self {
        Self {
            name: "BlueDRO".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CounterKind {
    /// Software ramp; no hardware needed.
    #[default]
    Simulated,
    /// LS7366R quadrature counter over SPI (requires the `hardware` feature).
    Ls7366,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CounterCfg {
    pub kind: CounterKind,
    /// Simulated counter: counts added per poll (may be negative).
    pub sim_step: i32,
    /// Simulated counter: value before the first poll.
    pub sim_start: i32,
}

impl Default for CounterCfg {
    fn default() -> Self {
        Self {
            kind: CounterKind::Simulated,
            sim_step: 1,
            sim_start: 0,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CalibrationCfg {
    /// Scale numerator used until (or unless) the store provides one.
    pub numerator: u16,
    pub denominator: u16,
    /// Load numerator/denominator from the store at startup.
    pub load_from_store: bool,
}

impl Default for CalibrationCfg {
    fn default() -> Self {
        Self {
            numerator: 1,
            denominator: 1,
            load_from_store: true,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StoreCfg {
    /// NVM image file backing the calibration store.
    pub path: String,
    /// Image size in bytes; must hold both 32-bit calibration slots.
    #[serde(default = "default_store_size")]
    pub size: usize,
}

fn default_store_size() -> usize {
    256
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RunnerCfg {
    /// Counter polls per second.
    pub sample_rate_hz: u32,
    /// Inbound event queue capacity.
    pub queue_capacity: usize,
}

impl Default for RunnerCfg {
    fn default() -> Self {
        Self {
            sample_rate_hz: 200,
            queue_capacity: 64,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Hardware {
    /// SPI bus index for the LS7366R.
    pub spi_bus: u8,
    /// Hardware chip-select line on that bus.
    pub slave_select: u8,
    pub spi_clock_hz: u32,
}

impl Default for Hardware {
    fn default() -> Self {
        Self {
            spi_bus: 0,
            slave_select: 0,
            spi_clock_hz: 1_000_000,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub device: Device,
    #[serde(default)]
    pub counter: CounterCfg,
    #[serde(default)]
    pub calibration: CalibrationCfg,
    pub store: StoreCfg,
    #[serde(default)]
    pub runner: RunnerCfg,
    #[serde(default)]
    pub logging: Logging,
    #[serde(default)]
    pub hardware: Hardware,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Byte offset just past the denominator slot.
const CALIBRATION_SLOTS_END: usize = 8;

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        if self.device.name.trim().is_empty() {
            eyre::bail!("device.name must not be empty");
        }

        // Calibration
        if self.calibration.numerator == 0 {
            eyre::bail!("calibration.numerator must be > 0");
        }
        if self.calibration.denominator == 0 {
            eyre::bail!("calibration.denominator must be > 0");
        }

        // Store
        if self.store.path.trim().is_empty() {
            eyre::bail!("store.path must not be empty");
        }
        if self.store.size < CALIBRATION_SLOTS_END {
            eyre::bail!(
                "store.size must be >= {CALIBRATION_SLOTS_END} bytes to hold both calibration slots"
            );
        }
        if self.store.size > 64 * 1024 {
            eyre::bail!("store.size is unreasonably large (>64 KiB)");
        }

        // Runner
        if self.runner.sample_rate_hz == 0 {
            eyre::bail!("runner.sample_rate_hz must be > 0");
        }
        if self.runner.sample_rate_hz > 100_000 {
            eyre::bail!("runner.sample_rate_hz is unreasonably large (>100 kHz)");
        }
        if self.runner.queue_capacity == 0 {
            eyre::bail!("runner.queue_capacity must be >= 1");
        }

        // Hardware
        if self.hardware.spi_clock_hz == 0 {
            eyre::bail!("hardware.spi_clock_hz must be > 0");
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly, got '{rot}'");
        }

        Ok(())
    }
}

/// One scripted remote write.
///
/// Expected headers:
/// tick,attribute,value
///
/// Example:
/// tick,attribute,value
/// 10,numerator,2
/// 25,set_position,0
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ScriptRow {
    /// Loop iteration before which the write is enqueued.
    pub tick: u64,
    pub attribute: String,
    pub value: String,
}

pub fn load_write_script(path: &std::path::Path) -> eyre::Result<Vec<ScriptRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| eyre::eyre!("open write script {:?}: {}", path, e))?;

    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read CSV headers {:?}: {}", path, e))?
        .clone();
    let expected = ["tick", "attribute", "value"];
    let actual: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
    if actual != expected {
        eyre::bail!(
            "write script CSV must have headers 'tick,attribute,value', got: {}",
            actual.join(",")
        );
    }

    let mut rows: Vec<ScriptRow> = Vec::new();
    for (idx, rec) in rdr.deserialize::<ScriptRow>().enumerate() {
        let row = rec.map_err(|e| eyre::eyre!("invalid CSV row {}: {}", idx + 2, e))?;
        if row.attribute.is_empty() {
            eyre::bail!("invalid CSV row {}: empty attribute", idx + 2);
        }
        if let Some(prev) = rows.last()
            && row.tick < prev.tick
        {
            eyre::bail!(
                "write script ticks must be non-decreasing (row {}: {} after {})",
                idx + 2,
                row.tick,
                prev.tick
            );
        }
        rows.push(row);
    }
    Ok(rows)
}
