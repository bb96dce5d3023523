//! LS7366R 32-bit quadrature counter on SPI.

use rppal::spi::{Bus, Mode, SlaveSelect, Spi};
use tracing::trace;

use dro_traits::{BoxError, Counter};

use crate::error::{HwError, Result};

// Instruction register opcodes: bits 7-6 select the op, bits 5-3 the register.
const CLR_CNTR: u8 = 0x20;
const CLR_STR: u8 = 0x30;
const RD_CNTR: u8 = 0x60;
const WR_MDR0: u8 = 0x88;
const WR_MDR1: u8 = 0x90;

/// MDR0: x4 quadrature, free-running, index disabled, filter clock / 1.
const MDR0_QUADRX4: u8 = 0x03;
/// MDR1: 4-byte counter, counting enabled, no flags.
const MDR1_4BYTE: u8 = 0x00;

pub struct Ls7366 {
    spi: Spi,
}

fn bus(index: u8) -> Result<Bus> {
    Ok(match index {
        0 => Bus::Spi0,
        1 => Bus::Spi1,
        2 => Bus::Spi2,
        3 => Bus::Spi3,
        4 => Bus::Spi4,
        5 => Bus::Spi5,
        6 => Bus::Spi6,
        other => return Err(HwError::Spi(format!("no SPI bus {other}"))),
    })
}

fn slave_select(index: u8) -> Result<SlaveSelect> {
    Ok(match index {
        0 => SlaveSelect::Ss0,
        1 => SlaveSelect::Ss1,
        2 => SlaveSelect::Ss2,
        other => return Err(HwError::Spi(format!("unsupported slave select {other}"))),
    })
}

fn spi_err(e: rppal::spi::Error) -> HwError {
    HwError::Spi(e.to_string())
}

impl Ls7366 {
    /// Open the device and program x4 quadrature mode with a 4-byte counter.
    pub fn new(bus_index: u8, ss: u8, clock_hz: u32) -> Result<Self> {
        let spi = Spi::new(bus(bus_index)?, slave_select(ss)?, clock_hz, Mode::Mode0)
            .map_err(spi_err)?;
        let mut dev = Self { spi };
        dev.command(&[WR_MDR0, MDR0_QUADRX4])?;
        dev.command(&[WR_MDR1, MDR1_4BYTE])?;
        dev.command(&[CLR_CNTR])?;
        dev.command(&[CLR_STR])?;
        tracing::info!(bus = bus_index, ss, clock_hz, "ls7366 configured");
        Ok(dev)
    }

    fn command(&mut self, bytes: &[u8]) -> Result<()> {
        self.spi.write(bytes).map_err(spi_err)?;
        Ok(())
    }

    pub fn read_count(&mut self) -> Result<i32> {
        let tx = [RD_CNTR, 0, 0, 0, 0];
        let mut rx = [0u8; 5];
        let n = self.spi.transfer(&mut rx, &tx).map_err(spi_err)?;
        if n != rx.len() {
            return Err(HwError::Timeout);
        }
        // MSB first after the opcode byte.
        let count = i32::from_be_bytes([rx[1], rx[2], rx[3], rx[4]]);
        trace!(count, "ls7366 count");
        Ok(count)
    }

    pub fn clear_count(&mut self) -> Result<()> {
        self.command(&[CLR_CNTR])
    }
}

pub struct HardwareCounter {
    dev: Ls7366,
}

impl HardwareCounter {
    pub fn try_new(bus_index: u8, ss: u8, clock_hz: u32) -> Result<Self> {
        Ok(Self {
            dev: Ls7366::new(bus_index, ss, clock_hz)?,
        })
    }
}

impl Counter for HardwareCounter {
    fn read(&mut self) -> std::result::Result<i32, BoxError> {
        Ok(self.dev.read_count()?)
    }

    fn clear(&mut self) -> std::result::Result<(), BoxError> {
        Ok(self.dev.clear_count()?)
    }
}
