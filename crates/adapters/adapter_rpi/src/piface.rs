//! PiFace Digital outputs, driven through the board's MCP23S17 port
//! expander over SPI.
//!
//! Port A carries the eight outputs (relays on channels 0 and 1), port B the
//! eight inputs.

use std::path::Path;
use std::sync::{Mutex, PoisonError};

use rppal::spi::{Bus, Mode, SlaveSelect, Spi};
use switchhub_app::ports::SwitchCollection;
use switchhub_domain::collection::CollectionKind;
use switchhub_domain::error::{DriverError, IndexOutOfRange, SwitchHubError};

use crate::config::PiFaceConfig;
use crate::error::RpiError;

const SPI_CLOCK_HZ: u32 = 1_000_000;

const IODIRA: u8 = 0x00;
const IODIRB: u8 = 0x01;
const IOCON: u8 = 0x0A;
const GPPUB: u8 = 0x0D;
const GPIOA: u8 = 0x12;
const OLATA: u8 = 0x14;

/// IOCON.HAEN: honour the hardware address pins.
const IOCON_HAEN: u8 = 0x08;

fn write_opcode(address: u8) -> u8 {
    0x40 | (address << 1)
}

fn read_opcode(address: u8) -> u8 {
    0x41 | (address << 1)
}

fn with_bit(byte: u8, bit: u8, on: bool) -> u8 {
    if on { byte | (1 << bit) } else { byte & !(1 << bit) }
}

/// Map `/dev/spidev<bus>.<cs>` to the rppal bus and chip-select.
fn parse_spi_device(device: &str) -> Result<(Bus, SlaveSelect), RpiError> {
    let invalid = || RpiError::InvalidSpiDevice(device.to_string());
    let (bus, cs) = device
        .strip_prefix("/dev/spidev")
        .and_then(|rest| rest.split_once('.'))
        .ok_or_else(invalid)?;
    let bus = match bus {
        "0" => Bus::Spi0,
        "1" => Bus::Spi1,
        "2" => Bus::Spi2,
        _ => return Err(invalid()),
    };
    let cs = match cs {
        "0" => SlaveSelect::Ss0,
        "1" => SlaveSelect::Ss1,
        "2" => SlaveSelect::Ss2,
        _ => return Err(invalid()),
    };
    Ok((bus, cs))
}

struct Expander {
    spi: Spi,
    address: u8,
    /// Last value written to port A.
    outputs: u8,
}

impl Expander {
    fn open(config: &PiFaceConfig) -> Result<Self, RpiError> {
        config.validate()?;
        let (bus, cs) = parse_spi_device(&config.device)?;
        if !Path::new(&config.device).exists() {
            return Err(RpiError::MissingDevice(config.device.clone()));
        }
        let mut expander = Self {
            spi: Spi::new(bus, cs, SPI_CLOCK_HZ, Mode::Mode0)?,
            address: config.hardware_address,
            outputs: 0,
        };
        expander.write_register(IOCON, IOCON_HAEN)?;
        expander.write_register(IODIRA, 0x00)?;
        expander.write_register(IODIRB, 0xFF)?;
        expander.write_register(GPPUB, 0xFF)?;
        expander.write_register(GPIOA, 0x00)?;
        Ok(expander)
    }

    fn write_register(&mut self, register: u8, value: u8) -> Result<(), RpiError> {
        self.spi
            .write(&[write_opcode(self.address), register, value])?;
        Ok(())
    }

    fn read_register(&mut self, register: u8) -> Result<u8, RpiError> {
        let mut read = [0u8; 3];
        self.spi
            .transfer(&mut read, &[read_opcode(self.address), register, 0])?;
        Ok(read[2])
    }

    fn set_output(&mut self, bit: u8, on: bool) -> Result<(), RpiError> {
        let next = with_bit(self.outputs, bit, on);
        self.write_register(GPIOA, next)?;
        self.outputs = next;
        Ok(())
    }

    fn output(&mut self, bit: u8) -> Result<bool, RpiError> {
        self.outputs = self.read_register(OLATA)?;
        Ok(self.outputs & (1 << bit) != 0)
    }
}

/// PiFace Digital outputs. The SPI device is opened at `init` and closed
/// at `close`.
pub struct PiFaceCollection {
    name: String,
    config: PiFaceConfig,
    expander: Mutex<Option<Expander>>,
}

impl PiFaceCollection {
    #[must_use]
    pub fn new(name: impl Into<String>, config: PiFaceConfig) -> Self {
        Self {
            name: name.into(),
            config,
            expander: Mutex::new(None),
        }
    }

    fn with_channel<T>(
        &self,
        index: usize,
        f: impl FnOnce(&mut Expander, u8) -> Result<T, RpiError>,
    ) -> Result<T, SwitchHubError> {
        let channel = *self.config.channels.get(index).ok_or(IndexOutOfRange {
            index,
            len: self.len(),
        })?;
        let mut expander = self.expander.lock().unwrap_or_else(PoisonError::into_inner);
        let expander = expander.as_mut().ok_or_else(|| DriverError::NotInitialized {
            device: self.name.clone(),
        })?;
        f(expander, channel).map_err(|err| err.into_io(&self.name))
    }
}

impl SwitchCollection for PiFaceCollection {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> CollectionKind {
        CollectionKind::PiFace
    }

    fn init(&self) -> Result<(), SwitchHubError> {
        let mut expander = self.expander.lock().unwrap_or_else(PoisonError::into_inner);
        if expander.is_some() {
            return Ok(());
        }
        let opened = Expander::open(&self.config).map_err(|err| err.into_init(&self.name))?;
        tracing::info!(
            collection = %self.name,
            device = %self.config.device,
            address = self.config.hardware_address,
            "piface ready"
        );
        *expander = Some(opened);
        Ok(())
    }

    fn len(&self) -> usize {
        self.config.channels.len()
    }

    fn get_state(&self, index: usize) -> Result<bool, SwitchHubError> {
        self.with_channel(index, Expander::output)
    }

    fn set_state(&self, index: usize, on: bool) -> Result<(), SwitchHubError> {
        self.with_channel(index, |expander, bit| expander.set_output(bit, on))?;
        tracing::debug!(collection = %self.name, index, on, "piface output set");
        Ok(())
    }

    fn close(&self) -> Result<(), SwitchHubError> {
        let closed = self
            .expander
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if closed.is_some() {
            tracing::info!(collection = %self.name, "piface closed");
        }
        Ok(())
    }
}
