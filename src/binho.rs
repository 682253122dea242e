/*
 * SPDX-License-Identifier: Apache-2.0
 *
 * Copyright The Asahi Linux Contributors
 */

use crate::driver::{BlockData, I2cDriver};
use crate::response::{ResponseLine, DATA_OFFSET};
use crate::transport::{AdapterSdk, HostAdapter, OperationMode, PullUpState};
use crate::{Error, Result};
use log::{debug, error, info, trace, warn};
use std::ops::RangeInclusive;

const PLATFORM_NAME: &str = "BinhoHostAdapter";

const DEFAULT_PORT: u8 = 0;
const DEFAULT_CLOCK_HZ: u32 = 400_000;
const DEFAULT_NUMERICAL_BASE: u32 = 10;

/// Addresses probed by a bus scan; everything outside is reserved.
pub const SCAN_RANGE: RangeInclusive<u8> = 8..=120;

const MAX_ADDRESS: u8 = 0x7f;

/// Adapter settings applied when the connection is established.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusConfig {
    pub port: u8,
    pub clock_hz: u32,
    pub pull_ups: PullUpState,
    pub numerical_base: u32,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            clock_hz: DEFAULT_CLOCK_HZ,
            pull_ups: PullUpState::Enabled,
            numerical_base: DEFAULT_NUMERICAL_BASE,
        }
    }
}

/// The adapter takes the 7-bit address and R/W bit as a single byte.
pub fn wire_address(address: u8) -> u8 {
    address << 1
}

pub(crate) fn checked_wire_address(address: u8) -> Result<u8> {
    if address > MAX_ADDRESS {
        return Err(Error::InvalidArgument(format!(
            "I2C address {address:#04x} exceeds 7 bits"
        )));
    }
    Ok(wire_address(address))
}

fn open_bus<S: AdapterSdk>(sdk: &mut S, config: &BusConfig) -> Result<S::Adapter> {
    let devices = sdk.list_available_devices()?;
    let device = match devices.as_slice() {
        [device] => device,
        [] => return Err(Error::NoAdapter),
        _ => return Err(Error::MultipleAdapters(devices.len())),
    };

    let mut bus = sdk.open(device)?;
    if let Err(e) = configure(&mut bus, config) {
        let _ = bus.close();
        return Err(e);
    }
    info!("Connected to {PLATFORM_NAME} on {device}");
    Ok(bus)
}

fn configure<A: HostAdapter>(bus: &mut A, config: &BusConfig) -> Result<()> {
    bus.set_numerical_base(config.numerical_base)?;
    bus.set_operation_mode(config.port, OperationMode::I2c)?;
    bus.set_pull_up_state_i2c(config.port, config.pull_ups)?;
    bus.set_clock_i2c(config.port, config.clock_hz)
}

/// Opens the single attached host adapter and configures it as I2C master.
///
/// Failures are logged and reported as `None`; zero or several attached
/// adapters both count as failures.
pub fn connect<S: AdapterSdk>(sdk: &mut S, config: &BusConfig) -> Option<S::Adapter> {
    match open_bus(sdk, config) {
        Ok(bus) => Some(bus),
        Err(Error::NotConnected(msg)) => {
            error!("Unable to connect to I2C bus. {msg}");
            error!("Ensure a {PLATFORM_NAME} is connected to the computer.");
            None
        }
        Err(e @ (Error::NoAdapter | Error::MultipleAdapters(_))) => {
            error!("Unable to connect to I2C bus. {e}.");
            None
        }
        Err(e) => {
            error!("Failed to connect to I2C bus. Error: {e}");
            None
        }
    }
}

/// Probes every address in [`SCAN_RANGE`] on an already connected adapter.
pub fn scan_bus<A: HostAdapter>(bus: &mut A, port: u8) -> Result<Vec<u8>> {
    let mut found = Vec::new();
    for address in SCAN_RANGE {
        let reply = bus.scan_addr_i2c(port, wire_address(address))?;
        trace!("scan {address:#04x}: {reply}");
        if ResponseLine::parse(&reply).is_ack() {
            found.push(address);
        }
    }
    debug!("scan found {} device(s)", found.len());
    Ok(found)
}

/// I2C driver backed by a Binho host adapter.
///
/// The adapter is opened on first use and kept until the driver is dropped
/// or a reply fails to parse. Access goes through `&mut self`; the driver is
/// meant to be used from a single thread.
pub struct BinhoI2c<S: AdapterSdk> {
    sdk: S,
    config: BusConfig,
    bus: Option<S::Adapter>,
}

impl<S: AdapterSdk> BinhoI2c<S> {
    pub const NAME: &'static str = PLATFORM_NAME;

    pub fn new(sdk: S) -> Self {
        Self::with_config(sdk, BusConfig::default())
    }

    pub fn with_config(sdk: S, config: BusConfig) -> Self {
        Self {
            sdk,
            config,
            bus: None,
        }
    }

    pub fn config(&self) -> &BusConfig {
        &self.config
    }

    pub fn is_connected(&self) -> bool {
        self.bus.is_some()
    }

    /// The adapter handle, connecting first if needed. `None` if no adapter
    /// could be brought up.
    pub fn bus(&mut self) -> Option<&mut S::Adapter> {
        if self.bus.is_none() {
            self.bus = connect(&mut self.sdk, &self.config);
        }
        self.bus.as_mut()
    }

    /// Closes the adapter handle. The next operation reconnects.
    pub fn close(&mut self) -> Result<()> {
        match self.bus.take() {
            Some(mut bus) => bus.close(),
            None => Ok(()),
        }
    }

    pub(crate) fn i2c_bus(&mut self) -> Result<&mut S::Adapter> {
        self.bus().ok_or(Error::BusUnavailable)
    }

    pub(crate) fn port(&self) -> u8 {
        self.config.port
    }

    /// Parses `count` data bytes from a read reply. A malformed reply closes
    /// the handle before the error is returned.
    pub(crate) fn decode(&mut self, reply: &str, count: usize, op: &str) -> Result<Vec<u8>> {
        match ResponseLine::parse(reply).data(DATA_OFFSET, count) {
            Ok(data) => Ok(data),
            Err(e) => {
                error!("I2C {op} failure: {e} in {reply:?}");
                if let Err(close_err) = self.close() {
                    warn!("closing adapter failed: {close_err}");
                }
                Err(e.into())
            }
        }
    }

    /// start, command code, then end with a repeated start or a stop.
    fn select(&mut self, wire: u8, command: u8, repeated_start: bool) -> Result<()> {
        let port = self.port();
        let bus = self.i2c_bus()?;
        bus.start_i2c(port, wire)?;
        bus.write_byte_i2c(port, command)?;
        bus.end_i2c(port, repeated_start)
    }

    fn write_payload(&mut self, wire: u8, data: &[u8]) -> Result<()> {
        let port = self.port();
        let bus = self.i2c_bus()?;
        bus.start_i2c(port, wire)?;
        for &byte in data {
            bus.write_byte_i2c(port, byte)?;
        }
        bus.end_i2c(port, false)
    }

    fn read_register(
        &mut self,
        address: u8,
        command: u8,
        count: usize,
        op: &str,
    ) -> Result<Vec<u8>> {
        let wire = checked_wire_address(address)?;
        self.select(wire, command, true)?;

        let port = self.port();
        let reply = self.i2c_bus()?.read_bytes_i2c(port, wire, count)?;
        debug!("{op} {address:#04x}/{command:#04x}: {reply}");
        self.decode(&reply, count, op)
    }

    fn write_register(&mut self, address: u8, command: u8, data: &[u8]) -> Result<()> {
        let wire = checked_wire_address(address)?;
        debug!("write {address:#04x}/{command:#04x}: {data:02x?}");
        self.select(wire, command, true)?;
        self.write_payload(wire, data)
    }
}

impl<S: AdapterSdk> I2cDriver for BinhoI2c<S> {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn is_platform() -> bool {
        true
    }

    fn read_byte(&mut self, address: u8, command: u8) -> Result<u8> {
        let data = self.read_register(address, command, 1, "ReadByte")?;
        Ok(data[0])
    }

    fn read_word(&mut self, address: u8, command: u8) -> Result<u16> {
        let data = self.read_register(address, command, 2, "ReadWord")?;
        // token 2 carries the high byte, token 3 the low byte
        let buffer = [data[1], data[0]];
        Ok((u16::from(buffer[1]) << 8) | u16::from(buffer[0]))
    }

    fn read_block(&mut self, address: u8, command: u8, count: usize) -> Result<Vec<u8>> {
        self.read_register(address, command, count, "ReadBlock")
    }

    fn write_command(&mut self, address: u8, command: u8) -> Result<()> {
        let wire = checked_wire_address(address)?;
        debug!("command {address:#04x}/{command:#04x}");
        self.select(wire, command, false)
    }

    fn write_byte(&mut self, address: u8, command: u8, value: u8) -> Result<()> {
        self.write_register(address, command, &[value])
    }

    fn write_word(&mut self, address: u8, command: u8, value: u16) -> Result<()> {
        let low = (value & 0xff) as u8;
        let high = ((value >> 8) & 0xff) as u8;
        self.write_register(address, command, &[high, low])
    }

    fn write_block(&mut self, address: u8, command: u8, data: BlockData) -> Result<()> {
        self.write_register(address, command, data.as_slice())
    }

    fn scan(&mut self) -> Result<Vec<u8>> {
        let port = self.port();
        match self.bus() {
            Some(bus) => scan_bus(bus, port),
            None => Ok(Vec::new()),
        }
    }
}

impl<S: AdapterSdk> Drop for BinhoI2c<S> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("closing adapter failed: {e}");
        }
    }
}
