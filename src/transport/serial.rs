/*
 * SPDX-License-Identifier: Apache-2.0
 *
 * Copyright The Asahi Linux Contributors
 */

use crate::transport::{AdapterSdk, HostAdapter, OperationMode, PullUpState};
use crate::{Error, Result};
use log::trace;
use serialport::{SerialPort, SerialPortType};
use std::{
    io::{self, BufRead, BufReader, Read, Write},
    time::Duration,
};

const BINHO_VID: u16 = 0x04d8;
const BINHO_PID: u16 = 0xed34;

// CDC ACM ignores the rate, but the port still wants one.
const BAUD_RATE: u32 = 9600;
const READ_TIMEOUT: Duration = Duration::from_secs(1);

const REPLY_OK: &str = "-OK";
const REPLY_NG: &str = "-NG";

fn map_serial_err(e: serialport::Error) -> Error {
    match e.kind() {
        serialport::ErrorKind::NoDevice => Error::NotConnected(e.to_string()),
        _ => Error::Serial(e),
    }
}

fn map_io_err(e: io::Error) -> Error {
    match e.kind() {
        io::ErrorKind::NotFound | io::ErrorKind::BrokenPipe | io::ErrorKind::NotConnected => {
            Error::NotConnected(e.to_string())
        }
        _ => Error::Io(e),
    }
}

/// Finds Binho adapters among the host's serial ports.
#[derive(Debug, Default)]
pub struct SerialSdk;

impl AdapterSdk for SerialSdk {
    type Adapter = Nova<Box<dyn SerialPort>>;

    fn list_available_devices(&mut self) -> Result<Vec<String>> {
        let ports = serialport::available_ports().map_err(map_serial_err)?;
        Ok(ports
            .into_iter()
            .filter(|port| match &port.port_type {
                SerialPortType::UsbPort(info) => info.vid == BINHO_VID && info.pid == BINHO_PID,
                _ => false,
            })
            .map(|port| port.port_name)
            .collect())
    }

    fn open(&mut self, device: &str) -> Result<Self::Adapter> {
        let port = serialport::new(device, BAUD_RATE)
            .timeout(READ_TIMEOUT)
            .open()
            .map_err(map_serial_err)?;
        Ok(Nova::new(port))
    }
}

/// A Binho Nova speaking its line based command protocol over `stream`.
pub struct Nova<T: Read + Write> {
    stream: BufReader<T>,
    closed: bool,
}

impl<T: Read + Write> Nova<T> {
    pub fn new(stream: T) -> Self {
        Self {
            stream: BufReader::new(stream),
            closed: false,
        }
    }

    fn command(&mut self, cmd: &str) -> Result<String> {
        if self.closed {
            return Err(Error::NotConnected("adapter handle is closed".into()));
        }
        trace!("-> {cmd}");

        let port = self.stream.get_mut();
        port.write_all(cmd.as_bytes()).map_err(map_io_err)?;
        port.write_all(b"\n").map_err(map_io_err)?;
        port.flush().map_err(map_io_err)?;

        let mut reply = String::new();
        let n = self.stream.read_line(&mut reply).map_err(map_io_err)?;
        if n == 0 {
            return Err(Error::NotConnected("adapter closed the connection".into()));
        }
        let reply = reply.trim_end().to_string();
        trace!("<- {reply}");
        Ok(reply)
    }

    fn command_ok(&mut self, cmd: String) -> Result<()> {
        let reply = self.command(&cmd)?;
        match reply.as_str() {
            REPLY_OK => Ok(()),
            REPLY_NG => Err(Error::Nak(cmd)),
            _ => Err(Error::UnexpectedReply(reply)),
        }
    }
}

impl<T: Read + Write> HostAdapter for Nova<T> {
    fn set_numerical_base(&mut self, base: u32) -> Result<()> {
        self.command_ok(format!("+BASE {base}"))
    }

    fn set_operation_mode(&mut self, port: u8, mode: OperationMode) -> Result<()> {
        self.command_ok(format!("+MODE {port} {mode}"))
    }

    fn set_pull_up_state_i2c(&mut self, port: u8, state: PullUpState) -> Result<()> {
        self.command_ok(format!("I2C{port} PULL {state}"))
    }

    fn set_clock_i2c(&mut self, port: u8, hz: u32) -> Result<()> {
        self.command_ok(format!("I2C{port} FREQ {hz}"))
    }

    fn start_i2c(&mut self, port: u8, address: u8) -> Result<()> {
        self.command_ok(format!("I2C{port} START {address}"))
    }

    fn write_byte_i2c(&mut self, port: u8, data: u8) -> Result<()> {
        self.command_ok(format!("I2C{port} WRITE {data}"))
    }

    fn end_i2c(&mut self, port: u8, repeated_start: bool) -> Result<()> {
        if repeated_start {
            self.command_ok(format!("I2C{port} END R"))
        } else {
            self.command_ok(format!("I2C{port} END"))
        }
    }

    fn read_bytes_i2c(&mut self, port: u8, address: u8, count: usize) -> Result<String> {
        self.command(&format!("I2C{port} READ {address} {count}"))
    }

    fn scan_addr_i2c(&mut self, port: u8, address: u8) -> Result<String> {
        self.command(&format!("I2C{port} SCAN {address}"))
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.stream.get_mut().flush().map_err(map_io_err)
    }
}
