/*
 * SPDX-License-Identifier: Apache-2.0
 *
 * Copyright The Asahi Linux Contributors
 */

#[cfg(test)]
pub(crate) mod mock;
#[cfg(feature = "serial")]
pub mod serial;

use crate::Result;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationMode {
    I2c,
}

impl fmt::Display for OperationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::I2c => f.write_str("I2C"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullUpState {
    Enabled,
    Disabled,
}

impl fmt::Display for PullUpState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Enabled => f.write_str("EN"),
            Self::Disabled => f.write_str("DIS"),
        }
    }
}

/// Discovers and opens host adapters.
pub trait AdapterSdk {
    type Adapter: HostAdapter;

    fn list_available_devices(&mut self) -> Result<Vec<String>>;
    fn open(&mut self, device: &str) -> Result<Self::Adapter>;
}

/// An open host adapter.
///
/// Addresses passed to the I2C primitives are already in wire form, i.e.
/// the 7-bit address shifted left by one.
pub trait HostAdapter {
    fn set_numerical_base(&mut self, base: u32) -> Result<()>;
    fn set_operation_mode(&mut self, port: u8, mode: OperationMode) -> Result<()>;
    fn set_pull_up_state_i2c(&mut self, port: u8, state: PullUpState) -> Result<()>;
    fn set_clock_i2c(&mut self, port: u8, hz: u32) -> Result<()>;

    fn start_i2c(&mut self, port: u8, address: u8) -> Result<()>;
    fn write_byte_i2c(&mut self, port: u8, data: u8) -> Result<()>;
    /// Ends the current transaction, with a repeated start if
    /// `repeated_start` is set and a stop condition otherwise.
    fn end_i2c(&mut self, port: u8, repeated_start: bool) -> Result<()>;
    /// Reads `count` bytes and returns the adapter's reply line verbatim.
    fn read_bytes_i2c(&mut self, port: u8, address: u8, count: usize) -> Result<String>;
    /// Probes `address` and returns the adapter's reply line verbatim.
    fn scan_addr_i2c(&mut self, port: u8, address: u8) -> Result<String>;

    fn close(&mut self) -> Result<()>;
}
