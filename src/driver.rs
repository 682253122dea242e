/*
 * SPDX-License-Identifier: Apache-2.0
 *
 * Copyright The Asahi Linux Contributors
 */

//! Register level interface offered to device drivers.

use crate::Result;

/// Register oriented access to devices on an I2C bus.
///
/// `address` is always the 7-bit device address and `command` the register
/// or command code on that device.
pub trait I2cDriver {
    fn name(&self) -> &'static str;

    /// Whether this driver can run on the current host.
    fn is_platform() -> bool
    where
        Self: Sized;

    fn read_byte(&mut self, address: u8, command: u8) -> Result<u8>;
    fn read_word(&mut self, address: u8, command: u8) -> Result<u16>;
    fn read_block(&mut self, address: u8, command: u8, count: usize) -> Result<Vec<u8>>;

    fn write_command(&mut self, address: u8, command: u8) -> Result<()>;
    fn write_byte(&mut self, address: u8, command: u8, value: u8) -> Result<()>;
    fn write_word(&mut self, address: u8, command: u8, value: u16) -> Result<()>;
    fn write_block(&mut self, address: u8, command: u8, data: BlockData) -> Result<()>;

    /// Addresses of the devices that answered a probe, ascending.
    fn scan(&mut self) -> Result<Vec<u8>>;
}

/// Payload of a block write: one byte or an ordered run of bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockData {
    Single([u8; 1]),
    Sequence(Vec<u8>),
}

impl BlockData {
    pub fn as_slice(&self) -> &[u8] {
        match self {
            Self::Single(byte) => byte,
            Self::Sequence(bytes) => bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }
}

impl From<u8> for BlockData {
    fn from(value: u8) -> Self {
        Self::Single([value])
    }
}

impl From<Vec<u8>> for BlockData {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Sequence(bytes)
    }
}

impl From<&[u8]> for BlockData {
    fn from(bytes: &[u8]) -> Self {
        Self::Sequence(bytes.to_vec())
    }
}

impl<const N: usize> From<[u8; N]> for BlockData {
    fn from(bytes: [u8; N]) -> Self {
        Self::Sequence(bytes.to_vec())
    }
}
