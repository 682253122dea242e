/*
 * SPDX-License-Identifier: Apache-2.0
 *
 * Copyright The Asahi Linux Contributors
 */

//! I2C master driver for Binho USB host adapters.
//!
//! [`BinhoI2c`] turns register style reads and writes into the adapter's
//! start / write / end / read command sequence and parses the adapter's
//! textual replies back into bytes. The adapter itself sits behind the
//! [`transport::HostAdapter`] trait; [`transport::serial`] talks to real
//! hardware over its USB serial port.

pub mod binho;
pub mod driver;
mod hal;
pub mod response;
pub mod transport;

pub use binho::{connect, scan_bus, wire_address, BinhoI2c, BusConfig};
pub use driver::{BlockData, I2cDriver};
pub use response::{ProtocolError, ResponseLine};

/// Errors raised by the driver and the adapter transports.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no Binho host adapter found")]
    NoAdapter,
    #[error("{0} Binho host adapters found, cannot pick one")]
    MultipleAdapters(usize),
    #[error("host adapter not connected: {0}")]
    NotConnected(String),
    #[error("I2C bus is not available")]
    BusUnavailable,
    #[error("adapter rejected `{0}`")]
    Nak(String),
    #[error("unexpected reply from adapter: {0:?}")]
    UnexpectedReply(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[cfg(feature = "serial")]
    #[error(transparent)]
    Serial(#[from] serialport::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Parses a decimal or `0x` prefixed hexadecimal number.
pub fn parse_number(s: &str) -> Result<u32> {
    let parsed = if let Some(stripped) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(stripped, 16)
    } else {
        s.parse::<u32>()
    };
    parsed.map_err(|_| Error::InvalidArgument(format!("not a number: {s:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_decimal_and_hex() {
        assert_eq!(parse_number("56").unwrap(), 56);
        assert_eq!(parse_number("0x38").unwrap(), 0x38);
        assert_eq!(parse_number("0X1234").unwrap(), 0x1234);
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            parse_number("0xzz"),
            Err(Error::InvalidArgument(_))
        ));
        assert!(parse_number("-1").is_err());
        assert!(parse_number("").is_err());
    }
}
