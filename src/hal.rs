/*
 * SPDX-License-Identifier: Apache-2.0
 *
 * Copyright The Asahi Linux Contributors
 */

//! `embedded-hal` bus implementation, so generic sensor drivers can be
//! pointed at a host adapter.

use crate::binho::{checked_wire_address, BinhoI2c};
use crate::transport::{AdapterSdk, HostAdapter};
use crate::{Error, Result};
use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource, Operation, SevenBitAddress};

impl embedded_hal::i2c::Error for Error {
    fn kind(&self) -> ErrorKind {
        match self {
            Error::Nak(_) => ErrorKind::NoAcknowledge(NoAcknowledgeSource::Unknown),
            _ => ErrorKind::Other,
        }
    }
}

impl<S: AdapterSdk> embedded_hal::i2c::ErrorType for BinhoI2c<S> {
    type Error = Error;
}

fn same_kind(a: &Operation<'_>, b: &Operation<'_>) -> bool {
    matches!(
        (a, b),
        (Operation::Write(_), Operation::Write(_)) | (Operation::Read(_), Operation::Read(_))
    )
}

impl<S: AdapterSdk> embedded_hal::i2c::I2c<SevenBitAddress> for BinhoI2c<S> {
    /// Adjacent operations of the same kind share one frame. A write run
    /// followed by a read ends with a repeated start, the final run with a
    /// stop.
    fn transaction(
        &mut self,
        address: SevenBitAddress,
        operations: &mut [Operation<'_>],
    ) -> Result<()> {
        let wire = checked_wire_address(address)?;
        let port = self.port();

        let mut start = 0;
        while start < operations.len() {
            let mut end = start + 1;
            while end < operations.len() && same_kind(&operations[start], &operations[end]) {
                end += 1;
            }
            let more = end < operations.len();
            let run = &mut operations[start..end];

            if let Operation::Write(_) = run[0] {
                let bus = self.i2c_bus()?;
                bus.start_i2c(port, wire)?;
                for op in run.iter() {
                    if let Operation::Write(bytes) = op {
                        for &byte in bytes.iter() {
                            bus.write_byte_i2c(port, byte)?;
                        }
                    }
                }
                bus.end_i2c(port, more)?;
            } else {
                let total: usize = run
                    .iter()
                    .map(|op| match op {
                        Operation::Read(buf) => buf.len(),
                        Operation::Write(_) => 0,
                    })
                    .sum();
                let reply = self.i2c_bus()?.read_bytes_i2c(port, wire, total)?;
                let data = self.decode(&reply, total, "transaction read")?;

                let mut rest = data.as_slice();
                for op in run.iter_mut() {
                    if let Operation::Read(buf) = op {
                        let (head, tail) = rest.split_at(buf.len());
                        buf.copy_from_slice(head);
                        rest = tail;
                    }
                }
            }
            start = end;
        }
        Ok(())
    }
}
