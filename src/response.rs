/*
 * SPDX-License-Identifier: Apache-2.0
 *
 * Copyright The Asahi Linux Contributors
 */

//! Parsing of the adapter's textual reply lines.
//!
//! A read reply looks like `-I2C0 RXD 18 52`: two header tokens followed by
//! one token per byte. A scan reply looks like `-I2C0 SCAN 16 OK`, where the
//! fourth token tells whether the probed address acknowledged.

use crate::parse_number;

/// Index of the first data token in a read reply.
pub const DATA_OFFSET: usize = 2;

const ACK_INDEX: usize = 3;
const ACK: &str = "OK";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("reply truncated: expected at least {expected} tokens, found {found}")]
    Truncated { expected: usize, found: usize },
    #[error("token {index} ({token:?}) is not a byte value")]
    InvalidByte { index: usize, token: String },
}

/// A reply line split into its whitespace separated tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseLine<'a> {
    tokens: Vec<&'a str>,
}

impl<'a> ResponseLine<'a> {
    pub fn parse(line: &'a str) -> Self {
        Self {
            tokens: line.split_whitespace().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn token(&self, index: usize) -> Option<&'a str> {
        self.tokens.get(index).copied()
    }

    /// Parses `count` byte tokens starting at `offset`, in reply order.
    pub fn data(&self, offset: usize, count: usize) -> Result<Vec<u8>, ProtocolError> {
        let expected = offset + count;
        if self.tokens.len() < expected {
            return Err(ProtocolError::Truncated {
                expected,
                found: self.tokens.len(),
            });
        }

        self.tokens[offset..expected]
            .iter()
            .enumerate()
            .map(|(i, token)| parse_byte(offset + i, token))
            .collect()
    }

    /// Whether a scan probe was acknowledged. Short lines count as absent.
    pub fn is_ack(&self) -> bool {
        self.token(ACK_INDEX) == Some(ACK)
    }
}

fn parse_byte(index: usize, token: &str) -> Result<u8, ProtocolError> {
    parse_number(token)
        .ok()
        .and_then(|val| u8::try_from(val).ok())
        .ok_or_else(|| ProtocolError::InvalidByte {
            index,
            token: token.to_string(),
        })
}
