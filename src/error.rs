// Copyright 2025 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use std::io;

use thiserror::Error;

/// Errors returned by every parse and serialize operation of this crate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A bit or byte read went past the end of the buffer.
    #[error("unexpected end of stream")]
    UnexpectedEndOfStream,
    /// A fixed-size structure was given the wrong number of bytes, or a list
    /// does not fit its length field.
    #[error("invalid length {0}")]
    InvalidLength(usize),
    /// A NAL unit of this type needs a header extension that was not supplied.
    #[error("NAL unit type {0} requires a matching header extension")]
    InvalidHeader(u8),
    /// An Exp-Golomb code word carries more than 64 bits of information.
    #[error("exp-golomb code does not fit in 64 bits")]
    ExpGolombOverflow,
    /// A decoded value does not fit the field it is stored in.
    #[error("value does not fit the destination type")]
    ValueOutOfRange,
    /// A NAL unit was handed to a parser for a different unit type.
    #[error("expected NAL unit type {expected}, got {got}")]
    InvalidNaluType { expected: u8, got: u8 },
    /// The output sink of a `write_into` call failed.
    #[error("I/O error: {0}")]
    Io(io::ErrorKind),
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::UnexpectedEof => Error::UnexpectedEndOfStream,
            kind => Error::Io(kind),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
