// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Emulation prevention, H.264 section 7.4.1.
//!
//! Inside a NAL unit a `0x03` byte is inserted after every `00 00` pair that
//! is followed by a byte in `00..=03`, so that no start code can appear in
//! the payload.

use bytes::Buf;
use bytes::BufMut;

pub const EMULATION_PREVENTION_BYTE: u8 = 0x03;

/// Writes the escaped form of `rbsp` into `out`.
///
/// An inserted byte ends the current run of zeros, so `00 00 00 00 00 00`
/// becomes `00 00 03 00 00 03 00 00`.
pub fn escape_into<B: BufMut>(mut rbsp: &[u8], out: &mut B) {
    let mut zeros = 0usize;

    while rbsp.has_remaining() {
        let byte = rbsp.get_u8();

        if zeros >= 2 && byte <= EMULATION_PREVENTION_BYTE {
            out.put_u8(EMULATION_PREVENTION_BYTE);
            zeros = 0;
        }

        zeros = if byte == 0x00 { zeros + 1 } else { 0 };
        out.put_u8(byte);
    }
}

pub fn escape(rbsp: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(rbsp.len() + rbsp.len() / 2);
    escape_into(rbsp, &mut out);
    out
}

/// Removes every `0x03` that follows a `00 00` pair. The pair detection starts
/// over after a removed byte.
pub fn unescape(mut data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    // Used in epb detection.
    let mut prev_two_bytes = 0xffffu16;

    while data.has_remaining() {
        let byte = data.get_u8();

        if prev_two_bytes == 0 && byte == EMULATION_PREVENTION_BYTE {
            // We need another 2 bytes before another epb can happen.
            prev_two_bytes = 0xffff;
            continue;
        }

        prev_two_bytes = (prev_two_bytes << 8) | u16::from(byte);
        out.put_u8(byte);
    }

    out
}
