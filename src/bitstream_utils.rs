// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Bit-granular cursors over byte buffers.
//!
//! Bits are addressed most-significant first within each byte, as in every
//! H.264 syntax structure.

use crate::error::Error;
use crate::error::Result;

/// A bit reader over a borrowed byte buffer.
///
/// Emulation-prevention bytes are not handled here: the reader expects an
/// RBSP, see [`crate::codec::h264::emulation_prevention`].
#[derive(Clone, Debug)]
pub struct BitReader<'a> {
    data: &'a [u8],
    /// Offset of the next unread bit. Never exceeds `8 * data.len()`.
    position: usize,
}

impl<'a> BitReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Read a single bit from the stream.
    pub fn read_bit(&mut self) -> Result<bool> {
        let byte = self
            .data
            .get(self.position / 8)
            .ok_or(Error::UnexpectedEndOfStream)?;
        let bit = (byte >> (7 - self.position % 8)) & 1;
        self.position += 1;
        Ok(bit == 1)
    }

    /// Read up to 32 bits from the stream. Nothing is consumed if the stream
    /// holds fewer than `num_bits` bits.
    pub fn read_bits<U: TryFrom<u32>>(&mut self, num_bits: usize) -> Result<U> {
        if num_bits > 32 {
            return Err(Error::InvalidLength(num_bits));
        }
        if num_bits > self.num_bits_left() {
            return Err(Error::UnexpectedEndOfStream);
        }

        let start = self.position;
        let mut out = 0u64;
        for _ in 0..num_bits {
            out = (out << 1) | u64::from(self.read_bit()?);
        }

        let value = u32::try_from(out)
            .ok()
            .and_then(|v| U::try_from(v).ok());
        if value.is_none() {
            self.position = start;
        }
        value.ok_or(Error::ValueOutOfRange)
    }

    /// Reads eight bits, assembling them from two buffer bytes when the
    /// cursor is not byte aligned.
    pub fn read_byte(&mut self) -> Result<u8> {
        if self.num_bits_left() < 8 {
            return Err(Error::UnexpectedEndOfStream);
        }

        let index = self.position / 8;
        let shift = self.position % 8;
        let byte = if shift == 0 {
            self.data[index]
        } else {
            (self.data[index] << shift) | (self.data[index + 1] >> (8 - shift))
        };

        self.position += 8;
        Ok(byte)
    }

    /// Fills `buf` with the next `buf.len()` bytes.
    pub fn read_bytes_into(&mut self, buf: &mut [u8]) -> Result<()> {
        if self.num_bits_left() < buf.len() * 8 {
            return Err(Error::UnexpectedEndOfStream);
        }

        for byte in buf.iter_mut() {
            *byte = self.read_byte()?;
        }

        Ok(())
    }

    pub fn read_bytes(&mut self, num_bytes: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0; num_bytes];
        self.read_bytes_into(&mut buf)?;
        Ok(buf)
    }

    /// Skip `num_bits` bits from the stream.
    pub fn skip_bits(&mut self, num_bits: usize) -> Result<()> {
        if num_bits > self.num_bits_left() {
            return Err(Error::UnexpectedEndOfStream);
        }

        self.position += num_bits;
        Ok(())
    }

    /// Returns the amount of bits left in the stream
    pub fn num_bits_left(&self) -> usize {
        self.data.len() * 8 - self.position
    }

    /// Return the position of this bitstream in bits.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn is_aligned(&self) -> bool {
        self.position % 8 == 0
    }
}

/// A bit writer backed by a growable byte vector.
#[derive(Clone, Debug, Default)]
pub struct BitWriter {
    buf: Vec<u8>,
    /// Number of bits written so far. The unwritten tail of the last byte is
    /// always zero.
    bit_len: usize,
}

impl BitWriter {
    pub fn new() -> Self {
        Default::default()
    }

    /// Takes a single bit and appends it to the buffer.
    pub fn write_bit(&mut self, bit: bool) {
        let shift = self.bit_len % 8;
        if shift == 0 {
            self.buf.push(0);
        }

        if bit {
            if let Some(last) = self.buf.last_mut() {
                *last |= 0x80 >> shift;
            }
        }

        self.bit_len += 1;
    }

    pub fn write_bits(&mut self, bits: &[bool]) {
        for bit in bits {
            self.write_bit(*bit);
        }
    }

    /// Writes the low `bits` bits of `value`, most significant first (up to
    /// 32 bit). Corresponds to `f(n)` and `u(n)` in H.264.
    pub fn write_f<T: Into<u32>>(&mut self, bits: usize, value: T) -> Result<usize> {
        let value = value.into();

        if bits > 32 {
            return Err(Error::InvalidLength(bits));
        }

        for bit in (0..bits).rev() {
            self.write_bit((value >> bit) & 1 == 1);
        }

        Ok(bits)
    }

    /// Writes eight bits, splitting them across two buffer bytes when the
    /// cursor is not byte aligned.
    pub fn write_byte(&mut self, byte: u8) {
        let shift = self.bit_len % 8;
        match self.buf.last_mut() {
            Some(last) if shift != 0 => {
                *last |= byte >> shift;
                self.buf.push(byte << (8 - shift));
            }
            _ => self.buf.push(byte),
        }

        self.bit_len += 8;
    }

    pub fn write(&mut self, bytes: &[u8]) {
        for byte in bytes {
            self.write_byte(*byte);
        }
    }

    /// Number of bits written so far.
    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    /// Returns `true` if next bits will be aligned to 8
    pub fn aligned(&self) -> bool {
        self.bit_len % 8 == 0
    }

    /// The written bytes. A partially written last byte is padded with zero
    /// bits.
    pub fn bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Packs a string of `0`/`1` characters into bytes, ignoring whitespace. The
/// last byte is padded with zero bits.
#[cfg(test)]
pub(crate) fn bitstring(bits: &str) -> Vec<u8> {
    let mut writer = BitWriter::new();
    for c in bits.chars().filter(|c| !c.is_whitespace()) {
        writer.write_bit(c == '1');
    }
    writer.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_bits_msb_first() {
        const DATA: [u8; 2] = [0b1010_0000, 0xff];

        let mut reader = BitReader::new(&DATA);
        assert!(reader.read_bit().unwrap());
        assert!(!reader.read_bit().unwrap());
        assert_eq!(reader.read_bits::<u8>(3).unwrap(), 0b100);
        assert_eq!(reader.num_bits_left(), 11);
        assert_eq!(reader.read_bits::<u32>(11).unwrap(), 0xff);
        assert_eq!(reader.num_bits_left(), 0);
        assert_eq!(reader.read_bit(), Err(Error::UnexpectedEndOfStream));
    }

    #[test]
    fn read_byte_across_boundary() {
        const DATA: [u8; 3] = [0x0a, 0xbc, 0xde];

        let mut reader = BitReader::new(&DATA);
        reader.skip_bits(4).unwrap();
        assert_eq!(reader.read_byte().unwrap(), 0xab);
        assert_eq!(reader.read_byte().unwrap(), 0xcd);
        assert_eq!(reader.position(), 20);
        assert_eq!(reader.read_byte(), Err(Error::UnexpectedEndOfStream));
        // A failed read leaves the cursor untouched.
        assert_eq!(reader.position(), 20);
        assert_eq!(reader.read_bits::<u8>(4).unwrap(), 0xe);
    }

    #[test]
    fn read_bytes_past_end() {
        const DATA: [u8; 3] = [1, 2, 3];

        let mut reader = BitReader::new(&DATA);
        assert_eq!(reader.read_bytes(2).unwrap(), vec![1, 2]);
        assert_eq!(reader.read_bytes(2), Err(Error::UnexpectedEndOfStream));
        assert_eq!(reader.skip_bits(9), Err(Error::UnexpectedEndOfStream));
        assert!(reader.is_aligned());
        reader.skip_bits(8).unwrap();
        assert_eq!(reader.read_bytes(0).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn read_32_bits() {
        const DATA: [u8; 4] = [0xde, 0xad, 0xbe, 0xef];

        let mut reader = BitReader::new(&DATA);
        assert_eq!(reader.read_bits::<u32>(32).unwrap(), 0xdeadbeef);

        let mut reader = BitReader::new(&DATA);
        assert_eq!(reader.read_bits::<u8>(16), Err(Error::ValueOutOfRange));
        assert_eq!(reader.position(), 0);
        assert_eq!(reader.read_bits::<u64>(33), Err(Error::InvalidLength(33)));
    }

    #[test]
    fn test_bitwriter_f1() {
        let mut writer = BitWriter::new();
        writer.write_f(1, true).unwrap();
        writer.write_f(1, false).unwrap();
        writer.write_f(1, false).unwrap();
        writer.write_f(1, false).unwrap();
        writer.write_f(1, true).unwrap();
        writer.write_f(1, true).unwrap();
        writer.write_f(1, true).unwrap();
        writer.write_f(1, true).unwrap();
        assert_eq!(writer.bytes(), &[0b10001111u8]);
    }

    #[test]
    fn test_bitwriter_f3() {
        let mut writer = BitWriter::new();
        writer.write_f(3, 0b100u8).unwrap();
        writer.write_f(3, 0b101u8).unwrap();
        writer.write_f(3, 0b011u8).unwrap();
        assert_eq!(writer.bit_len(), 9);
        assert!(!writer.aligned());
        assert_eq!(writer.into_bytes(), vec![0b10010101u8, 0b10000000u8]);
    }

    #[test]
    fn test_bitwriter_f32() {
        let mut writer = BitWriter::new();
        writer.write_f(32, 0x12345678u32).unwrap();
        assert_eq!(writer.bytes(), &[0x12, 0x34, 0x56, 0x78]);
        assert_eq!(writer.write_f(33, 0u32), Err(Error::InvalidLength(33)));
    }

    #[test]
    fn write_byte_unaligned() {
        let mut writer = BitWriter::new();
        writer.write_bits(&[true, false, true]);
        writer.write_byte(0xff);
        writer.write(&[0x00, 0x81]);
        assert_eq!(writer.bit_len(), 27);
        assert_eq!(writer.bytes(), &[0b1011_1111, 0b1110_0000, 0b0001_0000, 0b0010_0000]);

        let mut reader = BitReader::new(writer.bytes());
        reader.skip_bits(3).unwrap();
        assert_eq!(reader.read_bytes(3).unwrap(), vec![0xff, 0x00, 0x81]);
    }

    #[test]
    fn writer_grows() {
        let mut writer = BitWriter::new();
        for i in 0..1000u32 {
            writer.write_f(10, i).unwrap();
        }

        let mut reader = BitReader::new(writer.bytes());
        for i in 0..1000u32 {
            assert_eq!(reader.read_bits::<u32>(10).unwrap(), i);
        }
        assert_eq!(reader.num_bits_left(), 0);
    }
}
