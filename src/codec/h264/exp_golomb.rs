// Copyright 2025 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Exponential-Golomb coding, H.264 section 9.1.
//!
//! A code word is `x` zero bits, a one bit and `x` suffix bits. The code
//! number it carries is `(1 << x | suffix) - 1`. `ue(v)` elements use the
//! code number as is, `se(v)` elements map it through
//! [`code_num_to_se`].

use crate::bitstream_utils::BitReader;
use crate::bitstream_utils::BitWriter;
use crate::error::Error;
use crate::error::Result;

/// Longest prefix whose code number still fits in a `u64`.
const MAX_LEADING_ZEROS: usize = 64;

pub fn ue_to_code_num(value: u64) -> u64 {
    value
}

pub fn code_num_to_ue(code_num: u64) -> u64 {
    code_num
}

/// Maps a signed value to its code number: 0 to 0, positive `n` to `2n - 1`
/// and negative `n` to `-2n`. `i64::MIN` has no code number.
pub fn se_to_code_num(value: i64) -> Result<u64> {
    if value > 0 {
        Ok(value.unsigned_abs() * 2 - 1)
    } else {
        value
            .unsigned_abs()
            .checked_mul(2)
            .ok_or(Error::ValueOutOfRange)
    }
}

/// Inverse of [`se_to_code_num`]. Odd code numbers are positive. `u64::MAX`
/// would map to `2^63`, which does not fit an `i64`.
pub fn code_num_to_se(code_num: u64) -> Result<i64> {
    let magnitude =
        i64::try_from(code_num / 2 + code_num % 2).map_err(|_| Error::ValueOutOfRange)?;
    if code_num % 2 == 1 {
        Ok(magnitude)
    } else {
        Ok(-magnitude)
    }
}

impl BitReader<'_> {
    /// Reads one Exp-Golomb code word and returns its code number. A prefix
    /// running into the end of the buffer is an end-of-stream error.
    pub fn read_exp_golomb(&mut self) -> Result<u64> {
        let mut leading_zeros = 0;
        while !self.read_bit()? {
            leading_zeros += 1;
        }

        if leading_zeros > MAX_LEADING_ZEROS {
            return Err(Error::ExpGolombOverflow);
        }

        let mut suffix = 0u128;
        for _ in 0..leading_zeros {
            suffix = (suffix << 1) | u128::from(self.read_bit()?);
        }

        let code_num = ((1u128 << leading_zeros) | suffix) - 1;
        u64::try_from(code_num).map_err(|_| Error::ExpGolombOverflow)
    }

    /// Reads an unsigned Exp-Golomb value. Corresponds to `ue(v)` in H.264.
    pub fn read_ue<U: TryFrom<u64>>(&mut self) -> Result<U> {
        let value = code_num_to_ue(self.read_exp_golomb()?);
        U::try_from(value).map_err(|_| Error::ValueOutOfRange)
    }

    /// Reads a signed Exp-Golomb value. Corresponds to `se(v)` in H.264.
    pub fn read_se<U: TryFrom<i64>>(&mut self) -> Result<U> {
        let value = code_num_to_se(self.read_exp_golomb()?)?;
        U::try_from(value).map_err(|_| Error::ValueOutOfRange)
    }
}

impl BitWriter {
    /// Writes a code number in exponential golomb format.
    pub fn write_exp_golomb(&mut self, code_num: u64) {
        let value = u128::from(code_num) + 1;
        let zeros = (127 - value.leading_zeros()) as usize;

        for _ in 0..zeros {
            self.write_bit(false);
        }

        for bit in (0..=zeros).rev() {
            self.write_bit((value >> bit) & 1 == 1);
        }
    }

    /// Writes a unsigned integer in exponential golomb format.
    /// Coresponds to `ue(v)` in H.264 spec.
    pub fn write_ue<T: Into<u64>>(&mut self, value: T) {
        self.write_exp_golomb(ue_to_code_num(value.into()));
    }

    /// Writes a signed integer in exponential golomb format.
    /// Coresponds to `se(v)` in H.264 spec.
    pub fn write_se<T: Into<i64>>(&mut self, value: T) -> Result<()> {
        self.write_exp_golomb(se_to_code_num(value.into())?);
        Ok(())
    }
}
