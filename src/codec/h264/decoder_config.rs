// Copyright 2025 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! The `AVCDecoderConfigurationRecord` of ISO/IEC 14496-15, as found in the
//! `avcC` box of MP4 files.
//!
//! | Bits | Field                                        |
//! |------|----------------------------------------------|
//! | 8    | configurationVersion                         |
//! | 8    | AVCProfileIndication                         |
//! | 8    | profile_compatibility                        |
//! | 8    | AVCLevelIndication                           |
//! | 6+2  | reserved (all ones), lengthSizeMinusOne      |
//! | 3+5  | reserved (all ones), numOfSequenceParameterSets |
//! | 16+n | per SPS: length, NAL unit                    |
//! | 8    | numOfPictureParameterSets                    |
//! | 16+n | per PPS: length, NAL unit                    |

use std::io::Write;

use byteorder::BigEndian;
use byteorder::ReadBytesExt;
use byteorder::WriteBytesExt;
use log::debug;

use crate::error::Error;
use crate::error::Result;

/// Size of a record without any parameter set.
const MIN_LEN: usize = 7;
/// `numOfSequenceParameterSets` is a 5 bit field.
const MAX_SPS_COUNT: usize = 31;
const MAX_PPS_COUNT: usize = 255;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AvcDecoderConfigurationRecord {
    pub configuration_version: u8,
    pub avc_profile_indication: u8,
    pub profile_compatibility: u8,
    pub avc_level_indication: u8,
    /// 2 bits.
    pub length_size_minus_one: u8,
    /// SPS NAL units, header included and emulation prevention applied.
    pub sps: Vec<Vec<u8>>,
    /// PPS NAL units, header included and emulation prevention applied.
    pub pps: Vec<Vec<u8>>,
}

fn read_parameter_sets(r: &mut &[u8], count: usize) -> Result<Vec<Vec<u8>>> {
    let mut units = Vec::new();

    for _ in 0..count {
        let len = usize::from(r.read_u16::<BigEndian>()?);
        if r.len() < len {
            return Err(Error::UnexpectedEndOfStream);
        }

        let (unit, rest) = r.split_at(len);
        units.push(unit.to_vec());
        *r = rest;
    }

    Ok(units)
}

fn write_parameter_sets<W: Write>(w: &mut W, units: &[Vec<u8>]) -> Result<()> {
    for unit in units {
        // Lengths are checked by `check_lengths`.
        w.write_u16::<BigEndian>(unit.len() as u16)?;
        w.write_all(unit)?;
    }

    Ok(())
}

impl AvcDecoderConfigurationRecord {
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < MIN_LEN {
            return Err(Error::InvalidLength(data.len()));
        }

        let mut r = data;
        let configuration_version = r.read_u8()?;
        let avc_profile_indication = r.read_u8()?;
        let profile_compatibility = r.read_u8()?;
        let avc_level_indication = r.read_u8()?;
        let length_size_minus_one = r.read_u8()? & 0x03;

        let num_sps = r.read_u8()? & 0x1f;
        let sps = read_parameter_sets(&mut r, usize::from(num_sps))?;

        let num_pps = r.read_u8()?;
        let pps = read_parameter_sets(&mut r, usize::from(num_pps))?;

        debug!(
            "parsed decoder configuration record: profile {} level {}, {} SPS, {} PPS, {} trailing bytes",
            avc_profile_indication,
            avc_level_indication,
            sps.len(),
            pps.len(),
            r.len()
        );

        Ok(Self {
            configuration_version,
            avc_profile_indication,
            profile_compatibility,
            avc_level_indication,
            length_size_minus_one,
            sps,
            pps,
        })
    }

    /// Size of the NAL unit length prefix used by the samples of the stream.
    pub fn nal_length_size(&self) -> usize {
        usize::from(self.length_size_minus_one & 0x03) + 1
    }

    /// Number of bytes [`Self::write_into`] produces.
    pub fn encoded_len(&self) -> usize {
        MIN_LEN
            + self
                .sps
                .iter()
                .chain(self.pps.iter())
                .map(|unit| 2 + unit.len())
                .sum::<usize>()
    }

    fn check_lengths(&self) -> Result<()> {
        if self.sps.len() > MAX_SPS_COUNT {
            return Err(Error::InvalidLength(self.sps.len()));
        }
        if self.pps.len() > MAX_PPS_COUNT {
            return Err(Error::InvalidLength(self.pps.len()));
        }

        match self
            .sps
            .iter()
            .chain(self.pps.iter())
            .find(|unit| unit.len() > usize::from(u16::MAX))
        {
            Some(unit) => Err(Error::InvalidLength(unit.len())),
            None => Ok(()),
        }
    }

    /// Writes the record to `w`. Nothing is written if a list or an entry is
    /// too long for its length field.
    pub fn write_into<W: Write>(&self, w: &mut W) -> Result<()> {
        self.check_lengths()?;

        w.write_u8(self.configuration_version)?;
        w.write_u8(self.avc_profile_indication)?;
        w.write_u8(self.profile_compatibility)?;
        w.write_u8(self.avc_level_indication)?;
        w.write_u8(0xfc | (self.length_size_minus_one & 0x03))?;

        w.write_u8(0xe0 | self.sps.len() as u8)?;
        write_parameter_sets(w, &self.sps)?;

        w.write_u8(self.pps.len() as u8)?;
        write_parameter_sets(w, &self.pps)?;

        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.encoded_len());
        self.write_into(&mut out)?;
        Ok(out)
    }
}
