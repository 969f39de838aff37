// Copyright 2025 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! NAL unit header extensions carried by prefix units (type 14), coded slice
//! extensions (type 20) and depth slice extensions (type 21).

use bytes::BufMut;

use crate::error::Error;
use crate::error::Result;

/// `nal_unit_header_svc_extension()`, G.7.3.1.1.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SvcExtension {
    pub idr_flag: bool,
    /// 6 bits.
    pub priority_id: u8,
    pub no_inter_layer_pred_flag: bool,
    /// 3 bits.
    pub dependency_id: u8,
    /// 4 bits.
    pub quality_id: u8,
    /// 3 bits.
    pub temporal_id: u8,
    pub use_ref_base_pic_flag: bool,
    pub discardable_flag: bool,
    pub output_flag: bool,
}

impl SvcExtension {
    pub const LEN: usize = 3;

    pub fn parse(data: &[u8]) -> Result<Self> {
        let [b0, b1, b2]: [u8; Self::LEN] = data
            .try_into()
            .map_err(|_| Error::InvalidLength(data.len()))?;

        Ok(Self {
            idr_flag: (b0 >> 6) & 1 == 1,
            priority_id: b0 & 0x3f,
            no_inter_layer_pred_flag: b1 >> 7 == 1,
            dependency_id: (b1 >> 4) & 0x07,
            quality_id: b1 & 0x0f,
            temporal_id: b2 >> 5,
            use_ref_base_pic_flag: (b2 >> 4) & 1 == 1,
            discardable_flag: (b2 >> 3) & 1 == 1,
            output_flag: (b2 >> 2) & 1 == 1,
        })
    }

    /// The leading `svc_extension_flag` and the two trailing
    /// `reserved_three_2bits` are always set.
    pub fn to_bytes(&self) -> [u8; Self::LEN] {
        [
            0x80 | u8::from(self.idr_flag) << 6 | (self.priority_id & 0x3f),
            u8::from(self.no_inter_layer_pred_flag) << 7
                | (self.dependency_id & 0x07) << 4
                | (self.quality_id & 0x0f),
            (self.temporal_id & 0x07) << 5
                | u8::from(self.use_ref_base_pic_flag) << 4
                | u8::from(self.discardable_flag) << 3
                | u8::from(self.output_flag) << 2
                | 0b11,
        ]
    }
}

/// `nal_unit_header_3davc_extension()`, J.7.3.1.1.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Avc3dExtension {
    pub view_idx: u8,
    pub depth_flag: bool,
    pub non_idr_flag: bool,
    /// 3 bits.
    pub temporal_id: u8,
    pub anchor_pic_flag: bool,
    pub inter_view_flag: bool,
}

impl Avc3dExtension {
    pub const LEN: usize = 2;

    pub fn parse(data: &[u8]) -> Result<Self> {
        let [b0, b1]: [u8; Self::LEN] = data
            .try_into()
            .map_err(|_| Error::InvalidLength(data.len()))?;

        Ok(Self {
            view_idx: (b0 & 0x7f) << 1 | b1 >> 7,
            depth_flag: (b1 >> 6) & 1 == 1,
            non_idr_flag: (b1 >> 5) & 1 == 1,
            temporal_id: (b1 >> 2) & 0x07,
            anchor_pic_flag: (b1 >> 1) & 1 == 1,
            inter_view_flag: b1 & 1 == 1,
        })
    }

    /// `view_idx` straddles the two bytes, after the set `avc_3d_extension_flag`.
    pub fn to_bytes(&self) -> [u8; Self::LEN] {
        [
            0x80 | self.view_idx >> 1,
            (self.view_idx & 1) << 7
                | u8::from(self.depth_flag) << 6
                | u8::from(self.non_idr_flag) << 5
                | (self.temporal_id & 0x07) << 2
                | u8::from(self.anchor_pic_flag) << 1
                | u8::from(self.inter_view_flag),
        ]
    }
}

/// `nal_unit_header_mvc_extension()`, H.7.3.1.1.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MvcExtension {
    pub non_idr_flag: bool,
    /// 6 bits.
    pub priority_id: u8,
    /// 10 bits.
    pub view_id: u16,
    /// 3 bits.
    pub temporal_id: u8,
    pub anchor_pic_flag: bool,
    pub inter_view_flag: bool,
    pub reserved_one_bit: bool,
}

impl MvcExtension {
    pub const LEN: usize = 3;

    pub fn parse(data: &[u8]) -> Result<Self> {
        let [b0, b1, b2]: [u8; Self::LEN] = data
            .try_into()
            .map_err(|_| Error::InvalidLength(data.len()))?;

        Ok(Self {
            non_idr_flag: (b0 >> 6) & 1 == 1,
            priority_id: b0 & 0x3f,
            view_id: u16::from(b1) << 2 | u16::from(b2 >> 6),
            temporal_id: (b2 >> 3) & 0x07,
            anchor_pic_flag: (b2 >> 2) & 1 == 1,
            inter_view_flag: (b2 >> 1) & 1 == 1,
            reserved_one_bit: b2 & 1 == 1,
        })
    }

    pub fn to_bytes(&self) -> [u8; Self::LEN] {
        [
            u8::from(self.non_idr_flag) << 6 | (self.priority_id & 0x3f),
            (self.view_id >> 2) as u8,
            ((self.view_id & 0x03) as u8) << 6
                | (self.temporal_id & 0x07) << 3
                | u8::from(self.anchor_pic_flag) << 2
                | u8::from(self.inter_view_flag) << 1
                | u8::from(self.reserved_one_bit),
        ]
    }
}

/// The header extension following the first NAL unit header byte. At most
/// one is present per unit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NaluHeaderExtension {
    Svc(SvcExtension),
    Avc3d(Avc3dExtension),
    Mvc(MvcExtension),
}

impl NaluHeaderExtension {
    /// Encoded length in bytes.
    pub fn encoded_len(&self) -> usize {
        match self {
            Self::Svc(_) => SvcExtension::LEN,
            Self::Avc3d(_) => Avc3dExtension::LEN,
            Self::Mvc(_) => MvcExtension::LEN,
        }
    }

    pub fn write_into<B: BufMut>(&self, out: &mut B) {
        match self {
            Self::Svc(ext) => out.put_slice(&ext.to_bytes()),
            Self::Avc3d(ext) => out.put_slice(&ext.to_bytes()),
            Self::Mvc(ext) => out.put_slice(&ext.to_bytes()),
        }
    }
}
