// Copyright 2025 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use bytes::Buf;
use bytes::BufMut;
use enumn::N;
use log::debug;
use log::warn;

use crate::codec::h264::emulation_prevention;
use crate::codec::h264::nalu_extension::Avc3dExtension;
use crate::codec::h264::nalu_extension::MvcExtension;
use crate::codec::h264::nalu_extension::NaluHeaderExtension;
use crate::codec::h264::nalu_extension::SvcExtension;
use crate::error::Error;
use crate::error::Result;

#[derive(N, Debug, PartialEq, Eq, Clone, Copy)]
#[repr(u8)]
pub enum NaluType {
    Unknown = 0,
    Slice = 1,
    SliceDpa = 2,
    SliceDpb = 3,
    SliceDpc = 4,
    SliceIdr = 5,
    Sei = 6,
    Sps = 7,
    Pps = 8,
    AuDelimiter = 9,
    SeqEnd = 10,
    StreamEnd = 11,
    FillerData = 12,
    SpsExt = 13,
    PrefixUnit = 14,
    SubsetSps = 15,
    DepthSps = 16,
    SliceAux = 19,
    SliceExt = 20,
    SliceDepth = 21,
}

impl NaluType {
    /// Whether units of this type carry a header extension after the first
    /// header byte.
    pub fn has_header_extension(self) -> bool {
        matches!(self, Self::PrefixUnit | Self::SliceExt | Self::SliceDepth)
    }
}

/// A NAL unit with its payload in RBSP form, i.e. without emulation
/// prevention bytes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NalUnit {
    /// 2 bits.
    pub ref_idc: u8,
    /// 5 bits. Kept raw so reserved and unspecified types survive a round
    /// trip, see [`NalUnit::nalu_type`].
    pub unit_type: u8,
    /// Mandatory for types 14, 20 and 21, ignored for every other type.
    pub extension: Option<NaluHeaderExtension>,
    pub rbsp: Vec<u8>,
}

/// Splits `n` bytes off the front of `data`.
fn take<'a>(data: &mut &'a [u8], n: usize) -> Result<&'a [u8]> {
    if data.remaining() < n {
        return Err(Error::UnexpectedEndOfStream);
    }

    let (head, tail) = data.split_at(n);
    *data = tail;
    Ok(head)
}

impl NalUnit {
    pub fn new(ref_idc: u8, nalu_type: NaluType, rbsp: Vec<u8>) -> Self {
        Self {
            ref_idc,
            unit_type: nalu_type as u8,
            extension: None,
            rbsp,
        }
    }

    pub fn nalu_type(&self) -> Option<NaluType> {
        NaluType::n(self.unit_type)
    }

    /// Size of the header, extension included.
    pub fn header_len(&self) -> usize {
        1 + self.extension.as_ref().map_or(0, |ext| ext.encoded_len())
    }

    /// Parses one escaped NAL unit, without start code or length prefix.
    pub fn parse(mut data: &[u8]) -> Result<Self> {
        if !data.has_remaining() {
            return Err(Error::UnexpectedEndOfStream);
        }

        // forbidden_zero_bit is not checked.
        let header = data.get_u8();
        let ref_idc = (header >> 5) & 0x03;
        let unit_type = header & 0x1f;

        let extension = match NaluType::n(unit_type) {
            Some(NaluType::PrefixUnit | NaluType::SliceExt) => {
                let bytes = take(&mut data, SvcExtension::LEN)?;
                if bytes[0] >> 7 == 1 {
                    Some(NaluHeaderExtension::Svc(SvcExtension::parse(bytes)?))
                } else {
                    Some(NaluHeaderExtension::Mvc(MvcExtension::parse(bytes)?))
                }
            }
            Some(NaluType::SliceDepth) => {
                let avc_3d_extension_flag = data.first().ok_or(Error::UnexpectedEndOfStream)? >> 7;
                if avc_3d_extension_flag == 1 {
                    let bytes = take(&mut data, Avc3dExtension::LEN)?;
                    Some(NaluHeaderExtension::Avc3d(Avc3dExtension::parse(bytes)?))
                } else {
                    let bytes = take(&mut data, MvcExtension::LEN)?;
                    Some(NaluHeaderExtension::Mvc(MvcExtension::parse(bytes)?))
                }
            }
            _ => None,
        };

        let rbsp = emulation_prevention::unescape(data);

        debug!(
            "parsed NAL unit type {} ref_idc {} with {} bytes of RBSP",
            unit_type,
            ref_idc,
            rbsp.len()
        );

        Ok(Self {
            ref_idc,
            unit_type,
            extension,
            rbsp,
        })
    }

    /// Writes the header, the header extension and the escaped payload.
    pub fn write_into<B: BufMut>(&self, out: &mut B) -> Result<()> {
        let unit_type = self.unit_type & 0x1f;
        let header = 0x80 | (self.ref_idc & 0x03) << 5 | unit_type;

        match (NaluType::n(unit_type), &self.extension) {
            (
                Some(NaluType::PrefixUnit | NaluType::SliceExt),
                Some(ext @ (NaluHeaderExtension::Svc(_) | NaluHeaderExtension::Mvc(_))),
            )
            | (
                Some(NaluType::SliceDepth),
                Some(ext @ (NaluHeaderExtension::Avc3d(_) | NaluHeaderExtension::Mvc(_))),
            ) => {
                out.put_u8(header);
                ext.write_into(out);
            }
            (Some(nalu_type), _) if nalu_type.has_header_extension() => {
                return Err(Error::InvalidHeader(unit_type));
            }
            (_, Some(_)) => {
                warn!(
                    "NAL unit type {} takes no header extension, dropping it",
                    unit_type
                );
                out.put_u8(header);
            }
            (_, None) => out.put_u8(header),
        }

        emulation_prevention::escape_into(&self.rbsp, out);
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.header_len() + self.rbsp.len() + self.rbsp.len() / 2);
        self.write_into(&mut out)?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(unit_type: u8, extension: Option<NaluHeaderExtension>) -> NalUnit {
        NalUnit {
            ref_idc: 1,
            unit_type,
            extension,
            rbsp: vec![0x01, 0x02],
        }
    }

    fn check(nalu: &NalUnit, bytes: &[u8]) {
        assert_eq!(nalu.to_bytes().unwrap(), bytes);
        assert_eq!(&NalUnit::parse(bytes).unwrap(), nalu);
    }

    #[test]
    fn empty_unit() {
        check(&NalUnit::default(), &[0x80]);
        assert_eq!(NalUnit::default().nalu_type(), Some(NaluType::Unknown));
    }

    #[test]
    fn header_fields() {
        let nalu = NalUnit::new(3, NaluType::Sps, vec![0x42, 0x00, 0x1f]);
        check(&nalu, &[0xe7, 0x42, 0x00, 0x1f]);
        assert_eq!(nalu.nalu_type(), Some(NaluType::Sps));
        assert_eq!(nalu.header_len(), 1);

        // forbidden_zero_bit is ignored when parsing.
        assert_eq!(NalUnit::parse(&[0x67, 0x42, 0x00, 0x1f]).unwrap(), nalu);

        let reserved = NalUnit {
            unit_type: 17,
            ..Default::default()
        };
        check(&reserved, &[0x91]);
        assert_eq!(reserved.nalu_type(), None);
    }

    #[test]
    fn prefix_unit_extensions() {
        check(
            &unit(14, Some(NaluHeaderExtension::Svc(Default::default()))),
            &[0xae, 0x80, 0x00, 0x03, 0x01, 0x02],
        );
        check(
            &unit(14, Some(NaluHeaderExtension::Mvc(Default::default()))),
            &[0xae, 0x00, 0x00, 0x00, 0x01, 0x02],
        );
    }

    #[test]
    fn slice_ext_extensions() {
        check(
            &unit(20, Some(NaluHeaderExtension::Svc(Default::default()))),
            &[0xb4, 0x80, 0x00, 0x03, 0x01, 0x02],
        );
        check(
            &unit(20, Some(NaluHeaderExtension::Mvc(Default::default()))),
            &[0xb4, 0x00, 0x00, 0x00, 0x01, 0x02],
        );
    }

    #[test]
    fn slice_depth_extensions() {
        let avc3d = unit(21, Some(NaluHeaderExtension::Avc3d(Default::default())));
        check(&avc3d, &[0xb5, 0x80, 0x00, 0x01, 0x02]);
        assert_eq!(avc3d.header_len(), 3);

        check(
            &unit(21, Some(NaluHeaderExtension::Mvc(Default::default()))),
            &[0xb5, 0x00, 0x00, 0x00, 0x01, 0x02],
        );

        let ext = Avc3dExtension {
            view_idx: 7,
            depth_flag: true,
            non_idr_flag: true,
            temporal_id: 2,
            anchor_pic_flag: false,
            inter_view_flag: true,
        };
        let nalu = unit(21, Some(NaluHeaderExtension::Avc3d(ext)));
        assert_eq!(NalUnit::parse(&nalu.to_bytes().unwrap()).unwrap(), nalu);
    }

    #[test]
    fn missing_extension() {
        for unit_type in [14, 20, 21] {
            assert_eq!(
                unit(unit_type, None).to_bytes(),
                Err(Error::InvalidHeader(unit_type))
            );
        }

        assert_eq!(
            unit(14, Some(NaluHeaderExtension::Avc3d(Default::default()))).to_bytes(),
            Err(Error::InvalidHeader(14))
        );
        assert_eq!(
            unit(21, Some(NaluHeaderExtension::Svc(Default::default()))).to_bytes(),
            Err(Error::InvalidHeader(21))
        );
    }

    #[test]
    fn extension_on_plain_unit_is_dropped() {
        let nalu = unit(1, Some(NaluHeaderExtension::Svc(Default::default())));
        assert_eq!(nalu.to_bytes().unwrap(), vec![0xa1, 0x01, 0x02]);
    }

    #[test]
    fn truncated_extension() {
        assert_eq!(NalUnit::parse(&[]), Err(Error::UnexpectedEndOfStream));
        assert_eq!(
            NalUnit::parse(&[0xae, 0x80, 0x00]),
            Err(Error::UnexpectedEndOfStream)
        );
        assert_eq!(NalUnit::parse(&[0xb5]), Err(Error::UnexpectedEndOfStream));
        assert_eq!(NalUnit::parse(&[0xb5, 0x80]), Err(Error::UnexpectedEndOfStream));
        assert_eq!(
            NalUnit::parse(&[0xb5, 0x00, 0x00]),
            Err(Error::UnexpectedEndOfStream)
        );
    }

    #[test]
    fn emulation_prevention_non_contiguous() {
        let nalu = NalUnit {
            rbsp: vec![
                0xff, 0x00, 0x00, 0x03, 0xff, 0x00, 0x00, 0x02, 0xff, 0x00, 0x00, 0x01, 0xff, 0x00,
                0x00, 0x00, 0xff,
            ],
            ..Default::default()
        };

        check(
            &nalu,
            &[
                0x80, 0xff, 0x00, 0x00, 0x03, 0x03, 0xff, 0x00, 0x00, 0x03, 0x02, 0xff, 0x00, 0x00,
                0x03, 0x01, 0xff, 0x00, 0x00, 0x03, 0x00, 0xff,
            ],
        );
    }

    #[test]
    fn emulation_prevention_contiguous() {
        let nalu = NalUnit {
            rbsp: vec![
                0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x03, 0x03, 0x03, 0x03, 0x00, 0x00,
                0x03,
            ],
            ..Default::default()
        };

        check(
            &nalu,
            &[
                0x80, 0x00, 0x00, 0x03, 0x00, 0x00, 0x03, 0x00, 0x00, 0x03, 0x00, 0x00, 0x03, 0x03,
                0x03, 0x03, 0x03, 0x00, 0x00, 0x03, 0x03,
            ],
        );

        let nalu = NalUnit {
            rbsp: vec![0x00, 0x00, 0x03, 0x00, 0x00, 0x00, 0x00],
            ..Default::default()
        };
        check(
            &nalu,
            &[0x80, 0x00, 0x00, 0x03, 0x03, 0x00, 0x00, 0x03, 0x00, 0x00],
        );
    }
}
