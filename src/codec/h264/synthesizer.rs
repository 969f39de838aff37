// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use byteorder::BigEndian;
use byteorder::ByteOrder;
use log::debug;

use crate::bitstream_utils::BitWriter;
use crate::codec::h264::nalu::NalUnit;
use crate::codec::h264::nalu::NaluType;
use crate::codec::h264::parser::profile_has_chroma_info;
use crate::codec::h264::parser::scaling_list_len;
use crate::codec::h264::parser::HrdParams;
use crate::codec::h264::parser::Sps;
use crate::codec::h264::parser::VuiParams;
use crate::codec::h264::parser::EXTENDED_SAR;
use crate::error::Error;
use crate::error::Result;

mod private {
    pub trait NaluStruct {}
}

impl private::NaluStruct for Sps {}

impl private::NaluStruct for VuiParams {}

impl private::NaluStruct for HrdParams {}

/// A helper to output typed syntax structures using a [`BitWriter`].
pub struct Synthesizer<'n, N: private::NaluStruct> {
    writer: BitWriter,
    nalu: &'n N,
}

impl<'n, N: private::NaluStruct> Synthesizer<'n, N> {
    fn new(nalu: &'n N) -> Self {
        Self {
            writer: BitWriter::new(),
            nalu,
        }
    }

    fn u<T: Into<u32>>(&mut self, bits: usize, value: T) -> Result<()> {
        self.writer.write_f(bits, value)?;
        Ok(())
    }

    fn f<T: Into<u32>>(&mut self, bits: usize, value: T) -> Result<()> {
        self.writer.write_f(bits, value)?;
        Ok(())
    }

    fn ue<T: Into<u64>>(&mut self, value: T) {
        self.writer.write_ue(value);
    }

    fn se<T: Into<i64>>(&mut self, value: T) -> Result<()> {
        self.writer.write_se(value)
    }

    /// Big endian raw bytes, for the 16 and 32 bit VUI fields.
    fn u16_be(&mut self, value: u16) {
        let mut buf = [0u8; 2];
        BigEndian::write_u16(&mut buf, value);
        self.writer.write(&buf);
    }

    fn u32_be(&mut self, value: u32) {
        let mut buf = [0u8; 4];
        BigEndian::write_u32(&mut buf, value);
        self.writer.write(&buf);
    }

    fn hrd_parameters(&mut self, hrd_params: &HrdParams) -> Result<()> {
        // H.264 E.1.2
        let cpb_cnt_minus1 = hrd_params
            .cpb_cnt_minus1()
            .ok_or(Error::InvalidLength(0))?;

        self.ue(cpb_cnt_minus1 as u64);
        self.u(4, hrd_params.bit_rate_scale)?;
        self.u(4, hrd_params.cpb_size_scale)?;

        for cpb_spec in &hrd_params.cpb_specs {
            self.ue(cpb_spec.bit_rate_value_minus1);
            self.ue(cpb_spec.cpb_size_value_minus1);
            self.u(1, cpb_spec.cbr_flag)?;
        }

        self.u(5, hrd_params.initial_cpb_removal_delay_length_minus1)?;
        self.u(5, hrd_params.cpb_removal_delay_length_minus1)?;
        self.u(5, hrd_params.dpb_output_delay_length_minus1)?;
        self.u(5, hrd_params.time_offset_length)?;

        Ok(())
    }

    fn vui_parameters(&mut self, vui_params: &VuiParams) -> Result<()> {
        // H.264 E.1.1
        self.u(1, vui_params.aspect_ratio_info.is_some())?;
        if let Some(aspect_ratio_info) = &vui_params.aspect_ratio_info {
            self.u(8, aspect_ratio_info.aspect_ratio_idc)?;
            if aspect_ratio_info.aspect_ratio_idc == EXTENDED_SAR {
                self.u16_be(aspect_ratio_info.sar_width);
                self.u16_be(aspect_ratio_info.sar_height);
            }
        }

        self.u(1, vui_params.overscan_appropriate_flag.is_some())?;
        if let Some(overscan_appropriate_flag) = vui_params.overscan_appropriate_flag {
            self.u(1, overscan_appropriate_flag)?;
        }

        self.u(1, vui_params.video_signal_type.is_some())?;
        if let Some(video_signal_type) = &vui_params.video_signal_type {
            self.u(3, video_signal_type.video_format)?;
            self.u(1, video_signal_type.video_full_range_flag)?;

            self.u(1, video_signal_type.colour_description.is_some())?;
            if let Some(colour_description) = &video_signal_type.colour_description {
                self.u(8, colour_description.colour_primaries)?;
                self.u(8, colour_description.transfer_characteristics)?;
                self.u(8, colour_description.matrix_coefficients)?;
            }
        }

        self.u(1, vui_params.chroma_loc_info.is_some())?;
        if let Some(chroma_loc_info) = &vui_params.chroma_loc_info {
            self.ue(chroma_loc_info.chroma_sample_loc_type_top_field);
            self.ue(chroma_loc_info.chroma_sample_loc_type_bottom_field);
        }

        self.u(1, vui_params.timing_info.is_some())?;
        if let Some(timing_info) = &vui_params.timing_info {
            self.u32_be(timing_info.num_units_in_tick);
            self.u32_be(timing_info.time_scale);
            self.u(1, timing_info.fixed_frame_rate_flag)?;
        }

        self.u(1, vui_params.nal_hrd_parameters.is_some())?;
        if let Some(nal_hrd_parameters) = &vui_params.nal_hrd_parameters {
            self.hrd_parameters(nal_hrd_parameters)?;
        }
        self.u(1, vui_params.vcl_hrd_parameters.is_some())?;
        if let Some(vcl_hrd_parameters) = &vui_params.vcl_hrd_parameters {
            self.hrd_parameters(vcl_hrd_parameters)?;
        }

        if vui_params.nal_hrd_parameters.is_some() || vui_params.vcl_hrd_parameters.is_some() {
            self.u(1, vui_params.low_delay_hrd_flag)?;
        }

        self.u(1, vui_params.pic_struct_present_flag)?;

        self.u(1, vui_params.bitstream_restriction.is_some())?;
        if let Some(restriction) = &vui_params.bitstream_restriction {
            self.u(1, restriction.motion_vectors_over_pic_boundaries_flag)?;
            self.ue(restriction.max_bytes_per_pic_denom);
            self.ue(restriction.max_bits_per_mb_denom);
            self.ue(restriction.log2_max_mv_length_horizontal);
            self.ue(restriction.log2_max_mv_length_vertical);
            self.ue(restriction.max_num_reorder_frames);
            self.ue(restriction.max_dec_frame_buffering);
        }

        Ok(())
    }

    /// Closes the RBSP with a stop bit, unless it already ends on a byte
    /// boundary. The rest of the last byte stays zero.
    fn rbsp_trailing_bits(&mut self) -> Result<()> {
        if !self.writer.aligned() {
            self.f(1, true)?;
        }

        Ok(())
    }
}

impl<'n> Synthesizer<'n, Sps> {
    /// Encodes `sps` as a SPS RBSP.
    pub fn synthesize(sps: &'n Sps) -> Result<Vec<u8>> {
        let mut s = Self::new(sps);

        s.seq_parameter_set_data()?;
        s.rbsp_trailing_bits()?;

        debug!(
            "synthesized SPS {} into {} bytes",
            sps.seq_parameter_set_id,
            s.writer.bytes().len()
        );
        Ok(s.writer.into_bytes())
    }

    /// Encodes `sps` and wraps it into a NAL unit of type 7.
    pub fn synthesize_nalu(ref_idc: u8, sps: &'n Sps) -> Result<NalUnit> {
        Ok(NalUnit::new(ref_idc, NaluType::Sps, Self::synthesize(sps)?))
    }

    fn seq_scaling_matrix(&mut self) -> Result<()> {
        let sps = self.nalu;
        let Some(matrix) = &sps.seq_scaling_matrix else {
            return Ok(());
        };

        let scaling_list_count = if sps.chroma_format_idc != 3 { 8 } else { 12 };
        for i in 0..scaling_list_count {
            // Entries missing from the matrix are not present.
            match matrix.get(i).and_then(|deltas| deltas.as_ref()) {
                Some(deltas) => {
                    if deltas.len() != scaling_list_len(i) {
                        return Err(Error::InvalidLength(deltas.len()));
                    }

                    self.u(1, /* seq_scaling_list_present_flag */ true)?;
                    for delta_scale in deltas {
                        self.se(*delta_scale)?;
                    }
                }
                None => self.u(1, /* seq_scaling_list_present_flag */ false)?,
            }
        }

        Ok(())
    }

    fn seq_parameter_set_data(&mut self) -> Result<()> {
        // H.264 7.3.2.1.1
        let sps = self.nalu;

        self.u(8, sps.profile_idc)?;
        self.u(1, sps.constraint_set0_flag)?;
        self.u(1, sps.constraint_set1_flag)?;
        self.u(1, sps.constraint_set2_flag)?;
        self.u(1, sps.constraint_set3_flag)?;
        self.u(1, sps.constraint_set4_flag)?;
        self.u(1, sps.constraint_set5_flag)?;
        self.u(2, /* reserved_zero_2bits */ 0u32)?;
        self.u(8, sps.level_idc)?;
        self.ue(sps.seq_parameter_set_id);

        if profile_has_chroma_info(sps.profile_idc) {
            self.ue(sps.chroma_format_idc);

            if sps.chroma_format_idc == 3 {
                self.u(1, sps.separate_colour_plane_flag)?;
            }

            self.ue(sps.bit_depth_luma_minus8);
            self.ue(sps.bit_depth_chroma_minus8);
            self.u(1, sps.qpprime_y_zero_transform_bypass_flag)?;
            self.u(1, sps.seq_scaling_matrix.is_some())?;
            self.seq_scaling_matrix()?;
        }

        self.ue(sps.log2_max_frame_num_minus4);
        self.ue(sps.pic_order_cnt_type);

        if sps.pic_order_cnt_type == 0 {
            self.ue(sps.log2_max_pic_order_cnt_lsb_minus4);
        } else if sps.pic_order_cnt_type == 1 {
            self.u(1, sps.delta_pic_order_always_zero_flag)?;
            self.se(sps.offset_for_non_ref_pic)?;
            self.se(sps.offset_for_top_to_bottom_field)?;
            self.ue(sps.num_ref_frames_in_pic_order_cnt_cycle() as u64);

            for offset_for_ref_frame in &sps.offset_for_ref_frame {
                self.se(*offset_for_ref_frame)?;
            }
        }

        self.ue(sps.max_num_ref_frames);
        self.u(1, sps.gaps_in_frame_num_value_allowed_flag)?;
        self.ue(sps.pic_width_in_mbs_minus1);
        self.ue(sps.pic_height_in_map_units_minus1);
        self.u(1, sps.frame_mbs_only_flag)?;
        if !sps.frame_mbs_only_flag {
            self.u(1, sps.mb_adaptive_frame_field_flag)?;
        }
        self.u(1, sps.direct_8x8_inference_flag)?;

        self.u(1, sps.frame_cropping_flag)?;
        if sps.frame_cropping_flag {
            self.ue(sps.frame_crop_left_offset);
            self.ue(sps.frame_crop_right_offset);
            self.ue(sps.frame_crop_top_offset);
            self.ue(sps.frame_crop_bottom_offset);
        }

        self.u(1, sps.vui_parameters_present_flag)?;
        if sps.vui_parameters_present_flag {
            for vui_params in &sps.vui_parameters {
                self.vui_parameters(vui_params)?;
            }
        }

        Ok(())
    }
}

impl<'n> Synthesizer<'n, VuiParams> {
    /// Encodes the bits of `vui` alone. A partial last byte is padded with
    /// zero bits.
    pub fn synthesize(vui: &'n VuiParams) -> Result<Vec<u8>> {
        let mut s = Self::new(vui);
        s.vui_parameters(vui)?;
        Ok(s.writer.into_bytes())
    }
}

impl<'n> Synthesizer<'n, HrdParams> {
    /// Encodes the bits of `hrd` alone. A partial last byte is padded with
    /// zero bits.
    pub fn synthesize(hrd: &'n HrdParams) -> Result<Vec<u8>> {
        let mut s = Self::new(hrd);
        s.hrd_parameters(hrd)?;
        Ok(s.writer.into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitstream_utils::bitstring;
    use crate::codec::h264::parser::scaling_list_deltas;
    use crate::codec::h264::parser::AspectRatioInfo;
    use crate::codec::h264::parser::BitstreamRestriction;
    use crate::codec::h264::parser::ColourDescription;
    use crate::codec::h264::parser::CpbSpec;
    use crate::codec::h264::parser::Level;
    use crate::codec::h264::parser::Parser;
    use crate::codec::h264::parser::Profile;
    use crate::codec::h264::parser::SpsBuilder;
    use crate::codec::h264::parser::TimingInfo;
    use crate::codec::h264::parser::VideoSignalType;
    use crate::codec::h264::parser::DEFAULT_4X4_INTRA;

    /// Delta scales {0, 1, -1, 2, -2, ..., 7, -7, 8} and their codes.
    const DELTAS_16: [i32; 16] = [0, 1, -1, 2, -2, 3, -3, 4, -4, 5, -5, 6, -6, 7, -7, 8];
    const DELTAS_16_BITS: &str = "1 010 011 00100 00101 00110 00111 0001000 0001001 0001010 \
                                  0001011 0001100 0001101 0001110 0001111 000010000";

    fn round_trip(sps: &Sps) {
        let rbsp = Synthesizer::<Sps>::synthesize(sps).unwrap();
        assert_eq!(&Parser::parse_sps_rbsp(&rbsp).unwrap(), sps);
    }

    #[test]
    fn synthesize_empty_sps() {
        let rbsp = Synthesizer::<Sps>::synthesize(&Sps::default()).unwrap();
        assert_eq!(rbsp, [0x00, 0x00, 0x00, 0xfb, 0x04]);
    }

    #[test]
    fn synthesize_parsed_sps() {
        let vectors = [
            vec![0x00, 0x00, 0x0a, 0xfb, 0x88],
            bitstring("10101010 10101100 10101010 010 1 1 1 1 0 1 1 0 0 0 0 0 1"),
            bitstring("00000000 00000000 00000000 010 1 1 1 1 0 1 1 0 0 0 0 0 1"),
            bitstring(
                "01100100 00000000 00000000 1 00100 1 011 010 1 0 \
                 1 1 1 1 0 1 1 0 0 0 0 0 1",
            ),
            bitstring(
                "00000000 00000000 00000000 1 1 010 1 011 00100 1 \
                 1 0 1 1 0 0 0 0 0",
            ),
        ];

        for rbsp in vectors {
            let sps = Parser::parse_sps_rbsp(&rbsp).unwrap();
            assert_eq!(Synthesizer::<Sps>::synthesize(&sps).unwrap(), rbsp);
        }
    }

    #[test]
    fn chroma_format_zero_is_coded() {
        let sps = Sps {
            profile_idc: 100,
            ..Default::default()
        };

        let expected = bitstring(
            "01100100 00000000 00000000 1 1 1 1 0 0 \
             1 1 1 1 0 1 1 0 0 0 0 0 1",
        );
        assert_eq!(Synthesizer::<Sps>::synthesize(&sps).unwrap(), expected);
        round_trip(&sps);
    }

    #[test]
    fn synthesize_scaling_matrix() {
        let mut matrix = vec![None; 8];
        matrix[0] = Some(DELTAS_16.to_vec());
        matrix[2] = Some(DELTAS_16.to_vec());
        matrix[4] = Some(DELTAS_16.to_vec());
        matrix[6] = Some(DELTAS_16.repeat(4));

        let sps = Sps {
            profile_idc: 100,
            seq_scaling_matrix: Some(matrix),
            ..Default::default()
        };

        let list = format!("1 {}", DELTAS_16_BITS);
        let list_8x8 = format!("1 {0} {0} {0} {0}", DELTAS_16_BITS);
        let expected = bitstring(&format!(
            "01100100 00000000 00000000 1 1 1 1 0 1 \
             {list} 0 {list} 0 {list} 0 {list_8x8} 0 \
             1 1 1 1 0 1 1 0 0 0 0 0 1"
        ));

        assert_eq!(Synthesizer::<Sps>::synthesize(&sps).unwrap(), expected);
        round_trip(&sps);
    }

    #[test]
    fn synthesize_empty_scaling_matrix_444() {
        let sps = Sps {
            profile_idc: 100,
            chroma_format_idc: 3,
            seq_scaling_matrix: Some(vec![None; 12]),
            ..Default::default()
        };

        let expected = bitstring(
            "01100100 00000000 00000000 1 00100 0 1 1 0 1 000000000000 \
             1 1 1 1 0 1 1 0 0 0 0 0 1",
        );
        assert_eq!(Synthesizer::<Sps>::synthesize(&sps).unwrap(), expected);
        round_trip(&sps);
    }

    #[test]
    fn short_scaling_matrix_is_padded() {
        let sps = Sps {
            profile_idc: 100,
            seq_scaling_matrix: Some(vec![]),
            ..Default::default()
        };

        let rbsp = Synthesizer::<Sps>::synthesize(&sps).unwrap();
        let parsed = Parser::parse_sps_rbsp(&rbsp).unwrap();
        assert_eq!(parsed.seq_scaling_matrix, Some(vec![None; 8]));
    }

    #[test]
    fn wrong_scaling_list_length() {
        let sps = Sps {
            profile_idc: 100,
            seq_scaling_matrix: Some(vec![Some(vec![0; 15])]),
            ..Default::default()
        };

        assert_eq!(
            Synthesizer::<Sps>::synthesize(&sps),
            Err(Error::InvalidLength(15))
        );
    }

    #[test]
    fn scaling_matrix_from_builder() {
        let mut custom = DEFAULT_4X4_INTRA;
        custom[15] = 200;

        let sps = SpsBuilder::new()
            .profile_idc(Profile::High)
            .level_idc(Level::L4)
            .chroma_format_idc(1)
            .seq_scaling_matrix(&[Some(&custom[..]), None, None, Some(&custom[..])])
            .build();

        round_trip(&sps);
        let lists = sps.scaling_lists_4x4();
        assert_eq!(lists[0], custom);
        assert_eq!(lists[3], custom);
        assert_eq!(lists[5], custom);
        assert_eq!(
            sps.seq_scaling_matrix.as_ref().unwrap()[0],
            Some(scaling_list_deltas(&custom))
        );
    }

    #[test]
    fn synthesize_cropping() {
        let sps = Sps {
            frame_cropping_flag: true,
            frame_crop_left_offset: 1,
            frame_crop_right_offset: 2,
            frame_crop_top_offset: 3,
            frame_crop_bottom_offset: 4,
            ..Default::default()
        };

        let expected = bitstring(
            "00000000 00000000 00000000 \
             1 1 1 1 1 0 1 1 0 0 0 1 010 011 00100 00101 0 1",
        );
        assert_eq!(Synthesizer::<Sps>::synthesize(&sps).unwrap(), expected);
        round_trip(&sps);
    }

    #[test]
    fn synthesize_poc_type_1() {
        let sps = Sps {
            pic_order_cnt_type: 1,
            delta_pic_order_always_zero_flag: true,
            offset_for_non_ref_pic: -1,
            offset_for_top_to_bottom_field: 2,
            ..Default::default()
        };

        // The fields end on a byte boundary, so no stop bit follows.
        let expected = bitstring(
            "00000000 00000000 00000000 \
             1 1 010 1 011 00100 1 1 0 1 1 0 0 0 0 0",
        );
        assert_eq!(expected.len(), 6);
        assert_eq!(Synthesizer::<Sps>::synthesize(&sps).unwrap(), expected);
        round_trip(&sps);
    }

    fn full_vui() -> VuiParams {
        VuiParams {
            aspect_ratio_info: Some(AspectRatioInfo {
                aspect_ratio_idc: EXTENDED_SAR,
                sar_width: 64,
                sar_height: 45,
            }),
            overscan_appropriate_flag: Some(false),
            video_signal_type: Some(VideoSignalType {
                video_format: 2,
                video_full_range_flag: true,
                colour_description: Some(ColourDescription {
                    colour_primaries: 9,
                    transfer_characteristics: 16,
                    matrix_coefficients: 9,
                }),
            }),
            chroma_loc_info: None,
            timing_info: Some(TimingInfo {
                num_units_in_tick: 1,
                time_scale: 50,
                fixed_frame_rate_flag: true,
            }),
            nal_hrd_parameters: Some(HrdParams {
                bit_rate_scale: 4,
                cpb_size_scale: 6,
                cpb_specs: vec![
                    CpbSpec {
                        bit_rate_value_minus1: 15624,
                        cpb_size_value_minus1: 31249,
                        cbr_flag: false,
                    },
                    CpbSpec {
                        bit_rate_value_minus1: 31249,
                        cpb_size_value_minus1: 62499,
                        cbr_flag: true,
                    },
                ],
                initial_cpb_removal_delay_length_minus1: 23,
                cpb_removal_delay_length_minus1: 23,
                dpb_output_delay_length_minus1: 23,
                time_offset_length: 24,
            }),
            vcl_hrd_parameters: Some(HrdParams::default()),
            low_delay_hrd_flag: true,
            pic_struct_present_flag: true,
            bitstream_restriction: Some(BitstreamRestriction {
                motion_vectors_over_pic_boundaries_flag: true,
                max_bytes_per_pic_denom: 2,
                max_bits_per_mb_denom: 1,
                log2_max_mv_length_horizontal: 16,
                log2_max_mv_length_vertical: 16,
                max_num_reorder_frames: 2,
                max_dec_frame_buffering: 4,
            }),
        }
    }

    #[test]
    fn vui_round_trip() {
        let sps = Sps {
            profile_idc: Profile::High as u8,
            level_idc: Level::L4_1 as u8,
            chroma_format_idc: 1,
            frame_mbs_only_flag: true,
            pic_width_in_mbs_minus1: 119,
            pic_height_in_map_units_minus1: 67,
            vui_parameters_present_flag: true,
            vui_parameters: vec![full_vui()],
            ..Default::default()
        };

        round_trip(&sps);
    }

    #[test]
    fn every_vui_is_written() {
        let sps = Sps {
            vui_parameters_present_flag: true,
            vui_parameters: vec![VuiParams::default(), full_vui(), VuiParams::default()],
            ..Default::default()
        };

        round_trip(&sps);
    }

    #[test]
    fn vuis_skipped_without_flag() {
        let sps = Sps {
            vui_parameters_present_flag: false,
            vui_parameters: vec![full_vui()],
            ..Default::default()
        };

        let rbsp = Synthesizer::<Sps>::synthesize(&sps).unwrap();
        assert_eq!(rbsp, [0x00, 0x00, 0x00, 0xfb, 0x04]);
    }

    #[test]
    fn synthesize_vui_alone() {
        assert_eq!(
            Synthesizer::<VuiParams>::synthesize(&VuiParams::default()).unwrap(),
            [0x00, 0x00]
        );

        let vui = full_vui();
        let bytes = Synthesizer::<VuiParams>::synthesize(&vui).unwrap();
        let mut r = crate::bitstream_utils::BitReader::new(&bytes);
        assert_eq!(Parser::parse_vui(&mut r).unwrap(), vui);
    }

    #[test]
    fn synthesize_hrd_alone() {
        // cpb_cnt_minus1 0, both scales 0, one CPB of zeros and four zero
        // lengths.
        assert_eq!(
            Synthesizer::<HrdParams>::synthesize(&HrdParams::default()).unwrap(),
            [0x80, 0x60, 0x00, 0x00]
        );
    }

    #[test]
    fn hrd_fields_are_masked() {
        let hrd = HrdParams {
            bit_rate_scale: 0x1f,
            time_offset_length: 0xff,
            ..Default::default()
        };

        let bytes = Synthesizer::<HrdParams>::synthesize(&hrd).unwrap();
        let mut r = crate::bitstream_utils::BitReader::new(&bytes);
        let parsed = Parser::parse_hrd(&mut r).unwrap();

        assert_eq!(parsed.bit_rate_scale, 0x0f);
        assert_eq!(parsed.time_offset_length, 0x1f);
    }

    #[test]
    fn hrd_without_cpb() {
        let hrd = HrdParams {
            cpb_specs: vec![],
            ..Default::default()
        };

        assert_eq!(
            Synthesizer::<HrdParams>::synthesize(&hrd),
            Err(Error::InvalidLength(0))
        );

        let sps = Sps {
            vui_parameters_present_flag: true,
            vui_parameters: vec![VuiParams {
                vcl_hrd_parameters: Some(hrd),
                ..Default::default()
            }],
            ..Default::default()
        };
        assert_eq!(
            Synthesizer::<Sps>::synthesize(&sps),
            Err(Error::InvalidLength(0))
        );
    }

    #[test]
    fn synthesize_nalu() {
        let sps = SpsBuilder::new()
            .seq_parameter_set_id(3)
            .profile_idc(Profile::Main)
            .level_idc(Level::L3_1)
            .frame_mbs_only_flag(true)
            .resolution(1280, 720)
            .aspect_ratio(1, 1)
            .timing_info(1, 60, false)
            .build();

        let nalu = Synthesizer::<Sps>::synthesize_nalu(3, &sps).unwrap();
        assert_eq!(nalu.nalu_type(), Some(NaluType::Sps));

        let bytes = nalu.to_bytes().unwrap();
        assert_eq!(bytes[0], 0xe7);

        let mut parser = Parser::default();
        let parsed = parser.parse_sps(&NalUnit::parse(&bytes).unwrap()).unwrap();
        assert_eq!(**parsed, *sps);
        assert_eq!(parsed.visible_rectangle().max.y, 720);
    }
}
