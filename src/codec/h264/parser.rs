// Copyright 2022 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use std::collections::BTreeMap;
use std::rc::Rc;

use byteorder::BigEndian;
use byteorder::ByteOrder;
use enumn::N;
use log::debug;
use log::trace;
use log::warn;

use crate::bitstream_utils::BitReader;
use crate::codec::h264::nalu::NalUnit;
use crate::codec::h264::nalu::NaluType;
use crate::error::Error;
use crate::error::Result;

pub(super) const DEFAULT_4X4_INTRA: [u8; 16] = [
    6, 13, 13, 20, 20, 20, 28, 28, 28, 28, 32, 32, 32, 37, 37, 42,
];

pub(super) const DEFAULT_4X4_INTER: [u8; 16] = [
    10, 14, 14, 20, 20, 20, 24, 24, 24, 24, 27, 27, 27, 30, 30, 34,
];

pub(super) const DEFAULT_8X8_INTRA: [u8; 64] = [
    6, 10, 10, 13, 11, 13, 16, 16, 16, 16, 18, 18, 18, 18, 18, 23, 23, 23, 23, 23, 23, 25, 25, 25,
    25, 25, 25, 25, 27, 27, 27, 27, 27, 27, 27, 27, 29, 29, 29, 29, 29, 29, 29, 31, 31, 31, 31, 31,
    31, 33, 33, 33, 33, 33, 36, 36, 36, 36, 38, 38, 38, 40, 40, 42,
];

pub(super) const DEFAULT_8X8_INTER: [u8; 64] = [
    9, 13, 13, 15, 13, 15, 17, 17, 17, 17, 19, 19, 19, 19, 19, 21, 21, 21, 21, 21, 21, 22, 22, 22,
    22, 22, 22, 22, 24, 24, 24, 24, 24, 24, 24, 24, 25, 25, 25, 25, 25, 25, 25, 27, 27, 27, 27, 27,
    27, 28, 28, 28, 28, 28, 30, 30, 30, 30, 32, 32, 32, 33, 33, 35,
];

/// `aspect_ratio_idc` value signalling an explicit `sar_width`/`sar_height` pair.
pub const EXTENDED_SAR: u8 = 255;

/// Profiles whose SPS carries the chroma format, bit depth and scaling matrix
/// fields. See 7.3.2.1.1.
const CHROMA_INFO_PROFILES: [u8; 13] = [
    100, 110, 122, 244, 44, 83, 86, 118, 128, 138, 139, 134, 135,
];

pub(super) fn profile_has_chroma_info(profile_idc: u8) -> bool {
    CHROMA_INFO_PROFILES.contains(&profile_idc)
}

/// Number of delta scales carried by scaling list `i` of a sequence scaling
/// matrix: the first six lists are 4x4, the others 8x8.
pub(super) const fn scaling_list_len(i: usize) -> usize {
    if i < 6 {
        16
    } else {
        64
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Point<T> {
    pub x: T,
    pub y: T,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Rect<T> {
    pub min: Point<T>,
    pub max: Point<T>,
}

#[derive(N, Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Profile {
    Cavlc444 = 44,
    Baseline = 66,
    Main = 77,
    ScalableBaseline = 83,
    ScalableHigh = 86,
    Extended = 88,
    High = 100,
    High10 = 110,
    MultiviewHigh = 118,
    High422P = 122,
    StereoHigh = 128,
    MfcHigh = 134,
    MfcDepthHigh = 135,
    MultiviewDepthHigh = 138,
    EnhancedMultiviewDepthHigh = 139,
    High444P = 244,
}

#[derive(N, Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Level {
    #[default]
    L1 = 10,
    L1B = 9,
    L1_1 = 11,
    L1_2 = 12,
    L1_3 = 13,
    L2_0 = 20,
    L2_1 = 21,
    L2_2 = 22,
    L3 = 30,
    L3_1 = 31,
    L3_2 = 32,
    L4 = 40,
    L4_1 = 41,
    L4_2 = 42,
    L5 = 50,
    L5_1 = 51,
    L5_2 = 52,
    L6 = 60,
    L6_1 = 61,
    L6_2 = 62,
}

/// Delta scales of one scaling list, `None` when
/// `seq_scaling_list_present_flag[i]` is not set.
pub type ScalingListDeltas = Option<Vec<i32>>;

/// A H264 Sequence Parameter Set. A syntax structure containing syntax elements
/// that apply to zero or more entire coded video sequences as determined by the
/// content of a seq_parameter_set_id syntax element found in the picture
/// parameter set referred to by the pic_parameter_set_id syntax element found
/// in each slice header.
///
/// Fields hold the values as coded. Nothing is inferred while parsing, so a
/// parsed SPS synthesizes back to the same bits.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Sps {
    /// Profile to which the coded video sequence conforms
    pub profile_idc: u8,

    /// Retains the same meaning as in the specification. See 7.4.2.1.1
    pub constraint_set0_flag: bool,
    /// Retains the same meaning as in the specification. See 7.4.2.1.1
    pub constraint_set1_flag: bool,
    /// Retains the same meaning as in the specification. See 7.4.2.1.1
    pub constraint_set2_flag: bool,
    /// Retains the same meaning as in the specification. See 7.4.2.1.1
    pub constraint_set3_flag: bool,
    /// Retains the same meaning as in the specification. See 7.4.2.1.1
    pub constraint_set4_flag: bool,
    /// Retains the same meaning as in the specification. See 7.4.2.1.1
    pub constraint_set5_flag: bool,

    /// Level to which the coded video sequence conforms. Kept raw, see
    /// [`Sps::level`].
    pub level_idc: u8,

    /// Identifies the sequence parameter set that is referred to by the picture
    /// parameter set
    pub seq_parameter_set_id: u32,

    /// Specifies the chroma sampling relative to the luma sampling as specified
    /// in clause 6.2. Only coded for the profiles listed in 7.3.2.1.1, see
    /// [`Sps::inferred_chroma_format_idc`] for the value a decoder should use.
    pub chroma_format_idc: u32,

    /// Specifies whether the three colour components of the 4:4:4 chroma format
    /// are coded separately.
    pub separate_colour_plane_flag: bool,

    /// Specifies the bit depth of the samples of the luma array and the value
    /// of the luma quantization parameter range offset QpBdOffsetY. See 7-3 and
    /// 7-4.
    pub bit_depth_luma_minus8: u32,

    /// Specifies the bit depth of the samples of the chroma arrays and the
    /// value of the chroma quantization parameter range offset QpBdOffsetC. See
    /// 7-5 and 7-6.
    pub bit_depth_chroma_minus8: u32,

    /// qpprime_y_zero_transform_bypass_flag equal to 1 specifies that, when
    /// QP′Y is equal to 0, a transform bypass operation for the transform
    /// coefficient decoding process and picture construction process prior to
    /// deblocking filter process as specified in clause 8.5 shall be applied.
    pub qpprime_y_zero_transform_bypass_flag: bool,

    /// `seq_scaling_matrix_present_flag` and, when set, the delta scales of the
    /// 8 (12 for 4:4:4) scaling lists as read with 7.3.2.1.1.1. Lists 0..5
    /// hold 16 deltas, lists 6.. hold 64.
    pub seq_scaling_matrix: Option<Vec<ScalingListDeltas>>,

    /// Specifies the value of the variable MaxFrameNum that is used in
    /// frame_num related derivations as follows: MaxFrameNum = 2 ^
    /// (log2_max_frame_num_minus4 + 4 )
    pub log2_max_frame_num_minus4: u32,

    /// Specifies the method to decode picture order count (as specified in
    /// clause 8.2.1)
    pub pic_order_cnt_type: u32,

    /// Specifies the value of the variable MaxPicOrderCntLsb that is used in
    /// the decoding process for picture order count as specified in clause
    /// 8.2.1 as follows: MaxPicOrderCntLsb = 2 ^ (
    /// log2_max_pic_order_cnt_lsb_minus4 + 4 ).
    pub log2_max_pic_order_cnt_lsb_minus4: u32,

    /// If true, specifies that `delta_pic_order_cnt[0]` and
    /// `delta_pic_order_cnt[1]` are not present in the slice headers of the
    /// sequence and shall be inferred to be equal to 0.
    pub delta_pic_order_always_zero_flag: bool,

    /// Used to calculate the picture order count of a non-reference picture as
    /// specified in clause 8.2.1.
    pub offset_for_non_ref_pic: i32,

    /// Used to calculate the picture order count of a bottom field as specified
    /// in clause 8.2.1.
    pub offset_for_top_to_bottom_field: i32,

    /// The `num_ref_frames_in_pic_order_cnt_cycle` values used in the decoding
    /// process for picture order count as specified in clause 8.2.
    pub offset_for_ref_frame: Vec<i32>,

    /// Specifies the maximum number of short-term and long-term reference
    /// frames, complementary reference field pairs, and non-paired reference
    /// fields that may be used by the decoding process for inter prediction of
    /// any picture in the coded video sequence.
    pub max_num_ref_frames: u32,

    /// Specifies the allowed values of frame_num as specified in clause 7.4.3
    /// and the decoding process in case of an inferred gap between values of
    /// frame_num as specified in clause 8.2.5.2
    pub gaps_in_frame_num_value_allowed_flag: bool,

    /// Plus 1 specifies the width of each decoded picture in units of
    /// macroblocks.
    pub pic_width_in_mbs_minus1: u32,
    /// Plus 1 specifies the height in slice group map units of a decoded frame
    /// or field.
    pub pic_height_in_map_units_minus1: u32,

    /// If true,  specifies that every coded picture of the coded video sequence
    /// is a coded frame containing only frame macroblocks, else specifies that
    /// coded pictures of the coded video sequence may either be coded fields or
    /// coded frames.
    pub frame_mbs_only_flag: bool,

    /// If true, specifies the possible use of switching between frame and field
    /// macroblocks within frames. Only coded when `frame_mbs_only_flag` is
    /// not set.
    pub mb_adaptive_frame_field_flag: bool,

    /// Specifies the method used in the derivation process for luma motion
    /// vectors for B_Skip, B_Direct_16x16 and B_Direct_8x8 as specified in
    /// clause 8.4.1.2.
    pub direct_8x8_inference_flag: bool,

    /// If true, specifies that the frame cropping offset parameters follow next
    /// in the sequence parameter, else specifies that the frame cropping offset
    /// parameters are not present
    pub frame_cropping_flag: bool,

    /// Specify the samples of the pictures in the coded video sequence that are
    /// output from the decoding process, in terms of a rectangular region
    /// specified in frame coordinates for output.
    pub frame_crop_left_offset: u32,
    pub frame_crop_right_offset: u32,
    pub frame_crop_top_offset: u32,
    pub frame_crop_bottom_offset: u32,

    pub vui_parameters_present_flag: bool,
    /// Every VUI found after `vui_parameters_present_flag`. Real streams carry
    /// exactly one.
    pub vui_parameters: Vec<VuiParams>,
}

impl Sps {
    /// Returns the coded width of the stream.
    ///
    /// See 7-13 through 7-17 in the specification.
    pub fn width(&self) -> u32 {
        self.pic_width_in_mbs_minus1
            .saturating_add(1)
            .saturating_mul(16)
    }

    /// Returns the coded height of the stream.
    ///
    /// See 7-13 through 7-17 in the specification.
    pub fn height(&self) -> u32 {
        self.pic_height_in_map_units_minus1
            .saturating_add(1)
            .saturating_mul(16)
            .saturating_mul(2 - u32::from(self.frame_mbs_only_flag))
    }

    /// `chroma_format_idc` as a decoder sees it: the coded value for profiles
    /// that carry it, 1 (4:2:0) otherwise.
    pub fn inferred_chroma_format_idc(&self) -> u32 {
        if profile_has_chroma_info(self.profile_idc) {
            self.chroma_format_idc
        } else {
            1
        }
    }

    /// Returns `ChromaArrayType`, as computed in the specification.
    pub fn chroma_array_type(&self) -> u32 {
        match self.separate_colour_plane_flag {
            false => self.inferred_chroma_format_idc(),
            true => 0,
        }
    }

    /// Returns `SubWidthC` and `SubHeightC`.
    ///
    /// See table 6-1 in the specification.
    fn sub_width_height_c(&self) -> (u32, u32) {
        match (
            self.inferred_chroma_format_idc(),
            self.separate_colour_plane_flag,
        ) {
            (1, false) => (2, 2),
            (2, false) => (2, 1),
            (3, false) => (1, 1),
            // undefined.
            _ => (1, 1),
        }
    }

    /// Returns `CropUnitX` and `CropUnitY`.
    ///
    /// See 7-19 through 7-22 in the specification.
    fn crop_unit_x_y(&self) -> (u32, u32) {
        match self.chroma_array_type() {
            0 => (1, 2 - u32::from(self.frame_mbs_only_flag)),
            _ => {
                let (sub_width_c, sub_height_c) = self.sub_width_height_c();
                (
                    sub_width_c,
                    sub_height_c * (2 - u32::from(self.frame_mbs_only_flag)),
                )
            }
        }
    }

    /// Same as MaxFrameNum. See 7-10 in the specification. `None` when the
    /// coded exponent does not fit 32 bits.
    pub fn max_frame_num(&self) -> Option<u32> {
        1u32.checked_shl(self.log2_max_frame_num_minus4.checked_add(4)?)
    }

    pub fn num_ref_frames_in_pic_order_cnt_cycle(&self) -> usize {
        self.offset_for_ref_frame.len()
    }

    /// Same as ExpectedDeltaPerPicOrderCntCycle, see 7-12 in the specification.
    pub fn expected_delta_per_pic_order_cnt_cycle(&self) -> i64 {
        self.offset_for_ref_frame.iter().copied().map(i64::from).sum()
    }

    /// The picture area left after frame cropping. Offsets larger than the
    /// coded picture clamp the rectangle to zero size.
    pub fn visible_rectangle(&self) -> Rect<u32> {
        if !self.frame_cropping_flag {
            return Rect {
                min: Point { x: 0, y: 0 },
                max: Point {
                    x: self.width(),
                    y: self.height(),
                },
            };
        }

        let (crop_unit_x, crop_unit_y) = self.crop_unit_x_y();

        let crop_left = crop_unit_x.saturating_mul(self.frame_crop_left_offset);
        let crop_right = crop_unit_x.saturating_mul(self.frame_crop_right_offset);
        let crop_top = crop_unit_y.saturating_mul(self.frame_crop_top_offset);
        let crop_bottom = crop_unit_y.saturating_mul(self.frame_crop_bottom_offset);

        Rect {
            min: Point {
                x: crop_left,
                y: crop_top,
            },
            max: Point {
                x: self
                    .width()
                    .saturating_sub(crop_left)
                    .saturating_sub(crop_right),
                y: self
                    .height()
                    .saturating_sub(crop_top)
                    .saturating_sub(crop_bottom),
            },
        }
    }

    pub fn profile(&self) -> Option<Profile> {
        Profile::n(self.profile_idc)
    }

    /// The level, taking the level 1b signalling of A.3.1 and A.3.2 into
    /// account.
    pub fn level(&self) -> Option<Level> {
        let level = Level::n(self.level_idc)?;

        if matches!(level, Level::L1_1)
            && matches!(self.profile(), Some(Profile::Baseline | Profile::Main))
            && self.constraint_set3_flag
        {
            return Some(Level::L1B);
        }

        Some(level)
    }

    /// Effective 4x4 scaling lists in zig-zag order, Table 7-2 fall-back rule
    /// A applied.
    pub fn scaling_lists_4x4(&self) -> [[u8; 16]; 6] {
        let mut lists = [[16; 16]; 6];
        let Some(matrix) = self.active_scaling_matrix() else {
            // (7-8) in the spec.
            return lists;
        };

        for i in 0..6 {
            lists[i] = match matrix.get(i).and_then(|d| d.as_deref()) {
                Some(deltas) => {
                    let default = if i < 3 {
                        &DEFAULT_4X4_INTRA
                    } else {
                        &DEFAULT_4X4_INTER
                    };
                    expand_scaling_list(deltas, default)
                }
                // See table 7.2 in the spec.
                None => match i {
                    0 => DEFAULT_4X4_INTRA,
                    3 => DEFAULT_4X4_INTER,
                    _ => lists[i - 1],
                },
            };
        }

        lists
    }

    /// Effective 8x8 scaling lists in zig-zag order, Table 7-2 fall-back rule
    /// A applied. Lists 2..5 are only coded for 4:4:4 and otherwise follow the
    /// fall-back rule.
    pub fn scaling_lists_8x8(&self) -> [[u8; 64]; 6] {
        let mut lists = [[16; 64]; 6];
        let Some(matrix) = self.active_scaling_matrix() else {
            // (7-9) in the spec.
            return lists;
        };

        let num_8x8 = if self.chroma_format_idc == 3 { 6 } else { 2 };
        for i in 0..6 {
            let deltas = if i < num_8x8 {
                matrix.get(6 + i).and_then(|d| d.as_deref())
            } else {
                None
            };

            lists[i] = match deltas {
                Some(deltas) => {
                    let default = if i % 2 == 0 {
                        &DEFAULT_8X8_INTRA
                    } else {
                        &DEFAULT_8X8_INTER
                    };
                    expand_scaling_list(deltas, default)
                }
                // See table 7.2 in the spec.
                None => match i {
                    0 => DEFAULT_8X8_INTRA,
                    1 => DEFAULT_8X8_INTER,
                    _ => lists[i - 2],
                },
            };
        }

        lists
    }

    fn active_scaling_matrix(&self) -> Option<&[ScalingListDeltas]> {
        if !profile_has_chroma_info(self.profile_idc) {
            return None;
        }

        self.seq_scaling_matrix.as_deref()
    }
}

/// Applies the delta scales of 7.3.2.1.1.1 to produce one scaling list.
/// `next_scale == 0` on the first entry selects `default`, later on it
/// repeats the last scale until the end of the list.
fn expand_scaling_list<const N: usize>(deltas: &[i32], default: &[u8; N]) -> [u8; N] {
    let mut list = [0; N];
    let mut last_scale = 8i64;
    let mut next_scale = 8i64;

    for j in 0..N {
        if next_scale != 0 {
            let delta_scale = deltas.get(j).copied().unwrap_or(0);
            next_scale = (last_scale + i64::from(delta_scale)).rem_euclid(256);
            if j == 0 && next_scale == 0 {
                return *default;
            }
        }

        let scale = if next_scale == 0 {
            last_scale
        } else {
            next_scale
        };
        // Both operands are in 0..256.
        list[j] = scale as u8;
        last_scale = scale;
    }

    list
}

/// Computes the delta scales that code `list` (in zig-zag order). The result
/// always has one delta per entry so it can be stored in
/// [`Sps::seq_scaling_matrix`].
pub fn scaling_list_deltas(list: &[u8]) -> Vec<i32> {
    let mut last_scale = 8i32;
    list.iter()
        .map(|&scale| {
            let mut delta = i32::from(scale) - last_scale;
            // Keep the delta in -128..=127 so it wraps to the wanted scale.
            if delta > 127 {
                delta -= 256;
            } else if delta < -128 {
                delta += 256;
            }
            last_scale = i32::from(scale);
            delta
        })
        .collect()
}

#[derive(Default)]
pub struct SpsBuilder(Sps);

impl SpsBuilder {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn seq_parameter_set_id(mut self, value: u32) -> Self {
        self.0.seq_parameter_set_id = value;
        self
    }

    pub fn profile_idc(mut self, value: Profile) -> Self {
        self.0.profile_idc = value as u8;
        self
    }

    pub fn level_idc(mut self, value: Level) -> Self {
        self.0.level_idc = value as u8;
        self
    }

    pub fn frame_crop_offsets(mut self, top: u32, bottom: u32, left: u32, right: u32) -> Self {
        self.0.frame_cropping_flag = true;
        self.0.frame_crop_top_offset = top;
        self.0.frame_crop_bottom_offset = bottom;
        self.0.frame_crop_left_offset = left;
        self.0.frame_crop_right_offset = right;
        self
    }

    /// Sets the cropping from sample counts, converting them to crop units.
    pub fn frame_crop(self, top: u32, bottom: u32, left: u32, right: u32) -> Self {
        let (crop_unit_x, crop_unit_y) = self.0.crop_unit_x_y();

        self.frame_crop_offsets(
            top / crop_unit_y,
            bottom / crop_unit_y,
            left / crop_unit_x,
            right / crop_unit_x,
        )
    }

    /// Sets the picture size in macroblocks, cropping the padding when the
    /// size is not a multiple of 16.
    pub fn resolution(mut self, width: u32, height: u32) -> Self {
        const MB_SIZE: u32 = 16;

        let mb_width = width.div_ceil(MB_SIZE).max(1);
        let mb_height = height.div_ceil(MB_SIZE).max(1);

        self.0.pic_width_in_mbs_minus1 = mb_width - 1;
        self.0.pic_height_in_map_units_minus1 = mb_height - 1;

        let compressed_width = mb_width.saturating_mul(MB_SIZE);
        let compressed_height = mb_height.saturating_mul(MB_SIZE);

        if compressed_width != width || compressed_height != height {
            self = self.frame_crop(
                0,
                compressed_height.saturating_sub(height),
                0,
                compressed_width.saturating_sub(width),
            );
        }

        self
    }

    pub fn chroma_format_idc(mut self, value: u32) -> Self {
        self.0.chroma_format_idc = value;
        self
    }

    pub fn max_num_ref_frames(mut self, value: u32) -> Self {
        self.0.max_num_ref_frames = value;
        self
    }

    pub fn frame_mbs_only_flag(mut self, value: bool) -> Self {
        self.0.frame_mbs_only_flag = value;
        self
    }

    pub fn mb_adaptive_frame_field_flag(mut self, value: bool) -> Self {
        self.0.mb_adaptive_frame_field_flag = value;
        self
    }

    /// Stores `lists` (in zig-zag order) as a sequence scaling matrix. Lists
    /// not given are marked as not present, up to the count implied by the
    /// `chroma_format_idc` set so far.
    pub fn seq_scaling_matrix(mut self, lists: &[Option<&[u8]>]) -> Self {
        let num_lists = if self.0.chroma_format_idc == 3 { 12 } else { 8 };

        let mut matrix: Vec<ScalingListDeltas> = lists
            .iter()
            .map(|list| list.map(scaling_list_deltas))
            .collect();
        matrix.resize(num_lists.max(matrix.len()), None);

        self.0.seq_scaling_matrix = Some(matrix);
        self
    }

    pub fn direct_8x8_inference_flag(mut self, value: bool) -> Self {
        self.0.direct_8x8_inference_flag = value;
        self
    }

    fn vui(&mut self) -> &mut VuiParams {
        self.0.vui_parameters_present_flag = true;
        if self.0.vui_parameters.is_empty() {
            self.0.vui_parameters.push(VuiParams::default());
        }

        &mut self.0.vui_parameters[0]
    }

    pub fn vui_parameters_present(mut self) -> Self {
        self.vui();
        self
    }

    pub fn aspect_ratio_idc(mut self, value: u8) -> Self {
        self.vui().aspect_ratio_info = Some(AspectRatioInfo {
            aspect_ratio_idc: value,
            ..Default::default()
        });
        self
    }

    pub fn sar_resolution(mut self, width: u16, height: u16) -> Self {
        self.vui().aspect_ratio_info = Some(AspectRatioInfo {
            aspect_ratio_idc: EXTENDED_SAR,
            sar_width: width,
            sar_height: height,
        });
        self
    }

    pub fn aspect_ratio(self, width_ratio: u16, height_ratio: u16) -> Self {
        // H.264 Table E-1
        match (width_ratio, height_ratio) {
            (1, 1) => self.aspect_ratio_idc(1),
            (12, 11) => self.aspect_ratio_idc(2),
            (10, 11) => self.aspect_ratio_idc(3),
            (16, 11) => self.aspect_ratio_idc(4),
            (40, 33) => self.aspect_ratio_idc(5),
            (24, 11) => self.aspect_ratio_idc(6),
            (20, 11) => self.aspect_ratio_idc(7),
            (32, 11) => self.aspect_ratio_idc(8),
            (80, 33) => self.aspect_ratio_idc(9),
            (18, 11) => self.aspect_ratio_idc(10),
            (15, 11) => self.aspect_ratio_idc(11),
            (64, 33) => self.aspect_ratio_idc(12),
            (160, 99) => self.aspect_ratio_idc(13),
            (4, 3) => self.aspect_ratio_idc(14),
            (3, 2) => self.aspect_ratio_idc(15),
            (2, 1) => self.aspect_ratio_idc(16),

            _ => self.sar_resolution(width_ratio, height_ratio),
        }
    }

    pub fn timing_info(
        mut self,
        num_units_in_tick: u32,
        time_scale: u32,
        fixed_frame_rate_flag: bool,
    ) -> Self {
        self.vui().timing_info = Some(TimingInfo {
            num_units_in_tick,
            time_scale,
            fixed_frame_rate_flag,
        });
        self
    }

    pub fn log2_max_frame_num_minus4(mut self, value: u32) -> Self {
        self.0.log2_max_frame_num_minus4 = value;
        self
    }

    /// `value` is rounded down to a power of two, at least 16.
    pub fn max_frame_num(self, value: u32) -> Self {
        self.log2_max_frame_num_minus4(value.max(1).ilog2().saturating_sub(4))
    }

    pub fn pic_order_cnt_type(mut self, value: u32) -> Self {
        self.0.pic_order_cnt_type = value;
        self
    }

    pub fn log2_max_pic_order_cnt_lsb_minus4(mut self, value: u32) -> Self {
        self.0.log2_max_pic_order_cnt_lsb_minus4 = value;
        self
    }

    /// `value` is rounded down to a power of two, at least 16.
    pub fn max_pic_order_cnt_lsb(self, value: u32) -> Self {
        self.log2_max_pic_order_cnt_lsb_minus4(value.max(1).ilog2().saturating_sub(4))
    }

    pub fn delta_pic_order_always_zero_flag(mut self, value: bool) -> Self {
        self.0.delta_pic_order_always_zero_flag = value;
        self
    }

    pub fn offset_for_ref_frame(mut self, offsets: Vec<i32>) -> Self {
        self.0.offset_for_ref_frame = offsets;
        self
    }

    pub fn bit_depth_chroma_minus8(mut self, value: u32) -> Self {
        self.0.bit_depth_chroma_minus8 = value;
        self
    }

    pub fn bit_depth_chroma(self, value: u32) -> Self {
        self.bit_depth_chroma_minus8(value.saturating_sub(8))
    }

    pub fn bit_depth_luma_minus8(mut self, value: u32) -> Self {
        self.0.bit_depth_luma_minus8 = value;
        self
    }

    pub fn bit_depth_luma(self, value: u32) -> Self {
        self.bit_depth_luma_minus8(value.saturating_sub(8))
    }

    pub fn build(self) -> Rc<Sps> {
        Rc::new(self.0)
    }
}

/// One `SchedSelIdx` entry of the HRD parameters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CpbSpec {
    pub bit_rate_value_minus1: u32,
    pub cpb_size_value_minus1: u32,
    pub cbr_flag: bool,
}

/// Hypothetical reference decoder parameters, see E.1.2.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HrdParams {
    pub bit_rate_scale: u8,
    pub cpb_size_scale: u8,

    /// `cpb_cnt_minus1 + 1` entries. Never empty in a valid HRD.
    pub cpb_specs: Vec<CpbSpec>,

    pub initial_cpb_removal_delay_length_minus1: u8,
    pub cpb_removal_delay_length_minus1: u8,
    pub dpb_output_delay_length_minus1: u8,
    pub time_offset_length: u8,
}

impl Default for HrdParams {
    fn default() -> Self {
        Self {
            bit_rate_scale: Default::default(),
            cpb_size_scale: Default::default(),
            cpb_specs: vec![CpbSpec::default()],
            initial_cpb_removal_delay_length_minus1: Default::default(),
            cpb_removal_delay_length_minus1: Default::default(),
            dpb_output_delay_length_minus1: Default::default(),
            time_offset_length: Default::default(),
        }
    }
}

impl HrdParams {
    /// `None` when there is no CPB specification at all.
    pub fn cpb_cnt_minus1(&self) -> Option<usize> {
        self.cpb_specs.len().checked_sub(1)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AspectRatioInfo {
    pub aspect_ratio_idc: u8,
    /* if aspect_ratio_idc == 255 */
    pub sar_width: u16,
    pub sar_height: u16,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColourDescription {
    pub colour_primaries: u8,
    pub transfer_characteristics: u8,
    pub matrix_coefficients: u8,
}

impl Default for ColourDescription {
    fn default() -> Self {
        // Unspecified, see Tables E-3 to E-5.
        Self {
            colour_primaries: 2,
            transfer_characteristics: 2,
            matrix_coefficients: 2,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VideoSignalType {
    /// 3 bits.
    pub video_format: u8,
    pub video_full_range_flag: bool,
    pub colour_description: Option<ColourDescription>,
}

impl Default for VideoSignalType {
    fn default() -> Self {
        Self {
            // Unspecified video format.
            video_format: 5,
            video_full_range_flag: Default::default(),
            colour_description: Default::default(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChromaLocInfo {
    pub chroma_sample_loc_type_top_field: u32,
    pub chroma_sample_loc_type_bottom_field: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TimingInfo {
    pub num_units_in_tick: u32,
    pub time_scale: u32,
    pub fixed_frame_rate_flag: bool,
}

impl TimingInfo {
    /// Frames per second, see E-41 with one frame per two ticks. `None` when
    /// `num_units_in_tick` is zero.
    pub fn frame_rate(&self) -> Option<f64> {
        if self.num_units_in_tick == 0 {
            return None;
        }

        Some(f64::from(self.time_scale) / (2.0 * f64::from(self.num_units_in_tick)))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BitstreamRestriction {
    pub motion_vectors_over_pic_boundaries_flag: bool,
    pub max_bytes_per_pic_denom: u32,
    pub max_bits_per_mb_denom: u32,
    pub log2_max_mv_length_horizontal: u32,
    pub log2_max_mv_length_vertical: u32,
    pub max_num_reorder_frames: u32,
    pub max_dec_frame_buffering: u32,
}

/// Video usability information, see E.1.1. Every `*_present_flag` of the
/// syntax maps to the corresponding `Option` being `Some`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VuiParams {
    pub aspect_ratio_info: Option<AspectRatioInfo>,
    /// `Some` when `overscan_info_present_flag` is set.
    pub overscan_appropriate_flag: Option<bool>,
    pub video_signal_type: Option<VideoSignalType>,
    pub chroma_loc_info: Option<ChromaLocInfo>,
    pub timing_info: Option<TimingInfo>,
    pub nal_hrd_parameters: Option<HrdParams>,
    pub vcl_hrd_parameters: Option<HrdParams>,
    /// Only coded when one of the HRDs is present.
    pub low_delay_hrd_flag: bool,
    pub pic_struct_present_flag: bool,
    pub bitstream_restriction: Option<BitstreamRestriction>,
}

fn read_u16_be(r: &mut BitReader) -> Result<u16> {
    let mut buf = [0u8; 2];
    r.read_bytes_into(&mut buf)?;
    Ok(BigEndian::read_u16(&buf))
}

fn read_u32_be(r: &mut BitReader) -> Result<u32> {
    let mut buf = [0u8; 4];
    r.read_bytes_into(&mut buf)?;
    Ok(BigEndian::read_u32(&buf))
}

/// Keeps the SPSes seen so far, keyed by `seq_parameter_set_id`.
#[derive(Debug, Default)]
pub struct Parser {
    active_spses: BTreeMap<u32, Rc<Sps>>,
}

impl Parser {
    fn parse_scaling_matrix(
        r: &mut BitReader,
        chroma_format_idc: u32,
    ) -> Result<Vec<ScalingListDeltas>> {
        let num_lists = if chroma_format_idc != 3 { 8 } else { 12 };
        let mut matrix = Vec::with_capacity(num_lists);

        for i in 0..num_lists {
            let seq_scaling_list_present_flag = r.read_bit()?;
            if !seq_scaling_list_present_flag {
                matrix.push(None);
                continue;
            }

            let mut deltas = Vec::with_capacity(scaling_list_len(i));
            for _ in 0..scaling_list_len(i) {
                deltas.push(r.read_se::<i32>()?);
            }
            matrix.push(Some(deltas));
        }

        Ok(matrix)
    }

    pub fn parse_hrd(r: &mut BitReader) -> Result<HrdParams> {
        let cpb_cnt_minus1 = r.read_ue::<u32>()?;
        let bit_rate_scale = r.read_bits(4)?;
        let cpb_size_scale = r.read_bits(4)?;

        let mut cpb_specs = Vec::new();
        for _ in 0..=cpb_cnt_minus1 {
            cpb_specs.push(CpbSpec {
                bit_rate_value_minus1: r.read_ue()?,
                cpb_size_value_minus1: r.read_ue()?,
                cbr_flag: r.read_bit()?,
            });
        }

        let hrd = HrdParams {
            bit_rate_scale,
            cpb_size_scale,
            cpb_specs,
            initial_cpb_removal_delay_length_minus1: r.read_bits(5)?,
            cpb_removal_delay_length_minus1: r.read_bits(5)?,
            dpb_output_delay_length_minus1: r.read_bits(5)?,
            time_offset_length: r.read_bits(5)?,
        };

        trace!("parsed HRD with {} CPB specification(s)", hrd.cpb_specs.len());
        Ok(hrd)
    }

    pub fn parse_vui(r: &mut BitReader) -> Result<VuiParams> {
        let mut vui = VuiParams::default();

        if r.read_bit()? {
            let aspect_ratio_idc = r.read_bits(8)?;
            let (sar_width, sar_height) = if aspect_ratio_idc == EXTENDED_SAR {
                (read_u16_be(r)?, read_u16_be(r)?)
            } else {
                (0, 0)
            };

            vui.aspect_ratio_info = Some(AspectRatioInfo {
                aspect_ratio_idc,
                sar_width,
                sar_height,
            });
        }

        if r.read_bit()? {
            vui.overscan_appropriate_flag = Some(r.read_bit()?);
        }

        if r.read_bit()? {
            let video_format = r.read_bits(3)?;
            let video_full_range_flag = r.read_bit()?;
            let colour_description = if r.read_bit()? {
                Some(ColourDescription {
                    colour_primaries: r.read_byte()?,
                    transfer_characteristics: r.read_byte()?,
                    matrix_coefficients: r.read_byte()?,
                })
            } else {
                None
            };

            vui.video_signal_type = Some(VideoSignalType {
                video_format,
                video_full_range_flag,
                colour_description,
            });
        }

        if r.read_bit()? {
            vui.chroma_loc_info = Some(ChromaLocInfo {
                chroma_sample_loc_type_top_field: r.read_ue()?,
                chroma_sample_loc_type_bottom_field: r.read_ue()?,
            });
        }

        if r.read_bit()? {
            vui.timing_info = Some(TimingInfo {
                num_units_in_tick: read_u32_be(r)?,
                time_scale: read_u32_be(r)?,
                fixed_frame_rate_flag: r.read_bit()?,
            });
        }

        if r.read_bit()? {
            vui.nal_hrd_parameters = Some(Parser::parse_hrd(r)?);
        }

        if r.read_bit()? {
            vui.vcl_hrd_parameters = Some(Parser::parse_hrd(r)?);
        }

        if vui.nal_hrd_parameters.is_some() || vui.vcl_hrd_parameters.is_some() {
            vui.low_delay_hrd_flag = r.read_bit()?;
        }

        vui.pic_struct_present_flag = r.read_bit()?;

        if r.read_bit()? {
            vui.bitstream_restriction = Some(BitstreamRestriction {
                motion_vectors_over_pic_boundaries_flag: r.read_bit()?,
                max_bytes_per_pic_denom: r.read_ue()?,
                max_bits_per_mb_denom: r.read_ue()?,
                log2_max_mv_length_horizontal: r.read_ue()?,
                log2_max_mv_length_vertical: r.read_ue()?,
                max_num_reorder_frames: r.read_ue()?,
                max_dec_frame_buffering: r.read_ue()?,
            });
        }

        trace!("parsed VUI: {:?}", vui);
        Ok(vui)
    }

    /// Reads VUIs until the stream runs out. The attempt that hits the end of
    /// the stream, normally consuming the trailing bits, is discarded.
    fn parse_vui_list(r: &mut BitReader) -> Result<Vec<VuiParams>> {
        let mut vuis = Vec::new();

        loop {
            let bits_left = r.num_bits_left();
            match Parser::parse_vui(r) {
                Ok(vui) => vuis.push(vui),
                Err(Error::UnexpectedEndOfStream) => {
                    if bits_left > 8 {
                        warn!(
                            "VUI list ended with {} bits of unparsed data, dropping them",
                            bits_left
                        );
                    }
                    return Ok(vuis);
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Parses the RBSP of a SPS, i.e. the payload of a NAL unit of type 7
    /// with emulation prevention bytes already removed.
    pub fn parse_sps_rbsp(rbsp: &[u8]) -> Result<Sps> {
        let mut r = BitReader::new(rbsp);
        let mut sps = Sps {
            profile_idc: r.read_bits(8)?,
            constraint_set0_flag: r.read_bit()?,
            constraint_set1_flag: r.read_bit()?,
            constraint_set2_flag: r.read_bit()?,
            constraint_set3_flag: r.read_bit()?,
            constraint_set4_flag: r.read_bit()?,
            constraint_set5_flag: r.read_bit()?,
            ..Default::default()
        };

        // skip reserved_zero_2bits
        r.skip_bits(2)?;

        sps.level_idc = r.read_bits(8)?;
        sps.seq_parameter_set_id = r.read_ue()?;

        if profile_has_chroma_info(sps.profile_idc) {
            sps.chroma_format_idc = r.read_ue()?;
            if sps.chroma_format_idc == 3 {
                sps.separate_colour_plane_flag = r.read_bit()?;
            }

            sps.bit_depth_luma_minus8 = r.read_ue()?;
            sps.bit_depth_chroma_minus8 = r.read_ue()?;
            sps.qpprime_y_zero_transform_bypass_flag = r.read_bit()?;

            let seq_scaling_matrix_present_flag = r.read_bit()?;
            if seq_scaling_matrix_present_flag {
                sps.seq_scaling_matrix =
                    Some(Parser::parse_scaling_matrix(&mut r, sps.chroma_format_idc)?);
            }
        }

        sps.log2_max_frame_num_minus4 = r.read_ue()?;
        sps.pic_order_cnt_type = r.read_ue()?;

        if sps.pic_order_cnt_type == 0 {
            sps.log2_max_pic_order_cnt_lsb_minus4 = r.read_ue()?;
        } else if sps.pic_order_cnt_type == 1 {
            sps.delta_pic_order_always_zero_flag = r.read_bit()?;
            sps.offset_for_non_ref_pic = r.read_se()?;
            sps.offset_for_top_to_bottom_field = r.read_se()?;

            let num_ref_frames_in_pic_order_cnt_cycle = r.read_ue::<u32>()?;
            for _ in 0..num_ref_frames_in_pic_order_cnt_cycle {
                sps.offset_for_ref_frame.push(r.read_se()?);
            }
        }

        sps.max_num_ref_frames = r.read_ue()?;
        sps.gaps_in_frame_num_value_allowed_flag = r.read_bit()?;
        sps.pic_width_in_mbs_minus1 = r.read_ue()?;
        sps.pic_height_in_map_units_minus1 = r.read_ue()?;
        sps.frame_mbs_only_flag = r.read_bit()?;

        if !sps.frame_mbs_only_flag {
            sps.mb_adaptive_frame_field_flag = r.read_bit()?;
        }

        sps.direct_8x8_inference_flag = r.read_bit()?;
        sps.frame_cropping_flag = r.read_bit()?;

        if sps.frame_cropping_flag {
            sps.frame_crop_left_offset = r.read_ue()?;
            sps.frame_crop_right_offset = r.read_ue()?;
            sps.frame_crop_top_offset = r.read_ue()?;
            sps.frame_crop_bottom_offset = r.read_ue()?;
        }

        sps.vui_parameters_present_flag = r.read_bit()?;
        if sps.vui_parameters_present_flag {
            sps.vui_parameters = Parser::parse_vui_list(&mut r)?;
        }

        debug!(
            "parsed SPS {}: profile_idc {}, level_idc {}, {}x{}",
            sps.seq_parameter_set_id,
            sps.profile_idc,
            sps.level_idc,
            sps.width(),
            sps.height()
        );

        Ok(sps)
    }

    /// Parse a SPS and add it to the list of active SPSes, replacing any SPS
    /// with the same id.
    ///
    /// Returns a reference to the new SPS.
    pub fn parse_sps(&mut self, nalu: &NalUnit) -> Result<&Rc<Sps>> {
        if nalu.nalu_type() != Some(NaluType::Sps) {
            return Err(Error::InvalidNaluType {
                expected: NaluType::Sps as u8,
                got: nalu.unit_type,
            });
        }

        let sps = Rc::new(Parser::parse_sps_rbsp(&nalu.rbsp)?);
        let key = sps.seq_parameter_set_id;

        self.active_spses.remove(&key);
        Ok(self.active_spses.entry(key).or_insert(sps))
    }

    pub fn get_sps(&self, sps_id: u32) -> Option<&Rc<Sps>> {
        self.active_spses.get(&sps_id)
    }
}
