// Copyright 2022 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Reading and writing of the H.264/AVC syntax structures that sit around
//! the coded pictures: NAL unit framing, sequence parameter sets with their
//! VUI and HRD, and the MP4 `avcC` decoder configuration record.

pub mod bitstream_utils;
pub mod codec;
pub mod error;

pub use error::Error;
pub use error::Result;
