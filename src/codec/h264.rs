// Copyright 2023 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

pub mod decoder_config;
pub mod emulation_prevention;
pub mod exp_golomb;
pub mod nalu;
pub mod nalu_extension;
pub mod parser;
pub mod synthesizer;
