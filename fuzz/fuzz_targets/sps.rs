// Copyright 2025 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

#![no_main]

use avc_syntax::codec::h264::parser::Parser;
use avc_syntax::codec::h264::parser::Sps;
use avc_syntax::codec::h264::synthesizer::Synthesizer;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(sps) = Parser::parse_sps_rbsp(data) {
        let _ = sps.visible_rectangle();
        let _ = sps.scaling_lists_4x4();
        let _ = sps.scaling_lists_8x8();

        let rbsp = Synthesizer::<Sps>::synthesize(&sps).unwrap();
        assert_eq!(Parser::parse_sps_rbsp(&rbsp).unwrap(), sps);
    }
});
