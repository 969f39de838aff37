// Copyright 2025 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

#![no_main]

use avc_syntax::codec::h264::nalu::NalUnit;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(nalu) = NalUnit::parse(data) {
        let bytes = nalu.to_bytes().unwrap();
        assert_eq!(NalUnit::parse(&bytes).unwrap(), nalu);
    }
});
