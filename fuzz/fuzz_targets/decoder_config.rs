// Copyright 2025 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

#![no_main]

use avc_syntax::codec::h264::decoder_config::AvcDecoderConfigurationRecord;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(record) = AvcDecoderConfigurationRecord::parse(data) {
        let bytes = record.to_bytes().unwrap();
        assert_eq!(AvcDecoderConfigurationRecord::parse(&bytes).unwrap(), record);
    }
});
