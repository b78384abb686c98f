// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

#![no_main]

use libfuzzer_sys::fuzz_target;
use pinakotheke::codec;
use pinakotheke::tagger::parse_tags;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    // arbitrary directory names must never panic
    let _ = codec::decode(text);

    let id = codec::encode(text);
    assert!(id.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_'));
    assert_eq!(codec::decode(&id).as_deref(), Some(text));

    for tag in parse_tags(text) {
        assert!(!tag.is_empty());
    }
});
