// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Identity codec: gallery names to stable identifiers
//!
//! Ids are the URL-safe, unpadded base64 of the name's UTF-8 bytes, so they
//! only ever contain `[A-Za-z0-9_-]` and double as directory names and URL
//! path segments.
//!
//! Ids are case sensitive: two names can encode to ids that differ only in
//! letter case. On a case-insensitive filesystem those two galleries cannot
//! both exist, and the second `create` is refused as a duplicate.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};

/// Encode a display name into its identifier
pub fn encode(name: &str) -> String {
    URL_SAFE_NO_PAD.encode(name.as_bytes())
}

/// Recover the display name from an identifier
///
/// Returns `None` for anything `encode` could not have produced.
pub fn decode(id: &str) -> Option<String> {
    let bytes = URL_SAFE_NO_PAD.decode(id).ok()?;
    String::from_utf8(bytes).ok()
}
