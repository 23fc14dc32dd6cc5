//! Content hashing for change detection (spec §4.2.2).

use sha2::{Digest, Sha256};

/// Hashes the trimmed UTF-8 bytes of extracted content.
///
/// Deterministic and O(n) in the content length. Returns a lowercase hex
/// string, matching the wire format of `Target::last_hash`.
#[must_use]
pub fn hash_content(content: &str) -> String {
    let trimmed = content.trim();
    let mut hasher = Sha256::new();
    hasher.update(trimmed.as_bytes());
    let digest = hasher.finalize();
    hex_lower(&digest)
}

fn hex_lower(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        write!(out, "{byte:02x}").expect("writing to a String never fails");
    }
    out
}
