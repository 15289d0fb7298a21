//! Hashing Primitives
//!
//! Thin wrappers over SHA-256 / SHA-512 used by:
//! - Server seed commitments (SHA-256, hex encoded)
//! - Roll derivation (SHA-512 over the canonical roll message)
//! - Audit tooling that recomputes both from disclosed data

use sha2::{Digest, Sha256, Sha512};

/// Commitment digest output (256 bits / 32 bytes).
pub type CommitmentHash = [u8; 32];

/// Roll digest output (512 bits / 64 bytes).
pub type RollDigest = [u8; 64];

/// Compute SHA-256 of arbitrary data.
pub fn sha256(data: &[u8]) -> CommitmentHash {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Compute SHA-256 and render it as lowercase hex.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(sha256(data))
}

/// Compute SHA-512 of arbitrary data.
pub fn sha512(data: &[u8]) -> RollDigest {
    let mut hasher = Sha512::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Reduce a big-endian digest modulo `modulus`.
///
/// Equivalent to parsing the hex digest as one unsigned integer and
/// taking the remainder, computed one byte at a time.
pub fn digest_mod(digest: &[u8], modulus: u32) -> u32 {
    debug_assert!(modulus > 0, "modulus must be positive");

    let m = modulus as u64;
    digest
        .iter()
        .fold(0u64, |acc, &byte| (acc * 256 + byte as u64) % m) as u32
}

/// Constant-time comparison of two hex strings (case-insensitive).
///
/// Used when matching a disclosed seed against a published commitment.
pub fn hex_eq(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter()
        .zip(b.iter())
        .fold(0u8, |diff, (x, y)| diff | (x.to_ascii_lowercase() ^ y.to_ascii_lowercase()))
        == 0
}

// =============================================================================
// TESTS
// =============================================================================
