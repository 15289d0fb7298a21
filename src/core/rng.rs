//! Deterministic Roll Derivation
//!
//! Derives a dice roll in `[1, 100]` from `(server_seed, client_seed, nonce)`.
//! Pure and stateless: the same triple always yields the same roll, on
//! any platform. This is what makes every round independently verifiable.

use rand::RngCore;

use super::hash::{digest_mod, sha512};

/// Separator between the roll message components.
pub const ROLL_DELIMITER: char = ':';

/// Number of faces on the dice (rolls are `1..=ROLL_SIDES`).
pub const ROLL_SIDES: u32 = 100;

/// Byte length of generated seeds before hex encoding.
pub const SEED_BYTES: usize = 32;

/// Build the canonical roll message.
///
/// Order is fixed: server seed, client seed, nonce (decimal).
pub fn roll_message(server_seed: &str, client_seed: &str, nonce: u64) -> String {
    format!("{server_seed}{ROLL_DELIMITER}{client_seed}{ROLL_DELIMITER}{nonce}")
}

/// Derive the roll for one round.
///
/// SHA-512 of the roll message, read as a big-endian integer,
/// reduced mod 100, plus one.
///
/// # Example
///
/// ```
/// use fair_dice::core::rng::derive_roll;
///
/// let seed = "a".repeat(64);
/// assert_eq!(derive_roll(&seed, "test_seed", 1), 75);
/// ```
pub fn derive_roll(server_seed: &str, client_seed: &str, nonce: u64) -> u8 {
    let digest = sha512(roll_message(server_seed, client_seed, nonce).as_bytes());
    (digest_mod(&digest, ROLL_SIDES) + 1) as u8
}

/// Generate a random hex value with `SEED_BYTES` of OS entropy.
///
/// Panics only if the operating system RNG is unavailable.
pub fn random_hex_seed() -> String {
    let mut bytes = [0u8; SEED_BYTES];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Resolve the client seed for a round.
///
/// Missing or empty values are replaced by a freshly generated seed.
pub fn resolve_client_seed(client_seed: Option<&str>) -> String {
    match client_seed {
        Some(seed) if !seed.is_empty() => seed.to_string(),
        _ => random_hex_seed(),
    }
}

// =============================================================================
// TESTS
// =============================================================================
