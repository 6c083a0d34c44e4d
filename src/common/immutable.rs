//! Helper functions for content addressed values.

use sha1_smol::Sha1;

/// Length of a SHA-1 digest in bytes.
pub const DIGEST_SIZE: usize = 20;

/// Number of leading bytes of a key compared against the value's hash by
/// [KeyValidation::Prefix] by default.
pub const DEFAULT_KEY_PREFIX: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// How much of a key must match the SHA-1 hash of its value.
pub enum KeyValidation {
    /// Only the first `n` bytes of the key and the hash are compared.
    Prefix(usize),
    /// The key must equal the whole hash.
    Full,
}

impl Default for KeyValidation {
    fn default() -> Self {
        KeyValidation::Prefix(DEFAULT_KEY_PREFIX)
    }
}

pub fn hash_immutable(v: &[u8]) -> [u8; DIGEST_SIZE] {
    let mut hasher = Sha1::new();
    hasher.update(v);

    hasher.digest().bytes()
}

/// Returns `true` if `key` addresses a value whose hash is `hash`.
///
/// Keys shorter than the compared prefix never match.
pub fn validate_immutable(key: &[u8], hash: &[u8; DIGEST_SIZE], validation: KeyValidation) -> bool {
    match validation {
        KeyValidation::Prefix(n) => {
            let n = n.min(DIGEST_SIZE);
            key.get(..n) == Some(&hash[..n])
        }
        KeyValidation::Full => key == &hash[..],
    }
}
