//! Stable hashing of message keys.

use std::borrow::Borrow;
use std::fmt;

use base64::alphabet;
use serde::{
    Deserialize,
    Serialize,
};

/// Seed for every key hash. Changing it invalidates every compiled artifact.
pub const KEY_HASH_SEED: u64 = 0;

/// Number of base64 characters kept from the digest.
pub const HASHED_KEY_LENGTH: usize = 6;

/// Short identifier derived from a message's original key.
///
/// This is the identifier used in compiled output and by consuming code, so it must never
/// depend on anything but the key text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HashedKey(String);

impl HashedKey {
    /// Wraps an already computed hash. Used by custom [`KeyHasher`]s.
    #[must_use]
    pub fn from_raw(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HashedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for HashedKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for HashedKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Function used by a database to turn original keys into [`HashedKey`]s.
pub type KeyHasher = fn(&str) -> HashedKey;

/// Returns a consistent, short hash of the given key.
///
/// The key is digested with xxHash64 and the first four bytes of the little-endian digest
/// become [`HASHED_KEY_LENGTH`] characters of the standard base64 alphabet. The last
/// character reuses the fourth byte rather than reading a fifth, so this is not plain
/// base64 of the digest. Compiled artifacts and call sites depend on this exact layout.
#[must_use]
pub fn hash_message_key(key: &str) -> HashedKey {
    let digest = xxhash_rust::xxh64::xxh64(key.as_bytes(), KEY_HASH_SEED).to_le_bytes();
    let [b0, b1, b2, b3, ..] = digest;
    let sextets: [u8; HASHED_KEY_LENGTH] = [
        b0 >> 2,
        ((b0 & 0x03) << 4) | (b1 >> 4),
        ((b1 & 0x0f) << 2) | (b2 >> 6),
        b2 & 0x3f,
        b3 >> 2,
        ((b3 & 0x03) << 4) | (b3 >> 4),
    ];

    let table = alphabet::STANDARD.as_str().as_bytes();
    let encoded = sextets
        .iter()
        .filter_map(|&sextet| table.get(usize::from(sextet)))
        .map(|&byte| char::from(byte))
        .collect();
    HashedKey(encoded)
}
