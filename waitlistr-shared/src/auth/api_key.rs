/// Project API key generation and hashing
///
/// A key looks like `wl_` followed by 32 base62 characters. The plaintext is
/// shown to the owner exactly once; the database keeps only its SHA-256 hex
/// digest plus a short display prefix.
///
/// # Example
///
/// ```
/// use waitlistr_shared::auth::api_key::{generate_api_key, hash_api_key, validate_api_key_format};
///
/// let generated = generate_api_key();
/// assert!(generated.plaintext.starts_with("wl_"));
/// assert!(validate_api_key_format(&generated.plaintext));
/// assert_eq!(hash_api_key(&generated.plaintext), generated.hash);
/// ```

use rand::Rng;
use sha2::{Digest, Sha256};

const KEY_PREFIX: &str = "wl_";

const KEY_RANDOM_LENGTH: usize = 32;

/// Characters of the plaintext kept for display in key listings
const DISPLAY_PREFIX_LENGTH: usize = 8;

/// Total length of a plaintext key
pub const API_KEY_LENGTH: usize = KEY_PREFIX.len() + KEY_RANDOM_LENGTH;

/// A freshly generated key
#[derive(Debug, Clone)]
pub struct GeneratedApiKey {
    /// Full key, returned to the owner once
    pub plaintext: String,

    /// SHA-256 hex digest stored in `api_keys.key_hash`
    pub hash: String,

    /// Leading characters stored in `api_keys.key_prefix`
    pub display_prefix: String,
}

/// Generates a random key with its digest and display prefix
pub fn generate_api_key() -> GeneratedApiKey {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::thread_rng();

    let random: String = (0..KEY_RANDOM_LENGTH)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect();
    let plaintext = format!("{}{}", KEY_PREFIX, random);

    GeneratedApiKey {
        hash: hash_api_key(&plaintext),
        display_prefix: plaintext.chars().take(DISPLAY_PREFIX_LENGTH).collect(),
        plaintext,
    }
}

/// SHA-256 hex digest of a key
pub fn hash_api_key(key: &str) -> String {
    hex::encode(Sha256::digest(key.as_bytes()))
}

/// Cheap shape check run before any database lookup
pub fn validate_api_key_format(key: &str) -> bool {
    key.len() == API_KEY_LENGTH
        && key
            .strip_prefix(KEY_PREFIX)
            .is_some_and(|rest| rest.chars().all(|c| c.is_ascii_alphanumeric()))
}
