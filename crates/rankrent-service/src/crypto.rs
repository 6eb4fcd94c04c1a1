//! Cryptographic helpers for webhook verification.

use hmac::digest::InvalidLength;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Compute HMAC-SHA256 and return the hex-encoded digest (64 characters).
///
/// # Errors
///
/// Returns `InvalidLength` if the key is rejected by the MAC implementation.
/// HMAC accepts keys of any size, so this does not happen with `Hmac<Sha256>`.
pub fn hmac_sha256_hex(secret: &str, message: &str) -> Result<String, InvalidLength> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())?;
    mac.update(message.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Compare two strings without short-circuiting on the first mismatch.
#[must_use]
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hmac_matches_known_vector() {
        let digest =
            hmac_sha256_hex("key", "The quick brown fox jumps over the lazy dog").unwrap();
        assert_eq!(
            digest,
            "f7bc83f430538424b13298e6aa6fb143ef4d59a14946175997479dbc2d1a3cd8"
        );
    }

    #[test]
    fn hmac_depends_on_message_and_key() {
        let base = hmac_sha256_hex("secret", "message").unwrap();
        assert_eq!(base, hmac_sha256_hex("secret", "message").unwrap());
        assert_ne!(base, hmac_sha256_hex("secret", "message2").unwrap());
        assert_ne!(base, hmac_sha256_hex("other", "message").unwrap());
    }

    #[test]
    fn constant_time_eq_compares_whole_strings() {
        assert!(constant_time_eq("abc", "abc"));
        assert!(constant_time_eq("", ""));
        assert!(!constant_time_eq("abc", "abd"));
        assert!(!constant_time_eq("abc", "ab"));
        assert!(!constant_time_eq("abc", "ABC"));
    }
}
