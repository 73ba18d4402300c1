//! PIN hashing.
//!
//! Two stored formats are understood:
//!
//! ```text
//! <64 hex>                       legacy: sha256(pin), unsalted
//! s256$<salt hex>$<64 hex>       salted: sha256(salt || pin)
//! ```
//!
//! Legacy hashes keep verifying so existing records stay usable, but every
//! legacy verification logs a warning; records should be re-hashed with
//! [`hash_pin_salted`] on the next successful login.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::AuthError;

/// Marker for the salted format.
pub const SALTED_PREFIX: &str = "s256$";

const SALT_BYTES: usize = 16;

/// Unsalted SHA-256 hex of the PIN (legacy format).
pub fn hash_pin(pin: &str) -> String {
    hex::encode(Sha256::digest(pin.as_bytes()))
}

/// Salted hash with a fresh random salt.
pub fn hash_pin_salted(pin: &str) -> Result<String, AuthError> {
    let mut salt = [0u8; SALT_BYTES];
    getrandom::fill(&mut salt).map_err(|e| AuthError::Entropy(e.to_string()))?;
    Ok(hash_pin_with_salt(pin, &salt))
}

/// Salted hash with a caller-supplied salt.
pub fn hash_pin_with_salt(pin: &str, salt: &[u8]) -> String {
    format!("{SALTED_PREFIX}{}${}", hex::encode(salt), salted_digest(pin, salt))
}

/// True if the stored hash uses the unsalted legacy format.
pub fn is_legacy_hash(stored: &str) -> bool {
    !stored.starts_with(SALTED_PREFIX)
}

/// Recomputes the hash of `pin` in the format of `stored` and compares in
/// constant time. Malformed salted records never verify.
pub fn verify_pin(pin: &str, stored: &str) -> bool {
    let computed = match stored.strip_prefix(SALTED_PREFIX) {
        Some(rest) => {
            let Some((salt_hex, digest_hex)) = rest.split_once('$') else {
                tracing::warn!("authn: malformed salted pin hash");
                return false;
            };
            let Ok(salt) = hex::decode(salt_hex) else {
                tracing::warn!("authn: malformed pin salt");
                return false;
            };
            return salted_digest(pin, &salt)
                .as_bytes()
                .ct_eq(digest_hex.as_bytes())
                .into();
        }
        None => {
            tracing::warn!("authn: verifying unsalted legacy pin hash, re-hash required");
            hash_pin(pin)
        }
    };
    computed.as_bytes().ct_eq(stored.as_bytes()).into()
}

fn salted_digest(pin: &str, salt: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(pin.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_hash_is_plain_sha256() {
        assert_eq!(
            hash_pin("1234"),
            "03ac674216f3e15c761ee1a5e255f067953623c8b388b4459e13f978d7c846f4"
        );
        assert!(is_legacy_hash(&hash_pin("1234")));
    }

    #[test]
    fn legacy_verify() {
        let stored = hash_pin("1234");
        assert!(verify_pin("1234", &stored));
        assert!(!verify_pin("1235", &stored));
        assert!(!verify_pin("", &stored));
    }

    #[test]
    fn salted_verify() {
        let stored = hash_pin_salted("9876").unwrap();
        assert!(stored.starts_with(SALTED_PREFIX));
        assert!(!is_legacy_hash(&stored));
        assert!(verify_pin("9876", &stored));
        assert!(!verify_pin("9877", &stored));
    }

    #[test]
    fn salts_differ_between_hashes() {
        let a = hash_pin_salted("0000").unwrap();
        let b = hash_pin_salted("0000").unwrap();
        assert_ne!(a, b);
        assert!(verify_pin("0000", &a));
        assert!(verify_pin("0000", &b));
    }

    #[test]
    fn fixed_salt_is_deterministic() {
        let a = hash_pin_with_salt("4321", b"pepper-and-salt!");
        let b = hash_pin_with_salt("4321", b"pepper-and-salt!");
        assert_eq!(a, b);
    }

    #[test]
    fn malformed_salted_records_fail() {
        assert!(!verify_pin("1234", "s256$nothex$abcd"));
        assert!(!verify_pin("1234", "s256$missing-separator"));
        assert!(!verify_pin("1234", "s256$"));
    }
}
