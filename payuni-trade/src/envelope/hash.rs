//! `HashInfo` computation.
//!
//! `HashInfo = UPPER(HEX(SHA-256(key || EncryptInfo || iv)))`. It is checked
//! before decryption, independently of the GCM tag.

use std::fmt;

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::envelope::{EncryptedEnvelope, MerchantKeys};

/// Uppercase hex SHA-256 digest carried in `HashInfo`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrityHash(String);

impl IntegrityHash {
    /// Returns the 64-character uppercase hex string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the hash, returning the hex string.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for IntegrityHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Computes the `HashInfo` for an envelope.
///
/// # Examples
///
/// ```
/// use payuni_trade::envelope::{EncryptedEnvelope, MerchantKeys, hash};
///
/// let keys = MerchantKeys::new("12345678901234567890123456789012", "1234567890123456")?;
/// let envelope = EncryptedEnvelope::from_wire("test_encrypted_data");
///
/// let digest = hash::hash(&envelope, &keys);
/// assert_eq!(digest.as_str().len(), 64);
/// assert!(hash::verify(&envelope, &digest.as_str().to_lowercase(), &keys));
/// # Ok::<(), payuni_trade::TradeError>(())
/// ```
#[must_use]
pub fn hash(envelope: &EncryptedEnvelope, keys: &MerchantKeys) -> IntegrityHash {
    let digest = Sha256::new()
        .chain_update(keys.key())
        .chain_update(envelope.as_str().as_bytes())
        .chain_update(keys.iv())
        .finalize();
    IntegrityHash(hex::encode_upper(digest))
}

/// Checks a received `HashInfo` against the envelope it came with.
///
/// The received value is uppercased before a constant-time comparison, so
/// either case is accepted.
#[must_use]
pub fn verify(envelope: &EncryptedEnvelope, received: &str, keys: &MerchantKeys) -> bool {
    let expected = hash(envelope, keys);
    let received = received.to_ascii_uppercase();
    expected.as_str().as_bytes().ct_eq(received.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> MerchantKeys {
        MerchantKeys::new("12345678901234567890123456789012", "1234567890123456").unwrap()
    }

    fn envelope() -> EncryptedEnvelope {
        EncryptedEnvelope::from_wire("test_encrypted_data")
    }

    #[test]
    fn test_hash_known_value() {
        let mut input = b"12345678901234567890123456789012".to_vec();
        input.extend_from_slice(b"test_encrypted_data");
        input.extend_from_slice(b"1234567890123456");
        let expected = hex::encode_upper(Sha256::digest(&input));

        assert_eq!(hash(&envelope(), &keys()).as_str(), expected);
    }

    #[test]
    fn test_hash_is_uppercase_hex() {
        let digest = hash(&envelope(), &keys());
        assert_eq!(digest.as_str().len(), 64);
        assert!(digest.as_str().bytes().all(|b| b.is_ascii_digit() || (b'A'..=b'F').contains(&b)));
    }

    #[test]
    fn test_hash_is_deterministic() {
        assert_eq!(hash(&envelope(), &keys()), hash(&envelope(), &keys()));
    }

    #[test]
    fn test_hash_depends_on_key_order() {
        // key || data || iv, not iv || data || key
        let mut swapped = b"1234567890123456".to_vec();
        swapped.extend_from_slice(b"test_encrypted_data");
        swapped.extend_from_slice(b"12345678901234567890123456789012");
        let swapped = hex::encode_upper(Sha256::digest(&swapped));

        assert_ne!(hash(&envelope(), &keys()).as_str(), swapped);
    }

    #[test]
    fn test_verify_accepts_matching_hash() {
        let digest = hash(&envelope(), &keys());
        assert!(verify(&envelope(), digest.as_str(), &keys()));
    }

    #[test]
    fn test_verify_is_case_insensitive() {
        let digest = hash(&envelope(), &keys());
        assert!(verify(&envelope(), &digest.as_str().to_lowercase(), &keys()));
    }

    #[test]
    fn test_verify_rejects_wrong_hash() {
        assert!(!verify(&envelope(), "invalid_hash", &keys()));
        assert!(!verify(&envelope(), "", &keys()));
    }

    #[test]
    fn test_verify_rejects_single_flipped_char() {
        let digest = hash(&envelope(), &keys()).into_string();
        let mut chars: Vec<char> = digest.chars().collect();
        chars[10] = if chars[10] == '0' { '1' } else { '0' };
        let tampered: String = chars.into_iter().collect();

        assert!(!verify(&envelope(), &tampered, &keys()));
    }

    #[test]
    fn test_verify_rejects_different_envelope() {
        let digest = hash(&envelope(), &keys());
        assert!(!verify(&EncryptedEnvelope::from_wire("other"), digest.as_str(), &keys()));
    }
}
