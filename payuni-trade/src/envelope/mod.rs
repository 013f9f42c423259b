//! Secure trade envelope: canonical form, AES-256-GCM and `HashInfo`.
//!
//! Outbound, a [`FieldMap`] is serialized to its [`CanonicalForm`], sealed
//! into an [`EncryptedEnvelope`] (`EncryptInfo`) and hashed into an
//! [`IntegrityHash`] (`HashInfo`). Inbound, the steps run in reverse, with
//! the hash checked before any decryption is attempted.
//!
//! # Examples
//!
//! ```
//! use payuni_trade::envelope::{self, FieldMap, MerchantKeys};
//!
//! # fn example() -> payuni_trade::Result<()> {
//! let keys = MerchantKeys::new("12345678901234567890123456789012", "1234567890123456")?;
//! let fields = FieldMap::from([("MerID", "ABC"), ("TradeNo", "X1")]);
//!
//! let sealed = envelope::seal(&fields, &keys)?;
//! let opened = envelope::open(&sealed.encrypt_info, sealed.hash_info.as_str(), &keys)?;
//! assert_eq!(opened, fields);
//! # Ok(())
//! # }
//! ```

pub mod canonical;
pub mod cipher;
pub mod hash;
pub mod keys;

pub use canonical::{CanonicalForm, FieldMap, FieldValue};
pub use cipher::EncryptedEnvelope;
pub use hash::IntegrityHash;
pub use keys::MerchantKeys;

use crate::error::{Result, TradeError};

/// `EncryptInfo` and `HashInfo` produced for one outbound payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedEnvelope {
    /// Hex-encoded ciphertext and tag.
    pub encrypt_info: EncryptedEnvelope,
    /// Uppercase hex hash over `encrypt_info`.
    pub hash_info: IntegrityHash,
}

/// Serializes, encrypts and hashes a field map.
///
/// # Errors
///
/// Returns [`TradeError::Encryption`] if the cipher fails.
pub fn seal(fields: &FieldMap, keys: &MerchantKeys) -> Result<SealedEnvelope> {
    let form = canonical::serialize(fields);
    let encrypt_info = cipher::encrypt(&form, keys)?;
    let hash_info = hash::hash(&encrypt_info, keys);
    Ok(SealedEnvelope { encrypt_info, hash_info })
}

/// Verifies, decrypts and parses a received envelope.
///
/// `hash_info` is checked first; on mismatch the ciphertext is never handed
/// to the cipher.
///
/// # Errors
///
/// - [`TradeError::Integrity`] if `hash_info` does not match
/// - [`TradeError::Decryption`] if the envelope is malformed or its tag fails
/// - [`TradeError::InvalidCanonicalForm`] if the plaintext cannot be parsed
pub fn open(
    encrypt_info: &EncryptedEnvelope,
    hash_info: &str,
    keys: &MerchantKeys,
) -> Result<FieldMap> {
    if !hash::verify(encrypt_info, hash_info, keys) {
        return Err(TradeError::Integrity("Hash validation failed".to_owned()));
    }
    let form = cipher::decrypt(encrypt_info, keys)?;
    Ok(canonical::deserialize(&form))
}

#[cfg(test)]
mod tests {
    use super::*;

    mod proptest_envelope;

    fn keys() -> MerchantKeys {
        MerchantKeys::new("12345678901234567890123456789012", "1234567890123456").unwrap()
    }

    #[test]
    fn test_seal_open_roundtrip_coerces_values() {
        let fields = FieldMap::new()
            .with("MerID", "TEST123")
            .with("Timestamp", 1_234_567_890_i64)
            .with("TradeAmt", 1000_i64)
            .with("MerTradeNo", "TEST001");

        let sealed = seal(&fields, &keys()).unwrap();
        let opened = open(&sealed.encrypt_info, sealed.hash_info.as_str(), &keys()).unwrap();

        assert_eq!(opened.text("Timestamp").as_deref(), Some("1234567890"));
        assert_eq!(opened.get("TradeAmt"), Some(&FieldValue::Text("1000".to_owned())));
        assert_eq!(opened, fields.coerced());
    }

    #[test]
    fn test_seal_open_empty_map() {
        let sealed = seal(&FieldMap::new(), &keys()).unwrap();
        let opened = open(&sealed.encrypt_info, sealed.hash_info.as_str(), &keys()).unwrap();
        assert!(opened.is_empty());
    }

    #[test]
    fn test_open_rejects_bad_hash_before_decrypting() {
        // Not even valid hex: a decrypt attempt would yield a Decryption error.
        let envelope = EncryptedEnvelope::from_wire("zz-not-an-envelope");
        let err = open(&envelope, "0000", &keys()).unwrap_err();
        assert!(matches!(err, TradeError::Integrity(_)));
    }

    #[test]
    fn test_open_reports_decryption_after_valid_hash() {
        let envelope = EncryptedEnvelope::from_wire("48656c6c6f");
        let digest = hash::hash(&envelope, &keys());
        let err = open(&envelope, digest.as_str(), &keys()).unwrap_err();
        assert_eq!(err.to_string(), "Decryption failed: Invalid encrypted data format");
    }

    #[test]
    fn test_seal_is_deterministic_across_insertion_order() {
        let first = FieldMap::new().with("a", "1").with("b", "2");
        let second = FieldMap::new().with("b", "2").with("a", "1");
        assert_eq!(seal(&first, &keys()).unwrap(), seal(&second, &keys()).unwrap());
    }
}
