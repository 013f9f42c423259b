//! AES-256-GCM sealing of canonical forms.
//!
//! Wire format of an `EncryptInfo` value:
//!
//! ```text
//! hex( base64(ciphertext) ":::" base64(tag) )
//! ```
//!
//! The nonce is the 16-byte merchant IV, so the GCM counter block is derived
//! through GHASH rather than the 96-bit fast path. Tag verification is part
//! of [`decrypt`]; no plaintext leaves this module before it succeeds.

use std::fmt;

use aes_gcm::{
    AesGcm, KeyInit, Tag,
    aead::{AeadInPlace, consts::U16, generic_array::GenericArray},
    aes::Aes256,
};
use base64::{Engine, engine::general_purpose::STANDARD};

use crate::{
    envelope::{CanonicalForm, MerchantKeys},
    error::{Result, TradeError},
};

/// Separator between the ciphertext and tag halves.
///
/// Never produced by standard base64, which only uses `A-Za-z0-9+/=`.
pub const SEPARATOR: &str = ":::";

/// Length of the GCM authentication tag in bytes.
pub const TAG_LEN: usize = 16;

const INVALID_FORMAT: &str = "Invalid encrypted data format";

/// AES-256-GCM with a 128-bit nonce.
type Aes256Gcm16 = AesGcm<Aes256, U16>;

/// Hex-encoded ciphertext and tag, as carried in `EncryptInfo`.
///
/// Holds the exact text sent or received so that `HashInfo` is always
/// computed over the same bytes the other side hashed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedEnvelope(String);

impl EncryptedEnvelope {
    /// Wraps an `EncryptInfo` value received from the gateway.
    ///
    /// No decoding happens here; malformed input is reported by [`decrypt`].
    #[must_use]
    pub fn from_wire(encrypt_info: impl Into<String>) -> Self {
        Self(encrypt_info.into())
    }

    /// Returns the wire text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the envelope, returning the wire text.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for EncryptedEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn cipher(keys: &MerchantKeys) -> Aes256Gcm16 {
    Aes256Gcm16::new(GenericArray::from_slice(keys.key()))
}

/// Encrypts a canonical form into an envelope.
///
/// Deterministic for a fixed key and IV: the same canonical form always
/// yields the same envelope.
///
/// # Errors
///
/// Returns [`TradeError::Encryption`] if the AEAD backend rejects the input.
pub fn encrypt(form: &CanonicalForm, keys: &MerchantKeys) -> Result<EncryptedEnvelope> {
    let mut buffer = form.as_bytes().to_vec();
    let tag = cipher(keys)
        .encrypt_in_place_detached(GenericArray::from_slice(keys.iv()), b"", &mut buffer)
        .map_err(|e| TradeError::Encryption(format!("AES-256-GCM: {e}")))?;

    let combined = format!("{}{SEPARATOR}{}", STANDARD.encode(&buffer), STANDARD.encode(tag));
    Ok(EncryptedEnvelope(hex::encode(combined)))
}

/// Decrypts an envelope back into its canonical form.
///
/// # Errors
///
/// Returns [`TradeError::Decryption`] if:
/// - the envelope is not valid lowercase hex
/// - the separator or either half is missing (`Invalid encrypted data format`)
/// - either half is not valid base64 or the tag has the wrong length
/// - the authentication tag does not verify
///
/// Returns [`TradeError::InvalidCanonicalForm`] if the verified plaintext has
/// malformed percent-encoding.
pub fn decrypt(envelope: &EncryptedEnvelope, keys: &MerchantKeys) -> Result<CanonicalForm> {
    // `encrypt` only emits lowercase; any other spelling is a tampered envelope.
    if envelope.as_str().bytes().any(|b| b.is_ascii_uppercase()) {
        return Err(TradeError::Decryption(
            "invalid hex encoding: envelope must be lowercase".to_owned(),
        ));
    }
    let raw = hex::decode(envelope.as_str())
        .map_err(|e| TradeError::Decryption(format!("invalid hex encoding: {e}")))?;
    let combined =
        String::from_utf8(raw).map_err(|_| TradeError::Decryption(INVALID_FORMAT.to_owned()))?;

    let (ciphertext_b64, tag_b64) = combined
        .split_once(SEPARATOR)
        .filter(|(ciphertext, tag)| !ciphertext.is_empty() && !tag.is_empty())
        .ok_or_else(|| TradeError::Decryption(INVALID_FORMAT.to_owned()))?;

    let mut buffer = STANDARD
        .decode(ciphertext_b64)
        .map_err(|e| TradeError::Decryption(format!("invalid ciphertext encoding: {e}")))?;
    let tag_bytes = STANDARD
        .decode(tag_b64)
        .map_err(|e| TradeError::Decryption(format!("invalid tag encoding: {e}")))?;
    if tag_bytes.len() != TAG_LEN {
        return Err(TradeError::Decryption(format!(
            "authentication tag must be {TAG_LEN} bytes, got {}",
            tag_bytes.len()
        )));
    }

    cipher(keys)
        .decrypt_in_place_detached(
            GenericArray::from_slice(keys.iv()),
            b"",
            &mut buffer,
            Tag::from_slice(&tag_bytes),
        )
        .map_err(|_| TradeError::Decryption("authentication tag mismatch".to_owned()))?;

    let plaintext = String::from_utf8(buffer)
        .map_err(|_| TradeError::Decryption("plaintext is not valid UTF-8".to_owned()))?;
    CanonicalForm::parse(plaintext)
}
