//! Merchant key material.

use std::fmt;

use zeroize::Zeroizing;

use crate::error::{Result, TradeError};

/// Length of the merchant `HashKey` in bytes (AES-256).
pub const KEY_LEN: usize = 32;

/// Length of the merchant `HashIV` in bytes (the GCM nonce).
pub const IV_LEN: usize = 16;

/// Merchant key and IV shared with the gateway.
///
/// Both are taken as the raw bytes of the strings issued in the merchant
/// console, after trimming surrounding whitespace. The bytes are wiped on
/// drop and never appear in `Debug` output.
///
/// # Examples
///
/// ```
/// use payuni_trade::envelope::MerchantKeys;
///
/// let keys = MerchantKeys::new(" 12345678901234567890123456789012 ", "1234567890123456")?;
/// assert_eq!(format!("{keys:?}"), "MerchantKeys { key: \"[REDACTED]\", iv: \"[REDACTED]\" }");
///
/// assert!(MerchantKeys::new("too-short", "1234567890123456").is_err());
/// # Ok::<(), payuni_trade::TradeError>(())
/// ```
#[derive(Clone)]
pub struct MerchantKeys {
    key: Zeroizing<[u8; KEY_LEN]>,
    iv: Zeroizing<[u8; IV_LEN]>,
}

impl MerchantKeys {
    /// Creates key material from the merchant key and IV strings.
    ///
    /// # Errors
    ///
    /// Returns [`TradeError::Config`] if the trimmed key is not exactly
    /// 32 bytes or the trimmed IV is not exactly 16 bytes.
    pub fn new(key: &str, iv: &str) -> Result<Self> {
        Self::from_bytes(key.trim().as_bytes(), iv.trim().as_bytes())
    }

    /// Creates key material from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`TradeError::Config`] on a length mismatch.
    pub fn from_bytes(key: &[u8], iv: &[u8]) -> Result<Self> {
        let key: [u8; KEY_LEN] = key.try_into().map_err(|_| {
            TradeError::Config(format!("merchant key must be {KEY_LEN} bytes, got {}", key.len()))
        })?;
        let iv: [u8; IV_LEN] = iv.try_into().map_err(|_| {
            TradeError::Config(format!("merchant IV must be {IV_LEN} bytes, got {}", iv.len()))
        })?;

        Ok(Self { key: Zeroizing::new(key), iv: Zeroizing::new(iv) })
    }

    pub(crate) fn key(&self) -> &[u8; KEY_LEN] {
        &self.key
    }

    pub(crate) fn iv(&self) -> &[u8; IV_LEN] {
        &self.iv
    }
}

impl fmt::Debug for MerchantKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MerchantKeys")
            .field("key", &"[REDACTED]")
            .field("iv", &"[REDACTED]")
            .finish()
    }
}
