//! Error types for PAYUNi trade operations.
//!
//! Every failure a trade call or callback can hit is a [`TradeError`]. The
//! variants follow the pipeline: input validation first, then envelope
//! cryptography, then the remote gateway and the transport underneath it.
//!
//! # Error Categories
//!
//! - **Input Errors** ([`TradeError::Validation`], [`TradeError::UnsupportedMode`]):
//!   caught before any cryptographic work
//! - **Envelope Errors** ([`TradeError::Encryption`], [`TradeError::Integrity`],
//!   [`TradeError::Decryption`], [`TradeError::InvalidCanonicalForm`]):
//!   `EncryptInfo`/`HashInfo` failures
//! - **Gateway Errors** ([`TradeError::Remote`], [`TradeError::ServerHashRejected`]):
//!   explicit error statuses from PAYUNi
//! - **Network Errors** ([`TradeError::HttpError`], [`TradeError::TransportError`])
//! - **Setup Errors** ([`TradeError::Config`], [`TradeError::Parse`])
//!
//! # Examples
//!
//! ```
//! use payuni_trade::error::{Result, TradeError};
//!
//! fn require_trade_no(trade_no: Option<&str>) -> Result<&str> {
//!     trade_no.ok_or_else(|| {
//!         TradeError::Validation("TradeNo is required for this operation".to_owned())
//!     })
//! }
//!
//! assert!(require_trade_no(None).is_err());
//! ```

use thiserror::Error;

/// Result type alias for trade operations.
pub type Result<T> = std::result::Result<T, TradeError>;

/// Errors that can occur while building, sending, or interpreting a trade.
///
/// The `Display` output of each variant is the human-readable reason handed
/// back to the caller.
///
/// # Error Recovery
///
/// - **Input errors**: fix the request fields or mode and call again
/// - **Envelope errors**: check that the merchant key and IV match the ones
///   registered with the gateway
/// - **Gateway errors**: [`ServerHashRejected`](Self::ServerHashRejected) means
///   a key/IV mismatch and is never worth retrying
/// - **Network errors**: may be retried by the caller, but only with an
///   idempotent merchant trade number
#[must_use = "errors should be handled, propagated, or explicitly panicked"]
#[derive(Debug, Error)]
pub enum TradeError {
    /// Request fields do not satisfy the requirements of the chosen mode.
    ///
    /// Raised before serialization or encryption. The message names the
    /// first missing or insufficient field.
    ///
    /// # Examples
    ///
    /// ```
    /// use payuni_trade::error::TradeError;
    ///
    /// let err = TradeError::Validation("MerID is required".to_owned());
    /// assert_eq!(err.to_string(), "MerID is required");
    /// ```
    #[error("{0}")]
    Validation(String),

    /// The mode identifier is not one of the supported trade modes.
    #[error("Invalid mode: {0}")]
    UnsupportedMode(String),

    /// AES-256-GCM encryption failed.
    ///
    /// Does not occur with a correctly sized key and IV; treated as fatal for
    /// the call in which it happens.
    #[error("Encryption failed: {0}")]
    Encryption(String),

    /// `HashInfo` did not match the `EncryptInfo` it accompanies.
    ///
    /// The envelope was tampered with or was produced with a different key/IV.
    /// Decryption is never attempted after this error.
    #[error("{0}")]
    Integrity(String),

    /// `EncryptInfo` could not be decrypted.
    ///
    /// Covers malformed hex, a missing separator, malformed base64 and a
    /// failed authentication tag check. No plaintext is exposed.
    #[error("Decryption failed: {0}")]
    Decryption(String),

    /// Decrypted text is not a valid canonical form.
    #[error("Invalid canonical form: {0}")]
    InvalidCanonicalForm(String),

    /// The gateway answered with an explicit error status.
    #[error("{message}")]
    Remote {
        /// Raw `Status` value returned by the gateway.
        status: String,
        /// `Message` returned with the status, or a generic fallback.
        message: String,
    },

    /// The gateway could not validate our `HashInfo` (status `API00003`).
    ///
    /// Client and gateway disagree on the merchant key or IV. Not transient.
    #[error("Hash validation failed at server")]
    ServerHashRejected,

    /// HTTP request failed.
    ///
    /// Wraps [`reqwest::Error`]: timeouts, refused connections, DNS and TLS
    /// failures.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Transport rejected the request or the gateway returned a non-success
    /// HTTP status.
    #[error("Transport error: {0}")]
    TransportError(String),

    /// A callback payload or gateway response could not be parsed.
    #[error("Failed to parse payload: {0}")]
    Parse(String),

    /// Client configuration is invalid.
    ///
    /// Raised for wrong key or IV lengths, bad base URLs, out-of-range
    /// timeouts and unreadable configuration files.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl TradeError {
    /// Returns `true` when the same call may succeed if simply repeated.
    ///
    /// Only network-level failures qualify. Everything else is
    /// deterministic for a given input and configuration.
    ///
    /// # Examples
    ///
    /// ```
    /// use payuni_trade::error::TradeError;
    ///
    /// assert!(TradeError::TransportError("status 502".to_owned()).is_retryable());
    /// assert!(!TradeError::ServerHashRejected.is_retryable());
    /// ```
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::HttpError(_) | Self::TransportError(_))
    }

    /// Returns a short, stable category name for logging.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::UnsupportedMode(_) => "unsupported_mode",
            Self::Encryption(_) => "encryption",
            Self::Integrity(_) => "integrity",
            Self::Decryption(_) => "decryption",
            Self::InvalidCanonicalForm(_) => "canonical_form",
            Self::Remote { .. } => "remote",
            Self::ServerHashRejected => "server_hash_rejected",
            Self::HttpError(_) | Self::TransportError(_) => "transport",
            Self::Parse(_) => "parse",
            Self::Config(_) => "config",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display_is_reason() {
        let error = TradeError::Validation("TradeAmt is required for payment".into());
        assert_eq!(error.to_string(), "TradeAmt is required for payment");
    }

    #[test]
    fn test_unsupported_mode_display() {
        let error = TradeError::UnsupportedMode("frobnicate".to_owned());
        assert_eq!(error.to_string(), "Invalid mode: frobnicate");
    }

    #[test]
    fn test_decryption_error_display() {
        let error = TradeError::Decryption("Invalid encrypted data format".to_owned());
        assert_eq!(error.to_string(), "Decryption failed: Invalid encrypted data format");
    }

    #[test]
    fn test_remote_error_display_uses_message() {
        let error = TradeError::Remote {
            status: "ERROR".to_owned(),
            message: "Trade not found".to_owned(),
        };
        assert_eq!(error.to_string(), "Trade not found");
    }

    #[test]
    fn test_server_hash_rejected_is_not_retryable() {
        let error = TradeError::ServerHashRejected;
        assert!(!error.is_retryable());
        assert_eq!(error.to_string(), "Hash validation failed at server");
        assert_eq!(error.kind(), "server_hash_rejected");
    }

    #[test]
    fn test_only_transport_errors_are_retryable() {
        assert!(TradeError::TransportError("timeout".into()).is_retryable());
        assert!(!TradeError::Validation("x".into()).is_retryable());
        assert!(!TradeError::Integrity("x".into()).is_retryable());
        assert!(!TradeError::Decryption("x".into()).is_retryable());
        assert!(!TradeError::Config("x".into()).is_retryable());
    }
}
