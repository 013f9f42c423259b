//! Gateway response and callback interpretation.
//!
//! Both synchronous responses and asynchronous callbacks go through the same
//! steps: status check, hash verification, decryption, canonical-form
//! parsing. They differ only in how an unencrypted payload is judged.

use serde::{Deserialize, Serialize};

use crate::{
    envelope::{self, EncryptedEnvelope, FieldMap, MerchantKeys},
    error::{Result, TradeError},
};

/// Status signalling an explicit gateway error.
pub const STATUS_ERROR: &str = "ERROR";

/// Status signalling success of an unencrypted payload.
pub const STATUS_SUCCESS: &str = "SUCCESS";

/// Status returned when the gateway rejected the request `HashInfo`.
pub const STATUS_SERVER_HASH_REJECTED: &str = "API00003";

/// Outer JSON envelope returned by the gateway or posted to a callback URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse {
    /// Status code (`SUCCESS`, `ERROR`, `API00003`, ...).
    #[serde(rename = "Status", default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Human-readable message.
    #[serde(rename = "Message", default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Protocol version.
    #[serde(rename = "Version", default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Hex envelope of the result fields.
    #[serde(rename = "EncryptInfo", default, skip_serializing_if = "Option::is_none")]
    pub encrypt_info: Option<String>,
    /// Hash over `encrypt_info`.
    #[serde(rename = "HashInfo", default, skip_serializing_if = "Option::is_none")]
    pub hash_info: Option<String>,
    /// Any other keys, kept verbatim.
    #[serde(flatten)]
    pub extra: FieldMap,
}

impl ApiResponse {
    /// Parses a gateway response body.
    ///
    /// # Errors
    ///
    /// Returns [`TradeError::Parse`] if the body is not a JSON object.
    pub fn from_json(body: &[u8]) -> Result<Self> {
        serde_json::from_slice(body).map_err(|e| TradeError::Parse(e.to_string()))
    }

    /// Builds a response from an already-parsed field map.
    #[must_use]
    pub fn from_fields(mut fields: FieldMap) -> Self {
        let mut take = |key: &str| {
            fields.remove(key).and_then(|value| value.as_text().map(std::borrow::Cow::into_owned))
        };
        let status = take("Status");
        let message = take("Message");
        let version = take("Version");
        let encrypt_info = take("EncryptInfo");
        let hash_info = take("HashInfo");
        Self { status, message, version, encrypt_info, hash_info, extra: fields }
    }

    /// Returns the envelope and hash when both are non-empty.
    fn envelope(&self) -> Option<(EncryptedEnvelope, &str)> {
        let encrypt_info = self.encrypt_info.as_deref().filter(|s| !s.is_empty())?;
        let hash_info = self.hash_info.as_deref().filter(|s| !s.is_empty())?;
        Some((EncryptedEnvelope::from_wire(encrypt_info), hash_info))
    }

    fn remote_error(&self, default_message: &str) -> TradeError {
        TradeError::Remote {
            status: self.status.clone().unwrap_or_default(),
            message: self
                .message
                .clone()
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| default_message.to_owned()),
        }
    }

    /// Flattens an unencrypted payload, outer keys included.
    #[must_use]
    pub fn into_field_map(self) -> FieldMap {
        let mut fields = self.extra;
        for (key, value) in [
            ("Status", self.status),
            ("Message", self.message),
            ("Version", self.version),
            ("EncryptInfo", self.encrypt_info),
            ("HashInfo", self.hash_info),
        ] {
            if let Some(value) = value {
                fields.insert(key, value);
            }
        }
        fields
    }
}

/// Raw callback input as received by the merchant's return/notify handler.
#[derive(Debug, Clone, PartialEq)]
pub enum CallbackPayload {
    /// Already-parsed form or query fields.
    Fields(FieldMap),
    /// A parsed JSON document.
    Json(serde_json::Value),
    /// A JSON document still in text form.
    Text(String),
}

impl CallbackPayload {
    /// Parses the payload into the outer envelope.
    ///
    /// # Errors
    ///
    /// Returns [`TradeError::Parse`] on malformed JSON or a JSON value that
    /// is not an object.
    pub fn into_response(self) -> Result<ApiResponse> {
        match self {
            Self::Fields(fields) => Ok(ApiResponse::from_fields(fields)),
            Self::Json(value) => {
                serde_json::from_value(value).map_err(|e| TradeError::Parse(e.to_string()))
            }
            Self::Text(text) => ApiResponse::from_json(text.as_bytes()),
        }
    }
}

impl From<FieldMap> for CallbackPayload {
    fn from(fields: FieldMap) -> Self {
        Self::Fields(fields)
    }
}

impl From<serde_json::Value> for CallbackPayload {
    fn from(value: serde_json::Value) -> Self {
        Self::Json(value)
    }
}

impl From<String> for CallbackPayload {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for CallbackPayload {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

/// Interprets the gateway's answer to a backend request.
///
/// # Errors
///
/// - [`TradeError::Remote`] for an `ERROR` status, or an unencrypted payload
///   whose status is not `SUCCESS`
/// - [`TradeError::ServerHashRejected`] for `API00003`
/// - [`TradeError::Integrity`] if the response hash does not verify
/// - [`TradeError::Decryption`] / [`TradeError::InvalidCanonicalForm`] from
///   opening the envelope
pub fn interpret_response(response: ApiResponse, keys: &MerchantKeys) -> Result<FieldMap> {
    match response.status.as_deref() {
        Some(STATUS_ERROR) => return Err(response.remote_error("API error")),
        Some(STATUS_SERVER_HASH_REJECTED) => return Err(TradeError::ServerHashRejected),
        _ => {}
    }

    if let Some((encrypt_info, hash_info)) = response.envelope() {
        return envelope::open(&encrypt_info, hash_info, keys).map_err(|e| match e {
            TradeError::Integrity(_) => {
                TradeError::Integrity("Response hash validation failed".to_owned())
            }
            other => other,
        });
    }

    if response.status.as_deref() == Some(STATUS_SUCCESS) {
        Ok(response.into_field_map())
    } else {
        Err(response.remote_error("Unknown error"))
    }
}

/// Interprets a return/notify callback.
///
/// A missing status is a failure. An unencrypted payload with any other
/// non-error status is returned as-is.
///
/// # Errors
///
/// - [`TradeError::Remote`] for an `ERROR` or missing status
/// - [`TradeError::ServerHashRejected`] for `API00003`
/// - [`TradeError::Integrity`] if the hash does not verify
/// - [`TradeError::Decryption`] / [`TradeError::InvalidCanonicalForm`] from
///   opening the envelope
pub fn interpret_callback(response: ApiResponse, keys: &MerchantKeys) -> Result<FieldMap> {
    match response.status.as_deref() {
        None | Some("" | STATUS_ERROR) => return Err(response.remote_error("Unknown error")),
        Some(STATUS_SERVER_HASH_REJECTED) => return Err(TradeError::ServerHashRejected),
        Some(_) => {}
    }

    match response.envelope() {
        Some((encrypt_info, hash_info)) => envelope::open(&encrypt_info, hash_info, keys),
        None => Ok(response.into_field_map()),
    }
}
