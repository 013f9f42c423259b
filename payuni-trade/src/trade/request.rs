//! Outbound trade requests and their transport parameters.

use url::form_urlencoded;

use crate::{
    envelope::{FieldMap, SealedEnvelope},
    trade::{
        fields::names::{IS_PLATFORM, MER_ID},
        mode::TradeMode,
    },
};

/// A caller's trade: plaintext fields, mode and optional protocol version.
///
/// Constructed by the caller, validated once and consumed by
/// [`TradeClient::trade`](crate::trade::TradeClient::trade).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeRequest {
    /// Plaintext fields sealed into `EncryptInfo`.
    pub fields: FieldMap,
    /// Target operation.
    pub mode: TradeMode,
    /// Protocol version; the mode default applies when `None`.
    pub version: Option<String>,
}

impl TradeRequest {
    /// Creates a request using the mode's default version.
    #[must_use]
    pub fn new(fields: impl Into<FieldMap>, mode: TradeMode) -> Self {
        Self { fields: fields.into(), mode, version: None }
    }

    /// Overrides the protocol version.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Version sent on the wire.
    #[must_use]
    pub fn effective_version(&self) -> &str {
        self.version.as_deref().unwrap_or(self.mode.spec().default_version)
    }
}

/// Outer, unencrypted parameters posted alongside the envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportParams {
    /// Merchant identifier, copied from the plaintext fields.
    pub mer_id: String,
    /// Protocol version.
    pub version: String,
    /// Hex envelope.
    pub encrypt_info: String,
    /// Uppercase hex hash.
    pub hash_info: String,
    /// `"1"` when the plaintext carries a platform flag.
    pub is_platform: Option<String>,
}

impl TransportParams {
    /// Assembles the outer parameters for a sealed request.
    ///
    /// `IsPlatForm` is forwarded as `"1"` whenever the plaintext field holds
    /// a value.
    #[must_use]
    pub fn new(request: &TradeRequest, sealed: SealedEnvelope) -> Self {
        let mer_id = request.fields.text(MER_ID).map(|s| s.into_owned()).unwrap_or_default();
        let is_platform = request.fields.is_present(IS_PLATFORM).then(|| "1".to_owned());

        Self {
            mer_id,
            version: request.effective_version().to_owned(),
            encrypt_info: sealed.encrypt_info.into_string(),
            hash_info: sealed.hash_info.into_string(),
            is_platform,
        }
    }

    /// Name/value pairs in wire order.
    pub fn pairs(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("MerID", self.mer_id.as_str()),
            ("Version", self.version.as_str()),
            ("EncryptInfo", self.encrypt_info.as_str()),
            ("HashInfo", self.hash_info.as_str()),
        ]
        .into_iter()
        .chain(self.is_platform.as_deref().map(|flag| (IS_PLATFORM, flag)))
    }

    /// Form-urlencoded request body.
    #[must_use]
    pub fn to_form_body(&self) -> String {
        form_urlencoded::Serializer::new(String::new()).extend_pairs(self.pairs()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::{self, MerchantKeys};

    fn keys() -> MerchantKeys {
        MerchantKeys::new("12345678901234567890123456789012", "1234567890123456").unwrap()
    }

    #[test]
    fn test_effective_version_defaults_per_mode() {
        let fields = FieldMap::from([("MerID", "ABC")]);
        assert_eq!(TradeRequest::new(fields.clone(), TradeMode::Atm).effective_version(), "1.0");
        let linepay = TradeRequest::new(fields.clone(), TradeMode::Linepay);
        assert_eq!(linepay.effective_version(), "1.1");
        assert_eq!(
            TradeRequest::new(fields, TradeMode::Linepay).with_version("1.0").effective_version(),
            "1.0"
        );
    }

    #[test]
    fn test_transport_params_copy_mer_id_and_hash() {
        let fields = FieldMap::from([("MerID", "ABC"), ("TradeNo", "X1")]);
        let request = TradeRequest::new(fields, TradeMode::TradeQuery);
        let sealed = envelope::seal(&request.fields, &keys()).unwrap();
        let expected_hash = sealed.hash_info.as_str().to_owned();

        let params = TransportParams::new(&request, sealed);
        assert_eq!(params.mer_id, "ABC");
        assert_eq!(params.version, "1.0");
        assert_eq!(params.hash_info, expected_hash);
        assert!(params.is_platform.is_none());
        assert_eq!(params.pairs().count(), 4);
    }

    #[test]
    fn test_transport_params_forward_platform_flag() {
        let request = TradeRequest::new(
            FieldMap::new().with("MerID", "ABC").with("IsPlatForm", 1_i64),
            TradeMode::Atm,
        );
        let sealed = envelope::seal(&request.fields, &keys()).unwrap();
        let params = TransportParams::new(&request, sealed);

        assert_eq!(params.is_platform.as_deref(), Some("1"));
        assert!(params.to_form_body().ends_with("&IsPlatForm=1"));
    }

    #[test]
    fn test_form_body_order() {
        let params = TransportParams {
            mer_id: "A B".to_owned(),
            version: "1.0".to_owned(),
            encrypt_info: "abcd".to_owned(),
            hash_info: "EF01".to_owned(),
            is_platform: None,
        };
        assert_eq!(params.to_form_body(), "MerID=A+B&Version=1.0&EncryptInfo=abcd&HashInfo=EF01");
    }
}
