//! Typed builder for the plaintext `EncryptInfo` fields.
//!
//! [`EncryptInfo`] names the fields this crate knows about and keeps every
//! other key in [`EncryptInfo::extra`], so newer gateway fields pass through
//! without a crate update.

use serde::{Deserialize, Serialize};

use crate::envelope::{FieldMap, FieldValue};

/// Wire names of the known plaintext fields.
pub mod names {
    /// Merchant identifier.
    pub const MER_ID: &str = "MerID";
    /// Request timestamp (Unix seconds).
    pub const TIMESTAMP: &str = "Timestamp";
    /// Merchant trade number.
    pub const MER_TRADE_NO: &str = "MerTradeNo";
    /// Trade amount.
    pub const TRADE_AMT: &str = "TradeAmt";
    /// Gateway trade number.
    pub const TRADE_NO: &str = "TradeNo";
    /// Product description.
    pub const PROD_DESC: &str = "ProdDesc";
    /// Payer e-mail.
    pub const USR_MAIL: &str = "UsrMail";
    /// Browser return URL.
    pub const RETURN_URL: &str = "ReturnURL";
    /// Server-to-server notify URL.
    pub const NOTIFY_URL: &str = "NotifyURL";
    /// Back-to-shop URL.
    pub const BACK_URL: &str = "BackURL";
    /// Platform merchant flag.
    pub const IS_PLATFORM: &str = "IsPlatForm";
    /// Card number.
    pub const CARD_NO: &str = "CardNo";
    /// Card security code.
    pub const CARD_CVC: &str = "CardCVC";
    /// Card expiry (`MMYY`).
    pub const CARD_EXPIRED: &str = "CardExpired";
    /// Stored-credential token.
    pub const CREDIT_HASH: &str = "CreditHash";
    /// Installment plan.
    pub const CREDIT_INSTALLMENT: &str = "CreditInstallment";
    /// ATM bank type.
    pub const BANK_TYPE: &str = "BankType";
    /// Payment expiry date.
    pub const EXPIRE_DATE: &str = "ExpireDate";
    /// Convenience store type.
    pub const CVS_TYPE: &str = "CVSType";
    /// Payment type.
    pub const PAY_TYPE: &str = "PayType";
    /// Payment sub-type.
    pub const PAYMENT_TYPE: &str = "PaymentType";
}

/// Plaintext fields of an outbound trade.
///
/// Named members cover the common fields; anything else goes in
/// [`extra`](Self::extra). Named members win when both carry the same key.
///
/// # Examples
///
/// ```
/// use payuni_trade::trade::EncryptInfo;
///
/// let info = EncryptInfo {
///     mer_trade_no: Some("ORDER001".to_owned()),
///     trade_amt: Some(1000),
///     ..EncryptInfo::new("ABC", 1_700_000_000)
/// }
/// .with_extra("CloseReason", "customer request");
///
/// let fields = info.into_field_map();
/// assert_eq!(fields.text("TradeAmt").as_deref(), Some("1000"));
/// assert_eq!(fields.text("CloseReason").as_deref(), Some("customer request"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptInfo {
    /// Merchant identifier.
    #[serde(rename = "MerID", default)]
    pub mer_id: String,
    /// Request timestamp (Unix seconds).
    #[serde(rename = "Timestamp", default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    /// Merchant trade number.
    #[serde(rename = "MerTradeNo", default, skip_serializing_if = "Option::is_none")]
    pub mer_trade_no: Option<String>,
    /// Trade amount in minor-less TWD.
    #[serde(rename = "TradeAmt", default, skip_serializing_if = "Option::is_none")]
    pub trade_amt: Option<u64>,
    /// Gateway trade number.
    #[serde(rename = "TradeNo", default, skip_serializing_if = "Option::is_none")]
    pub trade_no: Option<String>,
    /// Product description.
    #[serde(rename = "ProdDesc", default, skip_serializing_if = "Option::is_none")]
    pub prod_desc: Option<String>,
    /// Payer e-mail.
    #[serde(rename = "UsrMail", default, skip_serializing_if = "Option::is_none")]
    pub usr_mail: Option<String>,
    /// Browser return URL.
    #[serde(rename = "ReturnURL", default, skip_serializing_if = "Option::is_none")]
    pub return_url: Option<String>,
    /// Server-to-server notify URL.
    #[serde(rename = "NotifyURL", default, skip_serializing_if = "Option::is_none")]
    pub notify_url: Option<String>,
    /// Back-to-shop URL.
    #[serde(rename = "BackURL", default, skip_serializing_if = "Option::is_none")]
    pub back_url: Option<String>,
    /// Platform merchant flag, sent as `"1"`.
    #[serde(rename = "IsPlatForm", default, skip_serializing_if = "Option::is_none")]
    pub is_platform: Option<String>,
    /// Card number.
    #[serde(rename = "CardNo", default, skip_serializing_if = "Option::is_none")]
    pub card_no: Option<String>,
    /// Card security code.
    #[serde(rename = "CardCVC", default, skip_serializing_if = "Option::is_none")]
    pub card_cvc: Option<String>,
    /// Card expiry (`MMYY`).
    #[serde(rename = "CardExpired", default, skip_serializing_if = "Option::is_none")]
    pub card_expired: Option<String>,
    /// Stored-credential token.
    #[serde(rename = "CreditHash", default, skip_serializing_if = "Option::is_none")]
    pub credit_hash: Option<String>,
    /// Installment plan.
    #[serde(rename = "CreditInstallment", default, skip_serializing_if = "Option::is_none")]
    pub credit_installment: Option<String>,
    /// ATM bank type.
    #[serde(rename = "BankType", default, skip_serializing_if = "Option::is_none")]
    pub bank_type: Option<String>,
    /// Payment expiry date.
    #[serde(rename = "ExpireDate", default, skip_serializing_if = "Option::is_none")]
    pub expire_date: Option<String>,
    /// Convenience store type.
    #[serde(rename = "CVSType", default, skip_serializing_if = "Option::is_none")]
    pub cvs_type: Option<String>,
    /// Payment type.
    #[serde(rename = "PayType", default, skip_serializing_if = "Option::is_none")]
    pub pay_type: Option<String>,
    /// Payment sub-type.
    #[serde(rename = "PaymentType", default, skip_serializing_if = "Option::is_none")]
    pub payment_type: Option<String>,
    /// Fields without a named member.
    #[serde(flatten)]
    pub extra: FieldMap,
}

impl EncryptInfo {
    /// Creates fields carrying only the universal members.
    #[must_use]
    pub fn new(mer_id: impl Into<String>, timestamp: i64) -> Self {
        Self { mer_id: mer_id.into(), timestamp: Some(timestamp), ..Self::default() }
    }

    /// Adds a field without a named member.
    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.extra.insert(key, value);
        self
    }

    /// Flattens the fields into a [`FieldMap`].
    #[must_use]
    pub fn into_field_map(self) -> FieldMap {
        use names::*;

        let mut fields = self.extra;
        let named: [(&str, FieldValue); 21] = [
            (MER_ID, FieldValue::Text(self.mer_id)),
            (TIMESTAMP, self.timestamp.into()),
            (MER_TRADE_NO, self.mer_trade_no.into()),
            (TRADE_AMT, self.trade_amt.into()),
            (TRADE_NO, self.trade_no.into()),
            (PROD_DESC, self.prod_desc.into()),
            (USR_MAIL, self.usr_mail.into()),
            (RETURN_URL, self.return_url.into()),
            (NOTIFY_URL, self.notify_url.into()),
            (BACK_URL, self.back_url.into()),
            (IS_PLATFORM, self.is_platform.into()),
            (CARD_NO, self.card_no.into()),
            (CARD_CVC, self.card_cvc.into()),
            (CARD_EXPIRED, self.card_expired.into()),
            (CREDIT_HASH, self.credit_hash.into()),
            (CREDIT_INSTALLMENT, self.credit_installment.into()),
            (BANK_TYPE, self.bank_type.into()),
            (EXPIRE_DATE, self.expire_date.into()),
            (CVS_TYPE, self.cvs_type.into()),
            (PAY_TYPE, self.pay_type.into()),
            (PAYMENT_TYPE, self.payment_type.into()),
        ];

        for (key, value) in named {
            if value != FieldValue::Null {
                fields.insert(key, value);
            }
        }
        fields
    }
}

impl From<EncryptInfo> for FieldMap {
    fn from(info: EncryptInfo) -> Self {
        info.into_field_map()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::canonical;

    #[test]
    fn test_new_sets_universal_fields() {
        let fields = EncryptInfo::new("ABC", 123).into_field_map();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields.text("MerID").as_deref(), Some("ABC"));
        assert_eq!(fields.get("Timestamp"), Some(&FieldValue::Integer(123)));
    }

    #[test]
    fn test_none_members_are_omitted() {
        let fields = EncryptInfo { trade_no: Some("X1".to_owned()), ..EncryptInfo::new("ABC", 1) }
            .into_field_map();
        assert!(!fields.contains_key("MerTradeNo"));
        assert!(!fields.contains_key("CardNo"));
        assert_eq!(fields.text("TradeNo").as_deref(), Some("X1"));
    }

    #[test]
    fn test_named_member_wins_over_extra() {
        let info = EncryptInfo { trade_no: Some("named".to_owned()), ..EncryptInfo::new("ABC", 1) }
            .with_extra("TradeNo", "extra");
        assert_eq!(info.into_field_map().text("TradeNo").as_deref(), Some("named"));
    }

    #[test]
    fn test_extra_fields_pass_through_serialization() {
        let info =
            EncryptInfo::new("ABC", 1).with_extra("FutureField", "v2").with_extra("Zeta", 9_i64);
        let form = canonical::serialize(&info.into_field_map());
        assert_eq!(form.as_str(), "FutureField=v2&MerID=ABC&Timestamp=1&Zeta=9");
    }

    #[test]
    fn test_deserialize_from_json_keeps_unknown_keys() {
        let info: EncryptInfo = serde_json::from_str(
            r#"{"MerID":"ABC","Timestamp":123,"TradeAmt":100,"CloseReason":"refund"}"#,
        )
        .unwrap();
        assert_eq!(info.mer_id, "ABC");
        assert_eq!(info.trade_amt, Some(100));
        assert_eq!(info.extra.text("CloseReason").as_deref(), Some("refund"));
    }

    #[test]
    fn test_serialize_to_json_skips_none() {
        let json = serde_json::to_value(EncryptInfo::new("ABC", 5)).unwrap();
        assert_eq!(json, serde_json::json!({"MerID": "ABC", "Timestamp": 5}));
    }
}
