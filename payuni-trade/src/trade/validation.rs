//! Field validation against the mode registry.
//!
//! Runs before any serialization or cryptography. The first failing check
//! wins; fields the registry does not mention are never inspected or
//! removed.

use std::str::FromStr;

use rust_decimal::Decimal;

use crate::{
    envelope::FieldMap,
    error::{Result, TradeError},
    trade::{
        fields::names::{MER_ID, TIMESTAMP},
        mode::{Requirement, TradeMode},
    },
};

const UNIVERSAL: [Requirement; 2] = [
    Requirement::Present { field: MER_ID, reason: "MerID is required" },
    Requirement::Present { field: TIMESTAMP, reason: "Timestamp is required" },
];

/// Checks `fields` against the universal and mode-specific requirements.
///
/// # Errors
///
/// Returns [`TradeError::Validation`] carrying the reason of the first
/// unmet requirement.
///
/// # Examples
///
/// ```
/// use payuni_trade::{envelope::FieldMap, trade::{TradeMode, validation}};
///
/// let fields = FieldMap::from([("MerID", "ABC"), ("Timestamp", "123"), ("TradeNo", "X1")]);
/// assert!(validation::validate(&fields, TradeMode::TradeQuery).is_ok());
///
/// let err = validation::validate(&fields, TradeMode::Upp).unwrap_err();
/// assert_eq!(err.to_string(), "MerTradeNo is required for payment");
/// ```
pub fn validate(fields: &FieldMap, mode: TradeMode) -> Result<()> {
    UNIVERSAL
        .iter()
        .chain(mode.spec().requirements)
        .try_for_each(|requirement| check(fields, requirement))
}

fn check(fields: &FieldMap, requirement: &Requirement) -> Result<()> {
    let satisfied = match *requirement {
        Requirement::Present { field, .. } => fields.is_present(field),
        Requirement::PositiveAmount { field, .. } => is_positive_amount(fields, field),
        Requirement::AnyGroup { groups, .. } => {
            groups.iter().any(|group| group.iter().all(|field| fields.is_present(field)))
        }
    };

    if satisfied { Ok(()) } else { Err(TradeError::Validation(reason(requirement).to_owned())) }
}

const fn reason(requirement: &Requirement) -> &'static str {
    match *requirement {
        Requirement::Present { reason, .. }
        | Requirement::PositiveAmount { reason, .. }
        | Requirement::AnyGroup { reason, .. } => reason,
    }
}

fn is_positive_amount(fields: &FieldMap, field: &str) -> bool {
    fields
        .text(field)
        .and_then(|text| Decimal::from_str(text.trim()).ok())
        .is_some_and(|amount| amount > Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::FieldValue;

    fn base() -> FieldMap {
        FieldMap::new().with("MerID", "ABC").with("Timestamp", 123_i64)
    }

    fn payment() -> FieldMap {
        base().with("MerTradeNo", "T1").with("TradeAmt", 100_i64)
    }

    fn reason_of(fields: &FieldMap, mode: TradeMode) -> String {
        validate(fields, mode).unwrap_err().to_string()
    }

    #[test]
    fn test_missing_mer_id_checked_first() {
        let fields = FieldMap::new().with("Timestamp", 1_i64);
        assert_eq!(reason_of(&fields, TradeMode::TradeQuery), "MerID is required");
    }

    #[test]
    fn test_missing_timestamp() {
        let fields = FieldMap::new().with("MerID", "ABC");
        assert_eq!(reason_of(&fields, TradeMode::CreditBindQuery), "Timestamp is required");
    }

    #[test]
    fn test_blank_values_count_as_missing() {
        let fields = FieldMap::new().with("MerID", "   ").with("Timestamp", 1_i64);
        assert_eq!(reason_of(&fields, TradeMode::Atm), "MerID is required");

        let fields = base().with("TradeNo", FieldValue::Null);
        assert_eq!(
            reason_of(&fields, TradeMode::TradeQuery),
            "TradeNo is required for this operation"
        );
    }

    #[test]
    fn test_upp_without_trade_no_mentions_mer_trade_no() {
        assert_eq!(reason_of(&base(), TradeMode::Upp), "MerTradeNo is required for payment");
    }

    #[test]
    fn test_upp_requires_return_then_notify_url() {
        assert_eq!(reason_of(&payment(), TradeMode::Upp), "ReturnURL is required for UPP");

        let fields = payment().with("ReturnURL", "https://shop.example/return");
        assert_eq!(reason_of(&fields, TradeMode::Upp), "NotifyURL is required for UPP");

        let fields = fields.with("NotifyURL", "https://shop.example/notify");
        assert!(validate(&fields, TradeMode::Upp).is_ok());
    }

    #[test]
    fn test_trade_amt_must_be_positive() {
        let amounts =
            [FieldValue::from(0_i64), "-5".into(), "abc".into(), "".into(), FieldValue::Null];
        for amount in amounts {
            let fields = base().with("MerTradeNo", "T1").with("TradeAmt", amount.clone());
            assert_eq!(
                reason_of(&fields, TradeMode::Atm),
                "TradeAmt is required for payment",
                "{amount:?}"
            );
        }
    }

    #[test]
    fn test_trade_amt_accepts_decimal_text() {
        let fields = base().with("MerTradeNo", "T1").with("TradeAmt", "99.5");
        assert!(validate(&fields, TradeMode::Cvs).is_ok());
    }

    #[test]
    fn test_every_payment_mode_requires_trade_fields() {
        for mode in TradeMode::ALL {
            if mode.spec().family == crate::trade::ModeFamily::Payment {
                assert!(validate(&base(), mode).is_err(), "{mode}");
            }
        }
    }

    #[test]
    fn test_credit_requires_card_or_hash() {
        let err = validate(&payment(), TradeMode::Credit).unwrap_err();
        assert!(matches!(err, TradeError::Validation(_)));
        assert_eq!(err.to_string(), "Credit card information or CreditHash is required");
    }

    #[test]
    fn test_credit_partial_card_is_rejected() {
        let fields = payment().with("CardNo", "4111111111111111").with("CardExpired", "1230");
        assert!(validate(&fields, TradeMode::Credit).is_err());
    }

    #[test]
    fn test_credit_accepts_either_family_or_both() {
        let card = payment()
            .with("CardNo", "4111111111111111")
            .with("CardCVC", "123")
            .with("CardExpired", "1230");
        let token = payment().with("CreditHash", "tok_abc");
        let both = card.clone().with("CreditHash", "tok_abc");

        assert!(validate(&card, TradeMode::Credit).is_ok());
        assert!(validate(&token, TradeMode::Credit).is_ok());
        assert!(validate(&both, TradeMode::Credit).is_ok());
    }

    #[test]
    fn test_trade_management_modes_require_trade_no() {
        for mode in [
            TradeMode::TradeQuery,
            TradeMode::TradeClose,
            TradeMode::TradeCancel,
            TradeMode::CancelCvs,
            TradeMode::TradeConfirmAftee,
            TradeMode::TradeRefundIcash,
            TradeMode::TradeRefundAftee,
            TradeMode::TradeRefundLinepay,
        ] {
            assert_eq!(reason_of(&base(), mode), "TradeNo is required for this operation");
            assert!(validate(&base().with("TradeNo", "X1"), mode).is_ok());
        }
    }

    #[test]
    fn test_credit_bind_modes_need_only_universal_fields() {
        assert!(validate(&base(), TradeMode::CreditBindQuery).is_ok());
        assert!(validate(&base(), TradeMode::CreditBindCancel).is_ok());
    }

    #[test]
    fn test_unknown_fields_are_untouched() {
        let fields = base().with("TradeNo", "X1").with("SomethingNew", "keep me");
        let before = fields.clone();
        assert!(validate(&fields, TradeMode::TradeQuery).is_ok());
        assert_eq!(fields, before);
    }
}
