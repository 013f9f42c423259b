//! Closed registry of trade modes.
//!
//! Each [`TradeMode`] maps to exactly one gateway endpoint and one
//! [`TradeModeSpec`]. Parsing an identifier outside the registry fails with
//! [`TradeError::UnsupportedMode`]; there is no fallback route.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    error::TradeError,
    trade::fields::names::{
        CARD_CVC, CARD_EXPIRED, CARD_NO, CREDIT_HASH, MER_TRADE_NO, NOTIFY_URL, RETURN_URL,
        TRADE_AMT, TRADE_NO,
    },
};

/// Protocol version used when the caller does not set one.
pub const DEFAULT_VERSION: &str = "1.0";

/// Default protocol version for LINE Pay.
pub const LINEPAY_VERSION: &str = "1.1";

/// Logical gateway operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeMode {
    /// Unified payment page (browser redirect checkout).
    Upp,
    /// ATM virtual account.
    Atm,
    /// Convenience store payment code.
    Cvs,
    /// Direct credit card charge.
    Credit,
    /// LINE Pay wallet payment.
    Linepay,
    /// AFTEE deferred payment.
    AfteeDirect,
    /// Trade status query.
    TradeQuery,
    /// Capture or refund request on a credit trade.
    TradeClose,
    /// Cancel an uncaptured credit authorization.
    TradeCancel,
    /// Cancel a convenience store payment code.
    CancelCvs,
    /// Query stored-credential tokens.
    CreditBindQuery,
    /// Cancel a stored-credential token.
    CreditBindCancel,
    /// Confirm an AFTEE trade.
    TradeConfirmAftee,
    /// Refund an iCash trade.
    TradeRefundIcash,
    /// Refund an AFTEE trade.
    TradeRefundAftee,
    /// Refund a LINE Pay trade.
    TradeRefundLinepay,
}

/// Group of modes sharing validation rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeFamily {
    /// Modes that start a payment.
    Payment,
    /// Modes acting on an existing gateway trade.
    TradeManagement,
    /// Stored-credential management.
    CreditBind,
}

/// How the sealed parameters reach the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Returned to the caller as a self-submitting browser form.
    BrowserRedirect,
    /// Posted by this client, with the response interpreted in-line.
    Backend,
}

/// One field requirement of a mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// The field must hold a non-blank value.
    Present {
        /// Field name.
        field: &'static str,
        /// Failure reason.
        reason: &'static str,
    },
    /// The field must hold a number greater than zero.
    PositiveAmount {
        /// Field name.
        field: &'static str,
        /// Failure reason.
        reason: &'static str,
    },
    /// At least one group must have all of its fields present.
    AnyGroup {
        /// Alternative field groups.
        groups: &'static [&'static [&'static str]],
        /// Failure reason.
        reason: &'static str,
    },
}

/// Static description of a mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradeModeSpec {
    /// Mode this spec describes.
    pub mode: TradeMode,
    /// Endpoint path relative to the API base URL.
    pub endpoint: &'static str,
    /// Validation family.
    pub family: ModeFamily,
    /// Delivery of the sealed parameters.
    pub delivery: Delivery,
    /// Version sent when the caller does not set one.
    pub default_version: &'static str,
    /// Mode-specific requirements, checked in order after the universal ones.
    pub requirements: &'static [Requirement],
}

const MER_TRADE_NO_REQUIRED: Requirement =
    Requirement::Present { field: MER_TRADE_NO, reason: "MerTradeNo is required for payment" };
const TRADE_AMT_REQUIRED: Requirement =
    Requirement::PositiveAmount { field: TRADE_AMT, reason: "TradeAmt is required for payment" };

const PAYMENT: &[Requirement] = &[MER_TRADE_NO_REQUIRED, TRADE_AMT_REQUIRED];

const UPP: &[Requirement] = &[
    MER_TRADE_NO_REQUIRED,
    TRADE_AMT_REQUIRED,
    Requirement::Present { field: RETURN_URL, reason: "ReturnURL is required for UPP" },
    Requirement::Present { field: NOTIFY_URL, reason: "NotifyURL is required for UPP" },
];

const CREDIT: &[Requirement] = &[
    MER_TRADE_NO_REQUIRED,
    TRADE_AMT_REQUIRED,
    Requirement::AnyGroup {
        groups: &[&[CARD_NO, CARD_CVC, CARD_EXPIRED], &[CREDIT_HASH]],
        reason: "Credit card information or CreditHash is required",
    },
];

const NO_EXTRA: &[Requirement] = &[];

const TRADE_NO_REQUIRED: &[Requirement] =
    &[Requirement::Present { field: TRADE_NO, reason: "TradeNo is required for this operation" }];

impl TradeMode {
    /// All supported modes.
    pub const ALL: [Self; 16] = [
        Self::Upp,
        Self::Atm,
        Self::Cvs,
        Self::Credit,
        Self::Linepay,
        Self::AfteeDirect,
        Self::TradeQuery,
        Self::TradeClose,
        Self::TradeCancel,
        Self::CancelCvs,
        Self::CreditBindQuery,
        Self::CreditBindCancel,
        Self::TradeConfirmAftee,
        Self::TradeRefundIcash,
        Self::TradeRefundAftee,
        Self::TradeRefundLinepay,
    ];

    /// Returns the mode identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Upp => "upp",
            Self::Atm => "atm",
            Self::Cvs => "cvs",
            Self::Credit => "credit",
            Self::Linepay => "linepay",
            Self::AfteeDirect => "aftee_direct",
            Self::TradeQuery => "trade_query",
            Self::TradeClose => "trade_close",
            Self::TradeCancel => "trade_cancel",
            Self::CancelCvs => "cancel_cvs",
            Self::CreditBindQuery => "credit_bind_query",
            Self::CreditBindCancel => "credit_bind_cancel",
            Self::TradeConfirmAftee => "trade_confirm_aftee",
            Self::TradeRefundIcash => "trade_refund_icash",
            Self::TradeRefundAftee => "trade_refund_aftee",
            Self::TradeRefundLinepay => "trade_refund_linepay",
        }
    }

    /// Returns the registry entry for this mode.
    #[must_use]
    pub const fn spec(self) -> TradeModeSpec {
        use Delivery::{Backend, BrowserRedirect};
        use ModeFamily::{CreditBind, Payment, TradeManagement};

        let (endpoint, family, delivery, requirements) = match self {
            Self::Upp => ("upp", Payment, BrowserRedirect, UPP),
            Self::Atm => ("atm", Payment, Backend, PAYMENT),
            Self::Cvs => ("cvs", Payment, Backend, PAYMENT),
            Self::Credit => ("credit", Payment, Backend, CREDIT),
            Self::Linepay => ("linepay", Payment, Backend, PAYMENT),
            Self::AfteeDirect => ("aftee/direct", Payment, Backend, PAYMENT),
            Self::TradeQuery => ("trade/query", TradeManagement, Backend, TRADE_NO_REQUIRED),
            Self::TradeClose => ("trade/close", TradeManagement, Backend, TRADE_NO_REQUIRED),
            Self::TradeCancel => ("trade/cancel", TradeManagement, Backend, TRADE_NO_REQUIRED),
            Self::CancelCvs => ("cancel/cvs", TradeManagement, Backend, TRADE_NO_REQUIRED),
            Self::CreditBindQuery => ("credit_bind/query", CreditBind, Backend, NO_EXTRA),
            Self::CreditBindCancel => ("credit_bind/cancel", CreditBind, Backend, NO_EXTRA),
            Self::TradeConfirmAftee => {
                ("trade/common/confirm/aftee", TradeManagement, Backend, TRADE_NO_REQUIRED)
            }
            Self::TradeRefundIcash => {
                ("trade/common/refund/icash", TradeManagement, Backend, TRADE_NO_REQUIRED)
            }
            Self::TradeRefundAftee => {
                ("trade/common/refund/aftee", TradeManagement, Backend, TRADE_NO_REQUIRED)
            }
            Self::TradeRefundLinepay => {
                ("trade/common/refund/linepay", TradeManagement, Backend, TRADE_NO_REQUIRED)
            }
        };

        let default_version = match self {
            Self::Linepay => LINEPAY_VERSION,
            _ => DEFAULT_VERSION,
        };

        TradeModeSpec { mode: self, endpoint, family, delivery, default_version, requirements }
    }

    /// Endpoint path relative to the API base URL.
    #[must_use]
    pub const fn endpoint(self) -> &'static str {
        self.spec().endpoint
    }

    /// Returns `true` if the sealed parameters are returned as a browser form.
    #[must_use]
    pub const fn is_browser_redirect(self) -> bool {
        matches!(self.spec().delivery, Delivery::BrowserRedirect)
    }
}

impl fmt::Display for TradeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TradeMode {
    type Err = TradeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| TradeError::UnsupportedMode(s.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_registry_has_sixteen_unique_modes() {
        let ids: HashSet<_> = TradeMode::ALL.iter().map(|m| m.as_str()).collect();
        let endpoints: HashSet<_> = TradeMode::ALL.iter().map(|m| m.endpoint()).collect();
        assert_eq!(ids.len(), 16);
        assert_eq!(endpoints.len(), 16);
    }

    #[test]
    fn test_from_str_roundtrips_every_mode() {
        for mode in TradeMode::ALL {
            assert_eq!(mode.as_str().parse::<TradeMode>().unwrap(), mode);
            assert_eq!(mode.spec().mode, mode);
        }
    }

    #[test]
    fn test_from_str_rejects_unknown_mode() {
        let err = "frobnicate".parse::<TradeMode>().unwrap_err();
        assert!(matches!(err, TradeError::UnsupportedMode(ref m) if m == "frobnicate"));
        assert_eq!(err.to_string(), "Invalid mode: frobnicate");
    }

    #[test]
    fn test_from_str_is_case_sensitive() {
        assert!("UPP".parse::<TradeMode>().is_err());
        assert!(" upp".parse::<TradeMode>().is_err());
    }

    #[test]
    fn test_endpoint_table() {
        assert_eq!(TradeMode::Upp.endpoint(), "upp");
        assert_eq!(TradeMode::AfteeDirect.endpoint(), "aftee/direct");
        assert_eq!(TradeMode::TradeQuery.endpoint(), "trade/query");
        assert_eq!(TradeMode::CancelCvs.endpoint(), "cancel/cvs");
        assert_eq!(TradeMode::CreditBindCancel.endpoint(), "credit_bind/cancel");
        assert_eq!(TradeMode::TradeConfirmAftee.endpoint(), "trade/common/confirm/aftee");
        assert_eq!(TradeMode::TradeRefundLinepay.endpoint(), "trade/common/refund/linepay");
    }

    #[test]
    fn test_only_upp_is_browser_redirect() {
        let redirects: Vec<_> =
            TradeMode::ALL.into_iter().filter(|m| m.is_browser_redirect()).collect();
        assert_eq!(redirects, vec![TradeMode::Upp]);
    }

    #[test]
    fn test_default_versions() {
        assert_eq!(TradeMode::Linepay.spec().default_version, "1.1");
        for mode in TradeMode::ALL.into_iter().filter(|m| *m != TradeMode::Linepay) {
            assert_eq!(mode.spec().default_version, "1.0", "{mode}");
        }
    }

    #[test]
    fn test_families() {
        let payment: Vec<_> = TradeMode::ALL
            .into_iter()
            .filter(|m| m.spec().family == ModeFamily::Payment)
            .collect();
        assert_eq!(payment.len(), 6);
        assert_eq!(TradeMode::CreditBindQuery.spec().family, ModeFamily::CreditBind);
        assert!(TradeMode::CreditBindQuery.spec().requirements.is_empty());
        assert_eq!(TradeMode::TradeRefundIcash.spec().family, ModeFamily::TradeManagement);
    }

    #[test]
    fn test_serde_uses_mode_identifier() {
        let json = serde_json::to_string(&TradeMode::TradeRefundAftee).unwrap();
        assert_eq!(json, "\"trade_refund_aftee\"");
        let mode: TradeMode = serde_json::from_str("\"credit_bind_query\"").unwrap();
        assert_eq!(mode, TradeMode::CreditBindQuery);
    }
}
