//! Trade modes, validation and dispatch.
//!
//! # Architecture
//!
//! - [`mode`]: closed registry of the 16 gateway operations
//! - [`validation`]: per-mode field requirements, checked before any crypto
//! - [`request`] / [`response`]: outer wire parameters in both directions
//! - [`redirect`]: browser form for redirect modes
//! - [`client`]: the [`TradeClient`] pipeline tying these together

pub mod client;
pub mod fields;
pub mod mode;
pub mod redirect;
pub mod request;
pub mod response;
pub mod validation;

pub use client::{BatchQueryResult, DEFAULT_BATCH_SPACING, DispatchStage, TradeClient};
pub use fields::EncryptInfo;
pub use mode::{Delivery, ModeFamily, Requirement, TradeMode, TradeModeSpec};
pub use redirect::RedirectForm;
pub use request::{TradeRequest, TransportParams};
pub use response::{ApiResponse, CallbackPayload};

use crate::{envelope::FieldMap, error::TradeError};

/// Successful result of a trade or callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TradeOutcome {
    /// Decrypted (or raw) result fields.
    Fields(FieldMap),
    /// Browser form to hand to the payer.
    Redirect(RedirectForm),
}

impl TradeOutcome {
    /// Returns the result fields, if any.
    #[must_use]
    pub const fn fields(&self) -> Option<&FieldMap> {
        match self {
            Self::Fields(fields) => Some(fields),
            Self::Redirect(_) => None,
        }
    }

    /// Returns the redirect form, if any.
    #[must_use]
    pub const fn redirect(&self) -> Option<&RedirectForm> {
        match self {
            Self::Redirect(form) => Some(form),
            Self::Fields(_) => None,
        }
    }

    /// Consumes the outcome, returning the result fields.
    #[must_use]
    pub fn into_fields(self) -> Option<FieldMap> {
        match self {
            Self::Fields(fields) => Some(fields),
            Self::Redirect(_) => None,
        }
    }
}

/// Uniform result of trades and callbacks.
pub type TradeResult = std::result::Result<TradeOutcome, TradeError>;
