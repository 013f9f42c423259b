//! PAYUNi Trade: Secure Trade Envelope client for the PAYUNi gateway
//!
//! Every request to the PAYUNi gateway, and every callback it sends back,
//! carries its business fields as an opaque `EncryptInfo` blob plus an
//! independent `HashInfo`. This crate builds and opens those envelopes and
//! drives the 16 gateway operations on top of them.
//!
//! - **Canonical form**: byte-ordered, form-urlencoded plaintext, so equal
//!   field maps always encrypt to equal bytes
//! - **AES-256-GCM**: 16-byte merchant IV as nonce, tag checked before any
//!   plaintext is released
//! - **`HashInfo`**: `UPPER(HEX(SHA-256(key || EncryptInfo || iv)))`,
//!   compared in constant time and verified before decryption
//! - **Mode registry**: a closed enum of trade modes, each with its endpoint
//!   and field requirements
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   FieldMap    ┌──────────────────────────────────────┐
//! │    Caller    │──────────────▶│             TradeClient              │
//! └──────────────┘               │  validate → serialize → encrypt →    │
//!        ▲                       │  hash → redirect form | transport    │
//!        │ TradeResult           └───────────────┬──────────────────────┘
//!        │                                       │ MerID, Version,
//!        │                                       │ EncryptInfo, HashInfo
//!        │                       ┌───────────────▼──────────────────────┐
//!        └───────────────────────│   PAYUNi API (form POST, JSON reply) │
//!          verify → decrypt      └──────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ## 1. Query a Trade
//!
//! ```rust,no_run
//! use payuni_trade::{
//!     config::ClientConfig,
//!     envelope::FieldMap,
//!     trade::TradeClient,
//! };
//!
//! # async fn example() -> payuni_trade::Result<()> {
//! let client = TradeClient::new(ClientConfig::from_env()?)?;
//!
//! let fields = FieldMap::new()
//!     .with("MerID", "ABC")
//!     .with("Timestamp", 1_700_000_000_i64)
//!     .with("TradeNo", "16983781629785413M");
//!
//! let outcome = client.universal_trade(fields, "trade_query", None).await?;
//! println!("{:?}", outcome.fields());
//! # Ok(())
//! # }
//! ```
//!
//! ## 2. Start a Checkout
//!
//! ```rust
//! use payuni_trade::{
//!     config::{ClientConfig, Environment},
//!     trade::{EncryptInfo, TradeClient},
//! };
//!
//! # async fn example() -> payuni_trade::Result<()> {
//! let config = ClientConfig::new(
//!     "12345678901234567890123456789012",
//!     "1234567890123456",
//!     Environment::Sandbox,
//! )?;
//! let client = TradeClient::new(config)?;
//!
//! let info = EncryptInfo {
//!     mer_trade_no: Some("ORDER001".to_owned()),
//!     trade_amt: Some(1000),
//!     prod_desc: Some("Coffee beans".to_owned()),
//!     return_url: Some("https://shop.example/return".to_owned()),
//!     notify_url: Some("https://shop.example/notify".to_owned()),
//!     ..EncryptInfo::new("ABC", 1_700_000_000)
//! };
//!
//! // Redirect modes never touch the network.
//! let outcome = client.universal_trade(info, "upp", None).await?;
//! let html = outcome.redirect().map(|form| form.to_html());
//! assert!(html.is_some());
//! # Ok(())
//! # }
//! ```
//!
//! ## 3. Handle a Callback
//!
//! ```rust,no_run
//! # fn example(client: &payuni_trade::trade::TradeClient, body: &str) {
//! match client.result_process(body) {
//!     Ok(outcome) => println!("paid: {:?}", outcome.fields()),
//!     Err(err) => eprintln!("rejected: {err}"),
//! }
//! # }
//! ```
//!
//! # Module Organization
//!
//! - [`envelope`]: canonical form, cipher, hash and key material
//! - [`trade`]: mode registry, validation, dispatcher and callbacks
//! - [`transport`]: sealed transport trait and the reqwest implementation
//! - [`config`]: client configuration from code, environment or TOML
//! - [`error`]: the [`TradeError`] taxonomy
//!
//! # Security Considerations
//!
//! - Key and IV bytes are wiped on drop and redacted from `Debug` output.
//! - Neither key material nor plaintext fields are written to logs.
//! - Only HTTPS base URLs are accepted unless `allow_insecure_http` is set.
//! - Nothing is retried internally; see [`TradeError::is_retryable`].

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod config;
pub mod envelope;
pub mod error;
pub mod trade;
pub mod transport;

pub use config::{ClientConfig, Environment};
pub use error::{Result, TradeError};
pub use trade::{TradeClient, TradeMode, TradeOutcome, TradeResult};
