//! Gateway transport.
//!
//! A transport delivers one form-encoded body to one endpoint and hands back
//! the raw reply. It knows nothing about envelopes; sealing, validation and
//! reply interpretation live in [`crate::trade`].
//!
//! # Examples
//!
//! ```rust,no_run
//! use payuni_trade::transport::{GatewayRequest, HttpTransport, Transport};
//!
//! # async fn example() -> payuni_trade::Result<()> {
//! let transport = HttpTransport::new()?;
//!
//! let request = GatewayRequest {
//!     base_url: "https://sandbox-api.payuni.com.tw/api/",
//!     endpoint: "trade/query",
//!     form: "MerID=ABC&Version=1.0",
//! };
//!
//! let reply = transport.post_form(request).await?;
//! println!("gateway answered {}", reply.status);
//! # Ok(())
//! # }
//! ```

#[allow(
    redundant_imports,
    reason = "Future needed for RPITIT despite being in Edition 2024 prelude"
)]
use std::future::Future;

use crate::error::Result;

pub mod config;
pub mod http;
mod sealed;

pub use config::{HttpConfig, HttpVersion};
pub use http::HttpTransport;

/// `User-Agent` sent with every gateway request.
pub const USER_AGENT: &str = "PRESCOSDKAPI";

/// `Content-Type` of every gateway request body.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// One form post to a gateway endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatewayRequest<'a> {
    /// API base URL, with or without a trailing slash.
    pub base_url: &'a str,
    /// Mode endpoint relative to `base_url`, e.g. `trade/query`.
    pub endpoint: &'a str,
    /// Form-urlencoded outer parameters.
    pub form: &'a str,
}

impl GatewayRequest<'_> {
    /// Absolute endpoint URL; base and endpoint are joined by exactly one slash.
    #[must_use]
    pub fn url(&self) -> String {
        endpoint_url(self.base_url, self.endpoint)
    }
}

/// Joins a base URL and an endpoint path with exactly one slash.
#[must_use]
pub fn endpoint_url(base_url: &str, endpoint: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), endpoint.trim_start_matches('/'))
}

/// Raw gateway reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayReply {
    /// HTTP status code.
    pub status: u16,
    /// Reply body, expected to be JSON.
    pub body: Vec<u8>,
}

/// Delivers sealed parameters to the gateway.
///
/// Sealed: every implementation lives in this crate, so every request
/// carries the gateway headers and obeys the base URL policy.
pub trait Transport: sealed::private::Sealed + Send + Sync {
    /// Posts `request.form` to the endpoint.
    ///
    /// # Errors
    ///
    /// [`TradeError::TransportError`](crate::TradeError::TransportError) for
    /// a rejected URL or a non-2xx reply,
    /// [`TradeError::HttpError`](crate::TradeError::HttpError) if the request
    /// could not be completed.
    fn post_form<'a>(
        &'a self,
        request: GatewayRequest<'a>,
    ) -> impl Future<Output = Result<GatewayReply>> + Send + 'a;

    /// Protocol label for log fields, e.g. `http/2`.
    fn protocol_name(&self) -> &'static str;
}

#[cfg(test)]
pub(crate) mod mock {
    //! In-memory transport recording every request.

    use std::{collections::VecDeque, sync::Mutex};

    use super::{GatewayReply, GatewayRequest, Transport, sealed};
    use crate::error::{Result, TradeError};

    /// A post captured by [`MockTransport`].
    #[derive(Debug, Clone)]
    pub(crate) struct SentForm {
        pub url: String,
        pub form: String,
    }

    /// Replays canned replies in order, then fails.
    #[derive(Debug, Default)]
    pub(crate) struct MockTransport {
        replies: Mutex<VecDeque<Result<GatewayReply>>>,
        sent: Mutex<Vec<SentForm>>,
    }

    impl MockTransport {
        pub(crate) fn with_bodies<I, S>(bodies: I) -> Self
        where
            I: IntoIterator<Item = S>,
            S: Into<Vec<u8>>,
        {
            let replies = bodies
                .into_iter()
                .map(|body| Ok(GatewayReply { status: 200, body: body.into() }))
                .collect();
            Self { replies: Mutex::new(replies), sent: Mutex::default() }
        }

        pub(crate) fn failing(message: &str) -> Self {
            let replies = VecDeque::from([Err(TradeError::TransportError(message.to_owned()))]);
            Self { replies: Mutex::new(replies), sent: Mutex::default() }
        }

        pub(crate) fn sent(&self) -> Vec<SentForm> {
            self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
        }
    }

    impl sealed::private::Sealed for MockTransport {}

    impl Transport for MockTransport {
        async fn post_form<'a>(&'a self, request: GatewayRequest<'a>) -> Result<GatewayReply> {
            if let Ok(mut sent) = self.sent.lock() {
                sent.push(SentForm { url: request.url(), form: request.form.to_owned() });
            }
            self.replies
                .lock()
                .ok()
                .and_then(|mut replies| replies.pop_front())
                .unwrap_or_else(|| Err(TradeError::TransportError("no canned reply".to_owned())))
        }

        fn protocol_name(&self) -> &'static str {
            "mock"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_url_single_slash() {
        assert_eq!(
            endpoint_url("https://api.payuni.com.tw/api/", "trade/query"),
            "https://api.payuni.com.tw/api/trade/query"
        );
        assert_eq!(
            endpoint_url("https://api.payuni.com.tw/api", "/upp"),
            "https://api.payuni.com.tw/api/upp"
        );
        assert_eq!(
            endpoint_url("https://api.payuni.com.tw/api//", "atm"),
            "https://api.payuni.com.tw/api/atm"
        );
    }

    #[test]
    fn test_gateway_request_url() {
        let request = GatewayRequest {
            base_url: "https://sandbox-api.payuni.com.tw/api/",
            endpoint: "cvs",
            form: "",
        };
        assert_eq!(request.url(), "https://sandbox-api.payuni.com.tw/api/cvs");
    }

    #[tokio::test]
    async fn test_mock_transport_replays_then_fails() {
        let mock = mock::MockTransport::with_bodies(["first", "second"]);
        let request =
            GatewayRequest { base_url: "https://example.com/api/", endpoint: "cvs", form: "a=1" };

        assert_eq!(mock.post_form(request).await.unwrap().body, b"first");
        let second = GatewayRequest { form: "a=2", ..request };
        assert_eq!(mock.post_form(second).await.unwrap().body, b"second");
        assert!(mock.post_form(request).await.is_err());

        let sent = mock.sent();
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[1].form, "a=2");
        assert_eq!(sent[0].url, "https://example.com/api/cvs");
    }
}
