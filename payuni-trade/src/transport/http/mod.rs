//! reqwest-backed gateway transport.
//!
//! Transports built from the default settings share one pooled
//! [`reqwest::Client`]; custom settings get their own. Every post carries
//! [`USER_AGENT`] and [`FORM_CONTENT_TYPE`]; the base URL must be HTTPS on
//! a non-loopback host unless `allow_insecure_http` is set.

use std::sync::OnceLock;

use reqwest::{Client, header::CONTENT_TYPE};
use tracing::{debug, instrument};
use url::{Host, Url};

use super::config::{HttpConfig, HttpVersion};
use crate::{
    error::{Result, TradeError},
    transport::{
        FORM_CONTENT_TYPE, GatewayReply, GatewayRequest, Transport, USER_AGENT, sealed,
    },
};

/// Client shared by every transport built from [`HttpConfig::default`].
static DEFAULT_HTTP_CLIENT: OnceLock<Client> = OnceLock::new();

/// Posts sealed forms over HTTP/1.1 or HTTP/2.
///
/// Cheap to clone; clones share the connection pool.
///
/// # Examples
///
/// ```rust,no_run
/// use payuni_trade::transport::{
///     GatewayRequest, HttpConfig, HttpTransport, HttpVersion, Transport,
/// };
///
/// # async fn example() -> payuni_trade::Result<()> {
/// let config = HttpConfig {
///     timeout_secs: 60,
///     http_version: HttpVersion::Http1,
///     ..HttpConfig::default()
/// };
/// let transport = HttpTransport::with_config(&config)?;
///
/// let reply = transport
///     .post_form(GatewayRequest {
///         base_url: "https://api.payuni.com.tw/api/",
///         endpoint: "trade/query",
///         form: "MerID=ABC",
///     })
///     .await?;
/// assert_eq!(reply.status, 200);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    http_version: HttpVersion,
    allow_insecure_http: bool,
}

impl sealed::private::Sealed for HttpTransport {}

impl HttpTransport {
    /// Creates a transport with [`HttpConfig::default`] on the shared
    /// default client.
    ///
    /// # Errors
    ///
    /// Returns [`TradeError::HttpError`] if the client cannot be built.
    pub fn new() -> Result<Self> {
        Self::with_config(&HttpConfig::default())
    }

    /// Creates a transport from explicit settings.
    ///
    /// Settings equal to the defaults, `allow_insecure_http` aside, reuse
    /// the shared default client and its connection pool.
    ///
    /// # Errors
    ///
    /// Returns [`TradeError::HttpError`] if the client cannot be built.
    pub fn with_config(config: &HttpConfig) -> Result<Self> {
        let client_settings = HttpConfig { allow_insecure_http: false, ..config.clone() };
        let client = if client_settings == HttpConfig::default() {
            default_client()?
        } else {
            build_client(config)?
        };

        Ok(Self {
            client,
            http_version: config.http_version,
            allow_insecure_http: config.allow_insecure_http,
        })
    }

    fn target(&self, request: &GatewayRequest<'_>) -> Result<Url> {
        let base = Url::parse(request.base_url).map_err(|e| {
            TradeError::Config(format!("invalid base_url '{}': {e}", request.base_url))
        })?;
        check_base_url(&base, self.allow_insecure_http)?;
        check_endpoint(request.endpoint)?;

        Url::parse(&request.url())
            .map_err(|e| TradeError::TransportError(format!("invalid endpoint URL: {e}")))
    }

    #[instrument(skip_all, fields(endpoint = request.endpoint, protocol = self.protocol_name()))]
    async fn execute(&self, request: GatewayRequest<'_>) -> Result<GatewayReply> {
        let url = self.target(&request)?;

        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(request.form.to_owned())
            .send()
            .await?;

        let status = response.status();
        debug!(status = status.as_u16(), "gateway responded");
        if !status.is_success() {
            return Err(TradeError::TransportError(format!(
                "gateway returned status {}",
                status.as_u16()
            )));
        }

        let body = response.bytes().await?.to_vec();
        Ok(GatewayReply { status: status.as_u16(), body })
    }
}

/// Returns the shared default client, building it on first use.
fn default_client() -> Result<Client> {
    if let Some(client) = DEFAULT_HTTP_CLIENT.get() {
        return Ok(client.clone());
    }
    let built = build_client(&HttpConfig::default())?;
    Ok(DEFAULT_HTTP_CLIENT.get_or_init(|| built).clone())
}

fn build_client(config: &HttpConfig) -> Result<Client> {
    let builder = Client::builder()
        .user_agent(USER_AGENT)
        .pool_max_idle_per_host(config.pool_max_idle_per_host)
        .timeout(config.timeout())
        .connect_timeout(config.connect_timeout());

    let builder = match config.http_version {
        HttpVersion::Http1 => builder.http1_only(),
        HttpVersion::Http2 => builder.http2_prior_knowledge(),
        HttpVersion::Auto => builder,
    };
    Ok(builder.build()?)
}

/// Enforces the base URL policy.
fn check_base_url(url: &Url, allow_insecure: bool) -> Result<()> {
    match url.scheme() {
        "https" => {}
        "http" if allow_insecure => {}
        "http" => {
            return Err(TradeError::TransportError("Only HTTPS URLs are allowed".to_owned()));
        }
        other => {
            return Err(TradeError::TransportError(format!("unsupported URL scheme: {other}")));
        }
    }

    if !allow_insecure && url.host().is_some_and(|host| is_loopback(&host)) {
        return Err(TradeError::TransportError("Loopback gateway URLs are not allowed".to_owned()));
    }
    Ok(())
}

fn is_loopback(host: &Host<&str>) -> bool {
    match host {
        Host::Domain(name) => name.eq_ignore_ascii_case("localhost"),
        Host::Ipv4(ip) => ip.is_loopback(),
        Host::Ipv6(ip) => ip.is_loopback(),
    }
}

/// Rejects endpoints that could escape the API prefix.
fn check_endpoint(endpoint: &str) -> Result<()> {
    let bad = endpoint.contains("..")
        || endpoint.contains("//")
        || endpoint.contains(['?', '#'])
        || endpoint.chars().any(char::is_control);
    if bad {
        return Err(TradeError::TransportError(format!("invalid endpoint path: {endpoint:?}")));
    }
    Ok(())
}

impl Transport for HttpTransport {
    async fn post_form<'a>(&'a self, request: GatewayRequest<'a>) -> Result<GatewayReply> {
        self.execute(request).await
    }

    fn protocol_name(&self) -> &'static str {
        match self.http_version {
            HttpVersion::Http1 => "http/1.1",
            HttpVersion::Http2 => "http/2",
            HttpVersion::Auto => "http",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(url: &str) -> Url {
        Url::parse(url).unwrap()
    }

    #[test]
    fn test_protocol_names() {
        let versions = [
            (HttpVersion::Http1, "http/1.1"),
            (HttpVersion::Http2, "http/2"),
            (HttpVersion::Auto, "http"),
        ];
        for (http_version, name) in versions {
            let config = HttpConfig { http_version, ..HttpConfig::default() };
            let transport = HttpTransport::with_config(&config).unwrap();
            assert_eq!(transport.protocol_name(), name);
        }
    }

    #[test]
    fn test_default_transports_share_client() {
        let first = HttpTransport::new().unwrap();
        let insecure = HttpConfig { allow_insecure_http: true, ..HttpConfig::default() };
        let second = HttpTransport::with_config(&insecure).unwrap();

        assert!(DEFAULT_HTTP_CLIENT.get().is_some());
        assert_eq!(first.protocol_name(), "http");
        assert!(!first.allow_insecure_http);
        assert!(second.allow_insecure_http);
    }

    #[test]
    fn test_base_url_requires_https() {
        let url = parse("http://api.payuni.com.tw/api/");
        assert!(check_base_url(&url, false).is_err());
        assert!(check_base_url(&url, true).is_ok());
        assert!(check_base_url(&parse("https://api.payuni.com.tw/api/"), false).is_ok());
    }

    #[test]
    fn test_base_url_rejects_loopback_unless_insecure() {
        for url in ["https://127.0.0.1:8443/api/", "https://localhost/api/", "https://[::1]/api/"] {
            assert!(check_base_url(&parse(url), false).is_err(), "{url}");
            assert!(check_base_url(&parse(url), true).is_ok(), "{url}");
        }
    }

    #[test]
    fn test_base_url_rejects_other_schemes() {
        let url = parse("file:///etc/passwd");
        assert!(check_base_url(&url, false).is_err());
        assert!(check_base_url(&url, true).is_err());
    }

    #[test]
    fn test_check_endpoint() {
        assert!(check_endpoint("trade/common/refund/icash").is_ok());
        assert!(check_endpoint("../admin").is_err());
        assert!(check_endpoint("trade//query").is_err());
        assert!(check_endpoint("upp?redirect=evil").is_err());
        assert!(check_endpoint("atm\r\nX: 1").is_err());
    }

    #[tokio::test]
    async fn test_post_form_invalid_base_url() {
        let transport = HttpTransport::new().unwrap();
        let request = GatewayRequest { base_url: "not-a-url", endpoint: "trade/query", form: "" };
        assert!(matches!(transport.post_form(request).await, Err(TradeError::Config(_))));
    }

    #[tokio::test]
    async fn test_post_form_rejects_plain_http() {
        let transport = HttpTransport::new().unwrap();
        let request = GatewayRequest {
            base_url: "http://sandbox-api.payuni.com.tw/api/",
            endpoint: "trade/query",
            form: "",
        };
        assert!(matches!(transport.post_form(request).await, Err(TradeError::TransportError(_))));
    }
}
