//! Trade dispatcher.
//!
//! [`TradeClient`] drives one trade through validation, canonical
//! serialization, encryption and hashing, then either returns a browser
//! form or posts the sealed parameters and interprets the reply. Each call
//! is independent: the client holds only the immutable key, IV, base URL
//! and transport.

use std::{
    fmt,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::{
    config::ClientConfig,
    envelope::{FieldMap, MerchantKeys, SealedEnvelope, canonical, cipher, hash},
    error::{Result, TradeError},
    trade::{
        TradeOutcome, TradeResult,
        fields::names::{MER_ID, TIMESTAMP, TRADE_NO},
        mode::TradeMode,
        redirect::RedirectForm,
        request::{TradeRequest, TransportParams},
        response::{self, ApiResponse, CallbackPayload},
        validation,
    },
    transport::{self, GatewayRequest, HttpTransport, Transport},
};

/// Pause between queries of [`TradeClient::batch_query`] unless overridden.
pub const DEFAULT_BATCH_SPACING: Duration = Duration::from_millis(100);

/// Pipeline stage of a single dispatch.
///
/// Stages run in declaration order; [`BuildingRedirect`](Self::BuildingRedirect)
/// and [`Transmitting`](Self::Transmitting) are alternatives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchStage {
    /// Checking fields against the mode registry.
    Validating,
    /// Producing the canonical form.
    Serializing,
    /// Producing `EncryptInfo`.
    Encrypting,
    /// Producing `HashInfo`.
    Hashing,
    /// Producing the browser form.
    BuildingRedirect,
    /// Waiting on the transport.
    Transmitting,
    /// Checking and opening the gateway reply.
    InterpretingResponse,
    /// Finished successfully.
    Done,
    /// Finished with an error.
    Failed,
}

impl DispatchStage {
    /// Stage name used in log fields.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validating => "validating",
            Self::Serializing => "serializing",
            Self::Encrypting => "encrypting",
            Self::Hashing => "hashing",
            Self::BuildingRedirect => "building_redirect",
            Self::Transmitting => "transmitting",
            Self::InterpretingResponse => "interpreting_response",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for DispatchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tracks the current stage of a dispatch for logging.
#[derive(Debug)]
struct StageTracker(DispatchStage);

impl StageTracker {
    fn start() -> Self {
        debug!(to = %DispatchStage::Validating, "dispatch stage");
        Self(DispatchStage::Validating)
    }

    fn enter(&mut self, stage: DispatchStage) {
        debug!(from = %self.0, to = %stage, "dispatch stage");
        self.0 = stage;
    }

    fn finish<T>(&self, result: Result<T>) -> Result<T> {
        match &result {
            Ok(_) => debug!(from = %self.0, to = %DispatchStage::Done, "dispatch stage"),
            Err(err) => warn!(
                stage = %self.0,
                to = %DispatchStage::Failed,
                error_kind = err.kind(),
                reason = %err,
                "trade failed"
            ),
        }
        result
    }
}

/// Result of one query in [`TradeClient::batch_query`].
#[derive(Debug)]
pub struct BatchQueryResult {
    /// Queried gateway trade number.
    pub trade_no: String,
    /// Outcome of the query.
    pub result: TradeResult,
}

/// Client for the PAYUNi trade API.
///
/// # Examples
///
/// ```rust,no_run
/// use payuni_trade::{
///     config::{ClientConfig, Environment},
///     envelope::FieldMap,
///     trade::{TradeClient, TradeOutcome},
/// };
///
/// # async fn example() -> payuni_trade::Result<()> {
/// let config = ClientConfig::new(
///     "12345678901234567890123456789012",
///     "1234567890123456",
///     Environment::Sandbox,
/// )?;
/// let client = TradeClient::new(config)?;
///
/// let fields = FieldMap::new()
///     .with("MerID", "ABC")
///     .with("Timestamp", 1_700_000_000_i64)
///     .with("TradeNo", "X1");
///
/// match client.universal_trade(fields, "trade_query", None).await? {
///     TradeOutcome::Fields(result) => println!("{:?}", result.text("TradeStatus")),
///     TradeOutcome::Redirect(form) => println!("{}", form.to_html()),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct TradeClient<T: Transport = HttpTransport> {
    keys: MerchantKeys,
    base_url: String,
    transport: T,
}

impl TradeClient<HttpTransport> {
    /// Creates a client posting over HTTP.
    ///
    /// # Errors
    ///
    /// Returns [`TradeError::Config`] for an invalid configuration, or
    /// [`TradeError::HttpError`] if the HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let transport = HttpTransport::with_config(&config.http)?;
        Ok(Self::with_transport(config, transport))
    }
}

impl<T: Transport> TradeClient<T> {
    /// Creates a client with an explicit transport.
    #[must_use]
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        let base_url = config.base_url().to_owned();
        Self { keys: config.keys, base_url, transport }
    }

    /// Gateway base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL of a mode's endpoint.
    #[must_use]
    pub fn endpoint_url(&self, mode: TradeMode) -> String {
        transport::endpoint_url(&self.base_url, mode.endpoint())
    }

    /// Runs a trade identified by its mode string.
    ///
    /// `version` defaults to the mode's version when `None`.
    ///
    /// # Errors
    ///
    /// Returns [`TradeError::UnsupportedMode`] for an unknown mode, before
    /// any other work; otherwise see [`trade`](Self::trade).
    pub async fn universal_trade(
        &self,
        fields: impl Into<FieldMap>,
        mode: &str,
        version: Option<&str>,
    ) -> TradeResult {
        let mode = mode.parse::<TradeMode>().inspect_err(|err: &TradeError| {
            warn!(
                stage = %DispatchStage::Validating,
                error_kind = err.kind(),
                reason = %err,
                "trade failed"
            );
        })?;

        let mut request = TradeRequest::new(fields, mode);
        if let Some(version) = version {
            request = request.with_version(version);
        }
        self.trade(request).await
    }

    /// Validates, seals and dispatches a trade.
    ///
    /// Browser-redirect modes return [`TradeOutcome::Redirect`] without
    /// touching the transport. Backend modes return the opened response
    /// fields.
    ///
    /// # Errors
    ///
    /// The first error of the pipeline, unchanged. Nothing is retried.
    #[instrument(
        skip(self, request),
        fields(
            request_id = %Uuid::new_v4(),
            mode = %request.mode,
            version = request.effective_version(),
            protocol = self.transport.protocol_name()
        )
    )]
    pub async fn trade(&self, request: TradeRequest) -> TradeResult {
        let mut stage = StageTracker::start();
        let result = self.dispatch(&request, &mut stage).await;
        stage.finish(result)
    }

    async fn dispatch(&self, request: &TradeRequest, stage: &mut StageTracker) -> TradeResult {
        validation::validate(&request.fields, request.mode)?;

        stage.enter(DispatchStage::Serializing);
        let form = canonical::serialize(&request.fields);

        stage.enter(DispatchStage::Encrypting);
        let encrypt_info = cipher::encrypt(&form, &self.keys)?;

        stage.enter(DispatchStage::Hashing);
        let hash_info = hash::hash(&encrypt_info, &self.keys);
        let params = TransportParams::new(request, SealedEnvelope { encrypt_info, hash_info });

        if request.mode.is_browser_redirect() {
            stage.enter(DispatchStage::BuildingRedirect);
            let form = RedirectForm::new(self.endpoint_url(request.mode), &params);
            return Ok(TradeOutcome::Redirect(form));
        }

        stage.enter(DispatchStage::Transmitting);
        let form = params.to_form_body();
        let reply = self
            .transport
            .post_form(GatewayRequest {
                base_url: &self.base_url,
                endpoint: request.mode.endpoint(),
                form: &form,
            })
            .await?;

        stage.enter(DispatchStage::InterpretingResponse);
        let reply = ApiResponse::from_json(&reply.body)?;
        debug!(status = reply.status.as_deref().unwrap_or(""), "gateway reply");
        response::interpret_response(reply, &self.keys).map(TradeOutcome::Fields)
    }

    /// Processes a return/notify callback payload.
    ///
    /// Accepts parsed fields, a JSON value, or JSON text.
    ///
    /// # Errors
    ///
    /// - [`TradeError::Parse`] for malformed JSON
    /// - [`TradeError::Remote`] for an error or missing status
    /// - [`TradeError::Integrity`] / [`TradeError::Decryption`] if the
    ///   envelope does not verify or decrypt
    #[instrument(skip(self, payload), fields(request_id = %Uuid::new_v4()))]
    pub fn result_process(&self, payload: impl Into<CallbackPayload>) -> TradeResult {
        let result = payload
            .into()
            .into_response()
            .and_then(|reply| response::interpret_callback(reply, &self.keys))
            .map(TradeOutcome::Fields);

        if let Err(err) = &result {
            warn!(error_kind = err.kind(), reason = %err, "callback rejected");
        }
        result
    }

    /// Queries several trades one after another.
    ///
    /// Waits `spacing` between consecutive queries. A failed query is
    /// recorded and the batch continues.
    pub async fn batch_query<S: AsRef<str>>(
        &self,
        mer_id: &str,
        trade_nos: &[S],
        spacing: Duration,
    ) -> Vec<BatchQueryResult> {
        let mut results = Vec::with_capacity(trade_nos.len());

        for (index, trade_no) in trade_nos.iter().enumerate() {
            if index > 0 && !spacing.is_zero() {
                tokio::time::sleep(spacing).await;
            }

            let trade_no = trade_no.as_ref();
            let fields = FieldMap::new()
                .with(MER_ID, mer_id)
                .with(TIMESTAMP, unix_timestamp())
                .with(TRADE_NO, trade_no);
            let result = self.trade(TradeRequest::new(fields, TradeMode::TradeQuery)).await;
            results.push(BatchQueryResult { trade_no: trade_no.to_owned(), result });
        }

        results
    }
}

fn unix_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| i64::try_from(elapsed.as_secs()).unwrap_or(i64::MAX))
}
