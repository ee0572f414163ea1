//! HTTP client for the drafting agent backend.
//!
//! [`Backend`] owns the reqwest client and the four wire operations the core
//! needs: starting a run, subscribing to its event stream, best-effort run
//! cancellation, and document transformation. Configuration is passed in
//! explicitly at construction; nothing is read from ambient global state.

use std::pin::Pin;
use std::time::Duration;

use futures::Stream;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, Response, header};
use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::observability::{CLIENT_CANCEL_NOTIFICATIONS, CLIENT_REQUEST_ERRORS, CLIENT_REQUESTS};
use crate::sse::{RawEvent, decode_event_stream};
use crate::types::{StartRunRequest, StartRunResponse, TransformRequest, TransformResponse};

const DEFAULT_BASE_URL: &str = "http://localhost:8000";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Configuration for the backend client.
///
/// Built explicitly and handed to [`Backend::new`]; the base URL and API key
/// are never sourced from globals inside the library.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Base URL of the agent backend, without a trailing slash.
    pub base_url: String,

    /// Optional API key sent as `x-api-key` on every request.
    pub api_key: Option<String>,

    /// Per-request timeout. Streaming reads are exempt; a run's stream stays
    /// open until the backend closes it or the caller cancels.
    pub timeout: Duration,
}

impl BackendConfig {
    /// Creates a configuration pointing at the default local backend.
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Sets the backend base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Sets the API key.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Client for the drafting agent backend.
#[derive(Debug, Clone)]
pub struct Backend {
    config: BackendConfig,
    client: ReqwestClient,
}

impl Backend {
    /// Creates a new backend client from an explicit configuration.
    pub fn new(config: BackendConfig) -> Result<Self> {
        let client = ReqwestClient::builder()
            .connect_timeout(config.timeout)
            .build()
            .map_err(|e| {
                Error::http_client(
                    format!("failed to build HTTP client: {e}"),
                    Some(Box::new(e)),
                )
            })?;

        Ok(Self { config, client })
    }

    /// The configured base URL.
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Create and return default headers for backend requests.
    fn default_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(api_key) = &self.config.api_key {
            let value = HeaderValue::from_str(api_key)
                .map_err(|_| Error::authentication("API key contains invalid header characters"))?;
            headers.insert("x-api-key", value);
        }
        Ok(headers)
    }

    /// Process backend error responses and convert to our Error type
    async fn process_error_response(response: Response) -> Error {
        let status_code = response.status().as_u16();

        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|val| val.to_str().ok())
            .and_then(|val| val.parse::<u64>().ok());

        #[derive(Deserialize)]
        struct ErrorBody {
            error: Option<String>,
            message: Option<String>,
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return Error::http_client(
                    format!("failed to read error response: {e}"),
                    Some(Box::new(e)),
                );
            }
        };

        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|parsed| parsed.error.or(parsed.message))
            .unwrap_or(body);

        status_error(status_code, message, retry_after)
    }

    fn map_request_error(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::timeout(
                format!("request timed out: {e}"),
                Some(self.config.timeout.as_secs_f64()),
            )
        } else if e.is_connect() {
            Error::connection(format!("connection error: {e}"), Some(Box::new(e)))
        } else {
            Error::http_client(format!("request failed: {e}"), Some(Box::new(e)))
        }
    }

    /// Start a run for a user message.
    ///
    /// Returns the backend-assigned run id along with the session id to carry
    /// on subsequent requests.
    pub async fn start_run(&self, request: &StartRunRequest) -> Result<StartRunResponse> {
        let url = format!("{}/v1/runs", self.config.base_url);
        CLIENT_REQUESTS.click();

        let response = self
            .client
            .post(&url)
            .timeout(self.config.timeout)
            .headers(self.default_headers()?)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                CLIENT_REQUEST_ERRORS.click();
                self.map_request_error(e)
            })?;

        if !response.status().is_success() {
            CLIENT_REQUEST_ERRORS.click();
            return Err(Self::process_error_response(response).await);
        }

        response.json::<StartRunResponse>().await.map_err(|e| {
            Error::serialization(
                format!("failed to parse start-run response: {e}"),
                Some(Box::new(e)),
            )
        })
    }

    /// Subscribe to a run's event stream.
    ///
    /// The returned stream is tied to this one HTTP response body; it ends
    /// when the backend closes the connection or sends the `{}` sentinel.
    pub async fn open_events(
        &self,
        run_id: &str,
    ) -> Result<Pin<Box<dyn Stream<Item = Result<RawEvent>> + Send>>> {
        let url = format!("{}/v1/runs/{run_id}/events", self.config.base_url);
        CLIENT_REQUESTS.click();

        let mut headers = self.default_headers()?;
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("text/event-stream"),
        );

        // No per-request timeout here: a legitimate run can stream for much
        // longer than any sane request deadline.
        let response = self
            .client
            .get(&url)
            .headers(headers)
            .send()
            .await
            .map_err(|e| {
                CLIENT_REQUEST_ERRORS.click();
                self.map_request_error(e)
            })?;

        if !response.status().is_success() {
            CLIENT_REQUEST_ERRORS.click();
            return Err(Self::process_error_response(response).await);
        }

        Ok(Box::pin(decode_event_stream(response.bytes_stream())))
    }

    /// Notify the backend that a run is cancelled.
    ///
    /// Best-effort: callers proceed with local cleanup whether or not this
    /// call succeeds.
    pub async fn cancel_run(&self, run_id: &str) -> Result<()> {
        let url = format!("{}/v1/runs/{run_id}/cancel", self.config.base_url);
        CLIENT_CANCEL_NOTIFICATIONS.click();

        let response = self
            .client
            .post(&url)
            .timeout(self.config.timeout)
            .headers(self.default_headers()?)
            .send()
            .await
            .map_err(|e| self.map_request_error(e))?;

        if !response.status().is_success() {
            return Err(Self::process_error_response(response).await);
        }

        debug!(run_id, "backend acknowledged run cancellation");
        Ok(())
    }

    /// Request a document transformation plan.
    pub async fn transform_document(
        &self,
        request: &TransformRequest,
    ) -> Result<TransformResponse> {
        let url = format!("{}/v1/transform", self.config.base_url);
        CLIENT_REQUESTS.click();

        let response = self
            .client
            .post(&url)
            .timeout(self.config.timeout)
            .headers(self.default_headers()?)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                CLIENT_REQUEST_ERRORS.click();
                self.map_request_error(e)
            })?;

        if !response.status().is_success() {
            CLIENT_REQUEST_ERRORS.click();
            return Err(Self::process_error_response(response).await);
        }

        response.json::<TransformResponse>().await.map_err(|e| {
            Error::serialization(
                format!("failed to parse transform response: {e}"),
                Some(Box::new(e)),
            )
        })
    }

    /// Check if the backend is healthy and reachable.
    pub async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/v1/health", self.config.base_url);

        let response = self
            .client
            .get(&url)
            .timeout(self.config.timeout)
            .send()
            .await
            .map_err(|e| self.map_request_error(e))?;

        Ok(response.status().is_success())
    }
}

/// Map an HTTP status code to the error taxonomy.
fn status_error(status_code: u16, message: String, retry_after: Option<u64>) -> Error {
    match status_code {
        400 => Error::bad_request(message, None),
        401 | 403 => Error::authentication(message),
        408 => Error::timeout(message, None),
        429 => Error::rate_limit(message, retry_after),
        500 => Error::internal_server(message),
        502..=504 => Error::service_unavailable(message, retry_after),
        _ => Error::api(status_code, message),
    }
}
