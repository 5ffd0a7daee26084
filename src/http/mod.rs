//! Shared HTTP client with credential and session-expiry interceptors.
//!
//! Every request goes through [`HttpClient::send`]:
//!
//! ```text
//! request  → attach `token` header from the session (never rejects)
//!          → reqwest (30s timeout, cookie store)
//! response → non-2xx / network / timeout → Err(TransportError), unchanged
//!          → envelope code 401 → clear session, publish SessionInvalidated,
//!            then hand the response back to the caller anyway
//! ```
//!
//! This module knows nothing about routing; the redirect to the login page
//! happens in whoever listens for `SessionInvalidated` on the bus.

pub mod adorn;

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::bus::{BusEvent, SharedBus};
use crate::config::Config;
use crate::session::SharedSession;

pub use adorn::{adorn_data, adorn_params, ContentType};

/// Envelope code the backend uses for an expired or invalid credential
pub const UNAUTHENTICATED_CODE: i64 = 401;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("unexpected response body from {url}: {message}")]
    Decode { url: String, message: String },
}

/// Decoded response: HTTP status plus the JSON envelope
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub url: String,
    pub status: u16,
    /// Parsed JSON body; non-JSON bodies are kept as a string, empty as null
    pub data: Value,
}

impl ApiResponse {
    /// Envelope `code` field, when the body carries one
    pub fn code(&self) -> Option<i64> {
        self.data.get("code").and_then(Value::as_i64)
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, TransportError> {
        serde_json::from_value(self.data.clone()).map_err(|e| TransportError::Decode {
            url: self.url.clone(),
            message: e.to_string(),
        })
    }
}

/// What the inbound interceptor concluded about the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionSignal {
    Valid,
    Invalidated,
}

/// Inbound interceptor decision, free of side effects
pub fn inspect_response(response: &ApiResponse) -> SessionSignal {
    if response.code() == Some(UNAUTHENTICATED_CODE) {
        SessionSignal::Invalidated
    } else {
        SessionSignal::Valid
    }
}

/// A request before interceptors run
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub query: Option<Value>,
    pub body: Option<(String, ContentType)>,
}

impl ApiRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
            query: None,
            body: None,
        }
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self {
            method: Method::POST,
            url: url.into(),
            query: None,
            body: None,
        }
    }

    pub fn query(mut self, params: Value) -> Self {
        self.query = Some(params);
        self
    }

    pub fn body(mut self, body: String, content_type: ContentType) -> Self {
        self.body = Some((body, content_type));
        self
    }
}

/// The one HTTP client instance the console shares
#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    config: Config,
    session: SharedSession,
    bus: SharedBus,
}

impl HttpClient {
    pub fn new(config: Config, session: SharedSession, bus: SharedBus) -> Result<Self, TransportError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(ContentType::Json.mime()));

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .cookie_store(true)
            .default_headers(headers)
            .build()
            .map_err(TransportError::Client)?;

        Ok(Self {
            client,
            config,
            session,
            bus,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn session(&self) -> &SharedSession {
        &self.session
    }

    /// Full URL for an API action (see [`adorn::adorn_url`])
    pub fn adorn_url(&self, action: &str) -> String {
        adorn::adorn_url(&self.config, action)
    }

    /// GET an action with cache-busted query params
    pub async fn get(&self, action: &str, params: Value) -> Result<ApiResponse, TransportError> {
        let request = ApiRequest::get(self.adorn_url(action)).query(adorn_params(params, true));
        self.send(request).await
    }

    /// POST an action with a JSON body
    pub async fn post_json(&self, action: &str, data: Value) -> Result<ApiResponse, TransportError> {
        let body = adorn_data(data, true, ContentType::Json);
        let request = ApiRequest::post(self.adorn_url(action)).body(body, ContentType::Json);
        self.send(request).await
    }

    /// POST an action with a form-encoded body
    pub async fn post_form(&self, action: &str, data: Value) -> Result<ApiResponse, TransportError> {
        let body = adorn_data(data, true, ContentType::Form);
        let request = ApiRequest::post(self.adorn_url(action)).body(body, ContentType::Form);
        self.send(request).await
    }

    /// Run a request through both interceptors
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let url = request.url.clone();
        let mut builder = self.client.request(request.method.clone(), &request.url);
        if let Some(query) = &request.query {
            builder = builder.query(&query_pairs(query));
        }
        if let Some((body, content_type)) = request.body {
            builder = builder.header(CONTENT_TYPE, content_type.mime()).body(body);
        }
        let builder = self.attach_credential(builder).await;

        debug!("{} {}", request.method, url);
        let response = builder.send().await.map_err(|e| classify_error(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| classify_error(&url, e))?;
        let data = decode_body(&bytes);

        let response = ApiResponse {
            url,
            status: status.as_u16(),
            data,
        };
        self.after_response(&response).await;
        Ok(response)
    }

    /// Outbound interceptor: copy the credential into the request header
    async fn attach_credential(&self, builder: RequestBuilder) -> RequestBuilder {
        let Some(token) = self.session.token().await else {
            return builder;
        };
        match HeaderValue::from_str(&token) {
            Ok(value) => builder.header(self.config.token_header.as_str(), value),
            Err(_) => {
                warn!("Session token is not a valid header value, sending without it");
                builder
            }
        }
    }

    /// Inbound interceptor: on 401 clear the session and announce it.
    /// The event is published before the caller gets the response.
    async fn after_response(&self, response: &ApiResponse) {
        if inspect_response(response) == SessionSignal::Invalidated {
            warn!("Session rejected by server ({}), clearing login info", response.url);
            self.session.clear_login_info().await;
            self.bus.publish(BusEvent::SessionInvalidated {
                url: response.url.clone(),
            });
        }
    }
}

fn classify_error(url: &str, error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout {
            url: url.to_string(),
        }
    } else {
        TransportError::Network {
            url: url.to_string(),
            source: error,
        }
    }
}

fn decode_body(bytes: &[u8]) -> Value {
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

/// Flatten a params object into query pairs (nested values as JSON text)
fn query_pairs(params: &Value) -> Vec<(String, String)> {
    let Value::Object(map) = params else {
        return Vec::new();
    };
    map.iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (key.clone(), value)
        })
        .collect()
}
