//! HTTP fetcher implementation
//!
//! This module handles all requests to the analytics API, including:
//! - Building the HTTP client with timeouts and a user agent
//! - Attaching the static token to every call
//! - Unwrapping the `{status, response}` envelope
//! - Retry with backoff via [`RetryPolicy`]
//! - Error classification

use crate::api::{Channel, Endpoint, ForwardsPage, Post};
use crate::config::{ApiConfig, Config};
use crate::crawler::retry::RetryPolicy;
use crate::{ConfigError, CrawlError};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// A single failed attempt against an endpoint
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// Timeout, connection failure, or a body that could not be read
    #[error("transport error on {endpoint}: {message}")]
    Transport { endpoint: Endpoint, message: String },

    /// Any status other than 200
    #[error("HTTP {status} from {endpoint}")]
    HttpStatus { endpoint: Endpoint, status: u16 },

    /// A well-formed response carrying an error envelope or an unusable payload
    #[error("API error from {endpoint}: {message}")]
    Api { endpoint: Endpoint, message: String },
}

/// Coarse classification of a failed call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Transport,
    HttpStatus,
    ApiError,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Transport => "transport",
            Self::HttpStatus => "http-status",
            Self::ApiError => "api-error",
        };
        write!(f, "{}", name)
    }
}

impl FetchError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Transport { .. } => FailureKind::Transport,
            Self::HttpStatus { .. } => FailureKind::HttpStatus,
            Self::Api { .. } => FailureKind::ApiError,
        }
    }
}

/// Result of a call whose retry budget was exhausted
#[derive(Debug, Clone, Error)]
#[error("{error} (after {attempts} attempt(s))")]
pub struct FetchFailure {
    /// The error from the final attempt
    pub error: FetchError,
    /// Number of attempts made
    pub attempts: u32,
}

impl FetchFailure {
    pub fn kind(&self) -> FailureKind {
        self.error.kind()
    }
}

/// Response envelope shared by all endpoints
#[derive(Debug, Deserialize)]
struct Envelope {
    status: Option<String>,
    response: Option<Value>,
    error: Option<String>,
}

impl Envelope {
    fn into_payload(self, endpoint: Endpoint) -> Result<Value, FetchError> {
        match (self.status.as_deref(), self.response) {
            (Some("ok"), Some(payload)) => Ok(payload),
            (status, _) => Err(FetchError::Api {
                endpoint,
                message: self
                    .error
                    .unwrap_or_else(|| format!("status {:?} without a response", status)),
            }),
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `request_timeout` - Total time allowed per request
/// * `connect_timeout` - Time allowed to establish a connection
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(
    request_timeout: Duration,
    connect_timeout: Duration,
) -> Result<Client, reqwest::Error> {
    let user_agent = format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    Client::builder()
        .user_agent(user_agent)
        .timeout(request_timeout)
        .connect_timeout(connect_timeout)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Client for the three API endpoints
///
/// Cloning is cheap and clones share one connection pool, so a single client
/// can serve concurrent calls.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    token: String,
    retry: RetryPolicy,
}

impl ApiClient {
    /// Creates a client from the loaded configuration
    pub fn from_config(config: &Config) -> Result<Self, CrawlError> {
        let client = build_http_client(
            config.api.request_timeout(),
            config.api.connect_timeout(),
        )?;
        Self::with_client(
            client,
            &config.api,
            RetryPolicy::from_config(&config.retry),
        )
    }

    /// Creates a client around an existing `reqwest::Client`
    pub fn with_client(
        client: Client,
        api: &ApiConfig,
        retry: RetryPolicy,
    ) -> Result<Self, CrawlError> {
        let mut base = api.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            token: api.token.clone(),
            retry,
        })
    }

    fn endpoint_url(&self, endpoint: Endpoint) -> Result<Url, FetchError> {
        self.base_url
            .join(endpoint.path())
            .map_err(|e| FetchError::Transport {
                endpoint,
                message: format!("invalid endpoint URL: {}", e),
            })
    }

    /// Calls an endpoint with retry and decodes its payload
    ///
    /// Exhausting the retry budget yields a [`FetchFailure`]; callers decide
    /// whether to skip the unit of work.
    pub async fn fetch<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        params: &[(&str, String)],
    ) -> Result<T, FetchFailure> {
        self.retry
            .run(endpoint.path(), || self.attempt(endpoint, params))
            .await
    }

    /// Makes exactly one request and classifies its outcome
    async fn attempt<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        params: &[(&str, String)],
    ) -> Result<T, FetchError> {
        let url = self.endpoint_url(endpoint)?;

        let response = self
            .client
            .get(url)
            .query(&[("token", self.token.as_str())])
            .query(params)
            .send()
            .await
            .map_err(|e| FetchError::Transport {
                endpoint,
                message: describe_transport_error(&e),
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::HttpStatus {
                endpoint,
                status: status.as_u16(),
            });
        }

        let envelope: Envelope = response.json().await.map_err(|e| {
            if e.is_decode() {
                FetchError::Api {
                    endpoint,
                    message: format!("malformed JSON body: {}", e),
                }
            } else {
                FetchError::Transport {
                    endpoint,
                    message: describe_transport_error(&e),
                }
            }
        })?;

        let payload = envelope.into_payload(endpoint)?;
        serde_json::from_value(payload).map_err(|e| FetchError::Api {
            endpoint,
            message: format!("unexpected payload shape: {}", e),
        })
    }

    /// Looks up a channel's metadata by username
    pub async fn get_channel(&self, username: &str) -> Result<Channel, FetchFailure> {
        self.fetch(Endpoint::ChannelGet, &[("channelId", username.to_string())])
            .await
    }

    /// Requests one page of a channel's forward events
    pub async fn get_forwards(
        &self,
        username: &str,
        offset: u32,
        limit: u32,
    ) -> Result<ForwardsPage, FetchFailure> {
        self.fetch(
            Endpoint::ChannelForwards,
            &[
                ("channelId", username.to_string()),
                ("limit", limit.to_string()),
                ("offset", offset.to_string()),
                ("extended", "1".to_string()),
            ],
        )
        .await
    }

    /// Looks up a single post by id
    pub async fn get_post(&self, post_id: &Value) -> Result<Post, FetchFailure> {
        self.fetch(Endpoint::PostGet, &[("postId", id_param(post_id))])
            .await
    }
}

/// Renders an id that may arrive as a JSON string or number
fn id_param(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn describe_transport_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "request timeout".to_string()
    } else if e.is_connect() {
        format!("connection failed: {}", e)
    } else {
        e.to_string()
    }
}
