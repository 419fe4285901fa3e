//! RoastMyStartup HTTP API Client
//!
//! Typed client for the three service endpoints:
//! - `GET /health` - cold-start readiness
//! - `POST /roast` - generate a roast
//! - `GET /stats` - aggregate counts
//!
//! Every call is a single attempt. There is no retry, timeout or caching here;
//! callers own that policy.

use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;
use url::Url;

use super::transport::{HttpResponse, HttpTransport, Transport, TransportError};
use super::types::*;

/// Deployed service origin
pub const DEFAULT_BASE_URL: &str = "https://roast-my-startup-api.onrender.com";

/// Errors that can occur when calling the roast API
#[derive(Debug, Error)]
pub enum RoastError {
    #[error("Request failed: {status} {status_text}. {body}")]
    RequestFailed {
        status: u16,
        status_text: String,
        body: String,
    },

    #[error("Malformed response: {source}")]
    MalformedResponse {
        source: serde_json::Error,
        body: String,
    },

    #[error("Request failed: {0}")]
    Transport(#[from] TransportError),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Unsupported URL scheme '{0}' (expected http or https)")]
    UnsupportedScheme(String),

    #[error("Failed to encode request: {0}")]
    Encode(serde_json::Error),
}

/// Coarse classification of a [`RoastError`]
///
/// Transport failures are reported as `RequestFailed`: from the caller's point
/// of view the request did not succeed and may be resubmitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    RequestFailed,
    MalformedResponse,
    InvalidUrl,
    Encode,
}

impl RoastError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RoastError::RequestFailed { .. } | RoastError::Transport(_) => ErrorKind::RequestFailed,
            RoastError::MalformedResponse { .. } => ErrorKind::MalformedResponse,
            RoastError::InvalidUrl(_) | RoastError::UnsupportedScheme(_) => ErrorKind::InvalidUrl,
            RoastError::Encode(_) => ErrorKind::Encode,
        }
    }

    /// HTTP status, when the service answered
    pub fn status(&self) -> Option<u16> {
        match self {
            RoastError::RequestFailed { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type for roast API operations
pub type RoastResult<T> = Result<T, RoastError>;

/// Client for the roast service
///
/// # Example
/// ```no_run
/// use roaster::client::{RoastClient, RoastLevel, RoastRequest};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = RoastClient::new("http://localhost:8000")?;
/// let request = RoastRequest::new(
///     "PetRock 2.0",
///     "AI-powered rocks that provide emotional support",
///     "Millennials who want pets",
///     "$50k",
///     RoastLevel::Medium,
/// );
/// let roast = client.roast(&request).await?;
/// println!("{}", roast.brutal_roast);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct RoastClient<T = HttpTransport> {
    /// Service origin, always with a trailing slash
    base_url: Url,
    transport: T,
}

impl RoastClient<HttpTransport> {
    /// Create a client backed by a default reqwest client
    pub fn new(base_url: &str) -> RoastResult<Self> {
        Self::with_transport(base_url, HttpTransport::new())
    }
}

impl<T: Transport> RoastClient<T> {
    /// Create a client over a custom transport
    pub fn with_transport(base_url: &str, transport: T) -> RoastResult<Self> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            transport,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Probe service health
    ///
    /// Endpoint: GET /health
    pub async fn health(&self) -> RoastResult<HealthStatus> {
        let url = self.base_url.join("health")?;
        let response = self.transport.get(url).await?;
        decode_response(response)
    }

    /// Generate a roast for `request`
    ///
    /// Endpoint: POST /roast
    pub async fn roast(&self, request: &RoastRequest) -> RoastResult<RoastResponse> {
        generate_roast(&self.transport, &self.base_url, request).await
    }

    /// Fetch aggregate roast counts
    ///
    /// Endpoint: GET /stats
    pub async fn stats(&self) -> RoastResult<RoastStats> {
        let url = self.base_url.join("stats")?;
        let response = self.transport.get(url).await?;
        decode_response(response)
    }
}

/// Submit one roast request over `transport`
///
/// This is the whole request/response contract: encode, POST once, decode.
pub async fn generate_roast<T: Transport + ?Sized>(
    transport: &T,
    base_url: &Url,
    request: &RoastRequest,
) -> RoastResult<RoastResponse> {
    let url = base_url.join("roast")?;
    let body = serde_json::to_string(request).map_err(RoastError::Encode)?;

    debug!(
        url = %url,
        startup = %request.startup_name,
        level = %request.roast_level,
        "Submitting roast request"
    );

    let response = transport.post_json(url, body).await?;
    decode_response(response)
}

/// Turn a captured response into a typed value
///
/// Non-2xx becomes `RequestFailed` carrying the raw body; a 2xx body that does
/// not parse becomes `MalformedResponse`.
pub fn decode_response<R: DeserializeOwned>(response: HttpResponse) -> RoastResult<R> {
    if !response.is_success() {
        return Err(RoastError::RequestFailed {
            status: response.status,
            status_text: response.status_text,
            body: response.body,
        });
    }

    match serde_json::from_str(&response.body) {
        Ok(value) => Ok(value),
        Err(source) => Err(RoastError::MalformedResponse {
            source,
            body: response.body,
        }),
    }
}

fn parse_base_url(base_url: &str) -> RoastResult<Url> {
    let mut url = Url::parse(base_url.trim())?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(RoastError::UnsupportedScheme(url.scheme().to_string()));
    }

    // `join` replaces the last path segment unless the base ends in '/'
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}
