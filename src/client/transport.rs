//! HTTP transport seam
//!
//! The client never talks to reqwest directly. It hands a URL (and a JSON body
//! for POSTs) to a [`Transport`] and gets back the status line and the body
//! read once as text. Tests swap in a scripted transport; production uses
//! [`HttpTransport`].

use async_trait::async_trait;
use reqwest::{Client, StatusCode, header};
use std::sync::Arc;
use thiserror::Error;
use url::Url;

/// A fully read HTTP response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    /// Canonical reason phrase ("Internal Server Error"), empty when unknown
    pub status_text: String,
    pub body: String,
}

impl HttpResponse {
    /// Build a response, filling in the canonical reason phrase for `status`
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        let status_text = StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or_default()
            .to_string();

        Self {
            status,
            status_text,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The request never produced a response (DNS, connect, TLS, body read)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        TransportError(err.to_string())
    }
}

/// Minimal HTTP surface the API client needs
#[async_trait]
pub trait Transport: Send + Sync {
    /// GET `url`
    async fn get(&self, url: Url) -> Result<HttpResponse, TransportError>;

    /// POST `body` to `url` with `Content-Type: application/json`
    async fn post_json(&self, url: Url, body: String) -> Result<HttpResponse, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn get(&self, url: Url) -> Result<HttpResponse, TransportError> {
        (**self).get(url).await
    }

    async fn post_json(&self, url: Url, body: String) -> Result<HttpResponse, TransportError> {
        (**self).post_json(url, body).await
    }
}

/// reqwest-backed transport
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a preconfigured reqwest client (proxies, custom TLS roots, ...)
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: Url) -> Result<HttpResponse, TransportError> {
        let response = self.client.get(url).send().await?;
        read_response(response).await
    }

    async fn post_json(&self, url: Url, body: String) -> Result<HttpResponse, TransportError> {
        let response = self
            .client
            .post(url)
            .header(header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;
        read_response(response).await
    }
}

async fn read_response(response: reqwest::Response) -> Result<HttpResponse, TransportError> {
    let status = response.status();
    let body = response.text().await?;

    Ok(HttpResponse {
        status: status.as_u16(),
        status_text: status.canonical_reason().unwrap_or_default().to_string(),
        body,
    })
}
