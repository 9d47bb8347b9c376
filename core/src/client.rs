//! Stateless HTTP request builder and response normalizer.
//!
//! # Design
//! `ApiClient` holds only a `base_url` and carries no mutable state between
//! calls. `build_request` produces an `HttpRequest`; `parse_response` turns an
//! `HttpResponse` into the `ApiResult` envelope. The round-trip in between is
//! somebody else's job (see `transport`), keeping this half deterministic.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::ErrorBody;

/// Success carries the decoded payload, failure the reason. Exactly one side
/// is ever populated.
pub type ApiResult<T> = Result<T, ApiError>;

/// Header attached to every outbound request.
pub const JSON_CONTENT_TYPE: (&str, &str) = ("content-type", "application/json");

/// Synchronous, stateless client for the Mallu API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiClient {
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for an endpoint path relative to the base URL.
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Absolute URL for a path on the server root, i.e. outside the `/api`
    /// prefix the base URL usually carries. `/health` lives there.
    pub fn root_url(&self, path: &str) -> String {
        let root = self.base_url.strip_suffix("/api").unwrap_or(&self.base_url);
        format!("{root}{path}")
    }

    /// Build a request for `path`, serializing `body` to JSON when present.
    pub fn build_request<B>(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&B>,
    ) -> Result<HttpRequest, ApiError>
    where
        B: Serialize + ?Sized,
    {
        let body = body
            .map(|b| serde_json::to_string(b).map_err(|e| ApiError::Serialization(e.to_string())))
            .transpose()?;
        Ok(HttpRequest {
            method,
            url: self.url(path),
            headers: vec![(JSON_CONTENT_TYPE.0.to_string(), JSON_CONTENT_TYPE.1.to_string())],
            body,
        })
    }

    /// Bodiless GET request for `path`.
    pub fn build_get(&self, path: &str) -> HttpRequest {
        self.bodiless(HttpMethod::Get, self.url(path))
    }

    /// Bodiless DELETE request for `path`.
    pub fn build_delete(&self, path: &str) -> HttpRequest {
        self.bodiless(HttpMethod::Delete, self.url(path))
    }

    /// GET request for the server's health probe.
    pub fn build_health(&self) -> HttpRequest {
        self.bodiless(HttpMethod::Get, self.root_url("/health"))
    }

    fn bodiless(&self, method: HttpMethod, url: String) -> HttpRequest {
        HttpRequest {
            method,
            url,
            headers: vec![(JSON_CONTENT_TYPE.0.to_string(), JSON_CONTENT_TYPE.1.to_string())],
            body: None,
        }
    }

    /// Normalize a response into the envelope.
    ///
    /// 2xx bodies are decoded as `T` (an empty body decodes as JSON `null`).
    /// Other statuses become `ApiError::Http` carrying the server's message
    /// when the body has one.
    pub fn parse_response<T: DeserializeOwned>(&self, response: HttpResponse) -> ApiResult<T> {
        if !response.is_success() {
            return Err(ApiError::Http {
                status: response.status,
                message: error_message(&response),
            });
        }
        let body = if response.body.trim().is_empty() {
            "null"
        } else {
            response.body.as_str()
        };
        serde_json::from_str(body).map_err(|e| ApiError::InvalidJson(e.to_string()))
    }
}

/// Pick the most specific message out of an error response: the body's
/// `message`, then its `error`, then a generic one naming the status.
fn error_message(response: &HttpResponse) -> String {
    serde_json::from_str::<ErrorBody>(&response.body)
        .ok()
        .and_then(|body| body.message.or(body.error))
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| format!("Request failed with status {}", response.status))
}
