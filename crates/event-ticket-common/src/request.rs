//! Stateless request building and response wrapping.
//!
//! Drupal Services endpoints live at plain relative paths beneath a base
//! endpoint URL (`https://example.com/api/` + `event-ticket/ABC123`). Every
//! call asks for JSON; calls with a body send JSON.

use bytes::Bytes;
use http::{HeaderName, HeaderValue, Method, Request, StatusCode, header};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::{DecodeError, EncodeError, HttpError, RequestError, TransportError};

/// Per-request options for Drupal Services calls.
#[derive(Debug, Default, Clone)]
pub struct RequestOptions {
    /// Pre-encoded query string (without the leading `?`).
    pub query: Option<String>,
    /// JSON body.
    pub body: Option<serde_json::Value>,
    /// Extra headers to attach to this request.
    pub headers: Vec<(HeaderName, HeaderValue)>,
}

impl RequestOptions {
    /// Empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode `params` as the query string.
    pub fn query<Q: Serialize + ?Sized>(mut self, params: &Q) -> Result<Self, EncodeError> {
        let qs = serde_html_form::to_string(params)?;
        self.query = if qs.is_empty() { None } else { Some(qs) };
        Ok(self)
    }

    /// Serialize `body` as the JSON request body.
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, EncodeError> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Add an extra header.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.push((name, value));
        self
    }
}

/// Normalise an endpoint URL so relative paths resolve beneath it.
///
/// `https://example.com/api` and `https://example.com/api/` both become the
/// latter; without the trailing slash `Url::join` would replace `api`.
pub fn normalize_endpoint(mut endpoint: Url) -> Url {
    if !endpoint.path().ends_with('/') {
        let path = format!("{}/", endpoint.path());
        endpoint.set_path(&path);
    }
    endpoint.set_query(None);
    endpoint.set_fragment(None);
    endpoint
}

/// Resolve a relative API path against the endpoint.
pub fn resolve_path(endpoint: &Url, path: &str) -> Result<Url, RequestError> {
    let base = normalize_endpoint(endpoint.clone());
    base.join(path.trim_start_matches('/'))
        .map_err(|e| RequestError::InvalidPath(format!("{path}: {e}")))
}

/// Build an HTTP request for a Drupal Services call given base URL and options
#[cfg_attr(feature = "tracing", tracing::instrument(level = "trace", skip(endpoint, opts)))]
pub fn build_http_request(
    endpoint: &Url,
    method: Method,
    path: &str,
    opts: &RequestOptions,
) -> Result<Request<Vec<u8>>, crate::error::ClientError> {
    let mut url = resolve_path(endpoint, path)?;
    url.set_query(opts.query.as_deref());

    let mut builder = Request::builder()
        .method(method)
        .uri(url.as_str())
        .header(header::ACCEPT, "application/json");

    let body = match &opts.body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            serde_json::to_vec(value).map_err(EncodeError::from)?
        }
        None => vec![],
    };

    for (name, value) in &opts.headers {
        builder = builder.header(name, value);
    }

    builder
        .body(body)
        .map_err(|e| TransportError::InvalidRequest(e.to_string()).into())
}

/// Response wrapper that owns the response buffer
#[derive(Debug, Clone)]
pub struct Response {
    buffer: Bytes,
    status: StatusCode,
}

impl Response {
    /// Create a new response from a buffer and status code
    pub fn new(buffer: Bytes, status: StatusCode) -> Self {
        Self { buffer, status }
    }

    /// Get the HTTP status code
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, DecodeError> {
        Ok(serde_json::from_slice(&self.buffer)?)
    }

    /// Turn this response into an [`HttpError`] carrying its status and body.
    pub fn into_http_error(self) -> HttpError {
        HttpError {
            status: self.status,
            body: Some(self.buffer),
        }
    }
}

impl From<http::Response<Vec<u8>>> for Response {
    fn from(response: http::Response<Vec<u8>>) -> Self {
        let status = response.status();
        Self::new(Bytes::from(response.into_body()), status)
    }
}
