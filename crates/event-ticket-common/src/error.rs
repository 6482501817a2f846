//! Error types for Drupal Services client operations
//!
//! Every failure falls into one of three kinds:
//! - [`RequestError`]: a caller-side precondition failed. These are always
//!   detected locally, before any network round trip.
//! - [`ResponseError`]: the round trip completed but the server answered with
//!   a status the endpoint does not document as success, or the body could
//!   not be decoded.
//! - [`TransportError`]: the round trip itself failed.

use bytes::Bytes;
use http::StatusCode;

/// Client error type wrapping all possible error conditions
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum ClientError {
    /// HTTP transport error
    #[error("HTTP transport error: {0}")]
    Transport(
        #[from]
        #[diagnostic_source]
        TransportError,
    ),

    /// Precondition violated before any request was sent
    #[error("Bad request: {0}")]
    Request(
        #[from]
        #[diagnostic_source]
        RequestError,
    ),

    /// Unexpected or undecodable response
    #[error("{0}")]
    Response(
        #[from]
        #[diagnostic_source]
        ResponseError,
    ),
}

impl ClientError {
    /// Whether this error was raised locally without a network call.
    pub fn is_request(&self) -> bool {
        matches!(self, Self::Request(_))
    }

    /// Whether the server answered with something unexpected.
    pub fn is_response(&self) -> bool {
        matches!(self, Self::Response(_))
    }

    /// Whether the network round trip failed.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// The offending HTTP status, if the server answered at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Response(e) => e.status(),
            _ => None,
        }
    }
}

impl From<DecodeError> for ClientError {
    fn from(e: DecodeError) -> Self {
        Self::Response(ResponseError::Decode(e))
    }
}

impl From<EncodeError> for ClientError {
    fn from(e: EncodeError) -> Self {
        Self::Request(RequestError::Encode(e))
    }
}

/// Transport-level errors that occur during HTTP communication
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum TransportError {
    /// Failed to establish connection to server
    #[error("Connection error: {0}")]
    #[diagnostic(code(event_ticket::transport::connect))]
    Connect(String),

    /// Request timed out
    #[error("Request timeout")]
    #[diagnostic(code(event_ticket::transport::timeout))]
    Timeout,

    /// Request construction failed (malformed URI, headers, etc.)
    #[error("Invalid request: {0}")]
    #[diagnostic(code(event_ticket::transport::invalid_request))]
    InvalidRequest(String),

    /// Other transport error
    #[error("Transport error: {0}")]
    #[diagnostic(code(event_ticket::transport::other))]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

#[cfg(feature = "reqwest-client")]
impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_connect() {
            Self::Connect(e.to_string())
        } else if e.is_builder() || e.is_request() {
            Self::InvalidRequest(e.to_string())
        } else {
            Self::Other(Box::new(e))
        }
    }
}

impl From<std::io::Error> for TransportError {
    fn from(e: std::io::Error) -> Self {
        use std::io::ErrorKind;
        match e.kind() {
            ErrorKind::TimedOut => Self::Timeout,
            ErrorKind::ConnectionRefused
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::NotConnected
            | ErrorKind::AddrNotAvailable => Self::Connect(e.to_string()),
            _ => Self::Other(Box::new(e)),
        }
    }
}

/// Caller-side precondition failures
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum RequestError {
    /// Barcode does not match the accepted format
    #[error("invalid barcode: {0:?}")]
    #[diagnostic(
        code(event_ticket::request::invalid_barcode),
        help("barcodes are 6 to 12 letters or digits")
    )]
    InvalidBarcode(String),

    /// Operation needs an active session
    #[error("not authenticated")]
    #[diagnostic(
        code(event_ticket::request::not_authenticated),
        help("call login() first")
    )]
    NotAuthenticated,

    /// Batch validation called with no barcodes
    #[error("no tickets given")]
    #[diagnostic(code(event_ticket::request::empty_batch))]
    EmptyBatch,

    /// Batch validation called with more barcodes than the API accepts
    #[error("too many tickets: {count} given, at most {max} allowed")]
    #[diagnostic(code(event_ticket::request::batch_too_large))]
    BatchTooLarge {
        /// Number of barcodes given
        count: usize,
        /// API limit
        max: usize,
    },

    /// Endpoint URL could not be parsed
    #[error("invalid endpoint URL {url:?}: {reason}")]
    #[diagnostic(code(event_ticket::request::invalid_endpoint))]
    InvalidEndpoint {
        /// The string given as endpoint
        url: String,
        /// Parser message
        reason: String,
    },

    /// Path could not be resolved against the endpoint URL
    #[error("invalid path: {0}")]
    #[diagnostic(code(event_ticket::request::invalid_path))]
    InvalidPath(String),

    /// Query or body serialization failed
    #[error("{0}")]
    Encode(
        #[from]
        #[diagnostic_source]
        EncodeError,
    ),
}

/// Error type for encoding requests
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum EncodeError {
    /// Failed to serialize query parameters
    #[error("Failed to serialize query: {0}")]
    Query(
        #[from]
        #[source]
        serde_html_form::ser::Error,
    ),
    /// Failed to serialize JSON body
    #[error("Failed to serialize JSON: {0}")]
    Json(
        #[from]
        #[source]
        serde_json::Error,
    ),
}

/// The server answered, but not the way the endpoint documents
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum ResponseError {
    /// Login endpoint rejected the credentials
    #[error("authentication failed: {0}")]
    #[diagnostic(code(event_ticket::response::login_failed))]
    LoginFailed(HttpError),

    /// Logout endpoint did not answer 200
    #[error("failed to log out: {0}")]
    #[diagnostic(code(event_ticket::response::logout_failed))]
    LogoutFailed(HttpError),

    /// Token endpoint did not answer 200
    #[error("failed to get CSRF token: {0}")]
    #[diagnostic(code(event_ticket::response::csrf_token))]
    CsrfToken(HttpError),

    /// Server issued a CSRF token that cannot be sent back as a header
    #[error("server returned an unusable CSRF token: {0}")]
    #[diagnostic(code(event_ticket::response::invalid_token))]
    InvalidToken(String),

    /// Any other endpoint answered with an undocumented status
    #[error("{operation}: unexpected response {error}")]
    #[diagnostic(code(event_ticket::response::unexpected_status))]
    UnexpectedStatus {
        /// Which client operation was running
        operation: &'static str,
        /// The status and body received
        error: HttpError,
    },

    /// Body could not be decoded into the expected shape
    #[error("{0}")]
    Decode(
        #[from]
        #[diagnostic_source]
        DecodeError,
    ),
}

impl ResponseError {
    /// The HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::LoginFailed(e) | Self::LogoutFailed(e) | Self::CsrfToken(e) => Some(e.status),
            Self::UnexpectedStatus { error, .. } => Some(error.status),
            Self::InvalidToken(_) | Self::Decode(_) => None,
        }
    }
}

/// Response deserialization errors
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum DecodeError {
    /// JSON deserialization failed
    #[error("Failed to deserialize JSON: {0}")]
    Json(
        #[from]
        #[source]
        serde_json::Error,
    ),
}

/// HTTP error response (status outside of what the endpoint documents)
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub struct HttpError {
    /// HTTP status code
    pub status: StatusCode,
    /// Response body if available
    pub body: Option<Bytes>,
}

impl std::fmt::Display for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "HTTP {}", self.status)?;
        if let Some(body) = &self.body {
            if let Ok(s) = std::str::from_utf8(body) {
                if !s.is_empty() {
                    write!(f, ":\n{}", s)?;
                }
            }
        }
        Ok(())
    }
}

/// Result type for client operations
pub type Result<T> = std::result::Result<T, ClientError>;
