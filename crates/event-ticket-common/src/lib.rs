//! Common plumbing for the event-ticket client crates.
//!
//! This crate holds the parts of the client that know nothing about tickets:
//! a minimal [`HttpClient`](http_client::HttpClient) abstraction, the error
//! taxonomy shared by every call, and stateless helpers for turning a
//! relative API path plus [`RequestOptions`](request::RequestOptions) into a
//! raw `http::Request`.

#![warn(missing_docs)]
pub use smol_str;
pub use url;

pub mod error;
/// HTTP client abstraction used by event-ticket crates.
pub mod http_client;
pub mod request;

pub use error::{ClientError, Result};
pub use request::{RequestOptions, Response};
