//! Client configuration.
//!
//! Drupal Services deployments differ in the field names their login
//! resource expects and where its user resources live. [`LoginContract`]
//! captures those request-shaping details so one client type serves every
//! deployment.

use std::time::Duration;

use bon::Builder;
use event_ticket_common::error::{ClientError, RequestError};
use event_ticket_common::request::normalize_endpoint;
use http::HeaderName;
use smol_str::SmolStr;
use url::Url;

/// Default header carrying the CSRF token on mutating requests.
pub const CSRF_HEADER: &str = "x-csrf-token";

/// How a deployment expects login, logout and token requests to look.
#[derive(Debug, Clone, PartialEq, Eq, Builder)]
#[builder(start_fn = new)]
pub struct LoginContract {
    /// Body field carrying the username.
    #[builder(into)]
    pub username_field: SmolStr,
    /// Body field carrying the password.
    #[builder(into)]
    pub password_field: SmolStr,
    /// Header carrying the CSRF token.
    pub csrf_header: HeaderName,
    /// Login resource path.
    #[builder(into, default = SmolStr::new_static("user/login"))]
    pub login_path: SmolStr,
    /// Logout resource path.
    #[builder(into, default = SmolStr::new_static("user/logout"))]
    pub logout_path: SmolStr,
    /// CSRF token resource path.
    #[builder(into, default = SmolStr::new_static("user/token"))]
    pub token_path: SmolStr,
}

impl LoginContract {
    /// Services 3.x: `username`/`password` JSON fields.
    pub fn services_3x() -> Self {
        Self::new()
            .username_field("username")
            .password_field("password")
            .csrf_header(HeaderName::from_static(CSRF_HEADER))
            .build()
    }

    /// Older deployments: Drupal form field names `name`/`pass`.
    pub fn legacy() -> Self {
        Self::new()
            .username_field("name")
            .password_field("pass")
            .csrf_header(HeaderName::from_static(CSRF_HEADER))
            .build()
    }
}

impl Default for LoginContract {
    fn default() -> Self {
        Self::services_3x()
    }
}

/// Configuration for a [`DrupalClient`](crate::session::DrupalClient).
///
/// ```
/// use event_ticket::config::{ClientConfig, LoginContract};
///
/// let config = ClientConfig::new()
///     .endpoint(url::Url::parse("https://example.com/api").unwrap())
///     .contract(LoginContract::legacy())
///     .listings_require_session(true)
///     .build();
/// assert_eq!(config.endpoint().as_str(), "https://example.com/api/");
/// ```
#[derive(Debug, Clone, Builder)]
#[builder(start_fn = new)]
pub struct ClientConfig {
    /// Base URL of the Services endpoint, e.g. `https://example.com/api`.
    #[builder(with = |url: Url| normalize_endpoint(url))]
    endpoint: Url,
    /// Request-shaping policy for the user resources.
    #[builder(default)]
    pub contract: LoginContract,
    /// Refuse node and node-ticket listings while anonymous.
    #[builder(default)]
    pub listings_require_session: bool,
    /// Per-request timeout for the built-in transport.
    pub timeout: Option<Duration>,
    /// User agent for the built-in transport.
    #[builder(into)]
    pub user_agent: Option<String>,
}

impl ClientConfig {
    /// Default configuration for the given endpoint URL string.
    pub fn from_endpoint(endpoint: &str) -> Result<Self, ClientError> {
        let url = Url::parse(endpoint).map_err(|e| RequestError::InvalidEndpoint {
            url: endpoint.to_owned(),
            reason: e.to_string(),
        })?;
        Ok(Self::new().endpoint(url).build())
    }

    /// Normalised endpoint URL (always ends in `/`).
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_gets_trailing_slash() {
        let config = ClientConfig::from_endpoint("https://example.com/api").unwrap();
        assert_eq!(config.endpoint().as_str(), "https://example.com/api/");
        assert!(!config.listings_require_session);
        assert_eq!(config.contract, LoginContract::services_3x());
    }

    #[test]
    fn bad_endpoint_is_a_request_error() {
        let err = ClientConfig::from_endpoint("not a url").unwrap_err();
        assert!(err.is_request());
        assert!(matches!(
            err,
            ClientError::Request(RequestError::InvalidEndpoint { ref url, .. }) if url == "not a url"
        ));
    }

    #[test]
    fn legacy_contract_field_names() {
        let contract = LoginContract::legacy();
        assert_eq!(contract.username_field, "name");
        assert_eq!(contract.password_field, "pass");
        assert_eq!(contract.login_path, "user/login");
        assert_eq!(contract.csrf_header.as_str(), "x-csrf-token");
    }
}
