//! Cookie-session client for Drupal Services.
//!
//! Drupal authenticates Services calls with its regular session cookie, and
//! rejects mutating requests that do not carry the session's CSRF token in a
//! header. [`DrupalClient`] owns one such session: it logs in and out, keeps
//! the token for the lifetime of the session, and attaches it to every POST.

use event_ticket_common::{
    error::{ClientError, ResponseError, Result, TransportError},
    http_client::HttpClient,
    request::{RequestOptions, Response, build_http_request},
};
use http::{HeaderValue, Method, StatusCode};
use serde::Deserialize;
use serde_json::{Map, Value};
use serde_with::{DisplayFromStr, PickFirst, serde_as};
use smol_str::SmolStr;
use tokio::sync::{Mutex, RwLock};
use url::Url;

use crate::config::ClientConfig;

/// Login state of a [`DrupalClient`].
///
/// `logged_in` implies `csrf_token` is set. The anonymous state is the
/// [`Default`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    /// Name used to log in.
    pub username: Option<SmolStr>,
    /// Drupal user id; 0 when anonymous.
    pub user_id: u64,
    /// CSRF token for the current session, fetched lazily when anonymous.
    pub csrf_token: Option<SmolStr>,
    /// Whether a login succeeded and no logout has since.
    pub logged_in: bool,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    token: Option<SmolStr>,
    user: LoginUser,
}

#[serde_as]
#[derive(Debug, Deserialize)]
struct LoginUser {
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    uid: u64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: SmolStr,
}

/// Stateful client holding one Drupal session.
///
/// Session mutations (`login`, `logout` and the first token fetch) are
/// serialised, so a client can be shared between tasks behind an `Arc`.
pub struct DrupalClient<T> {
    http: T,
    config: ClientConfig,
    state: RwLock<SessionState>,
    auth: Mutex<()>,
}

impl<T> DrupalClient<T> {
    /// Create a new anonymous client over the given transport.
    ///
    /// The transport must keep cookies between requests for logins to stick.
    pub fn new(config: ClientConfig, http: T) -> Self {
        Self {
            http,
            config,
            state: RwLock::new(SessionState::default()),
            auth: Mutex::new(()),
        }
    }

    /// Client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Base endpoint URL.
    pub fn endpoint(&self) -> &Url {
        self.config.endpoint()
    }

    /// The underlying transport.
    pub fn http(&self) -> &T {
        &self.http
    }

    /// Whether a login is active.
    pub async fn is_logged_in(&self) -> bool {
        self.state.read().await.logged_in
    }

    /// Name of the logged in user, if any.
    pub async fn username(&self) -> Option<SmolStr> {
        self.state.read().await.username.clone()
    }

    /// Drupal user id of the logged in user; 0 when anonymous.
    pub async fn user_id(&self) -> u64 {
        self.state.read().await.user_id
    }

    /// Snapshot of the whole session state.
    pub async fn session_info(&self) -> SessionState {
        self.state.read().await.clone()
    }
}

#[cfg(all(feature = "reqwest-client", not(target_arch = "wasm32")))]
impl DrupalClient<reqwest::Client> {
    /// Create a client with its own cookie-keeping reqwest transport.
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let http = event_ticket_common::http_client::session_transport(
            config.timeout,
            config.user_agent.as_deref(),
        )
        .map_err(TransportError::from)?;
        Ok(Self::new(config, http))
    }

    /// Create a client for `endpoint` with default settings.
    ///
    /// ```no_run
    /// # #[tokio::main]
    /// # async fn main() -> miette::Result<()> {
    /// use event_ticket::session::DrupalClient;
    ///
    /// let drupal = DrupalClient::connect("https://example.com/api")?;
    /// drupal.login("alice", "secret").await?;
    /// println!("logged in as user {}", drupal.user_id().await);
    /// # Ok(())
    /// # }
    /// ```
    pub fn connect(endpoint: &str) -> Result<Self> {
        Self::with_config(ClientConfig::from_endpoint(endpoint)?)
    }
}

impl<T> DrupalClient<T>
where
    T: HttpClient + Send + Sync,
{
    /// Send a GET request to `path`, relative to the endpoint.
    ///
    /// GET requests need no CSRF token; `opts` are passed through unchanged.
    /// Any status is returned as a [`Response`]; interpreting it is up to the
    /// caller.
    pub async fn get(&self, path: &str, opts: RequestOptions) -> Result<Response> {
        self.send(Method::GET, path, opts).await
    }

    /// Send a POST request to `path` with the session's CSRF token attached.
    ///
    /// The token is fetched on first use and cached for the rest of the
    /// session.
    pub async fn post(&self, path: &str, opts: RequestOptions) -> Result<Response> {
        let token = self.csrf_token().await?;
        let opts = self.with_csrf_header(opts, &token)?;
        self.send(Method::POST, path, opts).await
    }

    /// Log in with a username and password.
    ///
    /// Returns immediately if already logged in as `username`; logs out first
    /// if logged in as someone else. Any non-200 answer fails with
    /// [`ResponseError::LoginFailed`] and leaves the session untouched.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(level = "info", skip(self, password))
    )]
    pub async fn login(&self, username: &str, password: &str) -> Result<()> {
        let _guard = self.auth.lock().await;

        let logged_in_as = {
            let state = self.state.read().await;
            state.logged_in.then(|| state.username.clone())
        };
        match logged_in_as {
            Some(Some(current)) if current.as_str() == username => {
                #[cfg(feature = "tracing")]
                tracing::debug!("already logged in");
                return Ok(());
            }
            Some(_) => self.logout_locked().await?,
            None => {}
        }

        let contract = &self.config.contract;
        let mut body = Map::new();
        body.insert(
            contract.username_field.to_string(),
            Value::String(username.to_owned()),
        );
        body.insert(
            contract.password_field.to_string(),
            Value::String(password.to_owned()),
        );
        let opts = RequestOptions::new().json(&body)?;

        let response = self.send(Method::POST, &contract.login_path, opts).await?;
        if response.status() != StatusCode::OK {
            #[cfg(feature = "tracing")]
            tracing::warn!(status = %response.status(), "login rejected");
            return Err(ResponseError::LoginFailed(response.into_http_error()).into());
        }
        let login: LoginResponse = response.json()?;

        // Older deployments do not return the token with the login; the
        // session cookie changed, so any cached anonymous token is stale.
        let token = match login.token {
            Some(token) => checked_token(token)?,
            None => self.fetch_csrf_token().await?,
        };

        *self.state.write().await = SessionState {
            username: Some(SmolStr::new(username)),
            user_id: login.user.uid,
            csrf_token: Some(token),
            logged_in: true,
        };
        #[cfg(feature = "tracing")]
        tracing::info!(uid = login.user.uid, "logged in");
        Ok(())
    }

    /// Log out of the current session.
    ///
    /// A no-op when not logged in. On a non-200 answer the session is left
    /// as it was, so the call can be retried.
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "info", skip(self)))]
    pub async fn logout(&self) -> Result<()> {
        let _guard = self.auth.lock().await;
        self.logout_locked().await
    }

    async fn logout_locked(&self) -> Result<()> {
        if !self.state.read().await.logged_in {
            #[cfg(feature = "tracing")]
            tracing::debug!("not logged in, nothing to do");
            return Ok(());
        }

        let token = self.csrf_token_locked().await?;
        let opts = self.with_csrf_header(RequestOptions::new(), &token)?;
        let response = self
            .send(Method::POST, &self.config.contract.logout_path, opts)
            .await?;
        if response.status() != StatusCode::OK {
            #[cfg(feature = "tracing")]
            tracing::warn!(status = %response.status(), "logout rejected");
            return Err(ResponseError::LogoutFailed(response.into_http_error()).into());
        }

        *self.state.write().await = SessionState::default();
        #[cfg(feature = "tracing")]
        tracing::info!("logged out");
        Ok(())
    }

    /// Current CSRF token, fetching it if this session has none yet.
    pub(crate) async fn csrf_token(&self) -> Result<SmolStr> {
        let cached = self.state.read().await.csrf_token.clone();
        if let Some(token) = cached {
            return Ok(token);
        }
        let _guard = self.auth.lock().await;
        self.csrf_token_locked().await
    }

    async fn csrf_token_locked(&self) -> Result<SmolStr> {
        // Another task may have fetched it while we waited for the lock.
        let cached = self.state.read().await.csrf_token.clone();
        if let Some(token) = cached {
            #[cfg(feature = "tracing")]
            tracing::debug!("reusing CSRF token fetched by another task");
            return Ok(token);
        }
        let token = self.fetch_csrf_token().await?;
        self.state.write().await.csrf_token = Some(token.clone());
        Ok(token)
    }

    async fn fetch_csrf_token(&self) -> Result<SmolStr> {
        #[cfg(feature = "tracing")]
        tracing::debug!("fetching CSRF token");
        let response = self
            .send(
                Method::POST,
                &self.config.contract.token_path,
                RequestOptions::new(),
            )
            .await?;
        if response.status() != StatusCode::OK {
            return Err(ResponseError::CsrfToken(response.into_http_error()).into());
        }
        let body: TokenResponse = response.json()?;
        checked_token(body.token)
    }

    fn with_csrf_header(&self, opts: RequestOptions, token: &str) -> Result<RequestOptions> {
        let value = HeaderValue::from_str(token)
            .map_err(|e| ResponseError::InvalidToken(e.to_string()))?;
        Ok(opts.header(self.config.contract.csrf_header.clone(), value))
    }

    async fn send(&self, method: Method, path: &str, opts: RequestOptions) -> Result<Response> {
        let request = build_http_request(self.config.endpoint(), method, path, &opts)?;
        let response = self
            .http
            .send_http(request)
            .await
            .map_err(|e| ClientError::Transport(e.into()))?;
        Ok(Response::from(response))
    }
}

/// Tokens are echoed back in a header, so reject any the server hands out
/// that could not be.
fn checked_token(token: SmolStr) -> Result<SmolStr> {
    HeaderValue::from_str(&token).map_err(|e| ResponseError::InvalidToken(e.to_string()))?;
    Ok(token)
}
