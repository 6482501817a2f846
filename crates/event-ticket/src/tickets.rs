//! Ticket checking operations.
//!
//! Status mapping:
//! - 2xx: the body is the operation's payload.
//! - 400 from `event-ticket/{barcode}/validate`: the ticket exists but could
//!   not be validated; the body is still a [`Validation`] and is returned as
//!   [`Validation::Rejected`].
//! - Anything else: [`ResponseError::UnexpectedStatus`].

use event_ticket_common::{
    error::{RequestError, ResponseError, Result},
    http_client::HttpClient,
    request::{RequestOptions, Response},
};
use http::StatusCode;
use serde::de::DeserializeOwned;

use crate::barcode::Barcode;
use crate::session::DrupalClient;
use crate::types::{
    BatchBody, BatchValidation, DEFAULT_RESET_LOG, DEFAULT_VALIDATE_LOG, LogBody, MAX_BATCH_SIZE,
    Node, NodeQuery, NodeTicketsQuery, ResetOutcome, Ticket, Validation,
};

/// Client for the event ticket resources, layered over a [`DrupalClient`].
///
/// ```no_run
/// # #[tokio::main]
/// # async fn main() -> miette::Result<()> {
/// use event_ticket::session::DrupalClient;
/// use event_ticket::tickets::TicketClient;
///
/// let tickets = TicketClient::new(DrupalClient::connect("https://example.com/api")?);
/// tickets.session().login("alice", "secret").await?;
///
/// let ticket = tickets.get_ticket("ABC123XYZ").await?;
/// if ticket.valid {
///     let outcome = tickets.mark_ticket_used("ABC123XYZ", None).await?;
///     println!("validated: {}", outcome.is_validated());
/// } else {
///     println!("invalid: {}", ticket.reason.unwrap_or_default());
/// }
/// # Ok(())
/// # }
/// ```
pub struct TicketClient<T> {
    drupal: DrupalClient<T>,
}

impl<T> TicketClient<T> {
    /// Wrap a session client.
    pub fn new(drupal: DrupalClient<T>) -> Self {
        Self { drupal }
    }

    /// The session client, for logging in and out.
    pub fn session(&self) -> &DrupalClient<T> {
        &self.drupal
    }

    /// Unwrap back into the session client.
    pub fn into_session(self) -> DrupalClient<T> {
        self.drupal
    }
}

impl<T> From<DrupalClient<T>> for TicketClient<T> {
    fn from(drupal: DrupalClient<T>) -> Self {
        Self::new(drupal)
    }
}

impl<T> TicketClient<T>
where
    T: HttpClient + Send + Sync,
{
    /// Fetch a ticket by barcode.
    ///
    /// The barcode format and the session are checked before any request is
    /// made.
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "debug", skip(self)))]
    pub async fn get_ticket(&self, barcode: &str) -> Result<Ticket> {
        let barcode = self.checked_barcode(barcode).await?;
        let response = self
            .drupal
            .get(&format!("event-ticket/{barcode}"), RequestOptions::new())
            .await?;
        parse_success(response, "get ticket")
    }

    /// Mark a ticket as used.
    ///
    /// `log` defaults to [`DEFAULT_VALIDATE_LOG`]. A ticket the server
    /// refuses to validate (already used, wrong date, ...) is a
    /// [`Validation::Rejected`], not an error.
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "debug", skip(self)))]
    pub async fn mark_ticket_used(&self, barcode: &str, log: Option<&str>) -> Result<Validation> {
        let barcode = self.checked_barcode(barcode).await?;
        let opts = RequestOptions::new().json(&LogBody {
            log: log.unwrap_or(DEFAULT_VALIDATE_LOG),
        })?;
        let response = self
            .drupal
            .post(&format!("event-ticket/{barcode}/validate"), opts)
            .await?;
        if response.status() == StatusCode::BAD_REQUEST {
            let validation: Validation = response.json()?;
            #[cfg(feature = "tracing")]
            tracing::debug!(reason = validation.reason(), "ticket not validated");
            return Ok(validation);
        }
        parse_success(response, "mark ticket used")
    }

    /// Mark up to [`MAX_BATCH_SIZE`] tickets as used in one call.
    ///
    /// Results are keyed by barcode. Barcodes are passed to the server as
    /// given; unknown ones come back with `found: false`.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(level = "debug", skip(self, tickets), fields(count = tickets.len()))
    )]
    pub async fn mark_multiple_tickets_used<B>(
        &self,
        tickets: &[B],
        log: Option<&str>,
    ) -> Result<BatchValidation>
    where
        B: AsRef<str> + Sync,
    {
        self.require_session().await?;
        if tickets.is_empty() {
            return Err(RequestError::EmptyBatch.into());
        }
        if tickets.len() > MAX_BATCH_SIZE {
            return Err(RequestError::BatchTooLarge {
                count: tickets.len(),
                max: MAX_BATCH_SIZE,
            }
            .into());
        }
        let opts = RequestOptions::new().json(&BatchBody {
            tickets,
            log: log.unwrap_or(DEFAULT_VALIDATE_LOG),
        })?;
        let response = self
            .drupal
            .post("event-ticket/validate-multiple", opts)
            .await?;
        parse_success(response, "mark multiple tickets used")
    }

    /// Reset a ticket, marking it unused.
    ///
    /// `log` defaults to [`DEFAULT_RESET_LOG`].
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "debug", skip(self)))]
    pub async fn reset_ticket(&self, barcode: &str, log: Option<&str>) -> Result<ResetOutcome> {
        let barcode = self.checked_barcode(barcode).await?;
        let opts = RequestOptions::new().json(&LogBody {
            log: log.unwrap_or(DEFAULT_RESET_LOG),
        })?;
        let response = self
            .drupal
            .post(&format!("event-ticket/{barcode}/reset"), opts)
            .await?;
        parse_success(response, "reset ticket")
    }

    /// List nodes with tickets (events).
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "debug", skip(self)))]
    pub async fn get_nodes(&self, query: &NodeQuery) -> Result<Vec<Node>> {
        if self.drupal.config().listings_require_session {
            self.require_session().await?;
        }
        let opts = RequestOptions::new().query(query)?;
        let response = self.drupal.get("event-ticket-nodes", opts).await?;
        parse_success(response, "get nodes")
    }

    /// List the tickets of node `nid`.
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "debug", skip(self)))]
    pub async fn get_node_tickets(&self, nid: u64, query: &NodeTicketsQuery) -> Result<Vec<Ticket>> {
        if self.drupal.config().listings_require_session {
            self.require_session().await?;
        }
        let opts = RequestOptions::new().query(query)?;
        let response = self
            .drupal
            .get(&format!("node/{nid}/tickets"), opts)
            .await?;
        parse_success(response, "get node tickets")
    }

    async fn checked_barcode(&self, barcode: &str) -> Result<Barcode> {
        let barcode = Barcode::new(barcode)?;
        self.require_session().await?;
        Ok(barcode)
    }

    async fn require_session(&self) -> Result<()> {
        if self.drupal.is_logged_in().await {
            Ok(())
        } else {
            Err(RequestError::NotAuthenticated.into())
        }
    }
}

fn parse_success<R: DeserializeOwned>(response: Response, operation: &'static str) -> Result<R> {
    if !response.status().is_success() {
        #[cfg(feature = "tracing")]
        tracing::warn!(status = %response.status(), operation, "unexpected response status");
        return Err(ResponseError::UnexpectedStatus {
            operation,
            error: response.into_http_error(),
        }
        .into());
    }
    Ok(response.json()?)
}
