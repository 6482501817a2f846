//! # event-ticket
//!
//! Client for the event ticket checking API exposed through Drupal Services.
//!
//! Two layers:
//! - [`session::DrupalClient`] logs in with Drupal's cookie session, keeps the
//!   CSRF token Drupal demands on mutating calls, and offers plain `get`/`post`
//!   against the endpoint.
//! - [`tickets::TicketClient`] sits on top and speaks the ticket resources:
//!   look up, validate (one or many), reset, and list events and their tickets.
//!
//! ## Example
//!
//! ```no_run
//! use event_ticket::config::{ClientConfig, LoginContract};
//! use event_ticket::session::DrupalClient;
//! use event_ticket::tickets::TicketClient;
//! use event_ticket::types::NodeQuery;
//!
//! #[tokio::main]
//! async fn main() -> miette::Result<()> {
//!     let config = ClientConfig::new()
//!         .endpoint(url::Url::parse("https://example.com/api").unwrap())
//!         .contract(LoginContract::legacy())
//!         .build();
//!     let tickets = TicketClient::new(DrupalClient::with_config(config)?);
//!
//!     tickets.session().login("alice", "secret").await?;
//!     println!("logged in as user {}", tickets.session().user_id().await);
//!
//!     for node in tickets.get_nodes(&NodeQuery::default()).await? {
//!         println!("{}: {}", node.nid, node.title);
//!     }
//!
//!     let outcome = tickets.mark_ticket_used("ABC123XYZ", None).await?;
//!     match outcome.reason() {
//!         None => println!("validated"),
//!         Some(reason) => println!("not validated: {reason}"),
//!     }
//!
//!     tickets.session().logout().await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

pub use event_ticket_common::*;

pub mod barcode;
pub mod config;
pub mod session;
pub mod tickets;
pub mod types;

pub use barcode::Barcode;
pub use config::{ClientConfig, LoginContract};
pub use session::DrupalClient;
pub use tickets::TicketClient;
